use super::checks::voice_channel_player;
use super::connect::player_or_connect;
use super::utils::embedded_messages;
use super::utils::music_manager::MusicError;
use super::utils::search::Provider;
use super::*;
use tracing::info;

/// Play a song from a URL or a search query
#[poise::command(slash_command, category = "Music", guild_only, check = "voice_channel_player")]
pub async fn play(
    ctx: Context<'_>,
    #[description = "URL or search query"] query: String,
    #[description = "Where to search"] provider: Option<Provider>,
) -> CommandResult {
    info!("Received play command with query: {}", query);

    ctx.defer().await?;

    let player = player_or_connect(ctx).await?;
    let provider = match provider {
        Some(provider) => provider,
        None => player.provider().await,
    };

    ctx.send(embedded_messages::searching(&query)).await?;

    let track = match ctx.data().music.search(&query, provider).await {
        Ok(track) => track,
        Err(MusicError::NothingFound) => {
            ctx.send(embedded_messages::nothing_found(&query)).await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    player.set_bound_channel(ctx.channel_id()).await;
    player.enqueue(track.clone()).await;

    let position = player.queue().len().await;
    ctx.send(embedded_messages::added_to_queue(&track, position))
        .await?;

    if !player.is_playing().await {
        player.advance();
    }

    Ok(())
}
