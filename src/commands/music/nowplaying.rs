use super::checks::{current_player, player_connected};
use super::utils::button_controls::create_music_control_buttons;
use super::utils::embedded_messages;
use super::*;

/// Show the track that is playing right now
#[poise::command(slash_command, category = "Music", guild_only, check = "player_connected")]
pub async fn nowplaying(ctx: Context<'_>) -> CommandResult {
    let now_playing = current_player(ctx)?.now_playing().await?;

    ctx.send(
        CreateReply::default()
            .embed(embedded_messages::now_playing(&now_playing))
            .components(create_music_control_buttons()),
    )
    .await?;

    Ok(())
}
