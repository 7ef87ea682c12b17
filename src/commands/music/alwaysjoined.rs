use super::checks::voice_channel_player;
use super::connect::player_or_connect;
use super::utils::embedded_messages;
use super::*;

/// Keep the bot in the voice channel even when nothing is playing
#[poise::command(slash_command, category = "Music", guild_only, check = "voice_channel_player")]
pub async fn alwaysjoined(ctx: Context<'_>) -> CommandResult {
    ctx.defer().await?;

    let player = player_or_connect(ctx).await?;

    if player.is_always_joined().await {
        ctx.send(embedded_messages::always_joined_already()).await?;
        return Ok(());
    }

    player.set_always_joined(true).await;
    ctx.send(embedded_messages::always_joined_enabled(player.channel_id()))
        .await?;

    Ok(())
}
