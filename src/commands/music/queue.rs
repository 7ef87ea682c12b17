use super::checks::{current_player, player_connected};
use super::utils::embedded_messages;
use super::utils::player::LoopMode;
use super::*;

/// Show the upcoming tracks
#[poise::command(slash_command, category = "Music", guild_only, check = "player_connected")]
pub async fn queue(ctx: Context<'_>) -> CommandResult {
    let player = current_player(ctx)?;

    let tracks = player.queue().snapshot().await;
    let loop_mode = player.loop_mode().await;
    let current = player.current_track().await;

    if tracks.is_empty() && (loop_mode != LoopMode::Current || current.is_none()) {
        ctx.send(embedded_messages::queue_is_empty()).await?;
        return Ok(());
    }

    let embed = embedded_messages::music_queue(current.as_ref(), loop_mode, &tracks);
    ctx.send(CreateReply::default().embed(embed)).await?;

    Ok(())
}
