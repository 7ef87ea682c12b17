use super::checks::{current_player, in_same_channel};
use super::utils::embedded_messages;
use super::*;

/// Pause the current track
#[poise::command(slash_command, category = "Music", guild_only, check = "in_same_channel")]
pub async fn pause(ctx: Context<'_>) -> CommandResult {
    current_player(ctx)?.set_pause(true).await?;
    ctx.send(embedded_messages::paused()).await?;

    Ok(())
}
