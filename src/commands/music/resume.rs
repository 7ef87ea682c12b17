use super::checks::{current_player, in_same_channel};
use super::utils::embedded_messages;
use super::*;

/// Resume the paused track
#[poise::command(slash_command, category = "Music", guild_only, check = "in_same_channel")]
pub async fn resume(ctx: Context<'_>) -> CommandResult {
    current_player(ctx)?.set_pause(false).await?;
    ctx.send(embedded_messages::resumed()).await?;

    Ok(())
}
