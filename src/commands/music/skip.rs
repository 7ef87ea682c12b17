use super::checks::{current_player, in_same_channel};
use super::utils::embedded_messages;
use super::*;

/// Skip the current track
#[poise::command(slash_command, category = "Music", guild_only, check = "in_same_channel")]
pub async fn skip(ctx: Context<'_>) -> CommandResult {
    current_player(ctx)?.skip().await?;
    ctx.send(embedded_messages::skipped()).await?;

    Ok(())
}
