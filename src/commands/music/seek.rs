use super::checks::{current_player, in_same_channel};
use super::utils::embedded_messages;
use super::*;

/// Move forward or backward in the current track
#[poise::command(slash_command, category = "Music", guild_only, check = "in_same_channel")]
pub async fn seek(
    ctx: Context<'_>,
    #[description = "Seconds to move, negative to go back"] seconds: i64,
) -> CommandResult {
    let (_, position) = current_player(ctx)?.seek(seconds).await?;
    ctx.send(embedded_messages::seeked(seconds, position))
        .await?;

    Ok(())
}
