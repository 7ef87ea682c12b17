use super::checks::{current_player, in_same_channel};
use super::utils::embedded_messages;
use super::*;

/// Set the loop mode, or cycle through NONE, CURRENT and PLAYLIST
#[poise::command(
    slash_command,
    rename = "loop",
    category = "Music",
    guild_only,
    check = "in_same_channel"
)]
pub async fn loop_mode(
    ctx: Context<'_>,
    #[description = "NONE, CURRENT or PLAYLIST"] mode: Option<String>,
) -> CommandResult {
    let mode = current_player(ctx)?.set_loop(mode.as_deref()).await?;
    ctx.send(embedded_messages::loop_set(mode)).await?;

    Ok(())
}
