use super::checks::{current_player, in_same_channel};
use super::utils::embedded_messages;
use super::utils::player::validate_volume;
use super::*;

/// Set the playback volume
#[poise::command(slash_command, category = "Music", guild_only, check = "in_same_channel")]
pub async fn volume(
    ctx: Context<'_>,
    #[description = "Volume between 0 and 100"] volume: i64,
    #[description = "Allow a volume above 100"] forced: Option<bool>,
) -> CommandResult {
    let volume = validate_volume(volume, forced.unwrap_or(false))?;

    current_player(ctx)?.set_volume(volume).await?;
    ctx.send(embedded_messages::volume_set(volume)).await?;

    Ok(())
}
