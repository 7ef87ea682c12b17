use super::checks::in_same_channel;
use super::utils::embedded_messages;
use super::utils::music_manager::MusicError;
use super::*;

/// Stop the music, clear the queue, and leave the voice channel
#[poise::command(
    slash_command,
    prefix_command,
    category = "Music",
    aliases("disconnect"),
    guild_only,
    check = "in_same_channel"
)]
pub async fn stop(ctx: Context<'_>) -> CommandResult {
    let guild_id = ctx.guild_id().ok_or(MusicError::NotInGuild)?;

    ctx.data().music.stop(guild_id).await?;
    ctx.send(embedded_messages::stopped()).await?;

    Ok(())
}
