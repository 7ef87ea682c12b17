use std::sync::Arc;

use super::checks::{author_voice_channel, current_player, ensure_same_channel, voice_connected};
use super::utils::embedded_messages;
use super::utils::music_manager::{MusicError, MusicResult};
use super::utils::player::DisPlayer;
use super::*;

/// Join the author's voice channel and bind the player to this text channel
pub(crate) async fn connect_author(ctx: Context<'_>) -> MusicResult<Arc<DisPlayer>> {
    let guild_id = ctx.guild_id().ok_or(MusicError::NotInGuild)?;
    let voice_channel = author_voice_channel(ctx)?;

    ctx.data()
        .music
        .connect(ctx.serenity_context(), guild_id, voice_channel, ctx.channel_id())
        .await
}

/// The guild's player, joining the author's channel when there is none yet.
/// Callers defer the interaction first since joining can be slow.
pub(crate) async fn player_or_connect(ctx: Context<'_>) -> MusicResult<Arc<DisPlayer>> {
    let player = match current_player(ctx) {
        Ok(player) => player,
        Err(_) => connect_author(ctx).await?,
    };

    // someone may have connected the bot elsewhere since the check ran
    ensure_same_channel(author_voice_channel(ctx).ok(), player.channel_id())?;
    Ok(player)
}

/// Connect the bot to your voice channel
#[poise::command(slash_command, category = "Music", guild_only, check = "voice_connected")]
pub async fn connect(ctx: Context<'_>) -> CommandResult {
    if let Ok(player) = current_player(ctx) {
        ctx.send(embedded_messages::already_connected(player.channel_id()))
            .await?;
        return Ok(());
    }

    ctx.defer().await?;

    let player = connect_author(ctx).await?;
    ctx.send(embedded_messages::connected(player.channel_id()))
        .await?;

    Ok(())
}
