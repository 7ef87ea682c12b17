//! Voice-channel preconditions shared by the music commands.
//!
//! Every check either passes or returns the [`MusicError`] describing why not;
//! the framework's error hook turns that into an ephemeral reply.

use std::sync::Arc;

use serenity::model::id::{ChannelId, GuildId};

use super::utils::music_manager::{MusicError, MusicManager, MusicResult};
use super::utils::player::DisPlayer;
use crate::{Context, Error};

/// Succeeds only when the user sits in the player's voice channel
pub fn ensure_same_channel(user_channel: Option<ChannelId>, player_channel: ChannelId) -> MusicResult<()> {
    match user_channel {
        None => Err(MusicError::NotConnectedToVoice),
        Some(channel) if channel != player_channel => Err(MusicError::MustBeSameChannel),
        Some(_) => Ok(()),
    }
}

fn guild_id(ctx: Context<'_>) -> MusicResult<GuildId> {
    ctx.guild_id().ok_or(MusicError::NotInGuild)
}

/// Voice channel of the command author
pub fn author_voice_channel(ctx: Context<'_>) -> MusicResult<ChannelId> {
    MusicManager::get_user_voice_channel(ctx.serenity_context(), guild_id(ctx)?, ctx.author().id)
}

/// The guild's live player
pub fn current_player(ctx: Context<'_>) -> MusicResult<Arc<DisPlayer>> {
    ctx.data()
        .music
        .get_player(guild_id(ctx)?)
        .ok_or(MusicError::PlayerNotConnected)
}

/// The author is in a voice channel
pub async fn voice_connected(ctx: Context<'_>) -> Result<bool, Error> {
    author_voice_channel(ctx)?;
    Ok(true)
}

/// The bot has a player in this guild
pub async fn player_connected(ctx: Context<'_>) -> Result<bool, Error> {
    current_player(ctx)?;
    Ok(true)
}

/// The bot has a player and the author shares its voice channel
pub async fn in_same_channel(ctx: Context<'_>) -> Result<bool, Error> {
    let player = current_player(ctx)?;
    ensure_same_channel(author_voice_channel(ctx).ok(), player.channel_id())?;
    Ok(true)
}

/// Succeeds when the user is in voice and any existing player sits in the same channel
pub fn ensure_can_join(user_channel: Option<ChannelId>, player_channel: Option<ChannelId>) -> MusicResult<()> {
    match player_channel {
        Some(player_channel) => ensure_same_channel(user_channel, player_channel),
        None => user_channel.map(|_| ()).ok_or(MusicError::NotConnectedToVoice),
    }
}

/// The author is in a voice channel and the bot is either absent or with them.
/// Joining is left to the command so it can defer the interaction first.
pub async fn voice_channel_player(ctx: Context<'_>) -> Result<bool, Error> {
    let channel = author_voice_channel(ctx)?;
    let player_channel = current_player(ctx).ok().map(|player| player.channel_id());

    ensure_can_join(Some(channel), player_channel)?;
    Ok(true)
}
