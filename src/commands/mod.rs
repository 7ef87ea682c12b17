//! This module aggregates all the command modules for the bot.

/// Music playback commands backed by Lavalink nodes.
pub mod music;
