use poise::{ChoiceParameter, CreateReply};
use ::serenity::all::{ChannelId, CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter, Mentionable};
use std::time::Duration;

use super::format_duration;
use super::player::{LoopMode, NowPlaying};
use crate::config::Config;
use crate::lavalink::Track;

const COLOR_OK: u32 = 0x00ff00;
const COLOR_ERROR: u32 = 0xff0000;
const COLOR_PLAYER: u32 = 0x5865f2;
const COLOR_QUEUE: u32 = 0x2f3136;

const DEFAULT_THUMBNAIL: &str =
    "https://cdn.discordapp.com/attachments/776345413132877854/940540758442795028/unknown.png";
const QUEUE_ICON: &str =
    "https://cdn.discordapp.com/attachments/776345413132877854/940247400046542948/list.png";

fn reply(title: &str, description: impl Into<String>) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title(title)
            .description(description)
            .color(COLOR_OK),
    )
}

/// Red, ephemeral error reply
pub fn error(message: impl Into<String>) -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .title("❌ Error")
                .description(message)
                .color(COLOR_ERROR),
        )
        .ephemeral(true)
}

pub fn connecting(channel_id: ChannelId) -> CreateReply {
    reply("🔌 Connecting", format!("Connecting to {}", channel_id.mention()))
}

pub fn connected(channel_id: ChannelId) -> CreateReply {
    reply("✅ Connected", format!("Connected to {}", channel_id.mention()))
}

pub fn already_connected(channel_id: ChannelId) -> CreateReply {
    reply(
        "ℹ️ Already connected",
        format!("Already playing in {}", channel_id.mention()),
    )
    .ephemeral(true)
}

pub fn always_joined_enabled(channel_id: ChannelId) -> CreateReply {
    reply(
        "🕛 24/7 mode",
        format!(
            "24/7 mode enabled in {}. Use `/stop` to turn it off.",
            channel_id.mention()
        ),
    )
}

pub fn always_joined_already() -> CreateReply {
    reply(
        "🕛 24/7 mode",
        "24/7 mode is already enabled. Use `/stop` to turn it off.",
    )
    .ephemeral(true)
}

pub fn searching(query: &str) -> CreateReply {
    reply("🔎 Searching", format!("Searching for `{}`", query))
}

pub fn nothing_found(query: &str) -> CreateReply {
    error(format!("Nothing found for `{}`", query))
}

pub fn added_to_queue(track: &Track, position: usize) -> CreateReply {
    let mut embed = CreateEmbed::new()
        .title("🎵 Added to Queue")
        .description(format!("[{}]({})", track.title(), track.uri()))
        .field("Duration", format!("`{}`", format_duration(track.length())), true)
        .field("Position", format!("`#{}`", position), true)
        .color(COLOR_OK);

    if let Some(thumbnail) = track.thumbnail() {
        embed = embed.thumbnail(thumbnail);
    }

    CreateReply::default().embed(embed)
}

pub fn volume_set(volume: u16) -> CreateReply {
    reply("🔊 Volume", format!("Volume set to **{}**", volume))
}

pub fn stopped() -> CreateReply {
    reply("⏹️ Stopped", "Stopped playback and left the voice channel")
}

pub fn paused() -> CreateReply {
    reply("⏸️ Paused", "Playback paused")
}

pub fn resumed() -> CreateReply {
    reply("▶️ Resumed", "Playback resumed")
}

pub fn skipped() -> CreateReply {
    reply("⏭️ Skipped", "Skipped to the next track")
}

pub fn seeked(offset_secs: i64, position: Duration) -> CreateReply {
    reply(
        "⏩ Seek",
        format!(
            "Moved {} seconds, now at `{}`",
            offset_secs,
            format_duration(position)
        ),
    )
}

pub fn loop_set(mode: LoopMode) -> CreateReply {
    reply("🔁 Loop", format!("Loop mode set to **{}**", mode))
}

pub fn queue_is_empty() -> CreateReply {
    reply("📭 Queue", "The queue is empty").ephemeral(true)
}

/// Short form used in the queue footer: `42s`, `3m 5s` or `1h 2m 3s`
pub fn format_queue_length(length: Duration) -> String {
    let seconds = length.as_secs();

    if seconds > 3600 {
        format!("{}h {}m {}s", seconds / 3600, seconds % 3600 / 60, seconds % 60)
    } else if seconds > 60 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}s", seconds)
    }
}

/// Queue listing; with `CURRENT` looping the current track is shown as next
pub fn queue_description(current: Option<&Track>, loop_mode: LoopMode, queue: &[Track]) -> String {
    let mut description = String::new();

    if let (LoopMode::Current, Some(track)) = (loop_mode, current) {
        description.push_str(&format!("Next > [{}]({})\n\n", track.title(), track.uri()));
    }

    for (index, track) in queue.iter().enumerate() {
        description.push_str(&format!(
            "{}. [{}]({})\n",
            index + 1,
            track.title(),
            track.uri()
        ));
    }

    description
}

/// Create an embed for the music queue
pub fn music_queue(current: Option<&Track>, loop_mode: LoopMode, queue: &[Track]) -> CreateEmbed {
    let total: Duration = queue.iter().map(Track::length).sum();

    CreateEmbed::new()
        .author(CreateEmbedAuthor::new("Queue").icon_url(QUEUE_ICON))
        .description(queue_description(current, loop_mode, queue))
        .footer(CreateEmbedFooter::new(format_queue_length(total)))
        .color(COLOR_QUEUE)
}

/// Create an embed for the track that is now playing
pub fn now_playing(now_playing: &NowPlaying) -> CreateEmbed {
    let track = &now_playing.track;

    let mut embed = CreateEmbed::new()
        .title(track.title())
        .url(track.uri())
        .author(CreateEmbedAuthor::new(&track.info.author))
        .thumbnail(track.thumbnail().unwrap_or(DEFAULT_THUMBNAIL))
        .field(
            "Length",
            if track.info.is_stream {
                "🔴 Live".to_string()
            } else {
                format!(
                    "{} / {}",
                    format_duration(now_playing.position),
                    format_duration(track.length())
                )
            },
            true,
        )
        .field("Loop", now_playing.loop_mode.as_str(), true)
        .field("Volume", now_playing.volume.to_string(), true)
        .color(COLOR_PLAYER);

    if let Some(next) = &now_playing.next {
        embed = embed.field("Next", next, false);
    }

    embed
}

/// The `/music` command overview
pub fn music_help(config: &Config) -> CreateEmbed {
    CreateEmbed::new()
        .title("Music commands")
        .description(
            "`play`, `pause`, `resume`, `skip`, `seek`, `connect`, `volume`, `loop`, \
             `queue`, `nowplaying`, `alwaysjoined`, `stop`, `music`",
        )
        .field("Default source", config.default_provider.name(), true)
        .field(
            "Idle timeout",
            format_queue_length(config.idle_timeout),
            true,
        )
        .color(COLOR_PLAYER)
}
