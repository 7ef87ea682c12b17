//! Discord music bot: slash commands driving per-guild players on Lavalink nodes.

use std::sync::{Arc, LazyLock};

use tracing::{error, warn};

pub mod commands;
pub mod config;
pub mod events;
pub mod lavalink;

use commands::music::utils::embedded_messages;
use commands::music::utils::music_manager::MusicManager;
use config::Config;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type CommandResult = Result<(), Error>;

/// Shared by every command invocation
pub struct Data {
    pub music: Arc<MusicManager>,
    pub config: Arc<Config>,
}

pub static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(reqwest::Client::new);

/// Turns failed commands and checks into an ephemeral error embed
pub async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            warn!(
                "Command {} failed: {}",
                ctx.command().qualified_name,
                error
            );
            if let Err(e) = ctx.send(embedded_messages::error(error.to_string())).await {
                error!("Failed to send error reply: {}", e);
            }
        }
        poise::FrameworkError::CommandCheckFailed { error, ctx, .. } => {
            let message = error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "You can't use this command right now".to_string());
            if let Err(e) = ctx.send(embedded_messages::error(message)).await {
                error!("Failed to send check failure reply: {}", e);
            }
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}
