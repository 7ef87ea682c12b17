use poise::serenity_prelude::Context;
use ::serenity::all::{ComponentInteraction, CreateInteractionResponseFollowup, GuildId};
use tracing::{error, info};

use super::button_controls::{LOOP_BUTTON, SKIP_BUTTON, STOP_BUTTON};
use super::embedded_messages;
use super::music_manager::{MusicError, MusicManager};
use crate::commands::music::checks::ensure_same_channel;

type ButtonInteractionResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Handle a click on one of the "now playing" buttons
pub async fn handle_interaction(
    ctx: &Context,
    interaction: &mut ComponentInteraction,
    music: &MusicManager,
) -> ButtonInteractionResult {
    interaction.defer(ctx).await?;

    let Some(guild_id) = interaction.guild_id else {
        return error_followup(ctx, interaction, &MusicError::NotInGuild.to_string()).await;
    };

    match press(ctx, interaction, guild_id, music).await {
        Ok(message) => followup(ctx, interaction, message).await,
        Err(e) => error_followup(ctx, interaction, &e.to_string()).await,
    }
}

async fn press(
    ctx: &Context,
    interaction: &ComponentInteraction,
    guild_id: GuildId,
    music: &MusicManager,
) -> Result<String, MusicError> {
    let player = music
        .get_player(guild_id)
        .ok_or(MusicError::PlayerNotConnected)?;

    let user_channel =
        MusicManager::get_user_voice_channel(ctx, guild_id, interaction.user.id).ok();
    ensure_same_channel(user_channel, player.channel_id())?;

    match interaction.data.custom_id.as_str() {
        LOOP_BUTTON => {
            let mode = player.set_loop(None).await?;
            Ok(format!("Loop mode set to **{}**", mode))
        }
        STOP_BUTTON => {
            music.stop(guild_id).await?;
            Ok("Stopped playback and left the voice channel".to_string())
        }
        SKIP_BUTTON => {
            player.skip().await?;
            Ok("Skipped to the next track".to_string())
        }
        other => {
            error!("Unknown button ID: {}", other);
            Ok("Unknown button action.".to_string())
        }
    }
}

async fn followup(
    ctx: &Context,
    interaction: &ComponentInteraction,
    message: String,
) -> ButtonInteractionResult {
    info!(
        "{} pressed {} in guild {:?}",
        interaction.user.name, interaction.data.custom_id, interaction.guild_id
    );

    interaction
        .create_followup(
            &ctx.http,
            CreateInteractionResponseFollowup::new()
                .content(message)
                .ephemeral(true),
        )
        .await?;

    Ok(())
}

async fn error_followup(
    ctx: &Context,
    interaction: &ComponentInteraction,
    message: &str,
) -> ButtonInteractionResult {
    let reply = embedded_messages::error(message);

    interaction
        .create_followup(
            &ctx.http,
            CreateInteractionResponseFollowup::new()
                .embeds(reply.embeds)
                .ephemeral(true),
        )
        .await?;

    Ok(())
}
