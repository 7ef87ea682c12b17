use super::utils::embedded_messages;
use super::*;

/// List the music commands
#[poise::command(slash_command, category = "Music")]
pub async fn music(ctx: Context<'_>) -> CommandResult {
    ctx.send(CreateReply::default().embed(embedded_messages::music_help(&ctx.data().config)))
        .await?;

    Ok(())
}
