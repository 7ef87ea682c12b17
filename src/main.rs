use ::serenity::all::ClientBuilder;
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use songbird::SerenityInit;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use dismusic::commands::music::{
    self as music_commands,
    utils::{music_manager::MusicManager, notifications::spawn_log_listener},
};
use dismusic::config::Config;
use dismusic::events::Handler;
use dismusic::{CommandResult, Context, Data, Error, on_error};

#[poise::command(slash_command, category = "General")]
async fn help(
    ctx: Context<'_>,
    #[description = "Specific command to show help about"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> CommandResult {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            show_context_menu_commands: true,
            ..Default::default()
        },
    )
    .await
    .map_err(|e| e.into())
}

#[poise::command(prefix_command, hide_in_help)]
async fn register(ctx: Context<'_>) -> Result<(), Error> {
    poise::builtins::register_application_commands_buttons(ctx)
        .await
        .map_err(|e| e.into())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize logging with debug level for our crate
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dismusic=debug,warn")),
        )
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_target(true)
        .with_ansi(true)
        .pretty()
        .init();

    dotenv().ok();

    let config = Arc::new(Config::from_env()?);
    let music = Arc::new(MusicManager::new(&config));

    spawn_log_listener(music.events());
    let (node_events, node_events_rx) = mpsc::unbounded_channel();
    Arc::clone(&music).spawn_event_router(node_events_rx);

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    let mut commands = vec![register(), help()];
    commands.extend(music_commands::commands());

    let setup_music = Arc::clone(&music);
    let setup_config = Arc::clone(&config);

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands,
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                // Nodes need the bot's user id, which is only known once ready
                setup_music
                    .nodes()
                    .start(&setup_config.nodes, ready.user.id, node_events)
                    .await;
                info!("Logged in as {}", ready.user.name);

                Ok(Data {
                    music: setup_music,
                    config: setup_config,
                })
            })
        });

    let client_builder = ClientBuilder::new(&config.discord_token, intents)
        .framework(framework.build())
        .event_handler(Handler { music });

    let mut client = client_builder.register_songbird().await?;
    client.start().await.map_err(Into::into)
}
