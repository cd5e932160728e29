// This is the entry point of the request board bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits and non-Discord plumbing
// - `discord/` = Discord-specific adapters (commands, events, rendering)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands, event handlers and background tasks
// 5. Stop everything cleanly on Ctrl-C

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use crate::config::BotConfig;
use crate::core::reminders::{ReminderSchedule, ReminderService};
use crate::core::requests::{RequestService, RequestSettings};
use crate::discord::commands::presence;
use crate::discord::requests::claim_handler;
use crate::discord::requests::{SerenityBoard, SerenityReminderSink};
use crate::discord::{Data, Error};
use crate::infra::requests::InMemoryRequestStore;
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How often the registry is swept for idle requests.
const IDLE_SWEEP_PERIOD: Duration = Duration::from_secs(60 * 60);

/// Event handler for non-command Discord events.
/// Claim buttons arrive here as component interactions.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::InteractionCreate {
        interaction: serenity::Interaction::Component(component),
    } = event
    {
        // Claim failures are logged, never surfaced beyond Discord's own
        // "interaction failed" hint.
        if let Err(e) = claim_handler::handle_component(ctx, component, data).await {
            tracing::error!(
                message_id = component.message.id.get(),
                user_id = component.user.id.get(),
                "Claim handler error: {}",
                e
            );
        }
    }

    Ok(())
}

/// Register slash commands in the configured guild, or globally without one.
async fn register_commands(
    ctx: &serenity::Context,
    commands: &[poise::Command<Data, Error>],
    guild_id: Option<u64>,
) -> Result<(), serenity::Error> {
    match guild_id {
        Some(guild_id) => {
            poise::builtins::register_in_guild(ctx, commands, serenity::GuildId::new(guild_id))
                .await
        }
        None => poise::builtins::register_globally(ctx, commands).await,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Reads .env (if it exists) and the process environment once
    let config = Arc::new(BotConfig::from_env().context("Invalid bot configuration")?);

    // Liveness endpoint for external health monitors
    infra::health::spawn(config.port)
        .await
        .with_context(|| format!("Failed to bind liveness endpoint on port {}", config.port))?;

    // Stopped on Ctrl-C so background loops don't outlive the client
    let shutdown = CancellationToken::new();

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let setup_config = Arc::clone(&config);
    let setup_shutdown = shutdown.clone();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: discord::commands::all(),
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                let config = setup_config;
                tracing::info!(user = %ready.user.name, "Logged in");

                if let Some(expected) = config.application_id {
                    let actual = ready.application.id.get();
                    if expected != actual {
                        tracing::warn!(
                            expected,
                            actual,
                            "CLIENT_ID does not match the application this token belongs to"
                        );
                    }
                }

                // A failed registration is logged; already-registered
                // commands keep working.
                match register_commands(ctx, &framework.options().commands, config.guild_id).await
                {
                    Ok(()) => tracing::info!(guild_id = ?config.guild_id, "Slash command registered"),
                    Err(e) => tracing::error!("Failed to register slash command: {}", e),
                }

                presence::on_ready(ctx);

                // ============================================================
                // DEPENDENCY INJECTION
                // ============================================================
                // The board needs the live HTTP client and cache, so services
                // are wired here rather than before the client exists.

                let board = SerenityBoard::new(
                    ctx.http.clone(),
                    ctx.cache.clone(),
                    config.uploader_role_id,
                    config.embed_color,
                );
                let settings = RequestSettings {
                    channel_id: config.request_channel_id,
                    authorized_role_id: config.uploader_role_id,
                    media_url: config.media_url.clone(),
                    retention: config.retention,
                };
                let requests = Arc::new(RequestService::new(
                    board,
                    InMemoryRequestStore::new(),
                    settings,
                ));

                Arc::clone(&requests).spawn_idle_sweep(IDLE_SWEEP_PERIOD, setup_shutdown.clone());

                if let Some(reminder) = &config.reminder {
                    let schedule = ReminderSchedule {
                        channel_id: reminder.channel_id,
                        message: reminder.message.clone(),
                        period: reminder.interval,
                    };
                    ReminderService::new(SerenityReminderSink::new(ctx.http.clone()), schedule)
                        .spawn(setup_shutdown.clone());
                } else {
                    tracing::info!("No reminder channel configured; reminder timer disabled");
                }

                Ok(Data { requests })
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&config.token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                return;
            }
            tracing::info!("Shutting down");
            shutdown.cancel();
            shard_manager.shutdown_all().await;
        }
    });

    client.start().await.context("Error running bot")?;

    // The client can also stop on its own (e.g. invalid token); make sure
    // background loops stop with it.
    shutdown.cancel();
    Ok(())
}
