// This is the entry point of the Discord bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (JSON files on disk)
// - `discord/` = Discord-specific adapters (commands, views, embeds)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Repair dangling reward references left by earlier runs
// 4. Set up the Discord framework and register commands

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
use crate::core::access::AccessPolicy;
use crate::core::audit::AuditService;
use crate::core::events::EventService;
use crate::core::inventory::InventoryService;
use crate::core::rewards::WarehouseService;
use crate::core::storage::WriteGate;
use crate::discord::{Data, Error, ViewSettings};
use crate::infra::{JsonAuditStore, JsonEventStore, JsonUserStore, JsonWarehouseStore};
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = BotConfig::from_env()?;
    tracing::info!(
        data_dir = %config.data_dir.display(),
        admin_roles = config.admin_role_ids.len(),
        timezone = %config.timezone,
        "Configuration loaded"
    );

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Every service shares the same stores and the same write gate, so a
    // command that touches several files never interleaves with another.

    let data_dir = &config.data_dir;
    let rewards = Arc::new(
        JsonWarehouseStore::new(data_dir.join("warehouse.json"))
            .context("Failed to open the reward warehouse")?,
    );
    let users = Arc::new(
        JsonUserStore::new(data_dir.join("users.json"))
            .context("Failed to open the user inventories")?,
    );
    let events = Arc::new(
        JsonEventStore::new(data_dir.join("events.json")).context("Failed to open the events")?,
    );
    let audit_store =
        Arc::new(JsonAuditStore::new(data_dir).context("Failed to open the audit log folder")?);
    let gate = WriteGate::new();

    let warehouse = Arc::new(WarehouseService::new(
        Arc::clone(&rewards),
        Arc::clone(&users),
        Arc::clone(&events),
        gate.clone(),
    ));
    let inventory = Arc::new(InventoryService::new(
        Arc::clone(&rewards),
        Arc::clone(&users),
        gate.clone(),
    ));
    let event_service = Arc::new(EventService::new(
        Arc::clone(&rewards),
        Arc::clone(&events),
        gate,
    ));
    let audit = Arc::new(AuditService::new(audit_store));

    let report = warehouse
        .reconcile_references()
        .await
        .context("Failed to reconcile reward references")?;
    tracing::info!(
        users_repaired = report.users_repaired,
        events_repaired = report.events_repaired,
        "Reward references reconciled"
    );

    let data = Data {
        warehouse,
        inventory,
        events: event_service,
        audit,
        access: AccessPolicy::new(config.admin_role_ids.clone()),
        views: ViewSettings {
            confirm_timeout: config.confirm_timeout,
            pagination_timeout: config.pagination_timeout,
            page_size: config.page_size,
            timezone: config.timezone,
        },
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    // Member roles and permissions arrive with the interaction, so no
    // privileged intents are needed.
    let intents = serenity::GatewayIntents::non_privileged();
    let dev_guild_id = config.dev_guild_id;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: discord::commands::all(),
            on_error: |error| Box::pin(discord::on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                tracing::info!(user = %ready.user.name, "🤖 Bot is starting up...");

                // Guild registration shows up immediately; global can take up
                // to an hour to propagate.
                match dev_guild_id {
                    Some(guild_id) => {
                        poise::builtins::register_in_guild(
                            ctx,
                            &framework.options().commands,
                            serenity::GuildId::new(guild_id),
                        )
                        .await?;
                        tracing::info!(guild_id, "✅ Commands registered in dev guild");
                    }
                    None => {
                        poise::builtins::register_globally(ctx, &framework.options().commands)
                            .await?;
                        tracing::info!("✅ Commands registered globally");
                    }
                }

                ctx.set_activity(Some(serenity::ActivityData::watching("the reward warehouse")));
                tracing::info!("🚀 Bot is ready!");
                Ok::<Data, Error>(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&config.token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    client.start().await.context("Error running bot")?;
    Ok(())
}
