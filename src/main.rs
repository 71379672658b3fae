mod command;
mod config;
mod giveaway;
mod messages;
mod permission;
mod platform;
mod scheduler;
mod service;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::Bot;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::platform::telegram::{self, TelegramMessenger, TelegramPermissions};
use crate::scheduler::Scheduler;
use crate::service::GiveawayService;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,giveawaybot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration; an explicit path must exist, the default may not
    let explicit_path = std::env::args().nth(1).map(PathBuf::from);
    let required = explicit_path.is_some();
    let config_path = explicit_path.unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path, required)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully (bot token found, value not shown)");
    info!("  Clear webhook: {}", config.telegram.clear_webhook);
    info!(
        "  Keep closed giveaways: {}h",
        config.giveaway.retain_closed_hours
    );

    let bot = Bot::new(config.bot_token());
    if config.telegram.clear_webhook {
        telegram::clear_webhook(&bot).await;
    }

    let mut scheduler = Scheduler::new().await?;

    let service = Arc::new(GiveawayService::new(
        Arc::new(TelegramMessenger::new(bot.clone())),
        Arc::new(TelegramPermissions::new(bot.clone())),
        Arc::new(scheduler.clone()),
    ));

    scheduler::tasks::register_builtin_tasks(&scheduler, service.clone(), &config).await?;
    scheduler.start().await?;

    info!("Giveaway bot is running (long polling)");
    telegram::run(service, bot).await?;

    scheduler.shutdown().await?;
    info!("Process finished");
    Ok(())
}
