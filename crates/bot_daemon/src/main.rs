//! Automation engine for the garden game: mirrors server-pushed state from
//! the browser-driver subprocess and arbitrates harvest/sell/buy behaviors
//! against it.

mod config;
mod driver;
mod scheduler;
mod state;
mod surface;

use anyhow::{Context, Result};
use bot_control::{ActionModule, BuyModule, HarvestModule, SellModule};
use bot_core::BotState;
use clap::Parser;
use config::Config;
use driver::DriverClient;
use parking_lot::Mutex;
use scheduler::SchedulerConfig;
use state::{SharedState, CLOSE_QUEUE_DEPTH, PATCH_QUEUE_DEPTH};
use std::sync::Arc;
use std::time::Instant;
use surface::DriverSurface;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(about = "Garden automation engine")]
struct Cli {
    /// Override the browser-driver command line (env: DRIVER_CMD).
    #[arg(long)]
    driver_cmd: Option<String>,
    /// Override the game URL (env: GAME_URL).
    #[arg(long)]
    game_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(driver_cmd) = cli.driver_cmd {
        config.driver_cmd = driver_cmd;
    }
    if let Some(game_url) = cli.game_url {
        config.game_url = game_url;
    }

    run(config).await
}

async fn run(config: Config) -> Result<()> {
    info!(
        game_url = %config.game_url,
        harvest = config.enable_harvest,
        sell = config.enable_sell,
        buy = config.enable_buy,
        tick = ?config.engine_tick,
        "starting automation engine"
    );

    let shared: SharedState = Arc::new(Mutex::new(BotState::new(Instant::now())));
    let (patch_tx, patch_rx) = tokio::sync::mpsc::channel(PATCH_QUEUE_DEPTH);
    let (close_tx, close_rx) = tokio::sync::mpsc::channel(CLOSE_QUEUE_DEPTH);

    let ingest_frames = config.any_module_enabled();
    if !ingest_frames {
        info!("no modules enabled, skipping frame ingestion");
    }

    let client = DriverClient::spawn(&config, close_tx, patch_tx, ingest_frames)
        .context("launching browser driver")?;

    // Initial navigation is the one fatal step: nothing can proceed without
    // a loaded game page. Driver calls block, so hop off the runtime.
    let handle = client.handle();
    let game_url = config.game_url.clone();
    tokio::task::spawn_blocking(move || {
        handle.call(&driver::DriverCommand::Navigate { url: game_url })
    })
    .await
    .context("navigation task panicked")?
    .with_context(|| format!("failed to load {}", config.game_url))?;
    info!("game page loaded");

    let modules = build_modules(&config);
    let scheduler_config = SchedulerConfig {
        tick: config.engine_tick,
        idle_threshold: config.idle_threshold,
        auto_reconnect: config.auto_reconnect,
        reconnect_wait: config.reconnect_wait,
        debug_ws: config.debug_ws,
    };
    let mut surface = DriverSurface::new(client.handle());
    let scheduler_state = shared.clone();
    std::thread::Builder::new()
        .name("scheduler".to_string())
        .spawn(move || {
            scheduler::run_loop(
                &scheduler_state,
                patch_rx,
                close_rx,
                modules,
                &mut surface,
                &scheduler_config,
            );
        })
        .context("spawning scheduler thread")?;

    tokio::signal::ctrl_c()
        .await
        .context("waiting for interrupt")?;
    info!("interrupt received, shutting down");
    Ok(())
}

/// Builds the enabled modules in scheduler priority order:
/// sell > buy > harvest.
fn build_modules(config: &Config) -> Vec<Box<dyn ActionModule + Send>> {
    let mut modules: Vec<Box<dyn ActionModule + Send>> = Vec::new();
    if config.enable_sell {
        modules.push(Box::new(SellModule));
    }
    if config.enable_buy {
        modules.push(Box::new(BuyModule::new(config.buy_allowed_seeds.clone())));
    }
    if config.enable_harvest {
        modules.push(Box::new(HarvestModule::new(config.harvest_tier.clone())));
    }
    if config.enable_plant {
        tracing::warn!("ENABLE_PLANT is set but no plant module is implemented yet");
    }
    modules
}
