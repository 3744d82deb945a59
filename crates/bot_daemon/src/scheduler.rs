//! The tick loop: fixed-priority arbitration between reconnect, the action
//! modules, and the idle keep-alive.
//!
//! Runs on its own thread, never inside the async runtime: every driver
//! call blocks. Strict sequencing is the loop's core correctness property:
//! one behavior at a time, no interleaved side effects within a tick.

use crate::state::{CloseRx, PatchRx, SharedState};
use bot_control::{ActionModule, AutomationSurface, RunOutcome};
use bot_core::BotState;
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Settle time after a reload before the next tick may act.
const RELOAD_SETTLE_MS: u64 = 5_000;
/// Gap between the two opposite keep-alive key presses.
const KEEPALIVE_GAP_MS: u64 = 150;
/// Upper bound on the random addition to each tick's sleep, so the loop
/// never runs at a perfectly periodic, fingerprintable cadence.
const TICK_JITTER_MAX_SECS: f64 = 0.05;

const RECONNECT_LOG_EVERY: u64 = 20;
const STATUS_LOG_EVERY: u64 = 100;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub tick: Duration,
    pub idle_threshold: Duration,
    pub auto_reconnect: bool,
    pub reconnect_wait: Duration,
    pub debug_ws: bool,
}

/// What one tick did. At most one of these happens per tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TickOutcome {
    /// The reconnect path ran; no module was considered this tick.
    Reloaded,
    /// The named module acted; lower-priority modules were skipped.
    Acted(&'static str),
    KeptAlive,
    Idle,
}

/// One pass of the arbitration sequence. Priority is total and fixed:
/// reconnect > modules (in registration order) > keep-alive.
pub(crate) fn tick_once(
    state: &mut BotState,
    modules: &mut [Box<dyn ActionModule + Send>],
    surface: &mut dyn AutomationSurface,
    config: &SchedulerConfig,
    now: Instant,
) -> TickOutcome {
    if config.auto_reconnect {
        if let Some(down_for) = state.disconnected_duration(now) {
            if down_for >= config.reconnect_wait {
                return reload_session(state, surface, now, down_for);
            }
        }
    }

    for module in modules.iter_mut() {
        match module.run(state, surface) {
            RunOutcome::Acted => {
                // Modules are mutually exclusive within a tick; the first
                // one to act wins it.
                state.mark_activity(now);
                return TickOutcome::Acted(module.name());
            }
            RunOutcome::NoOp => {}
            RunOutcome::Failed(reason) => {
                warn!(module = module.name(), %reason, "module failed, no action taken");
            }
        }
    }

    if state.idle_duration(now) > config.idle_threshold {
        match keep_alive(surface) {
            Ok(()) => {
                state.mark_activity(now);
                return TickOutcome::KeptAlive;
            }
            Err(err) => warn!("keep-alive failed: {err:#}"),
        }
    }

    TickOutcome::Idle
}

fn reload_session(
    state: &mut BotState,
    surface: &mut dyn AutomationSurface,
    now: Instant,
    down_for: Duration,
) -> TickOutcome {
    info!("connection lost for {:.1}s, reloading game", down_for.as_secs_f64());
    state.on_reconnected();
    match surface.reload() {
        Ok(()) => {
            state.mark_activity(now);
            let _ = surface.wait_millis(RELOAD_SETTLE_MS);
            info!("game reloaded");
        }
        Err(err) => {
            // Restart the grace window rather than hammering a dead driver.
            error!("reload failed: {err:#}");
            state.on_connection_closed(now);
        }
    }
    TickOutcome::Reloaded
}

/// Minimal synthetic input so the game sees a live player: two opposite
/// presses that cancel out.
fn keep_alive(surface: &mut dyn AutomationSurface) -> anyhow::Result<()> {
    surface.press_key("ArrowLeft")?;
    surface.wait_millis(KEEPALIVE_GAP_MS)?;
    surface.press_key("ArrowRight")?;
    Ok(())
}

/// Runs forever. Each tick: drain queued transport frames into the mirror,
/// arbitrate, then sleep the configured interval plus jitter.
pub fn run_loop(
    shared: &SharedState,
    mut patch_rx: PatchRx,
    mut close_rx: CloseRx,
    mut modules: Vec<Box<dyn ActionModule + Send>>,
    surface: &mut (dyn AutomationSurface + Send),
    config: &SchedulerConfig,
) {
    let mut tick_count: u64 = 0;
    loop {
        tick_count += 1;
        {
            let mut state = shared.lock();
            apply_close_events(&mut state, &mut close_rx);
            apply_queued_patches(&mut state, &mut patch_rx, config.debug_ws);

            let now = Instant::now();
            let outcome = tick_once(&mut state, &mut modules, surface, config, now);
            log_progress(&state, config, &outcome, tick_count, now);
        }

        let jitter = rand::thread_rng().gen_range(0.0..TICK_JITTER_MAX_SECS);
        std::thread::sleep(config.tick + Duration::from_secs_f64(jitter));
    }
}

/// Folds queued socket-close timestamps into the mirror. The close keeps
/// the timestamp of when the reader saw it, not of this tick, so the
/// reconnect grace window is measured from the actual loss.
fn apply_close_events(state: &mut BotState, close_rx: &mut CloseRx) {
    while let Ok(lost_at) = close_rx.try_recv() {
        state.on_connection_closed(lost_at);
    }
}

/// Applies every frame queued since the previous tick. Doing this at the
/// tick boundary gives patches and modules a clean ordering: a module never
/// observes a half-applied batch.
fn apply_queued_patches(state: &mut BotState, patch_rx: &mut PatchRx, debug_ws: bool) {
    while let Ok(raw) = patch_rx.try_recv() {
        let events = bot_core::apply_message(state, &raw);
        if debug_ws {
            for event in events {
                debug!(?event, "state event");
            }
        }
    }
}

fn log_progress(
    state: &BotState,
    config: &SchedulerConfig,
    outcome: &TickOutcome,
    tick_count: u64,
    now: Instant,
) {
    if let TickOutcome::Acted(name) = outcome {
        debug!(module = name, "module acted");
    }
    if tick_count % RECONNECT_LOG_EVERY == 0 {
        if let Some(down_for) = state.disconnected_duration(now) {
            info!(
                "waiting for reconnect: {:.1}s / {:.1}s",
                down_for.as_secs_f64(),
                config.reconnect_wait.as_secs_f64()
            );
        }
    }
    if tick_count % STATUS_LOG_EVERY == 0 {
        info!(
            tick_count,
            connected = state.connection_lost_at.is_none(),
            plots = state.plots.len(),
            inventory_full = state.inventory_full,
            "status"
        );
    }
}
