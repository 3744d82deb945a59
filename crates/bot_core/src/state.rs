use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Single source of truth for everything the automation engine knows about
/// the live game. One instance per process, written by the patch applier and
/// the scheduler's bookkeeping, read by the action modules.
///
/// Entries are never deleted: a plot id stays in `plots` even if the server
/// stops reporting it. Absence means "never observed", not "empty".
#[derive(Debug, Clone)]
pub struct BotState {
    /// Last-write-wins mirror of per-plot server state, keyed by plot id.
    pub plots: HashMap<String, Value>,

    /// One-way latch: set true by patches, cleared only by the sell module
    /// once it has actually emptied the inventory.
    pub inventory_full: bool,

    /// Previous and current values of the seed-shop restock countdown.
    /// `seed_restock_now` is always the most recently parsed value.
    pub seed_restock_prev: Option<f64>,
    pub seed_restock_now: Option<f64>,

    /// Latch: a restock transition was detected. Consumed (reset) by the buy
    /// module; the patch applier only ever sets it.
    pub seed_stock_up: bool,

    /// Present iff the transport is currently considered down.
    pub connection_lost_at: Option<Instant>,

    /// Most recent successful automated action or keep-alive.
    pub last_activity: Instant,

    /// Resume offset for the harvest sweep. Written only by the harvest
    /// module, read-only everywhere else.
    pub harvest_cursor: usize,
}

impl BotState {
    pub fn new(now: Instant) -> Self {
        Self {
            plots: HashMap::new(),
            inventory_full: false,
            seed_restock_prev: None,
            seed_restock_now: None,
            seed_stock_up: false,
            connection_lost_at: None,
            last_activity: now,
            harvest_cursor: 0,
        }
    }

    pub fn mark_activity(&mut self, now: Instant) {
        self.last_activity = now;
    }

    pub fn idle_duration(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }

    /// Records the transport going down. Idempotent: a second close while
    /// already marked down keeps the original timestamp.
    pub fn on_connection_closed(&mut self, now: Instant) {
        if self.connection_lost_at.is_none() {
            self.connection_lost_at = Some(now);
        }
    }

    pub fn on_reconnected(&mut self) {
        self.connection_lost_at = None;
    }

    /// `None` while connected.
    pub fn disconnected_duration(&self, now: Instant) -> Option<Duration> {
        self.connection_lost_at
            .map(|lost_at| now.saturating_duration_since(lost_at))
    }
}
