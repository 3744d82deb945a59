//! Behavior tests for the action modules against a recording mock surface.

use anyhow::{anyhow, Result};
use bot_control::{
    ActionModule, AutomationSurface, BuyModule, HarvestModule, RunOutcome, SellModule,
};
use bot_core::BotState;
use serde_json::json;
use std::time::Instant;

// --- Mock surface -------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Op {
    Navigate(String),
    Reload,
    PressKey(String),
    Click(f64, f64),
    WaitMillis(u64),
}

#[derive(Default)]
struct MockSurface {
    ops: Vec<Op>,
    fail_all: bool,
}

impl AutomationSurface for MockSurface {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.record(Op::Navigate(url.to_string()))
    }
    fn reload(&mut self) -> Result<()> {
        self.record(Op::Reload)
    }
    fn press_key(&mut self, key: &str) -> Result<()> {
        self.record(Op::PressKey(key.to_string()))
    }
    fn click(&mut self, x: f64, y: f64) -> Result<()> {
        self.record(Op::Click(x, y))
    }
    fn wait_millis(&mut self, ms: u64) -> Result<()> {
        self.record(Op::WaitMillis(ms))
    }
}

impl MockSurface {
    fn record(&mut self, op: Op) -> Result<()> {
        if self.fail_all {
            return Err(anyhow!("driver gone"));
        }
        self.ops.push(op);
        Ok(())
    }

    fn clicks(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, Op::Click(..)))
            .count()
    }
}

// --- Fixtures -----------------------------------------------------------

fn state_with_plots(plots: &[(&str, serde_json::Value)]) -> BotState {
    let mut state = BotState::new(Instant::now());
    for (id, value) in plots {
        state.plots.insert((*id).to_string(), value.clone());
    }
    state
}

fn ready_plot(tier: &str) -> serde_json::Value {
    json!({"readyToHarvest": true, "crop": {"species": "moonflower", "tier": tier}})
}

fn growing_plot() -> serde_json::Value {
    json!({"readyToHarvest": false, "crop": {"species": "moonflower", "tier": "S"}})
}

// --- Harvest ------------------------------------------------------------

#[test]
fn harvest_acts_on_ready_plot_of_matching_tier() {
    let mut state = state_with_plots(&[("0", growing_plot()), ("1", ready_plot("S"))]);
    let mut surface = MockSurface::default();
    let mut harvest = HarvestModule::new("S");

    assert_eq!(harvest.run(&mut state, &mut surface), RunOutcome::Acted);
    assert_eq!(surface.clicks(), 1);
    assert!(surface.ops.contains(&Op::PressKey("KeyE".to_string())));
}

#[test]
fn harvest_ignores_other_tiers() {
    let mut state = state_with_plots(&[("0", ready_plot("A"))]);
    let mut surface = MockSurface::default();
    let mut harvest = HarvestModule::new("S");

    assert_eq!(harvest.run(&mut state, &mut surface), RunOutcome::NoOp);
    assert!(surface.ops.is_empty());
}

#[test]
fn harvest_is_noop_while_inventory_full() {
    let mut state = state_with_plots(&[("0", ready_plot("S"))]);
    state.inventory_full = true;
    let mut surface = MockSurface::default();
    let mut harvest = HarvestModule::new("S");

    assert_eq!(harvest.run(&mut state, &mut surface), RunOutcome::NoOp);
    assert!(surface.ops.is_empty());
}

#[test]
fn harvest_is_noop_with_no_observed_plots() {
    let mut state = BotState::new(Instant::now());
    let mut surface = MockSurface::default();
    let mut harvest = HarvestModule::new("S");

    assert_eq!(harvest.run(&mut state, &mut surface), RunOutcome::NoOp);
}

#[test]
fn harvest_cursor_advances_past_harvested_plot() {
    let mut state = state_with_plots(&[("0", ready_plot("S")), ("1", ready_plot("S"))]);
    let mut surface = MockSurface::default();
    let mut harvest = HarvestModule::new("S");

    assert_eq!(harvest.run(&mut state, &mut surface), RunOutcome::Acted);
    assert_eq!(state.harvest_cursor, 1);

    // Second call resumes at the next plot rather than re-clicking slot 0.
    assert_eq!(harvest.run(&mut state, &mut surface), RunOutcome::Acted);
    assert_eq!(state.harvest_cursor, 2);
    assert_eq!(surface.clicks(), 2);
    let clicks: Vec<&Op> = surface
        .ops
        .iter()
        .filter(|op| matches!(op, Op::Click(..)))
        .collect();
    assert_ne!(clicks[0], clicks[1], "both calls clicked the same slot");
}

#[test]
fn harvest_sweep_wraps_around_the_garden() {
    let mut state = state_with_plots(&[("0", ready_plot("S")), ("1", growing_plot())]);
    state.harvest_cursor = 1;
    let mut surface = MockSurface::default();
    let mut harvest = HarvestModule::new("S");

    // Cursor starts past the only ready plot; the sweep must wrap to find it.
    assert_eq!(harvest.run(&mut state, &mut surface), RunOutcome::Acted);
    assert_eq!(state.harvest_cursor, 1);
}

#[test]
fn harvest_surface_failure_is_reported_not_thrown() {
    let mut state = state_with_plots(&[("0", ready_plot("S"))]);
    let mut surface = MockSurface {
        fail_all: true,
        ..MockSurface::default()
    };
    let mut harvest = HarvestModule::new("S");

    assert!(matches!(
        harvest.run(&mut state, &mut surface),
        RunOutcome::Failed(_)
    ));
    // A failed click must not advance the cursor.
    assert_eq!(state.harvest_cursor, 0);
}

// --- Sell ---------------------------------------------------------------

#[test]
fn sell_is_noop_until_inventory_full() {
    let mut state = BotState::new(Instant::now());
    let mut surface = MockSurface::default();
    let mut sell = SellModule;

    assert_eq!(sell.run(&mut state, &mut surface), RunOutcome::NoOp);
    assert!(surface.ops.is_empty());
}

#[test]
fn sell_clears_the_inventory_latch_on_success() {
    let mut state = BotState::new(Instant::now());
    state.inventory_full = true;
    let mut surface = MockSurface::default();
    let mut sell = SellModule;

    assert_eq!(sell.run(&mut state, &mut surface), RunOutcome::Acted);
    assert!(!state.inventory_full);
    assert!(surface.clicks() >= 2, "expected sell-all plus confirm");
}

#[test]
fn sell_failure_leaves_the_latch_set_for_retry() {
    let mut state = BotState::new(Instant::now());
    state.inventory_full = true;
    let mut surface = MockSurface {
        fail_all: true,
        ..MockSurface::default()
    };
    let mut sell = SellModule;

    assert!(matches!(
        sell.run(&mut state, &mut surface),
        RunOutcome::Failed(_)
    ));
    assert!(state.inventory_full, "latch must survive a failed sell");
}

// --- Buy ----------------------------------------------------------------

#[test]
fn buy_waits_for_the_restock_latch() {
    let mut state = BotState::new(Instant::now());
    let mut surface = MockSurface::default();
    let mut buy = BuyModule::new(vec!["moonflower".to_string()]);

    assert_eq!(buy.run(&mut state, &mut surface), RunOutcome::NoOp);
}

#[test]
fn buy_consumes_the_restock_latch() {
    let mut state = BotState::new(Instant::now());
    state.seed_stock_up = true;
    let mut surface = MockSurface::default();
    let mut buy = BuyModule::new(vec!["moonflower".to_string()]);

    assert_eq!(buy.run(&mut state, &mut surface), RunOutcome::Acted);
    assert!(!state.seed_stock_up, "one restock buys exactly once");

    // The latch is consumed, so a second call has nothing to do.
    assert_eq!(buy.run(&mut state, &mut surface), RunOutcome::NoOp);
}

#[test]
fn buy_with_empty_allow_list_never_acts() {
    let mut state = BotState::new(Instant::now());
    state.seed_stock_up = true;
    let mut surface = MockSurface::default();
    let mut buy = BuyModule::new(Vec::new());

    assert_eq!(buy.run(&mut state, &mut surface), RunOutcome::NoOp);
    assert!(state.seed_stock_up, "latch must not be consumed by a no-op");
}

#[test]
fn buy_failure_keeps_the_latch_for_the_next_restock_pass() {
    let mut state = BotState::new(Instant::now());
    state.seed_stock_up = true;
    let mut surface = MockSurface {
        fail_all: true,
        ..MockSurface::default()
    };
    let mut buy = BuyModule::new(vec!["moonflower".to_string()]);

    assert!(matches!(
        buy.run(&mut state, &mut surface),
        RunOutcome::Failed(_)
    ));
    assert!(state.seed_stock_up);
}
