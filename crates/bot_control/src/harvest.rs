use crate::{failed, ActionModule, AutomationSurface, RunOutcome};
use anyhow::Result;
use bot_core::{ready_tier, BotState};

// Garden layout: plots render as a fixed grid. Slot index -> screen
// coordinates, matching the game's 1280x720 viewport.
const GRID_ORIGIN_X: f64 = 312.0;
const GRID_ORIGIN_Y: f64 = 168.0;
const GRID_CELL_PX: f64 = 96.0;
const GRID_COLUMNS: usize = 8;

const CLICK_SETTLE_MS: u64 = 120;

/// Harvests ready crops of the configured tier, one plot per call.
///
/// The sweep resumes from `harvest_cursor` so successive ticks cover the
/// whole garden instead of re-checking the same early plots. Plot ids are
/// visited in sorted order to make the sweep deterministic.
pub struct HarvestModule {
    tier: String,
}

impl HarvestModule {
    pub fn new(tier: impl Into<String>) -> Self {
        Self { tier: tier.into() }
    }

    fn harvest_slot(&self, surface: &mut dyn AutomationSurface, slot: usize) -> Result<()> {
        let col = slot % GRID_COLUMNS;
        let row = slot / GRID_COLUMNS;
        let (x, y) = (
            GRID_ORIGIN_X + GRID_CELL_PX * col as f64,
            GRID_ORIGIN_Y + GRID_CELL_PX * row as f64,
        );
        surface.click(x, y)?;
        surface.wait_millis(CLICK_SETTLE_MS)?;
        surface.press_key("KeyE")?;
        Ok(())
    }
}

impl ActionModule for HarvestModule {
    fn name(&self) -> &'static str {
        "harvest"
    }

    fn run(&mut self, state: &mut BotState, surface: &mut dyn AutomationSurface) -> RunOutcome {
        // A full inventory would swallow the harvest; wait for sell.
        if state.inventory_full || state.plots.is_empty() {
            return RunOutcome::NoOp;
        }

        let mut plot_ids: Vec<String> = state.plots.keys().cloned().collect();
        plot_ids.sort();

        let start = state.harvest_cursor % plot_ids.len();
        for offset in 0..plot_ids.len() {
            let index = (start + offset) % plot_ids.len();
            let plot_id = &plot_ids[index];
            let ready = ready_tier(&state.plots[plot_id.as_str()]) == Some(self.tier.as_str());
            if !ready {
                continue;
            }

            // Plot ids double as grid slot indices; a non-numeric id falls
            // back to its sweep position.
            let slot = plot_id.parse::<usize>().unwrap_or(index);
            return match self.harvest_slot(surface, slot) {
                Ok(()) => {
                    state.harvest_cursor = index + 1;
                    RunOutcome::Acted
                }
                Err(err) => failed(&err),
            };
        }

        RunOutcome::NoOp
    }
}
