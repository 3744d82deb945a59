use crate::{failed, ActionModule, AutomationSurface, RunOutcome};
use anyhow::Result;
use bot_core::BotState;

// Sell flow: open inventory, hit "sell all", confirm. Coordinates match the
// game's 1280x720 viewport.
const SELL_ALL_BUTTON: (f64, f64) = (1112.0, 612.0);
const CONFIRM_BUTTON: (f64, f64) = (640.0, 452.0);
const MENU_SETTLE_MS: u64 = 250;

/// Empties the inventory once the `inventory_full` latch is set.
///
/// This module is the latch's designated consumer: the patch applier only
/// ever sets `inventory_full`, and only a successful sell clears it.
pub struct SellModule;

impl SellModule {
    fn sell_all(surface: &mut dyn AutomationSurface) -> Result<()> {
        surface.press_key("KeyI")?;
        surface.wait_millis(MENU_SETTLE_MS)?;
        surface.click(SELL_ALL_BUTTON.0, SELL_ALL_BUTTON.1)?;
        surface.wait_millis(MENU_SETTLE_MS)?;
        surface.click(CONFIRM_BUTTON.0, CONFIRM_BUTTON.1)?;
        surface.press_key("Escape")?;
        Ok(())
    }
}

impl ActionModule for SellModule {
    fn name(&self) -> &'static str {
        "sell"
    }

    fn run(&mut self, state: &mut BotState, surface: &mut dyn AutomationSurface) -> RunOutcome {
        if !state.inventory_full {
            return RunOutcome::NoOp;
        }
        match Self::sell_all(surface) {
            Ok(()) => {
                state.inventory_full = false;
                RunOutcome::Acted
            }
            Err(err) => failed(&err),
        }
    }
}
