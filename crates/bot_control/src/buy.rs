use crate::{failed, ActionModule, AutomationSurface, RunOutcome};
use anyhow::Result;
use bot_core::BotState;

const SHOP_KEY: &str = "KeyB";
const BUY_BUTTON: (f64, f64) = (948.0, 388.0);
const SEARCH_FIELD: (f64, f64) = (640.0, 132.0);
const MENU_SETTLE_MS: u64 = 250;

/// Buys allow-listed seeds when the shop restock latch fires.
///
/// Consumes `seed_stock_up`: the applier sets it on the countdown edge and
/// this module resets it once a buying pass ran, so one restock triggers
/// exactly one pass.
pub struct BuyModule {
    allowed_seeds: Vec<String>,
}

impl BuyModule {
    pub fn new(allowed_seeds: Vec<String>) -> Self {
        Self { allowed_seeds }
    }

    fn buy_seed(surface: &mut dyn AutomationSurface, seed: &str) -> Result<()> {
        surface.click(SEARCH_FIELD.0, SEARCH_FIELD.1)?;
        for ch in seed.chars().filter(char::is_ascii_alphanumeric) {
            surface.press_key(&format!("Key{}", ch.to_ascii_uppercase()))?;
        }
        surface.wait_millis(MENU_SETTLE_MS)?;
        surface.click(BUY_BUTTON.0, BUY_BUTTON.1)?;
        Ok(())
    }

    fn buying_pass(&self, surface: &mut dyn AutomationSurface) -> Result<()> {
        surface.press_key(SHOP_KEY)?;
        surface.wait_millis(MENU_SETTLE_MS)?;
        for seed in &self.allowed_seeds {
            Self::buy_seed(surface, seed)?;
        }
        surface.press_key("Escape")?;
        Ok(())
    }
}

impl ActionModule for BuyModule {
    fn name(&self) -> &'static str {
        "buy"
    }

    fn run(&mut self, state: &mut BotState, surface: &mut dyn AutomationSurface) -> RunOutcome {
        if !state.seed_stock_up || self.allowed_seeds.is_empty() {
            return RunOutcome::NoOp;
        }
        match self.buying_pass(surface) {
            Ok(()) => {
                state.seed_stock_up = false;
                RunOutcome::Acted
            }
            Err(err) => failed(&err),
        }
    }
}
