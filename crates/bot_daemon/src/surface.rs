use crate::driver::{DriverCommand, DriverHandle};
use anyhow::Result;
use bot_control::AutomationSurface;
use std::time::Duration;

/// [`AutomationSurface`] backed by the driver subprocess. Lives on the
/// scheduler thread; every method is bounded by the driver call timeout.
pub struct DriverSurface {
    handle: DriverHandle,
}

impl DriverSurface {
    pub fn new(handle: DriverHandle) -> Self {
        Self { handle }
    }
}

impl AutomationSurface for DriverSurface {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.handle.call(&DriverCommand::Navigate {
            url: url.to_string(),
        })
    }

    fn reload(&mut self) -> Result<()> {
        self.handle.call(&DriverCommand::Reload)
    }

    fn press_key(&mut self, key: &str) -> Result<()> {
        self.handle.call(&DriverCommand::PressKey {
            key: key.to_string(),
        })
    }

    fn click(&mut self, x: f64, y: f64) -> Result<()> {
        self.handle.call(&DriverCommand::Click { x, y })
    }

    fn wait_millis(&mut self, ms: u64) -> Result<()> {
        // Satisfied locally; the driver never sees it.
        std::thread::sleep(Duration::from_millis(ms));
        Ok(())
    }
}
