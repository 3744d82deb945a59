//! `bot_control` — automated behaviors and the boundary they act through.
//!
//! Each behavior implements [`ActionModule`]: one bounded unit of work per
//! call, reading the shared [`BotState`] mirror and driving the browser via
//! [`AutomationSurface`]. The scheduler in `bot_daemon` owns sequencing;
//! modules never run concurrently.

use anyhow::Result;
use bot_core::BotState;

mod buy;
mod harvest;
mod sell;

pub use buy::BuyModule;
pub use harvest::HarvestModule;
pub use sell::SellModule;

/// What the browser-driver collaborator can do for us. Implementations must
/// bound every call (the real driver enforces a reply timeout); a mock
/// suffices for tests.
pub trait AutomationSurface {
    fn navigate(&mut self, url: &str) -> Result<()>;
    fn reload(&mut self) -> Result<()>;
    fn press_key(&mut self, key: &str) -> Result<()>;
    fn click(&mut self, x: f64, y: f64) -> Result<()>;
    fn wait_millis(&mut self, ms: u64) -> Result<()>;
}

/// Outcome of one module invocation. Failure is data, not unwinding: the
/// scheduler logs `Failed` and moves on, exactly as it treats `NoOp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Something observable changed; the scheduler counts this tick as
    /// productive and skips lower-priority modules.
    Acted,
    /// Nothing to do right now.
    NoOp,
    /// The attempt went wrong; carries an operator-facing reason.
    Failed(String),
}

/// One automated behavior. `run` must return promptly after at most one
/// bounded unit of work so the scheduler retains control.
pub trait ActionModule {
    fn name(&self) -> &'static str;
    fn run(&mut self, state: &mut BotState, surface: &mut dyn AutomationSurface) -> RunOutcome;
}

/// Maps a surface error into `RunOutcome::Failed`.
fn failed(err: &anyhow::Error) -> RunOutcome {
    RunOutcome::Failed(format!("{err:#}"))
}
