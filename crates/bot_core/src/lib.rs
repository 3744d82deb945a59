//! `bot_core` — local mirror of server-pushed game state.
//!
//! No IO, no network, no clock of its own. Callers pass `Instant`s in;
//! the transport and scheduler live in `bot_daemon`.

mod patch;
mod plot;
mod state;

pub use patch::{apply_message, StateEvent, INVENTORY_FULL_PATH, PLOTS_PREFIX, SEED_RESTOCK_PATH};
pub use plot::ready_tier;
pub use state::BotState;

#[cfg(test)]
mod tests;
