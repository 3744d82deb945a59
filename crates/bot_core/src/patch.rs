use crate::state::BotState;
use serde::Deserialize;
use serde_json::Value;

/// Patch paths we act on. Everything else in the server's state tree is
/// ignored; the schema is treated as append-only and unknown-tolerant.
pub const SEED_RESTOCK_PATH: &str = "/child/data/shops/seed/secondsUntilRestock";
pub const INVENTORY_FULL_PATH: &str = "/child/data/inventory/isFull";
pub const PLOTS_PREFIX: &str = "/child/data/garden/plots/";

#[derive(Deserialize)]
struct PartialStateMessage {
    #[serde(rename = "type")]
    message_type: String,
    #[serde(default)]
    patches: Vec<Patch>,
}

#[derive(Deserialize)]
struct Patch {
    path: Option<String>,
    #[serde(default)]
    value: Value,
}

/// What a message changed, for operator-facing debug logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateEvent {
    SeedRestocked,
    InventoryFull,
    PlotUpdated { plot_id: String },
}

/// Applies one raw transport frame to the state mirror.
///
/// Non-`PartialState` messages and malformed payloads are discarded without
/// touching the state; a bad frame must never desynchronize the stream.
/// Returns the edge events this frame produced.
pub fn apply_message(state: &mut BotState, raw: &str) -> Vec<StateEvent> {
    let Ok(message) = serde_json::from_str::<PartialStateMessage>(raw) else {
        return Vec::new();
    };
    if message.message_type != "PartialState" {
        return Vec::new();
    }

    let mut events = Vec::new();
    for patch in message.patches {
        let Some(path) = patch.path else { continue };
        apply_patch(state, &path, patch.value, &mut events);
    }
    events
}

fn apply_patch(state: &mut BotState, path: &str, value: Value, events: &mut Vec<StateEvent>) {
    if path == SEED_RESTOCK_PATH {
        if let Some(curr) = value.as_f64() {
            let prev = state.seed_restock_now;
            state.seed_restock_prev = prev;
            state.seed_restock_now = Some(curr);

            // Restock signature: the countdown was about to expire and then
            // jumped back up. Checking `curr == max` instead would miss
            // restocks observed mid-window.
            if let Some(prev) = prev {
                if prev <= 1.0 && curr > prev {
                    state.seed_stock_up = true;
                    events.push(StateEvent::SeedRestocked);
                }
            }
        }
    } else if path == INVENTORY_FULL_PATH {
        // One-way latch: only an explicit `true` sets it, nothing here
        // clears it.
        if value == Value::Bool(true) {
            state.inventory_full = true;
            events.push(StateEvent::InventoryFull);
        }
    } else if let Some(rest) = path.strip_prefix(PLOTS_PREFIX) {
        let plot_id = rest.rsplit('/').next().unwrap_or(rest).to_string();
        state.plots.insert(plot_id.clone(), value);
        events.push(StateEvent::PlotUpdated { plot_id });
    }
}
