// Exact float comparison is fine here: restock values round-trip through
// JSON untouched.
#![allow(clippy::float_cmp)]

use super::*;
use serde_json::json;
use std::time::Instant;

mod plot;

// --- Shared test helpers ------------------------------------------------

fn test_state() -> BotState {
    BotState::new(Instant::now())
}

/// Builds a `PartialState` frame with the given `(path, value)` patches.
fn partial_state(patches: &[(&str, serde_json::Value)]) -> String {
    let patches: Vec<_> = patches
        .iter()
        .map(|(path, value)| json!({"path": path, "value": value}))
        .collect();
    json!({"type": "PartialState", "patches": patches}).to_string()
}

/// Applies a sequence of restock-countdown values, returning the state.
fn feed_restock_values(values: &[f64]) -> BotState {
    let mut state = test_state();
    for value in values {
        apply_message(
            &mut state,
            &partial_state(&[(SEED_RESTOCK_PATH, json!(value))]),
        );
    }
    state
}
