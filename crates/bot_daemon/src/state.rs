use bot_core::BotState;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// The state mirror. Only the scheduler thread locks it, for the span of
/// one tick; the driver-event reader stays lock-free and communicates over
/// the channels below.
pub type SharedState = Arc<Mutex<BotState>>;

/// Raw transport frames queued for the scheduler, which drains and applies
/// them at the start of each tick.
pub type PatchTx = mpsc::Sender<String>;
pub type PatchRx = mpsc::Receiver<String>;

/// Socket-close timestamps, drained at the same tick boundary. Marking the
/// loss is idempotent, so a dropped duplicate costs nothing.
pub type CloseTx = mpsc::Sender<Instant>;
pub type CloseRx = mpsc::Receiver<Instant>;

/// Bounded queue depth for inbound frames. Overflow drops the frame: the
/// mirror is last-write-wins, so a dropped update is repaired by the next
/// patch to the same path.
pub const PATCH_QUEUE_DEPTH: usize = 256;

pub const CLOSE_QUEUE_DEPTH: usize = 4;
