//! Client for the browser-driver subprocess (the external session layer).
//!
//! The driver owns the browser: launch, stealth patching, input injection,
//! and the game's websocket. We speak newline-delimited JSON to it:
//! commands on its stdin, acknowledged by id; events (frames, socket close)
//! on its stdout.

use crate::config::Config;
use crate::state::{CloseTx, PatchTx};
use anyhow::{bail, Context, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc as std_mpsc, Arc};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Upper bound on any single driver call, ack included. Generous enough
/// for a page load; a stuck driver fails the call instead of stalling the
/// scheduler forever.
pub const OP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "cmd", rename_all = "camelCase")]
pub enum DriverCommand {
    Navigate { url: String },
    Reload,
    PressKey { key: String },
    Click { x: f64, y: f64 },
}

#[derive(Serialize)]
struct CommandEnvelope<'a> {
    id: u64,
    #[serde(flatten)]
    command: &'a DriverCommand,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
enum DriverEvent {
    Ready,
    Frame {
        payload: String,
    },
    SocketClosed,
    Ack {
        id: u64,
        ok: bool,
        #[serde(default)]
        error: Option<String>,
    },
}

type AckResult = Result<(), String>;
type PendingAcks = Arc<Mutex<HashMap<u64, std_mpsc::SyncSender<AckResult>>>>;

/// Cloneable handle for issuing driver commands from blocking threads.
#[derive(Clone)]
pub struct DriverHandle {
    next_id: Arc<AtomicU64>,
    command_tx: mpsc::Sender<String>,
    pending: PendingAcks,
}

impl DriverHandle {
    /// Sends one command and blocks until the driver acks it or
    /// [`OP_TIMEOUT`] elapses. Must be called off the async runtime (the
    /// scheduler thread, or `spawn_blocking`).
    pub fn call(&self, command: &DriverCommand) -> Result<()> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let line = serde_json::to_string(&CommandEnvelope { id, command })
            .context("encoding driver command")?;

        let (ack_tx, ack_rx) = std_mpsc::sync_channel(1);
        self.pending.lock().insert(id, ack_tx);

        if self.command_tx.blocking_send(line).is_err() {
            self.pending.lock().remove(&id);
            bail!("driver is gone");
        }

        match ack_rx.recv_timeout(OP_TIMEOUT) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(message)) => bail!("driver rejected {command:?}: {message}"),
            Err(_) => {
                self.pending.lock().remove(&id);
                bail!("driver did not ack {command:?} within {OP_TIMEOUT:?}")
            }
        }
    }
}

/// The spawned driver subprocess plus its IO tasks. Dropping it kills the
/// child.
pub struct DriverClient {
    handle: DriverHandle,
    _child: Child,
}

impl DriverClient {
    /// Launches the driver and wires its stdio: a writer task draining the
    /// command queue, and a reader task routing events. When
    /// `ingest_frames` is false, transport frames are discarded unread.
    pub fn spawn(
        config: &Config,
        close_tx: CloseTx,
        patch_tx: PatchTx,
        ingest_frames: bool,
    ) -> Result<Self> {
        let mut parts = config.driver_cmd.split_whitespace();
        let program = parts.next().context("DRIVER_CMD is empty")?;
        let mut child = Command::new(program)
            .args(parts)
            .env("GAME_PERSIST_SESSION", config.persist_session.to_string())
            .env("GAME_PROFILE_DIR", &config.browser_profile_dir)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawning driver: {}", config.driver_cmd))?;

        let stdin = child.stdin.take().context("driver stdin unavailable")?;
        let stdout = child.stdout.take().context("driver stdout unavailable")?;

        let (command_tx, command_rx) = mpsc::channel::<String>(64);
        let pending: PendingAcks = Arc::new(Mutex::new(HashMap::new()));

        tokio::spawn(write_commands(stdin, command_rx));
        tokio::spawn(read_events(
            stdout,
            pending.clone(),
            close_tx,
            patch_tx,
            ingest_frames,
            config.ws_frame_throttle,
        ));

        Ok(Self {
            handle: DriverHandle {
                next_id: Arc::new(AtomicU64::new(1)),
                command_tx,
                pending,
            },
            _child: child,
        })
    }

    pub fn handle(&self) -> DriverHandle {
        self.handle.clone()
    }
}

async fn write_commands(
    mut stdin: tokio::process::ChildStdin,
    mut command_rx: mpsc::Receiver<String>,
) {
    while let Some(mut line) = command_rx.recv().await {
        line.push('\n');
        if let Err(err) = stdin.write_all(line.as_bytes()).await {
            error!("driver stdin write failed: {err}");
            break;
        }
        if let Err(err) = stdin.flush().await {
            error!("driver stdin flush failed: {err}");
            break;
        }
    }
}

async fn read_events(
    stdout: tokio::process::ChildStdout,
    pending: PendingAcks,
    close_tx: CloseTx,
    patch_tx: PatchTx,
    ingest_frames: bool,
    frame_throttle: u64,
) {
    let mut lines = BufReader::new(stdout).lines();
    let mut frames_seen: u64 = 0;

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                error!("driver stdout read failed: {err}");
                break;
            }
        };
        let event = match serde_json::from_str::<DriverEvent>(&line) {
            Ok(event) => event,
            Err(err) => {
                warn!("unparseable driver event line ({err}): {line}");
                continue;
            }
        };
        match event {
            DriverEvent::Ready => info!("driver ready"),
            DriverEvent::Ack { id, ok, error } => {
                let result = if ok {
                    Ok(())
                } else {
                    Err(error.unwrap_or_else(|| "unspecified driver error".to_string()))
                };
                // Receiver may have timed out already; that's fine.
                if let Some(ack_tx) = pending.lock().remove(&id) {
                    let _ = ack_tx.send(result);
                }
            }
            DriverEvent::Frame { payload } => {
                if !ingest_frames {
                    continue;
                }
                frames_seen += 1;
                if !should_sample(frames_seen, frame_throttle) {
                    continue;
                }
                if patch_tx.try_send(payload).is_err() {
                    // Mirror is last-write-wins; the next patch to the same
                    // path repairs a dropped frame.
                    debug!("patch queue full, dropping frame");
                }
            }
            DriverEvent::SocketClosed => {
                warn!("game websocket closed");
                let _ = close_tx.try_send(Instant::now());
            }
        }
    }

    // Driver exit looks like connection loss to the scheduler; reconnect
    // attempts against a dead driver fail per-call and are retried.
    error!("driver stdout closed, treating connection as lost");
    let _ = close_tx.try_send(Instant::now());
}

/// Process every Nth frame, dropping the rest before they are parsed.
fn should_sample(frame_seq: u64, every: u64) -> bool {
    every <= 1 || frame_seq % every == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn commands_serialize_to_the_driver_wire_shape() {
        let envelope = CommandEnvelope {
            id: 7,
            command: &DriverCommand::PressKey {
                key: "KeyE".to_string(),
            },
        };
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"id": 7, "cmd": "pressKey", "key": "KeyE"})
        );

        let envelope = CommandEnvelope {
            id: 8,
            command: &DriverCommand::Click { x: 312.0, y: 168.0 },
        };
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"id": 8, "cmd": "click", "x": 312.0, "y": 168.0})
        );
    }

    #[test]
    fn events_parse_from_the_driver_wire_shape() {
        let event: DriverEvent =
            serde_json::from_str(r#"{"event":"ack","id":3,"ok":false,"error":"no such key"}"#)
                .unwrap();
        assert!(matches!(
            event,
            DriverEvent::Ack { id: 3, ok: false, error: Some(_) }
        ));

        let event: DriverEvent =
            serde_json::from_str(r#"{"event":"frame","payload":"{\"type\":\"PartialState\"}"}"#)
                .unwrap();
        assert!(matches!(event, DriverEvent::Frame { .. }));

        assert!(serde_json::from_str::<DriverEvent>(r#"{"event":"confetti"}"#).is_err());
    }

    #[test]
    fn sampling_keeps_every_nth_frame() {
        let kept: Vec<u64> = (1..=12).filter(|seq| should_sample(*seq, 5)).collect();
        assert_eq!(kept, vec![5, 10]);

        assert!((1..=12).all(|seq| should_sample(seq, 1)));
    }
}
