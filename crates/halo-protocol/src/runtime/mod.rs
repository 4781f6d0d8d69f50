/// Duty-cycle runtime — drives the relay protocol as a live event loop.
///
/// The runtime owns a [`Radio`], a [`DisplaySink`], and all protocol
/// state (observation table, dedup ledger, power rotator). It exposes a
/// channel-based API so the application never touches raw advertisement
/// bytes or protocol internals.
mod effect;
mod executor;
mod r#loop;
mod state;

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::error::HaloError;
use crate::power::TxPowerLevel;
use crate::radio::{DisplaySink, Radio};
use crate::types::PeerAddress;

pub use effect::RelayEffect;
pub use state::RelayState;

// ── Configuration ─────────────────────────────────────────────────────

/// Configuration for the relay runtime.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Name advertised in report messages (truncated to 8 raw bytes).
    pub node_name: String,
    /// How long each listen window lasts.
    pub listen_duration: Duration,
    /// How long each broadcast window lasts.
    pub broadcast_duration: Duration,
    /// Start in distress-beacon mode.
    pub distress: bool,
    /// Dedup ledger capacity.
    pub ledger_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            node_name: "halo".to_string(),
            listen_duration: Duration::from_millis(10_000),
            broadcast_duration: Duration::from_millis(10_000),
            distress: false,
            ledger_capacity: crate::dedup::DEFAULT_LEDGER_CAPACITY,
        }
    }
}

// ── Duty-cycle roles ──────────────────────────────────────────────────

/// Which half of the duty cycle the node is in. Initial role: Listening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Listening,
    Broadcasting,
}

// ── Commands (app → runtime) ──────────────────────────────────────────

/// Commands the application sends to the runtime event loop.
pub enum RuntimeCommand {
    /// Switch distress-beacon mode on or off; takes effect at the next
    /// broadcast epoch.
    SetDistressMode(bool),
    /// Query: number of peers in the current observation window.
    GetPeerCount { reply: oneshot::Sender<usize> },
    /// Graceful shutdown: cancel the pending role flip and stop the radio.
    Shutdown,
}

// ── Events (runtime → app) ────────────────────────────────────────────

/// Protocol-level events the application may want to observe.
#[derive(Debug, Clone)]
pub enum RelayEvent {
    /// The duty cycle flipped roles.
    RoleChanged { role: Role },
    /// A direct sighting changed (new peer, rssi moved past tolerance,
    /// or the peer's advertisement payload changed).
    PeerObserved {
        address: PeerAddress,
        rssi_dbm: i16,
    },
    /// A fresh flood message was accepted and merged.
    FloodReceived {
        originator: u16,
        name: String,
        relayed: usize,
    },
    /// A fresh distress beacon was accepted.
    DistressReceived { originator: u16 },
    /// A flood message with an already-seen id was dropped.
    DuplicateDropped { originator: u16 },
    /// A broadcast epoch started.
    BroadcastStarted {
        power: TxPowerLevel,
        payload_len: usize,
    },
    /// Non-fatal error (radio failure, overflow on a hand-built message).
    Error { description: String },
}

// ── RelayHandle (app-facing API) ──────────────────────────────────────

/// Handle to communicate with a running relay runtime.
///
/// Cheap to clone. All methods are non-blocking channel sends.
#[derive(Clone)]
pub struct RelayHandle {
    cmd_tx: mpsc::Sender<RuntimeCommand>,
}

impl RelayHandle {
    /// Switch distress-beacon mode on or off.
    pub async fn set_distress_mode(&self, on: bool) -> Result<(), HaloError> {
        self.cmd_tx
            .send(RuntimeCommand::SetDistressMode(on))
            .await
            .map_err(|_| HaloError::RuntimeShutDown)
    }

    /// Number of peers accumulated in the current listen window.
    pub async fn peer_count(&self) -> usize {
        let (tx, rx) = oneshot::channel();
        let _ = self
            .cmd_tx
            .send(RuntimeCommand::GetPeerCount { reply: tx })
            .await;
        rx.await.unwrap_or_default()
    }

    /// Graceful shutdown.
    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(RuntimeCommand::Shutdown).await;
    }
}

// ── RuntimeChannels ───────────────────────────────────────────────────

/// Channels returned to the application when the runtime starts.
pub struct RuntimeChannels {
    /// Handle to send commands to the runtime.
    pub handle: RelayHandle,
    /// Receive protocol-level events.
    pub events: mpsc::Receiver<RelayEvent>,
}

// ── RelayRuntime ──────────────────────────────────────────────────────

/// The relay runtime — spawn it and communicate via channels.
pub struct RelayRuntime;

impl RelayRuntime {
    /// Create and start the relay runtime.
    ///
    /// Takes ownership of the radio and the display sink. Spawns the
    /// event loop as a tokio task and returns channels for the
    /// application.
    pub fn spawn<R>(radio: R, display: Box<dyn DisplaySink>, config: RelayConfig) -> RuntimeChannels
    where
        R: Radio + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<RuntimeCommand>(32);
        let (event_tx, event_rx) = mpsc::channel::<RelayEvent>(256);

        tokio::spawn(r#loop::runtime_loop(radio, display, config, cmd_rx, event_tx));

        RuntimeChannels {
            handle: RelayHandle { cmd_tx },
            events: event_rx,
        }
    }
}
