use tokio::sync::mpsc;

use crate::error::HaloError;
use crate::power::TxPowerLevel;

/// One raw scan result delivered by the radio while listening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    /// Full 6-byte address of the advertising peer.
    pub address: [u8; 6],
    /// Received signal strength (dBm scale).
    pub rssi_dbm: i16,
    /// Service data — the flood message payload, ≤ 31 bytes in practice.
    pub service_data: Vec<u8>,
}

/// Abstraction over the platform radio transceiver.
///
/// In production: a platform BLE stack wrapper. In tests and in the
/// simulator: an in-memory medium. All calls are fire-and-forget from
/// the scheduler's point of view; failures are non-fatal and the duty
/// cycle continues on schedule.
#[async_trait::async_trait]
pub trait Radio: Send + Sync {
    /// Begin scanning. Scan results are pushed into `events`; delivery
    /// is serialized onto the runtime loop by the channel itself.
    async fn start_listening(
        &self,
        events: mpsc::Sender<Advertisement>,
    ) -> Result<(), HaloError>;

    /// Stop scanning. Stopping an already-stopped radio is not an error.
    async fn stop_listening(&self) -> Result<(), HaloError>;

    /// Begin advertising `payload` at the given transmit power.
    async fn start_broadcasting(
        &self,
        power: TxPowerLevel,
        payload: &[u8],
    ) -> Result<(), HaloError>;

    /// Stop advertising. Stopping an already-stopped radio is not an error.
    async fn stop_broadcasting(&self) -> Result<(), HaloError>;
}

/// Where observations and flood messages get rendered.
///
/// `show` upserts a single line keyed by peer or message identity; the
/// runtime never assumes anything else about the surface behind it.
pub trait DisplaySink: Send {
    fn show(&mut self, key: &str, line: &str);
    fn clear_all(&mut self);
}

/// A sink that drops everything (headless nodes, tests).
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn show(&mut self, _key: &str, _line: &str) {}
    fn clear_all(&mut self) {}
}

// ── MockRadio (tests) ───────────────────────────────────────────────────
