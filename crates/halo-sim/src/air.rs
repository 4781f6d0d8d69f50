//! The shared medium every simulated radio transmits into.
//!
//! A single broadcast channel stands in for the air: every transmission
//! reaches every tuned-in radio, and signal strength is synthesized per
//! link from transmit power, a stable per-pair path loss, and a little
//! fading.

use std::hash::{DefaultHasher, Hash, Hasher};

use rand::Rng;
use tokio::sync::broadcast;

use halo_protocol::TxPowerLevel;

const AIR_CHANNEL_DEPTH: usize = 256;

/// Anything weaker than this never reaches the receiver.
pub const RSSI_FLOOR_DBM: i16 = -90;

/// One advertisement on the air.
#[derive(Debug, Clone)]
pub struct Transmission {
    pub from: [u8; 6],
    pub power: TxPowerLevel,
    pub payload: Vec<u8>,
}

/// In-memory medium shared by all simulated radios.
#[derive(Clone)]
pub struct Air {
    tx: broadcast::Sender<Transmission>,
}

impl Air {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(AIR_CHANNEL_DEPTH);
        Self { tx }
    }

    /// Put a transmission on the air. Nobody listening is not an error.
    pub fn transmit(&self, transmission: Transmission) {
        let _ = self.tx.send(transmission);
    }

    pub fn tune_in(&self) -> broadcast::Receiver<Transmission> {
        self.tx.subscribe()
    }
}

impl Default for Air {
    fn default() -> Self {
        Self::new()
    }
}

/// Effective radiated power per level, on the dBm scale a BLE stack
/// would report.
fn tx_power_dbm(power: TxPowerLevel) -> i16 {
    match power {
        TxPowerLevel::UltraLow => -21,
        TxPowerLevel::Low => -15,
        TxPowerLevel::Medium => -7,
        TxPowerLevel::High => 1,
    }
}

/// Received signal strength for one transmission over one link, or
/// `None` when the signal lands below the floor.
///
/// Path loss is derived from the unordered address pair so each link
/// keeps a stable budget across the run and both directions match.
pub fn link_rssi(
    power: TxPowerLevel,
    from: [u8; 6],
    to: [u8; 6],
    rng: &mut impl Rng,
) -> Option<i16> {
    let mut hasher = DefaultHasher::new();
    if from <= to {
        (from, to).hash(&mut hasher);
    } else {
        (to, from).hash(&mut hasher);
    }
    let path_loss = 35 + (hasher.finish() % 45) as i16;
    let fading = rng.random_range(-2i16..=2);

    let rssi = tx_power_dbm(power) - path_loss + fading;
    (rssi >= RSSI_FLOOR_DBM).then_some(rssi)
}
