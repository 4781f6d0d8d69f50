use crate::power::TxPowerLevel;

use super::RelayEvent;

/// Intention produced by the pure logic in `RelayState`.
///
/// Every handle_* / flip_* method returns `Vec<RelayEffect>`; the loop
/// then executes them against the radio, the display sink, and the
/// event channel. No state method touches I/O itself.
#[derive(Debug)]
pub enum RelayEffect {
    /// Resume scanning for advertisements.
    StartListening,

    /// Stop scanning (already-stopped is fine).
    StopListening,

    /// Advertise `payload` for the broadcast window at the given power.
    StartBroadcasting {
        power: TxPowerLevel,
        payload: Vec<u8>,
    },

    /// Stop advertising (already-stopped is fine).
    StopBroadcasting,

    /// Upsert one display line keyed by peer/message identity.
    Show { key: String, line: String },

    /// Surface an event to the application.
    Emit(RelayEvent),
}
