//! Halo proximity relay protocol.
//!
//! Nodes alternate between listening for short-range broadcast
//! advertisements and emitting their own, building a transient view of
//! nearby peers and flooding it outward so it travels beyond direct
//! radio range, hop by hop.
//!
//! Wire format: hand-packed binary, 31-byte advertisement budget.
//! The radio transceiver and the display surface are collaborators
//! behind the [`Radio`] and [`DisplaySink`] traits.

pub mod codec;
pub mod dedup;
pub mod error;
pub mod observations;
pub mod power;
pub mod radio;
pub mod runtime;
pub mod types;

pub use codec::{FloodBody, FloodMessage, RelayEntry};
pub use dedup::DedupLedger;
pub use error::HaloError;
pub use observations::{ObservationTable, PeerObservation};
pub use power::{PowerRotator, TxPowerLevel};
pub use radio::{Advertisement, DisplaySink, NullDisplay, Radio};
pub use runtime::{
    RelayConfig, RelayEvent, RelayHandle, RelayRuntime, Role, RuntimeChannels, RuntimeCommand,
};
pub use types::{now_ms, PeerAddress, DISTRESS_SENTINEL, MAX_ADVERT_LEN, MAX_NAME_LEN};
