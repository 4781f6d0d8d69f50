/// Observation table — recent peer sightings between broadcast epochs.
///
/// Pure state, no I/O. The duty-cycle runtime records sightings while
/// listening and drains the whole table when it flips to broadcasting:
/// each epoch relays only what was seen since the previous one. The
/// clear-on-read snapshot is a deliberate freshness/size trade, not an
/// oversight.
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

use crate::types::PeerAddress;

/// Rssi jitter tolerance. A delta must exceed this (strictly) to count
/// as a change worth refreshing the display for.
const RSSI_TOLERANCE_DBM: u16 = 1;

/// One observed peer: address, latest signal strength, and a digest of
/// the last advertisement payload seen from it (display refresh).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerObservation {
    pub address: PeerAddress,
    pub rssi_dbm: i16,
    pub last_payload_digest: Option<u64>,
}

/// Holds sightings accumulated during the current listen window.
#[derive(Debug, Default)]
pub struct ObservationTable {
    entries: HashMap<PeerAddress, PeerObservation>,
}

impl ObservationTable {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Record a directly scanned peer. Returns whether the sighting
    /// changed anything worth re-rendering: a new address, or an rssi
    /// delta strictly greater than the 1 dBm jitter tolerance.
    pub fn record_direct(&mut self, address: [u8; 6], rssi_dbm: i16) -> bool {
        let key = PeerAddress::Direct(address);
        match self.entries.get_mut(&key) {
            Some(obs) => {
                let changed = obs.rssi_dbm.abs_diff(rssi_dbm) > RSSI_TOLERANCE_DBM;
                obs.rssi_dbm = rssi_dbm;
                changed
            }
            None => {
                self.entries.insert(
                    key,
                    PeerObservation {
                        address: key,
                        rssi_dbm,
                        last_payload_digest: None,
                    },
                );
                true
            }
        }
    }

    /// Record a peer learned from a relay entry. Only the low 3 address
    /// bytes are known; the entry is keyed under the `Relayed` variant
    /// so it can never shadow or be mistaken for a direct sighting.
    pub fn record_relayed(&mut self, suffix: [u8; 3], rssi_dbm: i16) {
        let key = PeerAddress::Relayed(suffix);
        self.entries
            .entry(key)
            .and_modify(|obs| obs.rssi_dbm = rssi_dbm)
            .or_insert(PeerObservation {
                address: key,
                rssi_dbm,
                last_payload_digest: None,
            });
    }

    /// Digest the advertisement payload for a direct peer and report
    /// whether it differs from the last one seen. Drives display
    /// refresh when a peer's broadcast content changes between scans.
    pub fn payload_digest_changed(&mut self, address: [u8; 6], service_data: &[u8]) -> bool {
        let mut hasher = DefaultHasher::new();
        service_data.hash(&mut hasher);
        let digest = hasher.finish();

        let key = PeerAddress::Direct(address);
        match self.entries.get_mut(&key) {
            Some(obs) => {
                let changed = obs.last_payload_digest != Some(digest);
                obs.last_payload_digest = Some(digest);
                changed
            }
            // Unknown address: nothing stored, nothing to refresh.
            None => false,
        }
    }

    /// Drain the table for one broadcast epoch.
    ///
    /// Returns every current entry and leaves the table empty. Order is
    /// map iteration order — unspecified; which peers survive capacity
    /// truncation downstream is therefore nondeterministic.
    pub fn snapshot_for_encode(&mut self) -> Vec<PeerObservation> {
        self.entries.drain().map(|(_, obs)| obs).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR_A: [u8; 6] = [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];
    const ADDR_B: [u8; 6] = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66];

    #[test]
    fn new_address_reports_changed() {
        let mut table = ObservationTable::new();
        assert!(table.record_direct(ADDR_A, -60));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn jitter_within_tolerance_is_not_a_change() {
        let mut table = ObservationTable::new();
        table.record_direct(ADDR_A, -60);

        // Delta of exactly 1 — suppressed (tolerance is strict >1).
        assert!(!table.record_direct(ADDR_A, -61));
        assert!(!table.record_direct(ADDR_A, -60));

        // Delta of 10 from the stored -60 — a real change.
        assert!(table.record_direct(ADDR_A, -70));
    }

    #[test]
    fn extreme_rssi_swing_does_not_overflow() {
        // Nothing real reports these, but the delta math must not trap.
        let mut table = ObservationTable::new();
        table.record_direct(ADDR_A, i16::MIN);
        assert!(table.record_direct(ADDR_A, i16::MAX));
        assert!(table.record_direct(ADDR_A, i16::MIN));
    }

    #[test]
    fn suppressed_update_still_stores_latest_rssi() {
        let mut table = ObservationTable::new();
        table.record_direct(ADDR_A, -60);
        table.record_direct(ADDR_A, -61); // suppressed for display

        let snapshot = table.snapshot_for_encode();
        assert_eq!(snapshot[0].rssi_dbm, -61);
    }

    #[test]
    fn listen_scenario_sixty_then_seventy() {
        // Peer A at -60, then -61 (delta 1), then -70.
        let mut table = ObservationTable::new();
        assert!(table.record_direct(ADDR_A, -60));
        assert!(!table.record_direct(ADDR_A, -61));
        assert!(table.record_direct(ADDR_A, -70));
    }

    #[test]
    fn snapshot_drains_the_table() {
        let mut table = ObservationTable::new();
        table.record_direct(ADDR_A, -60);
        table.record_direct(ADDR_B, -72);

        let snapshot = table.snapshot_for_encode();
        assert_eq!(snapshot.len(), 2);
        assert!(table.is_empty());

        // Immediate second snapshot is empty.
        assert!(table.snapshot_for_encode().is_empty());
    }

    #[test]
    fn peer_seen_once_is_relayed_exactly_once() {
        let mut table = ObservationTable::new();
        table.record_direct(ADDR_A, -60);

        assert_eq!(table.snapshot_for_encode().len(), 1);
        // Peer not re-observed: next epoch forgets it.
        assert!(table.snapshot_for_encode().is_empty());
    }

    #[test]
    fn relayed_peer_is_distinct_from_direct() {
        let mut table = ObservationTable::new();
        table.record_direct(ADDR_A, -60);
        // Same low 3 bytes as ADDR_A, learned second-hand.
        table.record_relayed([0xDD, 0xEE, 0xFF], -80);

        assert_eq!(table.len(), 2);
        let snapshot = table.snapshot_for_encode();
        let relayed = snapshot.iter().find(|o| !o.address.is_direct()).unwrap();
        assert_eq!(relayed.rssi_dbm, -80);
    }

    #[test]
    fn relayed_update_overwrites_rssi() {
        let mut table = ObservationTable::new();
        table.record_relayed([1, 2, 3], -70);
        table.record_relayed([1, 2, 3], -55);

        assert_eq!(table.len(), 1);
        assert_eq!(table.snapshot_for_encode()[0].rssi_dbm, -55);
    }

    #[test]
    fn payload_digest_change_detection() {
        let mut table = ObservationTable::new();
        table.record_direct(ADDR_A, -60);

        assert!(table.payload_digest_changed(ADDR_A, b"payload-1"));
        assert!(!table.payload_digest_changed(ADDR_A, b"payload-1"));
        assert!(table.payload_digest_changed(ADDR_A, b"payload-2"));
    }

    #[test]
    fn payload_digest_for_unknown_address_is_ignored() {
        let mut table = ObservationTable::new();
        assert!(!table.payload_digest_changed(ADDR_A, b"payload"));
        assert!(table.is_empty());
    }
}
