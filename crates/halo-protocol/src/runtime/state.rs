/// Complete relay protocol state — pure logic, zero async, zero radio.
///
/// Every input (advertisement, role flip, command) returns
/// `Vec<RelayEffect>`; the loop executes them. This is the single owner
/// of the observation table and dedup ledger: all delivery is funneled
/// through one serialized entry point, so no mutation ever races
/// another.
use std::time::Duration;

use crate::codec::FloodMessage;
use crate::dedup::DedupLedger;
use crate::observations::ObservationTable;
use crate::power::PowerRotator;
use crate::radio::Advertisement;
use crate::types::PeerAddress;

use super::effect::RelayEffect;
use super::{RelayConfig, RelayEvent, Role};

pub struct RelayState {
    config: RelayConfig,
    role: Role,
    distress: bool,
    table: ObservationTable,
    ledger: DedupLedger,
    rotator: PowerRotator,
}

impl RelayState {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            role: Role::Listening,
            distress: config.distress,
            table: ObservationTable::new(),
            ledger: DedupLedger::with_capacity(config.ledger_capacity),
            rotator: PowerRotator::new(),
            config,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Duration of the window the node is currently in.
    pub fn current_window(&self) -> Duration {
        match self.role {
            Role::Listening => self.config.listen_duration,
            Role::Broadcasting => self.config.broadcast_duration,
        }
    }

    /// Peers accumulated since the last broadcast epoch.
    pub fn peer_count(&self) -> usize {
        self.table.len()
    }

    pub fn set_distress_mode(&mut self, on: bool) {
        self.distress = on;
    }

    /// Effects to bring the node into its initial Listening window.
    pub fn start(&mut self) -> Vec<RelayEffect> {
        vec![
            RelayEffect::Emit(RelayEvent::RoleChanged {
                role: Role::Listening,
            }),
            RelayEffect::StartListening,
        ]
    }

    /// Process one scan result delivered while Listening.
    ///
    /// Always records the direct sighting; then, if the service data
    /// decodes as a flood message the dedup ledger gates the merge — a
    /// duplicate id leaves the table untouched.
    pub fn handle_advertisement(&mut self, adv: &Advertisement) -> Vec<RelayEffect> {
        let mut effects = Vec::new();

        let rssi_changed = self.table.record_direct(adv.address, adv.rssi_dbm);
        let payload_changed = self
            .table
            .payload_digest_changed(adv.address, &adv.service_data);

        if rssi_changed || payload_changed {
            let address = PeerAddress::Direct(adv.address);
            effects.push(RelayEffect::Show {
                key: address.to_string(),
                line: format!("{address}  {} dBm", adv.rssi_dbm),
            });
            effects.push(RelayEffect::Emit(RelayEvent::PeerObserved {
                address,
                rssi_dbm: adv.rssi_dbm,
            }));
        }

        match FloodMessage::from_bytes(&adv.service_data) {
            Ok(msg) if self.ledger.should_process(msg.originator) => {
                for entry in msg.entries() {
                    self.table
                        .record_relayed(entry.suffix, entry.rssi_dbm as i16);
                }
                let key = format!("msg:{:04x}", msg.originator);
                if msg.is_distress() {
                    effects.push(RelayEffect::Show {
                        key,
                        line: format!("DISTRESS beacon {:04x}", msg.originator),
                    });
                    effects.push(RelayEffect::Emit(RelayEvent::DistressReceived {
                        originator: msg.originator,
                    }));
                } else {
                    let name = msg.name_lossy().unwrap_or_default().into_owned();
                    effects.push(RelayEffect::Show {
                        key,
                        line: format!("{name}  ({} relayed peers)", msg.entries().len()),
                    });
                    effects.push(RelayEffect::Emit(RelayEvent::FloodReceived {
                        originator: msg.originator,
                        name,
                        relayed: msg.entries().len(),
                    }));
                }
            }
            Ok(msg) => {
                effects.push(RelayEffect::Emit(RelayEvent::DuplicateDropped {
                    originator: msg.originator,
                }));
            }
            Err(e) => {
                // Corrupt payload: drop it, keep the cycle running.
                tracing::debug!(peer = %PeerAddress::Direct(adv.address), "undecodable service data: {e}");
            }
        }

        effects
    }

    /// Flip to the other half of the duty cycle.
    ///
    /// Listening → Broadcasting consumes the observation table into a
    /// freshly composed flood message and steps the power ladder.
    pub fn flip_role(&mut self) -> Vec<RelayEffect> {
        match self.role {
            Role::Listening => {
                self.role = Role::Broadcasting;
                let snapshot = self.table.snapshot_for_encode();
                let msg =
                    FloodMessage::compose(Some(&self.config.node_name), &snapshot, self.distress);

                let mut effects = vec![
                    RelayEffect::StopListening,
                    RelayEffect::Emit(RelayEvent::RoleChanged {
                        role: Role::Broadcasting,
                    }),
                ];
                match msg.to_bytes() {
                    Ok(payload) => {
                        let power = self.rotator.next();
                        effects.push(RelayEffect::Emit(RelayEvent::BroadcastStarted {
                            power,
                            payload_len: payload.len(),
                        }));
                        effects.push(RelayEffect::StartBroadcasting { power, payload });
                    }
                    // Composed messages are fitted by construction; this
                    // only trips if the budget constants are edited badly.
                    Err(e) => {
                        effects.push(RelayEffect::Emit(RelayEvent::Error {
                            description: format!("encode failed: {e}"),
                        }));
                    }
                }
                effects
            }
            Role::Broadcasting => {
                self.role = Role::Listening;
                vec![
                    RelayEffect::StopBroadcasting,
                    RelayEffect::Emit(RelayEvent::RoleChanged {
                        role: Role::Listening,
                    }),
                    RelayEffect::StartListening,
                ]
            }
        }
    }

    /// Best-effort stop of both radio activities. Partial completion
    /// (radio already stopped) is not an error.
    pub fn shutdown(&mut self) -> Vec<RelayEffect> {
        vec![RelayEffect::StopListening, RelayEffect::StopBroadcasting]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::power::TxPowerLevel;
    use crate::types::{DISTRESS_SENTINEL, MAX_ADVERT_LEN};

    fn config() -> RelayConfig {
        RelayConfig {
            node_name: "NodeOne!".into(),
            ..RelayConfig::default()
        }
    }

    fn adv(address: [u8; 6], rssi_dbm: i16, service_data: Vec<u8>) -> Advertisement {
        Advertisement {
            address,
            rssi_dbm,
            service_data,
        }
    }

    fn broadcast_payload(effects: &[RelayEffect]) -> Option<(TxPowerLevel, Vec<u8>)> {
        effects.iter().find_map(|e| match e {
            RelayEffect::StartBroadcasting { power, payload } => {
                Some((*power, payload.clone()))
            }
            _ => None,
        })
    }

    #[test]
    fn starts_listening() {
        let mut state = RelayState::new(config());
        assert_eq!(state.role(), Role::Listening);

        let effects = state.start();
        assert!(effects
            .iter()
            .any(|e| matches!(e, RelayEffect::StartListening)));
    }

    #[test]
    fn advertisement_records_and_shows_peer() {
        let mut state = RelayState::new(config());
        let effects = state.handle_advertisement(&adv([1, 2, 3, 4, 5, 6], -60, vec![]));

        assert_eq!(state.peer_count(), 1);
        assert!(effects.iter().any(|e| matches!(
            e,
            RelayEffect::Emit(RelayEvent::PeerObserved { rssi_dbm: -60, .. })
        )));
        assert!(effects
            .iter()
            .any(|e| matches!(e, RelayEffect::Show { .. })));
    }

    #[test]
    fn rssi_jitter_produces_no_effects() {
        let mut state = RelayState::new(config());
        state.handle_advertisement(&adv([1, 2, 3, 4, 5, 6], -60, vec![]));
        let effects = state.handle_advertisement(&adv([1, 2, 3, 4, 5, 6], -61, vec![]));

        assert!(effects.is_empty(), "delta 1 with same payload: {effects:?}");
    }

    #[test]
    fn flood_message_merged_once() {
        let mut state = RelayState::new(config());
        // id 0x0102, name "hi", one relay entry.
        let payload = vec![0x01, 0x02, 2, b'h', b'i', 0xDD, 0xEE, 0xFF, 0xC4];

        let effects = state.handle_advertisement(&adv([1, 2, 3, 4, 5, 6], -60, payload.clone()));
        assert!(effects.iter().any(|e| matches!(
            e,
            RelayEffect::Emit(RelayEvent::FloodReceived {
                originator: 0x0102,
                relayed: 1,
                ..
            })
        )));
        // Direct peer + relayed peer.
        assert_eq!(state.peer_count(), 2);

        // Same flood from another neighbor: dedup drops it, table untouched.
        let effects = state.handle_advertisement(&adv([9, 9, 9, 9, 9, 9], -40, payload));
        assert!(effects.iter().any(|e| matches!(
            e,
            RelayEffect::Emit(RelayEvent::DuplicateDropped { originator: 0x0102 })
        )));
        assert_eq!(state.peer_count(), 3); // only the new direct sighting
    }

    #[test]
    fn distress_beacon_surfaced() {
        let mut state = RelayState::new(config());
        let payload = vec![0xBE, 0xEF, DISTRESS_SENTINEL];

        let effects = state.handle_advertisement(&adv([1, 2, 3, 4, 5, 6], -60, payload));
        assert!(effects.iter().any(|e| matches!(
            e,
            RelayEffect::Emit(RelayEvent::DistressReceived { originator: 0xBEEF })
        )));
    }

    #[test]
    fn corrupt_payload_still_records_direct_peer() {
        let mut state = RelayState::new(config());
        // 2 bytes: undecodable, but the sighting itself counts.
        let effects = state.handle_advertisement(&adv([1, 2, 3, 4, 5, 6], -60, vec![0xAB, 0xCD]));

        assert_eq!(state.peer_count(), 1);
        assert!(effects.iter().any(|e| matches!(
            e,
            RelayEffect::Emit(RelayEvent::PeerObserved { .. })
        )));
    }

    #[test]
    fn flip_consumes_table_into_broadcast() {
        let mut state = RelayState::new(config());
        state.handle_advertisement(&adv([1, 2, 3, 4, 5, 6], -60, vec![]));
        state.handle_advertisement(&adv([7, 7, 7, 7, 7, 7], -70, vec![]));

        let effects = state.flip_role();
        assert_eq!(state.role(), Role::Broadcasting);
        assert!(matches!(effects[0], RelayEffect::StopListening));

        let (power, payload) = broadcast_payload(&effects).expect("broadcast effect");
        assert_eq!(power, TxPowerLevel::UltraLow);
        assert!(payload.len() <= MAX_ADVERT_LEN);

        let msg = FloodMessage::from_bytes(&payload).expect("decode own broadcast");
        assert_eq!(msg.name_lossy().unwrap(), "NodeOne!");
        assert_eq!(msg.entries().len(), 2);

        // Table was drained: the epoch after an empty listen window
        // relays nothing.
        assert_eq!(state.peer_count(), 0);
        state.flip_role();
        let effects = state.flip_role();
        let (_, payload) = broadcast_payload(&effects).expect("broadcast effect");
        let msg = FloodMessage::from_bytes(&payload).expect("decode");
        assert!(msg.entries().is_empty());
    }

    #[test]
    fn flip_back_resumes_listening() {
        let mut state = RelayState::new(config());
        state.flip_role();

        let effects = state.flip_role();
        assert_eq!(state.role(), Role::Listening);
        assert!(matches!(effects[0], RelayEffect::StopBroadcasting));
        assert!(effects
            .iter()
            .any(|e| matches!(e, RelayEffect::StartListening)));
    }

    #[test]
    fn power_ladder_advances_per_broadcast_epoch() {
        let mut state = RelayState::new(config());
        let mut powers = Vec::new();
        for _ in 0..5 {
            let effects = state.flip_role(); // → Broadcasting
            powers.push(broadcast_payload(&effects).unwrap().0);
            state.flip_role(); // → Listening
        }
        assert_eq!(
            powers,
            vec![
                TxPowerLevel::UltraLow,
                TxPowerLevel::Low,
                TxPowerLevel::Medium,
                TxPowerLevel::High,
                TxPowerLevel::UltraLow,
            ]
        );
    }

    #[test]
    fn distress_mode_broadcasts_three_bytes() {
        let mut state = RelayState::new(config());
        state.handle_advertisement(&adv([1, 2, 3, 4, 5, 6], -60, vec![]));
        state.set_distress_mode(true);

        let effects = state.flip_role();
        let (_, payload) = broadcast_payload(&effects).expect("broadcast effect");
        assert_eq!(payload.len(), 3);
        assert_eq!(payload[2], DISTRESS_SENTINEL);
    }

    #[test]
    fn window_durations_follow_role() {
        let cfg = RelayConfig {
            listen_duration: Duration::from_millis(100),
            broadcast_duration: Duration::from_millis(50),
            ..config()
        };
        let mut state = RelayState::new(cfg);
        assert_eq!(state.current_window(), Duration::from_millis(100));
        state.flip_role();
        assert_eq!(state.current_window(), Duration::from_millis(50));
    }

    #[test]
    fn shutdown_stops_both_activities() {
        let mut state = RelayState::new(config());
        let effects = state.shutdown();
        assert!(matches!(effects[0], RelayEffect::StopListening));
        assert!(matches!(effects[1], RelayEffect::StopBroadcasting));
    }
}
