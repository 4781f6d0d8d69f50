/// Advertisement codec — the fixed-budget flood message wire format.
///
/// Layout, at most [`MAX_ADVERT_LEN`] bytes, no padding:
///
/// ```text
/// [id_hi][id_lo][len][name: len bytes][entry]*      report
/// [id_hi][id_lo][0xFF]                              distress beacon
/// ```
///
/// The originator id is big-endian. Each relay entry is 4 bytes:
/// 3-byte address suffix + 1-byte signed rssi. A trailing remainder
/// shorter than one entry is ignored on decode.
use std::borrow::Cow;

use bytes::{Buf, BufMut, BytesMut};

use crate::error::HaloError;
use crate::observations::PeerObservation;
use crate::types::{
    next_originator_id, DISTRESS_SENTINEL, HEADER_LEN, MAX_ADVERT_LEN, MAX_NAME_LEN,
    MIN_ADVERT_LEN, ORIGINATOR_LEN, RELAY_ENTRY_LEN,
};

/// One relayed peer sighting: low 3 address bytes + clamped rssi.
///
/// Built at encode time from a [`PeerObservation`] and discarded after
/// send; the full address does not survive the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayEntry {
    pub suffix: [u8; 3],
    pub rssi_dbm: i8,
}

impl RelayEntry {
    /// Derive an entry from an observation, clamping rssi to i8 range.
    pub fn from_observation(obs: &PeerObservation) -> Self {
        Self {
            suffix: obs.address.suffix(),
            rssi_dbm: obs.rssi_dbm.clamp(i8::MIN as i16, i8::MAX as i16) as i8,
        }
    }
}

/// Message content: either a bare distress beacon or a neighbor report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FloodBody {
    /// Identifier-only beacon; decoders stop after the sentinel byte.
    Distress,
    /// Node name (raw bytes, ≤ 8) plus as many relay entries as fit.
    Report {
        /// Name bytes. Kept raw: 8-byte truncation may cut a UTF-8
        /// sequence mid-character, which is accepted lossy behavior.
        name: Vec<u8>,
        entries: Vec<RelayEntry>,
    },
}

/// A flood message — one advertisement payload's worth of protocol.
///
/// Constructed once per broadcast epoch via [`FloodMessage::compose`],
/// consumed immediately by the radio, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloodMessage {
    /// 16-bit clock-derived originator id; the flood dedup key.
    pub originator: u16,
    pub body: FloodBody,
}

impl FloodMessage {
    /// Compose a message fitted to the advertisement budget.
    ///
    /// Generates a fresh originator id. The name is truncated to
    /// [`MAX_NAME_LEN`] raw bytes; relay entries fill the remaining
    /// budget in the order observations are given, and anything beyond
    /// capacity is silently dropped (not queued for a later epoch).
    pub fn compose(
        name: Option<&str>,
        observations: &[PeerObservation],
        distress_only: bool,
    ) -> Self {
        let originator = next_originator_id();

        if distress_only {
            return Self {
                originator,
                body: FloodBody::Distress,
            };
        }

        let name_bytes = name.map(str::as_bytes).unwrap_or_default();
        let name: Vec<u8> = name_bytes[..name_bytes.len().min(MAX_NAME_LEN)].to_vec();

        let budget = MAX_ADVERT_LEN - ORIGINATOR_LEN - HEADER_LEN - name.len();
        let slots = budget / RELAY_ENTRY_LEN;

        let entries = observations
            .iter()
            .take(slots)
            .map(RelayEntry::from_observation)
            .collect();

        Self {
            originator,
            body: FloodBody::Report { name, entries },
        }
    }

    /// Whether this is a distress beacon.
    pub fn is_distress(&self) -> bool {
        matches!(self.body, FloodBody::Distress)
    }

    /// Relay entries carried by this message (empty for distress).
    pub fn entries(&self) -> &[RelayEntry] {
        match &self.body {
            FloodBody::Distress => &[],
            FloodBody::Report { entries, .. } => entries,
        }
    }

    /// Node name rendered for display. `None` for distress beacons.
    ///
    /// Invalid UTF-8 from mid-character truncation is replaced, not
    /// rejected.
    pub fn name_lossy(&self) -> Option<Cow<'_, str>> {
        match &self.body {
            FloodBody::Distress => None,
            FloodBody::Report { name, .. } => Some(String::from_utf8_lossy(name)),
        }
    }

    /// Encode to exact-length wire bytes.
    ///
    /// Messages from [`compose`](Self::compose) are fitted by
    /// construction; `EncodingOverflow` only fires for hand-built
    /// messages that exceed the budget.
    pub fn to_bytes(&self) -> Result<Vec<u8>, HaloError> {
        let mut buf = BytesMut::with_capacity(MAX_ADVERT_LEN);
        buf.put_u16(self.originator);

        match &self.body {
            FloodBody::Distress => buf.put_u8(DISTRESS_SENTINEL),
            FloodBody::Report { name, entries } => {
                // Budget check below also rules out any name long enough
                // for its length byte to collide with the sentinel.
                let size = MIN_ADVERT_LEN + name.len() + entries.len() * RELAY_ENTRY_LEN;
                if size > MAX_ADVERT_LEN {
                    return Err(HaloError::EncodingOverflow { size });
                }
                buf.put_u8(name.len() as u8);
                buf.put_slice(name);
                for entry in entries {
                    buf.put_slice(&entry.suffix);
                    buf.put_i8(entry.rssi_dbm);
                }
            }
        }

        if buf.len() > MAX_ADVERT_LEN {
            return Err(HaloError::EncodingOverflow { size: buf.len() });
        }
        Ok(buf.to_vec())
    }

    /// Decode wire bytes into a flood message.
    ///
    /// Fails with `MalformedPayload` when shorter than 3 bytes or when
    /// the declared name length overruns the payload.
    pub fn from_bytes(data: &[u8]) -> Result<Self, HaloError> {
        if data.len() < MIN_ADVERT_LEN {
            return Err(HaloError::MalformedPayload {
                reason: format!("{MIN_ADVERT_LEN} bytes required, got {}", data.len()),
            });
        }

        let mut buf = data;
        let originator = buf.get_u16();
        let header = buf.get_u8();

        if header == DISTRESS_SENTINEL {
            return Ok(Self {
                originator,
                body: FloodBody::Distress,
            });
        }

        let name_len = header as usize;
        if name_len > buf.remaining() {
            return Err(HaloError::MalformedPayload {
                reason: format!(
                    "name length {name_len} overruns payload ({} bytes left)",
                    buf.remaining()
                ),
            });
        }
        let name = buf.copy_to_bytes(name_len).to_vec();

        // Fixed 4-byte strides; a short trailing remainder is not an error.
        let mut entries = Vec::with_capacity(buf.remaining() / RELAY_ENTRY_LEN);
        while buf.remaining() >= RELAY_ENTRY_LEN {
            let mut suffix = [0u8; 3];
            buf.copy_to_slice(&mut suffix);
            let rssi_dbm = buf.get_i8();
            entries.push(RelayEntry { suffix, rssi_dbm });
        }

        Ok(Self {
            originator,
            body: FloodBody::Report { name, entries },
        })
    }
}
