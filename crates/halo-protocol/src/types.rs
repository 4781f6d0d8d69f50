use std::fmt;

// ── Wire constants ───────────────────────────────────────────────────────

/// Hard ceiling for an advertisement payload (platform service-data budget).
pub const MAX_ADVERT_LEN: usize = 31;

/// Size of the originator id field (big-endian u16).
pub const ORIGINATOR_LEN: usize = 2;

/// Size of the flags/name-length byte.
pub const HEADER_LEN: usize = 1;

/// Maximum raw bytes of node name carried in a report message.
pub const MAX_NAME_LEN: usize = 8;

/// Size of one relay entry on the wire: 3-byte address suffix + 1-byte rssi.
pub const RELAY_ENTRY_LEN: usize = 4;

/// Header sentinel marking a distress beacon (no name, no relay entries).
///
/// Any value > MAX_NAME_LEN would do; 0xFF can never collide with a
/// valid name length.
pub const DISTRESS_SENTINEL: u8 = 0xFF;

/// Minimum decodable payload: originator id + header byte.
pub const MIN_ADVERT_LEN: usize = ORIGINATOR_LEN + HEADER_LEN;

// ── PeerAddress ──────────────────────────────────────────────────────────

/// Identity of an observed peer.
///
/// Relay entries only carry the low 3 address bytes, so peers learned
/// second-hand get a distinct variant — downstream code can never
/// mistake a relayed peer for one that is directly reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerAddress {
    /// Full 6-byte address from a direct scan result.
    Direct([u8; 6]),
    /// Low 3 bytes recovered from a relay entry; top bytes unknown.
    Relayed([u8; 3]),
}

impl PeerAddress {
    /// The low 3 address bytes — what survives relay encoding.
    pub fn suffix(&self) -> [u8; 3] {
        match self {
            PeerAddress::Direct(addr) => [addr[3], addr[4], addr[5]],
            PeerAddress::Relayed(suffix) => *suffix,
        }
    }

    /// Whether this peer was scanned directly (full address known).
    pub fn is_direct(&self) -> bool {
        matches!(self, PeerAddress::Direct(_))
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerAddress::Direct(a) => write!(
                f,
                "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
                a[0], a[1], a[2], a[3], a[4], a[5]
            ),
            PeerAddress::Relayed(s) => {
                write!(f, "??:??:??:{:02x}:{:02x}:{:02x}", s[0], s[1], s[2])
            }
        }
    }
}

// ── Originator ids ───────────────────────────────────────────────────────

/// Generate a fresh flood-message originator id.
///
/// Low 16 bits of the wall clock in milliseconds. Low-entropy and
/// collision-prone across nodes emitting in the same time window; that
/// is the reference behavior and the dedup key is this id alone.
pub fn next_originator_id() -> u16 {
    (now_ms() & 0xFFFF) as u16
}

/// Current Unix time in milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
