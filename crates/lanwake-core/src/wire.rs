//! Wake-on-LAN wire format.
//!
//! A magic packet is six 0xFF sync bytes followed by the target's 48-bit
//! hardware address repeated sixteen times. It carries no checksum and
//! receives no acknowledgement; the NIC matches the pattern anywhere in a
//! frame, so a bare UDP datagram to the subnet broadcast address is enough.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use static_assertions::assert_eq_size;
use zerocopy::{AsBytes, FromBytes, FromZeroes};

/// Conventional Wake-on-LAN UDP port ("discard").
pub const WOL_PORT: u16 = 9;

/// Size of a magic packet payload in bytes.
pub const MAGIC_PACKET_LEN: usize = 102;

/// Number of times the hardware address is repeated after the sync stream.
const MAC_REPEAT: usize = 16;

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("invalid hardware address: {0:?}")]
    InvalidMac(String),
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
    #[error("short send: {sent} of {expected} bytes")]
    ShortSend { sent: usize, expected: usize },
}

// ── Hardware address ──────────────────────────────────────────────────────────

/// A 6-byte Ethernet hardware address.
///
/// Parses `aa:bb:cc:dd:ee:ff`, `aa-bb-cc-dd-ee-ff` or twelve bare hex digits.
/// Separators may not be mixed.
/// Always displays as lower-case colon-separated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl FromStr for MacAddr {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || WireError::InvalidMac(s.to_string());
        let s = s.trim();
        let sep = if s.contains(':') { ':' } else { '-' };
        let parts: Vec<&str> = s.split(sep).collect();

        let digits = match parts.len() {
            1 => parts[0].to_string(),
            6 if parts.iter().all(|p| p.len() == 2) => parts.concat(),
            _ => return Err(invalid()),
        };

        let mut bytes = [0u8; 6];
        hex::decode_to_slice(&digits, &mut bytes).map_err(|_| invalid())?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl TryFrom<String> for MacAddr {
    type Error = WireError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MacAddr> for String {
    fn from(mac: MacAddr) -> Self {
        mac.to_string()
    }
}

// ── Magic packet ──────────────────────────────────────────────────────────────

/// The Wake-on-LAN payload.
///
/// Wire size: 102 bytes.
#[derive(Debug, Clone, AsBytes, FromBytes, FromZeroes)]
#[repr(C, packed)]
pub struct MagicPacket {
    /// Six 0xFF bytes.
    pub sync: [u8; 6],

    /// The target hardware address, sixteen times over.
    pub targets: [[u8; 6]; MAC_REPEAT],
}

assert_eq_size!(MagicPacket, [u8; MAGIC_PACKET_LEN]);

impl MagicPacket {
    pub fn new(mac: &MacAddr) -> Self {
        Self {
            sync: [0xFF; 6],
            targets: [mac.octets(); MAC_REPEAT],
        }
    }

    /// The hardware address this packet wakes, if the payload is well formed.
    pub fn target(&self) -> Option<MacAddr> {
        let sync = self.sync;
        let targets = self.targets;
        let first = targets[0];
        if sync != [0xFF; 6] || targets.iter().any(|t| *t != first) {
            return None;
        }
        Some(MacAddr(first))
    }
}
