//! Payload checksum.
//!
//! CRC-16/CCITT-FALSE: polynomial `0x1021`, initial register `0xFFFF`,
//! most-significant bit first, no reflection and no final XOR.
//!
//! The checksum field covers itself: the CRC runs over the whole payload up
//! to and including the checksum field's own tag and length (`6304`), and the
//! four hex digits of the result are appended after it.
//!
//! ```rust
//! use pix_codec::crc::{append_checksum, checksum};
//!
//! assert_eq!(checksum("123456789"), 0x29B1);
//! assert_eq!(append_checksum("5802BR6304").len(), 14);
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::tlv::Tag;

pub const POLYNOMIAL: u16 = 0x1021;
pub const INITIAL: u16 = 0xFFFF;

/// Tag of the trailing checksum field.
pub const CHECKSUM_TAG: Tag = Tag::new(63);

/// Tag and length of the checksum field, the last bytes the CRC covers.
pub const CHECKSUM_FIELD_HEADER: &str = "6304";

/// Number of hex digits in a rendered checksum.
pub const CHECKSUM_LEN: usize = 4;

/// Runs CRC-16/CCITT-FALSE over raw bytes.
pub fn crc16_ccitt_false(bytes: &[u8]) -> u16 {
    let mut crc = INITIAL;
    for &byte in bytes {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ POLYNOMIAL
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Checksum of a payload prefix that already ends with [`CHECKSUM_FIELD_HEADER`].
pub fn checksum(payload_prefix: &str) -> u16 {
    crc16_ccitt_false(payload_prefix.as_bytes())
}

/// Completes a payload by appending the checksum of `payload_prefix`.
///
/// `payload_prefix` must already end with [`CHECKSUM_FIELD_HEADER`].
pub fn append_checksum(payload_prefix: &str) -> String {
    debug_assert!(payload_prefix.ends_with(CHECKSUM_FIELD_HEADER));
    format!("{payload_prefix}{}", Checksum::of(payload_prefix))
}

/// A 16-bit payload checksum, rendered as four uppercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Checksum(pub u16);

impl Checksum {
    /// Computes the checksum of a payload prefix.
    pub fn of(payload_prefix: &str) -> Self {
        Checksum(checksum(payload_prefix))
    }
}

impl Display for Checksum {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

/// A checksum string that is not four uppercase hex digits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid checksum {0:?}, expected four uppercase hex digits")]
pub struct InvalidChecksum(pub String);

impl FromStr for Checksum {
    type Err = InvalidChecksum;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let well_formed = s.len() == CHECKSUM_LEN
            && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'A'..=b'F'));
        if !well_formed {
            return Err(InvalidChecksum(s.to_string()));
        }
        u16::from_str_radix(s, 16)
            .map(Checksum)
            .map_err(|_| InvalidChecksum(s.to_string()))
    }
}

impl Serialize for Checksum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Checksum {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Checksum::from_str(&s).map_err(serde::de::Error::custom)
    }
}
