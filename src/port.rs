//! Port numbers and the 4-hex-digit port field of the connection tables.
//!
//! `Port` is the validated port a caller asks about (1-65535). The table codec
//! works on raw `u16` because the kernel happily reports port 0 for sockets
//! that are not bound yet.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// A validated TCP port number (1-65535).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Port(u16);

/// Error returned when a port argument cannot be used for a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortParseError {
    #[error("invalid port format: '{0}'")]
    InvalidFormat(String),

    #[error("invalid port number: {0} (must be 1-65535)")]
    InvalidValue(u16),
}

impl Port {
    /// Creates a new `Port`, rejecting the reserved port 0.
    pub fn new(value: u16) -> Result<Self, PortParseError> {
        if value == 0 {
            Err(PortParseError::InvalidValue(value))
        } else {
            Ok(Port(value))
        }
    }

    #[inline]
    pub fn as_u16(self) -> u16 {
        self.0
    }

    /// The port as it appears in a connection table row (e.g. `1F90` for 8080).
    pub fn table_field(self) -> String {
        encode_field(self.0)
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

/// Accepts decimal (`8080`) or the table's own hex notation (`0x1F90`).
impl FromStr for Port {
    type Err = PortParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => u16::from_str_radix(hex, 16),
            None => trimmed.parse(),
        }
        .map_err(|_| PortParseError::InvalidFormat(s.to_string()))?;
        Port::new(value)
    }
}

impl Serialize for Port {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

/// How the 4-hex-digit local port field is turned into a number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PortDecoding {
    /// Plain big-endian hexadecimal (`1F90` -> 8080).
    #[default]
    Hex,
    /// Byte pairs read as character codes, then the text parsed as decimal
    /// (`3830` -> "80" -> 80). Only meaningful for IPv4 tables written by
    /// older tooling that relied on this behaviour.
    LegacyCharCode,
}

impl PortDecoding {
    /// Decodes a port field; `None` means the row must be skipped.
    pub fn decode(self, field: &str) -> Option<u16> {
        match self {
            PortDecoding::Hex => decode_hex_field(field),
            PortDecoding::LegacyCharCode => decode_char_code_field(field),
        }
    }
}

/// Formats a port as a 4-digit uppercase hex field.
pub fn encode_field(port: u16) -> String {
    format!("{port:04X}")
}

/// Parses a 4-digit hex port field, case-insensitively.
pub fn decode_hex_field(field: &str) -> Option<u16> {
    if field.len() != 4 {
        return None;
    }
    u16::from_str_radix(field, 16).ok()
}

/// Character-code decoding of a hex port field.
pub fn decode_char_code_field(field: &str) -> Option<u16> {
    if field.len() % 2 != 0 || !field.is_ascii() {
        return None;
    }

    let text: String = field
        .as_bytes()
        .chunks(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .map(char::from)
        })
        .collect::<Option<String>>()?;

    text.parse().ok()
}
