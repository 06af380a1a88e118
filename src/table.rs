//! Kernel connection table parsing.
//!
//! The tables (`/proc/net/tcp`, `/proc/net/tcp6`) are scanned with one
//! compiled row grammar per table variant. Input is treated as a blob: rows
//! are found by unanchored search, so line breaks are irrelevant and rows that
//! do not fit the grammar simply never match.

use std::fs;
use std::path::{Path, PathBuf};

use log::trace;
use once_cell::sync::Lazy;
use regex::{CaptureMatches, Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::TableError;
use crate::model::{ConnectionRecord, TableVariant};
use crate::port::PortDecoding;

/// Whitespace required before the trailing owner credential column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Separators {
    /// Exactly two whitespace characters for IPv4, exactly one for IPv6.
    #[default]
    Strict,
    /// Any run of whitespace for both variants.
    Relaxed,
}

/// Options that change how rows are matched and decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub port_decoding: PortDecoding,
    pub separators: Separators,
}

impl ParseOptions {
    /// Port decoding actually applied to `variant`; IPv6 is always hex.
    pub fn decoding_for(&self, variant: TableVariant) -> PortDecoding {
        match variant {
            TableVariant::Ipv4 => self.port_decoding,
            TableVariant::Ipv6 => PortDecoding::Hex,
        }
    }
}

/// Capture groups: 1 = local address, 2 = local port, 3 = owner credential.
fn row_pattern(variant: TableVariant, separators: Separators) -> String {
    let width = variant.address_width();
    let separator = match (separators, variant) {
        (Separators::Relaxed, _) => r"\s+",
        (Separators::Strict, TableVariant::Ipv4) => r"\s\s",
        (Separators::Strict, TableVariant::Ipv6) => r"\s",
    };

    format!(
        concat!(
            r"(?i)[0-9]+:\s([0-9A-F]{{{w}}}):([0-9A-F]{{4}})",
            r"\s[0-9A-F]{{{w}}}:[0-9A-F]{{4}}",
            r"\s[0-9A-F]{{2}}",
            r"\s[0-9A-F]{{8}}:[0-9A-F]{{8}}",
            r"\s[0-9A-F]{{2}}:[0-9A-F]{{8}}",
            r"\s[0-9A-F]{{8}}",
            r"{sep}([0-9]+)",
        ),
        w = width,
        sep = separator,
    )
}

fn compile(variant: TableVariant, separators: Separators) -> Regex {
    Regex::new(&row_pattern(variant, separators)).expect("row grammar is a valid regex")
}

static IPV4_STRICT: Lazy<Regex> = Lazy::new(|| compile(TableVariant::Ipv4, Separators::Strict));
static IPV4_RELAXED: Lazy<Regex> = Lazy::new(|| compile(TableVariant::Ipv4, Separators::Relaxed));
static IPV6_STRICT: Lazy<Regex> = Lazy::new(|| compile(TableVariant::Ipv6, Separators::Strict));
static IPV6_RELAXED: Lazy<Regex> = Lazy::new(|| compile(TableVariant::Ipv6, Separators::Relaxed));

/// Returns the compiled row grammar for a variant.
pub fn grammar(variant: TableVariant, separators: Separators) -> &'static Regex {
    match (variant, separators) {
        (TableVariant::Ipv4, Separators::Strict) => &IPV4_STRICT,
        (TableVariant::Ipv4, Separators::Relaxed) => &IPV4_RELAXED,
        (TableVariant::Ipv6, Separators::Strict) => &IPV6_STRICT,
        (TableVariant::Ipv6, Separators::Relaxed) => &IPV6_RELAXED,
    }
}

/// Lazy, single-pass sequence of records found in a table text.
pub struct Records<'t> {
    matches: CaptureMatches<'static, 't>,
    variant: TableVariant,
    decoding: PortDecoding,
}

impl Iterator for Records<'_> {
    type Item = ConnectionRecord;

    fn next(&mut self) -> Option<ConnectionRecord> {
        let (variant, decoding) = (self.variant, self.decoding);
        self.matches
            .by_ref()
            .find_map(|caps| decode_row(&caps, variant, decoding))
    }
}

fn decode_row(
    caps: &Captures<'_>,
    variant: TableVariant,
    decoding: PortDecoding,
) -> Option<ConnectionRecord> {
    let port_field = caps.get(2)?.as_str();
    let Some(local_port) = decoding.decode(port_field) else {
        trace!("skipping {variant} row: undecodable port field {port_field}");
        return None;
    };

    let credential_field = caps.get(3)?.as_str();
    let Ok(owner_credential) = credential_field.parse::<u32>() else {
        trace!("skipping {variant} row: owner credential {credential_field} out of range");
        return None;
    };

    Some(ConnectionRecord {
        variant,
        local_address: caps.get(1)?.as_str().to_string(),
        local_port,
        owner_credential,
    })
}

/// Parses table text with the default options.
pub fn parse(text: &str, variant: TableVariant) -> Records<'_> {
    parse_with(text, variant, &ParseOptions::default())
}

/// Parses table text with explicit options.
pub fn parse_with<'t>(text: &'t str, variant: TableVariant, options: &ParseOptions) -> Records<'t> {
    Records {
        matches: grammar(variant, options.separators).captures_iter(text),
        variant,
        decoding: options.decoding_for(variant),
    }
}

/// Locations of the two connection tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSources {
    pub tcp: PathBuf,
    pub tcp6: PathBuf,
}

impl Default for TableSources {
    fn default() -> Self {
        Self {
            tcp: PathBuf::from("/proc/net/tcp"),
            tcp6: PathBuf::from("/proc/net/tcp6"),
        }
    }
}

impl TableSources {
    pub fn path(&self, variant: TableVariant) -> &Path {
        match variant {
            TableVariant::Ipv4 => &self.tcp,
            TableVariant::Ipv6 => &self.tcp6,
        }
    }

    /// Reads the whole table for `variant`.
    pub fn read(&self, variant: TableVariant) -> Result<String, TableError> {
        let path = self.path(variant);
        fs::read_to_string(path).map_err(|source| TableError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TCP_ROW: &str = "1: 0100007F:1F90 00000000:0000 0A 00000000:00000000 00:00000000 00000000  1000        0 54321 1 0000000000000000 100 0 0 10 0";

    const SAMPLE_TCP: &str = "\
  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 0100007F:0539 00000000:0000 0A 00000000:00000000 00:00000000 00000000   108        0 12345 1 0000000000000000 100 0 0 10 0
   1: 00000000:0050 00000000:0000 0A 00000000:00000000 00:00000000 00000000  1001        0 67890 1 0000000000000000 100 0 0 10 0
   2: 0100007F:1F90 AC10000A:D904 01 00000000:00000000 00:00000000 00000000  1000        0 11111 1 0000000000000000 20 4 30 10 -1
";

    const SAMPLE_TCP6: &str = "\
  sl  local_address                         remote_address                        st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 00000000000000000000000000000000:0050 00000000000000000000000000000000:0000 0A 00000000:00000000 00:00000000 00000000 10045        0 22222 1 0000000000000000 100 0 0 10 0
   1: 00000000000000000000000001000000:0539 00000000000000000000000000000000:0000 0A 00000000:00000000 00:00000000 00000000  1000        0 33333 1 0000000000000000 100 0 0 10 0
";

    #[test]
    fn test_ipv4_row_matches_port_8080() {
        let records: Vec<_> = parse(TCP_ROW, TableVariant::Ipv4).collect();
        assert_eq!(
            records,
            vec![ConnectionRecord {
                variant: TableVariant::Ipv4,
                local_address: "0100007F".to_string(),
                local_port: 8080,
                owner_credential: 1000,
            }]
        );
    }

    #[test]
    fn test_ipv6_row_matches_port_80() {
        let records: Vec<_> = parse(SAMPLE_TCP6, TableVariant::Ipv6).collect();
        // Strict IPv6 allows a single separator, so only the 5-digit uid row fits.
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].local_port, 80);
        assert_eq!(records[0].owner_credential, 10045);
        assert_eq!(records[0].local_address.len(), 32);
    }

    #[test]
    fn test_strict_ipv4_needs_exactly_two_separators() {
        let records: Vec<_> = parse(SAMPLE_TCP, TableVariant::Ipv4).collect();
        let ports: Vec<u16> = records.iter().map(|r| r.local_port).collect();
        // Row 0 has three spaces before its 3-digit uid.
        assert_eq!(ports, vec![80, 8080]);
        assert_eq!(records[0].owner_credential, 1001);
    }

    #[test]
    fn test_relaxed_separators_accept_any_padding() {
        let options = ParseOptions {
            separators: Separators::Relaxed,
            ..ParseOptions::default()
        };

        let v4: Vec<_> = parse_with(SAMPLE_TCP, TableVariant::Ipv4, &options).collect();
        assert_eq!(v4.len(), 3);
        assert_eq!(v4[0].local_port, 1337);
        assert_eq!(v4[0].owner_credential, 108);

        let v6: Vec<_> = parse_with(SAMPLE_TCP6, TableVariant::Ipv6, &options).collect();
        assert_eq!(v6.len(), 2);
        assert_eq!(v6[1].owner_credential, 1000);
    }

    #[test]
    fn test_hex_is_case_insensitive() {
        let lower = TCP_ROW.to_lowercase();
        let records: Vec<_> = parse(&lower, TableVariant::Ipv4).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].local_port, 8080);
        assert_eq!(records[0].local_address, "0100007f");
    }

    #[test]
    fn test_rows_concatenated_without_line_breaks() {
        let blob: String = SAMPLE_TCP.lines().collect();
        let records: Vec<_> = parse(&blob, TableVariant::Ipv4).collect();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_wrong_variant_yields_nothing() {
        assert_eq!(parse(SAMPLE_TCP, TableVariant::Ipv6).count(), 0);
        assert_eq!(parse(SAMPLE_TCP6, TableVariant::Ipv4).count(), 0);
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let text = "\
   0: 0100007F:1F9 00000000:0000 0A 00000000:00000000 00:00000000 00000000  1000
   1: 0100007F:1F90 00000000:0000 0A 00000000:00000000 00:00000000 00000000  99999999999
   2: 0100007F:1F90 00000000:0000 0A 00000000:00000000 00:00000000 00000000  42
   3: garbage
";
        let records: Vec<_> = parse(text, TableVariant::Ipv4).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].owner_credential, 42);
    }

    #[test]
    fn test_legacy_char_code_decoding_only_for_ipv4() {
        let options = ParseOptions {
            port_decoding: PortDecoding::LegacyCharCode,
            ..ParseOptions::default()
        };
        let row = TCP_ROW.replace(":1F90", ":3830");

        let v4: Vec<_> = parse_with(&row, TableVariant::Ipv4, &options).collect();
        assert_eq!(v4[0].local_port, 80);

        // 1F90 has no digit characters, so the legacy decoding drops the row.
        assert_eq!(parse_with(TCP_ROW, TableVariant::Ipv4, &options).count(), 0);

        assert_eq!(options.decoding_for(TableVariant::Ipv6), PortDecoding::Hex);
    }

    #[test]
    fn test_records_are_lazy() {
        let mut records = parse(SAMPLE_TCP, TableVariant::Ipv4);
        assert_eq!(records.next().map(|r| r.local_port), Some(80));
        assert_eq!(records.next().map(|r| r.local_port), Some(8080));
        assert!(records.next().is_none());
        assert!(records.next().is_none());
    }

    #[test]
    fn test_grammar_is_shared() {
        let a = grammar(TableVariant::Ipv4, Separators::Strict);
        let b = grammar(TableVariant::Ipv4, Separators::Strict);
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn test_sources_missing_file() {
        let sources = TableSources {
            tcp: PathBuf::from("/nonexistent/port-owner/tcp"),
            ..TableSources::default()
        };
        let err = sources.read(TableVariant::Ipv4).unwrap_err();
        assert!(matches!(err, TableError::SourceUnavailable { .. }));
        assert_eq!(sources.path(TableVariant::Ipv6), Path::new("/proc/net/tcp6"));
    }
}
