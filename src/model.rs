//! Data models for port owner resolution.
//!
//! Contains the connection table record, the table variant that selects a row
//! grammar, and the application descriptor an owner credential resolves to.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DescriptorError;

/// Which kernel connection table a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableVariant {
    Ipv4,
    Ipv6,
}

impl TableVariant {
    /// Number of hex digits in the address fields of this table.
    pub fn address_width(self) -> usize {
        match self {
            TableVariant::Ipv4 => 8,
            TableVariant::Ipv6 => 32,
        }
    }

    /// Short name matching the procfs file name.
    pub fn label(self) -> &'static str {
        match self {
            TableVariant::Ipv4 => "tcp",
            TableVariant::Ipv6 => "tcp6",
        }
    }

    /// Order in which the resolver consults the tables: IPv6 first.
    pub fn scan_order() -> [TableVariant; 2] {
        [TableVariant::Ipv6, TableVariant::Ipv4]
    }
}

impl fmt::Display for TableVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of a kernel connection table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionRecord {
    /// The table this row was read from.
    pub variant: TableVariant,
    /// Raw hex-encoded local address, as written by the kernel.
    pub local_address: String,
    /// Decoded local port.
    pub local_port: u16,
    /// Opaque owner id; a uid or a pid depending on the platform.
    pub owner_credential: u32,
}

/// The application an owner credential resolves to.
///
/// Equality compares all three fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationDescriptor {
    package_identifier: String,
    version_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin_url: Option<String>,
}

impl ApplicationDescriptor {
    /// Creates a descriptor without an origin URL.
    pub fn new(package_identifier: impl Into<String>, version_label: impl Into<String>) -> Self {
        Self {
            package_identifier: package_identifier.into(),
            version_label: version_label.into(),
            origin_url: None,
        }
    }

    pub fn package_identifier(&self) -> &str {
        &self.package_identifier
    }

    pub fn version_label(&self) -> &str {
        &self.version_label
    }

    pub fn origin_url(&self) -> Option<&str> {
        self.origin_url.as_deref()
    }

    /// Sets the origin URL. It can only be set once.
    pub fn set_origin_url(&mut self, url: impl Into<String>) -> Result<(), DescriptorError> {
        if let Some(existing) = &self.origin_url {
            return Err(DescriptorError::OriginAlreadySet(existing.clone()));
        }
        self.origin_url = Some(url.into());
        Ok(())
    }
}
