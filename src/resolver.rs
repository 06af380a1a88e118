//! Port to owner resolution.
//!
//! Scans the IPv6 table first and the IPv4 table second. Within a table the
//! first record on the requested port whose owner credential the identity
//! service recognises wins. Every failure on the way (unreadable table,
//! failing identity service, missing interfaces) is logged and absorbed, so
//! the only outcome a caller sees besides an answer is `None`.

use log::{debug, warn};
use serde::Serialize;

use crate::identity::IdentityLookup;
use crate::model::{ApplicationDescriptor, ConnectionRecord, TableVariant};
use crate::netif::{self, AddressHints};
use crate::table::{parse_with, ParseOptions, TableSources};

/// A resolved owner together with the row it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub record: ConnectionRecord,
    pub descriptor: ApplicationDescriptor,
}

/// Resolves local TCP ports to the application owning them.
///
/// Holds no state between calls; repeated calls only differ when the kernel
/// tables do.
#[derive(Debug, Clone)]
pub struct PortResolver<L> {
    sources: TableSources,
    options: ParseOptions,
    lookup: L,
}

impl<L: IdentityLookup> PortResolver<L> {
    /// Creates a resolver reading `/proc/net/tcp{,6}` with default parsing.
    pub fn new(lookup: L) -> Self {
        Self {
            sources: TableSources::default(),
            options: ParseOptions::default(),
            lookup,
        }
    }

    pub fn with_sources(mut self, sources: TableSources) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn sources(&self) -> &TableSources {
        &self.sources
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Returns the application owning `port`, if any.
    pub fn resolve_owner(&self, port: u16) -> Option<ApplicationDescriptor> {
        self.resolve(port).map(|resolution| resolution.descriptor)
    }

    /// Like [`resolve_owner`](Self::resolve_owner), also returning the matching row.
    pub fn resolve(&self, port: u16) -> Option<Resolution> {
        log_address_hints();

        for variant in TableVariant::scan_order() {
            let Some(text) = self.read_table(variant) else {
                continue;
            };

            for record in parse_with(&text, variant, &self.options).filter(|r| r.local_port == port)
            {
                match self.lookup.resolve(record.owner_credential) {
                    Ok(Some(descriptor)) => {
                        debug!(
                            "port {port} owned by credential {} ({variant}): {}",
                            record.owner_credential,
                            descriptor.package_identifier()
                        );
                        return Some(Resolution { record, descriptor });
                    }
                    Ok(None) => debug!(
                        "port {port}: credential {} unknown to identity service",
                        record.owner_credential
                    ),
                    Err(e) => warn!(
                        "port {port}: identity lookup for credential {} failed: {e}",
                        record.owner_credential
                    ),
                }
            }
        }

        debug!("no owner found for port {port}");
        None
    }

    /// Returns the first row bound to `port` in scan order, without
    /// consulting the identity service.
    pub fn find_record(&self, port: u16) -> Option<ConnectionRecord> {
        TableVariant::scan_order().into_iter().find_map(|variant| {
            let text = self.read_table(variant)?;
            parse_with(&text, variant, &self.options).find(|r| r.local_port == port)
        })
    }

    /// Reads one table; an unavailable table counts as empty.
    fn read_table(&self, variant: TableVariant) -> Option<String> {
        match self.sources.read(variant) {
            Ok(text) => Some(text),
            Err(e) => {
                debug!("{e}; treating {variant} table as empty");
                None
            }
        }
    }
}

fn log_address_hints() {
    match netif::local_addresses() {
        Ok(addresses) => {
            let hints = AddressHints::from_addresses(&addresses);
            debug!(
                "address hints: ipv4={:?} ipv6={:?} has_ipv6={}",
                hints.ipv4,
                hints.ipv6,
                hints.has_ipv6()
            );
        }
        Err(e) => debug!("address hints unavailable: {e}"),
    }
}
