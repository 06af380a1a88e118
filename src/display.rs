//! Output formatting and display utilities.

use std::path::Path;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, Color, ContentArrangement, Table, TableComponent};
use serde::Serialize;

use port_owner::config::Settings;
use port_owner::netif::{AddressHints, InterfaceAddress};
use port_owner::port::Port;
use port_owner::{ApplicationDescriptor, ConnectionRecord, Resolution, TableVariant};

/// Creates a table with clean styling: solid borders, no row separators.
fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_style(TableComponent::VerticalLines, '│');
    table.set_style(TableComponent::MiddleHeaderIntersections, '┼');
    table.set_style(TableComponent::HeaderLines, '─');
    table.set_style(TableComponent::LeftHeaderIntersection, '├');
    table.set_style(TableComponent::RightHeaderIntersection, '┤');
    table
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    let json = serde_json::to_string_pretty(value).expect("Failed to serialize to JSON");
    println!("{json}");
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "---"
    } else {
        value
    }
}

/// Lookup result for JSON output.
#[derive(Debug, Serialize)]
pub struct LookupResult<'a> {
    pub port: Port,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TableVariant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_credential: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application: Option<&'a ApplicationDescriptor>,
}

impl<'a> LookupResult<'a> {
    pub fn new(port: Port, resolution: Option<&'a Resolution>) -> Self {
        Self {
            port,
            found: resolution.is_some(),
            table: resolution.map(|r| r.record.variant),
            owner_credential: resolution.map(|r| r.record.owner_credential),
            application: resolution.map(|r| &r.descriptor),
        }
    }
}

/// Displays the owner of a port.
pub fn display_resolution(port: Port, resolution: Option<&Resolution>) {
    let Some(resolution) = resolution else {
        println!("No owner found for port {port}");
        return;
    };

    let descriptor = &resolution.descriptor;
    let mut table = create_table();
    table.set_header(vec!["PORT", "TABLE", "CREDENTIAL", "PACKAGE", "VERSION", "ORIGIN"]);
    table.add_row(vec![
        Cell::new(port),
        Cell::new(resolution.record.variant),
        Cell::new(resolution.record.owner_credential),
        Cell::new(descriptor.package_identifier()).fg(Color::Green),
        Cell::new(descriptor.version_label()),
        Cell::new(descriptor.origin_url().unwrap_or("---")),
    ]);

    println!("{table}");
}

pub fn display_resolution_json(port: Port, resolution: Option<&Resolution>) {
    print_json(&LookupResult::new(port, resolution));
}

/// Displays parsed connection table rows.
pub fn display_records(variant: TableVariant, records: &[ConnectionRecord]) {
    if records.is_empty() {
        println!("No matching rows in the {variant} table.");
        return;
    }

    let mut table = create_table();
    table.set_header(vec!["LOCAL ADDRESS", "PORT", "CREDENTIAL"]);

    for record in records {
        table.add_row(vec![
            Cell::new(&record.local_address),
            Cell::new(record.local_port),
            Cell::new(record.owner_credential),
        ]);
    }

    println!("{table}");
}

pub fn display_records_json(records: &[ConnectionRecord]) {
    print_json(records);
}

/// Interface listing for JSON output.
#[derive(Debug, Serialize)]
pub struct AddressesInfo<'a> {
    pub preferred_ipv4: &'a str,
    pub preferred_ipv6: &'a str,
    pub has_ipv6: bool,
    pub addresses: &'a [InterfaceAddress],
}

/// Displays interface addresses and the selected hints.
pub fn display_addresses(addresses: &[InterfaceAddress], hints: &AddressHints) {
    println!("Preferred IPv4: {}", or_dash(&hints.ipv4));
    println!("Preferred IPv6: {}", or_dash(&hints.ipv6));

    if addresses.is_empty() {
        println!();
        println!("No interface addresses found.");
        return;
    }

    let mut table = create_table();
    table.set_header(vec!["INTERFACE", "ADDRESS", "LOOPBACK"]);

    for addr in addresses {
        let loopback = if addr.address.is_loopback() {
            Cell::new("yes").fg(Color::DarkGrey)
        } else {
            Cell::new("no")
        };
        table.add_row(vec![Cell::new(&addr.interface), Cell::new(addr.text()), loopback]);
    }

    println!();
    println!("{table}");
}

pub fn display_addresses_json(addresses: &[InterfaceAddress], hints: &AddressHints) {
    print_json(&AddressesInfo {
        preferred_ipv4: &hints.ipv4,
        preferred_ipv6: &hints.ipv6,
        has_ipv6: hints.has_ipv6(),
        addresses,
    });
}

/// Configuration info for JSON output.
#[derive(Debug, Serialize)]
pub struct ConfigInfo<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<String>,
    #[serde(flatten)]
    pub settings: &'a Settings,
}

/// Displays configuration information.
pub fn display_config(settings: &Settings, path: Option<&Path>) {
    if let Some(p) = path {
        println!("Config file: {}", p.display());
        println!();
    }

    let mut table = create_table();
    table.set_header(vec!["SETTING", "VALUE"]);
    table.add_row(vec![
        Cell::new("tables.tcp"),
        Cell::new(settings.tables.tcp.display()),
    ]);
    table.add_row(vec![
        Cell::new("tables.tcp6"),
        Cell::new(settings.tables.tcp6.display()),
    ]);
    table.add_row(vec![
        Cell::new("parsing.port_decoding"),
        Cell::new(format!("{:?}", settings.parsing.port_decoding)),
    ]);
    table.add_row(vec![
        Cell::new("parsing.separators"),
        Cell::new(format!("{:?}", settings.parsing.separators)),
    ]);
    table.add_row(vec![
        Cell::new("lookup.system_accounts"),
        Cell::new(settings.lookup.system_accounts),
    ]);
    println!("{table}");

    if settings.identities.is_empty() {
        return;
    }

    println!();
    println!("Identities:");
    let mut identities = create_table();
    identities.set_header(vec!["CREDENTIAL", "PACKAGE", "VERSION", "ORIGIN"]);
    for (credential, entry) in &settings.identities {
        identities.add_row(vec![
            Cell::new(credential),
            Cell::new(&entry.package),
            Cell::new(&entry.version),
            Cell::new(entry.origin_url.as_deref().unwrap_or("---")),
        ]);
    }
    println!("{identities}");
}

pub fn display_config_json(settings: &Settings, path: Option<&Path>) {
    print_json(&ConfigInfo {
        config_file: path.map(|p| p.display().to_string()),
        settings,
    });
}
