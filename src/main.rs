//! Port Owner CLI - find out which application owns a local TCP port.

mod cli;
mod display;

use clap::Parser;
use log::debug;

use cli::{Cli, Command};
use display::{
    display_addresses, display_addresses_json, display_config, display_config_json,
    display_records, display_records_json, display_resolution, display_resolution_json,
};
use port_owner::config::{load_settings, settings_path};
use port_owner::error::Result;
use port_owner::netif::{local_addresses, AddressHints};
use port_owner::port::Port;
use port_owner::table::parse_with;
use port_owner::TableVariant;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the level picked by `-v`.
fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Lookup { port, json } => cmd_lookup(port, json),

        Command::Table { ipv6, port, json } => cmd_table(ipv6, port, json),

        Command::Addrs { json } => cmd_addrs(json),

        Command::Config { path, json } => cmd_config(path, json),
    }
}

fn cmd_lookup(port: Port, json: bool) -> Result<()> {
    let settings = load_settings()?;
    let resolver = settings.resolver()?;

    let resolution = resolver.resolve(port.as_u16());

    if json {
        display_resolution_json(port, resolution.as_ref());
    } else {
        display_resolution(port, resolution.as_ref());
    }
    Ok(())
}

fn cmd_table(ipv6: bool, port: Option<Port>, json: bool) -> Result<()> {
    let settings = load_settings()?;
    let variant = if ipv6 {
        TableVariant::Ipv6
    } else {
        TableVariant::Ipv4
    };

    let text = settings.tables.read(variant)?;
    let records: Vec<_> = parse_with(&text, variant, &settings.parsing)
        .filter(|r| port.map_or(true, |p| r.local_port == p.as_u16()))
        .collect();
    debug!("{} rows parsed from the {variant} table", records.len());

    if json {
        display_records_json(&records);
    } else {
        display_records(variant, &records);
    }
    Ok(())
}

fn cmd_addrs(json: bool) -> Result<()> {
    let addresses = local_addresses()?;
    let hints = AddressHints::from_addresses(&addresses);

    if json {
        display_addresses_json(&addresses, &hints);
    } else {
        display_addresses(&addresses, &hints);
    }
    Ok(())
}

fn cmd_config(show_path: bool, json: bool) -> Result<()> {
    let path = settings_path()?;
    let settings = load_settings()?;
    let shown = show_path.then_some(path.as_path());

    if json {
        display_config_json(&settings, shown);
    } else {
        display_config(&settings, shown);
    }
    Ok(())
}
