//! CLI command definitions using clap.

use clap::{ArgAction, Parser, Subcommand};

use port_owner::port::Port;

/// Port Owner - find out which application owns a local TCP port.
#[derive(Parser, Debug)]
#[command(name = "powner")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve the application owning a port.
    ///
    /// Checks the IPv6 table first, then the IPv4 table.
    #[command(visible_alias = "l")]
    Lookup {
        /// Port number, decimal (8080) or hex (0x1F90)
        port: Port,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show the parsed rows of a connection table.
    #[command(visible_alias = "t")]
    Table {
        /// Read the IPv6 table instead of the IPv4 one
        #[arg(long = "ipv6", short = '6')]
        ipv6: bool,

        /// Only show rows bound to this port
        #[arg(long, short = 'p')]
        port: Option<Port>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show local interface addresses and the preferred IPv4/IPv6 address.
    #[command(visible_alias = "a")]
    Addrs {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration.
    #[command(visible_alias = "c")]
    Config {
        /// Show the config file path
        #[arg(long)]
        path: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}
