//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Generate dynamic help text for the transport argument
fn transport_help() -> String {
    format!(
        "SPI transport to use [available: {}]",
        spitty_registry::transport_names_short()
    )
}

/// Generate dynamic help text for the interrupt argument
fn irq_help() -> String {
    format!(
        "Data-ready interrupt source [available: {}]",
        spitty_registry::irq_names_short()
    )
}

#[derive(Parser)]
#[command(name = "spitty")]
#[command(author, version, about = "Serial console over an SPI link", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Peer connection options shared across commands
#[derive(clap::Args, Debug, Clone)]
pub struct LinkArgs {
    /// SPI transport, e.g. linux_spi:dev=/dev/spidev0.0
    #[arg(short = 's', long, help = transport_help())]
    pub transport: String,

    /// Interrupt source, e.g. gpio:gpiochip=0,line=25
    #[arg(short, long, default_value = "timer", help = irq_help())]
    pub irq: String,

    /// Peer device id
    #[arg(short, long, default_value = "atmega32u4")]
    pub device: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Attach the peer and bridge it to a console until end of input
    Bridge {
        #[command(flatten)]
        link: LinkArgs,

        /// Expose the port on a new pseudo-terminal instead of stdio
        #[arg(long)]
        pty: bool,

        /// Symlink the pseudo-terminal to this path (requires --pty)
        #[arg(long = "link", requires = "pty")]
        link_path: Option<PathBuf>,
    },

    /// Issue enquiries by hand and print whatever arrives
    Poll {
        #[command(flatten)]
        link: LinkArgs,

        /// Number of enquiries
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,

        /// Milliseconds between enquiries
        #[arg(long, default_value_t = 200)]
        interval: u64,
    },

    /// Write data to the peer
    Send {
        #[command(flatten)]
        link: LinkArgs,

        /// Data to send (reads stdin if neither this nor --file is given)
        #[arg(conflicts_with = "file")]
        data: Option<String>,

        /// File to send
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// List available transports, interrupt sources and devices
    List,
}
