//! spitty - Serial console over an SPI link
//!
//! Bridges a microcontroller that speaks the enquiry protocol over SPI to a
//! terminal. Data from the peer is fetched by clocking out enquiry bytes
//! whenever its data-ready line rises; data for the peer is clocked out in
//! transactions of at most 64 bytes.
//!
//! # Architecture
//!
//! - `spitty-core` holds the port, the enquiry poller and the device pool
//! - `spitty-registry` opens transports and interrupt lines by name
//! - backend crates implement `SpiTransport` or `EdgeSource`
//!
//! This binary is the console layer on top: it owns the byte sink while a
//! session is open and feeds its input through the write path.

mod cli;
mod commands;
mod console;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match cli.command {
        Commands::Bridge {
            link,
            pty,
            link_path,
        } => commands::run_bridge(&link, pty, link_path.as_deref()),
        Commands::Poll {
            link,
            count,
            interval,
        } => commands::run_poll(&link, count, interval),
        Commands::Send { link, data, file } => {
            commands::run_send(&link, data.as_deref(), file.as_deref())
        }
        Commands::List => {
            commands::list_backends();
            Ok(())
        }
    }
}
