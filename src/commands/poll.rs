//! Poll command implementation

use std::io;
use std::thread;
use std::time::Duration;

use super::attach;
use crate::cli::LinkArgs;
use crate::console::Session;

/// Issue `count` enquiries, `interval` ms apart, printing what arrives
pub fn run_poll(args: &LinkArgs, count: u32, interval: u64) -> Result<(), Box<dyn std::error::Error>> {
    let attached = attach(args)?;
    let port = attached.port.clone();
    let _session = Session::open(port.clone(), Box::new(io::stdout()));

    let mut total = 0;
    for i in 0..count {
        if i > 0 {
            thread::sleep(Duration::from_millis(interval));
        }
        total += port.poll()?;
    }

    log::info!("{} enquiries, {} bytes delivered", count, total);
    Ok(())
}
