//! Bridge command implementation

use std::io;
use std::path::Path;

use super::attach;
use crate::cli::LinkArgs;
use crate::console::{Pty, Session};

/// Bridge the peer to stdio, or to a new pseudo-terminal
pub fn run_bridge(
    args: &LinkArgs,
    pty: bool,
    link: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let attached = attach(args)?;
    let port = attached.port.clone();

    if pty {
        let pty = Pty::open(link)?;
        println!("{} ready at {}", port.name(), pty.path().display());
        if let Some(link) = link {
            println!("  linked from {}", link.display());
        }

        let (input, output) = pty.split()?;
        let session = Session::open(port, Box::new(output));
        session.pump(input)?;
    } else {
        log::info!("Bridging {} to stdio (end input to exit)", port.name());
        let session = Session::open(port, Box::new(io::stdout()));
        session.pump(io::stdin().lock())?;
    }

    Ok(())
}
