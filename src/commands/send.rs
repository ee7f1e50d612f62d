//! Send command implementation

use std::io::{self, Read};
use std::path::Path;

use super::attach;
use crate::cli::LinkArgs;
use crate::console::Session;

/// Write `data`, the contents of `file`, or stdin to the peer
pub fn run_send(
    args: &LinkArgs,
    data: Option<&str>,
    file: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let payload = match (data, file) {
        (Some(data), _) => data.as_bytes().to_vec(),
        (None, Some(path)) => std::fs::read(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?,
        (None, None) => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };

    let attached = attach(args)?;
    let session = Session::open(attached.port.clone(), Box::new(io::stdout()));
    let written = session.write_all(&payload)?;
    log::info!("Wrote {} bytes to {}", written, attached.port.name());

    #[cfg(feature = "dummy")]
    if let Some(peer) = &attached.peer {
        log::info!(
            "Peer received: {:?}",
            String::from_utf8_lossy(&peer.received())
        );
    }

    Ok(())
}
