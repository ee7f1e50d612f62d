//! Console sessions
//!
//! A session is the consumer side of a port: while it is open, enquiry data
//! is copied to its output, and its input is pushed through the write path
//! in `write_room`-sized chunks.

use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, OwnedFd};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use spitty_core::port::Port;
use spitty_core::sink::ByteSink;

/// Copies delivered bytes to a writer
struct WriterSink {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ByteSink for WriterSink {
    fn receive(&self, data: &[u8]) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = out.write_all(data).and_then(|_| out.flush()) {
            log::warn!("Console output failed: {}", e);
        }
    }
}

/// An open session on a port
///
/// The port's sink is set for as long as the session lives.
pub struct Session {
    port: Arc<Port>,
    _sink: Arc<dyn ByteSink>,
}

impl Session {
    /// Open a session that copies received data to `output`
    pub fn open(port: Arc<Port>, output: Box<dyn Write + Send>) -> Self {
        let sink: Arc<dyn ByteSink> = Arc::new(WriterSink {
            out: Mutex::new(output),
        });
        port.open(&sink);
        log::debug!("Session opened on {}", port.name());
        Self { port, _sink: sink }
    }

    /// Write all of `data`, at most `write_room` bytes per transaction
    pub fn write_all(&self, data: &[u8]) -> Result<usize, Box<dyn std::error::Error>> {
        let mut written = 0;
        for chunk in data.chunks(self.port.write_room()) {
            written += self.port.write(chunk)?;
        }
        Ok(written)
    }

    /// Forward `input` to the port until end of input
    pub fn pump(&self, mut input: impl Read) -> Result<u64, Box<dyn std::error::Error>> {
        let mut buf = [0u8; 256];
        let mut total = 0u64;
        loop {
            let n = match input.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            total += self.write_all(&buf[..n])? as u64;
        }
        log::debug!("Forwarded {} bytes to {}", total, self.port.name());
        Ok(total)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.port.close();
        log::debug!("Session closed on {}", self.port.name());
    }
}

/// A raw pseudo-terminal standing in for the device node
pub struct Pty {
    master: File,
    _slave: OwnedFd,
    path: PathBuf,
    link: Option<PathBuf>,
}

impl Pty {
    /// Create a raw pseudo-terminal, optionally symlinked to `link`
    pub fn open(link: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        use nix::pty::{openpty, Winsize};
        use nix::sys::termios::{cfmakeraw, tcgetattr, tcsetattr, SetArg, Termios};

        let pty = openpty(None::<&Winsize>, None::<&Termios>)?;

        let mut termios = tcgetattr(&pty.slave)?;
        cfmakeraw(&mut termios);
        tcsetattr(&pty.slave, SetArg::TCSANOW, &termios)?;

        let path = std::fs::read_link(format!("/proc/self/fd/{}", pty.slave.as_raw_fd()))?;

        let link = match link {
            Some(link) => {
                if link.symlink_metadata().is_ok() {
                    std::fs::remove_file(link)?;
                }
                std::os::unix::fs::symlink(&path, link)?;
                Some(link.to_path_buf())
            }
            None => None,
        };

        Ok(Self {
            master: File::from(pty.master),
            _slave: pty.slave,
            path,
            link,
        })
    }

    /// Path of the terminal side
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reader and writer on the controlling side
    pub fn split(&self) -> io::Result<(File, File)> {
        Ok((self.master.try_clone()?, self.master.try_clone()?))
    }
}

impl Drop for Pty {
    fn drop(&mut self) {
        if let Some(link) = &self.link {
            if let Err(e) = std::fs::remove_file(link) {
                log::warn!("Failed to remove {}: {}", link.display(), e);
            }
        }
    }
}
