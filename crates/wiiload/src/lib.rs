//! A client for the Wiiload protocol, used to send homebrew executables to a console running a
//! Wiiload receiver (such as the Homebrew Channel) over the network.
//!
//! A transfer is a single TCP connection to port [`WIILOAD_PORT`] carrying a fixed size
//! [`Header`] followed by the executable itself. The receiver does not acknowledge anything.

pub mod address;
pub mod header;
pub mod payload;
pub mod transport;

pub use address::ADDRESS_VAR;
pub use binrw;
pub use header::{HEADER_SIZE, Header, Version};
pub use payload::{Format, Payload};
pub use transport::{Timeouts, WIILOAD_PORT};

use address::AddressError;
use easyerr::{Error, ResultExt};
use header::HeaderError;
use payload::PayloadError;
use std::{net::SocketAddrV4, path::Path, time::Duration};
use transport::TransportError;

/// Transfer configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address of the console. Takes priority over `fallback` unless empty.
    pub address: Option<String>,
    /// Address used when no explicit one is given, usually the value of [`ADDRESS_VAR`].
    pub fallback: Option<String>,
    /// Port of the receiver.
    pub port: u16,
    /// Connection timeout. If `None`, the OS default applies.
    pub connect_timeout: Option<Duration>,
    /// Write timeout. If `None`, writes block until done.
    pub write_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: None,
            fallback: None,
            port: WIILOAD_PORT,
            connect_timeout: None,
            write_timeout: None,
        }
    }
}

impl Config {
    /// A configuration with the fallback address taken from the environment.
    pub fn from_env() -> Self {
        Self {
            fallback: address::fallback_from_env(),
            ..Default::default()
        }
    }

    /// Sets the explicit address of the console.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    fn timeouts(&self) -> Timeouts {
        Timeouts {
            connect: self.connect_timeout,
            write: self.write_timeout,
        }
    }
}

/// The broad category of a [`SendError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No address was given and none is in the environment.
    Configuration,
    /// The address is not an IPv4 address.
    InvalidAddress,
    /// The file is not a supported executable.
    UnsupportedFormat,
    /// The file could not be read.
    PayloadRead,
    /// The header could not be built.
    Encoding,
    /// The receiver could not be reached.
    Connection,
    /// The connection broke while sending.
    Transmission,
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error(transparent)]
    Address { source: AddressError },
    #[error(transparent)]
    Payload { source: PayloadError },
    #[error(transparent)]
    Header { source: HeaderError },
    #[error(transparent)]
    Transport { source: TransportError },
}

impl SendError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Address { source } => match source {
                AddressError::Unconfigured => ErrorKind::Configuration,
                AddressError::Invalid { .. } => ErrorKind::InvalidAddress,
            },
            Self::Payload { source } => match source {
                PayloadError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
                PayloadError::Read { .. } => ErrorKind::PayloadRead,
            },
            Self::Header { .. } => ErrorKind::Encoding,
            Self::Transport { source } => match source {
                TransportError::Connect { .. } => ErrorKind::Connection,
                TransportError::Header { .. } | TransportError::Payload { .. } => {
                    ErrorKind::Transmission
                }
            },
        }
    }
}

/// A completed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Where the transfer was sent to.
    pub target: SocketAddrV4,
    /// Number of header bytes sent.
    pub header_len: usize,
    /// Number of payload bytes sent.
    pub payload_len: usize,
}

/// Sends the executable at `path` to the console.
///
/// The file is loaded and the address resolved before any connection is made. Success only means
/// both the header and the payload were written: whether the console ran the executable is
/// unknown.
pub fn send(path: impl AsRef<Path>, config: &Config) -> Result<Delivery, SendError> {
    let path = path.as_ref();
    let _span = tracing::info_span!("wiiload send", ?path).entered();

    let payload = payload::load(path).context(SendCtx::Payload)?;
    let ip = address::resolve(config.address.as_deref(), config.fallback.as_deref())
        .context(SendCtx::Address)?;

    let header = Header::new(path, payload.len())
        .and_then(|header| header.encode())
        .context(SendCtx::Header)?;

    let target = SocketAddrV4::new(ip, config.port);
    transport::deliver(target, config.timeouts(), &header, &payload.bytes)
        .context(SendCtx::Transport)?;

    tracing::info!("sent {path:?} ({} bytes) to {target}", payload.len());
    Ok(Delivery {
        target,
        header_len: header.len(),
        payload_len: payload.len(),
    })
}
