//! The header sent before the executable.

use binrw::{BinRead, BinWrite};
use easyerr::{Error, ResultExt};
use static_assertions::const_assert_eq;
use std::{io::Cursor, path::Path};

/// Magic identifying a Wiiload transfer.
pub const MAGIC: [u8; 4] = *b"HAXX";
/// Length of the filename field.
pub const FILENAME_LEN: usize = 256;
/// Length of the arguments field.
pub const ARGS_LEN: usize = 256;
/// Size of the encoded header.
pub const HEADER_SIZE: usize = MAGIC.len() + 4 + 4 + FILENAME_LEN + ARGS_LEN;

const_assert_eq!(HEADER_SIZE, 524);

/// Version of the Wiiload protocol. On the wire, this is a big endian `u32` with the major
/// version in the upper half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(big)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
}

impl Version {
    /// The version spoken by the Homebrew Channel, 0.5.
    pub const HBC: Self = Self { major: 0, minor: 5 };

    pub fn packed(self) -> u32 {
        (u32::from(self.major) << 16) | u32::from(self.minor)
    }
}

#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("payload of {len} bytes does not fit in a wiiload header")]
    TooLarge { len: usize },
    #[error(transparent)]
    Encode { source: binrw::Error },
    #[error(transparent)]
    Decode { source: binrw::Error },
}

/// Header of a Wiiload transfer.
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(big, magic = b"HAXX")]
pub struct Header {
    /// Protocol version.
    pub version: Version,
    /// Length of the executable following the header.
    pub size: u32,
    /// Base name of the executable, zero padded. Longer names are truncated.
    pub filename: [u8; FILENAME_LEN],
    /// Arguments for the executable. Never filled by this client.
    pub args: [u8; ARGS_LEN],
}

impl Header {
    /// Creates the header for a payload of `len` bytes read from `path`.
    pub fn new(path: &Path, len: usize) -> Result<Self, HeaderError> {
        let size = u32::try_from(len).map_err(|_| HeaderError::TooLarge { len })?;

        let mut filename = [0; FILENAME_LEN];
        if let Some(name) = path.file_name() {
            let name = name.as_encoded_bytes();
            let name = &name[..name.len().min(FILENAME_LEN)];
            filename[..name.len()].copy_from_slice(name);
        }

        Ok(Self {
            version: Version::HBC,
            size,
            filename,
            args: [0; ARGS_LEN],
        })
    }

    /// The filename without its zero padding.
    pub fn filename(&self) -> &[u8] {
        let end = self
            .filename
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(FILENAME_LEN);

        &self.filename[..end]
    }

    /// Serializes this header into its [`HEADER_SIZE`] bytes wire form.
    pub fn encode(&self) -> Result<Vec<u8>, HeaderError> {
        let mut cursor = Cursor::new(Vec::with_capacity(HEADER_SIZE));
        self.write(&mut cursor).context(HeaderCtx::Encode)?;

        Ok(cursor.into_inner())
    }

    /// Parses a header from its wire form.
    pub fn decode(bytes: &[u8]) -> Result<Self, HeaderError> {
        Self::read(&mut Cursor::new(bytes)).context(HeaderCtx::Decode)
    }
}
