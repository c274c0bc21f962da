//! Loading of the executable to send.

use easyerr::Error;
use std::path::{Path, PathBuf};
use strum::VariantArray;

/// An executable format accepted by Wiiload receivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, VariantArray)]
pub enum Format {
    /// GameCube/Wii executable.
    Dol,
    /// PowerPC ELF executable.
    Elf,
    /// Wii U homebrew bundle.
    Wuhb,
    /// Wii U executable.
    Rpx,
}

impl Format {
    /// The lowercase file extension of this format, without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Dol => "dol",
            Self::Elf => "elf",
            Self::Wuhb => "wuhb",
            Self::Rpx => "rpx",
        }
    }

    /// Recognizes the format of the file at `path` from its extension. The file is not accessed.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy();
        let (_, extension) = name.rsplit_once('.')?;

        Self::VARIANTS
            .iter()
            .copied()
            .find(|format| format.extension().eq_ignore_ascii_case(extension))
    }
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("{path:?} is not a .dol, .elf, .wuhb or .rpx file")]
    UnsupportedFormat { path: PathBuf },
    #[error("failed to read {path:?}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// An executable loaded in memory.
#[derive(Debug)]
pub struct Payload {
    pub path: PathBuf,
    pub format: Format,
    pub bytes: Vec<u8>,
}

impl Payload {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

/// Loads the whole executable at `path` into memory. Files with an unsupported extension are
/// rejected before touching the filesystem.
pub fn load(path: &Path) -> Result<Payload, PayloadError> {
    let Some(format) = Format::from_path(path) else {
        return Err(PayloadError::UnsupportedFormat {
            path: path.to_owned(),
        });
    };

    let bytes = std::fs::read(path).map_err(|source| PayloadError::Read {
        path: path.to_owned(),
        source,
    })?;

    tracing::debug!(?format, len = bytes.len(), "loaded payload from {path:?}");
    Ok(Payload {
        path: path.to_owned(),
        format,
        bytes,
    })
}
