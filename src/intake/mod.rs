//! Image intake: validates candidate files against the intake policy and
//! keeps the staged set, each image holding a scoped preview resource.

pub mod format;
pub mod preview;
pub mod staging;

pub use format::*;
pub use preview::*;
pub use staging::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntakeError {
    #[error("{file_name}: unsupported format {mime_type} (only JPEG, PNG and TIFF are accepted)")]
    InvalidFormat { file_name: String, mime_type: String },

    #[error("{file_name}: file too large ({size_bytes} bytes exceeds {max_bytes} byte limit)")]
    FileTooLarge {
        file_name: String,
        size_bytes: u64,
        max_bytes: u64,
    },

    #[error("Too many images: {current} staged + {incoming} incoming exceeds the limit of {max}")]
    TooManyImages {
        current: usize,
        incoming: usize,
        max: usize,
    },
}

impl IntakeError {
    /// Stable machine-readable code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFormat { .. } => "INVALID_FORMAT",
            Self::FileTooLarge { .. } => "FILE_TOO_LARGE",
            Self::TooManyImages { .. } => "TOO_MANY_IMAGES",
        }
    }
}
