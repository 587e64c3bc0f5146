use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for emulator operations
pub type Result<T> = std::result::Result<T, FddError>;

/// Errors that can occur while serving the host or touching a disk image
#[derive(Debug, Error)]
pub enum FddError {
    /// I/O error occurred while reading or writing a backing file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A disk image file could not be opened for mounting
    #[error("Cannot open disk image {path}: {source}")]
    Open {
        /// Path that was given for the image
        path: PathBuf,
        /// Underlying open error
        source: std::io::Error,
    },

    /// The backing file is not a usable D88 image
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Drive index outside the two available slots
    #[error("Illegal drive: {drive}")]
    InvalidDrive {
        /// Requested drive index
        drive: u8,
    },

    /// No image is mounted on the drive
    #[error("No disk in drive {drive}")]
    NotMounted {
        /// Requested drive index
        drive: u8,
    },

    /// Invalid track number specified
    #[error("Illegal track {track} on drive {drive} (max: {max})")]
    InvalidTrack {
        /// Drive index
        drive: u8,
        /// Requested logical track
        track: u8,
        /// Highest valid track
        max: u8,
    },

    /// No record on the track carries the requested CHRN
    #[error("Cannot find sector: drive={drive} C={cylinder} H={head} R={record} N={size_code}")]
    SectorNotFound {
        /// Drive index
        drive: u8,
        /// Cylinder
        cylinder: u8,
        /// Head
        head: u8,
        /// Record number (1-based)
        record: u16,
        /// Size code
        size_code: u8,
    },

    /// The image header has its write-protect flag set
    #[error("Drive {drive} is write protected")]
    WriteProtected {
        /// Drive index
        drive: u8,
    },

    /// Transfer does not fit in the caller's buffer
    #[error("Transfer of {count} sectors exceeds the {capacity}-byte buffer")]
    TransferTooLarge {
        /// Requested sector count
        count: u8,
        /// Buffer size in bytes
        capacity: usize,
    },

    /// A blocking bus wait was abandoned because the stop flag was raised
    #[error("Interrupted while waiting on the bus")]
    Interrupted,
}

impl FddError {
    /// Create an invalid format error
    pub fn invalid_format<S: Into<String>>(message: S) -> Self {
        FddError::InvalidFormat(message.into())
    }

    /// Create an open error for a path
    pub fn open<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        FddError::Open {
            path: path.into(),
            source,
        }
    }

    /// Check whether this error only reports a raised stop flag
    pub fn is_interrupted(&self) -> bool {
        matches!(self, FddError::Interrupted)
    }
}
