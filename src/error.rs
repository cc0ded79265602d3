use thiserror::Error;

/// Result type alias for memory card operations
pub type Result<T> = std::result::Result<T, McdError>;

/// Errors that can occur when working with memory card images
#[derive(Debug, Error)]
pub enum McdError {
    /// I/O error occurred while reading or writing
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Header or trailing frame does not start with the "MC" signature
    #[error("Bad header frame signature: {found:02X?}")]
    BadSignature {
        /// The two bytes found where the signature should be
        found: [u8; 2],
    },

    /// Frame checksum does not match its contents
    #[error("Bad {frame} frame checksum: stored 0x{stored:02X}, computed 0x{computed:02X}")]
    BadChecksum {
        /// Kind of frame that failed ("header" or "directory")
        frame: &'static str,
        /// Checksum byte stored in the frame
        stored: u8,
        /// Checksum recomputed from the frame contents
        computed: u8,
    },

    /// Image is longer than a memory card
    #[error("Trailing bytes: {0} bytes after the last data block")]
    TrailingBytes(usize),

    /// Parse error at specific offset
    #[error("Parse error at offset {offset}: {message}")]
    ParseError {
        /// Byte offset where error occurred
        offset: usize,
        /// Error message
        message: String,
    },

    /// Link chain leaves the card or loops
    #[error("Corrupt block chain starting at block {start}: {message}")]
    CorruptChain {
        /// Block the walk started from
        start: usize,
        /// What went wrong
        message: String,
    },

    /// Path does not satisfy the filesystem path rules
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// File not found in filesystem
    #[error("File not found: {0}")]
    NotFound(String),

    /// More than one file on the card carries this name
    #[error("Duplicate entries in memory card: {0}")]
    Duplicate(String),

    /// Path names a file where a directory was required
    #[error("Not a directory: {0}")]
    NotADirectory(String),

    /// Path names a directory where a file was required
    #[error("Is a directory: {0}")]
    IsADirectory(String),

    /// Written file has the wrong length
    #[error("Invalid length: {0}")]
    InvalidLength(String),

    /// A file with the same name has already been written to the card
    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    /// Card is full, no free blocks
    #[error("No free space: {needed} blocks needed, {available} available")]
    NoFreeSpace {
        /// Blocks the file needs
        needed: usize,
        /// Blocks still free
        available: usize,
    },

    /// Card writer has already been finished
    #[error("Card writer is already finished")]
    WriterClosed,

    /// File handle has already been committed
    #[error("File handle is already closed")]
    HandleClosed,

    /// All channel slots for a product code are taken
    #[error("No free memory card channels for {0}")]
    NoFreeChannels(String),
}

impl McdError {
    /// Create a parse error with context
    pub fn parse<S: Into<String>>(offset: usize, message: S) -> Self {
        McdError::ParseError {
            offset,
            message: message.into(),
        }
    }

    /// Create a corrupt chain error
    pub fn corrupt_chain<S: Into<String>>(start: usize, message: S) -> Self {
        McdError::CorruptChain {
            start,
            message: message.into(),
        }
    }

    /// Create an invalid length error
    pub fn invalid_length<S: Into<String>>(message: S) -> Self {
        McdError::InvalidLength(message.into())
    }
}
