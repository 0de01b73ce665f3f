use thiserror::Error;

/// Errors raised while building a DAWG or encoding it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Words were not provided in strictly increasing byte order.
    ///
    /// Contains the two words that were out of order (previous word, current word).
    #[error("OrderError - {previous:?} came before {word:?}")]
    Order {
        /// The word inserted before the offending one.
        previous: Vec<u8>,
        /// The rejected word.
        word: Vec<u8>,
    },
    /// The empty word cannot be stored.
    #[error("empty word passed to insert")]
    EmptyInput,
    /// `insert` or `finish` was called after `finish`.
    #[error("builder is already finished")]
    AlreadyFinished,
    /// Encoding was requested before `finish`.
    #[error("builder must be finished before encoding")]
    NotFinished,
    /// The word would give the state reached by `prefix` a 256th edge.
    #[error("state at prefix {prefix:?} cannot hold more than 255 edges")]
    TooManyEdges {
        /// Path to the full state.
        prefix: Vec<u8>,
    },
    /// The encoded structure does not fit in 31-bit offsets.
    #[error("structure of {size} bytes exceeds the addressable size")]
    TooLarge {
        /// Size the structure region would have had.
        size: usize,
    },
}

/// Reasons a compact buffer is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The buffer is shorter than its header, or its structure region cannot hold a root.
    #[error("buffer is truncated")]
    Truncated,
    /// The first four bytes are not `dawg`.
    #[error("dawg magic phrase is incorrect")]
    BadMagic,
    /// Only version 1 is understood.
    #[error("unsupported dawg version {0}")]
    BadVersion(u8),
    /// A width field in the header holds an unsupported value.
    #[error("unsupported {field} width {value}")]
    UnsupportedWidth {
        /// Which header field was rejected.
        field: &'static str,
        /// The value found there.
        value: u8,
    },
    /// The declared structure size differs from the bytes present.
    #[error("dawg size is {actual} bytes, header declares {declared}")]
    SizeMismatch {
        /// Size recorded in the header.
        declared: u32,
        /// Size of the structure region actually present.
        actual: usize,
    },
    /// The CRC32C of the structure region differs from the header.
    #[error("dawg checksum is {actual:#010x}, header declares {declared:#010x}")]
    ChecksumMismatch {
        /// Checksum recorded in the header.
        declared: u32,
        /// Checksum computed over the structure region.
        actual: u32,
    },
}

/// Any error produced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Construction or encoding failed.
    #[error(transparent)]
    Build(#[from] BuildError),
    /// A buffer failed validation.
    #[error(transparent)]
    Format(#[from] FormatError),
    /// Reading words or writing output failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used by the stream helpers.
pub type Result<T> = std::result::Result<T, Error>;
