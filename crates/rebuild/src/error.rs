//! Reconstruction error type.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced while replaying a delta.
#[derive(Debug, Error)]
pub enum RebuildError {
    /// The delta contains copy instructions but no basis is available.
    #[error("delta contains copy instructions but no basis is available")]
    BasisMissing,
    /// A copy instruction reads past the end of the basis.
    #[error(
        "copy reads past the end of the basis: offset {offset} + length {length} > basis length {basis_len}"
    )]
    BasisTooShort {
        /// Basis offset the copy reads from.
        offset: u64,
        /// Number of bytes the copy reads.
        length: u64,
        /// Length of the basis in bytes.
        basis_len: u64,
    },
    /// Out-of-place reconstruction was asked to read and write the same file.
    #[error("basis and destination are the same file: {}", path.display())]
    SameFile {
        /// The offending path.
        path: PathBuf,
    },
    /// An underlying I/O failure.
    #[error("I/O failure during reconstruction")]
    Io(#[from] io::Error),
}
