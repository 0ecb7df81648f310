#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `signature` turns a basis byte stream into the per-block checksum records
//! that drive delta matching. A basis is partitioned into consecutive blocks
//! of [`SyncConfig::block_length`] bytes (the final block may be shorter), and
//! each block yields a [`BlockSignature`]: a weak rolling checksum paired with
//! a truncated strong digest, plus the block's offset, length, and sequence
//! number.
//!
//! # Design
//!
//! - [`SyncConfig`] is the immutable tunable record shared by every pipeline
//!   stage. It is produced by [`SyncConfigBuilder`], which performs all
//!   validation in one place.
//! - [`SignatureGenerator`] is the streaming form: feed it arbitrary chunks
//!   and it emits one [`BlockSignature`] per completed block through a
//!   caller-supplied callback. [`generate_signature`] and
//!   [`signature_from_reader`] are the one-shot conveniences built on top.
//!
//! # Invariants
//!
//! - Emitted blocks tile the basis exactly: offsets are consecutive, lengths
//!   sum to the basis length, and only the final block may be shorter than
//!   `block_length`.
//! - The emitted sequence is independent of how the input was chunked.
//!
//! # Examples
//!
//! ```
//! use signature::{SyncConfig, generate_signature};
//!
//! let config = SyncConfig::builder().block_length(4).build().unwrap();
//! let blocks = generate_signature(b"0123456789", &config);
//!
//! assert_eq!(blocks.len(), 3);
//! assert_eq!(blocks[2].offset(), 8);
//! assert_eq!(blocks[2].length(), 2);
//! ```

mod config;
mod generator;
mod types;

pub use config::{ConfigError, DEFAULT_BLOCK_LENGTH, DEFAULT_CHUNK_SIZE, SyncConfig, SyncConfigBuilder};
pub use generator::{SignatureGenerator, generate_signature, signature_from_reader};
pub use types::{BlockSignature, ChecksumPair};
