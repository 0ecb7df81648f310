#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `matching` scans a target byte stream against the block signature of a
//! basis and emits a delta: the minimal-effort mix of [`Delta::Copy`]
//! instructions (for target regions that already exist in the basis) and
//! [`Delta::Literal`] instructions (for everything else) that reconstructs
//! the target from the basis.
//!
//! # Design
//!
//! - [`SignatureIndex`] holds the basis signature as a two-key probabilistic
//!   index: a 65,536-bit membership filter over the low half of the weak sum
//!   answers most probes without touching the bucket map, and the strong
//!   digest is computed only when the full weak sum has candidates.
//! - [`Matcher`] is the streaming engine. It keeps a window buffer of
//!   [`SyncConfig::chunk_size`](signature::SyncConfig::chunk_size) bytes and
//!   a rolling checksum over the most recent block-length bytes, probing the
//!   index at every target offset.
//! - Deltas are observed through [`DeltaSink`]s. Every sink sees every delta
//!   in non-decreasing `write_offset` order; sink failures during one
//!   emission are collected into [`SinkFailures`] so none is lost.
//!
//! # Examples
//!
//! ```
//! use matching::{SignatureIndex, generate_delta};
//! use signature::{SyncConfig, generate_signature};
//!
//! let config = SyncConfig::builder().block_length(4).build().unwrap();
//! let basis = b"0123456789abcdef";
//! let index = SignatureIndex::from_signature(&generate_signature(basis, &config), &config);
//!
//! let script = generate_delta(b"XX89abYY", &index, &config).unwrap();
//! assert_eq!(script.copy_bytes(), 4);
//! assert_eq!(script.literal_bytes(), 4);
//! ```

mod delta;
mod index;
mod matcher;

pub use delta::{Delta, DeltaScript, DeltaSink, FnSink, MatchError, SinkError, SinkFailures};
pub use index::{BlockLocation, SignatureIndex};
pub use matcher::{Matcher, generate_delta, generate_delta_from_reader};
