#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `rebuild` replays a delta against a basis to produce the target. Three
//! modes are supported:
//!
//! - **Out-of-place, sequential** ([`rebuild_to_writer`]): stream the target
//!   into any writer, sorting the delta by write offset first if needed.
//! - **Out-of-place, random-access** ([`rebuild_random_access`],
//!   [`rebuild_file`]): seek the output to each instruction's write offset.
//! - **In-place** ([`rebuild_in_place`], [`rebuild_file_in_place`]): the
//!   destination file *is* the basis, so copies may overlap writes that other
//!   copies still need to read. Copies are scheduled through a conflict graph
//!   with cycle detection; cycle participants are read out before any
//!   mutation and replayed as literals.
//!
//! # Errors
//!
//! All failure modes surface as [`RebuildError`]: a copy without a basis
//! ([`RebuildError::BasisMissing`]), a copy reading past the basis end
//! ([`RebuildError::BasisTooShort`]), identical source and destination paths
//! in out-of-place mode ([`RebuildError::SameFile`]), and propagated I/O
//! failures. File handles are released on every path.
//!
//! # Examples
//!
//! ```
//! use matching::{SignatureIndex, generate_delta};
//! use rebuild::rebuild_to_writer;
//! use signature::{SyncConfig, generate_signature};
//! use std::io::Cursor;
//!
//! let config = SyncConfig::builder().block_length(4).build().unwrap();
//! let basis = b"0123456789";
//! let target = b"__01234567";
//!
//! let index = SignatureIndex::from_signature(&generate_signature(basis, &config), &config);
//! let script = generate_delta(target, &index, &config).unwrap();
//!
//! let mut out = Vec::new();
//! rebuild_to_writer(Some(&mut Cursor::new(basis)), script.deltas(), &mut out).unwrap();
//! assert_eq!(out, target);
//! ```

mod error;
mod inplace;
mod outofplace;

pub use error::RebuildError;
pub use inplace::{rebuild_file_in_place, rebuild_in_place};
pub use outofplace::{rebuild_file, rebuild_random_access, rebuild_to_writer};
