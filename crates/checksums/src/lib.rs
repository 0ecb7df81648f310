#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `checksums` provides the rolling and strong checksum primitives used by the
//! deltasync delta-transfer pipeline. The weak checksum is the Adler-32 style
//! two-lane sum that makes sliding-window block matching cheap; the strong
//! checksums confirm candidate matches so weak collisions never corrupt a
//! reconstruction.
//!
//! # Design
//!
//! The crate offers two modules:
//!
//! - [`rolling`] implements the 32-bit weak checksum with O(1) slide-by-one
//!   updates ([`RollingChecksum::roll`]) and window shrinking
//!   ([`RollingChecksum::trim`]). The checksum owns a copy of its window so
//!   sliding never requires the caller to resupply outgoing bytes.
//! - [`strong`] exposes MD4, MD5, and XXH64 digests behind the
//!   [`strong::StrongDigest`] trait, plus [`strong::StrongHasher`], which
//!   applies the configured seed mixing and produces truncatable
//!   [`strong::BlockDigest`] values.
//!
//! # Invariants
//!
//! - Both rolling lanes are truncated to 16 bits after every update, so a
//!   rolled state is always bit-identical to a from-scratch computation over
//!   the same window.
//! - Rolling updates reject empty windows and window lengths that overflow
//!   `u32` instead of silently corrupting state.
//! - Strong digests stream data incrementally and never panic.
//!
//! # Examples
//!
//! Compute a weak checksum for a window and then slide it by one byte.
//!
//! ```
//! use checksums::RollingChecksum;
//!
//! let data = b"abcdef";
//! let mut rolling = RollingChecksum::new();
//! rolling.check(&data[..4]);
//! rolling.roll(data[4]).unwrap();
//!
//! let mut fresh = RollingChecksum::new();
//! fresh.check(&data[1..5]);
//! assert_eq!(rolling.value(), fresh.value());
//! ```

pub mod rolling;
pub mod strong;

pub use rolling::{LEGACY_CHAR_OFFSET, RollingChecksum, RollingError};
pub use strong::{
    BlockDigest, ChecksumSeed, Md4, Md5, SeedOrder, StrongAlgorithm, StrongDigest, StrongHasher,
    Xxh64,
};
