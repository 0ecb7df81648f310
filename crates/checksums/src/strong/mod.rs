//! Strong checksum implementations backed by well-known hash algorithms.
//!
//! The matcher confirms every weak-checksum hit with a strong digest before
//! emitting a copy instruction. This module exposes streaming wrappers for
//! MD4, MD5, and XXH64 behind the [`StrongDigest`] trait, plus
//! [`StrongHasher`], which folds in the configured seed and truncates the
//! output to the configured strong-sum length.

use std::fmt;

mod md4;
mod md5;
mod xxhash;

pub use md4::Md4;
pub use md5::Md5;
pub use xxhash::Xxh64;

/// Maximum digest length across the supported algorithms (MD4/MD5 = 16).
pub const MAX_DIGEST_LEN: usize = 16;

/// Trait implemented by the strong checksum algorithms.
///
/// Implementors provide a streaming interface: callers feed data incrementally
/// via [`update`](Self::update) and obtain the final hash through
/// [`finalize`](Self::finalize). [`DIGEST_LEN`](Self::DIGEST_LEN) exposes the
/// byte width of the result so higher layers can size buffers without
/// algorithm-specific knowledge.
///
/// # Examples
///
/// ```
/// use checksums::strong::{Md5, StrongDigest};
///
/// let mut hasher = Md5::new();
/// hasher.update(b"example");
/// let digest = hasher.finalize();
/// assert_eq!(digest.as_ref().len(), Md5::DIGEST_LEN);
/// ```
pub trait StrongDigest: Sized {
    /// Type returned when finalising the digest.
    type Digest: AsRef<[u8]> + Copy;

    /// Length of the final digest in bytes.
    const DIGEST_LEN: usize;

    /// Creates a new hasher with an empty state.
    fn new() -> Self;

    /// Feeds additional bytes into the digest state.
    fn update(&mut self, data: &[u8]);

    /// Finalises the digest and returns the resulting hash.
    fn finalize(self) -> Self::Digest;

    /// Convenience helper that hashes `data` in a single call.
    fn digest(data: &[u8]) -> Self::Digest {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }
}

/// A strong digest value with fixed inline capacity.
///
/// Block digests are small and compared constantly during matching, so the
/// bytes live inline rather than on the heap. Truncated digests compare equal
/// only to digests of the same truncated length.
#[derive(Clone, Copy)]
pub struct BlockDigest {
    buffer: [u8; MAX_DIGEST_LEN],
    len: u8,
}

impl BlockDigest {
    /// Creates a digest value from a byte slice.
    ///
    /// # Panics
    ///
    /// Panics if `bytes.len() > MAX_DIGEST_LEN`.
    #[must_use]
    pub fn new(bytes: &[u8]) -> Self {
        assert!(
            bytes.len() <= MAX_DIGEST_LEN,
            "digest length {} exceeds maximum {}",
            bytes.len(),
            MAX_DIGEST_LEN
        );
        let mut buffer = [0u8; MAX_DIGEST_LEN];
        buffer[..bytes.len()].copy_from_slice(bytes);
        Self {
            buffer,
            len: bytes.len() as u8,
        }
    }

    /// Returns the digest length in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    /// Returns `true` if the digest holds no bytes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the digest as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.len()]
    }

    /// Returns the digest truncated to `len` leading bytes.
    ///
    /// If `len >= self.len()`, the digest is returned unchanged.
    #[must_use]
    pub fn truncated(&self, len: usize) -> Self {
        if len >= self.len() {
            return *self;
        }
        Self::new(&self.buffer[..len])
    }
}

impl AsRef<[u8]> for BlockDigest {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl PartialEq for BlockDigest {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for BlockDigest {}

impl fmt::Debug for BlockDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockDigest({self})")
    }
}

impl fmt::Display for BlockDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.as_bytes() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Position of the seed bytes relative to the block bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SeedOrder {
    /// The seed is hashed before the block bytes.
    Prefix,
    /// The seed is hashed after the block bytes.
    Suffix,
}

/// Seed bytes mixed into every strong digest.
///
/// Both sides of a transfer must agree on the seed bytes and their ordering;
/// a mismatch makes every strong sum differ, which degrades matching to
/// all-literal deltas rather than corrupting output.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChecksumSeed {
    bytes: Vec<u8>,
    order: SeedOrder,
}

impl ChecksumSeed {
    /// Creates a seed hashed before each block.
    #[must_use]
    pub fn prefix(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            order: SeedOrder::Prefix,
        }
    }

    /// Creates a seed hashed after each block.
    #[must_use]
    pub fn suffix(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            order: SeedOrder::Suffix,
        }
    }

    /// Returns the seed bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns where the seed sits relative to the block bytes.
    #[must_use]
    pub const fn order(&self) -> SeedOrder {
        self.order
    }
}

/// Enumeration of the supported strong checksum algorithms.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum StrongAlgorithm {
    /// MD4 - the legacy strong sum.
    Md4,
    /// MD5 - the default strong sum.
    Md5,
    /// XXH64 - fast 64-bit non-cryptographic variant, valid only when both
    /// sides opt into it.
    Xxh64,
}

impl StrongAlgorithm {
    /// Returns the canonical name for the algorithm.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Md4 => "md4",
            Self::Md5 => "md5",
            Self::Xxh64 => "xxh64",
        }
    }

    /// Returns the digest length of the algorithm in bytes.
    #[must_use]
    pub const fn digest_len(&self) -> usize {
        match self {
            Self::Md4 => Md4::DIGEST_LEN,
            Self::Md5 => Md5::DIGEST_LEN,
            Self::Xxh64 => Xxh64::DIGEST_LEN,
        }
    }

    /// Returns `true` if the algorithm is cryptographic.
    #[must_use]
    pub const fn is_cryptographic(&self) -> bool {
        matches!(self, Self::Md4 | Self::Md5)
    }

    /// Parses an algorithm from its name (case-insensitive).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "md4" => Some(Self::Md4),
            "md5" => Some(Self::Md5),
            "xxh64" | "xxhash64" => Some(Self::Xxh64),
            _ => None,
        }
    }

    /// Returns all supported algorithms.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Md4, Self::Md5, Self::Xxh64]
    }
}

impl fmt::Display for StrongAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Computes seeded block digests for a fixed algorithm.
///
/// This is the only place seed mixing happens: when a seed is configured,
/// every digest covers `seed ∥ block` or `block ∥ seed` depending on the
/// seed's [`SeedOrder`].
///
/// # Examples
///
/// ```
/// use checksums::strong::{ChecksumSeed, StrongAlgorithm, StrongHasher};
///
/// let plain = StrongHasher::new(StrongAlgorithm::Md5);
/// let seeded = StrongHasher::new(StrongAlgorithm::Md5)
///     .with_seed(ChecksumSeed::prefix(*b"salt"));
/// assert_ne!(plain.compute(b"block"), seeded.compute(b"block"));
/// ```
#[derive(Clone, Debug)]
pub struct StrongHasher {
    algorithm: StrongAlgorithm,
    seed: Option<ChecksumSeed>,
}

impl StrongHasher {
    /// Creates an unseeded hasher for `algorithm`.
    #[must_use]
    pub const fn new(algorithm: StrongAlgorithm) -> Self {
        Self {
            algorithm,
            seed: None,
        }
    }

    /// Configures the seed mixed into every digest.
    #[must_use]
    pub fn with_seed(mut self, seed: ChecksumSeed) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Returns the algorithm this hasher computes.
    #[must_use]
    pub const fn algorithm(&self) -> StrongAlgorithm {
        self.algorithm
    }

    /// Returns the configured seed, if any.
    #[must_use]
    pub fn seed(&self) -> Option<&ChecksumSeed> {
        self.seed.as_ref()
    }

    /// Returns the untruncated digest length of this hasher.
    #[must_use]
    pub const fn digest_len(&self) -> usize {
        self.algorithm.digest_len()
    }

    /// Computes the seeded digest of `block`.
    #[must_use]
    pub fn compute(&self, block: &[u8]) -> BlockDigest {
        match self.algorithm {
            StrongAlgorithm::Md4 => self.compute_with::<Md4>(block),
            StrongAlgorithm::Md5 => self.compute_with::<Md5>(block),
            StrongAlgorithm::Xxh64 => self.compute_with::<Xxh64>(block),
        }
    }

    fn compute_with<D: StrongDigest>(&self, block: &[u8]) -> BlockDigest {
        let mut hasher = D::new();
        match &self.seed {
            Some(seed) if seed.order() == SeedOrder::Prefix => {
                hasher.update(seed.bytes());
                hasher.update(block);
            }
            Some(seed) => {
                hasher.update(block);
                hasher.update(seed.bytes());
            }
            None => hasher.update(block),
        }
        BlockDigest::new(hasher.finalize().as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_digest_truncation() {
        let digest = BlockDigest::new(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let truncated = digest.truncated(4);
        assert_eq!(truncated.as_bytes(), &[1, 2, 3, 4]);
        assert_eq!(digest.truncated(16), digest);
    }

    #[test]
    fn block_digest_equality_includes_length() {
        let long = BlockDigest::new(&[1, 2, 3, 0]);
        let short = BlockDigest::new(&[1, 2, 3]);
        assert_ne!(long, short);
        assert_eq!(short, long.truncated(3));
    }

    #[test]
    fn block_digest_display_is_hex() {
        let digest = BlockDigest::new(&[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(format!("{digest}"), "deadbeef");
    }

    #[test]
    fn algorithm_metadata() {
        assert_eq!(StrongAlgorithm::Md4.digest_len(), 16);
        assert_eq!(StrongAlgorithm::Md5.digest_len(), 16);
        assert_eq!(StrongAlgorithm::Xxh64.digest_len(), 8);
        assert!(StrongAlgorithm::Md5.is_cryptographic());
        assert!(!StrongAlgorithm::Xxh64.is_cryptographic());
    }

    #[test]
    fn algorithm_from_name() {
        assert_eq!(StrongAlgorithm::from_name("MD5"), Some(StrongAlgorithm::Md5));
        assert_eq!(
            StrongAlgorithm::from_name("xxhash64"),
            Some(StrongAlgorithm::Xxh64)
        );
        assert_eq!(StrongAlgorithm::from_name("sha256"), None);
    }

    #[test]
    fn hasher_matches_plain_digest_without_seed() {
        let hasher = StrongHasher::new(StrongAlgorithm::Md5);
        assert_eq!(
            hasher.compute(b"unseeded").as_bytes(),
            Md5::digest(b"unseeded").as_ref()
        );
    }

    #[test]
    fn seed_prefix_equals_manual_concatenation() {
        let hasher =
            StrongHasher::new(StrongAlgorithm::Md5).with_seed(ChecksumSeed::prefix(*b"seed"));
        assert_eq!(
            hasher.compute(b"block").as_bytes(),
            Md5::digest(b"seedblock").as_ref()
        );
    }

    #[test]
    fn seed_suffix_equals_manual_concatenation() {
        let hasher =
            StrongHasher::new(StrongAlgorithm::Md5).with_seed(ChecksumSeed::suffix(*b"seed"));
        assert_eq!(
            hasher.compute(b"block").as_bytes(),
            Md5::digest(b"blockseed").as_ref()
        );
    }

    #[test]
    fn seed_orders_produce_distinct_digests() {
        for &algorithm in StrongAlgorithm::all() {
            let prefix =
                StrongHasher::new(algorithm).with_seed(ChecksumSeed::prefix(*b"s"));
            let suffix =
                StrongHasher::new(algorithm).with_seed(ChecksumSeed::suffix(*b"s"));
            assert_ne!(
                prefix.compute(b"asymmetric"),
                suffix.compute(b"asymmetric"),
                "{algorithm}"
            );
        }
    }

    #[test]
    fn every_algorithm_produces_declared_length() {
        for &algorithm in StrongAlgorithm::all() {
            let hasher = StrongHasher::new(algorithm);
            assert_eq!(hasher.compute(b"sized").len(), algorithm.digest_len());
        }
    }
}
