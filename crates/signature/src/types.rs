//! Checksum records shared between signature generation and matching.

use std::hash::{Hash, Hasher};

use checksums::BlockDigest;

/// Weak and strong checksum of one block, without location information.
///
/// Equality is componentwise, but hashing covers only the weak half: pairs
/// are bucketed by their cheap 32-bit checksum and disambiguated by the
/// strong digest afterwards, mirroring the two-stage lookup the matcher
/// performs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ChecksumPair {
    weak: u32,
    strong: BlockDigest,
}

impl ChecksumPair {
    /// Creates a pair from its components.
    #[must_use]
    pub const fn new(weak: u32, strong: BlockDigest) -> Self {
        Self { weak, strong }
    }

    /// Returns the 32-bit weak rolling checksum.
    #[must_use]
    pub const fn weak(&self) -> u32 {
        self.weak
    }

    /// Returns the truncated strong digest.
    #[must_use]
    pub const fn strong(&self) -> BlockDigest {
        self.strong
    }
}

impl Hash for ChecksumPair {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.weak.hash(state);
    }
}

/// A [`ChecksumPair`] anchored to its position in the basis.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BlockSignature {
    pair: ChecksumPair,
    offset: u64,
    length: u32,
    seq: u32,
}

impl BlockSignature {
    /// Creates a block signature from its components.
    #[must_use]
    pub const fn new(pair: ChecksumPair, offset: u64, length: u32, seq: u32) -> Self {
        Self {
            pair,
            offset,
            length,
            seq,
        }
    }

    /// Returns the checksum pair for this block.
    #[must_use]
    pub const fn pair(&self) -> ChecksumPair {
        self.pair
    }

    /// Returns the 32-bit weak rolling checksum of the block.
    #[must_use]
    pub const fn weak(&self) -> u32 {
        self.pair.weak()
    }

    /// Returns the truncated strong digest of the block.
    #[must_use]
    pub const fn strong(&self) -> BlockDigest {
        self.pair.strong()
    }

    /// Byte offset in the basis where this block begins.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of basis bytes this block covers.
    #[must_use]
    pub const fn length(&self) -> u32 {
        self.length
    }

    /// Zero-based sequence number of this block.
    #[must_use]
    pub const fn seq(&self) -> u32 {
        self.seq
    }

    /// Byte offset one past the end of this block.
    #[must_use]
    pub const fn end_offset(&self) -> u64 {
        self.offset + self.length as u64
    }
}
