//! Two-key probabilistic index over a basis signature.

use rustc_hash::FxHashMap;

use checksums::BlockDigest;
use signature::{BlockSignature, ChecksumPair, SyncConfig};

/// Number of `u64` words in the low-16-bit membership filter.
const WEAK_FILTER_WORDS: usize = (1 << 16) / 64;

/// Location of one block in the basis.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BlockLocation {
    /// Byte offset in the basis where the block begins.
    pub offset: u64,
    /// Number of basis bytes the block covers.
    pub length: u32,
    /// Zero-based sequence number of the block.
    pub seq: u32,
}

impl BlockLocation {
    /// Creates a location from its components.
    #[must_use]
    pub const fn new(offset: u64, length: u32, seq: u32) -> Self {
        Self {
            offset,
            length,
            seq,
        }
    }
}

/// Index from `(weak, strong)` checksum pairs to basis block locations.
///
/// Lookups follow a three-stage discipline that keeps the expensive strong
/// digest off the hot path:
///
/// 1. a 65,536-bit filter over the low 16 bits of the weak sum answers the
///    overwhelmingly common miss case in O(1) without touching the map;
/// 2. the full 32-bit weak sum selects a bucket of candidates;
/// 3. the truncated strong digest (computed by the caller only after stage 2
///    reports candidates) confirms the match.
///
/// When several basis blocks share a pair, the last inserted location wins;
/// the matched bytes are identical either way.
#[derive(Clone, Debug)]
pub struct SignatureIndex {
    block_length: u32,
    strong_sum_length: u8,
    weak_filter: Box<[u64; WEAK_FILTER_WORDS]>,
    buckets: FxHashMap<u32, Vec<(BlockDigest, BlockLocation)>>,
    len: usize,
}

impl SignatureIndex {
    /// Creates an empty index for the given configuration.
    #[must_use]
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            block_length: config.block_length(),
            strong_sum_length: config.strong_sum_length(),
            weak_filter: Box::new([0u64; WEAK_FILTER_WORDS]),
            buckets: FxHashMap::default(),
            len: 0,
        }
    }

    /// Builds an index from a complete basis signature.
    #[must_use]
    pub fn from_signature(blocks: &[BlockSignature], config: &SyncConfig) -> Self {
        let mut index = Self::new(config);
        for block in blocks {
            index.insert(
                &block.pair(),
                BlockLocation::new(block.offset(), block.length(), block.seq()),
            );
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            blocks = blocks.len(),
            buckets = index.buckets.len(),
            "signature index built"
        );

        index
    }

    /// Inserts one checksum pair and its basis location.
    pub fn insert(&mut self, pair: &ChecksumPair, location: BlockLocation) {
        self.set_weak_filter(pair.weak());
        self.buckets
            .entry(pair.weak())
            .or_default()
            .push((pair.strong(), location));
        self.len += 1;
    }

    /// Reports whether any entry shares the full 32-bit weak sum.
    ///
    /// A `false` answer is definitive; a `true` answer still requires strong
    /// confirmation via [`lookup`](Self::lookup).
    #[must_use]
    pub fn contains_weak(&self, weak: u32) -> bool {
        self.weak_filter_hit(weak) && self.buckets.contains_key(&weak)
    }

    /// Finds the basis location matching `pair` exactly.
    ///
    /// `window_len` is the length of the probed target window; candidates
    /// whose block length differs cannot hold the same bytes and are skipped,
    /// which is what lets a short final basis block match only an equally
    /// short final target window.
    #[must_use]
    pub fn lookup(&self, pair: &ChecksumPair, window_len: usize) -> Option<BlockLocation> {
        if !self.weak_filter_hit(pair.weak()) {
            return None;
        }
        let candidates = self.buckets.get(&pair.weak())?;
        candidates
            .iter()
            .rev()
            .find(|(strong, location)| {
                location.length as usize == window_len && *strong == pair.strong()
            })
            .map(|(_, location)| *location)
    }

    /// Number of entries in the index.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the index holds no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Removes every entry, keeping the configuration.
    pub fn clear(&mut self) {
        self.weak_filter.fill(0);
        self.buckets.clear();
        self.len = 0;
    }

    /// Nominal block length of the indexed signature.
    #[must_use]
    pub const fn block_length(&self) -> u32 {
        self.block_length
    }

    /// Strong sum truncation length of the indexed signature.
    #[must_use]
    pub const fn strong_sum_length(&self) -> u8 {
        self.strong_sum_length
    }

    #[inline]
    fn set_weak_filter(&mut self, weak: u32) {
        let low = (weak & 0xffff) as usize;
        self.weak_filter[low / 64] |= 1 << (low % 64);
    }

    #[inline]
    fn weak_filter_hit(&self, weak: u32) -> bool {
        let low = (weak & 0xffff) as usize;
        self.weak_filter[low / 64] & (1 << (low % 64)) != 0
    }
}
