//! Immutable pipeline configuration and its validating builder.

use checksums::{ChecksumSeed, RollingChecksum, StrongAlgorithm, StrongHasher};
use thiserror::Error;

/// Default nominal block size in bytes.
pub const DEFAULT_BLOCK_LENGTH: u32 = 700;

/// Default matcher window/buffer size in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;

/// Errors raised when a configuration fails validation.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ConfigError {
    /// The block length was zero.
    #[error("block length must be positive")]
    ZeroBlockLength,
    /// The strong sum length was zero.
    #[error("strong sum length must be positive")]
    ZeroStrongSumLength,
    /// The strong sum length exceeds the digest size of the chosen algorithm.
    #[error("strong sum length {requested} exceeds the {algorithm} digest size {available}")]
    StrongSumTooLong {
        /// Requested truncation length in bytes.
        requested: u8,
        /// The configured strong digest algorithm.
        algorithm: StrongAlgorithm,
        /// Digest size of that algorithm in bytes.
        available: usize,
    },
    /// The matcher chunk size is smaller than the block length.
    #[error("chunk size {chunk_size} is smaller than the block length {block_length}")]
    ChunkSmallerThanBlock {
        /// Configured chunk size in bytes.
        chunk_size: usize,
        /// Configured block length in bytes.
        block_length: u32,
    },
}

/// Immutable tunables shared by generator, matcher, and rebuilder.
///
/// Built once via [`SyncConfig::builder`] and then shared read-only; there is
/// no way to mutate a constructed configuration. Both sides of a transfer
/// must use identical values for the checksum-affecting fields (block length,
/// strong algorithm and truncation, seed, and rolling bias).
///
/// # Examples
///
/// ```
/// use checksums::StrongAlgorithm;
/// use signature::SyncConfig;
///
/// let config = SyncConfig::builder()
///     .block_length(2048)
///     .strong_algorithm(StrongAlgorithm::Md4)
///     .strong_sum_length(8)
///     .build()
///     .unwrap();
/// assert_eq!(config.block_length(), 2048);
/// assert_eq!(config.strong_sum_length(), 8);
/// ```
#[derive(Clone, Debug)]
pub struct SyncConfig {
    block_length: u32,
    strong_sum_length: u8,
    chunk_size: usize,
    strong: StrongAlgorithm,
    seed: Option<ChecksumSeed>,
    char_offset: u8,
}

impl SyncConfig {
    /// Returns a builder primed with the default values.
    #[must_use]
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder::new()
    }

    /// Nominal block size in bytes; only the final basis block may be shorter.
    #[must_use]
    pub const fn block_length(&self) -> u32 {
        self.block_length
    }

    /// Number of leading strong digest bytes retained per block.
    #[must_use]
    pub const fn strong_sum_length(&self) -> u8 {
        self.strong_sum_length
    }

    /// Matcher window/buffer size in bytes; always `>= block_length`.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// The configured strong digest algorithm.
    #[must_use]
    pub const fn strong_algorithm(&self) -> StrongAlgorithm {
        self.strong
    }

    /// The seed mixed into every strong digest, if any.
    #[must_use]
    pub fn seed(&self) -> Option<&ChecksumSeed> {
        self.seed.as_ref()
    }

    /// Per-byte bias of the rolling checksum.
    #[must_use]
    pub const fn char_offset(&self) -> u8 {
        self.char_offset
    }

    /// Creates a rolling checksum configured with this record's bias.
    #[must_use]
    pub fn rolling(&self) -> RollingChecksum {
        RollingChecksum::with_char_offset(self.char_offset)
    }

    /// Creates a strong hasher configured with this record's algorithm and seed.
    #[must_use]
    pub fn strong_hasher(&self) -> StrongHasher {
        let hasher = StrongHasher::new(self.strong);
        match &self.seed {
            Some(seed) => hasher.with_seed(seed.clone()),
            None => hasher,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        // The builder defaults are valid by construction.
        Self {
            block_length: DEFAULT_BLOCK_LENGTH,
            strong_sum_length: StrongAlgorithm::Md5.digest_len() as u8,
            chunk_size: DEFAULT_CHUNK_SIZE,
            strong: StrongAlgorithm::Md5,
            seed: None,
            char_offset: 0,
        }
    }
}

/// Builder for [`SyncConfig`]; all validation happens in [`build`](Self::build).
#[derive(Clone, Debug)]
pub struct SyncConfigBuilder {
    block_length: u32,
    strong_sum_length: Option<u8>,
    chunk_size: usize,
    strong: StrongAlgorithm,
    seed: Option<ChecksumSeed>,
    char_offset: u8,
}

impl SyncConfigBuilder {
    /// Creates a builder primed with the default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            block_length: DEFAULT_BLOCK_LENGTH,
            strong_sum_length: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            strong: StrongAlgorithm::Md5,
            seed: None,
            char_offset: 0,
        }
    }

    /// Sets the nominal block size in bytes.
    #[must_use]
    pub const fn block_length(mut self, block_length: u32) -> Self {
        self.block_length = block_length;
        self
    }

    /// Sets how many leading strong digest bytes to retain.
    ///
    /// Defaults to the full digest length of the configured algorithm.
    #[must_use]
    pub const fn strong_sum_length(mut self, strong_sum_length: u8) -> Self {
        self.strong_sum_length = Some(strong_sum_length);
        self
    }

    /// Sets the matcher window/buffer size in bytes.
    #[must_use]
    pub const fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Selects the strong digest algorithm.
    #[must_use]
    pub const fn strong_algorithm(mut self, algorithm: StrongAlgorithm) -> Self {
        self.strong = algorithm;
        self
    }

    /// Configures the seed mixed into every strong digest.
    #[must_use]
    pub fn seed(mut self, seed: ChecksumSeed) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the per-byte bias of the rolling checksum.
    #[must_use]
    pub const fn char_offset(mut self, char_offset: u8) -> Self {
        self.char_offset = char_offset;
        self
    }

    /// Validates the accumulated settings and produces the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the block length or strong sum length
    /// is zero, the strong sum length exceeds the digest size, or the chunk
    /// size is smaller than the block length.
    pub fn build(self) -> Result<SyncConfig, ConfigError> {
        if self.block_length == 0 {
            return Err(ConfigError::ZeroBlockLength);
        }

        let available = self.strong.digest_len();
        let strong_sum_length = self
            .strong_sum_length
            .unwrap_or(available as u8);
        if strong_sum_length == 0 {
            return Err(ConfigError::ZeroStrongSumLength);
        }
        if usize::from(strong_sum_length) > available {
            return Err(ConfigError::StrongSumTooLong {
                requested: strong_sum_length,
                algorithm: self.strong,
                available,
            });
        }

        if self.chunk_size < self.block_length as usize {
            return Err(ConfigError::ChunkSmallerThanBlock {
                chunk_size: self.chunk_size,
                block_length: self.block_length,
            });
        }

        Ok(SyncConfig {
            block_length: self.block_length,
            strong_sum_length,
            chunk_size: self.chunk_size,
            strong: self.strong,
            seed: self.seed,
            char_offset: self.char_offset,
        })
    }
}

impl Default for SyncConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
