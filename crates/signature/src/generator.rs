//! Streaming block signature generation.

use std::io::{self, Read};

use checksums::{RollingChecksum, StrongHasher};

use crate::config::SyncConfig;
use crate::types::{BlockSignature, ChecksumPair};

/// Streaming producer of [`BlockSignature`] records.
///
/// Bytes are buffered until a full block is available; each completed block
/// is handed to the caller's callback immediately, so the generator never
/// holds more than one block of input. [`finish`](Self::finish) flushes the
/// final short block (if any) and re-arms the generator for a new basis.
///
/// The emitted sequence depends only on the bytes fed, never on how they were
/// chunked.
///
/// # Examples
///
/// ```
/// use signature::{SignatureGenerator, SyncConfig};
///
/// let config = SyncConfig::builder().block_length(4).build().unwrap();
/// let mut generator = SignatureGenerator::new(&config);
///
/// let mut blocks = Vec::new();
/// generator.update(b"01234", |block| blocks.push(block));
/// generator.update(b"567", |block| blocks.push(block));
/// generator.finish(|block| blocks.push(block));
///
/// let lengths: Vec<u32> = blocks.iter().map(|b| b.length()).collect();
/// assert_eq!(lengths, [4, 4]);
/// ```
#[derive(Clone, Debug)]
pub struct SignatureGenerator {
    rolling: RollingChecksum,
    hasher: StrongHasher,
    block_length: usize,
    strong_sum_length: usize,
    buffer: Vec<u8>,
    base_offset: u64,
    offset: u64,
    seq: u32,
}

impl SignatureGenerator {
    /// Creates a generator whose first block starts at basis offset 0.
    #[must_use]
    pub fn new(config: &SyncConfig) -> Self {
        Self::with_base_offset(config, 0)
    }

    /// Creates a generator whose first block starts at `base_offset`.
    #[must_use]
    pub fn with_base_offset(config: &SyncConfig, base_offset: u64) -> Self {
        Self {
            rolling: config.rolling(),
            hasher: config.strong_hasher(),
            block_length: config.block_length() as usize,
            strong_sum_length: usize::from(config.strong_sum_length()),
            buffer: Vec::with_capacity(config.block_length() as usize),
            base_offset,
            offset: base_offset,
            seq: 0,
        }
    }

    /// Number of buffered bytes not yet covered by an emitted block.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Feeds a chunk of basis bytes, emitting one signature per full block.
    pub fn update<F>(&mut self, mut chunk: &[u8], mut emit: F)
    where
        F: FnMut(BlockSignature),
    {
        while !chunk.is_empty() {
            let wanted = self.block_length - self.buffer.len();
            let take = wanted.min(chunk.len());
            self.buffer.extend_from_slice(&chunk[..take]);
            chunk = &chunk[take..];

            if self.buffer.len() == self.block_length {
                self.emit_block(&mut emit);
            }
        }
    }

    /// Flushes the final short block (if any) and re-arms the generator.
    pub fn finish<F>(&mut self, mut emit: F)
    where
        F: FnMut(BlockSignature),
    {
        if !self.buffer.is_empty() {
            self.emit_block(&mut emit);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            blocks = self.seq,
            bytes = self.offset - self.base_offset,
            "signature generation finished"
        );

        self.offset = self.base_offset;
        self.seq = 0;
    }

    fn emit_block<F>(&mut self, emit: &mut F)
    where
        F: FnMut(BlockSignature),
    {
        self.rolling.check(&self.buffer);
        let weak = self.rolling.value();
        let strong = self
            .hasher
            .compute(&self.buffer)
            .truncated(self.strong_sum_length);

        let block = BlockSignature::new(
            ChecksumPair::new(weak, strong),
            self.offset,
            self.buffer.len() as u32,
            self.seq,
        );

        self.offset += self.buffer.len() as u64;
        self.seq += 1;
        self.buffer.clear();
        emit(block);
    }
}

/// Generates the complete signature of an in-memory basis.
#[must_use]
pub fn generate_signature(basis: &[u8], config: &SyncConfig) -> Vec<BlockSignature> {
    let mut blocks = Vec::with_capacity(basis.len() / config.block_length() as usize + 1);
    let mut generator = SignatureGenerator::new(config);
    generator.update(basis, |block| blocks.push(block));
    generator.finish(|block| blocks.push(block));
    blocks
}

/// Generates the complete signature of a basis read from `reader`.
///
/// Reads through an internal buffer and retries interrupted reads.
///
/// # Errors
///
/// Propagates any I/O error other than [`io::ErrorKind::Interrupted`].
pub fn signature_from_reader<R: Read>(
    mut reader: R,
    config: &SyncConfig,
) -> io::Result<Vec<BlockSignature>> {
    let mut blocks = Vec::new();
    let mut generator = SignatureGenerator::new(config);
    let mut buffer = vec![0u8; config.chunk_size()];

    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => generator.update(&buffer[..n], |block| blocks.push(block)),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }

    generator.finish(|block| blocks.push(block));
    Ok(blocks)
}
