//! The streaming match-emission loop.

use std::io::{self, Read};

use checksums::{RollingChecksum, StrongHasher};
use signature::{ChecksumPair, SyncConfig};

use crate::delta::{Delta, DeltaScript, DeltaSink, MatchError, SinkFailures};
use crate::index::SignatureIndex;

/// Streaming block matcher.
///
/// Feed target bytes with [`update`](Self::update) and complete the stream
/// with [`finish`](Self::finish); deltas are pushed synchronously into the
/// supplied sinks. The matcher holds at most
/// [`chunk_size`](SyncConfig::chunk_size) bytes of unmatched target data: a
/// window buffer whose trailing `block_length` bytes are tracked by a rolling
/// checksum that probes the index at every offset.
///
/// A matcher is single-owner state; independent pipelines need independent
/// matchers. After `finish` the matcher is reset and can process a new
/// target.
///
/// # Examples
///
/// ```
/// use matching::{DeltaScript, Matcher, SignatureIndex};
/// use signature::{SyncConfig, generate_signature};
///
/// let config = SyncConfig::builder().block_length(4).build().unwrap();
/// let basis = b"abcdefgh";
/// let index = SignatureIndex::from_signature(&generate_signature(basis, &config), &config);
///
/// let mut script = DeltaScript::new();
/// let mut matcher = Matcher::new(&index, &config);
/// let mut sinks: [&mut dyn matching::DeltaSink; 1] = [&mut script];
/// matcher.update(b"XXabcdef", &mut sinks).unwrap();
/// matcher.finish(&mut sinks).unwrap();
///
/// assert_eq!(script.total_bytes(), 8);
/// assert_eq!(script.copy_bytes(), 4);
/// ```
#[derive(Debug)]
pub struct Matcher<'idx> {
    index: &'idx SignatureIndex,
    rolling: RollingChecksum,
    hasher: StrongHasher,
    buffer: Vec<u8>,
    block_length: usize,
    chunk_size: usize,
    strong_sum_length: usize,
    count: u64,
}

impl<'idx> Matcher<'idx> {
    /// Creates a matcher probing `index` with the tunables in `config`.
    ///
    /// The checksum-affecting fields of `config` must match those used when
    /// the indexed signature was generated.
    #[must_use]
    pub fn new(index: &'idx SignatureIndex, config: &SyncConfig) -> Self {
        Self {
            index,
            rolling: config.rolling(),
            hasher: config.strong_hasher(),
            buffer: Vec::with_capacity(config.chunk_size()),
            block_length: config.block_length() as usize,
            chunk_size: config.chunk_size(),
            strong_sum_length: usize::from(config.strong_sum_length()),
            count: 0,
        }
    }

    /// Total target bytes consumed since construction or the last `finish`.
    #[must_use]
    pub const fn bytes_consumed(&self) -> u64 {
        self.count
    }

    /// Feeds a chunk of target bytes, emitting deltas as matches resolve.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Sink`] when any sink fails; every sink still
    /// observes the emission that failed.
    pub fn update(
        &mut self,
        chunk: &[u8],
        sinks: &mut [&mut dyn DeltaSink],
    ) -> Result<(), MatchError> {
        for &byte in chunk {
            self.push_byte(byte, sinks)?;
        }
        Ok(())
    }

    /// Completes the target stream.
    ///
    /// Attempts one final match with the last `min(held, block_length)`
    /// buffered bytes, flushes the residue as a literal otherwise, and resets
    /// the matcher for a new target.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Sink`] when any sink fails.
    pub fn finish(&mut self, sinks: &mut [&mut dyn DeltaSink]) -> Result<(), MatchError> {
        let held = self.buffer.len();
        if held > 0 {
            let tail = held.min(self.block_length);
            self.rolling.check(&self.buffer[held - tail..]);
            let weak = self.rolling.value();

            let location = if self.index.contains_weak(weak) {
                let strong = self
                    .hasher
                    .compute(&self.buffer[held - tail..])
                    .truncated(self.strong_sum_length);
                self.index.lookup(&ChecksumPair::new(weak, strong), tail)
            } else {
                None
            };

            if let Some(location) = location {
                if held > tail {
                    let literal = Delta::Literal {
                        data: self.buffer[..held - tail].to_vec(),
                        write_offset: self.count - held as u64,
                    };
                    emit_to(&literal, sinks)?;
                }
                let copy = Delta::Copy {
                    read_offset: location.offset,
                    write_offset: self.count - tail as u64,
                    length: location.length,
                };
                emit_to(&copy, sinks)?;
            } else {
                let literal = Delta::Literal {
                    data: self.buffer.clone(),
                    write_offset: self.count - held as u64,
                };
                emit_to(&literal, sinks)?;
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(bytes = self.count, "matching finished");

        self.buffer.clear();
        self.rolling.reset();
        self.count = 0;
        Ok(())
    }

    /// The per-byte step of the match loop.
    fn push_byte(&mut self, byte: u8, sinks: &mut [&mut dyn DeltaSink]) -> Result<(), MatchError> {
        self.buffer.push(byte);
        self.count += 1;

        let held = self.buffer.len();
        let block_length = self.block_length;
        if held < block_length {
            return Ok(());
        }

        if held == block_length {
            self.rolling.check(&self.buffer);
        } else {
            self.rolling.roll(byte)?;
        }

        let weak = self.rolling.value();
        if self.index.contains_weak(weak) {
            let window = &self.buffer[held - block_length..];
            let strong = self.hasher.compute(window).truncated(self.strong_sum_length);
            if let Some(location) = self
                .index
                .lookup(&ChecksumPair::new(weak, strong), block_length)
            {
                #[cfg(feature = "tracing")]
                tracing::trace!(
                    read_offset = location.offset,
                    write_offset = self.count - block_length as u64,
                    "block match"
                );

                if held > block_length {
                    let literal = Delta::Literal {
                        data: self.buffer[..held - block_length].to_vec(),
                        write_offset: self.count - held as u64,
                    };
                    emit_to(&literal, sinks)?;
                }
                let copy = Delta::Copy {
                    read_offset: location.offset,
                    write_offset: self.count - block_length as u64,
                    length: location.length,
                };
                emit_to(&copy, sinks)?;

                self.buffer.clear();
                self.rolling.reset();
                return Ok(());
            }
        }

        if held == self.chunk_size {
            // The buffer is full of unmatched bytes. Flush all but the
            // trailing block_length - 1 bytes, which the next incoming byte
            // may still complete into a match.
            let keep = block_length - 1;
            let spill = self.chunk_size - keep;
            let literal = Delta::Literal {
                data: self.buffer[..spill].to_vec(),
                write_offset: self.count - held as u64,
            };
            emit_to(&literal, sinks)?;

            self.buffer.copy_within(spill.., 0);
            self.buffer.truncate(keep);
            self.rolling.reset();
        }

        Ok(())
    }
}

fn emit_to(delta: &Delta, sinks: &mut [&mut dyn DeltaSink]) -> Result<(), MatchError> {
    let mut failures = Vec::new();
    for sink in sinks.iter_mut() {
        if let Err(failure) = sink.handle_delta(delta) {
            failures.push(failure);
        }
    }
    if failures.is_empty() {
        Ok(())
    } else {
        Err(MatchError::Sink(SinkFailures::new(failures)))
    }
}

/// Generates the complete delta for an in-memory target.
///
/// # Errors
///
/// Returns [`MatchError::Sink`] when a sink fails; collecting into the
/// returned [`DeltaScript`] itself cannot fail.
pub fn generate_delta(
    target: &[u8],
    index: &SignatureIndex,
    config: &SyncConfig,
) -> Result<DeltaScript, MatchError> {
    let mut script = DeltaScript::new();
    let mut matcher = Matcher::new(index, config);
    let mut sinks: [&mut dyn DeltaSink; 1] = [&mut script];
    matcher.update(target, &mut sinks)?;
    matcher.finish(&mut sinks)?;
    Ok(script)
}

/// Generates the complete delta for a target read from `reader`.
///
/// # Errors
///
/// Propagates I/O errors from the reader (other than
/// [`io::ErrorKind::Interrupted`], which is retried) and sink failures.
pub fn generate_delta_from_reader<R: Read>(
    mut reader: R,
    index: &SignatureIndex,
    config: &SyncConfig,
) -> Result<DeltaScript, MatchError> {
    let mut script = DeltaScript::new();
    let mut matcher = Matcher::new(index, config);
    let mut buffer = vec![0u8; config.chunk_size()];

    let mut sinks: [&mut dyn DeltaSink; 1] = [&mut script];
    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => matcher.update(&buffer[..n], &mut sinks)?,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }

    matcher.finish(&mut sinks)?;
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;

    use signature::generate_signature;

    fn config_with(block_length: u32, chunk_size: usize) -> SyncConfig {
        SyncConfig::builder()
            .block_length(block_length)
            .chunk_size(chunk_size)
            .build()
            .expect("valid config")
    }

    /// Replays a delta against an in-memory basis, asserting the exact-tiling
    /// contract along the way.
    fn apply(basis: &[u8], deltas: &[Delta]) -> Vec<u8> {
        let mut out = Vec::new();
        for delta in deltas {
            assert_eq!(
                delta.write_offset(),
                out.len() as u64,
                "deltas must tile the target without overlap or gap"
            );
            match delta {
                Delta::Literal { data, .. } => out.extend_from_slice(data),
                Delta::Copy {
                    read_offset,
                    length,
                    ..
                } => {
                    let start = *read_offset as usize;
                    out.extend_from_slice(&basis[start..start + *length as usize]);
                }
            }
        }
        out
    }

    fn round_trip(basis: &[u8], target: &[u8], config: &SyncConfig) -> DeltaScript {
        let index = SignatureIndex::from_signature(&generate_signature(basis, config), config);
        let script = generate_delta(target, &index, config).expect("delta generation succeeds");
        assert_eq!(apply(basis, script.deltas()), target);
        assert_eq!(script.total_bytes(), target.len() as u64);
        script
    }

    #[test]
    fn identical_input_is_all_copies() {
        let config = config_with(8, 64);
        let basis: Vec<u8> = (0u16..64).map(|i| (i % 251) as u8).collect();
        let script = round_trip(&basis, &basis, &config);

        assert_eq!(script.literal_bytes(), 0);
        assert_eq!(script.len(), 8);
    }

    #[test]
    fn disjoint_input_is_one_literal() {
        let config = config_with(8, 64);
        let basis = vec![0u8; 64];
        let target: Vec<u8> = (1u8..=32).collect();
        let script = round_trip(&basis, &target, &config);

        assert_eq!(script.copy_bytes(), 0);
        assert_eq!(script.len(), 1);
    }

    #[test]
    fn literal_precedes_copy_for_prefixed_match() {
        let config = config_with(8, 64);
        let basis: Vec<u8> = (0u16..32).map(|i| (i % 251) as u8).collect();

        let mut target = vec![0xEE; 3];
        target.extend_from_slice(&basis[..8]);
        let script = round_trip(&basis, &target, &config);

        assert_eq!(script.len(), 2);
        assert!(script.deltas()[0].is_literal());
        assert_eq!(script.deltas()[0].byte_len(), 3);
        assert!(!script.deltas()[1].is_literal());
    }

    #[test]
    fn write_offsets_are_non_decreasing() {
        let config = config_with(8, 24);
        let basis: Vec<u8> = (0u16..128).map(|i| (i % 251) as u8).collect();
        let mut target = Vec::new();
        target.extend_from_slice(&[0xAA; 30]);
        target.extend_from_slice(&basis[16..24]);
        target.extend_from_slice(&[0xBB; 50]);
        target.extend_from_slice(&basis[64..72]);

        let script = round_trip(&basis, &target, &config);
        let offsets: Vec<u64> = script.deltas().iter().map(Delta::write_offset).collect();
        let mut sorted = offsets.clone();
        sorted.sort_unstable();
        assert_eq!(offsets, sorted);
    }

    #[test]
    fn buffer_spill_keeps_trailing_partial_window() {
        // chunk_size 16, block 8: 30 unmatched bytes force a spill, and a
        // match whose window straddles the spill boundary must still be found.
        let config = config_with(8, 16);
        let basis: Vec<u8> = (100u16..180).map(|i| (i % 251) as u8).collect();

        let mut target = vec![0xEE; 13];
        target.extend_from_slice(&basis[..8]);
        target.extend_from_slice(&[0xDD; 5]);
        let script = round_trip(&basis, &target, &config);

        assert_eq!(script.copy_bytes(), 8);
        assert_eq!(script.literal_bytes(), 18);
    }

    #[test]
    fn short_final_basis_block_matches_short_tail() {
        let config = config_with(8, 64);
        // 20-byte basis: blocks of 8, 8, and 4.
        let basis: Vec<u8> = (0u8..20).collect();
        let script = round_trip(&basis, &basis, &config);

        assert_eq!(script.literal_bytes(), 0);
        let last = script.deltas().last().expect("non-empty script");
        assert_eq!(last.byte_len(), 4);
    }

    #[test]
    fn copy_lengths_equal_block_length_except_final() {
        let config = config_with(8, 64);
        let basis: Vec<u8> = (0u16..100).map(|i| (i % 251) as u8).collect();
        let script = round_trip(&basis, &basis, &config);

        let copies: Vec<&Delta> = script.deltas().iter().filter(|d| !d.is_literal()).collect();
        for copy in &copies[..copies.len() - 1] {
            assert_eq!(copy.byte_len(), 8);
        }
    }

    #[test]
    fn empty_target_emits_nothing() {
        let config = config_with(8, 64);
        let basis = vec![7u8; 64];
        let script = round_trip(&basis, &[], &config);
        assert!(script.is_empty());
    }

    #[test]
    fn matcher_is_reusable_after_finish() {
        let config = config_with(8, 64);
        let basis: Vec<u8> = (0u16..64).map(|i| (i % 251) as u8).collect();
        let index = SignatureIndex::from_signature(&generate_signature(&basis, &config), &config);

        let mut matcher = Matcher::new(&index, &config);
        for _ in 0..2 {
            let mut script = DeltaScript::new();
            let mut sinks: [&mut dyn DeltaSink; 1] = [&mut script];
            matcher
                .update(&basis[..16], &mut sinks)
                .expect("update succeeds");
            matcher.finish(&mut sinks).expect("finish succeeds");
            assert_eq!(script.copy_bytes(), 16);
            assert_eq!(matcher.bytes_consumed(), 0);
        }
    }

    #[test]
    fn every_sink_observes_failed_emissions() {
        let config = config_with(8, 64);
        let basis = vec![0u8; 16];
        let index = SignatureIndex::from_signature(&generate_signature(&basis, &config), &config);

        let mut observed = 0usize;
        let mut failing = crate::FnSink(|_delta: &Delta| -> Result<(), crate::SinkError> {
            Err("sink down".into())
        });
        let mut counting = crate::FnSink(|_delta: &Delta| -> Result<(), crate::SinkError> {
            observed += 1;
            Ok(())
        });

        let mut matcher = Matcher::new(&index, &config);
        let err = matcher
            .update(
                &[1u8; 20],
                &mut [&mut failing as &mut dyn DeltaSink, &mut counting],
            )
            .and_then(|()| {
                matcher.finish(&mut [&mut failing as &mut dyn DeltaSink, &mut counting])
            })
            .expect_err("failing sink must surface");

        match err {
            MatchError::Sink(failures) => assert_eq!(failures.len(), 1),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(observed, 1, "second sink still sees the emission");
    }

    #[test]
    fn reader_form_matches_in_memory_form() {
        let config = config_with(8, 64);
        let basis: Vec<u8> = (0u16..200).map(|i| (i % 251) as u8).collect();
        let mut target = basis.clone();
        target[100] = 0xFF;

        let index = SignatureIndex::from_signature(&generate_signature(&basis, &config), &config);
        let in_memory = generate_delta(&target, &index, &config).expect("in-memory");
        let from_reader =
            generate_delta_from_reader(&target[..], &index, &config).expect("reader");

        assert_eq!(in_memory.deltas(), from_reader.deltas());
    }
}
