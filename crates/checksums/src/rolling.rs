//! Weak rolling checksum used for sliding-window block matching.
//!
//! The checksum packs two 16-bit lanes into a 32-bit value: `s1` accumulates
//! the (biased) byte sum and `s2` accumulates the running prefix sums, which
//! weights older bytes by their distance from the end of the window. Both
//! lanes admit O(1) updates when the window slides by one byte, which is what
//! makes probing every target offset affordable.

use std::collections::VecDeque;

use thiserror::Error;

/// Historical per-byte bias used by some legacy signature generators.
///
/// Both sides of a transfer must agree on the bias; the default is 0.
pub const LEGACY_CHAR_OFFSET: u8 = 31;

/// Errors raised while updating the rolling checksum state.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum RollingError {
    /// The checksum window is empty, so there is no byte to slide out.
    #[error("rolling checksum requires a non-empty window")]
    EmptyWindow,
    /// The window length exceeds what the update arithmetic supports.
    #[error("rolling checksum window of {len} bytes exceeds the 32-bit limit")]
    WindowTooLarge {
        /// Number of bytes in the window when the error was raised.
        len: usize,
    },
}

/// 32-bit weak checksum with O(1) slide-by-one updates.
///
/// The checksum keeps a private copy of the bytes currently in the window, so
/// [`roll`](Self::roll) and [`trim`](Self::trim) only need the incoming side
/// of the slide. [`check`](Self::check) seeds the state from scratch; the
/// resulting value is always identical to what the incremental operations
/// produce for the same window, a property the tests exercise heavily.
///
/// # Examples
///
/// ```
/// use checksums::RollingChecksum;
///
/// let data = b"rolling checksum";
/// let mut rolling = RollingChecksum::new();
/// rolling.check(&data[..8]);
///
/// // Slide to cover data[1..9].
/// rolling.roll(data[8]).unwrap();
///
/// let mut fresh = RollingChecksum::new();
/// fresh.check(&data[1..9]);
/// assert_eq!(rolling.value(), fresh.value());
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RollingChecksum {
    s1: u32,
    s2: u32,
    window: VecDeque<u8>,
    bias: u32,
}

impl RollingChecksum {
    /// Creates a checksum with zeroed state and no per-byte bias.
    #[must_use]
    pub fn new() -> Self {
        Self::with_char_offset(0)
    }

    /// Creates a checksum that adds `offset` to every byte before summing.
    ///
    /// A non-zero bias changes every emitted value, so it must match the bias
    /// used when the basis signature was generated. See
    /// [`LEGACY_CHAR_OFFSET`].
    #[must_use]
    pub fn with_char_offset(offset: u8) -> Self {
        Self {
            s1: 0,
            s2: 0,
            window: VecDeque::new(),
            bias: u32::from(offset),
        }
    }

    /// Returns the per-byte bias this checksum was configured with.
    #[must_use]
    pub fn char_offset(&self) -> u8 {
        self.bias as u8
    }

    /// Resets the checksum to its initial empty state.
    pub fn reset(&mut self) {
        self.s1 = 0;
        self.s2 = 0;
        self.window.clear();
    }

    /// Returns the number of bytes currently in the window.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Returns `true` if the window holds no bytes.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Resets the state and computes the checksum of `block` from scratch.
    ///
    /// The block bytes are retained as the new window, priming the state for
    /// subsequent [`roll`](Self::roll) and [`trim`](Self::trim) calls.
    pub fn check(&mut self, block: &[u8]) {
        self.reset();
        self.update(block);
    }

    /// Accumulates `chunk` into the current state, growing the window.
    ///
    /// Splitting a block across several `update` calls yields the same state
    /// as a single call over the concatenation.
    pub fn update(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }

        let mut s1 = self.s1;
        let mut s2 = self.s2;
        let bias = self.bias;

        let mut iter = chunk.chunks_exact(4);
        for block in &mut iter {
            s1 = s1.wrapping_add(u32::from(block[0])).wrapping_add(bias);
            s2 = s2.wrapping_add(s1);

            s1 = s1.wrapping_add(u32::from(block[1])).wrapping_add(bias);
            s2 = s2.wrapping_add(s1);

            s1 = s1.wrapping_add(u32::from(block[2])).wrapping_add(bias);
            s2 = s2.wrapping_add(s1);

            s1 = s1.wrapping_add(u32::from(block[3])).wrapping_add(bias);
            s2 = s2.wrapping_add(s1);
        }

        for &byte in iter.remainder() {
            s1 = s1.wrapping_add(u32::from(byte)).wrapping_add(bias);
            s2 = s2.wrapping_add(s1);
        }

        self.s1 = s1 & 0xffff;
        self.s2 = s2 & 0xffff;
        self.window.extend(chunk.iter().copied());
    }

    /// Slides the window forward by one byte.
    ///
    /// The oldest byte leaves the window, `incoming` enters it, and both
    /// lanes are updated in O(1). The window length is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`RollingError::EmptyWindow`] if no block has been checked yet
    /// and [`RollingError::WindowTooLarge`] if the window length cannot be
    /// represented in 32 bits.
    #[inline]
    pub fn roll(&mut self, incoming: u8) -> Result<(), RollingError> {
        let window_len = self.window_len_u32()?;
        let Some(outgoing) = self.window.pop_front() else {
            return Err(RollingError::EmptyWindow);
        };

        let out = u32::from(outgoing).wrapping_add(self.bias);
        let inn = u32::from(incoming).wrapping_add(self.bias);

        let new_s1 = self.s1.wrapping_sub(out).wrapping_add(inn) & 0xffff;
        let new_s2 = self
            .s2
            .wrapping_sub(window_len.wrapping_mul(out))
            .wrapping_add(new_s1)
            & 0xffff;

        self.s1 = new_s1;
        self.s2 = new_s2;
        self.window.push_back(incoming);
        Ok(())
    }

    /// Slides the window forward over every byte of `incoming` in turn.
    ///
    /// Equivalent to calling [`roll`](Self::roll) once per byte. Passing an
    /// empty slice leaves the state unchanged.
    ///
    /// # Errors
    ///
    /// Propagates the first error from the underlying [`roll`](Self::roll).
    pub fn roll_many(&mut self, incoming: &[u8]) -> Result<(), RollingError> {
        for &byte in incoming {
            self.roll(byte)?;
        }
        Ok(())
    }

    /// Drops the oldest byte without appending a replacement.
    ///
    /// The window shrinks by one; the lanes are adjusted so the state equals
    /// a from-scratch computation over the shortened window.
    ///
    /// # Errors
    ///
    /// Returns [`RollingError::EmptyWindow`] if the window holds no bytes and
    /// [`RollingError::WindowTooLarge`] if the window length cannot be
    /// represented in 32 bits.
    pub fn trim(&mut self) -> Result<(), RollingError> {
        let window_len = self.window_len_u32()?;
        let Some(outgoing) = self.window.pop_front() else {
            return Err(RollingError::EmptyWindow);
        };

        let out = u32::from(outgoing).wrapping_add(self.bias);

        self.s1 = self.s1.wrapping_sub(out) & 0xffff;
        self.s2 = self.s2.wrapping_sub(window_len.wrapping_mul(out)) & 0xffff;
        Ok(())
    }

    /// Returns the checksum in its packed 32-bit representation.
    ///
    /// The low 16 bits hold the byte-sum lane, the high 16 bits the
    /// prefix-sum lane.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> u32 {
        (self.s2 << 16) | self.s1
    }

    /// Returns the current window length as `u32` while validating invariants.
    #[inline]
    fn window_len_u32(&self) -> Result<u32, RollingError> {
        if self.window.is_empty() {
            return Err(RollingError::EmptyWindow);
        }
        u32::try_from(self.window.len()).map_err(|_| RollingError::WindowTooLarge {
            len: self.window.len(),
        })
    }
}
