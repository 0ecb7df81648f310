//! Delta instructions, their ordered collection, and the sink interface.

use std::error::Error;
use std::fmt;

use checksums::RollingError;
use thiserror::Error as ThisError;

/// Boxed error type sinks may return from [`DeltaSink::handle_delta`].
pub type SinkError = Box<dyn Error + Send + Sync + 'static>;

/// One reconstruction instruction.
///
/// Both variants expose their destination position in the target; a matcher's
/// output tiles the target exactly, with neither overlap nor gap, in
/// non-decreasing `write_offset` order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Delta {
    /// Inject `data` at `write_offset` in the target.
    Literal {
        /// The bytes to inject.
        data: Vec<u8>,
        /// Destination position in the target.
        write_offset: u64,
    },
    /// Copy `length` bytes from the basis at `read_offset` to the target at
    /// `write_offset`.
    Copy {
        /// Source position in the basis.
        read_offset: u64,
        /// Destination position in the target.
        write_offset: u64,
        /// Number of bytes to copy.
        length: u32,
    },
}

impl Delta {
    /// Destination position of this instruction in the target.
    #[must_use]
    pub const fn write_offset(&self) -> u64 {
        match self {
            Self::Literal { write_offset, .. } | Self::Copy { write_offset, .. } => *write_offset,
        }
    }

    /// Number of target bytes this instruction produces.
    #[must_use]
    pub fn byte_len(&self) -> u64 {
        match self {
            Self::Literal { data, .. } => data.len() as u64,
            Self::Copy { length, .. } => u64::from(*length),
        }
    }

    /// Destination position one past the last byte this instruction writes.
    #[must_use]
    pub fn end_offset(&self) -> u64 {
        self.write_offset() + self.byte_len()
    }

    /// Returns `true` for [`Delta::Literal`].
    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Literal { .. })
    }
}

/// An ordered delta sequence with byte accounting.
///
/// Collecting into a script is the eager alternative to streaming deltas
/// through a custom [`DeltaSink`].
#[derive(Clone, Debug, Default)]
pub struct DeltaScript {
    deltas: Vec<Delta>,
    literal_bytes: u64,
    copy_bytes: u64,
}

impl DeltaScript {
    /// Creates an empty script.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            deltas: Vec::new(),
            literal_bytes: 0,
            copy_bytes: 0,
        }
    }

    /// Appends one instruction, updating the byte accounting.
    pub fn push(&mut self, delta: Delta) {
        match &delta {
            Delta::Literal { data, .. } => self.literal_bytes += data.len() as u64,
            Delta::Copy { length, .. } => self.copy_bytes += u64::from(*length),
        }
        self.deltas.push(delta);
    }

    /// Returns the collected instructions in emission order.
    #[must_use]
    pub fn deltas(&self) -> &[Delta] {
        &self.deltas
    }

    /// Consumes the script and returns the instructions.
    #[must_use]
    pub fn into_deltas(self) -> Vec<Delta> {
        self.deltas
    }

    /// Number of collected instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    /// Returns `true` if no instructions were collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Total bytes contributed by literal instructions.
    #[must_use]
    pub const fn literal_bytes(&self) -> u64 {
        self.literal_bytes
    }

    /// Total bytes contributed by copy instructions.
    #[must_use]
    pub const fn copy_bytes(&self) -> u64 {
        self.copy_bytes
    }

    /// Total target bytes the script reconstructs.
    #[must_use]
    pub const fn total_bytes(&self) -> u64 {
        self.literal_bytes + self.copy_bytes
    }
}

/// Observer of the delta stream produced by a matcher.
///
/// Sinks are invoked synchronously inside the matcher's feed calls and see
/// deltas in non-decreasing `write_offset` order.
pub trait DeltaSink {
    /// Handles one emitted instruction.
    ///
    /// # Errors
    ///
    /// Any error is collected by the matcher into [`SinkFailures`] together
    /// with the failures of other sinks observing the same emission.
    fn handle_delta(&mut self, delta: &Delta) -> Result<(), SinkError>;
}

impl DeltaSink for DeltaScript {
    fn handle_delta(&mut self, delta: &Delta) -> Result<(), SinkError> {
        self.push(delta.clone());
        Ok(())
    }
}

/// Adapts a closure into a [`DeltaSink`].
///
/// # Examples
///
/// ```
/// use matching::{Delta, DeltaSink, FnSink, SinkError};
///
/// let mut literal_bytes = 0u64;
/// let mut sink = FnSink(|delta: &Delta| -> Result<(), SinkError> {
///     if delta.is_literal() {
///         literal_bytes += delta.byte_len();
///     }
///     Ok(())
/// });
/// sink.handle_delta(&Delta::Literal { data: vec![0; 4], write_offset: 0 }).unwrap();
/// drop(sink);
/// assert_eq!(literal_bytes, 4);
/// ```
pub struct FnSink<F>(pub F);

impl<F> DeltaSink for FnSink<F>
where
    F: FnMut(&Delta) -> Result<(), SinkError>,
{
    fn handle_delta(&mut self, delta: &Delta) -> Result<(), SinkError> {
        (self.0)(delta)
    }
}

/// All sink failures collected during a single delta emission.
///
/// Every sink observes the delta even when an earlier sink fails; the
/// failures are chained into this composite error so none is lost.
#[derive(Debug)]
pub struct SinkFailures {
    failures: Vec<SinkError>,
}

impl SinkFailures {
    pub(crate) fn new(failures: Vec<SinkError>) -> Self {
        debug_assert!(!failures.is_empty());
        Self { failures }
    }

    /// Returns the collected failures in sink order.
    #[must_use]
    pub fn failures(&self) -> &[SinkError] {
        &self.failures
    }

    /// Number of sinks that failed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Returns `true` if no failure was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for SinkFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} delta sink(s) failed", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; {failure}")?;
        }
        Ok(())
    }
}

impl Error for SinkFailures {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.failures
            .first()
            .map(|failure| failure.as_ref() as &(dyn Error + 'static))
    }
}

/// Errors surfaced by the matching pipeline.
#[derive(Debug, ThisError)]
pub enum MatchError {
    /// One or more delta sinks failed during an emission.
    #[error(transparent)]
    Sink(#[from] SinkFailures),
    /// The rolling checksum rejected an update; indicates matcher state
    /// corruption and should not occur for well-formed configurations.
    #[error(transparent)]
    Rolling(#[from] RollingError),
    /// An I/O failure while reading the match target.
    #[error("I/O failure while reading the match target")]
    Io(#[from] std::io::Error),
}
