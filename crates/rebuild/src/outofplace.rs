//! Out-of-place reconstruction: the basis is read-only and the target is
//! written elsewhere.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use matching::Delta;

use crate::error::RebuildError;

/// Streams the reconstructed target into `out`.
///
/// Deltas are applied in `write_offset` order; an unsorted slice is reordered
/// (stably) first, so callers replaying a recorded delta need not care how it
/// was stored. Copy bounds are validated against the basis length before any
/// byte is read.
///
/// Returns the number of target bytes written.
///
/// # Errors
///
/// [`RebuildError::BasisMissing`] when a copy is encountered without a basis,
/// [`RebuildError::BasisTooShort`] when a copy reads past the basis end, and
/// propagated I/O failures.
pub fn rebuild_to_writer<R, W>(
    mut basis: Option<&mut R>,
    deltas: &[Delta],
    out: &mut W,
) -> Result<u64, RebuildError>
where
    R: Read + Seek,
    W: Write + ?Sized,
{
    let order = write_order(deltas);
    let mut basis_len: Option<u64> = None;
    let mut written = 0u64;

    for &i in &order {
        match &deltas[i] {
            Delta::Literal { data, .. } => {
                out.write_all(data)?;
                written += data.len() as u64;
            }
            Delta::Copy {
                read_offset,
                length,
                ..
            } => {
                let reader = match basis.as_deref_mut() {
                    Some(reader) => reader,
                    None => return Err(RebuildError::BasisMissing),
                };
                let available = match basis_len {
                    Some(len) => len,
                    None => {
                        let len = reader.seek(SeekFrom::End(0))?;
                        basis_len = Some(len);
                        len
                    }
                };
                check_copy_bounds(*read_offset, u64::from(*length), available)?;

                reader.seek(SeekFrom::Start(*read_offset))?;
                let mut limited = reader.take(u64::from(*length));
                let copied = std::io::copy(&mut limited, out)?;
                written += copied;
            }
        }
    }

    Ok(written)
}

/// Reconstructs the target through a seekable writer.
///
/// Each delta is written at its own `write_offset`, so the input order is
/// irrelevant. Returns the target length, i.e. the greatest end offset
/// written.
///
/// # Errors
///
/// Same failure modes as [`rebuild_to_writer`].
pub fn rebuild_random_access<R, W>(
    mut basis: Option<&mut R>,
    deltas: &[Delta],
    out: &mut W,
) -> Result<u64, RebuildError>
where
    R: Read + Seek,
    W: Write + Seek + ?Sized,
{
    let mut basis_len: Option<u64> = None;
    let mut target_len = 0u64;

    for delta in deltas {
        out.seek(SeekFrom::Start(delta.write_offset()))?;
        match delta {
            Delta::Literal { data, .. } => out.write_all(data)?,
            Delta::Copy {
                read_offset,
                length,
                ..
            } => {
                let reader = match basis.as_deref_mut() {
                    Some(reader) => reader,
                    None => return Err(RebuildError::BasisMissing),
                };
                let available = match basis_len {
                    Some(len) => len,
                    None => {
                        let len = reader.seek(SeekFrom::End(0))?;
                        basis_len = Some(len);
                        len
                    }
                };
                check_copy_bounds(*read_offset, u64::from(*length), available)?;

                reader.seek(SeekFrom::Start(*read_offset))?;
                let mut limited = reader.take(u64::from(*length));
                std::io::copy(&mut limited, out)?;
            }
        }
        target_len = target_len.max(delta.end_offset());
    }

    Ok(target_len)
}

/// Reconstructs `dest_path` from `basis_path` and a delta.
///
/// The destination is created (or truncated) and sized to exactly the
/// greatest delta end offset. A missing basis file is treated as "no basis":
/// literal-only deltas still apply, copies fail with
/// [`RebuildError::BasisMissing`].
///
/// # Errors
///
/// [`RebuildError::SameFile`] when both paths resolve to the same file, plus
/// the failure modes of [`rebuild_random_access`].
pub fn rebuild_file(
    basis_path: &Path,
    deltas: &[Delta],
    dest_path: &Path,
) -> Result<(), RebuildError> {
    if paths_alias(basis_path, dest_path) {
        return Err(RebuildError::SameFile {
            path: dest_path.to_path_buf(),
        });
    }

    let mut basis = match File::open(basis_path) {
        Ok(file) => Some(file),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => return Err(err.into()),
    };

    let mut dest = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(dest_path)?;

    let target_len = rebuild_random_access(basis.as_mut(), deltas, &mut dest)?;
    dest.set_len(target_len)?;
    Ok(())
}

/// Reports whether both paths refer to the same existing file.
fn paths_alias(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        // A path that cannot be resolved cannot alias an existing file.
        _ => false,
    }
}

pub(crate) fn check_copy_bounds(
    offset: u64,
    length: u64,
    basis_len: u64,
) -> Result<(), RebuildError> {
    if offset + length > basis_len {
        return Err(RebuildError::BasisTooShort {
            offset,
            length,
            basis_len,
        });
    }
    Ok(())
}

/// Returns delta indices in `write_offset` order, avoiding the sort when the
/// input is already ordered.
fn write_order(deltas: &[Delta]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..deltas.len()).collect();
    let sorted = deltas
        .windows(2)
        .all(|pair| pair[0].write_offset() <= pair[1].write_offset());
    if !sorted {
        order.sort_by_key(|&i| deltas[i].write_offset());
    }
    order
}
