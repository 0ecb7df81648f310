//! In-place reconstruction against real files: overlapping copies, cyclic
//! dependencies, truncation and extension, and the fresh-file shortcut.

use std::fs;
use std::io::Cursor;

use matching::{Delta, SignatureIndex, generate_delta};
use proptest::prelude::*;
use rebuild::{RebuildError, rebuild_file_in_place};
use signature::{SyncConfig, generate_signature};
use tempfile::TempDir;

fn literal(data: &[u8], write_offset: u64) -> Delta {
    Delta::Literal {
        data: data.to_vec(),
        write_offset,
    }
}

const fn copy(read_offset: u64, write_offset: u64, length: u32) -> Delta {
    Delta::Copy {
        read_offset,
        write_offset,
        length,
    }
}

/// Writes `basis` to a file, applies the delta in place, and returns the
/// resulting contents.
fn apply_in_place(basis: &[u8], deltas: &[Delta]) -> Vec<u8> {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("dest");
    fs::write(&path, basis).expect("write basis");

    rebuild_file_in_place(&path, deltas).expect("in-place rebuild succeeds");
    fs::read(&path).expect("read result")
}

/// The same delta replayed out of place; the in-place result must agree.
fn apply_out_of_place(basis: &[u8], deltas: &[Delta]) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    rebuild::rebuild_random_access(Some(&mut Cursor::new(basis)), deltas, &mut out)
        .expect("out-of-place rebuild succeeds");
    out.into_inner()
}

/// Rotating three 700-byte blocks: every copy writes over a region another
/// copy reads, so at least one conflict edge exists and scheduling matters.
#[test]
fn rotated_blocks_rebuild_in_place() {
    let basis: Vec<u8> = (0u32..2100).map(|i| (i % 251) as u8).collect();

    // Target layout: [1400..2100], [0..700], [700..1400].
    let deltas = [
        copy(1400, 0, 700),
        copy(0, 700, 700),
        copy(700, 1400, 700),
    ];

    let mut expected = Vec::new();
    expected.extend_from_slice(&basis[1400..2100]);
    expected.extend_from_slice(&basis[0..700]);
    expected.extend_from_slice(&basis[700..1400]);

    assert_eq!(apply_in_place(&basis, &deltas), expected);
}

/// Swapping two blocks is a two-cycle in the conflict graph; one side must be
/// materialized as a literal for the other to survive.
#[test]
fn swapped_blocks_form_a_cycle() {
    let basis: Vec<u8> = (0u32..1400).map(|i| (i * 7 % 251) as u8).collect();

    let deltas = [copy(700, 0, 700), copy(0, 700, 700)];

    let mut expected = basis[700..1400].to_vec();
    expected.extend_from_slice(&basis[0..700]);

    assert_eq!(apply_in_place(&basis, &deltas), expected);
}

/// An in-place delta produced by the matcher reconstructs the target for a
/// reshuffle of the whole basis.
#[test]
fn matcher_delta_applies_in_place() {
    let config = SyncConfig::builder().build().expect("default config");
    let basis: Vec<u8> = (0u32..2100).map(|i| (i % 251) as u8).collect();

    let mut target = Vec::new();
    target.extend_from_slice(&basis[1400..2100]);
    target.extend_from_slice(&basis[0..700]);
    target.extend_from_slice(&basis[700..1400]);

    let index = SignatureIndex::from_signature(&generate_signature(&basis, &config), &config);
    let script = generate_delta(&target, &index, &config).expect("delta");

    assert_eq!(apply_in_place(&basis, script.deltas()), target);
}

#[test]
fn growing_target_zero_extends() {
    let basis = b"0123456789".to_vec();
    let deltas = [copy(0, 0, 10), literal(b"tail", 20)];

    let result = apply_in_place(&basis, &deltas);
    assert_eq!(result.len(), 24);
    assert_eq!(&result[..10], b"0123456789");
    assert_eq!(&result[10..20], &[0u8; 10], "gap must be zero-filled");
    assert_eq!(&result[20..], b"tail");
}

#[test]
fn shrinking_target_truncates() {
    let basis = b"a long basis that becomes short".to_vec();
    let deltas = [copy(2, 0, 4)];

    assert_eq!(apply_in_place(&basis, &deltas), b"long");
}

#[test]
fn empty_delta_truncates_to_zero() {
    let basis = b"everything goes".to_vec();
    assert_eq!(apply_in_place(&basis, &[]), b"");
}

#[test]
fn fresh_file_accepts_literals_only() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("fresh");

    rebuild_file_in_place(&path, &[literal(b"created from nothing", 0)])
        .expect("literal-only delta applies to a fresh file");
    assert_eq!(fs::read(&path).expect("read result"), b"created from nothing");
}

#[test]
fn fresh_file_rejects_copies() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("fresh");

    let err = rebuild_file_in_place(&path, &[copy(0, 0, 4)])
        .expect_err("a fresh file has no basis to copy from");
    assert!(matches!(err, RebuildError::BasisMissing));
    assert!(!path.exists(), "failed rebuild must not leave a file behind");
}

#[test]
fn copy_past_end_of_file_is_rejected_before_writing() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("dest");
    fs::write(&path, b"0123456789").expect("write basis");

    let deltas = [literal(b"X", 0), copy(8, 1, 4)];
    let err = rebuild_file_in_place(&path, &deltas).expect_err("copy overruns the basis");
    assert!(matches!(err, RebuildError::BasisTooShort { .. }));
    assert_eq!(
        fs::read(&path).expect("read result"),
        b"0123456789",
        "validation must precede mutation"
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// For arbitrary permutations of overlapping block copies (cycles
    /// included), in-place reconstruction must agree with out-of-place
    /// reconstruction of the same delta.
    #[test]
    fn in_place_agrees_with_out_of_place(
        seed in any::<u64>(),
        block_count in 2usize..=6,
        block_len in 8u32..=64,
    ) {
        use rand::seq::SliceRandom;
        use rand::{SeedableRng, rngs::StdRng};

        let mut rng = StdRng::seed_from_u64(seed);
        let basis_len = block_count as u32 * block_len;
        let basis: Vec<u8> = (0..basis_len).map(|i| (i * 31 % 251) as u8).collect();

        let mut order: Vec<u32> = (0..block_count as u32).collect();
        order.shuffle(&mut rng);

        let deltas: Vec<Delta> = order
            .iter()
            .enumerate()
            .map(|(slot, &block)| {
                copy(
                    u64::from(block * block_len),
                    slot as u64 * u64::from(block_len),
                    block_len,
                )
            })
            .collect();

        let in_place = apply_in_place(&basis, &deltas);
        let out_of_place = apply_out_of_place(&basis, &deltas);
        prop_assert_eq!(in_place, out_of_place);
    }
}
