//! The generator must be insensitive to how its input is chunked: feeding a
//! basis byte-by-byte, in small chunks, or all at once has to produce the
//! identical block signature sequence.

use signature::{BlockSignature, SignatureGenerator, SyncConfig, generate_signature};

fn collect_with_chunking(basis: &[u8], config: &SyncConfig, chunk_len: usize) -> Vec<BlockSignature> {
    let mut generator = SignatureGenerator::new(config);
    let mut blocks = Vec::new();
    for chunk in basis.chunks(chunk_len) {
        generator.update(chunk, |block| blocks.push(block));
    }
    generator.finish(|block| blocks.push(block));
    blocks
}

fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 31 + 7) % 251) as u8).collect()
}

#[test]
fn byte_by_byte_chunked_and_one_shot_feeds_agree() {
    let config = SyncConfig::builder().build().expect("default config");

    for len in [0usize, 1, 699, 700, 701, 4096, 10_000] {
        let basis = patterned(len);

        let one_shot = generate_signature(&basis, &config);
        let by_one = collect_with_chunking(&basis, &config, 1);
        let by_five = collect_with_chunking(&basis, &config, 5);

        assert_eq!(one_shot, by_one, "byte-by-byte feed diverged at len {len}");
        assert_eq!(one_shot, by_five, "chunk-of-five feed diverged at len {len}");
    }
}

#[test]
fn chunk_boundaries_straddling_blocks_do_not_matter() {
    let config = SyncConfig::builder()
        .block_length(700)
        .chunk_size(700)
        .build()
        .expect("valid config");
    let basis = patterned(2100);

    let one_shot = generate_signature(&basis, &config);
    for chunk_len in [699, 700, 701, 1399] {
        assert_eq!(
            one_shot,
            collect_with_chunking(&basis, &config, chunk_len),
            "chunk length {chunk_len}"
        );
    }
}
