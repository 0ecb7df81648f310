use super::StrongDigest;

/// Streaming XXH64 hasher, the 64-bit non-cryptographic strong sum.
///
/// Only valid when both sides of a transfer configure it; the shorter digest
/// trades collision resistance for speed.
#[derive(Clone)]
pub struct Xxh64 {
    inner: xxhash_rust::xxh64::Xxh64,
}

impl Default for Xxh64 {
    fn default() -> Self {
        Self::new()
    }
}

impl Xxh64 {
    /// Creates a hasher with an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: xxhash_rust::xxh64::Xxh64::new(0),
        }
    }
}

impl std::fmt::Debug for Xxh64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Xxh64").finish_non_exhaustive()
    }
}

impl StrongDigest for Xxh64 {
    type Digest = [u8; 8];
    const DIGEST_LEN: usize = 8;

    fn new() -> Self {
        Xxh64::new()
    }

    fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    fn finalize(self) -> Self::Digest {
        self.inner.digest().to_be_bytes()
    }
}
