use digest::Digest;

use super::StrongDigest;

/// Streaming MD4 hasher, the legacy strong sum.
#[derive(Clone, Debug, Default)]
pub struct Md4 {
    inner: md4::Md4,
}

impl Md4 {
    /// Creates a hasher with an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: md4::Md4::new(),
        }
    }
}

impl StrongDigest for Md4 {
    type Digest = [u8; 16];
    const DIGEST_LEN: usize = 16;

    fn new() -> Self {
        Md4::new()
    }

    fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    fn finalize(self) -> Self::Digest {
        self.inner.finalize().into()
    }
}
