//! Link token generation.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;

/// Produces fixed-length, URL-safe tokens from the operating system CSPRNG.
#[derive(Debug, Clone, Copy)]
pub struct TokenGenerator {
    bytes: usize,
}

impl TokenGenerator {
    /// A generator emitting `bytes` random bytes per token.
    pub fn new(bytes: usize) -> Self {
        Self { bytes }
    }

    /// Length of every generated token in characters.
    pub fn token_len(&self) -> usize {
        (self.bytes * 4).div_ceil(3)
    }

    /// Generate a new token.
    pub fn generate(&self) -> String {
        let mut buf = vec![0u8; self.bytes];
        OsRng.fill_bytes(&mut buf);
        URL_SAFE_NO_PAD.encode(buf)
    }
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new(32)
    }
}
