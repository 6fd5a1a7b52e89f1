use async_trait::async_trait;
use vocab_application::{EmbeddingError, EmbeddingProvider};

const DEFAULT_DIM: usize = 256;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Deterministic offline embedder.
///
/// Hashes character trigrams of the normalized text into a fixed-size
/// bag-of-trigrams vector and L2-normalizes it. Texts sharing surface
/// vocabulary land close together, which is enough for pattern-level
/// similarity without a model dependency.
pub struct HashedTrigramEmbedder {
    dim: usize,
}

impl HashedTrigramEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let normalized: String = text
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        // Pad so that short tokens still produce boundary trigrams
        let padded: Vec<char> = format!(" {} ", normalized).chars().collect();

        let mut counts = vec![0.0f32; self.dim];
        for window in padded.windows(3) {
            let mut hash = FNV_OFFSET;
            for ch in window {
                let mut buf = [0u8; 4];
                for byte in ch.encode_utf8(&mut buf).as_bytes() {
                    hash ^= u64::from(*byte);
                    hash = hash.wrapping_mul(FNV_PRIME);
                }
            }
            counts[(hash % self.dim as u64) as usize] += 1.0;
        }

        let norm: f32 = counts.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in counts.iter_mut() {
                *value /= norm;
            }
        }
        counts
    }
}

impl Default for HashedTrigramEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIM)
    }
}

#[async_trait]
impl EmbeddingProvider for HashedTrigramEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.vectorize(text))
    }
}
