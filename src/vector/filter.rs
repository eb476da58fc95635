//! Post-query relevance thresholding

use super::adapter::StoredHit;

/// Drops hits scoring below a similarity cutoff
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelevanceFilter {
    cutoff: f32,
}

impl RelevanceFilter {
    pub fn new(cutoff: f32) -> Self {
        Self { cutoff }
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Keep hits with `score >= cutoff`, in their original order
    pub fn apply(&self, hits: Vec<StoredHit>) -> Vec<StoredHit> {
        hits.into_iter()
            .filter(|hit| hit.score >= self.cutoff)
            .collect()
    }
}
