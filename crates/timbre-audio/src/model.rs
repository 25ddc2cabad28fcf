//! The embedding/classification model seam.
//!
//! The model itself runs elsewhere; this module owns the preprocessing
//! applied before inference and the pooling applied after it, so every
//! model implementation produces vectors comparable to the ones stored in
//! the backend.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AudioError, AudioResult};

/// One genre prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreScore {
    pub label: String,
    pub score: f32,
}

/// An audio-classification model that also exposes its hidden states.
#[async_trait]
pub trait EmbeddingModel: Send + Sync + fmt::Debug {
    /// Last hidden state for `input`, one row per frame.
    async fn hidden_states(&self, input: &[f32], sampling_rate: u32) -> AudioResult<Vec<Vec<f32>>>;

    /// Genre predictions for `input`, in any order.
    async fn classify(&self, input: &[f32], sampling_rate: u32) -> AudioResult<Vec<GenreScore>>;
}

/// Input preparation matching the model's training-time feature extractor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureExtractor {
    pub sampling_rate: u32,
    /// Inputs longer than this many samples are truncated.
    pub max_length: usize,
    /// Zero-mean, unit-variance normalisation.
    pub normalize: bool,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self {
            sampling_rate: 16_000,
            max_length: 16_000,
            normalize: true,
        }
    }
}

impl FeatureExtractor {
    const VARIANCE_EPSILON: f32 = 1e-7;

    /// Truncate and normalise raw mono samples at `self.sampling_rate`.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn prepare(&self, samples: &[f32]) -> Vec<f32> {
        let mut input: Vec<f32> = samples.iter().take(self.max_length).copied().collect();
        if !self.normalize || input.is_empty() {
            return input;
        }

        let len = input.len() as f32;
        let mean = input.iter().sum::<f32>() / len;
        let variance = input.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / len;
        let scale = (variance + Self::VARIANCE_EPSILON).sqrt();

        for x in &mut input {
            *x = (*x - mean) / scale;
        }
        input
    }
}

/// Mean of the hidden-state rows: the embedding of the whole clip.
#[allow(clippy::cast_precision_loss)]
pub fn mean_pool(hidden: &[Vec<f32>]) -> AudioResult<Vec<f32>> {
    let first = hidden
        .first()
        .ok_or_else(|| AudioError::Model("model returned no hidden states".to_string()))?;
    let width = first.len();
    if width == 0 {
        return Err(AudioError::Model("hidden states have zero width".to_string()));
    }

    let mut pooled = vec![0.0_f32; width];
    for (row_idx, row) in hidden.iter().enumerate() {
        if row.len() != width {
            return Err(AudioError::Model(format!(
                "hidden state row {row_idx} has width {}, expected {width}",
                row.len()
            )));
        }
        for (acc, value) in pooled.iter_mut().zip(row) {
            *acc += value;
        }
    }

    let frames = hidden.len() as f32;
    for acc in &mut pooled {
        *acc /= frames;
    }
    Ok(pooled)
}

/// Sort predictions best-first.
#[must_use]
pub fn rank_genres(mut genres: Vec<GenreScore>) -> Vec<GenreScore> {
    genres.sort_by(|a, b| b.score.total_cmp(&a.score));
    genres
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_truncates() {
        let extractor = FeatureExtractor {
            sampling_rate: 16_000,
            max_length: 3,
            normalize: false,
        };
        assert_eq!(extractor.prepare(&[1.0, 2.0, 3.0, 4.0]), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_prepare_normalizes() {
        let extractor = FeatureExtractor::default();
        let prepared = extractor.prepare(&[1.0, 2.0, 3.0, 4.0]);

        let mean: f32 = prepared.iter().sum::<f32>() / 4.0;
        let variance: f32 = prepared.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / 4.0;
        assert!(mean.abs() < 1e-5);
        assert!((variance - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_prepare_silence_stays_finite() {
        let prepared = FeatureExtractor::default().prepare(&[0.0; 10]);
        assert!(prepared.iter().all(|x| x.is_finite() && *x == 0.0));
    }

    #[test]
    fn test_mean_pool() {
        let hidden = vec![vec![1.0, 2.0], vec![3.0, 6.0]];
        assert_eq!(mean_pool(&hidden).unwrap(), vec![2.0, 4.0]);
    }

    #[test]
    fn test_mean_pool_rejects_empty_and_ragged() {
        assert!(mean_pool(&[]).is_err());
        assert!(mean_pool(&[Vec::new()]).is_err());
        assert!(mean_pool(&[vec![1.0, 2.0], vec![1.0]]).is_err());
    }

    #[test]
    fn test_rank_genres() {
        let ranked = rank_genres(vec![
            GenreScore { label: "rock".to_string(), score: 0.2 },
            GenreScore { label: "folk".to_string(), score: 0.7 },
            GenreScore { label: "jazz".to_string(), score: 0.1 },
        ]);
        let labels: Vec<&str> = ranked.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["folk", "rock", "jazz"]);
    }
}
