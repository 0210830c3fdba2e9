//! Learned relevance scorer.
//!
//! A 3-layer dense network (ReLU, ReLU, sigmoid) over the concatenation of
//! two bag-of-words occurrence vectors: query first, event second. Weights and
//! vocabulary are produced offline and loaded once at startup.

use super::tokenizer::tokenize;
use crate::error::{AppError, Result};

use candle_core::{Device, Tensor};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;

pub const VOCAB_FILE: &str = "tfidf_vectorizer_vocab.json";
pub const WEIGHTS_FILE: &str = "model_weights.json";

/// Widths of the two hidden layers.
pub const HIDDEN_WIDTHS: [usize; 2] = [64, 32];

/// `[W1, b1, W2, b2, W3, b3]`, kernels stored `[inputs][outputs]`.
pub type RawWeights = (
    Vec<Vec<f32>>,
    Vec<f32>,
    Vec<Vec<f32>>,
    Vec<f32>,
    Vec<Vec<f32>>,
    Vec<f32>,
);

/// Token → slot mapping fixed at training time.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    slots: HashMap<String, usize>,
}

impl Vocabulary {
    /// Every slot index must be unique and below the vocabulary size.
    pub fn from_map(slots: HashMap<String, usize>) -> Result<Self> {
        let size = slots.len();
        let mut seen = vec![false; size];
        for (token, &slot) in slots.iter() {
            if slot >= size {
                return Err(AppError::DependencyUnavailable(format!(
                    "vocabulary slot {} for {:?} exceeds size {}",
                    slot, token, size
                )));
            }
            if seen[slot] {
                return Err(AppError::DependencyUnavailable(format!(
                    "vocabulary slot {} assigned twice",
                    slot
                )));
            }
            seen[slot] = true;
        }
        Ok(Self { slots })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// 0/1 occurrence vector; out-of-vocabulary tokens are ignored.
    pub fn encode(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.slots.len()];
        for token in tokenize(text) {
            if let Some(&slot) = self.slots.get(&token) {
                vector[slot] = 1.0;
            }
        }
        vector
    }
}

#[derive(Debug, Clone, Copy)]
enum Activation {
    Relu,
    Sigmoid,
}

struct DenseLayer {
    weight: Tensor,
    bias: Tensor,
    activation: Activation,
}

impl DenseLayer {
    fn new(
        name: &str,
        kernel: Vec<Vec<f32>>,
        bias: Vec<f32>,
        inputs: usize,
        outputs: usize,
        activation: Activation,
    ) -> Result<Self> {
        if kernel.len() != inputs || kernel.iter().any(|row| row.len() != outputs) {
            return Err(AppError::DependencyUnavailable(format!(
                "{} kernel shape mismatch: expected [{}][{}]",
                name, inputs, outputs
            )));
        }
        if bias.len() != outputs {
            return Err(AppError::DependencyUnavailable(format!(
                "{} bias length {} != {}",
                name,
                bias.len(),
                outputs
            )));
        }

        let flat: Vec<f32> = kernel.into_iter().flatten().collect();
        let weight = Tensor::from_vec(flat, (inputs, outputs), &Device::Cpu).map_err(tensor_err)?;
        let bias = Tensor::from_vec(bias, outputs, &Device::Cpu).map_err(tensor_err)?;

        Ok(Self {
            weight,
            bias,
            activation,
        })
    }

    fn forward(&self, input: &Tensor) -> candle_core::Result<Tensor> {
        let z = input.matmul(&self.weight)?.broadcast_add(&self.bias)?;
        match self.activation {
            Activation::Relu => z.relu(),
            Activation::Sigmoid => z.neg()?.exp()?.affine(1.0, 1.0)?.recip(),
        }
    }
}

/// Loaded vocabulary plus network weights. Immutable once built.
pub struct RelevanceNetwork {
    vocabulary: Vocabulary,
    layers: Vec<DenseLayer>,
}

impl RelevanceNetwork {
    pub fn from_parts(vocabulary: Vocabulary, weights: RawWeights) -> Result<Self> {
        if vocabulary.is_empty() {
            return Err(AppError::DependencyUnavailable(
                "vocabulary is empty".to_string(),
            ));
        }
        let input_width = vocabulary.len() * 2;
        let [hidden_1, hidden_2] = HIDDEN_WIDTHS;
        let (w1, b1, w2, b2, w3, b3) = weights;

        let layers = vec![
            DenseLayer::new("layer 1", w1, b1, input_width, hidden_1, Activation::Relu)?,
            DenseLayer::new("layer 2", w2, b2, hidden_1, hidden_2, Activation::Relu)?,
            DenseLayer::new("layer 3", w3, b3, hidden_2, 1, Activation::Sigmoid)?,
        ];

        Ok(Self { vocabulary, layers })
    }

    /// Reads `VOCAB_FILE` and `WEIGHTS_FILE` from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let vocab_path = dir.join(VOCAB_FILE);
        let weights_path = dir.join(WEIGHTS_FILE);

        let slots: HashMap<String, usize> = read_json(&vocab_path)?;
        let weights: RawWeights = read_json(&weights_path)?;

        Self::from_parts(Vocabulary::from_map(slots)?, weights)
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Scores every document against `query` in one forward pass.
    ///
    /// Output order matches `documents`. Any non-finite score fails the
    /// whole batch.
    pub fn score_batch(&self, query: &str, documents: &[String]) -> Result<Vec<f32>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.vocabulary.encode(query);
        let width = query_vector.len() * 2;

        let rows: Vec<Vec<f32>> = documents
            .par_iter()
            .map(|document| {
                let mut row = Vec::with_capacity(width);
                row.extend_from_slice(&query_vector);
                row.extend(self.vocabulary.encode(document));
                row
            })
            .collect();
        let flat: Vec<f32> = rows.into_iter().flatten().collect();

        let mut activations =
            Tensor::from_vec(flat, (documents.len(), width), &Device::Cpu).map_err(tensor_err)?;
        for layer in self.layers.iter() {
            activations = layer.forward(&activations).map_err(tensor_err)?;
        }

        let scores = activations
            .flatten_all()
            .and_then(|t| t.to_vec1::<f32>())
            .map_err(tensor_err)?;

        if scores.len() != documents.len() || scores.iter().any(|s| !s.is_finite()) {
            return Err(AppError::DependencyUnavailable(
                "relevance model produced invalid scores".to_string(),
            ));
        }
        Ok(scores)
    }

    pub fn score(&self, query: &str, document: &str) -> Result<f32> {
        let scores = self.score_batch(query, &[document.to_string()])?;
        scores.first().copied().ok_or_else(|| {
            AppError::DependencyUnavailable("relevance model returned no score".to_string())
        })
    }
}

/// Two-state capability checked by the search orchestrator.
pub enum RelevanceModel {
    Loaded(RelevanceNetwork),
    Unavailable { reason: String },
}

impl RelevanceModel {
    /// Never fails: load problems yield `Unavailable`.
    pub fn load(dir: &Path) -> Self {
        match RelevanceNetwork::load(dir) {
            Ok(network) => {
                tracing::info!(
                    "Relevance model loaded from {} (vocabulary: {} tokens)",
                    dir.display(),
                    network.vocabulary().len()
                );
                RelevanceModel::Loaded(network)
            }
            Err(e) => {
                tracing::warn!("Relevance model unavailable, search runs lexical-only: {}", e);
                RelevanceModel::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        RelevanceModel::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, RelevanceModel::Loaded(_))
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        AppError::DependencyUnavailable(format!("cannot read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        AppError::DependencyUnavailable(format!("cannot parse {}: {}", path.display(), e))
    })
}

fn tensor_err(e: candle_core::Error) -> AppError {
    AppError::DependencyUnavailable(format!("tensor computation error: {}", e))
}
