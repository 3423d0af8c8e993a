//! Skip-gram negative-sampling trainer over a restartable sentence loader.
//!
//! Two model families share the training loop: plain word2vec, and a
//! fastText-style variant where a token's input vector is the average of its
//! whole-token vector and hashed character n-gram bucket vectors.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;
use log::info;
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::Embeddings;
use crate::sentences::SentenceLoader;
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    Word2Vec,
    FastText,
}

impl FromStr for ModelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "w2v" => Ok(ModelKind::Word2Vec),
            "ft" => Ok(ModelKind::FastText),
            other => Err(Error::UnknownModel(other.to_string())),
        }
    }
}

/// Training configuration. Defaults mirror the established corpus builds:
/// 400 dimensions, window 5, minimum frequency 3, 5 epochs.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub model: ModelKind,
    pub dim: usize,
    pub window: usize,
    pub min_count: u64,
    pub epochs: usize,
    /// Subsampling threshold for frequent tokens; `<= 0` disables subsampling.
    pub sample: f64,
    pub negative: usize,
    pub learning_rate: f32,
    /// Character n-gram range and bucket count (fastText mode only).
    pub min_n: usize,
    pub max_n: usize,
    pub buckets: usize,
    pub seed: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        TrainOptions {
            model: ModelKind::Word2Vec,
            dim: 400,
            window: 5,
            min_count: 3,
            epochs: 5,
            sample: 1e-3,
            negative: 5,
            learning_rate: 0.025,
            min_n: 3,
            max_n: 6,
            buckets: 100_000,
            seed: 1,
        }
    }
}

/// A trained model: vocabulary with corpus frequencies plus the learned input
/// vectors (and n-gram bucket vectors in fastText mode).
#[derive(Serialize, Deserialize)]
pub struct TrainedModel {
    kind: ModelKind,
    dim: usize,
    vocab: IndexMap<String, u64>,
    input: Vec<Vec<f32>>,
    ngram_input: Vec<Vec<f32>>,
    min_n: usize,
    max_n: usize,
}

impl TrainedModel {
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let reader = BufReader::new(File::open(path)?);
        Ok(bincode::deserialize_from(reader)?)
    }

    /// Final token vectors, in vocabulary order.
    pub fn to_embeddings(&self) -> Embeddings {
        let mut vectors = IndexMap::with_capacity(self.vocab.len());
        for (index, token) in self.vocab.keys().enumerate() {
            vectors.insert(token.clone(), self.token_vector(token, index));
        }
        Embeddings::new(vectors, self.dim)
    }

    fn token_vector(&self, token: &str, index: usize) -> Vec<f32> {
        match self.kind {
            ModelKind::Word2Vec => self.input[index].clone(),
            ModelKind::FastText => {
                let ids = ngram_ids(token, self.min_n, self.max_n, self.ngram_input.len());
                let mut vector = self.input[index].clone();
                for id in &ids {
                    for (v, n) in vector.iter_mut().zip(&self.ngram_input[*id]) {
                        *v += n;
                    }
                }
                let parts = (ids.len() + 1) as f32;
                for v in &mut vector {
                    *v /= parts;
                }
                vector
            }
        }
    }
}

/// Trains a model over the loader, passing over the corpus once per epoch.
pub fn train(loader: &SentenceLoader, options: &TrainOptions) -> Result<TrainedModel, Error> {
    info!("Building vocabulary.");
    let (vocab, total_tokens) = build_vocab(loader, options.min_count)?;
    if vocab.is_empty() {
        return Err(Error::Train(format!(
            "no tokens with frequency >= {}",
            options.min_count
        )));
    }
    info!(
        "Vocabulary of {} tokens, {} in-vocabulary occurrences.",
        vocab.len(),
        total_tokens
    );

    let mut rng = ChaCha8Rng::seed_from_u64(options.seed);
    let dim = options.dim;
    let span = 0.5 / dim as f32;

    let random_vector = |rng: &mut ChaCha8Rng| -> Vec<f32> {
        (0..dim).map(|_| rng.gen_range(-span..span)).collect()
    };

    let mut input: Vec<Vec<f32>> = (0..vocab.len()).map(|_| random_vector(&mut rng)).collect();
    let mut output: Vec<Vec<f32>> = vec![vec![0.0; dim]; vocab.len()];
    let mut ngram_input: Vec<Vec<f32>> = match options.model {
        ModelKind::Word2Vec => Vec::new(),
        ModelKind::FastText => (0..options.buckets)
            .map(|_| random_vector(&mut rng))
            .collect(),
    };

    // token -> its n-gram bucket ids, resolved once
    let token_ngrams: Vec<Vec<usize>> = match options.model {
        ModelKind::Word2Vec => vec![Vec::new(); vocab.len()],
        ModelKind::FastText => vocab
            .keys()
            .map(|token| ngram_ids(token, options.min_n, options.max_n, options.buckets))
            .collect(),
    };

    let weights: Vec<f64> = vocab.values().map(|c| (*c as f64).powf(0.75)).collect();
    let negative_table =
        WeightedIndex::new(&weights).map_err(|e| Error::Train(e.to_string()))?;

    let schedule_total = (options.epochs as u64 * total_tokens).max(1);
    let mut trained_tokens = 0u64;
    let mut hidden = vec![0.0f32; dim];
    let mut gradient = vec![0.0f32; dim];

    for epoch in 0..options.epochs {
        for sentence in loader.iter() {
            let sentence = sentence?;

            // in-vocabulary ids, frequent tokens subsampled away
            let ids: Vec<usize> = sentence
                .iter()
                .filter_map(|token| vocab.get_index_of(token))
                .filter(|id| {
                    trained_tokens += 1;
                    keep_token(&vocab, *id, total_tokens, options.sample, &mut rng)
                })
                .collect();

            let alpha = (options.learning_rate
                * (1.0 - trained_tokens as f32 / schedule_total as f32))
                .max(options.learning_rate * 1e-4);

            for (position, &center) in ids.iter().enumerate() {
                let reach = rng.gen_range(1..=options.window);
                let start = position.saturating_sub(reach);
                let end = (position + reach + 1).min(ids.len());

                for context_position in start..end {
                    if context_position == position {
                        continue;
                    }
                    let context = ids[context_position];

                    compose_hidden(&mut hidden, center, &input, &token_ngrams, &ngram_input);
                    gradient.iter_mut().for_each(|g| *g = 0.0);

                    for negative in 0..=options.negative {
                        let (target, label) = if negative == 0 {
                            (context, 1.0)
                        } else {
                            let sampled = negative_table.sample(&mut rng);
                            if sampled == context {
                                continue;
                            }
                            (sampled, 0.0)
                        };

                        let dot: f32 =
                            hidden.iter().zip(&output[target]).map(|(h, o)| h * o).sum();
                        let g = (label - sigmoid(dot)) * alpha;

                        for ((grad, out), h) in
                            gradient.iter_mut().zip(&mut output[target]).zip(&hidden)
                        {
                            *grad += g * *out;
                            *out += g * *h;
                        }
                    }

                    apply_gradient(
                        &gradient,
                        center,
                        &mut input,
                        &token_ngrams,
                        &mut ngram_input,
                    );
                }
            }
        }
        info!("Epoch {}/{} done.", epoch + 1, options.epochs);
    }

    Ok(TrainedModel {
        kind: options.model,
        dim,
        vocab,
        input,
        ngram_input,
        min_n: options.min_n,
        max_n: options.max_n,
    })
}

fn build_vocab(
    loader: &SentenceLoader,
    min_count: u64,
) -> Result<(IndexMap<String, u64>, u64), Error> {
    let mut counts: IndexMap<String, u64> = IndexMap::new();
    for sentence in loader.iter() {
        for token in sentence? {
            *counts.entry(token).or_insert(0) += 1;
        }
    }

    let mut kept: Vec<(String, u64)> = counts
        .into_iter()
        .filter(|(_, count)| *count >= min_count)
        .collect();
    // frequency order with a lexicographic tiebreak keeps runs reproducible
    kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let total = kept.iter().map(|(_, count)| *count).sum();
    Ok((kept.into_iter().collect(), total))
}

fn keep_token(
    vocab: &IndexMap<String, u64>,
    id: usize,
    total: u64,
    sample: f64,
    rng: &mut ChaCha8Rng,
) -> bool {
    if sample <= 0.0 {
        return true;
    }
    let frequency = vocab[id] as f64 / total as f64;
    let keep = (sample / frequency).sqrt();
    keep >= 1.0 || rng.gen::<f64>() < keep
}

fn compose_hidden(
    hidden: &mut [f32],
    center: usize,
    input: &[Vec<f32>],
    token_ngrams: &[Vec<usize>],
    ngram_input: &[Vec<f32>],
) {
    hidden.copy_from_slice(&input[center]);
    let ngrams = &token_ngrams[center];
    if ngrams.is_empty() {
        return;
    }
    for id in ngrams {
        for (h, n) in hidden.iter_mut().zip(&ngram_input[*id]) {
            *h += n;
        }
    }
    let parts = (ngrams.len() + 1) as f32;
    for h in hidden.iter_mut() {
        *h /= parts;
    }
}

fn apply_gradient(
    gradient: &[f32],
    center: usize,
    input: &mut [Vec<f32>],
    token_ngrams: &[Vec<usize>],
    ngram_input: &mut [Vec<f32>],
) {
    let ngrams = &token_ngrams[center];
    let parts = (ngrams.len() + 1) as f32;

    for (v, g) in input[center].iter_mut().zip(gradient) {
        *v += g / parts;
    }
    for id in ngrams {
        for (v, g) in ngram_input[*id].iter_mut().zip(gradient) {
            *v += g / parts;
        }
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Hashed character n-gram ids of `<token>`, fastText style.
fn ngram_ids(token: &str, min_n: usize, max_n: usize, buckets: usize) -> Vec<usize> {
    if buckets == 0 {
        return Vec::new();
    }
    let padded: Vec<char> = format!("<{}>", token).chars().collect();
    let mut ids = Vec::new();
    for n in min_n..=max_n.min(padded.len()) {
        for window in padded.windows(n) {
            let gram: String = window.iter().collect();
            ids.push(fnv1a(gram.as_bytes()) as usize % buckets);
        }
    }
    ids
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}
