//! Evaluation of sense embeddings against human word-similarity judgments.

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use itertools::iproduct;
use log::info;

use crate::dictionary::{split_sense, Dictionary};
use crate::embeddings::Embeddings;
use crate::Error;

/// Sentinel returned when a word pair cannot be scored at all.
pub const MISSING_SCORE: f32 = -1.0;

/// Gold human similarity scores, `(word1, word2) -> score`, words lowercased.
pub type GoldScores = Vec<((String, String), f32)>;

/// Reads a gold score file: a header line, then `word1 word2 score` per line.
pub fn read_gold<P: AsRef<Path>>(path: P) -> Result<GoldScores, Error> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut gold = Vec::new();
    for line in reader.lines().skip(1) {
        let line = line?;
        let mut parts = line.split_whitespace();
        if let (Some(w1), Some(w2), Some(score)) = (parts.next(), parts.next(), parts.next()) {
            gold.push(((w1.to_lowercase(), w2.to_lowercase()), score.parse()?));
        }
    }
    Ok(gold)
}

/// Builds a word → synsets dictionary from the sense-tagged tokens of the
/// embedding vocabulary.
pub fn build_sense_map(embeddings: &Embeddings) -> Dictionary {
    let mut map: HashMap<String, BTreeSet<String>> = HashMap::new();
    for token in embeddings.tokens() {
        let token = token.to_lowercase();
        if let Some((lemma, synset)) = split_sense(&token) {
            map.entry(lemma.to_string())
                .or_insert_with(BTreeSet::new)
                .insert(synset.to_string());
        }
    }
    Dictionary::new(
        map.into_iter()
            .map(|(k, v)| (k, v.into_iter().collect()))
            .collect(),
    )
}

/// The maximum cosine similarity over all sense pairings of two words.
///
/// Exactly `-1.0` when either word has no known senses, or when no sense
/// pairing is present in the embedding vocabulary.
pub fn compute_cosine(
    w1: &str,
    w2: &str,
    embeddings: &Embeddings,
    senses: &Dictionary,
) -> f32 {
    let senses1 = match senses.get_nonempty(w1) {
        Some(senses) => senses,
        None => return MISSING_SCORE,
    };
    let senses2 = match senses.get_nonempty(w2) {
        Some(senses) => senses,
        None => return MISSING_SCORE,
    };

    let mut score = MISSING_SCORE;
    for (synset1, synset2) in iproduct!(senses1, senses2) {
        let sense1 = format!("{}_{}", w1, synset1);
        let sense2 = format!("{}_{}", w2, synset2);
        if let Some(cos) = embeddings.similarity(&sense1, &sense2) {
            score = score.max(cos);
        }
    }
    score
}

/// Spearman rank correlation: Pearson correlation of the rank vectors.
pub fn spearman(x: &[f32], y: &[f32]) -> f32 {
    if x.len() != y.len() || x.is_empty() {
        return 0.0;
    }

    let rank_x = ranks(x);
    let rank_y = ranks(y);
    let n = x.len() as f32;

    let mean_x: f32 = rank_x.iter().sum::<f32>() / n;
    let mean_y: f32 = rank_y.iter().sum::<f32>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (rx, ry) in rank_x.iter().zip(&rank_y) {
        let dx = rx - mean_x;
        let dy = ry - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x < 1e-10 || var_y < 1e-10 {
        return 0.0;
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}

/// Ranks with ties averaged, 1-based.
fn ranks(values: &[f32]) -> Vec<f32> {
    let mut indexed: Vec<(usize, f32)> = values.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < indexed.len() {
        let mut j = i;
        while j + 1 < indexed.len() && indexed[j + 1].1 == indexed[i].1 {
            j += 1;
        }
        let rank = (i + j) as f32 / 2.0 + 1.0;
        for item in &indexed[i..=j] {
            ranks[item.0] = rank;
        }
        i = j + 1;
    }
    ranks
}

/// Evaluation summary: pairs scored, pairs with at least one unknown word,
/// and the rank correlation between predicted and gold scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub pairs: usize,
    pub missing: usize,
    pub correlation: f32,
}

/// Scores every gold pair and reports the rank correlation.
pub fn evaluate(gold: &GoldScores, embeddings: &Embeddings, senses: &Dictionary) -> Evaluation {
    let missing = gold
        .iter()
        .filter(|((w1, w2), _)| !senses.contains_key(w1) || !senses.contains_key(w2))
        .count();
    info!("Missing words in {} of {} pairs.", missing, gold.len());

    let (scores_gold, scores_predicted): (Vec<f32>, Vec<f32>) = gold
        .iter()
        .map(|((w1, w2), score)| (*score, compute_cosine(w1, w2, embeddings, senses)))
        .unzip();

    Evaluation {
        pairs: gold.len(),
        missing,
        correlation: spearman(&scores_gold, &scores_predicted),
    }
}
