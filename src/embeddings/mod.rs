//! Sense embeddings in the word2vec plain-text convention.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write as _};
use std::path::Path;

use indexmap::IndexMap;
use log::info;

use crate::dictionary::SENSE_MARKER;
use crate::Error;

pub mod train;

pub use train::{train, ModelKind, TrainOptions, TrainedModel};

/// Token → vector map with a fixed dimensionality, insertion-ordered so files
/// round-trip in the same order.
pub struct Embeddings {
    vectors: IndexMap<String, Vec<f32>>,
    dim: usize,
}

impl Embeddings {
    pub fn new(vectors: IndexMap<String, Vec<f32>>, dim: usize) -> Self {
        Embeddings { vectors, dim }
    }

    /// Reads a `<count> <dim>` headed plain-text vector file.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let header = lines
            .next()
            .ok_or_else(|| Error::Embeddings("empty file".into()))??;
        let mut parts = header.split_whitespace();
        let count: usize = parts
            .next()
            .ok_or_else(|| Error::Embeddings("missing vector count".into()))?
            .parse()?;
        let dim: usize = parts
            .next()
            .ok_or_else(|| Error::Embeddings("missing dimensionality".into()))?
            .parse()?;

        let mut vectors = IndexMap::with_capacity(count);
        for line in lines {
            let line = line?;
            let mut parts = line.split_whitespace();
            let token = match parts.next() {
                Some(token) => token,
                None => continue,
            };
            let vector = parts.map(|x| x.parse()).collect::<Result<Vec<f32>, _>>()?;
            if vector.len() != dim {
                return Err(Error::Embeddings(format!(
                    "vector for '{}' has {} dimensions, expected {}",
                    token,
                    vector.len(),
                    dim
                )));
            }
            vectors.insert(token.to_string(), vector);
        }

        info!("Loaded {} vectors of dimension {}.", vectors.len(), dim);
        Ok(Embeddings { vectors, dim })
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "{} {}", self.vectors.len(), self.dim)?;
        for (token, vector) in &self.vectors {
            write!(writer, "{}", token)?;
            for value in vector {
                write!(writer, " {}", value)?;
            }
            writeln!(writer)?;
        }

        Ok(())
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.vectors.contains_key(token)
    }

    pub fn get(&self, token: &str) -> Option<&[f32]> {
        self.vectors.get(token).map(|x| x.as_slice())
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.vectors.keys().map(|x| x.as_str())
    }

    /// Cosine similarity between two tokens, `None` if either is missing.
    pub fn similarity(&self, a: &str, b: &str) -> Option<f32> {
        Some(cosine(self.get(a)?, self.get(b)?))
    }

    /// The `k` vocabulary tokens most similar to `token`, best first.
    pub fn most_similar(&self, token: &str, k: usize) -> Vec<(String, f32)> {
        let target = match self.get(token) {
            Some(target) => target,
            None => return Vec::new(),
        };

        let mut scored: Vec<(String, f32)> = self
            .vectors
            .iter()
            .filter(|(other, _)| other.as_str() != token)
            .map(|(other, vector)| (other.clone(), cosine(target, vector)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }
}

/// Copies a vector file keeping only sense-tagged tokens, rewriting the count
/// header and carrying the dimensionality over from the input.
pub fn clean_embeddings<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<(), Error> {
    let file = File::open(&input)?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines();

    let header = lines
        .next()
        .ok_or_else(|| Error::Embeddings("empty file".into()))??;
    let dim = header
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| Error::Embeddings("missing dimensionality".into()))?
        .to_string();

    let mut kept = Vec::new();
    for line in lines {
        let line = line?;
        if line
            .split_whitespace()
            .next()
            .map_or(false, |token| token.contains(SENSE_MARKER))
        {
            kept.push(line);
        }
    }

    let file = File::create(&output)?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{} {}", kept.len(), dim)?;
    for line in &kept {
        writeln!(writer, "{}", line)?;
    }

    info!("Kept {} sense vectors.", kept.len());
    Ok(())
}

pub(crate) fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample() -> Embeddings {
        let mut vectors = IndexMap::new();
        vectors.insert("bank_bn:00008364n".to_string(), vec![1.0, 0.0, 0.0]);
        vectors.insert("bank_bn:00008363n".to_string(), vec![0.0, 1.0, 0.0]);
        vectors.insert("money".to_string(), vec![0.9, 0.1, 0.0]);
        Embeddings::new(vectors, 3)
    }

    #[test]
    fn write_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("embeddings.vec");
        let embeddings = sample();
        embeddings.write(&path).unwrap();

        let loaded = Embeddings::read(&path).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.dim(), 3);
        assert_eq!(loaded.get("money"), Some(&[0.9, 0.1, 0.0][..]));
    }

    #[test]
    fn similarity_is_cosine() {
        let embeddings = sample();
        let sim = embeddings
            .similarity("bank_bn:00008364n", "bank_bn:00008363n")
            .unwrap();
        assert!(sim.abs() < 1e-6);
        assert!(embeddings.similarity("bank_bn:00008364n", "missing").is_none());
    }

    #[test]
    fn most_similar_ranks_by_cosine() {
        let embeddings = sample();
        let similar = embeddings.most_similar("bank_bn:00008364n", 1);
        assert_eq!(similar[0].0, "money");
    }

    #[test]
    fn clean_keeps_only_sense_vectors() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("embeddings.vec");
        let output = dir.path().join("embeddings_clean.vec");
        sample().write(&input).unwrap();

        clean_embeddings(&input, &output).unwrap();
        let content = fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "2 3");
        assert!(lines[1..].iter().all(|line| line.contains("_bn:")));
    }
}
