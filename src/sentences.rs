//! Restartable, lazy loading of cleaned sentence files.
//!
//! Embedding training iterates the corpus once per epoch, so the loader hands
//! out a fresh iterator each time [`SentenceLoader::iter`] is called,
//! reopening the files instead of buffering them.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use crate::Error;

/// English stopwords (the usual NLTK list).
const STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

const PUNCTUATION: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

// quote variants and dashes stripped from tokens in complete mode
const STRIPPED: &[char] = &['-', '`', '"', '\'', '\u{2019}', '\u{2013}'];

/// How a raw line is turned into tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanMode {
    /// Lowercase, strip punctuation characters, quote variants and dashes from
    /// tokens, drop stopwords, empty tokens and HTML entities.
    Complete,
    /// Lowercase, split on whitespace, drop stopwords.
    Naive,
}

/// Cleaning configuration, built once per run and passed down instead of
/// living in process-wide state.
#[derive(Debug, Clone)]
pub struct CleanOptions {
    pub mode: CleanMode,
    pub stopwords: HashSet<String>,
}

impl Default for CleanOptions {
    fn default() -> Self {
        CleanOptions {
            mode: CleanMode::Complete,
            stopwords: default_stopwords(),
        }
    }
}

/// The default stopword set: English stopwords plus every single ASCII
/// punctuation character.
pub fn default_stopwords() -> HashSet<String> {
    STOPWORDS
        .iter()
        .map(|x| x.to_string())
        .chain(PUNCTUATION.chars().map(|c| c.to_string()))
        .collect()
}

/// Lazily yields cleaned token sequences from one or more corpus files.
pub struct SentenceLoader {
    paths: Vec<PathBuf>,
    options: CleanOptions,
}

impl SentenceLoader {
    pub fn new<P: AsRef<Path>>(paths: &[P], options: CleanOptions) -> Self {
        SentenceLoader {
            paths: paths.iter().map(|p| p.as_ref().to_path_buf()).collect(),
            options,
        }
    }

    /// A fresh pass over all files. Each call reopens the files, so the
    /// loader can be traversed once per training epoch.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            loader: self,
            next_path: 0,
            lines: None,
        }
    }

    fn clean(&self, line: &str) -> Vec<String> {
        match self.options.mode {
            CleanMode::Naive => line
                .to_lowercase()
                .split_whitespace()
                .filter(|word| !self.options.stopwords.contains(*word))
                .map(|word| word.to_string())
                .collect(),
            CleanMode::Complete => line
                .to_lowercase()
                .split_whitespace()
                .map(|word| {
                    word.chars()
                        .filter(|c| !STRIPPED.contains(c))
                        .collect::<String>()
                })
                .filter(|word| {
                    !word.is_empty()
                        && !self.options.stopwords.contains(word)
                        && !word.contains('&')
                })
                .collect(),
        }
    }
}

pub struct Iter<'a> {
    loader: &'a SentenceLoader,
    next_path: usize,
    lines: Option<Lines<BufReader<File>>>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = Result<Vec<String>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(lines) = self.lines.as_mut() {
                match lines.next() {
                    Some(Ok(line)) => return Some(Ok(self.loader.clean(&line))),
                    Some(Err(err)) => return Some(Err(err.into())),
                    None => self.lines = None,
                }
            }

            let path = self.loader.paths.get(self.next_path)?;
            self.next_path += 1;
            match File::open(path) {
                Ok(file) => self.lines = Some(BufReader::new(file).lines()),
                Err(err) => return Some(Err(err.into())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn loader(dir: &tempfile::TempDir, content: &str, mode: CleanMode) -> SentenceLoader {
        let path = dir.path().join("sentences.txt");
        fs::write(&path, content).unwrap();
        SentenceLoader::new(
            &[path],
            CleanOptions {
                mode,
                ..CleanOptions::default()
            },
        )
    }

    #[test]
    fn complete_clean_strips_punctuation_and_entities() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader(
            &dir,
            "The well-known \"Bank\" &amp; the plant_bn:00046568n .\n",
            CleanMode::Complete,
        );

        let sentences: Vec<Vec<String>> =
            loader.iter().collect::<Result<_, _>>().unwrap();
        assert_eq!(sentences, vec![vec!["wellknown", "bank", "plant_bn:00046568n"]]);
    }

    #[test]
    fn naive_clean_only_lowercases_and_drops_stopwords() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader(&dir, "The Bank is well-known\n", CleanMode::Naive);

        let sentences: Vec<Vec<String>> =
            loader.iter().collect::<Result<_, _>>().unwrap();
        assert_eq!(sentences, vec![vec!["bank", "well-known"]]);
    }

    #[test]
    fn iteration_is_restartable() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader(&dir, "one sentence here\nanother sentence\n", CleanMode::Naive);

        let first: Vec<_> = loader.iter().collect::<Result<_, _>>().unwrap();
        let second: Vec<_> = loader.iter().collect::<Result<_, _>>().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn multiple_files_are_chained() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, "alpha beta\n").unwrap();
        fs::write(&b, "gamma delta\n").unwrap();

        let loader = SentenceLoader::new(
            &[a, b],
            CleanOptions {
                mode: CleanMode::Naive,
                ..CleanOptions::default()
            },
        );
        let sentences: Vec<Vec<String>> =
            loader.iter().collect::<Result<_, _>>().unwrap();
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0], vec!["alpha", "beta"]);
        assert_eq!(sentences[1], vec!["gamma", "delta"]);
    }
}
