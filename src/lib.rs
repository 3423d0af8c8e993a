//! Sense-annotated word embeddings from large sense-tagged corpora.
//!
//! sensembed has the following core abstractions:
//! - A streaming [corpus][corpus] layer that filters and rewrites EuroSense and SEW
//!   XML dumps into flat, sense-tagged sentence files. Sentences are processed one
//!   element at a time so memory stays bounded regardless of dump size.
//! - A [Dictionary][dictionary::Dictionary] for flat key → values mapping files
//!   (BabelNet→WordNet mapping, word→synset maps).
//! - A restartable [SentenceLoader][sentences::SentenceLoader] feeding the
//!   [embeddings trainer][embeddings::train] over multiple epochs without holding
//!   the corpus in memory.
//! - An [Embeddings][embeddings::Embeddings] store in the word2vec text convention,
//!   with a [scorer][score] against human similarity judgments and a 2D cluster
//!   [visualization][visualization].
//!
//! # Examples
//!
//! Rewrite a reduced EuroSense corpus into sense-tagged sentences:
//!
//! ```no_run
//! use sensembed::{corpus::eurosense, dictionary::Dictionary};
//!
//! let mapping = Dictionary::read("resources/mapping/bn2wn_mapping.txt")?;
//! eurosense::write_sentences("data/es-en.xml", "data/sentences.txt", &mapping, None)?;
//! # Ok::<(), sensembed::Error>(())
//! ```

use std::io;
use std::num::{ParseFloatError, ParseIntError};

use thiserror::Error;

pub mod corpus;
pub mod dictionary;
pub mod embeddings;
pub mod score;
pub mod sentences;
pub mod visualization;
pub mod wordnet;

#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
    #[error(transparent)]
    Attr(#[from] quick_xml::events::attributes::AttrError),
    #[error(transparent)]
    Serialization(#[from] bincode::Error),
    #[error(transparent)]
    ParseInt(#[from] ParseIntError),
    #[error(transparent)]
    ParseFloat(#[from] ParseFloatError),
    #[error("malformed embeddings file: {0}")]
    Embeddings(String),
    #[error("malformed WordNet data: {0}")]
    WordNet(String),
    #[error("unknown model family '{0}', use 'w2v' for Word2Vec or 'ft' for FastText")]
    UnknownModel(String),
    #[error("training error: {0}")]
    Train(String),
    #[error("plotting error: {0}")]
    Plot(String),
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::corpus::eurosense;
    use crate::dictionary::{word_synset_map, Dictionary};
    use crate::embeddings::{clean_embeddings, train, Embeddings, TrainOptions};
    use crate::score::{build_sense_map, evaluate, read_gold};
    use crate::sentences::{CleanOptions, SentenceLoader};

    const RAW: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<corpus source="europarl">
  <sentence id="0">
    <text lang="en">I deposited money in the bank yesterday</text>
    <text lang="de">Ich habe gestern Geld bei der Bank eingezahlt</text>
    <annotations>
      <annotation lang="en" anchor="bank" lemma="bank" type="BABELFY">bn:00008364n</annotation>
      <annotation lang="de" anchor="Bank" lemma="Bank" type="BABELFY">bn:00008364n</annotation>
    </annotations>
  </sentence>
  <sentence id="1">
    <text lang="en">The bank lent money to the plant workers</text>
    <annotations>
      <annotation lang="en" anchor="bank" lemma="bank" type="BABELFY">bn:00008364n</annotation>
      <annotation lang="en" anchor="plant" lemma="plant" type="BABELFY">bn:00046568n</annotation>
    </annotations>
  </sentence>
  <sentence id="2">
    <text lang="de">Nur Deutsch hier</text>
    <annotations>
    </annotations>
  </sentence>
</corpus>"#;

    #[test]
    fn pipeline_from_raw_dump_to_evaluation() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw.xml");
        let reduced = dir.path().join("reduced.xml");
        let sentences = dir.path().join("sentences.txt");
        fs::write(&raw, RAW).unwrap();

        let mapping = dir.path().join("bn2wn_mapping.txt");
        fs::write(&mapping, "bn:00008364n\t00008364n\nbn:00046568n\t00046568n\n").unwrap();
        let mapping = Dictionary::read(&mapping).unwrap();

        eurosense::filter_language(&raw, &reduced, "en").unwrap();
        eurosense::write_sentences(&reduced, &sentences, &mapping, None).unwrap();

        let content = fs::read_to_string(&sentences).unwrap();
        assert!(content.contains("bank_bn:00008364n"));
        assert!(content.contains("plant_bn:00046568n"));
        assert!(!content.contains("eingezahlt"));

        let word_map = word_synset_map(&[&sentences], &mapping).unwrap();
        assert_eq!(
            word_map.get("bank"),
            Some(&["bn:00008364n".to_string()][..])
        );

        let loader = SentenceLoader::new(&[&sentences], CleanOptions::default());
        let options = TrainOptions {
            dim: 8,
            window: 2,
            min_count: 1,
            epochs: 3,
            ..TrainOptions::default()
        };
        let model = train(&loader, &options).unwrap();

        let vectors = dir.path().join("embeddings.vec");
        model.to_embeddings().write(&vectors).unwrap();
        let embeddings = Embeddings::read(&vectors).unwrap();
        assert!(embeddings.contains("bank_bn:00008364n"));

        let clean = dir.path().join("embeddings_clean.vec");
        clean_embeddings(&vectors, &clean).unwrap();
        let cleaned = Embeddings::read(&clean).unwrap();
        assert!(cleaned.tokens().all(|token| token.contains("_bn:")));
        assert!(cleaned.contains("plant_bn:00046568n"));

        let gold = dir.path().join("gold.tab");
        fs::write(&gold, "Word 1\tWord 2\tHuman (mean)\nbank\tplant\t3.0\nbank\tzebra\t1.0\n")
            .unwrap();
        let gold = read_gold(&gold).unwrap();

        let senses = build_sense_map(&embeddings);
        let evaluation = evaluate(&gold, &embeddings, &senses);
        assert_eq!(evaluation.pairs, 2);
        assert_eq!(evaluation.missing, 1);
    }
}
