//! Streaming corpus processing: language filtering and annotation-to-sense rewriting.
//!
//! Both supported corpora (EuroSense sentence dumps, SEW wiki-article trees)
//! share one contract: each corpus element yields a single output line in which
//! every valid annotation's anchor has been replaced by a `lemma_sense` token,
//! or an empty line when the element carries no text.

use crate::dictionary::Dictionary;

pub mod eurosense;
pub mod sew;

/// How many elements between progress log lines during long corpus walks.
pub(crate) const PROGRESS_INTERVAL: usize = 100_000;

/// One annotation of a corpus element: an anchor span in the element's raw
/// text, the annotated lemma and its sense identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub anchor: String,
    pub lemma: String,
    pub sense: String,
}

impl Annotation {
    pub fn new<S: Into<String>>(anchor: S, lemma: S, sense: S) -> Self {
        Annotation {
            anchor: anchor.into(),
            lemma: lemma.into(),
            sense: sense.into(),
        }
    }
}

/// Lowercases a lemma and joins its parts with underscores.
pub fn normalize_lemma(lemma: &str) -> String {
    lemma.to_lowercase().replace(' ', "_").replace('-', "_")
}

/// Replaces the first occurrence of `anchor + " "` in `text` with
/// `normalized_lemma + "_" + sense + " "`.
///
/// Annotations are applied in source order, so with a repeated anchor the
/// earlier annotation consumes the earlier occurrence and a later annotation
/// picks up the next remaining one. Text without the anchor is returned
/// unchanged.
pub fn replace_sense(text: &str, annotation: &Annotation) -> String {
    let pattern = format!("{} ", annotation.anchor);

    match text.find(&pattern) {
        Some(start) => {
            let mut out = String::with_capacity(text.len() + annotation.sense.len() + 1);
            out.push_str(&text[..start]);
            out.push_str(&normalize_lemma(&annotation.lemma));
            out.push('_');
            out.push_str(&annotation.sense);
            out.push(' ');
            out.push_str(&text[start + pattern.len()..]);
            out
        }
        None => text.to_string(),
    }
}

/// Rewrites every annotation whose sense is a key of the BabelNet→WordNet
/// mapping; the rest leave the text untouched.
pub fn rewrite(text: &str, annotations: &[Annotation], bn_wn_map: &Dictionary) -> String {
    let mut text = text.to_string();
    for annotation in annotations {
        if bn_wn_map.get_nonempty(&annotation.sense).is_some() {
            text = replace_sense(&text, annotation);
        }
    }
    text
}
