//! SEW: walks a tree of wiki-article XML files and rewrites them into
//! sense-tagged lines.
//!
//! SEW files are small but there are millions of them, and some are malformed.
//! A file that fails to parse is logged and dropped; the walk never aborts.

use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::mem;
use std::path::Path;

use log::{info, warn};
use quick_xml::events::Event;
use quick_xml::Reader;
use walkdir::WalkDir;

use super::{rewrite, Annotation, PROGRESS_INTERVAL};
use crate::dictionary::Dictionary;
use crate::wordnet::WordNet;
use crate::Error;

/// One parsed wiki article.
#[derive(Default)]
struct Article {
    language: String,
    text: Option<String>,
    annotations: Vec<Annotation>,
}

/// Walks `**/*.xml` under `root_dir` and writes one sense-tagged line per
/// English article. Anchors are lemmatized with morphy (keyed on the sense
/// id's POS letter) when a WordNet database is supplied, otherwise the anchor
/// itself is used as the lemma.
pub fn write_sentences<P: AsRef<Path>, Q: AsRef<Path>>(
    root_dir: P,
    output: Q,
    bn_wn_map: &Dictionary,
    wordnet: Option<&WordNet>,
) -> Result<(), Error> {
    let file = File::create(output)?;
    let mut out = BufWriter::new(file);
    let mut count = 0usize;

    for entry in WalkDir::new(root_dir) {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        if !entry.file_type().is_file()
            || entry.path().extension().map_or(true, |ext| ext != "xml")
        {
            continue;
        }

        let article = match parse_article(entry.path()) {
            Ok(article) => article,
            Err(err) => {
                warn!("Skipping {}: {}", entry.path().display(), err);
                continue;
            }
        };
        if article.language != "EN" {
            continue;
        }

        out.write_all(rewrite_article(&article, bn_wn_map, wordnet).as_bytes())?;
        out.write_all(b"\n")?;

        count += 1;
        if count % PROGRESS_INTERVAL == 0 {
            info!("Rewrote {} articles.", count);
        }
    }

    info!("Done. {} articles rewritten.", count);
    Ok(())
}

fn rewrite_article(article: &Article, bn_wn_map: &Dictionary, wordnet: Option<&WordNet>) -> String {
    let text = match article.text.as_deref() {
        Some(text) if !text.is_empty() => text.replace('\n', ""),
        _ => return String::new(),
    };

    let annotations: Vec<Annotation> = article
        .annotations
        .iter()
        .filter(|a| bn_wn_map.get_nonempty(&a.sense).is_some())
        .map(|a| {
            let lemma = match (wordnet, a.sense.chars().last()) {
                (Some(wordnet), Some(pos)) => wordnet.morphy(&a.anchor, pos),
                _ => a.anchor.clone(),
            };
            Annotation::new(a.anchor.clone(), lemma, a.sense.clone())
        })
        .collect();

    rewrite(&text, &annotations, bn_wn_map)
}

/// Parses one `wikiArticle` file: the root's `language` attribute, the `text`
/// element and the `babelNetID`/`mention` children of each `annotation`.
fn parse_article(path: &Path) -> Result<Article, Error> {
    let mut reader = Reader::from_file(path)?;
    reader.trim_text(true);

    let mut article = Article::default();
    let mut buf = Vec::new();

    // fields of the annotation currently being read
    let mut in_annotation = false;
    let mut sense = String::new();
    let mut mention = String::new();
    let mut capture: Option<&'static str> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"wikiArticle" => {
                    for attr in e.attributes() {
                        let attr = attr?;
                        if attr.key.as_ref() == b"language" {
                            article.language = attr.unescape_value()?.into_owned();
                        }
                    }
                }
                b"text" if !in_annotation => {
                    article.text.get_or_insert_with(String::new);
                    capture = Some("text");
                }
                b"annotation" => {
                    in_annotation = true;
                    sense.clear();
                    mention.clear();
                }
                b"babelNetID" if in_annotation => capture = Some("sense"),
                b"mention" if in_annotation => capture = Some("mention"),
                _ => capture = None,
            },
            Event::Text(t) => {
                let value = t.unescape()?;
                match capture {
                    Some("text") => {
                        if let Some(text) = article.text.as_mut() {
                            text.push_str(&value);
                        }
                    }
                    Some("sense") => sense.push_str(&value),
                    Some("mention") => mention.push_str(&value),
                    _ => {}
                }
            }
            Event::End(e) => {
                capture = None;
                if e.name().as_ref() == b"annotation" {
                    in_annotation = false;
                    article.annotations.push(Annotation {
                        anchor: mem::take(&mut mention),
                        lemma: String::new(),
                        sense: mem::take(&mut sense),
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(article)
}
