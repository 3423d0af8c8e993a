//! Minimal index over the canonical WordNet `data.*` database files.
//!
//! Two consumers: the EuroSense `--check-synset` validation needs the lemma
//! names of a synset given its `offset+pos` code, and the SEW rewriter needs a
//! morphy-style base form for anchors. Everything else in the database files
//! (pointers, glosses, frames) is skipped.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::info;

use crate::Error;

const DATA_FILES: [(&str, char); 4] = [
    ("data.noun", 'n'),
    ("data.verb", 'v'),
    ("data.adj", 'a'),
    ("data.adv", 'r'),
];

// Morphy suffix detachment rules, (suffix, replacement) pairs per POS.
const NOUN_RULES: [(&str, &str); 9] = [
    ("s", ""),
    ("ses", "s"),
    ("ves", "f"),
    ("xes", "x"),
    ("zes", "z"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("men", "man"),
    ("ies", "y"),
];
const VERB_RULES: [(&str, &str); 8] = [
    ("s", ""),
    ("ies", "y"),
    ("es", "e"),
    ("es", ""),
    ("ed", "e"),
    ("ed", ""),
    ("ing", "e"),
    ("ing", ""),
];
const ADJ_RULES: [(&str, &str); 4] = [("er", ""), ("est", ""), ("er", "e"), ("est", "e")];

/// Synset lemma names indexed by `(pos, offset)`, plus a per-POS lemma set
/// for morphy lookups.
pub struct WordNet {
    synsets: HashMap<(char, u32), Vec<String>>,
    lemmas: HashMap<char, HashSet<String>>,
}

impl WordNet {
    /// Loads the `data.{noun,verb,adj,adv}` files from a WordNet `dict` directory.
    pub fn load<P: AsRef<Path>>(dict_dir: P) -> Result<Self, Error> {
        let dict_dir = dict_dir.as_ref();
        let mut synsets = HashMap::new();
        let mut lemmas: HashMap<char, HashSet<String>> = HashMap::new();

        for (name, pos) in &DATA_FILES {
            let path = dict_dir.join(name);
            let file = File::open(&path)?;
            let reader = BufReader::new(file);

            for line in reader.lines() {
                let line = line?;
                // license header lines start with two spaces
                if line.starts_with("  ") || line.is_empty() {
                    continue;
                }

                let (offset, words) = parse_data_line(&line)
                    .ok_or_else(|| Error::WordNet(format!("bad line in {}: {}", name, line)))?;

                let lemma_set = lemmas.entry(*pos).or_insert_with(HashSet::new);
                for word in &words {
                    lemma_set.insert(word.to_lowercase());
                }
                synsets.insert((*pos, offset), words);
            }
        }

        info!("Loaded {} WordNet synsets.", synsets.len());
        Ok(WordNet { synsets, lemmas })
    }

    /// Lemma names of the synset identified by a code like `00008364n`
    /// (zero-padded byte offset, trailing POS letter).
    pub fn lemma_names(&self, code: &str) -> Option<&[String]> {
        let pos = normalize_pos(code.chars().last()?);
        let offset: u32 = code[..code.len() - 1].parse().ok()?;
        self.synsets.get(&(pos, offset)).map(|x| x.as_slice())
    }

    /// Morphy base form of `word` for the given POS letter.
    ///
    /// Tries the word itself against the lexicon, then each matching suffix
    /// detachment rule; falls back to the input unchanged when nothing matches.
    pub fn morphy(&self, word: &str, pos: char) -> String {
        let pos = normalize_pos(pos);
        let lower = word.to_lowercase();

        let lemma_set = match self.lemmas.get(&pos) {
            Some(set) => set,
            None => return word.to_string(),
        };
        if lemma_set.contains(&lower) {
            return lower;
        }

        let rules: &[(&str, &str)] = match pos {
            'n' => &NOUN_RULES,
            'v' => &VERB_RULES,
            'a' => &ADJ_RULES,
            _ => &[],
        };

        for (suffix, replacement) in rules {
            if let Some(stem) = lower.strip_suffix(suffix) {
                let candidate = format!("{}{}", stem, replacement);
                if lemma_set.contains(&candidate) {
                    return candidate;
                }
            }
        }

        word.to_string()
    }
}

fn normalize_pos(pos: char) -> char {
    // satellite adjectives live in data.adj
    if pos == 's' {
        'a'
    } else {
        pos
    }
}

/// Parses one synset line: `offset lex_filenum ss_type w_cnt word lex_id [...]`.
/// Word count is two hex digits; `(marker)` suffixes on words are stripped.
fn parse_data_line(line: &str) -> Option<(u32, Vec<String>)> {
    let mut parts = line.split_whitespace();

    let offset: u32 = parts.next()?.parse().ok()?;
    let _lex_filenum = parts.next()?;
    let _ss_type = parts.next()?;
    let w_cnt = usize::from_str_radix(parts.next()?, 16).ok()?;

    let mut words = Vec::with_capacity(w_cnt);
    for _ in 0..w_cnt {
        let word = parts.next()?;
        let _lex_id = parts.next()?;
        words.push(word.split('(').next().unwrap_or(word).to_string());
    }

    Some((offset, words))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    pub(crate) fn write_fixture(dir: &Path) {
        // trimmed-down data files in the canonical format
        let noun = "  1 This software and database is being provided to you\n\
            00008364 18 n 02 depository_financial_institution 0 bank 1 001 @ 00008000 n 0000 | a financial institution\n\
            00008363 17 n 01 bank 0 000 | sloping land beside a body of water\n\
            00046568 20 n 02 plant 0 works 0 000 | buildings for industrial labor\n\
            00010001 03 n 01 man 0 000 | an adult person\n";
        let verb = "00001740 29 v 02 breathe 0 respire 0 000 | draw air\n\
            00002000 30 v 01 deposit 0 000 | put into a bank account\n";
        let adj = "00300000 00 a 02 beautiful 0 pretty(p) 0 000 | delighting the senses\n";
        let adv = "00400000 02 r 01 yesterday 0 000 | on the day preceding today\n";

        for (name, content) in [
            ("data.noun", noun),
            ("data.verb", verb),
            ("data.adj", adj),
            ("data.adv", adv),
        ] {
            let mut file = File::create(dir.join(name)).unwrap();
            file.write_all(content.as_bytes()).unwrap();
        }
    }

    fn fixture() -> (tempfile::TempDir, WordNet) {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let wn = WordNet::load(dir.path()).unwrap();
        (dir, wn)
    }

    #[test]
    fn lemma_names_by_offset_and_pos() {
        let (_dir, wn) = fixture();

        assert_eq!(
            wn.lemma_names("00008364n"),
            Some(&["depository_financial_institution".to_string(), "bank".to_string()][..])
        );
        assert_eq!(wn.lemma_names("99999999n"), None);
        // markers are stripped, satellites resolve through data.adj
        assert_eq!(
            wn.lemma_names("00300000s"),
            Some(&["beautiful".to_string(), "pretty".to_string()][..])
        );
    }

    #[test]
    fn morphy_detaches_suffixes() {
        let (_dir, wn) = fixture();

        assert_eq!(wn.morphy("banks", 'n'), "bank");
        assert_eq!(wn.morphy("deposited", 'v'), "deposit");
        assert_eq!(wn.morphy("men", 'n'), "man");
        // already a base form
        assert_eq!(wn.morphy("Plant", 'n'), "plant");
        // nothing matches: input preserved
        assert_eq!(wn.morphy("qux", 'n'), "qux");
    }
}
