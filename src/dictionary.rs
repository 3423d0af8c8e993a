//! Flat, line-oriented key → values mapping files.
//!
//! Both the BabelNet→WordNet mapping and the word→synset maps produced after
//! parsing use the same format: one entry per line, the key first, the values
//! after it, whitespace-separated on read and tab-joined on write. Read and
//! write are symmetric, so any dictionary round-trips losslessly.

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::Error;

/// A read-only mapping from a string key to one or more string values.
///
/// Absent keys mean "no mapping" and are a filter-out signal for the corpus
/// rewriters, never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    entries: HashMap<String, Vec<String>>,
}

impl Dictionary {
    pub fn new(entries: HashMap<String, Vec<String>>) -> Self {
        Dictionary { entries }
    }

    /// Reads a dictionary from a file, one `key value1 [value2 ...]` entry per line.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut entries = HashMap::new();
        for line in reader.lines() {
            let line = line?;
            let mut parts = line.split_whitespace();
            if let Some(key) = parts.next() {
                entries.insert(key.to_string(), parts.map(|x| x.to_string()).collect());
            }
        }

        Ok(Dictionary { entries })
    }

    /// Writes each entry as `key\tvalue1\tvalue2...\n`, all values tab-joined.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        for (key, values) in &self.entries {
            writer.write_all(key.as_bytes())?;
            for value in values {
                writer.write_all(b"\t")?;
                writer.write_all(value.as_bytes())?;
            }
            writer.write_all(b"\n")?;
        }

        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(|x| x.as_slice())
    }

    /// The values for `key`, treating an empty value list like an absent key.
    pub fn get_nonempty(&self, key: &str) -> Option<&[String]> {
        self.get(key).filter(|values| !values.is_empty())
    }

    /// The first value for `key`, if the key has any values at all.
    pub fn first_value(&self, key: &str) -> Option<&str> {
        self.get_nonempty(key).map(|values| values[0].as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Token suffix marking a sense-tagged token in a rewritten sentence file.
pub const SENSE_MARKER: &str = "_bn:";

/// Splits a sense-tagged token into `(lemma, synset)` at the last underscore.
///
/// Multiword lemmas keep their inner underscores: `new_york_bn:00041166n`
/// splits into `new_york` and `bn:00041166n`.
pub fn split_sense(token: &str) -> Option<(&str, &str)> {
    if !token.contains(SENSE_MARKER) {
        return None;
    }
    token.rfind('_').map(|i| (&token[..i], &token[i + 1..]))
}

/// Builds a word → synsets dictionary by scanning rewritten sentence files.
///
/// Only synsets present in the BabelNet→WordNet mapping are kept. Synset
/// lists are sorted so output is deterministic.
pub fn word_synset_map<P: AsRef<Path>>(
    paths: &[P],
    bn_wn_map: &Dictionary,
) -> Result<Dictionary, Error> {
    let mut map: HashMap<String, BTreeSet<String>> = HashMap::new();

    for path in paths {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        for line in reader.lines() {
            let line = line?;
            for token in line.split_whitespace() {
                let token = token.to_lowercase();
                if let Some((lemma, synset)) = split_sense(&token) {
                    if bn_wn_map.contains_key(synset) {
                        map.entry(lemma.to_string())
                            .or_insert_with(BTreeSet::new)
                            .insert(synset.to_string());
                    }
                }
            }
        }
    }

    Ok(Dictionary::new(
        map.into_iter()
            .map(|(k, v)| (k, v.into_iter().collect()))
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;
    use std::io::Write as _;

    fn tmp_path(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
        dir.path().join(name)
    }

    #[test]
    fn read_splits_key_and_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = tmp_path(&dir, "map.txt");
        std::fs::write(&path, "bn:00008364n\t08420278n\nbn:00008363n 09213565n extra\n").unwrap();

        let dict = Dictionary::read(&path).unwrap();
        assert_eq!(
            dict.get("bn:00008364n"),
            Some(&["08420278n".to_string()][..])
        );
        assert_eq!(
            dict.get("bn:00008363n"),
            Some(&["09213565n".to_string(), "extra".to_string()][..])
        );
        assert_eq!(dict.get("bn:missing"), None);
    }

    #[test]
    fn multi_value_entries_survive_a_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = tmp_path(&dir, "dict.txt");

        let mut entries = HashMap::new();
        entries.insert(
            "bank".to_string(),
            vec!["bn:00008364n".to_string(), "bn:00008363n".to_string()],
        );
        entries.insert("plant".to_string(), vec!["bn:00046568n".to_string()]);
        let dict = Dictionary::new(entries);

        dict.write(&path).unwrap();
        assert_eq!(Dictionary::read(&path).unwrap(), dict);
    }

    #[quickcheck]
    fn round_trip_law(raw: Vec<(String, Vec<String>)>) -> bool {
        // keys and values are whitespace-free in the on-disk format
        let sanitize = |s: &String| {
            let t: String = s
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == ':')
                .collect();
            if t.is_empty() {
                None
            } else {
                Some(t)
            }
        };

        let entries: HashMap<String, Vec<String>> = raw
            .iter()
            .filter_map(|(k, vs)| {
                sanitize(k).map(|k| (k, vs.iter().filter_map(sanitize).collect::<Vec<_>>()))
            })
            .collect();
        let dict = Dictionary::new(entries);

        let dir = tempfile::tempdir().unwrap();
        let path = tmp_path(&dir, "roundtrip.txt");
        dict.write(&path).unwrap();
        Dictionary::read(&path).unwrap() == dict
    }

    #[test]
    fn word_synset_map_groups_senses_by_lemma() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = tmp_path(&dir, "sentences.txt");
        let mut file = File::create(&corpus).unwrap();
        writeln!(
            file,
            "i deposited money in the bank_bn:00008364n yesterday ."
        )
        .unwrap();
        writeln!(file, "the bank_bn:00008363n of the river Plant_bn:00046568n").unwrap();
        writeln!(file, "unmapped_bn:99999999n stays out").unwrap();
        drop(file);

        let mut mapping = HashMap::new();
        for synset in &["bn:00008364n", "bn:00008363n", "bn:00046568n"] {
            mapping.insert(synset.to_string(), vec!["x".to_string()]);
        }
        let bn_wn_map = Dictionary::new(mapping);

        let map = word_synset_map(&[&corpus], &bn_wn_map).unwrap();
        assert_eq!(
            map.get("bank"),
            Some(&["bn:00008363n".to_string(), "bn:00008364n".to_string()][..])
        );
        // lowercased before grouping
        assert_eq!(map.get("plant"), Some(&["bn:00046568n".to_string()][..]));
        assert_eq!(map.get("unmapped"), None);
    }

    #[test]
    fn split_sense_keeps_multiword_lemmas_together() {
        assert_eq!(
            split_sense("new_york_bn:00041166n"),
            Some(("new_york", "bn:00041166n"))
        );
        assert_eq!(split_sense("plain"), None);
    }
}
