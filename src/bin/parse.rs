use std::path::PathBuf;
use std::process;

use clap::Parser;

use sensembed::corpus::{eurosense, sew};
use sensembed::dictionary::{word_synset_map, Dictionary};
use sensembed::wordnet::WordNet;
use sensembed::Error;

/// Rewrites a sense-tagged XML corpus into flat sense-tagged sentence files.
#[derive(Parser)]
#[clap(version, name = "parse")]
struct Opts {
    /// Corpus kind to parse, es=EuroSense, sew=SEW.
    corpus: String,
    /// Path of the corpus (an XML file for es, a directory for sew).
    #[clap(short)]
    input: PathBuf,
    /// Path where to save the parsed file.
    #[clap(short)]
    output: PathBuf,
    /// Path where to also save the word -> synsets dictionary built from the output.
    #[clap(short)]
    model: Option<PathBuf>,
    /// BabelNet -> WordNet mapping file.
    #[clap(long, default_value = "resources/mapping/bn2wn_mapping.txt")]
    map: PathBuf,
    /// Check whether the synset is correct for the given lemma (EuroSense only).
    #[clap(long = "check-synset", requires = "wordnet")]
    check_synset: bool,
    /// WordNet dict directory, used by --check-synset and for SEW lemmatization.
    #[clap(long)]
    wordnet: Option<PathBuf>,
    /// Run the streaming language filter over a raw EuroSense dump instead of
    /// rewriting, keeping only this language.
    #[clap(long = "filter-lang")]
    filter_lang: Option<String>,
}

fn run(opts: &Opts) -> Result<(), Error> {
    match opts.corpus.as_str() {
        "es" => {
            if let Some(lang) = &opts.filter_lang {
                return eurosense::filter_language(&opts.input, &opts.output, lang);
            }

            let map = Dictionary::read(&opts.map)?;
            let wordnet = match (&opts.check_synset, &opts.wordnet) {
                (true, Some(dir)) => Some(WordNet::load(dir)?),
                _ => None,
            };
            eurosense::write_sentences(&opts.input, &opts.output, &map, wordnet.as_ref())?;
            write_word_map(opts, &map)
        }
        "sew" => {
            let map = Dictionary::read(&opts.map)?;
            let wordnet = match &opts.wordnet {
                Some(dir) => Some(WordNet::load(dir)?),
                None => None,
            };
            sew::write_sentences(&opts.input, &opts.output, &map, wordnet.as_ref())?;
            write_word_map(opts, &map)
        }
        other => {
            eprintln!(
                "Corpus '{}' not available. Use 'es' for EuroSense or 'sew' for SEW.",
                other
            );
            Ok(())
        }
    }
}

fn write_word_map(opts: &Opts, map: &Dictionary) -> Result<(), Error> {
    if let Some(path) = &opts.model {
        word_synset_map(&[&opts.output], map)?.write(path)?;
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let opts = Opts::parse();

    if let Err(err) = run(&opts) {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}
