use std::path::PathBuf;
use std::process;

use clap::Parser;

use sensembed::dictionary::Dictionary;
use sensembed::embeddings::Embeddings;
use sensembed::score::{build_sense_map, evaluate, read_gold};
use sensembed::Error;

/// Scores sense embeddings against human similarity judgments.
#[derive(Parser)]
#[clap(version, name = "score")]
struct Opts {
    /// Path to the embeddings.
    input: PathBuf,
    /// Path to the test file with gold scores.
    test: PathBuf,
    /// Path to the word -> senses map; derived from the embedding vocabulary
    /// when absent.
    #[clap(long)]
    map: Option<PathBuf>,
}

fn run(opts: &Opts) -> Result<(), Error> {
    let embeddings = Embeddings::read(&opts.input)?;
    let senses = match &opts.map {
        Some(path) => Dictionary::read(path)?,
        None => build_sense_map(&embeddings),
    };
    let gold = read_gold(&opts.test)?;

    let evaluation = evaluate(&gold, &embeddings, &senses);
    println!("Missing words: {}", evaluation.missing);
    println!(
        "Spearman correlation over {} pairs: {:.4}",
        evaluation.pairs, evaluation.correlation
    );

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
