use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use log::info;

use sensembed::embeddings::{clean_embeddings, train, TrainOptions};
use sensembed::sentences::{CleanOptions, SentenceLoader};
use sensembed::Error;

/// Trains sense embeddings over one or more sentence corpora.
#[derive(Parser)]
#[clap(version, name = "train")]
struct Opts {
    /// Paths to the corpora.
    #[clap(required = true)]
    input: Vec<PathBuf>,
    /// Path where to save the embeddings file.
    #[clap(short)]
    output: PathBuf,
    /// Model implementation, w2v=Word2Vec, ft=FastText.
    #[clap(short, default_value = "w2v")]
    model: String,
    /// Path where to save the model file.
    #[clap(long = "model_path")]
    model_path: Option<PathBuf>,
    /// Ignores all words with total frequency lower than this.
    #[clap(long = "min-count", default_value_t = 3)]
    min_count: u64,
    /// Number of iterations over the corpus.
    #[clap(long, default_value_t = 5)]
    iter: usize,
    /// Dimensionality of the feature vectors.
    #[clap(long, default_value_t = 400)]
    size: usize,
}

/// `embeddings.vec` -> `embeddings_clean.vec`, next to the original.
fn clean_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("embeddings");
    match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => path.with_file_name(format!("{}_clean.{}", stem, ext)),
        None => path.with_file_name(format!("{}_clean", stem)),
    }
}

fn run(opts: &Opts) -> Result<(), Error> {
    let kind = match opts.model.parse() {
        Ok(kind) => kind,
        Err(err) => {
            // configuration error: report and stop cleanly
            eprintln!("{}", err);
            return Ok(());
        }
    };

    let loader = SentenceLoader::new(&opts.input, CleanOptions::default());
    let options = TrainOptions {
        model: kind,
        min_count: opts.min_count,
        epochs: opts.iter,
        dim: opts.size,
        ..TrainOptions::default()
    };

    let model = train(&loader, &options)?;

    info!("Saving vectors to {}.", opts.output.display());
    model.to_embeddings().write(&opts.output)?;
    clean_embeddings(&opts.output, clean_path(&opts.output))?;

    if let Some(path) = &opts.model_path {
        info!("Saving model to {}.", path.display());
        model.write(path)?;
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
