use std::path::PathBuf;
use std::process;

use clap::Parser;

use sensembed::embeddings::Embeddings;
use sensembed::visualization::{plot_clusters, DEFAULT_TOP_K};
use sensembed::Error;

// demo senses with clearly distinct meanings per lemma
const DEFAULT_SENSES: &[&str] = &[
    "bank_bn:00008363n",
    "bank_bn:00008364n",
    "number_bn:00058286n",
    "number_bn:00001079n",
    "plant_bn:00046568n",
    "plant_bn:00035324n",
];

/// Plots sense-embedding neighborhoods as 2D scatter clusters.
#[derive(Parser)]
#[clap(version, name = "plot")]
struct Opts {
    /// Path to the embeddings.
    input: PathBuf,
    /// Seed senses to plot; a demo set of ambiguous lemmas when absent.
    senses: Vec<String>,
    /// Path of the SVG to write.
    #[clap(short, default_value = "clusters.svg")]
    output: PathBuf,
    /// Number of most similar senses per cluster.
    #[clap(long = "top-k", default_value_t = DEFAULT_TOP_K)]
    top_k: usize,
}

fn run(opts: &Opts) -> Result<(), Error> {
    let embeddings = Embeddings::read(&opts.input)?;

    let senses = if opts.senses.is_empty() {
        DEFAULT_SENSES.iter().map(|s| s.to_string()).collect()
    } else {
        opts.senses.clone()
    };

    plot_clusters(&embeddings, &senses, opts.top_k, &opts.output)
}

fn main() {
    env_logger::init();
    let opts = Opts::parse();

    if let Err(err) = run(&opts) {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}
