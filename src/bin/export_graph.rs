use std::time::Instant;

use anyhow::Result;
use clap::Parser;

use sense_graph::similarity;

#[derive(Parser, Debug)]
#[clap(
    name = "export-graph",
    about = "Exports the top-n cosine similarity graph for a token vector matrix"
)]
struct Cli {
    /// Path to the binary token vector matrix
    #[clap(long)]
    vectors: String,

    /// Path for the output graph file
    #[clap(long)]
    output: String,

    /// Number of nearest neighbors to keep per token
    #[clap(long, default_value = "200")]
    neighbors: usize,

    /// Number of tokens per similarity batch
    #[clap(long, default_value = "500")]
    batch_size: usize,

    /// Export raw vectors without L2-normalizing each row first
    #[clap(long)]
    skip_normalize: bool,

    /// Number of worker threads (0 = use all available cores)
    #[clap(long, default_value = "0")]
    threads: usize,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

fn main() {
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            std::process::exit(1);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(args: Cli) -> Result<()> {
    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    let num_threads = if args.threads > 0 {
        args.threads
    } else {
        num_cpus::get()
    };
    log::info!("using {} worker threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    let mut vectors = similarity::read_vectors(&args.vectors)?;
    log::info!(
        "loaded {} vectors of dimension {}",
        vectors.nrows(),
        vectors.ncols()
    );
    if !args.skip_normalize {
        similarity::normalize_rows(&mut vectors);
    }

    let started = Instant::now();
    let edges = similarity::nearest_neighbor_edges(&vectors, args.neighbors, args.batch_size);
    log::info!(
        "computed {} edges in {:.1}s",
        edges.len(),
        started.elapsed().as_secs_f32()
    );

    similarity::write_edge_file(&args.output, &edges)?;
    log::info!("graph written to {}", args.output);

    Ok(())
}
