use anyhow::Result;
use clap::Parser;

use sense_graph::cluster::pipeline;
use sense_graph::config::WhispersConfig;
use sense_graph::graph::loader;
use sense_graph::stats;

#[derive(Parser, Debug)]
#[clap(
    name = "cluster-senses",
    about = "Chinese Whispers sense induction over a token similarity graph"
)]
struct Cli {
    /// Path to the input graph binary file
    #[clap(long)]
    graph: String,

    /// Path for the output cluster file
    #[clap(long)]
    output: String,

    /// Maximum number of neighbors to consider for each token
    #[clap(long, default_value = "200")]
    max_edges: usize,

    /// Maximum number of edges each neighbor can contribute to an ego network
    #[clap(long, default_value = "200")]
    max_connectivity: usize,

    /// Maximum number of label propagation sweeps per token
    #[clap(long, default_value = "100")]
    max_iterations: usize,

    /// Minimum size for each cluster
    #[clap(long, default_value = "5")]
    min_cluster: usize,

    /// Number of worker threads
    #[clap(long, default_value = "4")]
    num_workers: usize,

    /// Fixed RNG seed for reproducible partitions
    #[clap(long)]
    seed: Option<u64>,

    /// Optional path for a JSON run summary
    #[clap(long)]
    summary: Option<String>,

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

    let config = WhispersConfig {
        max_edges: args.max_edges,
        max_connectivity: args.max_connectivity,
        max_iterations: args.max_iterations,
        min_cluster: args.min_cluster,
        seed: args.seed,
    };

    log::info!("max edges: {}", config.max_edges);
    log::info!("max connectivity: {}", config.max_connectivity);
    log::info!("max iterations: {}", config.max_iterations);
    log::info!("min cluster size: {}", config.min_cluster);
    log::info!("num workers: {}", args.num_workers);

    log::info!("loading {}", args.graph);
    let graph = loader::load_graph(&args.graph)?;
    log::info!("total nodes: {}", graph.size());

    let totals = pipeline::run(&graph, &config, args.num_workers, &args.output)?;
    log::info!(
        "wrote {} clusters for {} tokens in {:.1}s",
        totals.clusters,
        totals.nodes,
        totals.elapsed_secs
    );

    if let Some(path) = &args.summary {
        stats::save_summary(path, &graph, &config, &totals)?;
    }

    Ok(())
}
