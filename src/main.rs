use ahash::AHashSet;
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use scaffold_forge::utils::configuration::ConfigurationManager;
use scaffold_forge::utils::synthetic::{SyntheticGraphBuilder, SyntheticGraphConfig};
use scaffold_forge::{Extremity, ScaffoldPathSearcher, ScoredPath};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

#[derive(Parser)]
#[command(name = "scaffold-forge", version, about = "Linkage-graph path search for genome scaffolding")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SearchMode {
    /// Join separate scaffolds through small contigs
    Between,
    /// Close the gap between consecutive anchors as one scaffold
    Within,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the path search on a synthetic chained linkage graph
    Simulate {
        #[arg(long, default_value_t = 20)]
        contigs: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Expected stray links per contig
        #[arg(long, default_value_t = 0.3)]
        noise: f64,
        /// Every n-th contig stands in for a large scaffold
        #[arg(long, default_value_t = 5)]
        anchor_every: usize,
        #[arg(long, value_enum, default_value_t = SearchMode::Between)]
        mode: SearchMode,
        /// Override search.score_cutoff
        #[arg(long)]
        score_cutoff: Option<f64>,
        /// Override search.path_threshold
        #[arg(long)]
        path_threshold: Option<usize>,
        /// Run start nodes on the thread pool
        #[arg(long)]
        parallel: bool,
        /// Number of best records to print
        #[arg(long, default_value_t = 10)]
        top: usize,
        /// Emit the records as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut manager = match cli.config.as_deref() {
        Some(path) => ConfigurationManager::from_file(path)?,
        None => ConfigurationManager::new()?,
    };
    if cli.verbose {
        manager.config_mut().logging.level = "debug".to_string();
    }

    match cli.command {
        Commands::Config => {
            println!("{}", manager.to_toml()?);
        }
        Commands::Simulate {
            contigs,
            seed,
            noise,
            anchor_every,
            mode,
            score_cutoff,
            path_threshold,
            parallel,
            top,
            json,
        } => {
            if let Some(cutoff) = score_cutoff {
                manager.config_mut().search.score_cutoff = cutoff;
            }
            if let Some(threshold) = path_threshold {
                manager.config_mut().search.path_threshold = threshold;
            }
            if parallel {
                manager.config_mut().performance.parallel_extension = true;
            }
            manager.validate_configuration()?;
            manager.setup_logging()?;

            let layout = SyntheticGraphBuilder::new(SyntheticGraphConfig {
                contigs,
                noise,
                anchor_every,
                seed,
                ..SyntheticGraphConfig::default()
            })?
            .build()?;
            info!(
                "🧬 Synthetic linkage graph: {} contigs, {} anchors, {} edges",
                layout.graph.contig_count(),
                layout.anchors.len(),
                layout.graph.edge_count()
            );

            let config = manager.config();
            let searcher = ScaffoldPathSearcher::new(&layout.graph, config.search.clone());
            let started = Instant::now();

            let records = match mode {
                SearchMode::Between => {
                    let mut iter_nodes = layout.anchor_extremities();
                    let mut end: AHashSet<Extremity> = iter_nodes.iter().copied().collect();
                    let mut visited = AHashSet::new();

                    let outcome = if config.performance.parallel_extension {
                        searcher.extend_between_scaffolds_parallel(
                            &mut end,
                            &mut iter_nodes,
                            &mut visited,
                            config.performance.num_threads,
                        )?
                    } else {
                        searcher.extend_between_scaffolds(&mut end, &mut iter_nodes, &mut visited)?
                    };
                    outcome.records
                }
                SearchMode::Within => {
                    let mut visited: AHashSet<Extremity> =
                        layout.anchor_extremities().into_iter().collect();
                    let mut records = Vec::new();
                    for pair in layout.anchors.windows(2) {
                        let outcome = searcher.close_within_scaffold(
                            Extremity::right(pair[0]),
                            Extremity::left(pair[1]),
                            &mut visited,
                            config.search.max_path_length,
                        )?;
                        records.extend(outcome.records);
                    }
                    records
                }
            };

            if json {
                let best: Vec<&ScoredPath> = records.iter().rev().take(top).collect();
                println!("{}", serde_json::to_string_pretty(&best)?);
                return Ok(());
            }

            print_records(&records, top);
            println!(
                "⏱️  Search time: {:.3} seconds",
                started.elapsed().as_secs_f64()
            );
        }
    }

    Ok(())
}

fn print_records(records: &[ScoredPath], top: usize) {
    println!("{}", "✅ Path search completed".bright_green());
    println!("📊 {} scored paths", records.len());

    for record in records.iter().rev().take(top) {
        let path = record
            .path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        println!(
            "   score {:>8.3}  bad {:>6.1}  len {:>6}  {}",
            record.score,
            record.bad_link_weight,
            record.path_len,
            path.bright_cyan()
        );
    }
}
