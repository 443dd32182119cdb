//! Living Map CLI: run analytics and layouts over a map snapshot file
//!
//! The snapshot is a JSON `{ "nodes": [...], "edges": [...] }` document.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use livingmap::layout::ForceDirectedOptions;
use livingmap::{
    apply_layout, calculate_all_metrics, calculate_metric, try_layout, BackgroundWorker, Dispatcher,
    EngineConfig, GraphMetrics, Layout, LayoutStrategy, MapData, MetricKind, Node,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "livingmap", version, about = "Living Map analytics and layout CLI")]
struct Cli {
    /// Engine configuration (.json, .yaml or .yml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute every metric, communities and heuristics
    Metrics {
        /// Map snapshot (JSON)
        file: PathBuf,
    },
    /// Compute a single centrality measure
    Metric {
        file: PathBuf,

        /// degree, betweenness, closeness, clustering or eigenvector
        #[arg(long)]
        kind: String,
    },
    /// Position every node with the chosen strategy
    Layout {
        file: PathBuf,

        /// circular, grid, radial, cluster or force-directed
        #[arg(long)]
        strategy: Option<String>,

        /// Force-directed iteration count (inferred when omitted)
        #[arg(long)]
        iterations: Option<usize>,

        /// Jitter / simulation seed
        #[arg(long)]
        seed: Option<u64>,

        /// Fail on layout errors instead of falling back to a grid
        #[arg(long)]
        strict: bool,
    },
    /// Metrics and layout together, offloading large graphs
    Analyze {
        file: PathBuf,

        #[arg(long)]
        strategy: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Metrics { file } => {
            let data = load_map(&file)?;
            let metrics = calculate_all_metrics(&data, &config.analytics)?;
            print_metrics(&metrics, &cli.format)
        }
        Commands::Metric { file, kind } => {
            let kind: MetricKind = kind.parse().map_err(anyhow::Error::msg)?;
            let data = load_map(&file)?;
            let values = calculate_metric(&data, kind, &config.analytics)?;
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&values)?),
                OutputFormat::Table => {
                    let mut table = new_table(&["Node", kind.as_str()]);
                    for (id, value) in &values {
                        table.add_row(vec![id.clone(), format!("{:.4}", value)]);
                    }
                    println!("{}", table);
                }
            }
            Ok(())
        }
        Commands::Layout {
            file,
            strategy,
            iterations,
            seed,
            strict,
        } => {
            let data = load_map(&file)?;
            let layout = build_layout(&config, strategy.as_deref(), iterations, seed)?;
            let nodes = position_nodes(&data, &layout, strict)?;
            print_nodes(&nodes, &cli.format)
        }
        Commands::Analyze { file, strategy } => {
            let data = load_map(&file)?;
            let layout = build_layout(&config, strategy.as_deref(), None, None)?;

            let worker = BackgroundWorker::spawn(config.offload.channel_capacity)?;
            let dispatcher = Dispatcher::new(&config, Arc::new(worker));
            let key = file.display().to_string();
            let metrics_key = format!("{}#metrics", key);
            let layout_key = format!("{}#layout", key);

            let (metrics, nodes) = tokio::join!(
                dispatcher.calculate_all_metrics(&metrics_key, data.clone()),
                dispatcher.layout(&layout_key, data, layout),
            );
            let (metrics, nodes) = (metrics?, nodes?);

            match cli.format {
                OutputFormat::Json => {
                    let doc = serde_json::json!({ "metrics": metrics, "nodes": nodes });
                    println!("{}", serde_json::to_string_pretty(&doc)?);
                    Ok(())
                }
                OutputFormat::Table => {
                    print_metrics(&metrics, &cli.format)?;
                    print_nodes(&nodes, &cli.format)
                }
            }
        }
    }
}

fn load_map(path: &Path) -> Result<MapData> {
    MapData::from_path(path).with_context(|| format!("reading map from {}", path.display()))
}

fn position_nodes(data: &MapData, layout: &Layout, strict: bool) -> Result<Vec<Node>> {
    if strict {
        Ok(try_layout(data, layout)?)
    } else {
        Ok(apply_layout(data, layout))
    }
}

fn build_layout(
    config: &EngineConfig,
    strategy: Option<&str>,
    iterations: Option<usize>,
    seed: Option<u64>,
) -> Result<Layout> {
    let strategy = match strategy {
        Some(name) => name.parse::<LayoutStrategy>().map_err(anyhow::Error::msg)?,
        None => config.layout.default_strategy,
    };
    let seed = seed.unwrap_or(config.layout.seed);

    if iterations.is_some() && strategy != LayoutStrategy::ForceDirected {
        bail!("--iterations only applies to the force-directed strategy");
    }

    Ok(match strategy {
        LayoutStrategy::ForceDirected => Layout::ForceDirected(ForceDirectedOptions {
            iterations,
            seed,
            ..ForceDirectedOptions::default()
        }),
        other => Layout::from_strategy(other, seed),
    })
}

fn print_metrics(metrics: &GraphMetrics, format: &OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(metrics)?);
        return Ok(());
    }

    let mut table = new_table(&[
        "Node",
        "Degree",
        "Betweenness",
        "Closeness",
        "Clustering",
        "Eigenvector",
    ]);
    for (id, m) in &metrics.nodes {
        table.add_row(vec![
            id.clone(),
            format!("{:.4}", m.degree_centrality),
            format!("{:.4}", m.betweenness_centrality),
            format!("{:.4}", m.closeness_centrality),
            format!("{:.4}", m.clustering_coefficient),
            format!("{:.4}", m.eigenvector_centrality),
        ]);
    }
    println!("{}", table);

    println!(
        "{} cluster(s), modularity {:.4}",
        metrics.clusters.len(),
        metrics.modularity
    );
    println!("Most central:   {}", metrics.most_central_nodes.join(", "));
    println!("Top clusters:   {}", metrics.most_connected_clusters.join(", "));
    println!("Bottlenecks:    {}", metrics.bottlenecks.join(", "));

    if !metrics.collaboration_opportunities.is_empty() {
        let mut pairs = new_table(&["Pair", "Score", "Reason"]);
        for opportunity in &metrics.collaboration_opportunities {
            pairs.add_row(vec![
                opportunity.node_ids.join(" / "),
                format!("{:.3}", opportunity.score),
                opportunity.reason.clone(),
            ]);
        }
        println!("{}", pairs);
    }
    Ok(())
}

fn print_nodes(nodes: &[Node], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(nodes)?),
        OutputFormat::Table => {
            let mut table = new_table(&["Node", "Type", "x", "y"]);
            for node in nodes {
                let (x, y) = node.position().unwrap_or((f64::NAN, f64::NAN));
                table.add_row(vec![
                    node.id.clone(),
                    node.node_type.to_string(),
                    format!("{:.2}", x),
                    format!("{:.2}", y),
                ]);
            }
            println!("{}", table);
            println!("{} node(s)", nodes.len());
        }
    }
    Ok(())
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header.to_vec());
    table
}
