//! Causa CLI - simulate data, search for a causal graph and score it
//!
//! Usage:
//!   causa                                     # PC on a 5-node linear SEM
//!   causa --algorithm hill-climb --nodes 10   # Score-based search
//!   causa --resamples 50 --ensemble majority  # Bootstrap and aggregate
//!   causa --tier X1,X2 --tier X3 -o json      # Tiered knowledge, JSON output
//!
//! Set `RUST_LOG=causa_core=debug` for search traces.

use std::process;

use causa_core::knowledge::Knowledge;
use causa_core::metrics::StatisticRegistry;
use causa_core::resampling::{EdgeEnsemble, ResamplingConfig, ResamplingMethod, ResamplingSearch};
use causa_core::search::{AlgorithmRegistry, ScoreChoice, TestChoice};
use causa_core::simulation::{LinearSemSimulation, Simulation, SimulationConfig};
use causa_core::{CausalError, Graph};
use clap::{Parser, ValueEnum};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "causa")]
#[command(version)]
#[command(about = "Causa - simulate, search and score causal graphs")]
struct Cli {
    /// Number of simulated variables
    #[arg(long, default_value_t = 5)]
    nodes: usize,

    /// Number of edges in the random true DAG
    #[arg(long, default_value_t = 5)]
    edges: usize,

    /// Rows of simulated data
    #[arg(long, default_value_t = 1000)]
    samples: usize,

    /// Seed for simulation and resampling
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Registered algorithm name
    #[arg(short, long, default_value = "pc")]
    algorithm: String,

    /// Significance level of the Fisher-Z test
    #[arg(long, default_value_t = 0.01)]
    alpha: f64,

    /// Penalty discount of the SEM BIC score
    #[arg(long, default_value_t = 1.0)]
    penalty: f64,

    /// Number of resampled searches; 0 searches the data once
    #[arg(long, default_value_t = 0)]
    resamples: usize,

    #[arg(long, value_enum, default_value = "bootstrap")]
    method: Method,

    /// Resample size as a percentage of the rows
    #[arg(long, default_value_t = 100.0)]
    percent: f64,

    /// Also search the full data set when resampling
    #[arg(long)]
    add_original: bool,

    #[arg(long, value_enum, default_value = "majority")]
    ensemble: Ensemble,

    /// Edge frequency needed by the threshold ensemble
    #[arg(long, default_value_t = 0.5)]
    threshold: f64,

    /// Comma-separated tier members, earliest tier first; `*` wildcards allowed
    #[arg(long = "tier", value_name = "VARS")]
    tiers: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    output: Output,

    /// List registered algorithms and exit
    #[arg(long)]
    list_algorithms: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Method {
    Bootstrap,
    Subsample,
}

#[derive(Clone, Copy, ValueEnum)]
enum Ensemble {
    Preserved,
    Highest,
    Majority,
    Threshold,
}

#[derive(Clone, Copy, PartialEq, ValueEnum)]
enum Output {
    Summary,
    Json,
}

struct Report {
    truth: Graph,
    estimated: Graph,
    resampling: Option<ResamplingConfig>,
    dropped: usize,
    violates_knowledge: bool,
    statistics: Vec<(String, f64)>,
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let registry = AlgorithmRegistry::with_builtins();

    if cli.list_algorithms {
        for name in registry.names() {
            if let Some(d) = registry.descriptor(name) {
                println!("  {:<12} {}", d.name, d.description);
            }
        }
        return;
    }

    match run(&cli, &registry) {
        Ok(report) => match cli.output {
            Output::Json => match serde_json::to_string_pretty(&format_report(&report)) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error serializing to JSON: {}", e);
                    process::exit(1);
                }
            },
            Output::Summary => print_summary(&cli, &report),
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run(cli: &Cli, registry: &AlgorithmRegistry) -> Result<Report, CausalError> {
    let mut simulation = LinearSemSimulation::new(SimulationConfig {
        num_nodes: cli.nodes,
        num_edges: cli.edges,
        sample_size: cli.samples,
        seed: cli.seed,
        ..SimulationConfig::default()
    });
    simulation.create_data()?;
    let (Some(data), Some(truth)) = (simulation.data_set(0), simulation.true_graph(0)) else {
        return Err(CausalError::Internal("simulation produced no data".into()));
    };

    let knowledge = tiered_knowledge(&cli.tiers, &data.nodes())?;
    let test = TestChoice::FisherZ { alpha: cli.alpha };
    let score = ScoreChoice::SemBic {
        penalty_discount: cli.penalty,
    };
    let algorithm = registry.build(&cli.algorithm, Some(&test), Some(&score))?;
    info!(algorithm = algorithm.name(), rows = data.num_rows(), "searching");

    let (estimated, resampling, dropped) = if cli.resamples == 0 {
        (algorithm.search(data, &knowledge)?, None, 0)
    } else {
        let config = ResamplingConfig {
            method: match cli.method {
                Method::Bootstrap => ResamplingMethod::Bootstrap,
                Method::Subsample => ResamplingMethod::Subsample,
            },
            num_resamples: cli.resamples,
            percent_resample_size: cli.percent,
            add_original_dataset: cli.add_original,
            seed: cli.seed,
        };
        let result = ResamplingSearch::new(config.clone()).run(algorithm.as_ref(), data, &knowledge)?;
        let ensemble = match cli.ensemble {
            Ensemble::Preserved => EdgeEnsemble::Preserved,
            Ensemble::Highest => EdgeEnsemble::Highest,
            Ensemble::Majority => EdgeEnsemble::Majority,
            Ensemble::Threshold => EdgeEnsemble::Threshold(cli.threshold),
        };
        (result.aggregate(ensemble), Some(config), result.dropped)
    };

    let statistics = StatisticRegistry::with_builtins().compare(truth, &estimated);
    Ok(Report {
        truth: truth.clone(),
        violates_knowledge: knowledge.is_violated_by(&estimated),
        estimated,
        resampling,
        dropped,
        statistics,
    })
}

fn tiered_knowledge(tiers: &[String], nodes: &[causa_core::Node]) -> Result<Knowledge, CausalError> {
    let mut knowledge = Knowledge::with_variables(nodes.iter().map(|n| n.name()))?;
    for (tier, spec) in tiers.iter().enumerate() {
        for name in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            knowledge.add_to_tier(tier, name)?;
        }
    }
    Ok(knowledge)
}

fn print_summary(cli: &Cli, report: &Report) {
    println!(
        "✓ {} on {} variables, {} rows\n",
        cli.algorithm, cli.nodes, cli.samples
    );
    println!("True graph:\n{}\n", report.truth);
    println!("Estimated graph:\n{}\n", report.estimated);

    if let Some(config) = &report.resampling {
        println!(
            "Resampling: {} x {:?} at {}%, {} dropped\n",
            config.num_resamples, config.method, config.percent_resample_size, report.dropped
        );
    }
    if report.violates_knowledge {
        println!("! Estimated graph violates the supplied knowledge\n");
    }

    println!("Statistics ({}):", report.statistics.len());
    for (name, value) in &report.statistics {
        println!("  {:<16} {:.4}", name, value);
    }
}

fn format_report(report: &Report) -> serde_json::Value {
    let edges = |g: &Graph| -> Vec<serde_json::Value> {
        g.edges()
            .iter()
            .map(|e| {
                json!({
                    "edge": e.to_string(),
                    "probability": e.probability(),
                })
            })
            .collect()
    };
    let statistics: serde_json::Map<String, serde_json::Value> = report
        .statistics
        .iter()
        .map(|(name, value)| {
            // NaN has no JSON form.
            let value = if value.is_nan() { json!(null) } else { json!(value) };
            (name.clone(), value)
        })
        .collect();

    json!({
        "true_graph": {
            "nodes": report.truth.node_names(),
            "edges": edges(&report.truth),
        },
        "estimated_graph": {
            "nodes": report.estimated.node_names(),
            "edges": edges(&report.estimated),
        },
        "resampling": report.resampling.as_ref().and_then(|c| serde_json::to_value(c).ok()),
        "dropped": report.dropped,
        "violates_knowledge": report.violates_knowledge,
        "statistics": statistics,
    })
}
