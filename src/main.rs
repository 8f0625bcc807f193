use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::error;

use crate::analysis::analyze;
use crate::analysis::social::SocialGraph;
use crate::config::GeneratorConfig;
use crate::export::export_store;
use crate::generate::run_generation;
use crate::ingest::{CsvSources, load_csv};
use crate::store::memory::InMemoryStore;

pub mod analysis;
pub mod config;
pub mod core;
pub mod export;
pub mod generate;
pub mod ingest;
pub mod logging;
pub mod store;

const DEFAULT_TOP_K: usize = 10;
const DEFAULT_HOPS: usize = 2;

/// Deterministic synthetic social network generator.
#[derive(Debug, Parser)]
#[command(name = "socialgen", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a network into the in-memory store and report on it.
    Generate(GenerateArgs),
    /// Report on a previously exported network.
    Analyze(AnalyzeArgs),
}

#[derive(Debug, Args)]
struct GenerateArgs {
    /// JSON file with generator settings; flags override it.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long)]
    users: Option<u32>,
    /// Directory receiving users.csv, edges.csv and interactions.csv.
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top: usize,
    #[arg(long, default_value_t = DEFAULT_HOPS)]
    hops: usize,
}

#[derive(Debug, Args)]
struct AnalyzeArgs {
    #[arg(long)]
    edges: PathBuf,
    #[arg(long)]
    interactions: Option<PathBuf>,
    /// Users file; enables homophily against its `community` column.
    #[arg(long)]
    users: Option<PathBuf>,
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top: usize,
    #[arg(long, default_value_t = DEFAULT_HOPS)]
    hops: usize,
}

impl GenerateArgs {
    fn resolve_config(&self) -> anyhow::Result<GeneratorConfig> {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::from_json_file(path)?,
            None => GeneratorConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(users) = self.users {
            config.users = users;
        }
        Ok(config)
    }
}

fn run_generate(args: &GenerateArgs) -> anyhow::Result<()> {
    let config = args.resolve_config()?;
    let mut store = InMemoryStore::new();
    let report = run_generation(&config, &mut store).context("generation failed")?;

    println!(
        "seed {}: {} users in {} communities",
        config.seed,
        report.users(),
        report.community_sizes.len()
    );
    println!(
        "friend edges: {} of {} planned ({} saturated users)",
        report.friend_edges, report.edge_budget, report.saturated_users
    );
    println!(
        "follow edges: {} of {} requested",
        report.follow_edges, report.follows_requested
    );
    println!(
        "interactions: {} ({} self-directed draws skipped)",
        report.interactions, report.interactions_skipped
    );
    for (kind, sink) in report.sinks() {
        println!("{kind}: {sink}");
    }

    if let Some(dir) = &args.out {
        let stats = export_store(&store, dir)?;
        println!(
            "exported {} users, {} edges, {} interactions to {}",
            stats.users,
            stats.edges,
            stats.interactions,
            dir.display()
        );
    }

    let graph = SocialGraph::from_store(&store)?;
    println!("{}", analyze(&graph, args.top, args.hops));
    Ok(())
}

fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<()> {
    let loaded = load_csv(&CsvSources {
        edges: &args.edges,
        interactions: args.interactions.as_deref(),
        users: args.users.as_deref(),
    })?;
    println!(
        "rows parsed: {} edges, {} interactions, {} users ({} skipped)",
        loaded.edges.parsed,
        loaded.interactions.parsed,
        loaded.users.parsed,
        loaded.edges.skipped + loaded.interactions.skipped + loaded.users.skipped
    );

    let report = analyze(&loaded.graph, args.top, args.hops);
    println!("{report}");
    if let Some(hub) = &report.hub {
        if let Some(external) = loaded.registry.external_id(hub.user) {
            println!("hub {} is `{external}` in the input files", hub.user);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    if let Err(err) = logging::init_logging() {
        eprintln!("failed to initialise logging: {err}");
        return ExitCode::FAILURE;
    }

    let cli = Cli::parse();
    let result = match &cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Analyze(args) => run_analyze(args),
    };
    if let Err(err) = result {
        error!("command failed: {err:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from(["socialgen", "generate", "--seed", "7", "--users", "500"]);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        let config = args.resolve_config().unwrap();
        assert_eq!(7, config.seed);
        assert_eq!(500, config.users);
        assert_eq!(GeneratorConfig::default().friend_edges, config.friend_edges);
        assert_eq!(DEFAULT_TOP_K, args.top);
    }

    #[test]
    fn test_flags_override_file() {
        let path = std::env::temp_dir().join(format!("socialgen-cli-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"seed": 3, "users": 250, "interactions": 10}"#).unwrap();
        let cli = Cli::parse_from([
            "socialgen",
            "generate",
            "--config",
            path.to_str().unwrap(),
            "--seed",
            "11",
        ]);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        let config = args.resolve_config().unwrap();
        assert_eq!(11, config.seed);
        assert_eq!(250, config.users);
        assert_eq!(10, config.interactions);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_analyze_requires_edges() {
        assert!(Cli::try_parse_from(["socialgen", "analyze"]).is_err());
        let cli = Cli::try_parse_from(["socialgen", "analyze", "--edges", "e.csv", "--top", "3"])
            .unwrap();
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(3, args.top);
        assert_eq!(None, args.interactions);
    }
}
