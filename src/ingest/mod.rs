pub mod csv;

use std::fs::File;
use std::path::Path;

use anyhow::Context;
use tracing::info;

use crate::analysis::social::{SocialGraph, SocialGraphBuilder};
use crate::core::ids::UserRegistry;
use crate::ingest::csv::{IngestStats, ingest_communities, ingest_edges, ingest_interactions};

/// Exported files to read back; only the edge file is required.
pub struct CsvSources<'a> {
    pub edges: &'a Path,
    pub interactions: Option<&'a Path>,
    pub users: Option<&'a Path>,
}

pub struct LoadedGraph {
    pub graph: SocialGraph,
    pub registry: UserRegistry,
    pub edges: IngestStats,
    pub interactions: IngestStats,
    pub users: IngestStats,
}

fn open(path: &Path) -> anyhow::Result<File> {
    File::open(path).with_context(|| format!("failed to open {}", path.display()))
}

pub fn load_csv(sources: &CsvSources<'_>) -> anyhow::Result<LoadedGraph> {
    let mut builder = SocialGraphBuilder::new(0);
    let mut registry = UserRegistry::new();

    let edges = ingest_edges(open(sources.edges)?, &mut builder, &mut registry)
        .with_context(|| format!("failed to read {}", sources.edges.display()))?;
    let interactions = match sources.interactions {
        Some(path) => ingest_interactions(open(path)?, &mut builder, &mut registry)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => IngestStats::default(),
    };
    let users = match sources.users {
        Some(path) => ingest_communities(open(path)?, &mut builder, &mut registry)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => IngestStats::default(),
    };

    info!(
        users = registry.len(),
        edges = edges.parsed,
        interactions = interactions.parsed,
        skipped = edges.skipped + interactions.skipped + users.skipped,
        "loaded csv snapshot"
    );
    Ok(LoadedGraph {
        graph: builder.freeze(),
        registry,
        edges,
        interactions,
        users,
    })
}
