use std::io::{BufReader, Read};

use serde::Deserialize;
use tracing::debug;

use crate::analysis::social::SocialGraphBuilder;
use crate::core::ids::UserRegistry;
use crate::core::model::{Edge, EdgeKind, Interaction, InteractionKind};
use crate::export::InteractionRow;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub parsed: u64,
    pub skipped: u64,
}

/// Reads `src,dst,type,weight` rows. Rows with an unknown type, a bad weight
/// or a self-loop are skipped.
pub fn ingest_edges<R: Read>(
    reader: R,
    builder: &mut SocialGraphBuilder,
    registry: &mut UserRegistry,
) -> anyhow::Result<IngestStats> {
    let mut csv_reader = csv::Reader::from_reader(BufReader::new(reader));
    let mut stats = IngestStats::default();

    for maybe_record in csv_reader.records() {
        let record = match maybe_record {
            Ok(record) if record.len() == 4 => record,
            _ => {
                stats.skipped += 1;
                continue;
            }
        };
        let Some(kind) = EdgeKind::parse(&record[2]) else {
            stats.skipped += 1;
            continue;
        };
        let Ok(weight) = record[3].parse::<f64>() else {
            stats.skipped += 1;
            continue;
        };
        if record[0] == record[1] {
            stats.skipped += 1;
            continue;
        }
        let src = registry.get_or_insert(&record[0])?;
        let dst = registry.get_or_insert(&record[1])?;
        let edge = match kind {
            EdgeKind::Friend => Edge::friend(src, dst),
            EdgeKind::Follow => Edge::follow(src, dst),
        };
        let Ok(mut edge) = edge else {
            stats.skipped += 1;
            continue;
        };
        edge.weight = weight;
        builder.add_edge(&edge);
        stats.parsed += 1;
    }

    debug!(parsed = stats.parsed, skipped = stats.skipped, "ingested edges");
    Ok(stats)
}

/// Reads `actor,target,type,weight,createdAt` rows; the stored weight is
/// kept as written.
pub fn ingest_interactions<R: Read>(
    reader: R,
    builder: &mut SocialGraphBuilder,
    registry: &mut UserRegistry,
) -> anyhow::Result<IngestStats> {
    let mut csv_reader = csv::Reader::from_reader(BufReader::new(reader));
    let mut stats = IngestStats::default();

    for maybe_row in csv_reader.deserialize::<InteractionRow>() {
        let Ok(row) = maybe_row else {
            stats.skipped += 1;
            continue;
        };
        let Some(kind) = InteractionKind::parse(&row.kind) else {
            stats.skipped += 1;
            continue;
        };
        if row.actor == row.target {
            stats.skipped += 1;
            continue;
        }
        let actor = registry.get_or_insert(&row.actor)?;
        let target = registry.get_or_insert(&row.target)?;
        let Ok(mut interaction) = Interaction::new(actor, target, kind, row.created_at) else {
            stats.skipped += 1;
            continue;
        };
        interaction.weight = row.weight;
        builder.add_interaction(&interaction);
        stats.parsed += 1;
    }

    debug!(parsed = stats.parsed, skipped = stats.skipped, "ingested interactions");
    Ok(stats)
}

#[derive(Debug, Deserialize)]
struct CommunityRow {
    id: String,
    community: u32,
}

/// Reads the `id` and `community` columns of a users file; other columns are
/// ignored.
pub fn ingest_communities<R: Read>(
    reader: R,
    builder: &mut SocialGraphBuilder,
    registry: &mut UserRegistry,
) -> anyhow::Result<IngestStats> {
    let mut csv_reader = csv::Reader::from_reader(BufReader::new(reader));
    let mut stats = IngestStats::default();

    for maybe_row in csv_reader.deserialize::<CommunityRow>() {
        match maybe_row {
            Ok(row) => {
                let user = registry.get_or_insert(&row.id)?;
                builder.set_community(user, row.community);
                stats.parsed += 1;
            }
            Err(_) => stats.skipped += 1,
        }
    }

    debug!(parsed = stats.parsed, skipped = stats.skipped, "ingested communities");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::queries::{influence_score, user_counts};
    use approx::assert_relative_eq;

    #[test]
    fn test_edges_with_bad_rows() {
        let data = "src,dst,type,weight\n\
                    a,b,friend,1.0\n\
                    b,c,follow,1.0\n\
                    c,c,follow,1.0\n\
                    c,a,poke,1.0\n\
                    c,a,follow,heavy\n\
                    c,a\n\
                    c,a,follow,0.5\n";
        let mut builder = SocialGraphBuilder::new(0);
        let mut registry = UserRegistry::new();
        let stats = ingest_edges(data.as_bytes(), &mut builder, &mut registry).unwrap();

        assert_eq!(IngestStats { parsed: 3, skipped: 4 }, stats);
        assert_eq!(3, registry.len());
        let graph = builder.freeze();
        assert_eq!(1, graph.friends().edge_count());
        assert_eq!(2, graph.follows().edge_count());
        let a = registry.get("a").unwrap();
        assert_eq!(1, user_counts(&graph, a).followers);
    }

    #[test]
    fn test_interactions_feed_influence() {
        let data = "actor,target,type,weight,createdAt\n\
                    7,8,like,1.0,2024-01-01T00:00:00Z\n\
                    9,8,share,3.0,2023-12-30T10:00:00Z\n\
                    8,8,like,1.0,2024-01-01T00:00:00Z\n\
                    9,8,wave,1.0,2024-01-01T00:00:00Z\n\
                    9,8,like,1.0,yesterday\n";
        let mut builder = SocialGraphBuilder::new(0);
        let mut registry = UserRegistry::new();
        let stats = ingest_interactions(data.as_bytes(), &mut builder, &mut registry).unwrap();

        assert_eq!(IngestStats { parsed: 2, skipped: 3 }, stats);
        let graph = builder.freeze();
        let target = registry.get("8").unwrap();
        assert_eq!(0, user_counts(&graph, target).followers);
        assert_relative_eq!(4.0, influence_score(&graph, target));
    }

    #[test]
    fn test_communities_by_header() {
        let data = "id,name,community\n\
                    1,Asha,0\n\
                    2,Ravi,1\n\
                    3,Meena,many\n";
        let mut builder = SocialGraphBuilder::new(0);
        let mut registry = UserRegistry::new();
        registry.get_or_insert("2").unwrap();
        let stats = ingest_communities(data.as_bytes(), &mut builder, &mut registry).unwrap();

        assert_eq!(IngestStats { parsed: 2, skipped: 1 }, stats);
        let graph = builder.freeze();
        // "2" was registered first, "1" second
        assert_eq!(Some(&[1, 0][..]), graph.communities());
    }
}
