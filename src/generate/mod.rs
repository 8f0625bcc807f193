//! Generation pipeline: partition, degree plan, friend graph, follow graph,
//! interactions. All randomness flows through the context's single [`Lcg`].

pub mod attributes;
pub mod degree;
pub mod follows;
pub mod friends;
pub mod interactions;
pub mod partition;
pub mod selector;

use anyhow::Context;
use tracing::info;

use crate::config::GeneratorConfig;
use crate::core::model::{Edge, Interaction, User};
use crate::core::rng::Lcg;
use crate::generate::partition::{PartitionSpec, Population};
use crate::store::batch::{BatchWriter, SinkReport};
use crate::store::{Collection, DocumentStore, prepare_collections};

/// State owned by one generation run and handed to every stage.
pub struct GenerationContext {
    pub rng: Lcg,
    pub population: Population,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub community_sizes: Vec<usize>,
    pub edge_budget: u64,
    pub planned_stubs: u64,
    pub friend_edges: u64,
    pub saturated_users: usize,
    pub follow_edges: u64,
    pub follows_requested: u64,
    pub interactions: u64,
    pub interactions_skipped: u64,
    pub users_sink: SinkReport,
    pub friends_sink: SinkReport,
    pub follows_sink: SinkReport,
    pub interactions_sink: SinkReport,
}

impl GenerationReport {
    pub fn users(&self) -> usize {
        self.community_sizes.iter().sum()
    }

    pub fn sinks(&self) -> [(&'static str, &SinkReport); 4] {
        [
            ("users", &self.users_sink),
            ("friend edges", &self.friends_sink),
            ("follow edges", &self.follows_sink),
            ("interactions", &self.interactions_sink),
        ]
    }
}

pub fn run_generation<S: DocumentStore + ?Sized>(
    config: &GeneratorConfig,
    store: &mut S,
) -> anyhow::Result<GenerationReport> {
    config.validate().context("invalid generator configuration")?;
    prepare_collections(store).context("failed to prepare collections")?;

    let mut rng = Lcg::new(config.seed);
    let partition = PartitionSpec {
        users: config.users as usize,
        communities: config.communities,
        base_time: config.base_time,
        window_secs: config.time_window_secs,
    };
    let mut user_writer = BatchWriter::<User, S>::new(store, Collection::Users, config.batch_size);
    let population =
        partition::partition_users(&mut rng, &partition, |user| user_writer.push(&user));
    let users_sink = user_writer.finish();
    let community_sizes = population.community_sizes();
    info!(
        users = population.len(),
        communities = community_sizes.len(),
        "partitioned population"
    );

    let mut ctx = GenerationContext { rng, population };

    let plan = degree::plan_degrees(
        &mut ctx.rng,
        ctx.population.len(),
        config.friend_edges,
        config.mean_degree,
        config.degree_spread,
    );
    info!(
        edge_budget = plan.edge_budget(),
        stub_budget = plan.stub_budget(),
        planned_stubs = plan.total(),
        "planned friend degrees"
    );

    let mut friend_writer =
        BatchWriter::<Edge, S>::new(store, Collection::Edges, config.batch_size);
    let friend_summary =
        friends::build_friend_edges(&mut ctx, &plan, config.retry_multiplier, |edge| {
            friend_writer.push(&edge)
        });
    let friends_sink = friend_writer.finish();
    info!(
        accepted = friend_summary.accepted,
        budget = friend_summary.budget,
        saturated_users = friend_summary.saturated_users,
        "built friend graph"
    );

    let mut follow_writer =
        BatchWriter::<Edge, S>::new(store, Collection::Edges, config.batch_size);
    let follow_summary =
        follows::build_follow_edges(&mut ctx, config.follows, |edge| follow_writer.push(&edge));
    let follows_sink = follow_writer.finish();
    info!(
        accepted = follow_summary.accepted,
        requested = follow_summary.requested,
        short_users = follow_summary.short_users,
        "built follow graph"
    );

    let interaction_cfg = interactions::InteractionConfig {
        count: config.interactions,
        base_time: config.base_time,
        window_secs: config.time_window_secs,
    };
    let mut interaction_writer =
        BatchWriter::<Interaction, S>::new(store, Collection::Interactions, config.batch_size);
    let mut emitted = 0u64;
    for interaction in
        interactions::generate(&mut ctx.rng, ctx.population.len(), &interaction_cfg)
    {
        interaction_writer.push(&interaction);
        emitted += 1;
    }
    let interactions_sink = interaction_writer.finish();
    info!(emitted, requested = config.interactions, "emitted interactions");

    let report = GenerationReport {
        community_sizes,
        edge_budget: plan.edge_budget(),
        planned_stubs: plan.total(),
        friend_edges: friend_summary.accepted,
        saturated_users: friend_summary.saturated_users,
        follow_edges: follow_summary.accepted,
        follows_requested: follow_summary.requested,
        interactions: emitted,
        interactions_skipped: config.interactions.saturating_sub(emitted),
        users_sink,
        friends_sink,
        follows_sink,
        interactions_sink,
    };
    for (kind, sink) in report.sinks() {
        info!(kind, %sink, "sink report");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Bounds;
    use crate::core::model::EdgeKind;
    use crate::store::memory::InMemoryStore;
    use crate::store::Filter;
    use rustc_hash::FxHashSet;

    fn small_config(seed: u32) -> GeneratorConfig {
        GeneratorConfig {
            seed,
            users: 300,
            communities: Bounds::new(4, 8),
            friend_edges: Bounds::new(900, 1100),
            mean_degree: 7,
            degree_spread: 3,
            retry_multiplier: 12,
            follows: Bounds::new(2, 10),
            interactions: 1500,
            batch_size: 128,
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn test_same_seed_same_collections() {
        let mut first = InMemoryStore::new();
        let mut second = InMemoryStore::new();
        let a = run_generation(&small_config(9), &mut first).unwrap();
        let b = run_generation(&small_config(9), &mut second).unwrap();
        assert_eq!(a, b);
        for collection in Collection::ALL {
            let left = serde_json::to_string(first.documents(collection)).unwrap();
            let right = serde_json::to_string(second.documents(collection)).unwrap();
            assert_eq!(left, right);
        }
    }

    #[test]
    fn test_different_seed_differs() {
        let mut first = InMemoryStore::new();
        let mut second = InMemoryStore::new();
        run_generation(&small_config(1), &mut first).unwrap();
        run_generation(&small_config(2), &mut second).unwrap();
        assert_ne!(
            first.documents(Collection::Edges),
            second.documents(Collection::Edges)
        );
    }

    #[test]
    fn test_collections_hold_the_report() {
        let mut store = InMemoryStore::new();
        let report = run_generation(&small_config(5), &mut store).unwrap();

        assert_eq!(300, report.users());
        assert_eq!(2 * report.edge_budget, report.planned_stubs);
        assert!(report.friend_edges <= report.edge_budget);
        assert!(report.sinks().iter().all(|(_, sink)| sink.is_clean()));

        assert_eq!(300, store.count_documents(Collection::Users, &Filter::all()));
        assert_eq!(
            report.friend_edges as usize,
            store.count_documents(Collection::Edges, &Filter::eq("type", "friend"))
        );
        assert_eq!(
            report.follow_edges as usize,
            store.count_documents(Collection::Edges, &Filter::eq("type", "follow"))
        );
        assert_eq!(
            report.interactions as usize,
            store.count_documents(Collection::Interactions, &Filter::all())
        );
        assert_eq!(1500, report.interactions + report.interactions_skipped);
    }

    #[test]
    fn test_stored_edges_are_deduplicated() {
        let mut store = InMemoryStore::new();
        run_generation(&small_config(13), &mut store).unwrap();

        let mut pairs = FxHashSet::default();
        let mut follows = FxHashSet::default();
        for doc in store.documents(Collection::Edges) {
            let edge: Edge = serde_json::from_value(doc.clone()).unwrap();
            assert_ne!(edge.src, edge.dst);
            match edge.kind {
                EdgeKind::Friend => {
                    assert!(pairs.insert(edge.pair.unwrap()))
                }
                EdgeKind::Follow => {
                    assert!(follows.insert((edge.src, edge.dst)))
                }
            }
        }
    }

    #[test]
    fn test_rerun_replaces_previous_data() {
        let mut store = InMemoryStore::new();
        run_generation(&small_config(3), &mut store).unwrap();
        let report = run_generation(&small_config(3), &mut store).unwrap();
        assert_eq!(300, store.count_documents(Collection::Users, &Filter::all()));
        assert!(report.users_sink.is_clean());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut store = InMemoryStore::new();
        let cfg = GeneratorConfig {
            batch_size: 0,
            ..small_config(1)
        };
        let err = run_generation(&cfg, &mut store).unwrap_err();
        assert!(err.to_string().contains("invalid generator configuration"));
        assert!(
            err.chain()
                .any(|cause| cause.to_string().contains("batch_size"))
        );
    }
}
