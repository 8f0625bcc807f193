pub mod components;
pub mod homophily;
pub mod label_propagation;
pub mod link_prediction;
pub mod queries;
pub mod reach;
pub mod social;

use std::fmt;

use serde::Serialize;

use crate::analysis::components::ComponentSummary;
use crate::analysis::label_propagation::CommunitySummary;
use crate::analysis::link_prediction::{LinkPredictions, PredictedLink};
use crate::analysis::queries::UserCounts;
use crate::analysis::social::SocialGraph;
use crate::core::ids::UserId;

const LPA_MAX_ITERS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HubReport {
    pub user: UserId,
    pub counts: UserCounts,
    pub influence: f64,
    pub reach: usize,
}

/// Summary printed after `generate` and `analyze`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub users: usize,
    pub friend_edges: usize,
    pub follow_edges: usize,
    pub hops: usize,
    pub top_followers: Vec<(UserId, usize)>,
    pub top_friend_degree: Vec<(UserId, usize)>,
    pub top_influence: Vec<(UserId, f64)>,
    /// Most followed user, when anyone is followed at all.
    pub hub: Option<HubReport>,
    pub components: ComponentSummary,
    pub homophily: Option<f64>,
    /// Communities found by label propagation on the friend graph.
    pub communities: CommunitySummary,
    pub predicted_links: LinkPredictions,
}

pub fn analyze(graph: &SocialGraph, top_k: usize, hops: usize) -> AnalyticsReport {
    let top_followers = queries::top_k_followers(graph, top_k);
    let hub = top_followers
        .first()
        .filter(|(_, followers)| *followers > 0)
        .map(|(user, _)| HubReport {
            user: *user,
            counts: queries::user_counts(graph, *user),
            influence: queries::influence_score(graph, *user),
            reach: reach::k_hop_reach(graph.friends(), *user, hops),
        });
    let labels = label_propagation::label_propagation(graph.friends(), LPA_MAX_ITERS);

    AnalyticsReport {
        users: graph.node_count(),
        friend_edges: graph.friends().edge_count(),
        follow_edges: graph.follows().edge_count(),
        hops,
        top_followers,
        top_friend_degree: queries::top_k_friend_degree(graph, top_k),
        top_influence: queries::top_k_influence(graph, top_k),
        hub,
        components: components::summarize_components(graph.friends()),
        homophily: graph
            .communities()
            .map(|planted| homophily::adjusted_homophily(graph.friends(), planted)),
        communities: label_propagation::summarize_communities(graph.friends(), &labels),
        predicted_links: link_prediction::predict_links(graph.friends(), top_k),
    }
}

fn write_ranking<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    ranking: &[(UserId, T)],
) -> fmt::Result {
    writeln!(f, "{title}:")?;
    for (rank, (user, score)) in ranking.iter().enumerate() {
        writeln!(f, "  {:>2}. user {user}: {score}", rank + 1)?;
    }
    Ok(())
}

fn write_links(f: &mut fmt::Formatter<'_>, title: &str, links: &[PredictedLink]) -> fmt::Result {
    writeln!(f, "{title}:")?;
    for (rank, link) in links.iter().enumerate() {
        writeln!(f, "  {:>2}. {} - {}: {:.3}", rank + 1, link.u, link.v, link.score)?;
    }
    Ok(())
}

impl fmt::Display for AnalyticsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "users: {}, friend edges: {}, follow edges: {}",
            self.users, self.friend_edges, self.follow_edges
        )?;
        write_ranking(f, "top followers", &self.top_followers)?;
        write_ranking(f, "top friend degree", &self.top_friend_degree)?;
        writeln!(f, "top influence:")?;
        for (rank, (user, score)) in self.top_influence.iter().enumerate() {
            writeln!(f, "  {:>2}. user {user}: {score:.1}", rank + 1)?;
        }
        if let Some(hub) = &self.hub {
            writeln!(
                f,
                "hub {}: {} followers, {} following, {} friends, influence {:.1}, {}-hop reach {}",
                hub.user,
                hub.counts.followers,
                hub.counts.following,
                hub.counts.friends,
                hub.influence,
                self.hops,
                hub.reach
            )?;
        }
        writeln!(
            f,
            "friend components: {}, largest: {}",
            self.components.count, self.components.largest
        )?;
        if let Some(h) = self.homophily {
            writeln!(f, "adjusted homophily: {h:.3}")?;
        }
        writeln!(
            f,
            "detected communities: {}, modularity: {:.3}, sizes: largest {}, smallest {}, average {:.1}",
            self.communities.count,
            self.communities.modularity,
            self.communities.largest(),
            self.communities.smallest(),
            self.communities.average()
        )?;
        let links = &self.predicted_links;
        write_links(f, "suggested friends (adamic-adar)", &links.adamic_adar)?;
        write_links(f, "suggested friends (jaccard)", &links.jaccard)?;
        write_links(
            f,
            "suggested friends (preferential attachment)",
            &links.preferential_attachment,
        )
    }
}
