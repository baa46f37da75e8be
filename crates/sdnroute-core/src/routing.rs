//! This module defines how paths are computed for flows.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use log::debug;
use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    network::{
        topology::Topology,
        types::{Link, NodeId, TrafficType},
    },
    utils,
};

/// The trait implemented by all routing algorithms. Implementations must be pure functions of
/// the topology (including its current link utilization) and the requested traffic class.
pub trait RoutingAlgo {
    /// Computes a path from `src` to `dst` over active links only.
    fn compute_path(
        &self,
        topology: &Topology,
        src: &NodeId,
        dst: &NodeId,
        traffic: TrafficType,
    ) -> Result<Route, Error>;
}

/// A path through the topology.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Route {
    nodes: Vec<NodeId>,
    #[serde(skip)]
    links: Vec<EdgeIndex>,
    cost: f64,
}

impl Route {
    /// The nodes visited, from source to destination inclusive.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// The links traversed, in order.
    pub fn links(&self) -> &[EdgeIndex] {
        &self.links
    }

    /// The total effective cost of the path at the time it was computed.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn nr_hops(&self) -> usize {
        self.links.len()
    }

    pub fn uses(&self, eidx: EdgeIndex) -> bool {
        self.links.contains(&eidx)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let nodes = itertools::join(&self.nodes, " -> ");
        write!(f, "{nodes} (cost {:.3})", self.cost)
    }
}

/// Shortest-path routing where busy links cost more and urgent traffic pays less.
///
/// The effective cost of a link is `weight * (1 + utilization / capacity) / priority`. Among
/// paths of equal cost the one with fewer hops wins, then the lexicographically smallest
/// sequence of node IDs, so the result is fully deterministic.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoadAwareRouting;

impl LoadAwareRouting {
    pub fn effective_cost(link: &Link, traffic: TrafficType) -> f64 {
        let base = link.weight.into_f64();
        base * (1.0 + link.utilization_ratio()) / f64::from(traffic.priority())
    }
}

impl RoutingAlgo for LoadAwareRouting {
    fn compute_path(
        &self,
        topology: &Topology,
        src: &NodeId,
        dst: &NodeId,
        traffic: TrafficType,
    ) -> Result<Route, Error> {
        let unreachable = || Error::Unreachable {
            src: src.clone(),
            dst: dst.clone(),
        };
        let start = topology.idx_of(src).ok_or_else(unreachable)?;
        let goal = topology.idx_of(dst).ok_or_else(unreachable)?;

        let mut best: FxHashMap<NodeIndex, Label> = FxHashMap::default();
        let mut settled = FxHashSet::default();
        let mut heap = BinaryHeap::new();
        heap.push(Reverse(Label::start(start, src.clone())));

        while let Some(Reverse(label)) = heap.pop() {
            // The first label popped for a node is its best one.
            if !settled.insert(label.at) {
                continue;
            }
            if label.at == goal {
                debug!(
                    "{traffic} route {src} -> {dst}: {} hops, cost {:.3}",
                    label.links.len(),
                    label.cost
                );
                return Ok(label.into_route());
            }
            for (eidx, link, next) in topology.active_links_from(label.at) {
                if settled.contains(&next) {
                    continue;
                }
                let cost = LoadAwareRouting::effective_cost(link, traffic);
                let candidate = label.extend(eidx, cost, next, &topology.graph[next].id);
                let improves = best.get(&next).map_or(true, |b| candidate < *b);
                if improves {
                    best.insert(next, candidate.clone());
                    heap.push(Reverse(candidate));
                }
            }
        }
        debug!("{traffic} route {src} -> {dst}: unreachable");
        Err(unreachable())
    }
}

/// A partial path in the search frontier. Labels are totally ordered by cost, then hop count,
/// then node sequence. Extending two labels that end at the same node by the same link
/// preserves their order, which is what lets Dijkstra settle each node once.
#[derive(Debug, Clone)]
struct Label {
    cost: f64,
    nodes: Vec<NodeId>,
    links: Vec<EdgeIndex>,
    at: NodeIndex,
}

impl Label {
    fn start(at: NodeIndex, id: NodeId) -> Self {
        Self {
            cost: 0.0,
            nodes: vec![id],
            links: Vec::new(),
            at,
        }
    }

    fn extend(&self, eidx: EdgeIndex, cost: f64, next: NodeIndex, id: &NodeId) -> Self {
        let mut nodes = self.nodes.clone();
        nodes.push(id.clone());
        let mut links = self.links.clone();
        links.push(eidx);
        Self {
            cost: self.cost + cost,
            nodes,
            links,
            at: next,
        }
    }

    fn into_route(self) -> Route {
        Route {
            nodes: self.nodes,
            links: self.links,
            cost: self.cost,
        }
    }
}

impl Ord for Label {
    fn cmp(&self, other: &Self) -> Ordering {
        utils::cmp_costs(self.cost, other.cost)
            .then_with(|| self.links.len().cmp(&other.links.len()))
            .then_with(|| self.nodes.cmp(&other.nodes))
    }
}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Label {}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("no active path from {src} to {dst}")]
    Unreachable { src: NodeId, dst: NodeId },
}
