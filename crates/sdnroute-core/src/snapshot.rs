//! Read-only views of the controller state, for rendering and inspection.

use crate::{
    network::types::{NodeId, TrafficType},
    traffic::{FlowId, FlowState},
    units::{Volume, Weight},
};

/// A point-in-time copy of the topology and flow table.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Snapshot {
    /// Nodes sorted by ID.
    pub nodes: Vec<NodeView>,
    /// Links sorted by their endpoint pair.
    pub links: Vec<LinkView>,
    /// Flows in creation order.
    pub flows: Vec<FlowView>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct NodeView {
    pub id: NodeId,
    /// Neighbors over active links.
    pub neighbors: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LinkView {
    pub a: NodeId,
    pub b: NodeId,
    pub weight: Weight,
    pub capacity: Volume,
    pub utilization: Volume,
    pub ratio: f64,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FlowView {
    pub id: FlowId,
    pub src: NodeId,
    pub dst: NodeId,
    pub traffic: TrafficType,
    pub volume: Volume,
    pub state: FlowState,
    /// Nodes on the assigned path. Empty unless the flow is routed.
    pub path: Vec<NodeId>,
}
