//! The flow table and traffic injection.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use log::{info, warn};
use petgraph::stable_graph::EdgeIndex;

use crate::{
    network::{
        topology::Topology,
        types::{NodeId, TrafficType},
    },
    routing::{self, Route, RoutingAlgo},
    units::Volume,
};

identifier!(FlowId, usize);

/// Lifecycle of a flow.
///
/// `Pending -> Routed -> Rerouted* -> Dropped`, or `Pending -> Dropped` when a flow is never
/// routable. `Dropped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowState {
    Pending,
    Routed,
    Rerouted,
    Dropped,
}

impl FlowState {
    /// Whether a flow in this state holds a path and contributes to link utilization.
    pub fn is_active(self) -> bool {
        matches!(self, FlowState::Routed | FlowState::Rerouted)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Flow {
    pub id: FlowId,
    pub src: NodeId,
    pub dst: NodeId,
    pub traffic: TrafficType,
    pub volume: Volume,
    state: FlowState,
    route: Option<Route>,
}

impl Flow {
    fn new(id: FlowId, src: NodeId, dst: NodeId, traffic: TrafficType, volume: Volume) -> Self {
        Self {
            id,
            src,
            dst,
            traffic,
            volume,
            state: FlowState::Pending,
            route: None,
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    /// The currently assigned path. Only routed and rerouted flows have one.
    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn uses(&self, eidx: EdgeIndex) -> bool {
        self.route.as_ref().is_some_and(|r| r.uses(eidx))
    }

    pub fn is_incident(&self, id: &NodeId) -> bool {
        self.src == *id || self.dst == *id
    }

    fn assign(&mut self, route: Route) {
        debug_assert!(self.state != FlowState::Dropped, "dropped flows are terminal");
        self.state = match self.state {
            FlowState::Pending => FlowState::Routed,
            _ => FlowState::Rerouted,
        };
        self.route = Some(route);
    }

    fn drop_route(&mut self) {
        self.state = FlowState::Dropped;
        self.route = None;
    }

    /// Detaches the current path, leaving the flow to be rerouted or dropped.
    fn take_route(&mut self) -> Option<Route> {
        self.route.take()
    }
}

/// Owns the flow table. Flows are kept in creation order.
#[derive(Debug, Default, Clone)]
pub struct TrafficManager {
    flows: BTreeMap<FlowId, Flow>,
    next_id: FlowId,
}

impl TrafficManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a flow and routes it. An unroutable flow is recorded as `Dropped`. A flow whose
    /// volume would overflow the utilization of a link on its path is rejected and not recorded.
    ///
    /// PRECONDITIONS: `src` and `dst` exist in `topology` and `volume` is positive.
    pub(crate) fn inject<R: RoutingAlgo>(
        &mut self,
        topology: &mut Topology,
        router: &R,
        src: NodeId,
        dst: NodeId,
        traffic: TrafficType,
        volume: Volume,
    ) -> Result<&Flow, Error> {
        let route = match router.compute_path(topology, &src, &dst, traffic) {
            Ok(route) => Some(route),
            Err(routing::Error::Unreachable { .. }) => None,
        };
        if let Some(link) = route
            .as_ref()
            .and_then(|r| topology.overflowing_link(r.links(), volume))
        {
            let (a, b) = link.endpoints();
            return Err(Error::VolumeOverflow {
                volume,
                a: a.clone(),
                b: b.clone(),
            });
        }

        let id = self.next_id;
        self.next_id = id.next();
        let mut flow = Flow::new(id, src, dst, traffic, volume);
        match route {
            Some(route) => {
                topology.charge(route.links(), volume);
                info!("flow {id} ({traffic}, {volume}) routed via {route}");
                flow.assign(route);
            }
            None => {
                warn!("flow {id} ({traffic}) {} -> {} dropped: unreachable", flow.src, flow.dst);
                flow.drop_route();
            }
        }
        Ok(self.flows.entry(id).or_insert(flow))
    }

    /// The path of the most recent flow from `src` to `dst`, if that flow is still routed.
    pub fn query_routing(&self, src: &NodeId, dst: &NodeId) -> Option<&Route> {
        self.flows
            .values()
            .rev()
            .find(|f| f.src == *src && f.dst == *dst)
            .and_then(Flow::route)
    }

    /// Active flows crossing any of `links` or terminating at `node`, ordered by descending
    /// priority and then by creation order.
    pub(crate) fn affected_by(&self, links: &[EdgeIndex], node: Option<&NodeId>) -> Vec<FlowId> {
        let mut affected = self
            .flows
            .values()
            .filter(|f| f.state.is_active())
            .filter(|f| {
                links.iter().any(|&e| f.uses(e)) || node.is_some_and(|n| f.is_incident(n))
            })
            .map(|f| (Reverse(f.traffic.priority()), f.id))
            .collect::<Vec<_>>();
        affected.sort();
        affected.into_iter().map(|(_, id)| id).collect()
    }

    /// Moves an active flow off its current path and onto a fresh one, or drops it if the
    /// destination can no longer be reached. Returns the flow's new state.
    pub(crate) fn reroute<R: RoutingAlgo>(
        &mut self,
        topology: &mut Topology,
        router: &R,
        id: FlowId,
    ) -> Option<FlowState> {
        let flow = self.flows.get_mut(&id)?;
        if let Some(old) = flow.take_route() {
            topology.release(old.links(), flow.volume);
        }
        match router.compute_path(topology, &flow.src, &flow.dst, flow.traffic) {
            Ok(route) => {
                topology.charge(route.links(), flow.volume);
                info!("flow {id} rerouted via {route}");
                flow.assign(route);
            }
            Err(e) => {
                warn!("flow {id} dropped: {e}");
                flow.drop_route();
            }
        }
        Some(flow.state)
    }

    /// Removes a flow from the table, releasing the capacity it held.
    pub(crate) fn remove(&mut self, topology: &mut Topology, id: FlowId) -> Option<Flow> {
        let mut flow = self.flows.remove(&id)?;
        if let Some(route) = flow.take_route() {
            topology.release(route.links(), flow.volume);
            // Keep the path visible to the caller.
            flow.route = Some(route);
        }
        Some(flow)
    }

    /// Removes all dropped flows. Returns how many were removed.
    pub(crate) fn clear_dropped(&mut self) -> usize {
        let before = self.flows.len();
        self.flows.retain(|_, f| f.state != FlowState::Dropped);
        before - self.flows.len()
    }

    pub fn get(&self, id: FlowId) -> Option<&Flow> {
        self.flows.get(&id)
    }

    pub fn flows(&self) -> impl Iterator<Item = &Flow> + '_ {
        self.flows.values()
    }

    pub fn nr_flows(&self) -> usize {
        self.flows.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("flow volume {volume} would overflow the utilization of link {a}-{b}")]
    VolumeOverflow { volume: Volume, a: NodeId, b: NodeId },
}
