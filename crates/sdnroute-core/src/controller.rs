//! The [`Controller`] owns the topology and the flow table and exposes every operator command
//! as a method. Each method either completes or returns an error without changing any state.

use log::info;

use crate::{
    failure::{FailureHandler, RerouteReport},
    network::{
        topology::Topology,
        types::{Link, NodeId, TrafficType},
    },
    opts::ControllerOpts,
    routing::{LoadAwareRouting, Route, RoutingAlgo},
    snapshot::{FlowView, LinkView, NodeView, Snapshot},
    traffic::{Flow, FlowId, TrafficManager},
    units::{Volume, Weight},
    Error,
};

/// A single controller's view of one topology.
#[derive(Debug, Clone)]
pub struct Controller<R = LoadAwareRouting> {
    topology: Topology,
    traffic: TrafficManager,
    router: R,
    opts: ControllerOpts,
}

impl Controller {
    /// Creates a controller with an empty topology and the default routing algorithm.
    pub fn new(opts: ControllerOpts) -> Self {
        Self::with_router(opts, LoadAwareRouting)
    }

    /// Creates a controller that manages an existing topology. The topology must not carry
    /// any utilization, since no flows are known yet.
    pub fn from_topology(topology: Topology, opts: ControllerOpts) -> Self {
        Self {
            topology,
            traffic: TrafficManager::new(),
            router: LoadAwareRouting,
            opts,
        }
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(ControllerOpts::default())
    }
}

impl<R: RoutingAlgo> Controller<R> {
    pub fn with_router(opts: ControllerOpts, router: R) -> Self {
        Self {
            topology: Topology::new(),
            traffic: TrafficManager::new(),
            router,
            opts,
        }
    }

    pub fn add_node(&mut self, id: NodeId) -> Result<(), Error> {
        self.topology.add_node(id.clone())?;
        info!("node {id} added");
        Ok(())
    }

    /// Removes a node and its links. Flows crossing the node are rerouted and flows
    /// terminating at it are dropped.
    pub fn remove_node(&mut self, id: &NodeId) -> Result<RerouteReport, Error> {
        Ok(self.failure_handler().remove_node(id)?)
    }

    pub fn add_link(
        &mut self,
        a: &NodeId,
        b: &NodeId,
        weight: Weight,
        capacity: Volume,
    ) -> Result<(), Error> {
        self.topology.add_link(a, b, weight, capacity)?;
        info!("link {a}-{b} added (weight {weight}, capacity {capacity})");
        Ok(())
    }

    /// Adds a link, filling in missing parameters from [`ControllerOpts`].
    pub fn add_link_with_defaults(
        &mut self,
        a: &NodeId,
        b: &NodeId,
        weight: Option<Weight>,
        capacity: Option<Volume>,
    ) -> Result<(), Error> {
        let weight = weight.unwrap_or(self.opts.default_weight);
        let capacity = capacity.unwrap_or(self.opts.default_capacity);
        self.add_link(a, b, weight, capacity)
    }

    /// Permanently removes a link. Flows crossing it are rerouted or dropped.
    pub fn remove_link(&mut self, a: &NodeId, b: &NodeId) -> Result<RerouteReport, Error> {
        Ok(self.failure_handler().remove_link(a, b)?)
    }

    /// Injects a flow. The returned flow is either routed or, if no path exists, dropped.
    pub fn inject(
        &mut self,
        src: &NodeId,
        dst: &NodeId,
        traffic: TrafficType,
        volume: Volume,
    ) -> Result<&Flow, Error> {
        self.ensure_node(src)?;
        self.ensure_node(dst)?;
        if volume.is_zero() {
            return Err(Error::ZeroVolume);
        }
        Ok(self.traffic.inject(
            &mut self.topology,
            &self.router,
            src.clone(),
            dst.clone(),
            traffic,
            volume,
        )?)
    }

    /// The path currently assigned to the most recent flow from `src` to `dst`.
    pub fn query_routing(&self, src: &NodeId, dst: &NodeId) -> Result<&Route, Error> {
        self.ensure_node(src)?;
        self.ensure_node(dst)?;
        self.traffic
            .query_routing(src, dst)
            .ok_or_else(|| Error::unreachable(src, dst))
    }

    /// Computes the path a new flow would take without injecting it.
    pub fn compute_path(
        &self,
        src: &NodeId,
        dst: &NodeId,
        traffic: TrafficType,
    ) -> Result<Route, Error> {
        self.ensure_node(src)?;
        self.ensure_node(dst)?;
        Ok(self.router.compute_path(&self.topology, src, dst, traffic)?)
    }

    /// Fails an active link. Re-adding the link later reinstates it.
    pub fn simulate_link_failure(
        &mut self,
        a: &NodeId,
        b: &NodeId,
    ) -> Result<RerouteReport, Error> {
        Ok(self.failure_handler().fail_link(a, b)?)
    }

    /// Fails a node, which removes it along with all of its links.
    pub fn simulate_node_failure(&mut self, id: &NodeId) -> Result<RerouteReport, Error> {
        self.remove_node(id)
    }

    /// Removes a flow from the table, releasing any capacity it held.
    pub fn clear_flow(&mut self, id: FlowId) -> Result<Flow, Error> {
        let flow = self
            .traffic
            .remove(&mut self.topology, id)
            .ok_or(Error::FlowNotFound(id))?;
        info!("flow {id} cleared");
        Ok(flow)
    }

    /// Removes every dropped flow. Returns how many were removed.
    pub fn clear_dropped(&mut self) -> usize {
        self.traffic.clear_dropped()
    }

    pub fn flow(&self, id: FlowId) -> Option<&Flow> {
        self.traffic.get(id)
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn opts(&self) -> &ControllerOpts {
        &self.opts
    }

    delegate::delegate! {
        to self.topology {
            pub fn link(&self, a: &NodeId, b: &NodeId) -> Option<&Link>;
        }

        to self.traffic {
            pub fn flows(&self) -> impl Iterator<Item = &Flow> + '_;
            pub fn nr_flows(&self) -> usize;
        }
    }

    /// Active neighbors of `id`, sorted by ID.
    pub fn neighbors(&self, id: &NodeId) -> Result<Vec<&NodeId>, Error> {
        Ok(self.topology.neighbors(id)?)
    }

    pub fn snapshot(&self) -> Snapshot {
        let mut nodes = self
            .topology
            .nodes()
            .map(|id| NodeView {
                id: id.clone(),
                neighbors: self
                    .topology
                    .neighbors(id)
                    .map(|ns| ns.into_iter().cloned().collect())
                    .unwrap_or_default(),
            })
            .collect::<Vec<_>>();
        nodes.sort_by(|x, y| x.id.cmp(&y.id));

        let mut links = self
            .topology
            .links()
            .map(|(_, link)| {
                let (a, b) = link.endpoints();
                LinkView {
                    a: a.clone(),
                    b: b.clone(),
                    weight: link.weight,
                    capacity: link.capacity,
                    utilization: link.utilization,
                    ratio: link.utilization_ratio(),
                    active: link.active,
                }
            })
            .collect::<Vec<_>>();
        links.sort_by(|x, y| (&x.a, &x.b).cmp(&(&y.a, &y.b)));

        let flows = self
            .traffic
            .flows()
            .map(|f| FlowView {
                id: f.id,
                src: f.src.clone(),
                dst: f.dst.clone(),
                traffic: f.traffic,
                volume: f.volume,
                state: f.state(),
                path: f.route().map(|r| r.nodes().to_vec()).unwrap_or_default(),
            })
            .collect();

        Snapshot {
            nodes,
            links,
            flows,
        }
    }

    fn ensure_node(&self, id: &NodeId) -> Result<(), Error> {
        if self.topology.contains_node(id) {
            Ok(())
        } else {
            Err(Error::NodeNotFound(id.clone()))
        }
    }

    fn failure_handler(&mut self) -> FailureHandler<'_, R> {
        FailureHandler::new(&mut self.topology, &mut self.traffic, &self.router)
    }
}
