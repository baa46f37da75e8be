//! Recovery of flows after links or nodes disappear.
//!
//! Every failure is handled in two phases. First the flows crossing the invalidated links are
//! collected from the topology as it was. Then the topology is mutated and the collected flows
//! are rerouted one by one, most urgent first, so that higher-priority traffic gets the first
//! pick of whatever capacity remains. A rejected mutation discards the collected flows.

use log::info;
use petgraph::stable_graph::EdgeIndex;

use crate::{
    network::{
        topology::{self, Topology},
        types::NodeId,
    },
    routing::RoutingAlgo,
    traffic::{FlowId, FlowState, TrafficManager},
};

/// Outcome of a failure or removal for the flows it touched, in the order they were handled.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct RerouteReport {
    pub rerouted: Vec<FlowId>,
    pub dropped: Vec<FlowId>,
}

impl RerouteReport {
    pub fn is_empty(&self) -> bool {
        self.rerouted.is_empty() && self.dropped.is_empty()
    }
}

#[derive(Debug)]
pub(crate) struct FailureHandler<'a, R> {
    topology: &'a mut Topology,
    traffic: &'a mut TrafficManager,
    router: &'a R,
}

impl<'a, R: RoutingAlgo> FailureHandler<'a, R> {
    pub(crate) fn new(
        topology: &'a mut Topology,
        traffic: &'a mut TrafficManager,
        router: &'a R,
    ) -> Self {
        Self {
            topology,
            traffic,
            router,
        }
    }

    /// Fails the active link between `a` and `b`. The link can later be reinstated.
    pub(crate) fn fail_link(
        self,
        a: &NodeId,
        b: &NodeId,
    ) -> Result<RerouteReport, topology::Error> {
        let affected = self.affected_by_link(a, b);
        self.topology.fail_link(a, b)?;
        info!("link {a}-{b} failed");
        Ok(self.recover(affected))
    }

    /// Permanently removes the link between `a` and `b`.
    pub(crate) fn remove_link(
        self,
        a: &NodeId,
        b: &NodeId,
    ) -> Result<RerouteReport, topology::Error> {
        let affected = self.affected_by_link(a, b);
        self.topology.remove_link(a, b)?;
        info!("link {a}-{b} removed");
        Ok(self.recover(affected))
    }

    /// Permanently removes node `id` and all of its links.
    pub(crate) fn remove_node(self, id: &NodeId) -> Result<RerouteReport, topology::Error> {
        let links = self.topology.incident_links(id);
        let affected = self.traffic.affected_by(&links, Some(id));
        let removed = self.topology.remove_node(id)?;
        info!("node {id} removed with {} links", removed.len());
        Ok(self.recover(affected))
    }

    fn affected_by_link(&self, a: &NodeId, b: &NodeId) -> Vec<FlowId> {
        let links = self.topology.find_link(a, b).into_iter().collect::<Vec<EdgeIndex>>();
        self.traffic.affected_by(&links, None)
    }

    fn recover(self, affected: Vec<FlowId>) -> RerouteReport {
        let mut report = RerouteReport::default();
        for id in affected {
            match self.traffic.reroute(self.topology, self.router, id) {
                Some(FlowState::Dropped) => report.dropped.push(id),
                Some(_) => report.rerouted.push(id),
                None => {}
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::types::TrafficType;
    use crate::routing::LoadAwareRouting;
    use crate::testing;
    use crate::units::Volume;

    fn id(s: &str) -> NodeId {
        NodeId::new(s)
    }

    #[test]
    fn unaffected_failure_reports_nothing() -> anyhow::Result<()> {
        let mut topo = testing::diamond_topology()?;
        let mut tm = TrafficManager::new();
        tm.inject(
            &mut topo,
            &LoadAwareRouting,
            id("A"),
            id("B"),
            TrafficType::Data,
            Volume::new(5),
        )?;
        let report = FailureHandler::new(&mut topo, &mut tm, &LoadAwareRouting)
            .fail_link(&id("C"), &id("D"))?;
        assert!(report.is_empty());
        Ok(())
    }

    #[test]
    fn urgent_flows_reroute_first() -> anyhow::Result<()> {
        let mut topo = testing::diamond_topology()?;
        let mut tm = TrafficManager::new();
        let mut inject = |traffic| {
            tm.inject(&mut topo, &LoadAwareRouting, id("A"), id("D"), traffic, Volume::new(5))
                .map(|f| f.id)
        };
        let data = inject(TrafficType::Data)?;
        let alerts = inject(TrafficType::Alerts)?;
        let report = FailureHandler::new(&mut topo, &mut tm, &LoadAwareRouting)
            .fail_link(&id("B"), &id("C"))?;
        assert_eq!(report.rerouted, vec![alerts, data]);
        assert!(report.dropped.is_empty());
        let ad = topo.link(&id("A"), &id("D")).unwrap();
        assert_eq!(ad.utilization, Volume::new(10));
        Ok(())
    }

    #[test]
    fn failure_of_missing_link_changes_nothing() -> anyhow::Result<()> {
        let mut topo = testing::diamond_topology()?;
        let mut tm = TrafficManager::new();
        let res = FailureHandler::new(&mut topo, &mut tm, &LoadAwareRouting)
            .fail_link(&id("A"), &id("C"));
        assert!(matches!(res, Err(topology::Error::LinkNotFound { .. })));
        assert_eq!(topo.nr_links(), 4);
        Ok(())
    }

    #[test]
    fn rejected_failure_leaves_collected_flows_alone() -> anyhow::Result<()> {
        let mut topo = testing::diamond_topology()?;
        let mut tm = TrafficManager::new();
        let f = tm
            .inject(
                &mut topo,
                &LoadAwareRouting,
                id("A"),
                id("D"),
                TrafficType::Data,
                Volume::new(5),
            )?
            .id;
        FailureHandler::new(&mut topo, &mut tm, &LoadAwareRouting)
            .fail_link(&id("C"), &id("D"))?;
        assert_eq!(tm.get(f).map(|f| f.state()), Some(FlowState::Rerouted));

        // C-D is already down: the second failure is rejected and nothing is rerouted.
        let res = FailureHandler::new(&mut topo, &mut tm, &LoadAwareRouting)
            .fail_link(&id("C"), &id("D"));
        assert!(matches!(res, Err(topology::Error::LinkNotFound { .. })));
        let ad = topo.link(&id("A"), &id("D")).unwrap();
        assert_eq!(ad.utilization, Volume::new(5));

        // Removing the failed link touches no flow either.
        let report = FailureHandler::new(&mut topo, &mut tm, &LoadAwareRouting)
            .remove_link(&id("C"), &id("D"))?;
        assert!(report.is_empty());
        assert_eq!(tm.get(f).map(|f| f.route().map(|r| r.nr_hops())), Some(Some(1)));
        Ok(())
    }
}
