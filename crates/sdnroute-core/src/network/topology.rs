use petgraph::{
    stable_graph::{EdgeIndex, NodeIndex, StableUnGraph},
    visit::EdgeRef,
};
use rustc_hash::FxHashMap;

use crate::network::types::{Link, Node, NodeId};
use crate::units::{Volume, Weight};

/// The controller's view of the network: nodes, links, and per-link load.
///
/// Correctness properties maintained by every mutation:
///
/// - Every node has a unique ID.
/// - Every link has two distinct endpoints that exist in the topology.
/// - For any two nodes, there is at most one link between them.
/// - Weights and capacities are positive.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    pub(crate) graph: StableUnGraph<Node, Link>,
    id2idx: FxHashMap<NodeId, NodeIndex>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: NodeId) -> Result<(), Error> {
        if self.id2idx.contains_key(&id) {
            // CORRECTNESS: Every node must have a unique ID.
            return Err(Error::DuplicateNode(id));
        }
        let idx = self.graph.add_node(Node::new(id.clone()));
        self.id2idx.insert(id, idx);
        Ok(())
    }

    /// Removes a node together with every incident link. Returns the indices of the removed
    /// links so that flows crossing them can be recovered.
    pub fn remove_node(&mut self, id: &NodeId) -> Result<Vec<EdgeIndex>, Error> {
        let idx = self.idx_or_err(id)?;
        let removed = self.incident_links(id);
        for &eidx in &removed {
            self.graph.remove_edge(eidx);
        }
        self.graph.remove_node(idx);
        self.id2idx.remove(id);
        Ok(removed)
    }

    /// Adds a link between `a` and `b`. If the pair is only connected by a failed link, that
    /// link is reinstated with the new parameters instead.
    pub fn add_link(
        &mut self,
        a: &NodeId,
        b: &NodeId,
        weight: Weight,
        capacity: Volume,
    ) -> Result<EdgeIndex, Error> {
        let i = self.idx_or_err(a)?;
        let j = self.idx_or_err(b)?;
        // CORRECTNESS: Every link must have distinct endpoints.
        if i == j {
            return Err(Error::NodeAdjacentSelf(a.clone()));
        }
        if weight.is_zero() {
            return Err(Error::ZeroWeight {
                a: a.clone(),
                b: b.clone(),
            });
        }
        if capacity.is_zero() {
            return Err(Error::ZeroCapacity {
                a: a.clone(),
                b: b.clone(),
            });
        }
        match self.graph.find_edge(i, j) {
            // CORRECTNESS: For any two nodes, there must be at most one link between them.
            Some(eidx) if self.graph[eidx].active => Err(Error::DuplicateLink {
                a: a.clone(),
                b: b.clone(),
            }),
            Some(eidx) => {
                self.graph[eidx].restore(weight, capacity);
                Ok(eidx)
            }
            None => {
                let link = Link::new(a.clone(), b.clone(), weight, capacity);
                Ok(self.graph.add_edge(i, j, link))
            }
        }
    }

    /// Permanently removes the link between `a` and `b`, whether active or failed.
    pub fn remove_link(&mut self, a: &NodeId, b: &NodeId) -> Result<(EdgeIndex, Link), Error> {
        self.find_link(a, b)
            .and_then(|eidx| Some((eidx, self.graph.remove_edge(eidx)?)))
            .ok_or_else(|| Error::LinkNotFound {
                a: a.clone(),
                b: b.clone(),
            })
    }

    /// Marks the active link between `a` and `b` as failed. The link stays in the topology so
    /// that it can later be reinstated by [`Topology::add_link`].
    pub fn fail_link(&mut self, a: &NodeId, b: &NodeId) -> Result<EdgeIndex, Error> {
        match self.find_link(a, b) {
            Some(eidx) if self.graph[eidx].active => {
                self.graph[eidx].fail();
                Ok(eidx)
            }
            _ => Err(Error::LinkNotFound {
                a: a.clone(),
                b: b.clone(),
            }),
        }
    }

    /// Nodes reachable from `id` over a single active link, sorted by ID.
    pub fn neighbors(&self, id: &NodeId) -> Result<Vec<&NodeId>, Error> {
        let idx = self.idx_or_err(id)?;
        let mut neighbors = self
            .active_links_from(idx)
            .map(|(_, _, next)| &self.graph[next].id)
            .collect::<Vec<_>>();
        neighbors.sort();
        Ok(neighbors)
    }

    /// Every link touching `id`, active or failed, sorted by index. Empty for unknown nodes.
    pub fn incident_links(&self, id: &NodeId) -> Vec<EdgeIndex> {
        let mut links = self
            .idx_of(id)
            .map(|idx| self.graph.edges(idx).map(|e| e.id()).collect::<Vec<_>>())
            .unwrap_or_default();
        links.sort();
        links
    }

    pub fn link(&self, a: &NodeId, b: &NodeId) -> Option<&Link> {
        self.find_link(a, b).map(|eidx| &self.graph[eidx])
    }

    pub fn find_link(&self, a: &NodeId, b: &NodeId) -> Option<EdgeIndex> {
        let i = *self.id2idx.get(a)?;
        let j = *self.id2idx.get(b)?;
        self.graph.find_edge(i, j)
    }

    pub fn edge(&self, eidx: EdgeIndex) -> Option<&Link> {
        self.graph.edge_weight(eidx)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.id2idx.contains_key(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> + '_ {
        self.graph.node_indices().map(|idx| &self.graph[idx].id)
    }

    pub fn links(&self) -> impl Iterator<Item = (EdgeIndex, &Link)> + '_ {
        self.graph
            .edge_indices()
            .map(|eidx| (eidx, &self.graph[eidx]))
    }

    pub fn nr_nodes(&self) -> usize {
        self.graph.node_count()
    }

    pub fn nr_links(&self) -> usize {
        self.graph.edge_count()
    }

    /// The first link in `path` whose utilization cannot grow by `volume`.
    pub(crate) fn overflowing_link(&self, path: &[EdgeIndex], volume: Volume) -> Option<&Link> {
        path.iter()
            .filter_map(|&eidx| self.graph.edge_weight(eidx))
            .find(|link| link.utilization.checked_add(volume).is_none())
    }

    /// Adds `volume` to the utilization of each link in `path`, saturating at the maximum.
    pub(crate) fn charge(&mut self, path: &[EdgeIndex], volume: Volume) {
        for &eidx in path {
            if let Some(link) = self.graph.edge_weight_mut(eidx) {
                link.utilization = link.utilization.saturating_add(volume);
            }
        }
    }

    /// Removes `volume` from the utilization of each surviving active link in `path`. Failed
    /// links were already zeroed and removed links no longer exist.
    pub(crate) fn release(&mut self, path: &[EdgeIndex], volume: Volume) {
        for &eidx in path {
            if let Some(link) = self.graph.edge_weight_mut(eidx) {
                if link.active {
                    link.utilization = link.utilization.saturating_sub(volume);
                }
            }
        }
    }

    pub(crate) fn idx_of(&self, id: &NodeId) -> Option<NodeIndex> {
        self.id2idx.get(id).copied()
    }

    fn idx_or_err(&self, id: &NodeId) -> Result<NodeIndex, Error> {
        self.idx_of(id).ok_or_else(|| Error::NodeNotFound(id.clone()))
    }

    /// Active links incident to `idx`, as `(link index, link, far endpoint)`.
    pub(crate) fn active_links_from(
        &self,
        idx: NodeIndex,
    ) -> impl Iterator<Item = (EdgeIndex, &Link, NodeIndex)> + '_ {
        self.graph
            .edges(idx)
            .filter(|e| e.weight().active)
            .map(move |e| {
                let next = if e.source() == idx {
                    e.target()
                } else {
                    e.source()
                };
                (e.id(), e.weight(), next)
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("node {0} does not exist")]
    NodeNotFound(NodeId),

    #[error("no link between {a} and {b}")]
    LinkNotFound { a: NodeId, b: NodeId },

    #[error("node {0} already exists")]
    DuplicateNode(NodeId),

    #[error("a link between {a} and {b} already exists")]
    DuplicateLink { a: NodeId, b: NodeId },

    #[error("node {0} cannot be linked to itself")]
    NodeAdjacentSelf(NodeId),

    #[error("link {a}-{b} must have a positive weight")]
    ZeroWeight { a: NodeId, b: NodeId },

    #[error("link {a}-{b} must have a positive capacity")]
    ZeroCapacity { a: NodeId, b: NodeId },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn id(s: &str) -> NodeId {
        NodeId::new(s)
    }

    #[test]
    fn empty_topology_succeeds() {
        let topo = Topology::new();
        assert_eq!(topo.nr_nodes(), 0);
        assert_eq!(topo.nr_links(), 0);
    }

    #[test]
    fn diamond_topology_succeeds() -> anyhow::Result<()> {
        let topo = testing::diamond_topology()?;
        assert_eq!(topo.nr_nodes(), 4);
        assert_eq!(topo.nr_links(), 4);
        assert_eq!(topo.neighbors(&id("A"))?, vec![&id("B"), &id("D")]);
        Ok(())
    }

    #[test]
    fn duplicate_node_fails() {
        let mut topo = Topology::new();
        assert!(topo.add_node(id("A")).is_ok());
        assert!(matches!(
            topo.add_node(id("A")),
            Err(Error::DuplicateNode(..))
        ));
    }

    #[test]
    fn node_ids_are_case_sensitive() -> anyhow::Result<()> {
        let mut topo = Topology::new();
        topo.add_node(id("A"))?;
        topo.add_node(id("a"))?;
        assert_eq!(topo.nr_nodes(), 2);
        Ok(())
    }

    #[test]
    fn node_adjacent_self_fails() -> anyhow::Result<()> {
        let mut topo = Topology::new();
        topo.add_node(id("A"))?;
        let res = topo.add_link(&id("A"), &id("A"), Weight::ONE, Volume::ONE);
        assert!(matches!(res, Err(Error::NodeAdjacentSelf(..))));
        Ok(())
    }

    #[test]
    fn undeclared_node_fails() -> anyhow::Result<()> {
        let mut topo = Topology::new();
        topo.add_node(id("A"))?;
        let res = topo.add_link(&id("A"), &id("Z"), Weight::ONE, Volume::ONE);
        assert_eq!(res, Err(Error::NodeNotFound(id("Z"))));
        Ok(())
    }

    #[test]
    fn duplicate_links_fail_in_either_direction() -> anyhow::Result<()> {
        let mut topo = testing::diamond_topology()?;
        let res = topo.add_link(&id("B"), &id("A"), Weight::new(9), Volume::ONE);
        assert!(matches!(res, Err(Error::DuplicateLink { .. })));
        // The existing link is untouched.
        assert_eq!(topo.link(&id("A"), &id("B")).map(|l| l.weight), Some(Weight::ONE));
        Ok(())
    }

    #[test]
    fn non_positive_parameters_fail() -> anyhow::Result<()> {
        let mut topo = Topology::new();
        topo.add_node(id("A"))?;
        topo.add_node(id("B"))?;
        let res = topo.add_link(&id("A"), &id("B"), Weight::ZERO, Volume::ONE);
        assert!(matches!(res, Err(Error::ZeroWeight { .. })));
        let res = topo.add_link(&id("A"), &id("B"), Weight::ONE, Volume::ZERO);
        assert!(matches!(res, Err(Error::ZeroCapacity { .. })));
        assert_eq!(topo.nr_links(), 0);
        Ok(())
    }

    #[test]
    fn remove_missing_link_fails() -> anyhow::Result<()> {
        let mut topo = testing::diamond_topology()?;
        let res = topo.remove_link(&id("A"), &id("C"));
        assert!(matches!(res, Err(Error::LinkNotFound { .. })));
        assert_eq!(topo.nr_links(), 4);
        Ok(())
    }

    #[test]
    fn remove_node_cascades_to_links() -> anyhow::Result<()> {
        let mut topo = testing::diamond_topology()?;
        let removed = topo.remove_node(&id("D"))?;
        assert_eq!(removed.len(), 2);
        assert!(!topo.contains_node(&id("D")));
        assert_eq!(topo.nr_links(), 2);
        // No dangling references remain.
        assert!(topo.links().all(|(_, l)| !l.is_incident(&id("D"))));
        assert!(matches!(
            topo.remove_node(&id("D")),
            Err(Error::NodeNotFound(..))
        ));
        Ok(())
    }

    #[test]
    fn failed_link_is_hidden_from_neighbors_and_can_be_reinstated() -> anyhow::Result<()> {
        let mut topo = testing::diamond_topology()?;
        let failed = topo.fail_link(&id("D"), &id("A"))?;
        assert_eq!(topo.neighbors(&id("A"))?, vec![&id("B")]);
        assert!(matches!(
            topo.fail_link(&id("A"), &id("D")),
            Err(Error::LinkNotFound { .. })
        ));
        let restored = topo.add_link(&id("A"), &id("D"), Weight::new(2), Volume::new(50))?;
        assert_eq!(failed, restored);
        let link = topo.link(&id("A"), &id("D")).unwrap();
        assert!(link.active);
        assert_eq!((link.weight, link.capacity), (Weight::new(2), Volume::new(50)));
        Ok(())
    }

    #[test]
    fn release_never_underflows() -> anyhow::Result<()> {
        let mut topo = testing::diamond_topology()?;
        let ab = topo.find_link(&id("A"), &id("B")).unwrap();
        topo.charge(&[ab], Volume::new(3));
        topo.release(&[ab], Volume::new(5));
        assert_eq!(topo.edge(ab).map(|l| l.utilization), Some(Volume::ZERO));
        Ok(())
    }

    #[test]
    fn charge_saturates_instead_of_overflowing() -> anyhow::Result<()> {
        let mut topo = testing::diamond_topology()?;
        let ab = topo.find_link(&id("A"), &id("B")).unwrap();
        let bc = topo.find_link(&id("B"), &id("C")).unwrap();
        let huge = Volume::new(u64::MAX);
        topo.charge(&[ab], huge);
        assert!(topo.overflowing_link(&[bc], huge).is_none());
        let full = topo.overflowing_link(&[bc, ab], Volume::ONE).unwrap();
        assert_eq!(full.endpoints(), (&id("A"), &id("B")));
        topo.charge(&[ab], Volume::ONE);
        assert_eq!(topo.edge(ab).map(|l| l.utilization), Some(huge));
        Ok(())
    }
}
