use crate::network::{topology::Topology, types::NodeId};
use crate::units::{Volume, Weight};
use crate::{Controller, ControllerOpts};

const CAPACITY: Volume = Volume::new(100);

fn build(nodes: &[&str], links: &[(&str, &str, u64)]) -> Result<Topology, anyhow::Error> {
    let mut topo = Topology::new();
    for &n in nodes {
        topo.add_node(NodeId::new(n))?;
    }
    for &(a, b, w) in links {
        topo.add_link(&NodeId::new(a), &NodeId::new(b), Weight::new(w), CAPACITY)?;
    }
    Ok(topo)
}

/// A-B-C-D chain with unit weights plus a direct A-D link of weight 5.
pub(crate) fn diamond_topology() -> Result<Topology, anyhow::Error> {
    build(
        &["A", "B", "C", "D"],
        &[("A", "B", 1), ("B", "C", 1), ("C", "D", 1), ("A", "D", 5)],
    )
}

/// Two disjoint unit-weight paths A-B-D and A-C-D.
pub(crate) fn square_topology() -> Result<Topology, anyhow::Error> {
    build(
        &["A", "B", "C", "D"],
        &[("A", "B", 1), ("B", "D", 1), ("A", "C", 1), ("C", "D", 1)],
    )
}

pub(crate) fn diamond_controller() -> Result<Controller, anyhow::Error> {
    Ok(Controller::from_topology(diamond_topology()?, ControllerOpts::default()))
}

pub(crate) fn square_controller() -> Result<Controller, anyhow::Error> {
    Ok(Controller::from_topology(square_topology()?, ControllerOpts::default()))
}
