pub(crate) mod topology;
pub mod types;

pub use petgraph::stable_graph::EdgeIndex;
pub use topology::{Error as TopologyError, Topology};
pub use types::*;
