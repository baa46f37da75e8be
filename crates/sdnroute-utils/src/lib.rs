//! Utilities for loading controller state from files.

#![warn(unreachable_pub, missing_debug_implementations, missing_docs)]

use std::path::{Path, PathBuf};

use log::info;
use sdnroute_core::{Controller, ControllerOpts, NodeId, TrafficType, Volume, Weight};

/// Reads a [`TopologySpec`] from a file and builds a [`Controller`] from it. Caller-supplied
/// `opts` take precedence over link defaults declared in the file, which in turn take
/// precedence over [`ControllerOpts::default`].
pub fn read_controller(
    path: impl AsRef<Path>,
    opts: Option<ControllerOpts>,
) -> Result<Controller, Error> {
    let spec = read_topology_spec(path)?;
    let opts = opts.or(spec.defaults).unwrap_or_default();
    spec.build(opts)
}

/// Reads a [`TopologySpec`] from a file in JSON format.
pub fn read_topology_spec(path: impl AsRef<Path>) -> Result<TopologySpec, Error> {
    let path = path.as_ref();
    let spec: TopologySpec = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => {
            let contents = std::fs::read_to_string(path)?;
            serde_json::from_str(&contents)?
        }
        _ => return Err(Error::UnknownFileType(path.into())),
    };
    Ok(spec)
}

/// A topology specification, optionally with traffic to inject once the topology is built.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct TopologySpec {
    /// Link defaults for this topology.
    #[serde(default)]
    pub defaults: Option<ControllerOpts>,
    /// Nodes.
    pub nodes: Vec<NodeId>,
    /// Links.
    #[serde(default)]
    pub links: Vec<LinkSpec>,
    /// Flows, injected in order.
    #[serde(default)]
    pub flows: Vec<FlowSpec>,
}

/// A link declaration. Missing parameters fall back to [`ControllerOpts`].
#[derive(Debug, Clone, serde::Deserialize)]
pub struct LinkSpec {
    /// One endpoint.
    pub a: NodeId,
    /// The other endpoint.
    pub b: NodeId,
    /// Base cost.
    pub weight: Option<Weight>,
    /// Capacity.
    pub capacity: Option<Volume>,
}

/// A flow to inject.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct FlowSpec {
    /// Source node.
    pub src: NodeId,
    /// Destination node.
    pub dst: NodeId,
    /// Traffic class.
    pub traffic: TrafficType,
    /// Volume.
    pub volume: Volume,
}

impl TopologySpec {
    /// Builds a controller by replaying the specification as operator commands. The first
    /// rejected command aborts the build.
    pub fn build(self, opts: ControllerOpts) -> Result<Controller, Error> {
        let mut controller = Controller::new(opts);
        for id in self.nodes {
            controller.add_node(id)?;
        }
        for LinkSpec {
            a,
            b,
            weight,
            capacity,
        } in &self.links
        {
            controller.add_link_with_defaults(a, b, *weight, *capacity)?;
        }
        for FlowSpec {
            src,
            dst,
            traffic,
            volume,
        } in &self.flows
        {
            controller.inject(src, dst, *traffic, *volume)?;
        }
        info!(
            "loaded {} nodes, {} links, {} flows",
            controller.topology().nr_nodes(),
            controller.topology().nr_links(),
            controller.nr_flows()
        );
        Ok(controller)
    }
}

/// Error kinds for specifications and I/O.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unknown file type.
    #[error("unknown file type: {0}")]
    UnknownFileType(PathBuf),

    /// Error deserializing JSON.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("IO error")]
    Io(#[from] std::io::Error),

    /// The specification was rejected by the controller.
    #[error("invalid specification")]
    Controller(#[from] sdnroute_core::Error),
}
