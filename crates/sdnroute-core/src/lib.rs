#![warn(unreachable_pub, missing_debug_implementations)]

//! The core of a software-defined networking controller. A [`Controller`] owns a mutable
//! [topology](network::Topology), routes injected flows with a load- and priority-aware
//! [routing algorithm](routing::RoutingAlgo), and recovers flows when links or nodes fail.

#[macro_use]
mod ident;

pub mod constants;
pub mod controller;
mod error;
pub mod failure;
pub mod network;
pub mod opts;
pub mod routing;
pub mod snapshot;
pub mod traffic;
pub mod units;

pub(crate) mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::Controller;
pub use error::{Error, ErrorKind};
pub use failure::RerouteReport;
pub use network::{
    types::{Link, NodeId, TrafficType, UnknownTrafficType},
    EdgeIndex, Topology, TopologyError,
};
pub use opts::ControllerOpts;
pub use routing::{Error as RoutingError, LoadAwareRouting, Route, RoutingAlgo};
pub use snapshot::{FlowView, LinkView, NodeView, Snapshot};
pub use traffic::{Error as TrafficError, Flow, FlowId, FlowState};
pub use units::{Volume, Weight};
