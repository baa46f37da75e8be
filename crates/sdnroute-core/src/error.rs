use crate::{
    network::{topology, types::NodeId},
    routing,
    traffic::{self, FlowId},
};

/// Errors returned by [`Controller`](crate::Controller) operations. A failed operation leaves
/// the controller state untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Topology(#[from] topology::Error),

    #[error(transparent)]
    Routing(#[from] routing::Error),

    #[error(transparent)]
    Traffic(#[from] traffic::Error),

    #[error("node {0} does not exist")]
    NodeNotFound(NodeId),

    #[error("flow {0} does not exist")]
    FlowNotFound(FlowId),

    #[error("flow volume must be positive")]
    ZeroVolume,
}

/// The coarse error taxonomy reported to operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ErrorKind {
    NodeNotFound,
    LinkNotFound,
    DuplicateEntity,
    InvalidArgument,
    UnreachableDestination,
}

impl Error {
    pub(crate) fn unreachable(src: &NodeId, dst: &NodeId) -> Self {
        Error::Routing(routing::Error::Unreachable {
            src: src.clone(),
            dst: dst.clone(),
        })
    }

    pub fn kind(&self) -> ErrorKind {
        use topology::Error as T;
        match self {
            Error::Topology(T::NodeNotFound(..)) | Error::NodeNotFound(..) => {
                ErrorKind::NodeNotFound
            }
            Error::Topology(T::LinkNotFound { .. }) => ErrorKind::LinkNotFound,
            Error::Topology(T::DuplicateNode(..) | T::DuplicateLink { .. }) => {
                ErrorKind::DuplicateEntity
            }
            Error::Topology(
                T::NodeAdjacentSelf(..) | T::ZeroWeight { .. } | T::ZeroCapacity { .. },
            )
            | Error::Traffic(traffic::Error::VolumeOverflow { .. })
            | Error::FlowNotFound(..)
            | Error::ZeroVolume => ErrorKind::InvalidArgument,
            Error::Routing(routing::Error::Unreachable { .. }) => {
                ErrorKind::UnreachableDestination
            }
        }
    }
}
