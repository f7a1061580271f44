//! Spatial-subsystem error type.

use thiserror::Error;

use rp_core::NodeId;

/// Errors produced by `rp-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: NodeId, to: NodeId },

    #[error("{0} not found in network")]
    NodeNotFound(NodeId),

    #[error("network has no nodes")]
    EmptyNetwork,
}

pub type SpatialResult<T> = Result<T, SpatialError>;
