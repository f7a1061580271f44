//! Kinetic-tree error type.

use thiserror::Error;

use rp_spatial::SpatialError;

/// Errors produced by `rp-tree`.
///
/// Infeasible insertions are **not** errors — `tentative_insert` reports
/// them as `Ok(None)`.  Errors here are either oracle failures or misuse of
/// the shadow protocol.
#[derive(Debug, Error)]
pub enum TreeError {
    /// `tentative_insert` called while a shadow from a previous call is
    /// still outstanding (neither committed nor discarded).
    #[error("a tentative insertion is already outstanding")]
    ShadowOutstanding,

    /// `commit_tentative` or a shadow query called with no shadow present.
    #[error("no tentative insertion to resolve")]
    NoShadow,

    #[error(transparent)]
    Spatial(#[from] SpatialError),
}

pub type TreeResult<T> = Result<T, TreeError>;
