//! `rp-tree` — the kinetic tree.
//!
//! A kinetic tree maintains, per vehicle, every still-feasible ordering of
//! its outstanding pickup and dropoff stops as root-to-leaf paths of one
//! branching structure.  The matcher probes it with
//! [`KineticTree::tentative_insert`] to learn the cheapest way a vehicle
//! could additionally serve a request, then commits or discards the result.
//!
//! # Crate layout
//!
//! | Module    | Contents                                             |
//! |-----------|------------------------------------------------------|
//! | [`tree`]  | `KineticTree`, `InsertRequest`, `PathStop`           |
//! | `node`    | arena storage (crate-private)                        |
//! | [`error`] | `TreeError`, `TreeResult<T>`                         |

pub mod error;
mod node;
pub mod tree;


pub use error::{TreeError, TreeResult};
pub use tree::{InsertRequest, KineticTree, PathStop};
