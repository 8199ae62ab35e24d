//! Contract build artifacts and the failures that can occur resolving them
//!
//! An artifact is the JSON a Solidity toolchain writes next to the compiled
//! contract. Truffle-style artifacts also record per-network deployments.

mod error;
mod model;

pub use error::{ArtifactError, FaucetError};
pub use model::Artifact;
