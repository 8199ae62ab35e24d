//! Contract binding - artifact discovery and the faucet handle

mod contract;
mod loader;

pub use contract::FaucetContract;
pub use loader::{load_contract, ArtifactSource};
