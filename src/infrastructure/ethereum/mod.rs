//! Ethereum infrastructure - Alloy provider implementations and wallet detection

mod gateway;
#[cfg(test)]
pub(crate) mod mock;
mod provider;
pub(crate) mod types;

pub use gateway::{detect_provider, ChainClient, Detection, ProviderWatch};
pub use provider::{create_provider, normalize_http_endpoint, EthereumProvider, ProviderConfig};
pub use types::InvocationReceipt;
