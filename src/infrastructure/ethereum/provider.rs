//! Ethereum provider abstraction and Alloy implementations
//!
//! The provider stands in for the browser wallet: it owns the unlocked
//! accounts and signs whatever `eth_sendTransaction` it is handed.

use std::path::PathBuf;

use alloy::network::Ethereum;
use alloy::primitives::{Address, U256};
use alloy::providers::{
    fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
    Identity, Provider, ProviderBuilder, RootProvider,
};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::TransportError;
use anyhow::{Context, Result};

use crate::infrastructure::ethereum::types::InvocationReceipt;

/// Provider configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderConfig {
    /// HTTP JSON-RPC endpoint
    Http(String),
    /// WebSocket endpoint
    WebSocket(String),
    /// IPC socket path (Unix only)
    #[cfg(unix)]
    Ipc(PathBuf),
}

impl ProviderConfig {
    /// Get display name for this endpoint
    pub fn display(&self) -> String {
        match self {
            ProviderConfig::Http(url) => url.clone(),
            ProviderConfig::WebSocket(url) => url.clone(),
            #[cfg(unix)]
            ProviderConfig::Ipc(path) => path.display().to_string(),
        }
    }
}

/// Abstract wallet provider
///
/// Covers exactly what the faucet screen needs: account discovery and
/// authorization, network identity, balances and transaction submission.
#[async_trait::async_trait]
pub trait EthereumProvider: Send + Sync + 'static {
    /// `eth_chainId`
    async fn chain_id(&self) -> Result<u64>;

    /// `net_version`, the key used by deployment artifacts
    async fn network_id(&self) -> Result<u64>;

    /// Accounts the provider has already authorized (`eth_accounts`)
    async fn accounts(&self) -> Result<Vec<Address>>;

    /// Prompt the provider to authorize accounts (`eth_requestAccounts`)
    async fn request_accounts(&self) -> Result<Vec<Address>>;

    /// Get account balance in wei
    async fn get_balance(&self, address: Address) -> Result<U256>;

    /// Submit a transaction signed by the provider and wait for its receipt
    async fn send_transaction(&self, request: TransactionRequest) -> Result<InvocationReceipt>;

    /// Get endpoint display name
    fn endpoint_name(&self) -> String;
}

// Type aliases for the filled providers
type FilledProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
    Ethereum,
>;

/// Enum-based provider that stores concrete types for each transport
pub enum AlloyProvider {
    Http {
        provider: FilledProvider,
        endpoint: String,
    },
    WebSocket {
        provider: FilledProvider,
        endpoint: String,
    },
    #[cfg(unix)]
    Ipc {
        provider: FilledProvider,
        endpoint: String,
    },
}

/// Create a provider from configuration
pub async fn create_provider(config: ProviderConfig) -> Result<Box<dyn EthereumProvider>> {
    match config {
        ProviderConfig::Http(url) => {
            let rpc_url = url.parse().context("Invalid HTTP URL")?;
            let provider = ProviderBuilder::new().connect_http(rpc_url);
            Ok(Box::new(AlloyProvider::Http {
                provider,
                endpoint: url,
            }))
        }
        ProviderConfig::WebSocket(url) => {
            let provider = ProviderBuilder::new()
                .connect(&url)
                .await
                .context("Failed to create WebSocket provider")?;
            Ok(Box::new(AlloyProvider::WebSocket {
                provider,
                endpoint: url,
            }))
        }
        #[cfg(unix)]
        ProviderConfig::Ipc(path) => {
            use alloy::providers::IpcConnect;
            let ipc_path = path.to_string_lossy().to_string();
            let ipc = IpcConnect::new(ipc_path);
            let provider = ProviderBuilder::new()
                .connect_ipc(ipc)
                .await
                .context("Failed to create IPC provider")?;
            let display = path.display().to_string();
            Ok(Box::new(AlloyProvider::Ipc {
                provider,
                endpoint: display,
            }))
        }
    }
}

// Macro to reduce code duplication for provider method implementations
macro_rules! impl_provider_method {
    ($self:ident, $method:ident $(, $arg:expr)*) => {
        match $self {
            AlloyProvider::Http { provider, .. } => provider.$method($($arg),*).await,
            AlloyProvider::WebSocket { provider, .. } => provider.$method($($arg),*).await,
            #[cfg(unix)]
            AlloyProvider::Ipc { provider, .. } => provider.$method($($arg),*).await,
        }
    };
}

#[async_trait::async_trait]
impl EthereumProvider for AlloyProvider {
    async fn chain_id(&self) -> Result<u64> {
        Ok(impl_provider_method!(self, get_chain_id)?)
    }

    async fn network_id(&self) -> Result<u64> {
        Ok(impl_provider_method!(self, get_net_version)?)
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(impl_provider_method!(self, get_accounts)?)
    }

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        let requested: Result<Vec<Address>, TransportError> = match self {
            AlloyProvider::Http { provider, .. } => {
                provider
                    .raw_request("eth_requestAccounts".into(), ())
                    .await
            }
            AlloyProvider::WebSocket { provider, .. } => {
                provider
                    .raw_request("eth_requestAccounts".into(), ())
                    .await
            }
            #[cfg(unix)]
            AlloyProvider::Ipc { provider, .. } => {
                provider
                    .raw_request("eth_requestAccounts".into(), ())
                    .await
            }
        };
        match requested {
            Ok(accounts) => Ok(accounts),
            // Dev nodes have no authorization flow; their unlocked accounts are the answer
            Err(err) if is_method_not_found(&err) => {
                tracing::debug!("eth_requestAccounts unsupported, using eth_accounts: {err}");
                self.accounts().await
            }
            Err(err) => Err(err).context("eth_requestAccounts failed"),
        }
    }

    async fn get_balance(&self, address: Address) -> Result<U256> {
        Ok(impl_provider_method!(self, get_balance, address)?)
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<InvocationReceipt> {
        let pending = impl_provider_method!(self, send_transaction, request)
            .context("eth_sendTransaction failed")?;
        let receipt = pending
            .get_receipt()
            .await
            .context("Failed waiting for receipt")?;
        Ok(InvocationReceipt::from(&receipt))
    }

    fn endpoint_name(&self) -> String {
        match self {
            AlloyProvider::Http { endpoint, .. } => endpoint.clone(),
            AlloyProvider::WebSocket { endpoint, .. } => endpoint.clone(),
            #[cfg(unix)]
            AlloyProvider::Ipc { endpoint, .. } => endpoint.clone(),
        }
    }
}

fn is_method_not_found(err: &TransportError) -> bool {
    err.as_error_resp()
        .is_some_and(|resp| matches!(resp.code, -32601 | -32004))
}

/// Prefix bare `host:port` endpoints with `http://`
pub fn normalize_http_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}
