//! Provider gateway - wallet detection and change notifications

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::core::units;
use crate::infrastructure::ethereum::{create_provider, EthereumProvider, ProviderConfig};

/// Chain access bound to a detected provider
#[derive(Clone)]
pub struct ChainClient {
    provider: Arc<dyn EthereumProvider>,
    pub chain_id: u64,
    pub network_id: u64,
}

impl std::fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainClient")
            .field("endpoint", &self.provider.endpoint_name())
            .field("chain_id", &self.chain_id)
            .field("network_id", &self.network_id)
            .finish()
    }
}

impl ChainClient {
    /// Probe a provider and bind to the network it reports
    pub async fn probe(provider: Arc<dyn EthereumProvider>) -> Result<Self> {
        let chain_id = provider.chain_id().await.context("eth_chainId failed")?;
        let network_id = match provider.network_id().await {
            Ok(id) => id,
            Err(err) => {
                warn!(%chain_id, "net_version unavailable, using chain id: {err:#}");
                chain_id
            }
        };
        Ok(Self {
            provider,
            chain_id,
            network_id,
        })
    }

    pub fn provider(&self) -> &Arc<dyn EthereumProvider> {
        &self.provider
    }

    pub fn endpoint(&self) -> String {
        self.provider.endpoint_name()
    }

    pub async fn accounts(&self) -> Result<Vec<Address>> {
        self.provider.accounts().await
    }

    pub async fn request_accounts(&self) -> Result<Vec<Address>> {
        self.provider.request_accounts().await
    }

    pub async fn balance(&self, address: Address) -> Result<U256> {
        self.provider.get_balance(address).await
    }

    /// Decimal ether rendering of a wei amount
    pub fn from_wei(wei: U256) -> String {
        units::from_wei(wei)
    }
}

/// Outcome of a detection attempt
#[derive(Debug)]
pub enum Detection {
    Found(ChainClient),
    Absent { tried: Vec<String> },
}

impl Detection {
    pub fn describe_absence(tried: &[String]) -> String {
        if tried.is_empty() {
            "no endpoints configured".to_string()
        } else {
            format!("nothing answered at {}", tried.join(", "))
        }
    }
}

/// Try every endpoint once, in order; the first that answers wins
pub async fn detect_provider(endpoints: &[ProviderConfig]) -> Detection {
    let mut tried = Vec::new();
    for endpoint in endpoints {
        tried.push(endpoint.display());
        let provider = match create_provider(endpoint.clone()).await {
            Ok(provider) => Arc::<dyn EthereumProvider>::from(provider),
            Err(err) => {
                warn!(endpoint = %endpoint.display(), "provider unavailable: {err:#}");
                continue;
            }
        };
        match ChainClient::probe(provider).await {
            Ok(client) => {
                info!(
                    endpoint = %client.endpoint(),
                    chain_id = client.chain_id,
                    network_id = client.network_id,
                    "wallet provider detected"
                );
                return Detection::Found(client);
            }
            Err(err) => {
                warn!(endpoint = %endpoint.display(), "provider did not answer: {err:#}");
            }
        }
    }
    warn!("Please start a wallet provider! {}", Detection::describe_absence(&tried));
    Detection::Absent { tried }
}

/// Notifications a wallet would push on its own
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderNotification {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
}

impl ProviderNotification {
    pub fn describe(&self) -> String {
        match self {
            ProviderNotification::AccountsChanged(accounts) => match accounts.first() {
                Some(account) => format!("Account changed to {account}"),
                None => "Accounts disconnected".to_string(),
            },
            ProviderNotification::ChainChanged(chain_id) => {
                format!("Network changed to chain {chain_id}")
            }
        }
    }
}

/// Tracks the last observed accounts and chain to derive change notifications
#[derive(Debug, Clone, Default)]
pub struct ProviderWatch {
    accounts: Option<Vec<Address>>,
    chain_id: Option<u64>,
}

impl ProviderWatch {
    pub fn new(chain_id: u64) -> Self {
        Self {
            accounts: None,
            chain_id: Some(chain_id),
        }
    }

    /// Record a list the app already knows about without notifying
    pub fn acknowledge_accounts(&mut self, accounts: Vec<Address>) {
        self.accounts = Some(accounts);
    }

    /// Compare a fresh observation with the last one
    ///
    /// The first account observation only sets the baseline. A chain switch
    /// wins over an account switch seen in the same poll.
    pub fn observe(&mut self, accounts: Vec<Address>, chain_id: u64) -> Option<ProviderNotification> {
        let chain_changed = self.chain_id.is_some_and(|last| last != chain_id);
        let accounts_changed = self
            .accounts
            .as_ref()
            .is_some_and(|last| *last != accounts);

        self.chain_id = Some(chain_id);
        self.accounts = Some(accounts.clone());

        if chain_changed {
            Some(ProviderNotification::ChainChanged(chain_id))
        } else if accounts_changed {
            Some(ProviderNotification::AccountsChanged(accounts))
        } else {
            None
        }
    }

    /// Poll the provider once
    pub async fn poll(&mut self, client: &ChainClient) -> Result<Option<ProviderNotification>> {
        let chain_id = client.provider.chain_id().await?;
        let accounts = client.accounts().await?;
        Ok(self.observe(accounts, chain_id))
    }
}
