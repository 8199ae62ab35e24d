//! In-memory provider for tests

use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, B256, U256};
use alloy::rpc::types::TransactionRequest;
use anyhow::{anyhow, Result};

use crate::infrastructure::ethereum::{EthereumProvider, InvocationReceipt};

#[derive(Debug, Default)]
pub struct MockState {
    pub chain_id: u64,
    pub network_id: u64,
    pub accounts: Vec<Address>,
    pub requestable: Vec<Address>,
    pub balances: Vec<(Address, U256)>,
    pub sent: Vec<TransactionRequest>,
    pub balance_reads: usize,
    pub reject_sends: Option<String>,
    pub revert_sends: bool,
    pub offline: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    pub state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    pub fn new(chain_id: u64, network_id: u64) -> Self {
        let provider = Self::default();
        {
            let mut state = provider.state.lock().unwrap();
            state.chain_id = chain_id;
            state.network_id = network_id;
        }
        provider
    }

    pub fn with_accounts(self, accounts: Vec<Address>) -> Self {
        self.state.lock().unwrap().accounts = accounts;
        self
    }

    pub fn set_balance(&self, address: Address, wei: U256) {
        let mut state = self.state.lock().unwrap();
        state.balances.retain(|(addr, _)| *addr != address);
        state.balances.push((address, wei));
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.state.lock().unwrap().sent.clone()
    }

    fn check_online(&self) -> Result<()> {
        if self.state.lock().unwrap().offline {
            return Err(anyhow!("connection refused"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl EthereumProvider for MockProvider {
    async fn chain_id(&self) -> Result<u64> {
        self.check_online()?;
        Ok(self.state.lock().unwrap().chain_id)
    }

    async fn network_id(&self) -> Result<u64> {
        self.check_online()?;
        Ok(self.state.lock().unwrap().network_id)
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        self.check_online()?;
        Ok(self.state.lock().unwrap().accounts.clone())
    }

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        if state.accounts.is_empty() {
            state.accounts = state.requestable.clone();
        }
        Ok(state.accounts.clone())
    }

    async fn get_balance(&self, address: Address) -> Result<U256> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        state.balance_reads += 1;
        Ok(state
            .balances
            .iter()
            .find(|(addr, _)| *addr == address)
            .map(|(_, wei)| *wei)
            .unwrap_or(U256::ZERO))
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<InvocationReceipt> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = state.reject_sends.clone() {
            return Err(anyhow!(reason));
        }
        state.sent.push(request);
        let nonce = state.sent.len() as u8;
        Ok(InvocationReceipt {
            tx_hash: B256::repeat_byte(nonce),
            block_number: Some(nonce as u64),
            gas_used: 21_000,
            success: !state.revert_sends,
        })
    }

    fn endpoint_name(&self) -> String {
        "mock://provider".to_string()
    }
}
