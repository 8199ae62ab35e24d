//! Faucet contract handle - calldata from the artifact ABI, sent via the provider

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use alloy_dyn_abi::{DynSolValue, JsonAbiExt};
use alloy_json_abi::JsonAbi;
use anyhow::{anyhow, bail, Context, Result};
use tracing::info;

use crate::core::ContractInfo;
use crate::domain::artifact::{Artifact, ArtifactError};
use crate::infrastructure::ethereum::{ChainClient, InvocationReceipt};

pub const ADD_FUNDS: &str = "addFunds";
pub const WITHDRAW: &str = "withdraw";

/// A deployed faucet bound to a provider
#[derive(Debug, Clone)]
pub struct FaucetContract {
    name: String,
    address: Address,
    abi: JsonAbi,
    client: ChainClient,
}

impl FaucetContract {
    pub fn bind(
        artifact: Artifact,
        address: Address,
        client: ChainClient,
    ) -> Result<Self, ArtifactError> {
        artifact.require_functions(&[ADD_FUNDS, WITHDRAW])?;
        Ok(Self {
            name: artifact.name(),
            address,
            abi: artifact.abi,
            client,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn info(&self) -> ContractInfo {
        ContractInfo {
            name: self.name.clone(),
            address: self.address,
            network_id: self.client.network_id,
        }
    }

    /// Native balance held by the contract, in wei
    pub async fn balance_of(&self) -> Result<U256> {
        self.client.balance(self.address).await
    }

    /// Donate `value` wei from `from`
    pub async fn add_funds(&self, from: Address, value: U256) -> Result<InvocationReceipt> {
        let input = self.encode(ADD_FUNDS, &[])?;
        self.submit(ADD_FUNDS, from, value, input).await
    }

    /// Ask the contract to send `amount` wei back to `from`
    pub async fn withdraw(&self, amount: U256, from: Address) -> Result<InvocationReceipt> {
        let input = self.encode(WITHDRAW, &[DynSolValue::Uint(amount, 256)])?;
        self.submit(WITHDRAW, from, U256::ZERO, input).await
    }

    fn encode(&self, function: &str, args: &[DynSolValue]) -> Result<Bytes> {
        let function = self
            .abi
            .function(function)
            .and_then(|overloads| overloads.first())
            .ok_or_else(|| anyhow!("{} ABI has no {function}()", self.name))?;
        let data = function
            .abi_encode_input(args)
            .with_context(|| format!("Failed to encode {}", function.signature()))?;
        Ok(Bytes::from(data))
    }

    async fn submit(
        &self,
        function: &str,
        from: Address,
        value: U256,
        input: Bytes,
    ) -> Result<InvocationReceipt> {
        let request = TransactionRequest::default()
            .with_from(from)
            .with_to(self.address)
            .with_value(value)
            .with_input(input);

        info!(%from, contract = %self.address, %value, function, "submitting invocation");
        let receipt = self.client.provider().send_transaction(request).await?;
        if !receipt.success {
            bail!("{function} reverted in tx {}", receipt.tx_hash);
        }
        info!(tx = %receipt.tx_hash, block = ?receipt.block_number, "invocation mined");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    use alloy::primitives::{keccak256, TxKind};

    use crate::infrastructure::ethereum::mock::MockProvider;

    const FAUCET_JSON: &str = include_str!("../../../tests/fixtures/Faucet.json");

    fn selector(signature: &str) -> [u8; 4] {
        let hash = keccak256(signature.as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    async fn faucet(provider: MockProvider) -> FaucetContract {
        let artifact =
            Artifact::from_json(FAUCET_JSON, PathBuf::from("Faucet.json")).unwrap();
        let client = ChainClient::probe(Arc::new(provider)).await.unwrap();
        FaucetContract::bind(artifact, Address::repeat_byte(0xfa), client).unwrap()
    }

    fn from() -> Address {
        Address::repeat_byte(0xab)
    }

    #[tokio::test]
    async fn test_balance_of_reads_contract_balance() {
        let provider = MockProvider::new(1337, 5777);
        provider.set_balance(Address::repeat_byte(0xfa), U256::from(42u64));
        let contract = faucet(provider.clone()).await;

        assert_eq!(contract.balance_of().await.unwrap(), U256::from(42u64));
        assert_eq!(contract.balance_of().await.unwrap(), U256::from(42u64));
        assert_eq!(provider.state.lock().unwrap().balance_reads, 2);
    }

    #[tokio::test]
    async fn test_add_funds_attaches_value() {
        let provider = MockProvider::new(1337, 5777);
        let contract = faucet(provider.clone()).await;
        let one_ether = U256::from(1_000_000_000_000_000_000u128);

        contract.add_funds(from(), one_ether).await.unwrap();

        let sent = provider.sent();
        assert_eq!(sent.len(), 1);
        let request = &sent[0];
        assert_eq!(request.from, Some(from()));
        assert_eq!(request.to, Some(TxKind::Call(Address::repeat_byte(0xfa))));
        assert_eq!(request.value, Some(one_ether));
        let input = request.input.input().unwrap();
        assert_eq!(input.as_ref(), selector("addFunds()").as_slice());
    }

    #[tokio::test]
    async fn test_withdraw_encodes_amount() {
        let provider = MockProvider::new(1337, 5777);
        let contract = faucet(provider.clone()).await;
        let amount = U256::from(100_000_000_000_000_000u128);

        contract.withdraw(amount, from()).await.unwrap();

        let sent = provider.sent();
        let input = sent[0].input.input().unwrap();
        assert_eq!(input.len(), 4 + 32);
        assert_eq!(&input[..4], selector("withdraw(uint256)").as_slice());
        assert_eq!(U256::from_be_slice(&input[4..]), amount);
        assert_eq!(sent[0].value, Some(U256::ZERO));
    }

    #[tokio::test]
    async fn test_rejection_propagates() {
        let provider = MockProvider::new(1337, 5777);
        provider.state.lock().unwrap().reject_sends = Some("User denied".into());
        let contract = faucet(provider.clone()).await;

        let err = contract.add_funds(from(), U256::from(1u64)).await.unwrap_err();
        assert!(format!("{err:#}").contains("User denied"));
        assert!(provider.sent().is_empty());
    }

    #[tokio::test]
    async fn test_reverted_receipt_is_an_error() {
        let provider = MockProvider::new(1337, 5777);
        provider.state.lock().unwrap().revert_sends = true;
        let contract = faucet(provider).await;

        let err = contract.withdraw(U256::from(1u64), from()).await.unwrap_err();
        assert!(err.to_string().contains("reverted"));
    }

    #[tokio::test]
    async fn test_bind_requires_faucet_functions() {
        let artifact = Artifact::from_json(
            r#"{"contractName": "Token", "abi": [{"type": "function", "name": "addFunds", "inputs": [], "outputs": [], "stateMutability": "payable"}]}"#,
            PathBuf::from("Token.json"),
        )
        .unwrap();
        let client = ChainClient::probe(Arc::new(MockProvider::new(1, 1)))
            .await
            .unwrap();
        let err = FaucetContract::bind(artifact, Address::ZERO, client).unwrap_err();
        assert!(matches!(err, ArtifactError::MissingFunction { function, .. } if function == "withdraw"));
    }
}
