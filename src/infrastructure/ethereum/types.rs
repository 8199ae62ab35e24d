//! Type conversions between Alloy types and runtime types

use alloy::primitives::B256;
use alloy::rpc::types::TransactionReceipt;

/// The parts of a mined receipt the faucet screen reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationReceipt {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub success: bool,
}

impl From<&TransactionReceipt> for InvocationReceipt {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            success: receipt.status(),
        }
    }
}
