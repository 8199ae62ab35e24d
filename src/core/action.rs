//! Actions the view synchronizer asks the outside world to perform

use alloy_primitives::{Address, U256};

/// Side effects returned by [`crate::core::update`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Locate a wallet provider and bind the faucet contract
    DetectProvider { epoch: u64 },

    /// Query the first authorized account
    ResolveAccount { epoch: u64 },

    /// Ask the provider to authorize an account (`eth_requestAccounts`)
    RequestAccounts { epoch: u64 },

    /// Read the contract balance
    LoadBalance { epoch: u64 },

    /// Submit `addFunds()` with `value` attached
    AddFunds {
        epoch: u64,
        from: Address,
        value: U256,
    },

    /// Submit `withdraw(amount)`
    Withdraw {
        epoch: u64,
        from: Address,
        amount: U256,
    },

    /// Show notification in status bar
    Notify(String, NotifyLevel),

    /// Request quit
    Quit,
}

impl Action {
    /// Whether this action has to cross into the async runtime
    pub fn is_runtime(&self) -> bool {
        !matches!(self, Action::Notify(..) | Action::Quit)
    }
}

/// Notification levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Warn,
    Error,
}
