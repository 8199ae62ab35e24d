//! View state of the faucet screen
//!
//! A `ViewState` is never mutated in place by the UI. Every transition goes
//! through [`crate::core::update`], which returns the next revision.

use alloy_primitives::{Address, U256};

use crate::core::units;

/// Amount donated by the deposit button, in ether
pub const DEPOSIT_ETHER: &str = "1";
/// Amount requested by the withdraw button, in ether
pub const WITHDRAW_ETHER: &str = "0.1";

/// Readiness of the screen, derived from the gates in [`ViewState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Uninitialized,
    ProviderResolved,
    AccountResolved,
    BalanceLoaded,
}

/// Outcome of provider detection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProviderStatus {
    #[default]
    Detecting,
    Absent,
    Present { endpoint: String, chain_id: u64 },
}

/// A contract bound by the runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractInfo {
    pub name: String,
    pub address: Address,
    pub network_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationKind {
    Deposit,
    Withdraw,
}

impl InvocationKind {
    pub fn label(&self) -> &'static str {
        match self {
            InvocationKind::Deposit => "addFunds",
            InvocationKind::Withdraw => "withdraw",
        }
    }

    /// Fixed ether amount moved by this invocation
    pub fn ether(&self) -> &'static str {
        match self {
            InvocationKind::Deposit => DEPOSIT_ETHER,
            InvocationKind::Withdraw => WITHDRAW_ETHER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewState {
    /// Reset generation; runtime results from other epochs are dropped
    pub epoch: u64,
    /// Bumped on every accepted transition
    pub revision: u64,
    pub provider: ProviderStatus,
    pub contract: Option<ContractInfo>,
    pub account: Option<Address>,
    /// Raw contract balance in wei; `None` until the first successful read
    pub balance: Option<U256>,
    pub reload: bool,
    /// Number of balance reads issued in this epoch
    pub balance_requests: u64,
    /// Invocations submitted but not yet settled
    pub in_flight: u32,
    pub mounted: bool,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh state for the next epoch, as after a full reload
    pub fn reset_from(previous: &ViewState) -> Self {
        Self {
            epoch: previous.epoch + 1,
            revision: previous.revision + 1,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> Phase {
        if self.balance.is_some() {
            Phase::BalanceLoaded
        } else if self.account.is_some() {
            Phase::AccountResolved
        } else if self.is_provider_loaded() {
            Phase::ProviderResolved
        } else {
            Phase::Uninitialized
        }
    }

    /// Detection finished, whatever its outcome
    pub fn is_provider_loaded(&self) -> bool {
        !matches!(self.provider, ProviderStatus::Detecting)
    }

    pub fn has_provider(&self) -> bool {
        matches!(self.provider, ProviderStatus::Present { .. })
    }

    /// Deposit and withdraw are enabled exactly when both are known
    pub fn can_transact(&self) -> bool {
        self.account.is_some() && self.contract.is_some()
    }

    pub fn balance_display(&self) -> Option<String> {
        self.balance.map(units::from_wei)
    }
}
