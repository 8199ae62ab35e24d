//! View synchronizer: the only place where `ViewState` changes
//!
//! `update` takes the current revision and a message and returns the next
//! revision plus the actions to perform. Results from the runtime carry the
//! epoch they were requested in; anything from an older epoch is ignored.

use alloy_primitives::{Address, B256, U256};
use tracing::{debug, warn};

use crate::core::state::{ContractInfo, InvocationKind, ProviderStatus, ViewState};
use crate::core::units;
use crate::core::{Action, NotifyLevel};

/// Inputs to the synchronizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The screen is up; start detection
    Mounted,
    ProviderDetected {
        epoch: u64,
        endpoint: String,
        chain_id: u64,
    },
    ProviderAbsent {
        epoch: u64,
        reason: String,
    },
    ContractResolved {
        epoch: u64,
        contract: ContractInfo,
    },
    ContractUnavailable {
        epoch: u64,
        message: String,
    },
    AccountResolved {
        epoch: u64,
        account: Option<Address>,
    },
    BalanceLoaded {
        epoch: u64,
        wei: U256,
    },
    QueryFailed {
        epoch: u64,
        message: String,
    },
    InvocationCompleted {
        epoch: u64,
        kind: InvocationKind,
        tx_hash: B256,
    },
    InvocationFailed {
        epoch: u64,
        kind: InvocationKind,
        message: String,
    },
    /// Account or network switched under us
    EnvironmentChanged {
        epoch: u64,
        reason: String,
    },
    ConnectRequested,
    DepositRequested,
    WithdrawRequested,
    ReloadRequested,
}

impl Msg {
    fn epoch(&self) -> Option<u64> {
        match self {
            Msg::ProviderDetected { epoch, .. }
            | Msg::ProviderAbsent { epoch, .. }
            | Msg::ContractResolved { epoch, .. }
            | Msg::ContractUnavailable { epoch, .. }
            | Msg::AccountResolved { epoch, .. }
            | Msg::BalanceLoaded { epoch, .. }
            | Msg::QueryFailed { epoch, .. }
            | Msg::InvocationCompleted { epoch, .. }
            | Msg::InvocationFailed { epoch, .. }
            | Msg::EnvironmentChanged { epoch, .. } => Some(*epoch),
            Msg::Mounted
            | Msg::ConnectRequested
            | Msg::DepositRequested
            | Msg::WithdrawRequested
            | Msg::ReloadRequested => None,
        }
    }
}

/// Apply one message to the current revision
pub fn update(state: &ViewState, msg: Msg) -> (ViewState, Vec<Action>) {
    if let Some(epoch) = msg.epoch() {
        if epoch != state.epoch {
            debug!(epoch, current = state.epoch, ?msg, "dropping stale runtime result");
            return (state.clone(), Vec::new());
        }
    }

    let mut next = state.clone();
    next.revision += 1;
    let mut actions = Vec::new();
    let epoch = state.epoch;

    match msg {
        Msg::Mounted => {
            if state.mounted {
                return (state.clone(), Vec::new());
            }
            next.mounted = true;
            actions.push(Action::DetectProvider { epoch });
        }

        Msg::ProviderDetected {
            endpoint, chain_id, ..
        } => {
            next.provider = ProviderStatus::Present { endpoint, chain_id };
            actions.push(Action::ResolveAccount { epoch });
        }

        Msg::ProviderAbsent { reason, .. } => {
            next.provider = ProviderStatus::Absent;
            next.contract = None;
            next.account = None;
            next.balance = None;
            actions.push(Action::Notify(
                format!("Wallet is not detected! ({reason})"),
                NotifyLevel::Warn,
            ));
        }

        Msg::ContractResolved { contract, .. } => {
            if !state.has_provider() {
                warn!(contract = %contract.name, "contract resolved without a provider");
                return (state.clone(), Vec::new());
            }
            next.contract = Some(contract);
            request_balance(&mut next, &mut actions);
        }

        Msg::ContractUnavailable { message, .. } => {
            next.contract = None;
            actions.push(Action::Notify(message, NotifyLevel::Error));
        }

        Msg::AccountResolved { account, .. } => {
            if !state.has_provider() {
                return (state.clone(), Vec::new());
            }
            next.account = account;
        }

        Msg::BalanceLoaded { wei, .. } => {
            if state.contract.is_none() {
                return (state.clone(), Vec::new());
            }
            next.balance = Some(wei);
        }

        Msg::QueryFailed { message, .. } => {
            actions.push(Action::Notify(message, NotifyLevel::Error));
        }

        Msg::InvocationCompleted { kind, tx_hash, .. } => {
            next.in_flight = state.in_flight.saturating_sub(1);
            actions.push(Action::Notify(
                format!("{} mined: {tx_hash}", kind.label()),
                NotifyLevel::Info,
            ));
            if next.contract.is_some() {
                next.reload = !state.reload;
                request_balance(&mut next, &mut actions);
            }
        }

        Msg::InvocationFailed { kind, message, .. } => {
            next.in_flight = state.in_flight.saturating_sub(1);
            actions.push(Action::Notify(
                format!("{} rejected: {message}", kind.label()),
                NotifyLevel::Error,
            ));
        }

        Msg::EnvironmentChanged { reason, .. } => {
            next = ViewState::reset_from(state);
            next.mounted = true;
            actions.push(Action::Notify(
                format!("{reason}; reloading"),
                NotifyLevel::Warn,
            ));
            actions.push(Action::DetectProvider { epoch: next.epoch });
        }

        Msg::ConnectRequested => match &state.provider {
            ProviderStatus::Present { .. } if state.account.is_none() => {
                actions.push(Action::RequestAccounts { epoch });
            }
            ProviderStatus::Present { .. } => {
                return (state.clone(), Vec::new());
            }
            ProviderStatus::Absent => {
                return (
                    state.clone(),
                    vec![Action::Notify(
                        "No wallet provider to connect to".to_string(),
                        NotifyLevel::Warn,
                    )],
                );
            }
            ProviderStatus::Detecting => {
                return (state.clone(), Vec::new());
            }
        },

        Msg::DepositRequested => match invocation(state, InvocationKind::Deposit) {
            Ok(action) => {
                next.in_flight += 1;
                actions.push(action);
            }
            Err(notice) => return (state.clone(), vec![notice]),
        },

        Msg::WithdrawRequested => match invocation(state, InvocationKind::Withdraw) {
            Ok(action) => {
                next.in_flight += 1;
                actions.push(action);
            }
            Err(notice) => return (state.clone(), vec![notice]),
        },

        Msg::ReloadRequested => {
            if state.contract.is_none() {
                return (state.clone(), Vec::new());
            }
            next.reload = !state.reload;
            request_balance(&mut next, &mut actions);
        }
    }

    (next, actions)
}

fn request_balance(next: &mut ViewState, actions: &mut Vec<Action>) {
    next.balance_requests += 1;
    actions.push(Action::LoadBalance { epoch: next.epoch });
}

fn invocation(state: &ViewState, kind: InvocationKind) -> Result<Action, Action> {
    let (Some(from), Some(_)) = (state.account, state.contract.as_ref()) else {
        return Err(Action::Notify(
            "Connect an account and a deployed faucet first".to_string(),
            NotifyLevel::Warn,
        ));
    };
    let amount = units::to_wei(kind.ether())
        .map_err(|err| Action::Notify(err.to_string(), NotifyLevel::Error))?;
    let epoch = state.epoch;
    Ok(match kind {
        InvocationKind::Deposit => Action::AddFunds {
            epoch,
            from,
            value: amount,
        },
        InvocationKind::Withdraw => Action::Withdraw {
            epoch,
            from,
            amount,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::Phase;

    const ENDPOINT: &str = "http://127.0.0.1:8545";

    fn account() -> Address {
        Address::repeat_byte(0xab)
    }

    fn faucet() -> ContractInfo {
        ContractInfo {
            name: "Faucet".to_string(),
            address: Address::repeat_byte(0xfa),
            network_id: 5777,
        }
    }

    fn run(state: &ViewState, msgs: impl IntoIterator<Item = Msg>) -> (ViewState, Vec<Action>) {
        let mut state = state.clone();
        let mut all = Vec::new();
        for msg in msgs {
            let (next, actions) = update(&state, msg);
            state = next;
            all.extend(actions);
        }
        (state, all)
    }

    fn runtime_actions(actions: &[Action]) -> Vec<Action> {
        actions.iter().filter(|a| a.is_runtime()).cloned().collect()
    }

    fn connected() -> ViewState {
        let (state, _) = run(
            &ViewState::new(),
            [
                Msg::Mounted,
                Msg::ProviderDetected {
                    epoch: 0,
                    endpoint: ENDPOINT.into(),
                    chain_id: 1337,
                },
                Msg::ContractResolved {
                    epoch: 0,
                    contract: faucet(),
                },
                Msg::AccountResolved {
                    epoch: 0,
                    account: Some(account()),
                },
            ],
        );
        state
    }

    fn load_balance_count(actions: &[Action]) -> usize {
        actions
            .iter()
            .filter(|a| matches!(a, Action::LoadBalance { .. }))
            .count()
    }

    #[test]
    fn test_mount_detects_once() {
        let (state, actions) = run(&ViewState::new(), [Msg::Mounted, Msg::Mounted]);
        assert_eq!(actions, vec![Action::DetectProvider { epoch: 0 }]);
        assert!(state.mounted);
    }

    #[test]
    fn test_detection_chain_requests_account_then_balance() {
        let (_, actions) = run(
            &ViewState::new(),
            [
                Msg::Mounted,
                Msg::ProviderDetected {
                    epoch: 0,
                    endpoint: ENDPOINT.into(),
                    chain_id: 1337,
                },
                Msg::ContractResolved {
                    epoch: 0,
                    contract: faucet(),
                },
            ],
        );
        assert_eq!(
            runtime_actions(&actions),
            vec![
                Action::DetectProvider { epoch: 0 },
                Action::ResolveAccount { epoch: 0 },
                Action::LoadBalance { epoch: 0 },
            ]
        );
    }

    #[test]
    fn test_no_provider_reaches_loaded_without_queries() {
        let (state, actions) = run(
            &ViewState::new(),
            [
                Msg::Mounted,
                Msg::ProviderAbsent {
                    epoch: 0,
                    reason: "no endpoint answered".into(),
                },
            ],
        );
        assert!(state.is_provider_loaded());
        assert_eq!(state.phase(), Phase::ProviderResolved);
        assert!(!state.can_transact());
        assert_eq!(
            runtime_actions(&actions),
            vec![Action::DetectProvider { epoch: 0 }]
        );

        // Buttons stay inert
        let (after, actions) = run(&state, [Msg::DepositRequested, Msg::WithdrawRequested]);
        assert!(runtime_actions(&actions).is_empty());
        assert_eq!(after.in_flight, 0);
    }

    #[test]
    fn test_connect_requests_authorization_when_no_account() {
        let (state, _) = run(
            &ViewState::new(),
            [
                Msg::Mounted,
                Msg::ProviderDetected {
                    epoch: 0,
                    endpoint: ENDPOINT.into(),
                    chain_id: 1337,
                },
                Msg::AccountResolved {
                    epoch: 0,
                    account: None,
                },
            ],
        );
        assert!(state.account.is_none());
        assert!(state.balance_display().is_none());

        let (_, actions) = update(&state, Msg::ConnectRequested);
        assert_eq!(actions, vec![Action::RequestAccounts { epoch: 0 }]);
    }

    #[test]
    fn test_contract_balance_loads_before_connect() {
        let (state, actions) = run(
            &ViewState::new(),
            [
                Msg::Mounted,
                Msg::ProviderDetected {
                    epoch: 0,
                    endpoint: ENDPOINT.into(),
                    chain_id: 1337,
                },
                Msg::AccountResolved {
                    epoch: 0,
                    account: None,
                },
                Msg::ContractResolved {
                    epoch: 0,
                    contract: faucet(),
                },
            ],
        );
        assert_eq!(load_balance_count(&actions), 1);
        assert!(!state.can_transact());

        let (state, _) = update(
            &state,
            Msg::BalanceLoaded {
                epoch: 0,
                wei: U256::from(2_000_000_000_000_000_000u128),
            },
        );
        assert!(state.account.is_none());
        assert_eq!(state.balance_display().as_deref(), Some("2"));
    }

    #[test]
    fn test_balance_is_displayed_in_ether() {
        let (state, _) = update(
            &connected(),
            Msg::BalanceLoaded {
                epoch: 0,
                wei: U256::from(2_500_000_000_000_000_000u128),
            },
        );
        assert_eq!(state.balance_display().as_deref(), Some("2.5"));
        assert_eq!(state.phase(), Phase::BalanceLoaded);
    }

    #[test]
    fn test_deposit_submits_one_ether_then_reloads_once() {
        let state = connected();
        let (state, actions) = update(&state, Msg::DepositRequested);
        assert_eq!(
            actions,
            vec![Action::AddFunds {
                epoch: 0,
                from: account(),
                value: U256::from(1_000_000_000_000_000_000u128),
            }]
        );
        assert_eq!(state.in_flight, 1);

        let before = state.balance_requests;
        let reload_before = state.reload;
        let (state, actions) = update(
            &state,
            Msg::InvocationCompleted {
                epoch: 0,
                kind: InvocationKind::Deposit,
                tx_hash: B256::repeat_byte(1),
            },
        );
        assert_eq!(load_balance_count(&actions), 1);
        assert_eq!(state.balance_requests, before + 1);
        assert_ne!(state.reload, reload_before);
        assert_eq!(state.in_flight, 0);
    }

    #[test]
    fn test_withdraw_submits_tenth_of_ether() {
        let (_, actions) = update(&connected(), Msg::WithdrawRequested);
        assert_eq!(
            actions,
            vec![Action::Withdraw {
                epoch: 0,
                from: account(),
                amount: U256::from(100_000_000_000_000_000u128),
            }]
        );
    }

    #[test]
    fn test_every_completion_reloads_exactly_once() {
        let mut state = connected();
        for round in 0..3u64 {
            let (next, _) = update(&state, Msg::ReloadRequested);
            let (next, _) = update(&next, Msg::WithdrawRequested);
            let before = next.balance_requests;
            let (next, actions) = update(
                &next,
                Msg::InvocationCompleted {
                    epoch: 0,
                    kind: InvocationKind::Withdraw,
                    tx_hash: B256::repeat_byte(round as u8),
                },
            );
            assert_eq!(load_balance_count(&actions), 1);
            assert_eq!(next.balance_requests, before + 1);
            state = next;
        }
    }

    #[test]
    fn test_failed_invocation_does_not_reload() {
        let (state, _) = update(&connected(), Msg::DepositRequested);
        let (state, actions) = update(
            &state,
            Msg::InvocationFailed {
                epoch: 0,
                kind: InvocationKind::Deposit,
                message: "user rejected".into(),
            },
        );
        assert_eq!(load_balance_count(&actions), 0);
        assert!(matches!(
            actions.as_slice(),
            [Action::Notify(_, NotifyLevel::Error)]
        ));
        assert_eq!(state.in_flight, 0);
    }

    #[test]
    fn test_query_failure_keeps_stale_balance() {
        let (state, _) = update(
            &connected(),
            Msg::BalanceLoaded {
                epoch: 0,
                wei: U256::from(7u64),
            },
        );
        let (state, _) = update(
            &state,
            Msg::QueryFailed {
                epoch: 0,
                message: "timeout".into(),
            },
        );
        assert_eq!(state.balance, Some(U256::from(7u64)));
    }

    #[test]
    fn test_environment_change_resets_and_redetects() {
        let (state, _) = update(
            &connected(),
            Msg::BalanceLoaded {
                epoch: 0,
                wei: U256::from(7u64),
            },
        );
        let (state, actions) = update(
            &state,
            Msg::EnvironmentChanged {
                epoch: 0,
                reason: "account changed".into(),
            },
        );
        assert_eq!(state.epoch, 1);
        assert_eq!(state.phase(), Phase::Uninitialized);
        assert!(state.account.is_none());
        assert!(state.contract.is_none());
        assert!(state.balance.is_none());
        assert_eq!(
            runtime_actions(&actions),
            vec![Action::DetectProvider { epoch: 1 }]
        );
    }

    #[test]
    fn test_stale_results_are_dropped_after_reset() {
        let (state, _) = update(
            &connected(),
            Msg::EnvironmentChanged {
                epoch: 0,
                reason: "chain changed".into(),
            },
        );
        let (after, actions) = update(
            &state,
            Msg::BalanceLoaded {
                epoch: 0,
                wei: U256::from(9u64),
            },
        );
        assert!(actions.is_empty());
        assert_eq!(after, state);
    }

    #[test]
    fn test_gating_holds_across_reachable_states() {
        let msgs = vec![
            Msg::Mounted,
            Msg::ProviderDetected {
                epoch: 0,
                endpoint: ENDPOINT.into(),
                chain_id: 1,
            },
            Msg::AccountResolved {
                epoch: 0,
                account: Some(account()),
            },
            Msg::ContractResolved {
                epoch: 0,
                contract: faucet(),
            },
            Msg::ContractUnavailable {
                epoch: 0,
                message: "no deployment".into(),
            },
            Msg::EnvironmentChanged {
                epoch: 0,
                reason: "account changed".into(),
            },
        ];
        let mut state = ViewState::new();
        for msg in msgs {
            state = update(&state, msg).0;
            let (_, actions) = update(&state, Msg::DepositRequested);
            let submitted = actions
                .iter()
                .any(|a| matches!(a, Action::AddFunds { .. }));
            assert_eq!(submitted, state.can_transact());
            assert_eq!(
                state.can_transact(),
                state.account.is_some() && state.contract.is_some()
            );
        }
    }
}
