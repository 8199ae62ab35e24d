//! Runtime bridge - connects sync TUI thread with async Tokio runtime
//!
//! This module provides a bridge between the synchronous TUI (ratatui) thread
//! and the asynchronous Tokio runtime that talks to the wallet provider.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use alloy::primitives::{Address, B256, U256};
use tokio::runtime::Runtime;
use tracing::error;

use crate::core::{Action, ContractInfo, InvocationKind, Msg};
use crate::infrastructure::artifact::ArtifactSource;
use crate::infrastructure::ethereum::ProviderConfig;
use crate::infrastructure::runtime::worker::run_async_worker;

/// Commands sent from the TUI to the async worker
///
/// Every command carries the view epoch it was issued in; the worker echoes
/// it back on the matching event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCommand {
    /// Drop any session and detect a provider from scratch
    Detect { epoch: u64 },
    /// Query the first authorized account
    ResolveAccount { epoch: u64 },
    /// `eth_requestAccounts`
    RequestAccounts { epoch: u64 },
    /// Read the faucet balance
    LoadBalance { epoch: u64 },
    /// Call `addFunds()` with value
    AddFunds {
        epoch: u64,
        from: Address,
        value: U256,
    },
    /// Call `withdraw(amount)`
    Withdraw {
        epoch: u64,
        from: Address,
        amount: U256,
    },
    /// Shutdown the worker
    Shutdown,
}

impl RuntimeCommand {
    /// Translate a synchronizer action; `None` for UI-only actions
    pub fn from_action(action: &Action) -> Option<Self> {
        Some(match *action {
            Action::DetectProvider { epoch } => RuntimeCommand::Detect { epoch },
            Action::ResolveAccount { epoch } => RuntimeCommand::ResolveAccount { epoch },
            Action::RequestAccounts { epoch } => RuntimeCommand::RequestAccounts { epoch },
            Action::LoadBalance { epoch } => RuntimeCommand::LoadBalance { epoch },
            Action::AddFunds { epoch, from, value } => {
                RuntimeCommand::AddFunds { epoch, from, value }
            }
            Action::Withdraw {
                epoch,
                from,
                amount,
            } => RuntimeCommand::Withdraw {
                epoch,
                from,
                amount,
            },
            Action::Notify(..) | Action::Quit => return None,
        })
    }
}

/// Events sent from the async worker to the TUI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
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
    InvocationSubmitted {
        epoch: u64,
        kind: InvocationKind,
        from: Address,
        value: U256,
    },
    InvocationCompleted {
        epoch: u64,
        kind: InvocationKind,
        tx_hash: B256,
        block_number: Option<u64>,
        gas_used: u64,
    },
    InvocationFailed {
        epoch: u64,
        kind: InvocationKind,
        message: String,
    },
    QueryFailed {
        epoch: u64,
        message: String,
    },
    /// Account or network switch seen by the provider watch
    EnvironmentChanged {
        epoch: u64,
        reason: String,
    },
    /// Error occurred
    Error { message: String },
}

impl RuntimeEvent {
    /// The synchronizer message for this event, if it drives view state
    pub fn into_msg(self) -> Option<Msg> {
        Some(match self {
            RuntimeEvent::ProviderDetected {
                epoch,
                endpoint,
                chain_id,
            } => Msg::ProviderDetected {
                epoch,
                endpoint,
                chain_id,
            },
            RuntimeEvent::ProviderAbsent { epoch, reason } => Msg::ProviderAbsent { epoch, reason },
            RuntimeEvent::ContractResolved { epoch, contract } => {
                Msg::ContractResolved { epoch, contract }
            }
            RuntimeEvent::ContractUnavailable { epoch, message } => {
                Msg::ContractUnavailable { epoch, message }
            }
            RuntimeEvent::AccountResolved { epoch, account } => {
                Msg::AccountResolved { epoch, account }
            }
            RuntimeEvent::BalanceLoaded { epoch, wei } => Msg::BalanceLoaded { epoch, wei },
            RuntimeEvent::InvocationCompleted {
                epoch,
                kind,
                tx_hash,
                ..
            } => Msg::InvocationCompleted {
                epoch,
                kind,
                tx_hash,
            },
            RuntimeEvent::InvocationFailed {
                epoch,
                kind,
                message,
            } => Msg::InvocationFailed {
                epoch,
                kind,
                message,
            },
            RuntimeEvent::QueryFailed { epoch, message } => Msg::QueryFailed { epoch, message },
            RuntimeEvent::EnvironmentChanged { epoch, reason } => {
                Msg::EnvironmentChanged { epoch, reason }
            }
            RuntimeEvent::InvocationSubmitted { .. } | RuntimeEvent::Error { .. } => return None,
        })
    }
}

/// Static settings for the worker
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub endpoints: Vec<ProviderConfig>,
    pub artifact: ArtifactSource,
    /// How often the provider is checked for account/network switches
    pub watch_interval: Duration,
}

/// Bridge between sync TUI thread and async Tokio runtime
pub struct RuntimeBridge {
    cmd_tx: Sender<RuntimeCommand>,
    evt_rx: Receiver<RuntimeEvent>,
}

impl RuntimeBridge {
    /// Create a new runtime bridge with the given settings
    pub fn new(settings: WorkerSettings) -> anyhow::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<RuntimeCommand>();
        let (evt_tx, evt_rx) = mpsc::channel::<RuntimeEvent>();

        // The runtime is built here so a failure surfaces to the caller
        let rt = Runtime::new()?;

        // Spawn the worker thread with its own Tokio runtime
        thread::Builder::new()
            .name("faucet-runtime".into())
            .spawn(move || {
                rt.block_on(async {
                    if let Err(err) = run_async_worker(settings, cmd_rx, evt_tx.clone()).await {
                        error!("worker exited: {err:#}");
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!("Worker exited: {:#}", err),
                        });
                    }
                });
            })?;

        Ok(Self { cmd_tx, evt_rx })
    }

    /// Send a command to the async worker
    pub fn send(&self, cmd: RuntimeCommand) -> anyhow::Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| anyhow::anyhow!("Worker channel closed"))
    }

    /// Poll for events (non-blocking)
    pub fn poll_events(&self) -> Vec<RuntimeEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.evt_rx.try_recv() {
            events.push(evt);
        }
        events
    }
}

impl Drop for RuntimeBridge {
    fn drop(&mut self) {
        // Try to send shutdown command
        let _ = self.cmd_tx.send(RuntimeCommand::Shutdown);
    }
}
