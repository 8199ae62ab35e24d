//! Async worker - runs in Tokio runtime and owns the provider session

use std::sync::mpsc::{Receiver, Sender};
use std::time::{Duration, Instant};

use alloy::primitives::{Address, U256};
use anyhow::Result;
use tracing::{debug, info, warn};

use crate::core::InvocationKind;
use crate::domain::artifact::FaucetError;
use crate::infrastructure::artifact::{load_contract, FaucetContract};
use crate::infrastructure::ethereum::{detect_provider, ChainClient, Detection, ProviderWatch};
use crate::infrastructure::runtime::bridge::{RuntimeCommand, RuntimeEvent, WorkerSettings};

/// Either a detected provider (with its contract, when one could be bound)
/// or nothing at all
enum Session {
    Disconnected,
    Connected {
        client: ChainClient,
        contract: Option<FaucetContract>,
        watch: ProviderWatch,
    },
}

/// Processes runtime commands one at a time
pub struct Worker {
    settings: WorkerSettings,
    session: Session,
    epoch: u64,
    evt_tx: Sender<RuntimeEvent>,
}

impl Worker {
    pub fn new(settings: WorkerSettings, evt_tx: Sender<RuntimeEvent>) -> Self {
        Self {
            settings,
            session: Session::Disconnected,
            epoch: 0,
            evt_tx,
        }
    }

    fn emit(&self, event: RuntimeEvent) {
        let _ = self.evt_tx.send(event);
    }

    /// Handle one command; returns `false` on shutdown
    pub async fn handle(&mut self, cmd: RuntimeCommand) -> bool {
        match cmd {
            RuntimeCommand::Shutdown => return false,
            RuntimeCommand::Detect { epoch } => self.detect(epoch).await,
            other => self.handle_session_command(other).await,
        }
        true
    }

    async fn detect(&mut self, epoch: u64) {
        // A new epoch discards whatever the previous session was doing
        self.session = Session::Disconnected;
        self.epoch = epoch;

        match detect_provider(&self.settings.endpoints).await {
            Detection::Found(client) => self.attach(epoch, client),
            Detection::Absent { tried } => {
                let reason = Detection::describe_absence(&tried);
                warn!("{}", FaucetError::ProviderAbsent(reason.clone()));
                self.emit(RuntimeEvent::ProviderAbsent { epoch, reason });
            }
        }
    }

    /// Bind a detected client and its contract for `epoch`
    pub fn attach(&mut self, epoch: u64, client: ChainClient) {
        self.epoch = epoch;
        self.emit(RuntimeEvent::ProviderDetected {
            epoch,
            endpoint: client.endpoint(),
            chain_id: client.chain_id,
        });

        let contract = match load_contract(&self.settings.artifact, client.clone()) {
            Ok(contract) => {
                info!(
                    contract = %self.settings.artifact.name,
                    address = %contract.address(),
                    "contract bound"
                );
                self.emit(RuntimeEvent::ContractResolved {
                    epoch,
                    contract: contract.info(),
                });
                Some(contract)
            }
            Err(err) => {
                let err = FaucetError::from(err);
                warn!("{err}");
                self.emit(RuntimeEvent::ContractUnavailable {
                    epoch,
                    message: err.to_string(),
                });
                None
            }
        };

        let watch = ProviderWatch::new(client.chain_id);
        self.session = Session::Connected {
            client,
            contract,
            watch,
        };
    }

    async fn handle_session_command(&mut self, cmd: RuntimeCommand) {
        let epoch = command_epoch(&cmd);
        if epoch != Some(self.epoch) {
            debug!(?cmd, current = self.epoch, "skipping command from a previous epoch");
            return;
        }
        let epoch = self.epoch;

        let Session::Connected {
            client,
            contract,
            watch,
        } = &mut self.session
        else {
            debug!(?cmd, "no provider session; ignoring");
            return;
        };

        match cmd {
            RuntimeCommand::ResolveAccount { .. } => match client.accounts().await {
                Ok(accounts) => {
                    let account = accounts.first().copied();
                    watch.acknowledge_accounts(accounts);
                    let _ = self.evt_tx.send(RuntimeEvent::AccountResolved { epoch, account });
                }
                Err(error) => {
                    let err = FaucetError::QueryFailed {
                        what: "account",
                        error,
                    };
                    warn!("{err}");
                    let _ = self.evt_tx.send(RuntimeEvent::QueryFailed {
                        epoch,
                        message: err.to_string(),
                    });
                }
            },

            RuntimeCommand::RequestAccounts { .. } => match client.request_accounts().await {
                Ok(accounts) => {
                    let account = accounts.first().copied();
                    info!(?account, "accounts authorized");
                    watch.acknowledge_accounts(accounts);
                    let _ = self.evt_tx.send(RuntimeEvent::AccountResolved { epoch, account });
                }
                Err(error) => {
                    let err = FaucetError::InvocationRejected {
                        kind: "eth_requestAccounts",
                        error,
                    };
                    warn!("{err}");
                    let _ = self.evt_tx.send(RuntimeEvent::Error {
                        message: err.to_string(),
                    });
                }
            },

            RuntimeCommand::LoadBalance { .. } => {
                let Some(contract) = contract.as_ref() else {
                    debug!("balance requested without a contract");
                    return;
                };
                match contract.balance_of().await {
                    Ok(wei) => {
                        debug!(%wei, ether = %ChainClient::from_wei(wei), "faucet balance");
                        let _ = self.evt_tx.send(RuntimeEvent::BalanceLoaded { epoch, wei });
                    }
                    Err(error) => {
                        let err = FaucetError::QueryFailed {
                            what: "balance",
                            error,
                        };
                        warn!("{err}");
                        let _ = self.evt_tx.send(RuntimeEvent::QueryFailed {
                            epoch,
                            message: err.to_string(),
                        });
                    }
                }
            }

            RuntimeCommand::AddFunds { from, value, .. } => {
                let contract = contract.clone();
                self.invoke(epoch, contract, InvocationKind::Deposit, from, value)
                    .await;
            }

            RuntimeCommand::Withdraw { from, amount, .. } => {
                let contract = contract.clone();
                self.invoke(epoch, contract, InvocationKind::Withdraw, from, amount)
                    .await;
            }

            RuntimeCommand::Detect { .. } | RuntimeCommand::Shutdown => {}
        }
    }

    async fn invoke(
        &self,
        epoch: u64,
        contract: Option<FaucetContract>,
        kind: InvocationKind,
        from: Address,
        value: U256,
    ) {
        let Some(contract) = contract else {
            self.emit(RuntimeEvent::InvocationFailed {
                epoch,
                kind,
                message: "contract not resolved".to_string(),
            });
            return;
        };

        info!(
            function = kind.label(),
            ether = %ChainClient::from_wei(value),
            %from,
            "invoking faucet"
        );
        self.emit(RuntimeEvent::InvocationSubmitted {
            epoch,
            kind,
            from,
            value,
        });
        let result = match kind {
            InvocationKind::Deposit => contract.add_funds(from, value).await,
            InvocationKind::Withdraw => contract.withdraw(value, from).await,
        };
        match result {
            Ok(receipt) => self.emit(RuntimeEvent::InvocationCompleted {
                epoch,
                kind,
                tx_hash: receipt.tx_hash,
                block_number: receipt.block_number,
                gas_used: receipt.gas_used,
            }),
            Err(error) => {
                let err = FaucetError::InvocationRejected {
                    kind: kind.label(),
                    error,
                };
                warn!("{err}");
                self.emit(RuntimeEvent::InvocationFailed {
                    epoch,
                    kind,
                    message: format!("{:#}", err),
                });
            }
        }
    }

    /// Check the provider for account/network switches
    pub async fn watch(&mut self) {
        let Session::Connected { client, watch, .. } = &mut self.session else {
            return;
        };
        match watch.poll(client).await {
            Ok(Some(notification)) => {
                let reason = notification.describe();
                info!(%reason, "provider environment changed");
                let epoch = self.epoch;
                // Everything bound to the old environment is discarded
                self.session = Session::Disconnected;
                self.emit(RuntimeEvent::EnvironmentChanged { epoch, reason });
            }
            Ok(None) => {}
            Err(err) => debug!("provider watch failed: {err:#}"),
        }
    }
}

fn command_epoch(cmd: &RuntimeCommand) -> Option<u64> {
    match *cmd {
        RuntimeCommand::Detect { epoch }
        | RuntimeCommand::ResolveAccount { epoch }
        | RuntimeCommand::RequestAccounts { epoch }
        | RuntimeCommand::LoadBalance { epoch }
        | RuntimeCommand::AddFunds { epoch, .. }
        | RuntimeCommand::Withdraw { epoch, .. } => Some(epoch),
        RuntimeCommand::Shutdown => None,
    }
}

/// Run the async worker loop
pub async fn run_async_worker(
    settings: WorkerSettings,
    cmd_rx: Receiver<RuntimeCommand>,
    evt_tx: Sender<RuntimeEvent>,
) -> Result<()> {
    let watch_interval = settings.watch_interval;
    let mut worker = Worker::new(settings, evt_tx);
    let mut last_watch = Instant::now();

    loop {
        // Process commands (non-blocking)
        while let Ok(cmd) = cmd_rx.try_recv() {
            debug!(?cmd, "runtime command");
            if !worker.handle(cmd).await {
                info!("worker shutting down");
                return Ok(());
            }
        }

        if last_watch.elapsed() >= watch_interval {
            worker.watch().await;
            last_watch = Instant::now();
        }

        // Small yield to prevent busy loop
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
