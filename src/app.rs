use std::collections::VecDeque;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tracing::debug;

use crate::core::{update, Action, Command, Msg, NotifyLevel, ViewState};
use crate::infrastructure::runtime::RuntimeEvent;

const STATUS_TTL: Duration = Duration::from_secs(4);
const MAX_ACTIVITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

impl From<NotifyLevel> for StatusLevel {
    fn from(level: NotifyLevel) -> Self {
        match level {
            NotifyLevel::Info => StatusLevel::Info,
            NotifyLevel::Warn => StatusLevel::Warn,
            NotifyLevel::Error => StatusLevel::Error,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct CommandBar {
    pub input: String,
    pub last: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
    pub since: Instant,
}

/// One line of the activity log
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub at: DateTime<Local>,
    pub text: String,
    pub level: StatusLevel,
}

#[derive(Debug)]
pub struct App {
    /// Current revision of the synchronized view
    pub view: ViewState,
    pub input_mode: InputMode,
    pub command: CommandBar,
    pub status: Option<StatusMessage>,
    /// Newest first
    pub activity: VecDeque<ActivityEntry>,
    /// Configured endpoints, shown while nothing is connected
    pub endpoints_label: String,
    pub contract_name: String,
    pub balance_updated_at: Option<DateTime<Local>>,
    pub help_open: bool,
    pub should_quit: bool,
    pending_copy: bool,
    outbox: Vec<Action>,
}

impl App {
    pub fn new(contract_name: impl Into<String>, endpoints_label: impl Into<String>) -> Self {
        Self {
            view: ViewState::new(),
            input_mode: InputMode::Normal,
            command: CommandBar::default(),
            status: None,
            activity: VecDeque::new(),
            endpoints_label: endpoints_label.into(),
            contract_name: contract_name.into(),
            balance_updated_at: None,
            help_open: false,
            should_quit: false,
            pending_copy: false,
            outbox: Vec::new(),
        }
    }

    /// Feed one message through the synchronizer
    pub fn dispatch(&mut self, msg: Msg) {
        debug!(?msg, revision = self.view.revision, "dispatch");
        let balance_msg = matches!(msg, Msg::BalanceLoaded { .. });
        let (next, actions) = update(&self.view, msg);

        if next.epoch != self.view.epoch {
            self.balance_updated_at = None;
        }
        if balance_msg && next.revision != self.view.revision {
            self.balance_updated_at = Some(Local::now());
        }
        self.view = next;

        for action in actions {
            self.apply_action(action);
        }
    }

    pub fn apply_action(&mut self, action: Action) {
        match action {
            Action::Notify(text, level) => {
                let level = StatusLevel::from(level);
                if level != StatusLevel::Info {
                    self.log_activity(text.clone(), level);
                }
                self.set_status(text, level);
            }
            Action::Quit => self.should_quit = true,
            runtime => self.outbox.push(runtime),
        }
    }

    /// Actions waiting to be sent to the runtime
    pub fn take_outbox(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.outbox)
    }

    pub fn apply_runtime_event(&mut self, event: RuntimeEvent) {
        match &event {
            RuntimeEvent::InvocationSubmitted {
                epoch,
                kind,
                from,
                ..
            } if *epoch == self.view.epoch => {
                self.log_activity(
                    format!(
                        "Submitted {}() {} ETH from {}",
                        kind.label(),
                        kind.ether(),
                        short_address(&from.to_string())
                    ),
                    StatusLevel::Info,
                );
                self.set_status(
                    format!("Waiting for {}() to be mined...", kind.label()),
                    StatusLevel::Info,
                );
            }
            RuntimeEvent::InvocationCompleted {
                epoch,
                kind,
                tx_hash,
                block_number,
                gas_used,
            } if *epoch == self.view.epoch => {
                let block = block_number
                    .map(|n| format!(" in block {n}"))
                    .unwrap_or_default();
                self.log_activity(
                    format!(
                        "{}() mined{block}, gas {gas_used}, tx {}",
                        kind.label(),
                        short_address(&tx_hash.to_string())
                    ),
                    StatusLevel::Info,
                );
            }
            RuntimeEvent::Error { message } => {
                self.log_activity(message.clone(), StatusLevel::Error);
                self.set_status(message.clone(), StatusLevel::Error);
            }
            _ => {}
        }

        if let Some(msg) = event.into_msg() {
            self.dispatch(msg);
        }
    }

    pub fn set_status(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level,
            since: Instant::now(),
        });
    }

    pub fn status_text(&self) -> Option<(&str, StatusLevel)> {
        self.status
            .as_ref()
            .map(|status| (status.text.as_str(), status.level))
    }

    pub fn log_activity(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.activity.push_front(ActivityEntry {
            at: Local::now(),
            text: text.into(),
            level,
        });
        self.activity.truncate(MAX_ACTIVITY);
    }

    pub fn on_tick(&mut self) {
        if let Some(status) = self.status.as_ref() {
            if status.since.elapsed() > STATUS_TTL {
                self.status = None;
            }
        }
    }

    pub fn enter_command(&mut self) {
        self.input_mode = InputMode::Command;
        self.command.input.clear();
    }

    pub fn exit_command(&mut self) {
        self.input_mode = InputMode::Normal;
        self.command.input.clear();
    }

    pub fn apply_command(&mut self) {
        let input = self.command.input.trim().to_string();
        if input.is_empty() {
            self.exit_command();
            return;
        }

        let cmd = crate::core::parse_command(&input);
        self.execute_command(&cmd);
        self.command.last = Some(input);
        self.exit_command();
    }

    /// Execute a parsed command
    pub fn execute_command(&mut self, cmd: &Command) {
        match cmd {
            Command::Connect => self.dispatch(Msg::ConnectRequested),
            Command::Deposit => self.dispatch(Msg::DepositRequested),
            Command::Withdraw => self.dispatch(Msg::WithdrawRequested),
            Command::Reload => self.dispatch(Msg::ReloadRequested),
            Command::Copy => self.request_copy(),
            Command::Help => self.help_open = !self.help_open,
            Command::Quit => self.apply_action(Action::Quit),
            Command::Unknown(s) => {
                self.set_status(format!("Unknown command: {s}"), StatusLevel::Warn)
            }
        }
    }

    pub fn request_copy(&mut self) {
        if self.view.account.is_some() {
            self.pending_copy = true;
        } else {
            self.set_status("No account to copy", StatusLevel::Warn);
        }
    }

    /// The account address, once, if a copy was requested
    pub fn take_copy_request(&mut self) -> Option<String> {
        if !std::mem::take(&mut self.pending_copy) {
            return None;
        }
        self.view.account.map(|account| account.to_string())
    }
}

pub fn short_address(value: &str) -> String {
    let value = value.trim();
    if value.len() <= 14 {
        return value.to_string();
    }
    format!("{}..{}", &value[..8], &value[value.len() - 6..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, B256, U256};

    use crate::core::{ContractInfo, InvocationKind, Phase};

    fn contract() -> ContractInfo {
        ContractInfo {
            name: "Faucet".into(),
            address: Address::repeat_byte(0xfa),
            network_id: 5777,
        }
    }

    fn connected() -> App {
        let mut app = App::new("Faucet", "http://localhost:8545");
        app.dispatch(Msg::Mounted);
        for event in [
            RuntimeEvent::ProviderDetected {
                epoch: 0,
                endpoint: "http://localhost:8545".into(),
                chain_id: 1337,
            },
            RuntimeEvent::ContractResolved {
                epoch: 0,
                contract: contract(),
            },
            RuntimeEvent::AccountResolved {
                epoch: 0,
                account: Some(Address::repeat_byte(0xab)),
            },
            RuntimeEvent::BalanceLoaded {
                epoch: 0,
                wei: U256::from(3_000_000_000_000_000_000u128),
            },
        ] {
            app.apply_runtime_event(event);
        }
        app.take_outbox();
        app
    }

    #[test]
    fn test_mount_queues_detection() {
        let mut app = App::new("Faucet", "http://localhost:8545");
        app.dispatch(Msg::Mounted);
        assert_eq!(app.take_outbox(), vec![Action::DetectProvider { epoch: 0 }]);
        assert!(app.take_outbox().is_empty());
    }

    #[test]
    fn test_runtime_events_drive_view() {
        let app = connected();
        assert_eq!(app.view.phase(), Phase::BalanceLoaded);
        assert_eq!(app.view.balance_display().as_deref(), Some("3"));
        assert!(app.balance_updated_at.is_some());
    }

    #[test]
    fn test_deposit_command_queues_invocation() {
        let mut app = connected();
        app.command.input = "donate".into();
        app.apply_command();
        let outbox = app.take_outbox();
        assert!(matches!(
            outbox.as_slice(),
            [Action::AddFunds { value, .. }] if *value == U256::from(1_000_000_000_000_000_000u128)
        ));
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.command.last.as_deref(), Some("donate"));
    }

    #[test]
    fn test_invocation_lifecycle_is_logged() {
        let mut app = connected();
        app.dispatch(Msg::WithdrawRequested);
        app.take_outbox();

        app.apply_runtime_event(RuntimeEvent::InvocationSubmitted {
            epoch: 0,
            kind: InvocationKind::Withdraw,
            from: Address::repeat_byte(0xab),
            value: U256::from(100_000_000_000_000_000u128),
        });
        app.apply_runtime_event(RuntimeEvent::InvocationCompleted {
            epoch: 0,
            kind: InvocationKind::Withdraw,
            tx_hash: B256::repeat_byte(7),
            block_number: Some(12),
            gas_used: 30_000,
        });

        assert_eq!(app.activity.len(), 2);
        assert!(app.activity[0].text.contains("block 12"));
        assert!(app.activity[1].text.starts_with("Submitted withdraw()"));
        assert_eq!(app.take_outbox(), vec![Action::LoadBalance { epoch: 0 }]);
    }

    #[test]
    fn test_failed_invocation_reports_without_reload() {
        let mut app = connected();
        app.apply_runtime_event(RuntimeEvent::InvocationFailed {
            epoch: 0,
            kind: InvocationKind::Deposit,
            message: "User denied".into(),
        });
        assert!(app.take_outbox().is_empty());
        let (text, level) = app.status_text().unwrap();
        assert!(text.contains("User denied"));
        assert_eq!(level, StatusLevel::Error);
    }

    #[test]
    fn test_environment_change_resets_and_redetects() {
        let mut app = connected();
        app.apply_runtime_event(RuntimeEvent::EnvironmentChanged {
            epoch: 0,
            reason: "Network changed to chain 1".into(),
        });
        assert_eq!(app.view.phase(), Phase::Uninitialized);
        assert!(app.balance_updated_at.is_none());
        assert_eq!(app.take_outbox(), vec![Action::DetectProvider { epoch: 1 }]);

        // Late results from the old session are ignored
        app.apply_runtime_event(RuntimeEvent::BalanceLoaded {
            epoch: 0,
            wei: U256::from(1u64),
        });
        assert!(app.view.balance.is_none());
    }

    #[test]
    fn test_copy_needs_account() {
        let mut app = App::new("Faucet", "none");
        app.execute_command(&Command::Copy);
        assert_eq!(app.take_copy_request(), None);

        let mut app = connected();
        app.execute_command(&Command::Copy);
        assert_eq!(
            app.take_copy_request(),
            Some(Address::repeat_byte(0xab).to_string())
        );
        assert_eq!(app.take_copy_request(), None);
    }

    #[test]
    fn test_quit_and_help_commands() {
        let mut app = App::new("Faucet", "none");
        app.execute_command(&Command::Help);
        assert!(app.help_open);
        app.execute_command(&Command::Quit);
        assert!(app.should_quit);
        app.execute_command(&Command::Unknown("nope".into()));
        assert_eq!(app.status_text().map(|(_, l)| l), Some(StatusLevel::Warn));
    }

    #[test]
    fn test_short_address() {
        assert_eq!(
            short_address("0x5FbDB2315678afecb367f032d93F642f64180aa3"),
            "0x5FbDB2..180aa3"
        );
        assert_eq!(short_address("0x1234"), "0x1234");
    }
}
