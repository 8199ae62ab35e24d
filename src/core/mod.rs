pub mod action;
pub mod command;
pub mod state;
pub mod sync;
pub mod units;

pub use action::{Action, NotifyLevel};
pub use command::{command_hint, parse_command, Command};
pub use state::{ContractInfo, InvocationKind, Phase, ProviderStatus, ViewState};
pub use sync::{update, Msg};
