//! Command parser for the : command system

/// Parsed command from user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Connect,
    Deposit,
    Withdraw,
    Reload,
    Copy,
    Help,
    Quit,

    // Unknown command
    Unknown(String),
}

/// Parse a command string (without the leading :)
pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    let cmd = input.split_whitespace().next().unwrap_or("");

    match cmd.to_lowercase().as_str() {
        "connect" | "conn" => Command::Connect,
        "deposit" | "donate" | "add" => Command::Deposit,
        "withdraw" | "wd" => Command::Withdraw,
        "reload" | "refresh" | "r" => Command::Reload,
        "copy" | "yank" => Command::Copy,
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        _ => Command::Unknown(input.to_string()),
    }
}

/// Get command hint for autocompletion
pub fn command_hint(input: &str) -> Option<&'static str> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }

    let commands = [
        ("connect", "Request account authorization"),
        ("deposit", "Donate 1 ETH to the faucet"),
        ("withdraw", "Withdraw 0.1 ETH from the faucet"),
        ("reload", "Re-read the faucet balance"),
        ("copy", "Copy account address"),
        ("help", "Show key bindings"),
        ("quit", "Exit"),
    ];

    commands
        .iter()
        .find(|(cmd, _)| cmd.starts_with(&input))
        .map(|(_, desc)| *desc)
}
