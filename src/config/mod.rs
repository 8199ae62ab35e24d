use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_CONTRACT: &str = "Faucet";
pub const DEFAULT_ARTIFACT_PATHS: [&str; 3] = ["build/contracts", "artifacts", "out"];
pub const DEFAULT_WATCH_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub name: Option<String>,
    pub rpc: Option<String>,
    pub ws: Option<String>,
    pub ipc: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Artifact name of the faucet contract
    pub contract: Option<String>,

    /// Deployed address; overrides the artifact's networks map
    pub contract_address: Option<String>,

    #[serde(default)]
    pub artifact_paths: Vec<String>,

    pub watch_interval_ms: Option<u64>,

    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

impl Config {
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn contract_name(&self) -> String {
        self.contract
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONTRACT.to_string())
    }

    pub fn artifact_roots(&self) -> Vec<String> {
        if self.artifact_paths.is_empty() {
            DEFAULT_ARTIFACT_PATHS.iter().map(|s| s.to_string()).collect()
        } else {
            self.artifact_paths.clone()
        }
    }

    pub fn watch_interval(&self) -> Duration {
        // Zero would turn the watch into a busy loop
        Duration::from_millis(
            self.watch_interval_ms
                .filter(|ms| *ms > 0)
                .unwrap_or(DEFAULT_WATCH_INTERVAL_MS),
        )
    }
}

/// Load the config file; a missing or unreadable file yields the defaults
pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return Config::default(),
    };
    match Config::parse(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(path = %path.display(), "ignoring config: {err}");
            Config::default()
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("FAUCET_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("faucet-tui").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("faucet-tui").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "faucet-tui", "faucet-tui")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn data_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
        return Some(xdg.join("faucet-tui"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".local").join("share").join("faucet-tui"));
    }
    directories::ProjectDirs::from("io", "faucet-tui", "faucet-tui")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn log_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("faucet.log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.contract_name(), "Faucet");
        assert_eq!(
            config.artifact_roots(),
            vec!["build/contracts", "artifacts", "out"]
        );
        assert_eq!(config.watch_interval(), Duration::from_millis(1_000));
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
contract = "Faucet2"
contract_address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
artifact_paths = ["~/dapps/faucet/build/contracts"]
watch_interval_ms = 250

[[endpoints]]
name = "ganache"
rpc = "127.0.0.1:7545"

[[endpoints]]
ws = "ws://localhost:8546"
"#,
        )
        .unwrap();

        assert_eq!(config.contract_name(), "Faucet2");
        assert!(config.contract_address.is_some());
        assert_eq!(config.artifact_roots().len(), 1);
        assert_eq!(config.watch_interval(), Duration::from_millis(250));
        assert_eq!(config.endpoints.len(), 2);
        assert_eq!(config.endpoints[0].name.as_deref(), Some("ganache"));
        assert_eq!(config.endpoints[1].ws.as_deref(), Some("ws://localhost:8546"));
    }

    #[test]
    fn test_zero_watch_interval_uses_default() {
        let config = Config::parse("watch_interval_ms = 0").unwrap();
        assert_eq!(config.watch_interval(), Duration::from_millis(1_000));
    }

    #[test]
    fn test_blank_contract_name_uses_default() {
        let config = Config::parse("contract = \"  \"").unwrap();
        assert_eq!(config.contract_name(), "Faucet");
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(Config::parse("contract = ").is_err());
    }
}
