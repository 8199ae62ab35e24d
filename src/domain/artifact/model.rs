//! Artifact model - ABI plus network-keyed deployments

use std::collections::BTreeMap;
use std::path::PathBuf;

use alloy_json_abi::JsonAbi;
use alloy_primitives::Address;
use serde::Deserialize;

use super::ArtifactError;

/// A deployment record under `networks.<id>`
#[derive(Debug, Clone, Deserialize)]
pub struct Deployment {
    pub address: String,
}

/// A parsed contract artifact
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    #[serde(default)]
    pub contract_name: Option<String>,
    pub abi: JsonAbi,
    #[serde(default)]
    pub networks: BTreeMap<String, Deployment>,
    /// File the artifact was read from
    #[serde(skip)]
    pub source: PathBuf,
}

impl Artifact {
    /// Parse artifact JSON
    pub fn from_json(content: &str, source: PathBuf) -> Result<Self, ArtifactError> {
        let mut artifact: Artifact =
            serde_json::from_str(content).map_err(|err| ArtifactError::Malformed {
                path: source.clone(),
                reason: err.to_string(),
            })?;
        artifact.source = source;
        Ok(artifact)
    }

    /// Display name: the recorded contract name or the file stem
    pub fn name(&self) -> String {
        self.contract_name
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| {
                self.source
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
            })
            .unwrap_or_default()
    }

    /// Find the deployment for the active network
    ///
    /// Artifacts are keyed by network id (`net_version`); dev chains where the
    /// chain id differs are also matched by chain id.
    pub fn deployment_for(&self, network_id: u64, chain_id: u64) -> Option<&Deployment> {
        self.networks
            .get(&network_id.to_string())
            .or_else(|| self.networks.get(&chain_id.to_string()))
    }

    /// Resolve the deployed address for the active network
    pub fn address_for(&self, network_id: u64, chain_id: u64) -> Result<Address, ArtifactError> {
        let deployment = self.deployment_for(network_id, chain_id).ok_or_else(|| {
            ArtifactError::NotDeployed {
                name: self.name(),
                network_id,
            }
        })?;
        deployment
            .address
            .trim()
            .parse()
            .map_err(|_| ArtifactError::InvalidAddress(deployment.address.clone()))
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.abi
            .function(name)
            .map(|overloads| !overloads.is_empty())
            .unwrap_or(false)
    }

    /// Check the ABI exposes every function in `names`
    pub fn require_functions(&self, names: &[&str]) -> Result<(), ArtifactError> {
        match names.iter().find(|name| !self.has_function(name)) {
            Some(missing) => Err(ArtifactError::MissingFunction {
                name: self.name(),
                function: missing.to_string(),
            }),
            None => Ok(()),
        }
    }
}
