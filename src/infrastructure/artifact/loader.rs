//! Artifact loader - finds a named contract artifact on the filesystem

use std::fs;
use std::path::{Path, PathBuf};

use alloy::primitives::Address;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::domain::artifact::{Artifact, ArtifactError};
use crate::infrastructure::artifact::FaucetContract;
use crate::infrastructure::ethereum::ChainClient;

/// Where to look for a contract and how to address it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSource {
    /// Logical contract name; the artifact file is `<name>.json`
    pub name: String,
    pub roots: Vec<PathBuf>,
    /// Skip the artifact's `networks` map and use this address
    pub address_override: Option<Address>,
}

/// Artifact file scanner
pub struct ArtifactLoader;

impl ArtifactLoader {
    /// Find and parse the first `<name>.json` artifact under `roots`
    pub fn find(name: &str, roots: &[PathBuf]) -> Result<Artifact, ArtifactError> {
        let file_name = format!("{name}.json");
        let mut first_error = None;

        for root in roots {
            for entry in WalkDir::new(root)
                .follow_links(false)
                .into_iter()
                // Ignored names only apply below the root
                .filter_entry(|e| e.depth() == 0 || !Self::is_ignored_dir(e.path()))
                .filter_map(Result::ok)
            {
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();
                if path.file_name().and_then(|s| s.to_str()) != Some(file_name.as_str()) {
                    continue;
                }
                // Skip files larger than 5MB
                if entry.metadata().map(|m| m.len()).unwrap_or(0) > 5 * 1024 * 1024 {
                    continue;
                }

                match Self::load_file(path) {
                    Ok(artifact) => {
                        info!(path = %path.display(), "loaded artifact");
                        return Ok(artifact);
                    }
                    Err(err) => {
                        debug!(path = %path.display(), "skipping artifact: {err}");
                        first_error.get_or_insert(err);
                    }
                }
            }
        }

        Err(first_error.unwrap_or_else(|| ArtifactError::NotFound {
            name: name.to_string(),
            roots: roots
                .iter()
                .map(|root| root.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        }))
    }

    /// Load a single artifact file
    fn load_file(path: &Path) -> Result<Artifact, ArtifactError> {
        let content = fs::read_to_string(path).map_err(|err| ArtifactError::Malformed {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        Artifact::from_json(&content, path.to_path_buf())
    }

    /// Check if a path should be ignored
    fn is_ignored_dir(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|name| matches!(name, ".git" | "target" | "node_modules" | ".next" | "cache"))
            .unwrap_or(false)
    }
}

/// Resolve the named contract for the client's network and bind it
///
/// Taking a `ChainClient` by value means a contract can only be bound once a
/// provider has been detected.
pub fn load_contract(
    source: &ArtifactSource,
    client: ChainClient,
) -> Result<FaucetContract, ArtifactError> {
    let artifact = ArtifactLoader::find(&source.name, &source.roots)?;
    let address = match source.address_override {
        Some(address) => address,
        None => artifact.address_for(client.network_id, client.chain_id)?,
    };
    FaucetContract::bind(artifact, address, client)
}
