/* axon/crates/state/src/lib.rs */

// SPDX-License-Identifier: PolyForm-Shield-1.0

use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Error type for state persistence.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to determine state directory")]
    NoStateDir,
}

/// Returns the base state directory for axon under the user's home
/// directory:
///
///   `${HOME}/.local/state/axon/`
///
/// Deployment state is node-local operational data rather than a cache, so
/// it lives under the XDG state location. Resolving `$HOME` directly keeps
/// service users (whose working directory doubles as their home) and
/// interactive users on the same convention.
pub fn axon_state_root() -> Result<PathBuf> {
    let home = env::var_os("HOME").ok_or(StateError::NoStateDir)?;
    let mut path = PathBuf::from(home);
    path.push(".local");
    path.push("state");
    path.push("axon");
    Ok(path)
}

/// JSON-backed store for one logical piece of node state.
///
/// The serving runtime uses this to keep its deployment table across
/// restarts: load on start, save after every deploy/undeploy. The store is
/// synchronous and holds no handle between operations, so it can sit behind
/// an `Arc` without locking.
pub struct StateStore {
    /// Full path to the JSON file backing this store.
    path: PathBuf,
}

impl StateStore {
    /// Create a store named `store_name` under the axon state root; the
    /// on-disk file is `axon_state_root() / {store_name}.json`.
    pub fn new(store_name: &str) -> Result<Self> {
        Self::with_root(axon_state_root()?, store_name)
    }

    /// Create a store under an explicit root directory. Used by tests and
    /// by nodes that pin state next to their working directory.
    pub fn with_root<P: AsRef<Path>>(root: P, store_name: &str) -> Result<Self> {
        let mut path = root.as_ref().to_path_buf();
        fs::create_dir_all(&path)
            .with_context(|| format!("failed to create state root at {}", path.display()))?;
        path.push(format!("{store_name}.json"));
        Ok(StateStore { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the value from disk if present, otherwise `None`. Does not
    /// create the file.
    pub fn load_optional<T>(&self) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read state file {}", self.path.display()))?;
        if raw.trim().is_empty() {
            return Ok(None);
        }

        let value = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse JSON from {}", self.path.display()))?;
        Ok(Some(value))
    }

    /// Load the value from disk if present; otherwise `T::default()`.
    pub fn load_or_default<T>(&self) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        Ok(self.load_optional()?.unwrap_or_default())
    }

    /// Persist the value as pretty-printed JSON.
    ///
    /// The write goes to a temporary file next to the target, is synced,
    /// and is then renamed into place, so a crash mid-save leaves the
    /// previous state intact.
    pub fn save<T>(&self, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        let json = serde_json::to_vec_pretty(value).context("failed to serialise state to JSON")?;

        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp_path).with_context(|| {
                format!("failed to create temporary state file {}", tmp_path.display())
            })?;
            file.write_all(&json).with_context(|| {
                format!("failed to write temporary state file {}", tmp_path.display())
            })?;
            file.sync_all().with_context(|| {
                format!("failed to sync temporary state file {}", tmp_path.display())
            })?;
        }

        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "failed to rename {} into {}",
                tmp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }

    /// Delete the underlying state file, if it exists. The parent directory
    /// is left in place.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("failed to remove state file {}", self.path.display()))?;
        }
        Ok(())
    }
}
