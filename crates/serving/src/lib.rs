// SPDX-License-Identifier: PolyForm-Shield-1.0

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use state::StateStore;

pub mod registry;
pub mod runtime;
pub mod shutdown;

pub use runtime::RuntimeManager;

pub struct Config {
    /// optional path to a TOML deployment manifest applied at startup.
    pub manifest: Option<String>,
    /// override for the persisted-state directory; defaults to the axon
    /// state root under `$HOME`.
    pub state_root: Option<PathBuf>,
    pub node_id: Option<String>,
}

pub async fn run(config: Config) -> Result<()> {
    info!("starting axon serving node: {:?}", config.node_id);

    let store = match &config.state_root {
        Some(root) => StateStore::with_root(root, "deployments")?,
        None => StateStore::new("deployments")?,
    };
    let runtime = RuntimeManager::with_store(store);

    let restored = runtime.restore().await?;
    if restored > 0 {
        info!("restored {restored} persisted deployment(s)");
    }

    if let Some(path) = &config.manifest {
        let manifest = config::load_from_file(path)?;
        for model in &manifest.models {
            runtime
                .deploy_model(&model.name, &model.version, model.task)
                .await?;
        }
        info!(
            "deployed {} manifest model(s) from {path}",
            manifest.models.len()
        );
    }

    shutdown::wait_for_signal().await;
    info!("axon serving node shutting down");

    Ok(())
}
