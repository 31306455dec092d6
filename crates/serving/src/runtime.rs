// SPDX-License-Identifier: PolyForm-Shield-1.0

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::sync::RwLock;
use tracing::{info, warn};

use model_runtime::BackendHandle;
use protocol::{
    ModelInferRequest, ModelInferResponse, ModelMetadataRequest, ModelMetadataResponse,
    ModelReadyRequest, ModelReadyResponse, Task,
};
use state::StateStore;

use crate::registry::{DeploymentRecord, DeploymentState, ModelRegistry};

/// cloneable front door to the node's deployments.
///
/// all operations go through the shared registry lock; inference itself
/// runs on a cloned backend handle with the lock released, so a slow model
/// never blocks deploys or probes.
#[derive(Clone)]
pub struct RuntimeManager {
    registry: Arc<RwLock<ModelRegistry>>,
    store: Option<Arc<StateStore>>,
}

impl RuntimeManager {
    /// manager without persistence; deployments live for the process only.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(RwLock::new(ModelRegistry::new())),
            store: None,
        }
    }

    /// manager persisting its deployment table through `store`.
    pub fn with_store(store: StateStore) -> Self {
        Self {
            registry: Arc::new(RwLock::new(ModelRegistry::new())),
            store: Some(Arc::new(store)),
        }
    }

    /// re-deploy everything recorded in the backing store.
    ///
    /// entries whose task no longer has a backend are skipped with a
    /// warning rather than failing the whole restore.
    pub async fn restore(&self) -> Result<usize> {
        let Some(store) = &self.store else {
            return Ok(0);
        };
        let snapshot: DeploymentState = store
            .load_or_default()
            .context("failed to load deployment state")?;

        let mut registry = self.registry.write().await;
        let mut restored = 0;
        for record in snapshot.models {
            match registry.deploy(&record.name, &record.version, record.task) {
                Ok(()) => restored += 1,
                Err(e) => warn!(
                    "serving::runtime: skipping persisted deployment {}: {e}",
                    record.name
                ),
            }
        }
        Ok(restored)
    }

    async fn persist(&self) -> Result<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let snapshot = DeploymentState {
            models: self.registry.read().await.records(),
        };
        store
            .save(&snapshot)
            .context("failed to persist deployment state")
    }

    pub async fn deploy_model(&self, name: &str, version: &str, task: Task) -> Result<()> {
        {
            let mut registry = self.registry.write().await;
            registry.deploy(name, version, task)?;
        }
        self.persist().await
    }

    pub async fn undeploy_model(&self, name: &str) -> Result<()> {
        {
            let mut registry = self.registry.write().await;
            registry.undeploy(name)?;
        }
        self.persist().await
    }

    pub async fn list_models(&self) -> Vec<DeploymentRecord> {
        self.registry.read().await.records()
    }

    /// task of a deployed model, for callers that post-process outputs.
    pub async fn model_task(&self, name: &str) -> Result<Task> {
        Ok(self.registry.read().await.get(name)?.record.task)
    }

    pub async fn model_metadata(&self, name: &str, version: &str) -> Result<ModelMetadataResponse> {
        let handle = self.handle_for(name).await?;
        Ok(handle.metadata(ModelMetadataRequest {
            name: name.to_string(),
            version: version.to_string(),
        }))
    }

    /// readiness probe. an unknown model reports not-ready rather than an
    /// error, which is what deployment controllers expect to poll.
    pub async fn model_ready(&self, name: &str, version: &str) -> ModelReadyResponse {
        let registry = self.registry.read().await;
        match registry.get(name) {
            Ok(model) => model.handle.ready(ModelReadyRequest {
                name: name.to_string(),
                version: version.to_string(),
            }),
            Err(_) => ModelReadyResponse { ready: false },
        }
    }

    /// dispatch one inference request to the model it names.
    ///
    /// the request is checked against the backend's declared metadata
    /// before dispatch: it must carry at least one raw tensor and no more
    /// than the model declares inputs.
    pub async fn model_infer(&self, req: ModelInferRequest) -> Result<ModelInferResponse> {
        let handle = self.handle_for(&req.model_name).await?;
        let metadata = handle.metadata(ModelMetadataRequest {
            name: req.model_name.clone(),
            version: req.model_version.clone(),
        });

        if req.raw_input_contents.is_empty() {
            bail!(
                "inference request for model {} carries no input tensors",
                req.model_name
            );
        }
        if req.raw_input_contents.len() > metadata.inputs.len() {
            bail!(
                "inference request for model {} carries {} raw tensors, model declares {} input(s)",
                req.model_name,
                req.raw_input_contents.len(),
                metadata.inputs.len()
            );
        }

        info!(
            "serving::runtime: dispatching inference for model {}",
            req.model_name
        );
        handle.infer(req).await
    }

    async fn handle_for(&self, name: &str) -> Result<BackendHandle> {
        let registry = self.registry.read().await;
        Ok(registry.get(name)?.handle.clone())
    }
}

impl Default for RuntimeManager {
    fn default() -> Self {
        Self::new()
    }
}
