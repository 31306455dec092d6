// SPDX-License-Identifier: PolyForm-Shield-1.0

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use model_runtime::{backend_for_task, BackendHandle, UnsupportedTask};
use protocol::Task;

/// errors from registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("model {name:?} is not deployed")]
    NotDeployed { name: String },

    #[error(transparent)]
    Backend(#[from] UnsupportedTask),
}

/// persistable description of one deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub name: String,
    pub version: String,
    pub task: Task,
}

/// snapshot of the registry, written through `state::StateStore`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DeploymentState {
    pub models: Vec<DeploymentRecord>,
}

/// one deployed model and its backend binding.
#[derive(Clone)]
pub struct DeployedModel {
    pub record: DeploymentRecord,
    pub handle: BackendHandle,
}

/// tracks deployed models and their backend bindings by name.
#[derive(Default)]
pub struct ModelRegistry {
    models: HashMap<String, DeployedModel>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// deploy (or re-deploy) a model under `name`.
    ///
    /// deploying an already-deployed name replaces its binding, so applying
    /// a manifest twice converges instead of failing.
    pub fn deploy(&mut self, name: &str, version: &str, task: Task) -> Result<(), RegistryError> {
        let handle = backend_for_task(task)?;
        let record = DeploymentRecord {
            name: name.to_string(),
            version: version.to_string(),
            task,
        };

        let replaced = self
            .models
            .insert(name.to_string(), DeployedModel { record, handle })
            .is_some();
        if replaced {
            info!("serving::registry: replaced deployment for model {name}");
        } else {
            info!("serving::registry: deployed model {name} for task {task:?}");
        }
        Ok(())
    }

    /// remove a deployment. unknown names are an error so that operator
    /// typos surface instead of silently succeeding.
    pub fn undeploy(&mut self, name: &str) -> Result<DeployedModel, RegistryError> {
        let removed = self
            .models
            .remove(name)
            .ok_or_else(|| RegistryError::NotDeployed {
                name: name.to_string(),
            })?;
        info!("serving::registry: undeployed model {name}");
        Ok(removed)
    }

    pub fn get(&self, name: &str) -> Result<&DeployedModel, RegistryError> {
        self.models.get(name).ok_or_else(|| RegistryError::NotDeployed {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// records for every deployment, sorted by name for stable output.
    pub fn records(&self) -> Vec<DeploymentRecord> {
        let mut records: Vec<_> = self.models.values().map(|m| m.record.clone()).collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deploy_then_get_then_undeploy() {
        let mut registry = ModelRegistry::new();
        registry.deploy("mobilenet", "1", Task::Classification).unwrap();

        assert!(registry.contains("mobilenet"));
        let model = registry.get("mobilenet").unwrap();
        assert_eq!(model.record.task, Task::Classification);

        registry.undeploy("mobilenet").unwrap();
        assert!(!registry.contains("mobilenet"));
    }

    #[test]
    fn redeploy_replaces_the_binding() {
        let mut registry = ModelRegistry::new();
        registry.deploy("m", "1", Task::Classification).unwrap();
        registry.deploy("m", "2", Task::Detection).unwrap();

        let model = registry.get("m").unwrap();
        assert_eq!(model.record.version, "2");
        assert_eq!(model.record.task, Task::Detection);
        assert_eq!(registry.records().len(), 1);
    }

    #[test]
    fn unknown_names_are_errors() {
        let mut registry = ModelRegistry::new();
        assert!(matches!(
            registry.get("ghost"),
            Err(RegistryError::NotDeployed { .. })
        ));
        assert!(matches!(
            registry.undeploy("ghost"),
            Err(RegistryError::NotDeployed { .. })
        ));
    }

    #[test]
    fn tasks_without_backends_cannot_deploy() {
        let mut registry = ModelRegistry::new();
        assert!(matches!(
            registry.deploy("o", "1", Task::Ocr),
            Err(RegistryError::Backend(_))
        ));
    }

    #[test]
    fn records_are_sorted_by_name() {
        let mut registry = ModelRegistry::new();
        registry.deploy("zebra", "1", Task::Detection).unwrap();
        registry.deploy("alpaca", "1", Task::Classification).unwrap();

        let names: Vec<_> = registry.records().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["alpaca".to_string(), "zebra".to_string()]);
    }
}
