use anyhow::{Context, Result};
use serde::Deserialize;

use protocol::Task;

/// root configuration for an axon node.
#[derive(Debug, Default, Deserialize)]
pub struct AxonConfig {
    /// optional node identity / label for operators.
    pub node_id: Option<String>,

    /// model deployments applied at startup.
    #[serde(default)]
    pub models: Vec<ModelDeployment>,
}

/// one `[[models]]` entry of the deployment manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelDeployment {
    pub name: String,

    /// model version label; defaults to "1" when the manifest omits it.
    #[serde(default = "default_version")]
    pub version: String,

    /// task the model serves, e.g. "classification" or "text_to_image".
    pub task: Task,
}

fn default_version() -> String {
    "1".to_string()
}

pub fn load_from_file(path: &str) -> Result<AxonConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest {path}"))?;
    let config: AxonConfig =
        toml::from_str(&raw).with_context(|| format!("failed to parse manifest {path}"))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_manifest_with_defaults() {
        let manifest = r#"
            node_id = "edge-1"

            [[models]]
            name = "mobilenet"
            task = "classification"

            [[models]]
            name = "yolo"
            version = "3"
            task = "detection"
        "#;

        let config: AxonConfig = toml::from_str(manifest).unwrap();
        assert_eq!(config.node_id.as_deref(), Some("edge-1"));
        assert_eq!(config.models.len(), 2);
        assert_eq!(config.models[0].version, "1");
        assert_eq!(config.models[0].task, Task::Classification);
        assert_eq!(config.models[1].version, "3");
        assert_eq!(config.models[1].task, Task::Detection);
    }

    #[test]
    fn empty_manifest_deploys_nothing() {
        let config: AxonConfig = toml::from_str("").unwrap();
        assert!(config.node_id.is_none());
        assert!(config.models.is_empty());
    }

    #[test]
    fn unknown_task_is_rejected() {
        let manifest = r#"
            [[models]]
            name = "m"
            task = "levitation"
        "#;
        assert!(toml::from_str::<AxonConfig>(manifest).is_err());
    }
}
