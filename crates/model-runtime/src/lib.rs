// SPDX-License-Identifier: PolyForm-Shield-1.0

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use protocol::{
    ModelInferRequest, ModelInferResponse, ModelMetadataRequest, ModelMetadataResponse,
    ModelReadyRequest, ModelReadyResponse, Task,
};

pub mod dummy;
pub mod output;

/// the adapter seam every servable model implements.
///
/// `metadata` and `ready` are cheap synchronous descriptions of the model;
/// `infer` carries an actual request through the backend. raw tensor
/// payloads stay opaque at this boundary — backends decode and re-encode
/// them with the codecs in `protocol::tensor`.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// describe the model's declared input and output tensors.
    fn metadata(&self, req: ModelMetadataRequest) -> ModelMetadataResponse;

    /// report whether the model can take inference requests.
    fn ready(&self, req: ModelReadyRequest) -> ModelReadyResponse;

    /// run one inference request.
    async fn infer(&self, req: ModelInferRequest) -> Result<ModelInferResponse>;
}

/// opaque, cloneable handle to a model backend.
#[derive(Clone)]
pub struct BackendHandle {
    inner: Arc<dyn ModelBackend>,
}

impl std::fmt::Debug for BackendHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendHandle").finish_non_exhaustive()
    }
}

impl BackendHandle {
    pub fn new(inner: Arc<dyn ModelBackend>) -> Self {
        Self { inner }
    }

    pub fn metadata(&self, req: ModelMetadataRequest) -> ModelMetadataResponse {
        self.inner.metadata(req)
    }

    pub fn ready(&self, req: ModelReadyRequest) -> ModelReadyResponse {
        self.inner.ready(req)
    }

    pub async fn infer(&self, req: ModelInferRequest) -> Result<ModelInferResponse> {
        self.inner.infer(req).await
    }
}

/// returned when no stock backend exists for a task.
#[derive(Debug, Error)]
#[error("no stock backend for task {task:?}")]
pub struct UnsupportedTask {
    pub task: Task,
}

/// construct the stock backend serving a task.
pub fn backend_for_task(task: Task) -> Result<BackendHandle, UnsupportedTask> {
    let backend: Arc<dyn ModelBackend> = match task {
        Task::Classification => Arc::new(dummy::DummyClassifier),
        Task::Detection => Arc::new(dummy::DummyDetector),
        Task::Keypoint => Arc::new(dummy::DummyKeypointEstimator),
        Task::SemanticSegmentation => Arc::new(dummy::DummySemanticSegmenter),
        Task::InstanceSegmentation => Arc::new(dummy::DummyInstanceSegmenter),
        Task::TextToImage => Arc::new(dummy::DummyImageGenerator),
        Task::TextGeneration => Arc::new(dummy::DummyTextGenerator),
        Task::VisualQuestionAnswering => Arc::new(dummy::DummyVisualQuestionAnswerer),
        Task::Ocr | Task::Unspecified => return Err(UnsupportedTask { task }),
    };
    Ok(BackendHandle::new(backend))
}
