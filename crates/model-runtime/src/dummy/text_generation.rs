// SPDX-License-Identifier: PolyForm-Shield-1.0

use anyhow::Result;
use async_trait::async_trait;

use protocol::tensor;
use protocol::{
    DataType, ModelInferRequest, ModelInferResponse, ModelMetadataRequest, ModelMetadataResponse,
    ModelReadyRequest, ModelReadyResponse, TensorMetadata,
};

use crate::ModelBackend;

fn echo_prompt(req: ModelInferRequest) -> Result<ModelInferResponse> {
    let prompts = super::batch_elements(&req)?;
    let batch = prompts.len() as i64;

    let raw = tensor::serialize_bytes_tensor(&prompts)?;

    Ok(ModelInferResponse::for_request(
        &req,
        vec![TensorMetadata::new(
            "output",
            DataType::String,
            vec![batch, 1],
        )],
        vec![raw],
    ))
}

/// fixed text generator: echoes each prompt back verbatim.
pub struct DummyTextGenerator;

#[async_trait]
impl ModelBackend for DummyTextGenerator {
    fn metadata(&self, req: ModelMetadataRequest) -> ModelMetadataResponse {
        ModelMetadataResponse::for_request(
            &req,
            "dummy",
            vec![TensorMetadata::new("prompt", DataType::String, vec![1])],
            vec![TensorMetadata::new("output", DataType::String, vec![-1, -1])],
        )
    }

    fn ready(&self, _req: ModelReadyRequest) -> ModelReadyResponse {
        ModelReadyResponse { ready: true }
    }

    async fn infer(&self, req: ModelInferRequest) -> Result<ModelInferResponse> {
        echo_prompt(req)
    }
}

/// fixed visual question answerer: answers every question with the question.
///
/// takes a prompt and a prompt image; the image tensor is accepted and
/// ignored, the prompt is echoed like [`DummyTextGenerator`] does.
pub struct DummyVisualQuestionAnswerer;

#[async_trait]
impl ModelBackend for DummyVisualQuestionAnswerer {
    fn metadata(&self, req: ModelMetadataRequest) -> ModelMetadataResponse {
        ModelMetadataResponse::for_request(
            &req,
            "dummy",
            vec![
                TensorMetadata::new("prompt", DataType::String, vec![1]),
                TensorMetadata::new("prompt_image", DataType::String, vec![1]),
            ],
            vec![TensorMetadata::new("output", DataType::String, vec![-1, -1])],
        )
    }

    fn ready(&self, _req: ModelReadyRequest) -> ModelReadyResponse {
        ModelReadyResponse { ready: true }
    }

    async fn infer(&self, req: ModelInferRequest) -> Result<ModelInferResponse> {
        echo_prompt(req)
    }
}
