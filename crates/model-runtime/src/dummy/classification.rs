// SPDX-License-Identifier: PolyForm-Shield-1.0

use anyhow::Result;
use async_trait::async_trait;

use protocol::tensor;
use protocol::{
    DataType, ModelInferRequest, ModelInferResponse, ModelMetadataRequest, ModelMetadataResponse,
    ModelReadyRequest, ModelReadyResponse, TensorMetadata,
};

use crate::ModelBackend;

/// fixed classifier: every batch element scores `1:match`.
///
/// classification labels travel as `score:label` strings, one element per
/// batch entry, in a `[batch, 1]` byte tensor.
pub struct DummyClassifier;

#[async_trait]
impl ModelBackend for DummyClassifier {
    fn metadata(&self, req: ModelMetadataRequest) -> ModelMetadataResponse {
        ModelMetadataResponse::for_request(
            &req,
            "dummy",
            vec![TensorMetadata::new("input", DataType::String, vec![1])],
            vec![TensorMetadata::new("output", DataType::String, vec![-1, 1])],
        )
    }

    fn ready(&self, _req: ModelReadyRequest) -> ModelReadyResponse {
        ModelReadyResponse { ready: true }
    }

    async fn infer(&self, req: ModelInferRequest) -> Result<ModelInferResponse> {
        let inputs = super::batch_elements(&req)?;

        let labels: Vec<&[u8]> = inputs.iter().map(|_| "1:match".as_bytes()).collect();
        let raw = tensor::serialize_bytes_tensor(&labels)?;

        Ok(ModelInferResponse::for_request(
            &req,
            vec![TensorMetadata::new(
                "output",
                DataType::String,
                vec![inputs.len() as i64, 1],
            )],
            vec![raw],
        ))
    }
}
