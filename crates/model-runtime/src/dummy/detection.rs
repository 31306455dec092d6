// SPDX-License-Identifier: PolyForm-Shield-1.0

use anyhow::Result;
use async_trait::async_trait;

use protocol::tensor;
use protocol::{
    DataType, ModelInferRequest, ModelInferResponse, ModelMetadataRequest, ModelMetadataResponse,
    ModelReadyRequest, ModelReadyResponse, TensorMetadata,
};

use crate::ModelBackend;

/// fixed detector: one `[0, 0, 0, 0, 1.0]` box labelled `test` per input.
///
/// boxes are `[x1, y1, x2, y2, score]` rows in an fp32 tensor of shape
/// `[batch, boxes, 5]`; labels are a byte tensor of shape `[batch, boxes]`
/// with one record per box.
pub struct DummyDetector;

#[async_trait]
impl ModelBackend for DummyDetector {
    fn metadata(&self, req: ModelMetadataRequest) -> ModelMetadataResponse {
        ModelMetadataResponse::for_request(
            &req,
            "dummy",
            vec![TensorMetadata::new("input", DataType::String, vec![1])],
            vec![
                TensorMetadata::new("output_bboxes", DataType::Fp32, vec![-1, -1, 5]),
                TensorMetadata::new("output_labels", DataType::String, vec![-1, -1]),
            ],
        )
    }

    fn ready(&self, _req: ModelReadyRequest) -> ModelReadyResponse {
        ModelReadyResponse { ready: true }
    }

    async fn infer(&self, req: ModelInferRequest) -> Result<ModelInferResponse> {
        let inputs = super::batch_elements(&req)?;
        let batch = inputs.len() as i64;

        let mut boxes = Vec::with_capacity(inputs.len() * 5);
        for _ in &inputs {
            boxes.extend_from_slice(&[0.0, 0.0, 0.0, 0.0, 1.0]);
        }
        let labels: Vec<&[u8]> = inputs.iter().map(|_| "test".as_bytes()).collect();

        Ok(ModelInferResponse::for_request(
            &req,
            vec![
                TensorMetadata::new("output_bboxes", DataType::Fp32, vec![batch, 1, 5]),
                TensorMetadata::new("output_labels", DataType::String, vec![batch, 1]),
            ],
            vec![
                tensor::serialize_f32_tensor(&boxes),
                tensor::serialize_bytes_tensor(&labels)?,
            ],
        ))
    }
}
