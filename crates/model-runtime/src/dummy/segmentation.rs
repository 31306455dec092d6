// SPDX-License-Identifier: PolyForm-Shield-1.0

use anyhow::Result;
use async_trait::async_trait;

use protocol::tensor;
use protocol::{
    DataType, ModelInferRequest, ModelInferResponse, ModelMetadataRequest, ModelMetadataResponse,
    ModelReadyRequest, ModelReadyResponse, TensorMetadata,
};

use crate::ModelBackend;

/// run-length encoding of a fixed semantic mask.
const SEMANTIC_RLE: &str = "376,7,505,7,505,7,505,7,505,7,505,7,505,7,520833";

/// run-length encoding of a fixed instance mask.
const INSTANCE_RLE: &str = "2918,12,382,33,96,25,248,39,88,41,236,43,82,49,230,47,77,55,225,50,74,61,218,55,69,67,211,62,62,76,202,69,53,87,192,77,45,96,185,82,39,103,2525";

/// fixed semantic segmenter: one mask categorised `tree` per input.
///
/// masks travel as run-length-encoded strings, one record per mask, shape
/// `[batch, masks]`; categories mirror that shape.
pub struct DummySemanticSegmenter;

#[async_trait]
impl ModelBackend for DummySemanticSegmenter {
    fn metadata(&self, req: ModelMetadataRequest) -> ModelMetadataResponse {
        ModelMetadataResponse::for_request(
            &req,
            "dummy",
            vec![TensorMetadata::new("input", DataType::String, vec![1])],
            vec![
                TensorMetadata::new("rles", DataType::String, vec![-1, -1]),
                TensorMetadata::new("categories", DataType::String, vec![-1, -1]),
            ],
        )
    }

    fn ready(&self, _req: ModelReadyRequest) -> ModelReadyResponse {
        ModelReadyResponse { ready: true }
    }

    async fn infer(&self, req: ModelInferRequest) -> Result<ModelInferResponse> {
        let inputs = super::batch_elements(&req)?;
        let batch = inputs.len() as i64;

        let rles: Vec<&[u8]> = inputs.iter().map(|_| SEMANTIC_RLE.as_bytes()).collect();
        let categories: Vec<&[u8]> = inputs.iter().map(|_| "tree".as_bytes()).collect();

        Ok(ModelInferResponse::for_request(
            &req,
            vec![
                TensorMetadata::new("rles", DataType::String, vec![batch, 1]),
                TensorMetadata::new("categories", DataType::String, vec![batch, 1]),
            ],
            vec![
                tensor::serialize_bytes_tensor(&rles)?,
                tensor::serialize_bytes_tensor(&categories)?,
            ],
        ))
    }
}

/// fixed instance segmenter: one `dog` instance per input.
///
/// output order is rles, boxes, labels, scores; boxes are `[x1, y1, x2,
/// y2]` rows and the fixed instance sits at `[1, 1, 100, 100]` with score
/// one.
pub struct DummyInstanceSegmenter;

#[async_trait]
impl ModelBackend for DummyInstanceSegmenter {
    fn metadata(&self, req: ModelMetadataRequest) -> ModelMetadataResponse {
        ModelMetadataResponse::for_request(
            &req,
            "dummy",
            vec![TensorMetadata::new("input", DataType::String, vec![1])],
            vec![
                TensorMetadata::new("rles", DataType::String, vec![-1, -1]),
                TensorMetadata::new("boxes", DataType::Fp32, vec![-1, -1, 4]),
                TensorMetadata::new("labels", DataType::String, vec![-1, -1]),
                TensorMetadata::new("scores", DataType::Fp32, vec![-1, -1]),
            ],
        )
    }

    fn ready(&self, _req: ModelReadyRequest) -> ModelReadyResponse {
        ModelReadyResponse { ready: true }
    }

    async fn infer(&self, req: ModelInferRequest) -> Result<ModelInferResponse> {
        let inputs = super::batch_elements(&req)?;
        let batch = inputs.len() as i64;

        let rles: Vec<&[u8]> = inputs.iter().map(|_| INSTANCE_RLE.as_bytes()).collect();
        let labels: Vec<&[u8]> = inputs.iter().map(|_| "dog".as_bytes()).collect();
        let mut boxes = Vec::with_capacity(inputs.len() * 4);
        let mut scores = Vec::with_capacity(inputs.len());
        for _ in &inputs {
            boxes.extend_from_slice(&[1.0, 1.0, 100.0, 100.0]);
            scores.push(1.0);
        }

        Ok(ModelInferResponse::for_request(
            &req,
            vec![
                TensorMetadata::new("rles", DataType::String, vec![batch, 1]),
                TensorMetadata::new("boxes", DataType::Fp32, vec![batch, 1, 4]),
                TensorMetadata::new("labels", DataType::String, vec![batch, 1]),
                TensorMetadata::new("scores", DataType::Fp32, vec![batch, 1]),
            ],
            vec![
                tensor::serialize_bytes_tensor(&rles)?,
                tensor::serialize_f32_tensor(&boxes),
                tensor::serialize_bytes_tensor(&labels)?,
                tensor::serialize_f32_tensor(&scores),
            ],
        ))
    }
}
