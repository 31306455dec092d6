// SPDX-License-Identifier: PolyForm-Shield-1.0

use anyhow::Result;
use async_trait::async_trait;

use protocol::tensor;
use protocol::{
    DataType, ModelInferRequest, ModelInferResponse, ModelMetadataRequest, ModelMetadataResponse,
    ModelReadyRequest, ModelReadyResponse, TensorMetadata,
};

use crate::ModelBackend;

/// number of keypoints in the COCO skeleton.
const KEYPOINTS_PER_POSE: usize = 17;

/// fixed keypoint estimator: one pose per input.
///
/// each pose carries seventeen `[x, y, visibility]` keypoints with
/// `x = y = keypoint index`, a unit box, and a score of one. output ranks
/// follow the serving convention: keypoints `[batch, poses, 17, 3]`, boxes
/// `[batch, poses, 4]`, scores `[batch, poses]`.
pub struct DummyKeypointEstimator;

#[async_trait]
impl ModelBackend for DummyKeypointEstimator {
    fn metadata(&self, req: ModelMetadataRequest) -> ModelMetadataResponse {
        ModelMetadataResponse::for_request(
            &req,
            "dummy",
            vec![TensorMetadata::new("input", DataType::String, vec![1])],
            vec![
                TensorMetadata::new(
                    "kpoints",
                    DataType::Fp32,
                    vec![-1, -1, KEYPOINTS_PER_POSE as i64, 3],
                ),
                TensorMetadata::new("boxes", DataType::Fp32, vec![-1, -1, 4]),
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

        let mut keypoints = Vec::with_capacity(inputs.len() * KEYPOINTS_PER_POSE * 3);
        let mut boxes = Vec::with_capacity(inputs.len() * 4);
        let mut scores = Vec::with_capacity(inputs.len());
        for _ in &inputs {
            for i in 0..KEYPOINTS_PER_POSE {
                keypoints.extend_from_slice(&[i as f32, i as f32, 1.0]);
            }
            boxes.extend_from_slice(&[1.0, 1.0, 1.0, 1.0]);
            scores.push(1.0);
        }

        Ok(ModelInferResponse::for_request(
            &req,
            vec![
                TensorMetadata::new(
                    "kpoints",
                    DataType::Fp32,
                    vec![batch, 1, KEYPOINTS_PER_POSE as i64, 3],
                ),
                TensorMetadata::new("boxes", DataType::Fp32, vec![batch, 1, 4]),
                TensorMetadata::new("scores", DataType::Fp32, vec![batch, 1]),
            ],
            vec![
                tensor::serialize_f32_tensor(&keypoints),
                tensor::serialize_f32_tensor(&boxes),
                tensor::serialize_f32_tensor(&scores),
            ],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emits_the_coco_skeleton_per_input() {
        let raw = tensor::serialize_bytes_tensor(&[b"a".as_slice(), b"b".as_slice()]).unwrap();
        let req = ModelInferRequest {
            model_name: "kp".to_string(),
            model_version: "1".to_string(),
            inputs: vec![TensorMetadata::new("input", DataType::String, vec![1])],
            raw_input_contents: vec![raw],
        };

        let resp = DummyKeypointEstimator.infer(req).await.unwrap();
        assert_eq!(resp.outputs[0].shape, vec![2, 1, 17, 3]);

        let kps = tensor::deserialize_f32_tensor(&resp.raw_output_contents[0]).unwrap();
        assert_eq!(kps.len(), 2 * 17 * 3);
        // keypoint 16 of the first pose is [16, 16, 1].
        assert_eq!(&kps[16 * 3..17 * 3], &[16.0, 16.0, 1.0]);

        let scores = tensor::deserialize_f32_tensor(&resp.raw_output_contents[2]).unwrap();
        assert_eq!(scores, vec![1.0, 1.0]);
    }
}
