// SPDX-License-Identifier: PolyForm-Shield-1.0

use anyhow::Result;
use async_trait::async_trait;

use protocol::tensor;
use protocol::{
    DataType, ModelInferRequest, ModelInferResponse, ModelMetadataRequest, ModelMetadataResponse,
    ModelReadyRequest, ModelReadyResponse, TensorMetadata,
};

use crate::ModelBackend;

const IMAGE_HEIGHT: usize = 5;
const IMAGE_WIDTH: usize = 5;
const IMAGE_CHANNELS: usize = 3;

/// fixed image generator: a deterministic 5x5 RGB gradient per prompt.
///
/// pixel values ramp linearly over `[0, 1]` in HWC order, so the payload is
/// reproducible without a random source. output shape is
/// `[batch, height, width, channels]`.
pub struct DummyImageGenerator;

fn gradient_image() -> Vec<f32> {
    let len = IMAGE_HEIGHT * IMAGE_WIDTH * IMAGE_CHANNELS;
    (0..len).map(|i| i as f32 / (len - 1) as f32).collect()
}

#[async_trait]
impl ModelBackend for DummyImageGenerator {
    fn metadata(&self, req: ModelMetadataRequest) -> ModelMetadataResponse {
        ModelMetadataResponse::for_request(
            &req,
            "dummy",
            vec![
                TensorMetadata::new("prompt", DataType::String, vec![1]),
                TensorMetadata::new("negative_prompt", DataType::String, vec![1]),
                TensorMetadata::new("samples", DataType::Int32, vec![1]),
                TensorMetadata::new("steps", DataType::Int32, vec![1]),
                TensorMetadata::new("guidance_scale", DataType::Fp32, vec![1]),
                TensorMetadata::new("seed", DataType::Int64, vec![1]),
            ],
            vec![TensorMetadata::new(
                "images",
                DataType::Fp32,
                vec![
                    -1,
                    IMAGE_HEIGHT as i64,
                    IMAGE_WIDTH as i64,
                    IMAGE_CHANNELS as i64,
                ],
            )],
        )
    }

    fn ready(&self, _req: ModelReadyRequest) -> ModelReadyResponse {
        ModelReadyResponse { ready: true }
    }

    async fn infer(&self, req: ModelInferRequest) -> Result<ModelInferResponse> {
        // batch size follows the prompt tensor; the numeric parameter
        // tensors are accepted and ignored by the dummy.
        let prompts = super::batch_elements(&req)?;
        let batch = prompts.len() as i64;

        let image = gradient_image();
        let mut pixels = Vec::with_capacity(prompts.len() * image.len());
        for _ in &prompts {
            pixels.extend_from_slice(&image);
        }

        Ok(ModelInferResponse::for_request(
            &req,
            vec![TensorMetadata::new(
                "images",
                DataType::Fp32,
                vec![
                    batch,
                    IMAGE_HEIGHT as i64,
                    IMAGE_WIDTH as i64,
                    IMAGE_CHANNELS as i64,
                ],
            )],
            vec![tensor::serialize_f32_tensor(&pixels)],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn generates_a_deterministic_image_per_prompt() {
        let raw =
            tensor::serialize_bytes_tensor(&[b"a tree".as_slice(), b"a dog".as_slice()]).unwrap();
        let req = ModelInferRequest {
            model_name: "t2i".to_string(),
            model_version: "1".to_string(),
            inputs: vec![TensorMetadata::new("prompt", DataType::String, vec![1])],
            raw_input_contents: vec![raw],
        };

        let resp = DummyImageGenerator.infer(req).await.unwrap();
        assert_eq!(resp.outputs[0].shape, vec![2, 5, 5, 3]);

        let pixels = tensor::deserialize_f32_tensor(&resp.raw_output_contents[0]).unwrap();
        assert_eq!(pixels.len(), 2 * 75);
        assert_eq!(pixels[0], 0.0);
        assert_eq!(pixels[74], 1.0);
        // both prompts get the same gradient.
        assert_eq!(pixels[..75], pixels[75..]);
    }
}
