// SPDX-License-Identifier: PolyForm-Shield-1.0

//! stock dummy backends, one per task.
//!
//! each backend decodes the incoming byte tensor, ignores its content, and
//! answers with a fixed payload of the right shape and datatype. they exist
//! so the serving surface can be exercised end to end without a real model
//! runtime behind it, and they double as executable documentation of each
//! task's tensor contract.

use anyhow::{anyhow, Result};

use protocol::tensor;
use protocol::ModelInferRequest;

mod classification;
mod detection;
mod keypoint;
mod segmentation;
mod text_generation;
mod text_to_image;

pub use classification::DummyClassifier;
pub use detection::DummyDetector;
pub use keypoint::DummyKeypointEstimator;
pub use segmentation::{DummyInstanceSegmenter, DummySemanticSegmenter};
pub use text_generation::{DummyTextGenerator, DummyVisualQuestionAnswerer};
pub use text_to_image::DummyImageGenerator;

/// decode the first raw input tensor into its batch of byte elements.
///
/// every dummy task takes a byte tensor as its first input; the batch size
/// of the response is the element count of that tensor.
fn batch_elements(req: &ModelInferRequest) -> Result<Vec<Vec<u8>>> {
    let raw = req
        .raw_input_contents
        .first()
        .ok_or_else(|| anyhow!("inference request carries no raw input tensors"))?;
    Ok(tensor::deserialize_bytes_tensor(raw)?)
}
