// SPDX-License-Identifier: PolyForm-Shield-1.0

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod reshape;
pub mod tensor;

/// wire-level element type of a tensor.
///
/// the names follow the upstream serving convention (`TYPE_BOOL` through
/// `TYPE_STRING`) so that metadata passing through foreign transports keeps
/// the spelling the ecosystem expects. `String` marks a byte tensor: its raw
/// contents are length-prefixed records as produced by
/// [`tensor::serialize_bytes_tensor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    #[serde(rename = "TYPE_BOOL")]
    Bool,
    #[serde(rename = "TYPE_UINT8")]
    Uint8,
    #[serde(rename = "TYPE_UINT16")]
    Uint16,
    #[serde(rename = "TYPE_UINT32")]
    Uint32,
    #[serde(rename = "TYPE_UINT64")]
    Uint64,
    #[serde(rename = "TYPE_INT8")]
    Int8,
    #[serde(rename = "TYPE_INT16")]
    Int16,
    #[serde(rename = "TYPE_INT32")]
    Int32,
    #[serde(rename = "TYPE_INT64")]
    Int64,
    #[serde(rename = "TYPE_FP16")]
    Fp16,
    #[serde(rename = "TYPE_FP32")]
    Fp32,
    #[serde(rename = "TYPE_FP64")]
    Fp64,
    #[serde(rename = "TYPE_STRING")]
    String,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Bool => "TYPE_BOOL",
            DataType::Uint8 => "TYPE_UINT8",
            DataType::Uint16 => "TYPE_UINT16",
            DataType::Uint32 => "TYPE_UINT32",
            DataType::Uint64 => "TYPE_UINT64",
            DataType::Int8 => "TYPE_INT8",
            DataType::Int16 => "TYPE_INT16",
            DataType::Int32 => "TYPE_INT32",
            DataType::Int64 => "TYPE_INT64",
            DataType::Fp16 => "TYPE_FP16",
            DataType::Fp32 => "TYPE_FP32",
            DataType::Fp64 => "TYPE_FP64",
            DataType::String => "TYPE_STRING",
        };
        f.write_str(name)
    }
}

/// the vision/language task a model serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    Classification,
    Detection,
    Keypoint,
    Ocr,
    InstanceSegmentation,
    SemanticSegmentation,
    TextToImage,
    TextGeneration,
    VisualQuestionAnswering,
    Unspecified,
}

/// shape and type of a single named tensor.
///
/// shapes use `-1` for a dynamic dimension in declared model metadata;
/// shapes carried on an inference response are always concrete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorMetadata {
    pub name: String,
    pub datatype: DataType,
    pub shape: Vec<i64>,
}

impl TensorMetadata {
    pub fn new<S: Into<String>>(name: S, datatype: DataType, shape: Vec<i64>) -> Self {
        Self {
            name: name.into(),
            datatype,
            shape,
        }
    }
}

/// request for a model's declared input/output tensors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadataRequest {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadataResponse {
    pub name: String,
    pub versions: Vec<String>,
    pub framework: String,
    pub inputs: Vec<TensorMetadata>,
    pub outputs: Vec<TensorMetadata>,
}

impl ModelMetadataResponse {
    /// build a metadata response echoing the requested name and version.
    pub fn for_request(
        req: &ModelMetadataRequest,
        framework: &str,
        inputs: Vec<TensorMetadata>,
        outputs: Vec<TensorMetadata>,
    ) -> Self {
        Self {
            name: req.name.clone(),
            versions: vec![req.version.clone()],
            framework: framework.to_string(),
            inputs,
            outputs,
        }
    }
}

/// readiness probe for one model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelReadyRequest {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelReadyResponse {
    pub ready: bool,
}

/// inference request carrying one opaque byte buffer per input tensor.
///
/// `raw_input_contents[i]` is the encoded payload of `inputs[i]`: a
/// length-prefixed byte tensor for `TYPE_STRING` inputs, densely packed
/// little-endian values otherwise. the transport envelope around this
/// structure is out of scope here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInferRequest {
    pub model_name: String,
    pub model_version: String,
    pub inputs: Vec<TensorMetadata>,
    pub raw_input_contents: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInferResponse {
    pub model_name: String,
    pub model_version: String,
    pub outputs: Vec<TensorMetadata>,
    pub raw_output_contents: Vec<Vec<u8>>,
}

impl ModelInferResponse {
    /// build an inference response echoing the request's model identity.
    ///
    /// `outputs[i]` must describe `raw_outputs[i]`; backends are expected to
    /// keep the two in lockstep.
    pub fn for_request(
        req: &ModelInferRequest,
        outputs: Vec<TensorMetadata>,
        raw_outputs: Vec<Vec<u8>>,
    ) -> Self {
        Self {
            model_name: req.model_name.clone(),
            model_version: req.model_version.clone(),
            outputs,
            raw_output_contents: raw_outputs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datatype_wire_names() {
        assert_eq!(DataType::Fp32.to_string(), "TYPE_FP32");
        assert_eq!(DataType::String.to_string(), "TYPE_STRING");
    }

    #[test]
    fn task_manifest_names() {
        let task: Task = serde_json::from_str("\"text_to_image\"").unwrap();
        assert_eq!(task, Task::TextToImage);
        let task: Task = serde_json::from_str("\"visual_question_answering\"").unwrap();
        assert_eq!(task, Task::VisualQuestionAnswering);
    }

    #[test]
    fn metadata_response_echoes_request() {
        let req = ModelMetadataRequest {
            name: "mobilenet".to_string(),
            version: "2".to_string(),
        };
        let resp = ModelMetadataResponse::for_request(
            &req,
            "dummy",
            vec![TensorMetadata::new("input", DataType::String, vec![1])],
            vec![TensorMetadata::new("output", DataType::String, vec![-1, 1])],
        );
        assert_eq!(resp.name, "mobilenet");
        assert_eq!(resp.versions, vec!["2".to_string()]);
        assert_eq!(resp.inputs[0].shape, vec![1]);
        assert_eq!(resp.outputs[0].datatype, DataType::String);
    }
}
