// SPDX-License-Identifier: PolyForm-Shield-1.0

//! typed post-processing of raw inference responses.
//!
//! backends answer with opaque tensor payloads; this module turns a
//! response plus the model's declared metadata into per-task structures a
//! caller can consume directly. output *names* are taken from the declared
//! metadata, where position is the contract; tensor *shapes* are taken from
//! the response, which always carries concrete dimensions.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use protocol::reshape::{self, ReshapeError};
use protocol::tensor::{self, TensorError};
use protocol::{DataType, ModelInferResponse, ModelMetadataResponse, Task, TensorMetadata};

/// errors turning a raw inference response into typed task outputs.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("model metadata declares {got} output(s), task {task:?} needs {expected}")]
    WrongOutputCount {
        task: Task,
        expected: usize,
        got: usize,
    },

    #[error("inference response carries no output named {name:?}")]
    MissingOutput { name: String },

    #[error("inference response carries no raw content for output {name:?}")]
    MissingContent { name: String },

    #[error("outputs {left} and {right} disagree on batch size: {left_len} vs {right_len}")]
    InconsistentBatch {
        left: &'static str,
        right: &'static str,
        left_len: usize,
        right_len: usize,
    },

    #[error("output {name:?} has unsupported datatype {datatype}")]
    UnsupportedDatatype { name: String, datatype: DataType },

    #[error(transparent)]
    Tensor(#[from] TensorError),

    #[error(transparent)]
    Reshape(#[from] ReshapeError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// boxes are `[x1, y1, x2, y2, score]` rows, labels one string per box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionOutput {
    pub boxes: Vec<Vec<Vec<f32>>>,
    pub labels: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeypointOutput {
    pub keypoints: Vec<Vec<Vec<Vec<f32>>>>,
    pub boxes: Vec<Vec<Vec<f32>>>,
    pub scores: Vec<Vec<f32>>,
}

/// OCR detections; models without a score head report every score as `-1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OcrOutput {
    pub boxes: Vec<Vec<Vec<f32>>>,
    pub texts: Vec<Vec<String>>,
    pub scores: Vec<Vec<f32>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceSegmentationOutput {
    pub rles: Vec<Vec<String>>,
    pub boxes: Vec<Vec<Vec<f32>>>,
    pub labels: Vec<Vec<String>>,
    pub scores: Vec<Vec<f32>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemanticSegmentationOutput {
    pub rles: Vec<Vec<String>>,
    pub categories: Vec<Vec<String>>,
}

/// images in `[batch, height, width, channels]` order, values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextToImageOutput {
    pub images: Vec<Vec<Vec<Vec<f32>>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextGenerationOutput {
    pub texts: Vec<String>,
}

/// one output of a task with no dedicated structure, decoded by datatype.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawOutput {
    pub name: String,
    pub shape: Vec<i64>,
    pub datatype: DataType,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOutput {
    Classification(Vec<String>),
    Detection(DetectionOutput),
    Keypoint(KeypointOutput),
    Ocr(OcrOutput),
    InstanceSegmentation(InstanceSegmentationOutput),
    SemanticSegmentation(SemanticSegmentationOutput),
    TextToImage(TextToImageOutput),
    TextGeneration(TextGenerationOutput),
    Unspecified(Vec<RawOutput>),
}

/// parse an inference response into the typed output for `task`.
pub fn post_process(
    resp: &ModelInferResponse,
    metadata: &ModelMetadataResponse,
    task: Task,
) -> Result<TaskOutput, OutputError> {
    match task {
        Task::Classification => {
            let names = declared_outputs(metadata, task, 1)?;
            Ok(TaskOutput::Classification(flat_strings(
                resp,
                &names[0].name,
            )?))
        }
        Task::Detection => {
            let names = declared_outputs(metadata, task, 2)?;
            let boxes = f32_rank3(resp, &names[0].name)?;
            let labels = string_rows(resp, &names[1].name)?;
            check_batch("boxes", boxes.len(), "labels", labels.len())?;
            Ok(TaskOutput::Detection(DetectionOutput { boxes, labels }))
        }
        Task::Keypoint => {
            let names = declared_outputs(metadata, task, 3)?;
            let keypoints = f32_rank4(resp, &names[0].name)?;
            let boxes = f32_rank3(resp, &names[1].name)?;
            let scores = f32_rank2(resp, &names[2].name)?;
            check_batch("keypoints", keypoints.len(), "boxes", boxes.len())?;
            check_batch("keypoints", keypoints.len(), "scores", scores.len())?;
            Ok(TaskOutput::Keypoint(KeypointOutput {
                keypoints,
                boxes,
                scores,
            }))
        }
        Task::Ocr => post_process_ocr(resp, metadata),
        Task::InstanceSegmentation => {
            let names = declared_outputs(metadata, task, 4)?;
            let rles = string_rows(resp, &names[0].name)?;
            let boxes = f32_rank3(resp, &names[1].name)?;
            let labels = string_rows(resp, &names[2].name)?;
            let scores = f32_rank2(resp, &names[3].name)?;
            check_batch("rles", rles.len(), "boxes", boxes.len())?;
            check_batch("rles", rles.len(), "labels", labels.len())?;
            check_batch("rles", rles.len(), "scores", scores.len())?;
            Ok(TaskOutput::InstanceSegmentation(InstanceSegmentationOutput {
                rles,
                boxes,
                labels,
                scores,
            }))
        }
        Task::SemanticSegmentation => {
            let names = declared_outputs(metadata, task, 2)?;
            let rles = string_rows(resp, &names[0].name)?;
            let categories = string_rows(resp, &names[1].name)?;
            check_batch("rles", rles.len(), "categories", categories.len())?;
            Ok(TaskOutput::SemanticSegmentation(SemanticSegmentationOutput {
                rles,
                categories,
            }))
        }
        Task::TextToImage => {
            let names = declared_outputs(metadata, task, 1)?;
            Ok(TaskOutput::TextToImage(TextToImageOutput {
                images: f32_rank4(resp, &names[0].name)?,
            }))
        }
        Task::TextGeneration | Task::VisualQuestionAnswering => {
            let names = declared_outputs(metadata, task, 1)?;
            Ok(TaskOutput::TextGeneration(TextGenerationOutput {
                texts: flat_strings(resp, &names[0].name)?,
            }))
        }
        Task::Unspecified => post_process_unspecified(resp, &metadata.outputs),
    }
}

fn post_process_ocr(
    resp: &ModelInferResponse,
    metadata: &ModelMetadataResponse,
) -> Result<TaskOutput, OutputError> {
    // two declared outputs means the model has no score head.
    if metadata.outputs.len() < 2 {
        return Err(OutputError::WrongOutputCount {
            task: Task::Ocr,
            expected: 2,
            got: metadata.outputs.len(),
        });
    }

    let boxes = f32_rank3(resp, &metadata.outputs[0].name)?;
    let texts = string_rows(resp, &metadata.outputs[1].name)?;
    check_batch("boxes", boxes.len(), "texts", texts.len())?;

    let scores = if metadata.outputs.len() >= 3 {
        let scores = f32_rank2(resp, &metadata.outputs[2].name)?;
        check_batch("texts", texts.len(), "scores", scores.len())?;
        scores
    } else {
        texts.iter().map(|row| vec![-1.0; row.len()]).collect()
    };

    Ok(TaskOutput::Ocr(OcrOutput {
        boxes,
        texts,
        scores,
    }))
}

fn post_process_unspecified(
    resp: &ModelInferResponse,
    outputs: &[TensorMetadata],
) -> Result<TaskOutput, OutputError> {
    let mut raw_outputs = Vec::with_capacity(outputs.len());

    for output in outputs {
        let (meta, content) = output_by_name(resp, &output.name)?;
        let rank = meta.shape.len();

        let data = match output.datatype {
            DataType::String => {
                let strings = tensor::utf8_strings(tensor::deserialize_bytes_tensor(content)?)?;
                if rank == 1 {
                    serde_json::to_value(strings)?
                } else {
                    serde_json::to_value(reshape::reshape_2d(&strings, &meta.shape)?)?
                }
            }
            DataType::Fp32 => {
                let values = tensor::deserialize_f32_tensor(content)?;
                match rank {
                    1 => serde_json::to_value(values)?,
                    2 => serde_json::to_value(reshape::reshape_2d(&values, &meta.shape)?)?,
                    _ => serde_json::to_value(reshape::reshape_3d(&values, &meta.shape)?)?,
                }
            }
            DataType::Int32 => {
                let values = tensor::deserialize_i32_tensor(content)?;
                if rank == 1 {
                    serde_json::to_value(values)?
                } else {
                    serde_json::to_value(reshape::reshape_2d(&values, &meta.shape)?)?
                }
            }
            datatype => {
                return Err(OutputError::UnsupportedDatatype {
                    name: output.name.clone(),
                    datatype,
                })
            }
        };

        // per-batch consumers drop the leading batch dimension.
        let shape = if rank <= 1 {
            meta.shape.clone()
        } else {
            meta.shape[1..].to_vec()
        };

        raw_outputs.push(RawOutput {
            name: output.name.clone(),
            shape,
            datatype: output.datatype,
            data,
        });
    }

    Ok(TaskOutput::Unspecified(raw_outputs))
}

fn declared_outputs(
    metadata: &ModelMetadataResponse,
    task: Task,
    expected: usize,
) -> Result<&[TensorMetadata], OutputError> {
    if metadata.outputs.len() < expected {
        return Err(OutputError::WrongOutputCount {
            task,
            expected,
            got: metadata.outputs.len(),
        });
    }
    Ok(&metadata.outputs)
}

fn output_by_name<'a>(
    resp: &'a ModelInferResponse,
    name: &str,
) -> Result<(&'a TensorMetadata, &'a [u8]), OutputError> {
    let index = resp
        .outputs
        .iter()
        .position(|o| o.name == name)
        .ok_or_else(|| OutputError::MissingOutput {
            name: name.to_string(),
        })?;
    let content = resp
        .raw_output_contents
        .get(index)
        .ok_or_else(|| OutputError::MissingContent {
            name: name.to_string(),
        })?;
    Ok((&resp.outputs[index], content.as_slice()))
}

fn check_batch(
    left: &'static str,
    left_len: usize,
    right: &'static str,
    right_len: usize,
) -> Result<(), OutputError> {
    if left_len != right_len {
        return Err(OutputError::InconsistentBatch {
            left,
            right,
            left_len,
            right_len,
        });
    }
    Ok(())
}

fn flat_strings(resp: &ModelInferResponse, name: &str) -> Result<Vec<String>, OutputError> {
    let (_, content) = output_by_name(resp, name)?;
    Ok(tensor::utf8_strings(tensor::deserialize_bytes_tensor(
        content,
    )?)?)
}

fn string_rows(resp: &ModelInferResponse, name: &str) -> Result<Vec<Vec<String>>, OutputError> {
    let (meta, content) = output_by_name(resp, name)?;
    let strings = tensor::utf8_strings(tensor::deserialize_bytes_tensor(content)?)?;
    Ok(reshape::reshape_2d(&strings, &meta.shape)?)
}

fn f32_rank2(resp: &ModelInferResponse, name: &str) -> Result<Vec<Vec<f32>>, OutputError> {
    let (meta, content) = output_by_name(resp, name)?;
    let values = tensor::deserialize_f32_tensor(content)?;
    Ok(reshape::reshape_2d(&values, &meta.shape)?)
}

fn f32_rank3(resp: &ModelInferResponse, name: &str) -> Result<Vec<Vec<Vec<f32>>>, OutputError> {
    let (meta, content) = output_by_name(resp, name)?;
    let values = tensor::deserialize_f32_tensor(content)?;
    Ok(reshape::reshape_3d(&values, &meta.shape)?)
}

fn f32_rank4(
    resp: &ModelInferResponse,
    name: &str,
) -> Result<Vec<Vec<Vec<Vec<f32>>>>, OutputError> {
    let (meta, content) = output_by_name(resp, name)?;
    let values = tensor::deserialize_f32_tensor(content)?;
    Ok(reshape::reshape_4d(&values, &meta.shape)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dummy::{DummyClassifier, DummyDetector, DummySemanticSegmenter};
    use crate::ModelBackend;
    use protocol::{ModelInferRequest, ModelMetadataRequest};

    fn infer_request<T: AsRef<[u8]>>(batch: &[T]) -> ModelInferRequest {
        ModelInferRequest {
            model_name: "m".to_string(),
            model_version: "1".to_string(),
            inputs: vec![TensorMetadata::new("input", DataType::String, vec![1])],
            raw_input_contents: vec![tensor::serialize_bytes_tensor(batch).unwrap()],
        }
    }

    fn metadata_request() -> ModelMetadataRequest {
        ModelMetadataRequest {
            name: "m".to_string(),
            version: "1".to_string(),
        }
    }

    #[tokio::test]
    async fn classification_yields_score_label_strings() {
        let backend = DummyClassifier;
        let meta = backend.metadata(metadata_request());
        let resp = backend.infer(infer_request(&[b"x", b"y"])).await.unwrap();

        let output = post_process(&resp, &meta, Task::Classification).unwrap();
        assert_eq!(
            output,
            TaskOutput::Classification(vec!["1:match".to_string(), "1:match".to_string()])
        );
    }

    #[tokio::test]
    async fn detection_yields_boxes_and_labels_in_lockstep() {
        let backend = DummyDetector;
        let meta = backend.metadata(metadata_request());
        let resp = backend.infer(infer_request(&[b"x"])).await.unwrap();

        match post_process(&resp, &meta, Task::Detection).unwrap() {
            TaskOutput::Detection(det) => {
                assert_eq!(det.boxes, vec![vec![vec![0.0, 0.0, 0.0, 0.0, 1.0]]]);
                assert_eq!(det.labels, vec![vec!["test".to_string()]]);
            }
            other => panic!("unexpected output {other:?}"),
        }
    }

    #[tokio::test]
    async fn semantic_segmentation_yields_rles_and_categories() {
        let backend = DummySemanticSegmenter;
        let meta = backend.metadata(metadata_request());
        let resp = backend.infer(infer_request(&[b"x"])).await.unwrap();

        match post_process(&resp, &meta, Task::SemanticSegmentation).unwrap() {
            TaskOutput::SemanticSegmentation(seg) => {
                assert_eq!(seg.categories, vec![vec!["tree".to_string()]]);
                assert_eq!(seg.rles[0].len(), 1);
            }
            other => panic!("unexpected output {other:?}"),
        }
    }

    fn ocr_response(with_scores: bool) -> (ModelInferResponse, ModelMetadataResponse) {
        let mut outputs = vec![
            TensorMetadata::new("boxes", DataType::Fp32, vec![1, 1, 4]),
            TensorMetadata::new("texts", DataType::String, vec![1, 1]),
        ];
        let mut raw = vec![
            tensor::serialize_f32_tensor(&[0.0, 0.0, 10.0, 10.0]),
            tensor::serialize_bytes_tensor(&[b"stop"]).unwrap(),
        ];
        if with_scores {
            outputs.push(TensorMetadata::new("scores", DataType::Fp32, vec![1, 1]));
            raw.push(tensor::serialize_f32_tensor(&[0.9]));
        }

        let declared = outputs
            .iter()
            .map(|o| TensorMetadata::new(o.name.clone(), o.datatype, vec![-1, -1]))
            .collect();
        (
            ModelInferResponse {
                model_name: "ocr".to_string(),
                model_version: "1".to_string(),
                outputs,
                raw_output_contents: raw,
            },
            ModelMetadataResponse {
                name: "ocr".to_string(),
                versions: vec!["1".to_string()],
                framework: "dummy".to_string(),
                inputs: vec![TensorMetadata::new("input", DataType::String, vec![1])],
                outputs: declared,
            },
        )
    }

    #[test]
    fn ocr_without_score_head_defaults_scores() {
        let (resp, meta) = ocr_response(false);
        match post_process(&resp, &meta, Task::Ocr).unwrap() {
            TaskOutput::Ocr(ocr) => {
                assert_eq!(ocr.texts, vec![vec!["stop".to_string()]]);
                assert_eq!(ocr.scores, vec![vec![-1.0]]);
            }
            other => panic!("unexpected output {other:?}"),
        }
    }

    #[test]
    fn ocr_with_score_head_keeps_scores() {
        let (resp, meta) = ocr_response(true);
        match post_process(&resp, &meta, Task::Ocr).unwrap() {
            TaskOutput::Ocr(ocr) => assert_eq!(ocr.scores, vec![vec![0.9]]),
            other => panic!("unexpected output {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_declared_output_is_an_error() {
        let backend = DummyClassifier;
        let mut meta = backend.metadata(metadata_request());
        meta.outputs[0].name = "not_there".to_string();
        let resp = backend.infer(infer_request(&[b"x"])).await.unwrap();

        let err = post_process(&resp, &meta, Task::Classification).unwrap_err();
        assert!(matches!(err, OutputError::MissingOutput { name } if name == "not_there"));
    }

    #[test]
    fn unspecified_task_decodes_by_datatype() {
        let resp = ModelInferResponse {
            model_name: "m".to_string(),
            model_version: "1".to_string(),
            outputs: vec![
                TensorMetadata::new("embedding", DataType::Fp32, vec![2, 2]),
                TensorMetadata::new("tags", DataType::String, vec![2]),
            ],
            raw_output_contents: vec![
                tensor::serialize_f32_tensor(&[1.0, 2.0, 3.0, 4.0]),
                tensor::serialize_bytes_tensor(&[b"a", b"b"]).unwrap(),
            ],
        };
        let meta = ModelMetadataResponse {
            name: "m".to_string(),
            versions: vec!["1".to_string()],
            framework: "dummy".to_string(),
            inputs: Vec::new(),
            outputs: resp.outputs.clone(),
        };

        match post_process(&resp, &meta, Task::Unspecified).unwrap() {
            TaskOutput::Unspecified(raw) => {
                assert_eq!(raw.len(), 2);
                assert_eq!(raw[0].shape, vec![2]);
                assert_eq!(raw[0].data, serde_json::json!([[1.0, 2.0], [3.0, 4.0]]));
                assert_eq!(raw[1].shape, vec![2]);
                assert_eq!(raw[1].data, serde_json::json!(["a", "b"]));
            }
            other => panic!("unexpected output {other:?}"),
        }
    }
}
