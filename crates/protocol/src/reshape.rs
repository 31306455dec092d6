// SPDX-License-Identifier: PolyForm-Shield-1.0

//! shape helpers for flattened tensor payloads.
//!
//! raw tensor contents travel as flat sequences while metadata carries the
//! logical shape. these helpers re-nest a flat slice into 2-, 3- or
//! 4-dimensional form, validating the shape against the element count
//! first. shapes here must be concrete; a `-1` dynamic dimension is only
//! legal in declared model metadata, never on a response being reshaped.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReshapeError {
    #[error("expected a {expected}D shape, got {got}D shape {shape:?}")]
    WrongRank {
        expected: usize,
        got: usize,
        shape: Vec<i64>,
    },

    #[error("shape {shape:?} has a non-concrete dimension")]
    DynamicDim { shape: Vec<i64> },

    #[error("cannot reshape {len} elements into shape {shape:?}")]
    LengthMismatch { len: usize, shape: Vec<i64> },
}

fn checked_dims(shape: &[i64], rank: usize, len: usize) -> Result<Vec<usize>, ReshapeError> {
    if shape.len() != rank {
        return Err(ReshapeError::WrongRank {
            expected: rank,
            got: shape.len(),
            shape: shape.to_vec(),
        });
    }
    if shape.iter().any(|d| *d < 0) {
        return Err(ReshapeError::DynamicDim {
            shape: shape.to_vec(),
        });
    }

    let dims: Vec<usize> = shape.iter().map(|d| *d as usize).collect();
    let product: usize = dims.iter().product();
    if product != len {
        return Err(ReshapeError::LengthMismatch {
            len,
            shape: shape.to_vec(),
        });
    }

    Ok(dims)
}

/// re-nest a flat slice as `shape[0]` rows of `shape[1]` elements.
pub fn reshape_2d<T: Clone>(values: &[T], shape: &[i64]) -> Result<Vec<Vec<T>>, ReshapeError> {
    let dims = checked_dims(shape, 2, values.len())?;
    if values.is_empty() {
        return Ok(Vec::new());
    }
    Ok(values.chunks(dims[1]).map(|row| row.to_vec()).collect())
}

/// re-nest a flat slice into a `shape[0] x shape[1] x shape[2]` structure.
pub fn reshape_3d<T: Clone>(values: &[T], shape: &[i64]) -> Result<Vec<Vec<Vec<T>>>, ReshapeError> {
    let dims = checked_dims(shape, 3, values.len())?;
    if values.is_empty() {
        return Ok(Vec::new());
    }
    let plane = dims[1] * dims[2];
    Ok(values
        .chunks(plane)
        .map(|plane| plane.chunks(dims[2]).map(|row| row.to_vec()).collect())
        .collect())
}

/// re-nest a flat slice into a rank-4 structure.
pub fn reshape_4d<T: Clone>(
    values: &[T],
    shape: &[i64],
) -> Result<Vec<Vec<Vec<Vec<T>>>>, ReshapeError> {
    let dims = checked_dims(shape, 4, values.len())?;
    if values.is_empty() {
        return Ok(Vec::new());
    }
    let block = dims[1] * dims[2] * dims[3];
    let plane = dims[2] * dims[3];
    Ok(values
        .chunks(block)
        .map(|block| {
            block
                .chunks(plane)
                .map(|plane| plane.chunks(dims[3]).map(|row| row.to_vec()).collect())
                .collect()
        })
        .collect())
}
