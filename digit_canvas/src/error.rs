use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or writing a weights blob.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot decode weights: {0}")]
    Decode(String),

    #[error("weights are missing tensor {name}")]
    MissingTensor { name: String },

    #[error("weights contain unexpected tensor {name}")]
    UnexpectedTensor { name: String },

    #[error("tensor {name} is stored as {found}, expected F32")]
    Dtype { name: String, found: String },

    #[error("tensor {name} has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        name: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("tensor {name} holds NaN or infinite values")]
    NonFinite { name: String },

    #[error("cannot encode weights: {0}")]
    Encode(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised for canvas pixel grids the normalizer cannot accept.
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("canvas must be {expected:?} pixels, found {found:?}")]
    Dimensions {
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error("canvas buffer holds {found} bytes, expected {expected}")]
    Buffer { expected: usize, found: usize },

    #[error("cannot decode canvas image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Errors raised by a forward pass.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("model produced a non-finite probability distribution")]
    NonFinite,
}

/// Errors raised while recomputing the results panel.
#[derive(Debug, Error)]
pub enum ViewError {
    #[error(transparent)]
    Canvas(#[from] CanvasError),

    #[error("cannot classify the drawing: {0}")]
    Predict(#[from] PredictError),
}
