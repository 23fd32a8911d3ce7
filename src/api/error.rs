use thiserror::Error;

use crate::core::ProjectionError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Projection failed: {0}")]
    Projection(#[from] ProjectionError),
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}
