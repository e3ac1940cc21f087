//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Command {0} has not been executed")]
    NotExecuted(&'static str),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Command type {0} has no KIND; registration skipped")]
    MissingKind(&'static str),
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Invalid action JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Model error: {0}")]
    Model(#[from] trellis_model::ModelError),
}
