use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Transport channel is closed")]
    Closed,

    #[error("Transport channel is full")]
    Full,

    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Not an action message: {0}")]
    MalformedMessage(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Registry error: {0}")]
    Registry(#[from] trellis_editor::RegistryError),

    #[error("Invalid config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
