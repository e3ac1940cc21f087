use crate::errors::SyncError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use trellis_editor::{RequestModelAction, SelectAction, SelectAllAction};

pub const DEFAULT_CONFIG_NAME: &str = "trellis.config.json";

/// Diagram client configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramServerConfig {
    /// Id sent with every envelope; envelopes for other ids are ignored
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// The renderer measures elements before the model is shown
    #[serde(default = "default_true")]
    pub needs_client_layout: bool,

    /// The authority computes layout from measured bounds
    #[serde(default)]
    pub needs_server_layout: bool,

    /// Action kinds sent to the authority when produced locally
    #[serde(default = "default_forwarded_kinds")]
    pub forwarded_kinds: Vec<String>,

    /// Maximum follow-up nesting per dispatch (unbounded when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cascade_depth: Option<usize>,
}

fn default_client_id() -> String {
    "trellis-client".to_string()
}

fn default_true() -> bool {
    true
}

fn default_forwarded_kinds() -> Vec<String> {
    vec![
        RequestModelAction::KIND.to_string(),
        SelectAction::KIND.to_string(),
        SelectAllAction::KIND.to_string(),
    ]
}

impl DiagramServerConfig {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            ..Self::default()
        }
    }

    /// Load config from a directory, falling back to defaults when there is none
    pub fn load(cwd: &str) -> Result<Self, SyncError> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            Self::load_file(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_file(path: &Path) -> Result<Self, SyncError> {
        let content = std::fs::read_to_string(path)?;
        let config: DiagramServerConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, SyncError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for DiagramServerConfig {
    fn default() -> Self {
        Self {
            client_id: default_client_id(),
            needs_client_layout: true,
            needs_server_layout: false,
            forwarded_kinds: default_forwarded_kinds(),
            max_cascade_depth: None,
        }
    }
}
