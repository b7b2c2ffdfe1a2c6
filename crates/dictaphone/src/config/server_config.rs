use crate::config::default_endpoint_url;

use serde::{Deserialize, Serialize};

/// Transcription backend configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// WebSocket URL of the transcription backend.
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            endpoint_url: default_endpoint_url(),
        }
    }
}
