use serde::{Deserialize, Serialize};

/// Audio device configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Selected input device id (None = system default device).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_device: Option<String>,
}
