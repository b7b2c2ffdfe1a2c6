use crate::config::default_auto_paste;

use serde::{Deserialize, Serialize};

/// Application behavior configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviourConfig {
    /// Whether to paste the transcript into the focused window after copying it.
    #[serde(default = "default_auto_paste")]
    pub auto_paste: bool,
}

impl Default for BehaviourConfig {
    fn default() -> Self {
        Self {
            auto_paste: default_auto_paste(),
        }
    }
}
