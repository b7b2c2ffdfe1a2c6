use crate::{CoreError, CoreResult};

use std::{collections::BTreeSet, fmt, panic::Location};

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};

/// Modifier names in display order.
pub const MODIFIER_NAMES: [&str; 4] = ["ctrl", "alt", "shift", "meta"];

/// A key chord such as `ctrl+shift+Space`.
///
/// Plain value: two configs are the same hotkey iff their modifier sets and
/// key are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HotkeyConfig {
    /// Held modifiers (`ctrl`, `alt`, `shift`, `meta`).
    pub modifiers: BTreeSet<String>,
    /// Main key, e.g. `Space`, `A`, `1`, `F5`.
    pub key: String,
}

impl HotkeyConfig {
    /// Build a chord, lower-casing modifier names.
    pub fn new<I, S>(modifiers: I, key: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            modifiers: modifiers
                .into_iter()
                .map(|m| m.as_ref().to_ascii_lowercase())
                .collect(),
            key: key.into(),
        }
    }

    /// Reject chords that cannot be registered: no modifier, unknown modifier,
    /// or a bare modifier as the key.
    #[track_caller]
    pub fn validate(&self) -> CoreResult<()> {
        let invalid = |reason: String| CoreError::InvalidHotkey {
            hotkey: self.to_string(),
            reason,
            location: ErrorLocation::from(Location::caller()),
        };

        if self.key.trim().is_empty() {
            return Err(invalid("no key given".to_string()));
        }

        if self.modifiers.is_empty() {
            return Err(invalid("at least one modifier is required".to_string()));
        }

        if let Some(unknown) = self
            .modifiers
            .iter()
            .find(|m| !MODIFIER_NAMES.contains(&m.to_ascii_lowercase().as_str()))
        {
            return Err(invalid(format!("unknown modifier '{}'", unknown)));
        }

        let key = self.key.to_ascii_lowercase();
        if MODIFIER_NAMES.contains(&key.as_str()) || key == "control" {
            return Err(invalid("a modifier cannot be the main key".to_string()));
        }

        Ok(())
    }
}

impl fmt::Display for HotkeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for name in MODIFIER_NAMES {
            if self.modifiers.iter().any(|m| m.eq_ignore_ascii_case(name)) {
                write!(f, "{}+", name)?;
            }
        }
        write!(f, "{}", self.key)
    }
}
