mod audio_config;
mod behaviour_config;
#[allow(clippy::module_inception)]
mod config;
mod hotkeys_config;
mod server_config;

pub(crate) use {
    audio_config::AudioConfig, behaviour_config::BehaviourConfig, config::Config,
    hotkeys_config::HotkeysConfig, server_config::ServerConfig,
};

use dictaphone_core::HotkeyConfig;

pub(crate) const DEFAULT_AUTO_PASTE: bool = true;
pub(crate) const DEFAULT_ENDPOINT_URL: &str = "ws://localhost:8765";

pub(crate) fn default_auto_paste() -> bool {
    DEFAULT_AUTO_PASTE
}

pub(crate) fn default_endpoint_url() -> String {
    DEFAULT_ENDPOINT_URL.to_string()
}

pub(crate) fn default_toggle_hotkey() -> HotkeyConfig {
    HotkeyConfig::new(["ctrl", "shift"], "Space")
}

pub(crate) fn default_hold_hotkey() -> HotkeyConfig {
    HotkeyConfig::new(["ctrl", "alt"], "Space")
}
