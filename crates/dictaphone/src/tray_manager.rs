//! System tray icon that follows the session phase.
//!
//! Icons are drawn at runtime as filled circles, one colour per
//! [`TrayIconState`].

use crate::{AppError, AppResult, TrayIconState};

use std::panic::Location;

use error_location::ErrorLocation;
use tracing::{debug, info, instrument};
use tray_icon::{
    Icon, TrayIcon, TrayIconBuilder,
    menu::{Menu, MenuId, MenuItem, PredefinedMenuItem},
};

const ICON_SIZE: u32 = 32;

/// Ids of the tray menu entries, handed to the async side.
#[derive(Debug, Clone)]
pub struct TrayMenuIds {
    /// Open the config file.
    pub settings: MenuId,
    /// Re-read the config file.
    pub reload: MenuId,
    /// Copy the most recent transcript.
    pub copy_last: MenuId,
    /// Empty the transcript history.
    pub clear_history: MenuId,
    /// Quit.
    pub exit: MenuId,
}

/// System tray icon manager.
pub struct TrayManager {
    tray_icon: TrayIcon,
    menu_ids: TrayMenuIds,
    state: TrayIconState,
}

impl TrayManager {
    /// Create the tray icon and its menu.
    #[track_caller]
    #[instrument]
    pub fn new() -> AppResult<Self> {
        let menu = Menu::new();

        let settings = MenuItem::new("Settings", true, None);
        let reload = MenuItem::new("Reload settings", true, None);
        let copy_last = MenuItem::new("Copy last transcript", true, None);
        let clear_history = MenuItem::new("Clear history", true, None);
        let exit = MenuItem::new("Exit", true, None);

        let menu_ids = TrayMenuIds {
            settings: settings.id().clone(),
            reload: reload.id().clone(),
            copy_last: copy_last.id().clone(),
            clear_history: clear_history.id().clone(),
            exit: exit.id().clone(),
        };

        menu.append_items(&[
            &settings,
            &reload,
            &PredefinedMenuItem::separator(),
            &copy_last,
            &clear_history,
            &PredefinedMenuItem::separator(),
            &exit,
        ])
        .map_err(|e| AppError::Tray {
            reason: format!("Failed to build tray menu: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let state = TrayIconState::Idle;

        let tray_icon = TrayIconBuilder::new()
            .with_tooltip(state.tooltip())
            .with_menu(Box::new(menu))
            .with_icon(render_icon(state)?)
            .build()
            .map_err(|e| AppError::Tray {
                reason: format!("Failed to create tray icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!("System tray icon initialized");

        Ok(Self {
            tray_icon,
            menu_ids,
            state,
        })
    }

    /// Show `state`. No-op if it is already shown.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn update_state(&mut self, state: TrayIconState) -> AppResult<()> {
        if state == self.state {
            return Ok(());
        }

        self.tray_icon
            .set_icon(Some(render_icon(state)?))
            .map_err(|e| AppError::Tray {
                reason: format!("Failed to update icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        self.tray_icon
            .set_tooltip(Some(state.tooltip()))
            .map_err(|e| AppError::Tray {
                reason: format!("Failed to update tooltip: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        debug!(from = ?self.state, to = ?state, "Tray state updated");
        self.state = state;

        Ok(())
    }

    /// Menu entry ids.
    pub fn menu_ids(&self) -> &TrayMenuIds {
        &self.menu_ids
    }
}

/// Draw a filled, anti-aliased circle in the state's colour.
#[track_caller]
fn render_icon(state: TrayIconState) -> AppResult<Icon> {
    Icon::from_rgba(circle_rgba(state.colour(), ICON_SIZE), ICON_SIZE, ICON_SIZE).map_err(|e| {
        AppError::Tray {
            reason: format!("Failed to create icon from RGBA: {}", e),
            location: ErrorLocation::from(Location::caller()),
        }
    })
}

/// RGBA pixels of a `size`×`size` circle; alpha fades over the outer pixel.
pub(crate) fn circle_rgba([r, g, b]: [u8; 3], size: u32) -> Vec<u8> {
    let centre = size as f32 / 2.0;
    let radius = centre - 1.0;
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);

    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 + 0.5 - centre;
            let dy = y as f32 + 0.5 - centre;
            let coverage = (radius - (dx * dx + dy * dy).sqrt() + 0.5).clamp(0.0, 1.0);
            pixels.extend_from_slice(&[r, g, b, (coverage * 255.0) as u8]);
        }
    }

    pixels
}
