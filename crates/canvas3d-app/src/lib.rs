//! Canvas3D Application
//!
//! Window, input mapping and file dialogs around the editor and renderer.

mod app;
mod config;
mod shortcuts;

pub use app::{App, AppError};
pub use config::{AppConfig, ConfigError, CONFIG_ENV, CONFIG_FILE};
pub use shortcuts::{Command, Shortcut, ShortcutRegistry};
