//! Application path management for portable and installed modes.
//!
//! ## Mode Detection
//!
//! - **Dev mode** (debug builds only): `meaty.yaml` in the current working
//!   directory is used directly.
//! - **Portable mode**: If a `.portable` marker file exists next to the
//!   executable, settings and mapping files live in the same directory.
//! - **Installed mode** (default): Settings live in the platform config
//!   directory and mapping files in the platform data directory.

use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application name used for directories in installed mode
const APP_NAME: &str = "Meaty MIDI Editor";

/// Settings file name
pub const SETTINGS_FILE: &str = "meaty.yaml";

/// Directory (under the base dir) holding saved mapping files
const MAPPINGS_DIR: &str = "mappings";

/// Application paths for settings and mapping files.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Path to the settings file
    pub settings: PathBuf,
    /// Default directory for mapping files
    pub mappings_dir: PathBuf,
    /// Whether running in portable mode (settings next to exe)
    pub is_portable: bool,
}

impl AppPaths {
    /// Detect the appropriate paths based on environment.
    ///
    /// Note: This is called before logging is initialized, so we use eprintln
    /// for early diagnostic output.
    pub fn detect() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));

        #[cfg(debug_assertions)]
        {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            if cwd.join(SETTINGS_FILE).exists() {
                eprintln!(
                    "[paths] Running in DEV mode ({} found in cwd: {})",
                    SETTINGS_FILE,
                    cwd.display()
                );
                return Self::portable(&cwd);
            }
        }

        if exe_dir.join(".portable").exists() {
            #[cfg(debug_assertions)]
            eprintln!("[paths] Running in PORTABLE mode (.portable marker found)");
            return Self::portable(&exe_dir);
        }

        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| {
                eprintln!(
                    "[paths] WARNING: dirs::config_dir() returned None, falling back to exe dir"
                );
                exe_dir.clone()
            })
            .join(APP_NAME);
        let data_dir = dirs::data_dir()
            .map(|dir| dir.join(APP_NAME))
            .unwrap_or_else(|| config_dir.clone());

        #[cfg(debug_assertions)]
        eprintln!(
            "[paths] Running in INSTALLED mode (settings dir: {})",
            config_dir.display()
        );

        Self {
            settings: config_dir.join(SETTINGS_FILE),
            mappings_dir: data_dir.join(MAPPINGS_DIR),
            is_portable: false,
        }
    }

    /// All files under a single base directory
    pub fn portable(base: &Path) -> Self {
        Self {
            settings: base.join(SETTINGS_FILE),
            mappings_dir: base.join(MAPPINGS_DIR),
            is_portable: true,
        }
    }

    /// Get the base directory (for displaying in logs)
    pub fn base_dir(&self) -> PathBuf {
        self.settings
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Resolve a mapping file argument: bare file names land in the
    /// mappings directory, anything with a directory part is used as given
    pub fn resolve_mapping(&self, name: &str) -> PathBuf {
        let path = PathBuf::from(name);
        if path.is_absolute() || path.parent().is_some_and(|p| !p.as_os_str().is_empty()) {
            path
        } else {
            self.mappings_dir.join(path)
        }
    }

    /// Ensure the mappings directory exists.
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        if !self.mappings_dir.exists() {
            debug!("Creating mappings directory: {}", self.mappings_dir.display());
            std::fs::create_dir_all(&self.mappings_dir).with_context(|| {
                format!(
                    "Failed to create mappings directory {}",
                    self.mappings_dir.display()
                )
            })?;
        }
        Ok(())
    }
}
