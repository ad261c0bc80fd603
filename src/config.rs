//! Editor settings
//!
//! Handles loading, validating and saving the YAML settings file. A missing
//! file is not an error: every field has a default.

use crate::codec::{LoadPolicy, SerializeOptions};
use crate::error::AssignError;
use crate::mapping::{Assignment, FunctionType, Layer};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Root settings structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct EditorConfig {
    #[serde(default)]
    pub defaults: AssignmentDefaults,
    #[serde(default)]
    pub file: FileConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Values proposed by the mapping form for an unassigned control
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AssignmentDefaults {
    #[serde(default = "default_function_type")]
    pub function_type: FunctionType,
    #[serde(default = "default_channel")]
    pub channel: u8,
    #[serde(default = "default_number")]
    pub number: u8,
}

impl AssignmentDefaults {
    pub fn assignment(&self) -> Result<Assignment, AssignError> {
        Assignment::new(self.function_type, self.channel, self.number)
    }
}

impl Default for AssignmentDefaults {
    fn default() -> Self {
        Self {
            function_type: default_function_type(),
            channel: default_channel(),
            number: default_number(),
        }
    }
}

/// Mapping file options
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FileConfig {
    /// Spaces per nesting level in saved files
    #[serde(default = "default_indent")]
    pub indent: usize,
    #[serde(default)]
    pub load_policy: LoadPolicy,
}

impl FileConfig {
    pub fn serialize_options(&self) -> SerializeOptions {
        SerializeOptions {
            indent: self.indent,
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            indent: default_indent(),
            load_policy: LoadPolicy::default(),
        }
    }
}

/// Session startup options
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default = "default_initial_layer")]
    pub initial_layer: u8,
}

impl SessionConfig {
    pub fn initial_layer(&self) -> Result<Layer, AssignError> {
        Layer::new(self.initial_layer)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_layer: default_initial_layer(),
        }
    }
}

impl EditorConfig {
    /// Load settings from file with validation
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        Self::from_yaml(&contents)
            .with_context(|| format!("Invalid settings file: {}", path.display()))
    }

    /// Load settings, falling back to defaults when the file does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No settings file at {}; using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parse and validate settings from YAML text
    pub fn from_yaml(contents: &str) -> Result<Self> {
        // An empty file is a valid, all-defaults document
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: EditorConfig =
            serde_yaml::from_str(contents).context("Failed to parse YAML settings")?;
        config.validate()?;
        Ok(config)
    }

    /// Save settings to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self).context("Failed to serialize settings to YAML")?;

        fs::write(path, yaml)
            .with_context(|| format!("Failed to write settings file: {}", path.display()))?;

        Ok(())
    }

    /// Validate settings for correctness
    pub fn validate(&self) -> Result<()> {
        self.defaults
            .assignment()
            .context("Invalid default assignment")?;

        self.session
            .initial_layer()
            .context("Invalid initial layer")?;

        if self.file.indent > 8 {
            anyhow::bail!(
                "File indent {} is too large (must be 0-8)",
                self.file.indent
            );
        }

        Ok(())
    }
}

// Default value functions
fn default_function_type() -> FunctionType { FunctionType::ControlChange }
fn default_channel() -> u8 { 1 }
fn default_number() -> u8 { 1 }
fn default_indent() -> usize { 2 }
fn default_initial_layer() -> u8 { 1 }
