//! Scan configuration.
//!
//! Tunables can be loaded from a RON, TOML or JSON file; the format is
//! detected from the file extension. Every field has a default, so a config
//! file only needs to name the values it overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading a scan configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {source_name}: {detail}")]
    Parse { source_name: String, detail: String },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, ConfigError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(ConfigError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// Config types
// ===========================================================================

/// Surface-area weights for fuel assemblies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceWeights {
    /// Area contributed by an isolated fuel assembly.
    pub per_element: u32,
    /// Area removed for each face shared with another fuel assembly.
    pub per_shared_face: u32,
}

impl Default for SurfaceWeights {
    fn default() -> Self {
        Self {
            per_element: 6,
            per_shared_face: 2,
        }
    }
}

/// Tunables for a structure scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Check the liveness flag every this many interior positions. Zero is
    /// treated as one.
    pub liveness_check_interval: u32,
    /// Refuse interiors larger than this. `None` means unlimited.
    pub max_interior_nodes: Option<usize>,
    pub surface: SurfaceWeights,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            liveness_check_interval: 1,
            max_interior_nodes: None,
            surface: SurfaceWeights::default(),
        }
    }
}

impl ScanConfig {
    /// Liveness interval with zero normalised to one.
    pub fn liveness_interval(&self) -> usize {
        self.liveness_check_interval.max(1) as usize
    }

    /// Parse a config from text in the given format.
    pub fn from_str_with_format(text: &str, format: Format) -> Result<Self, ConfigError> {
        let parse_error = |detail: String| ConfigError::Parse {
            source_name: format!("{format:?} text"),
            detail,
        };
        match format {
            Format::Ron => ron::from_str(text).map_err(|e| parse_error(e.to_string())),
            Format::Toml => toml::from_str(text).map_err(|e| parse_error(e.to_string())),
            Format::Json => serde_json::from_str(text).map_err(|e| parse_error(e.to_string())),
        }
    }

    /// Read a config file, detecting the format from its extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format = detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::from_str_with_format(&content, format).map_err(|e| match e {
            ConfigError::Parse { detail, .. } => ConfigError::Parse {
                source_name: path.display().to_string(),
                detail,
            },
            other => other,
        })
    }
}
