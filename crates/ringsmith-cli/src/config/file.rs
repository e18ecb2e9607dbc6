use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileRingConfig {
    pub subunits: Option<usize>,
    pub z_rotation: Option<f64>,
    pub xy_rotation: Option<f64>,
    pub tilt: Option<f64>,
    pub radius: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileFitConfig {
    pub max_iterations: Option<usize>,
    pub tolerance: Option<f64>,
    pub selection: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileAlignmentConfig {
    pub selection: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileOutputConfig {
    pub topdir: Option<PathBuf>,
    pub delete_intermediates: Option<bool>,
}

/// Contents of a `ringsmith` TOML configuration file. Every key is optional.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub ring: Option<FileRingConfig>,
    pub fit: Option<FileFitConfig>,
    pub alignment: Option<FileAlignmentConfig>,
    pub output: Option<FileOutputConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Loads `path` if given, or returns an empty configuration.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        path.map(Self::from_file)
            .transpose()
            .map(Option::unwrap_or_default)
    }
}
