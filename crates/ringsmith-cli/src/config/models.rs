use ringsmith::core::selection::AtomSelection;
use ringsmith::engine::config::{BuildConfig, CircleFitConfig};
use std::path::PathBuf;

/// Everything the `build` command needs, after merging CLI, file and defaults.
pub struct AppConfig {
    pub input_path: PathBuf,
    pub monomer_path: Option<PathBuf>,
    pub topdir: PathBuf,
    /// Explicit output path; `None` means the generated name inside `topdir`.
    pub output_path: Option<PathBuf>,
    pub core_config: BuildConfig,
}

/// Everything the `fit` command needs.
pub struct FitAppConfig {
    pub input_path: PathBuf,
    pub selection: AtomSelection,
    pub fit: CircleFitConfig,
    pub report_path: Option<PathBuf>,
}
