use ringsmith::core::selection::AtomSelection;
use ringsmith::engine::config::{DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE};
use std::path::PathBuf;

pub const INTERMEDIATES_DIR_NAME: &str = "intermediate_structures";

pub struct DefaultsConfig {
    pub topdir: PathBuf,
    pub z_rotation: f64,
    pub xy_rotation: f64,
    pub tilt: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub fit_selection: AtomSelection,
    pub alignment_selection: AtomSelection,
    pub delete_intermediates: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            topdir: PathBuf::from("."),
            z_rotation: 0.0,
            xy_rotation: 0.0,
            tilt: 0.0,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            fit_selection: AtomSelection::All,
            alignment_selection: AtomSelection::AlphaCarbons,
            delete_intermediates: true,
        }
    }
}
