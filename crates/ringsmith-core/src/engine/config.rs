use crate::core::selection::AtomSelection;
use crate::core::utils::identifiers::chain_label_capacity;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Default iteration cap for the circle fit.
pub const DEFAULT_MAX_ITERATIONS: usize = 200;
/// Default relative tolerance for the circle fit (square root of `f64` machine epsilon).
pub const DEFAULT_TOLERANCE: f64 = 1.49012e-8;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Subunit count {count} is out of range (must be between 1 and {max})")]
    SubunitCountOutOfRange { count: usize, max: usize },

    #[error("Radius must be finite and non-negative (got {0})")]
    InvalidRadius(f64),

    #[error("Angle '{name}' must be finite (got {value})")]
    InvalidAngle { name: &'static str, value: f64 },

    #[error("Fit tolerance must be finite and positive (got {0})")]
    InvalidTolerance(f64),

    #[error("Fit iteration limit must be at least 1")]
    InvalidIterationLimit,

    #[error("Circle fit needs at least 3 points (got {found})")]
    TooFewPoints { found: usize },

    #[error("Selection '{selection}' matched no atoms in the {context}")]
    EmptySelection {
        selection: String,
        context: &'static str,
    },
}

/// Geometric parameters of the ring to build.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RingSpec {
    pub subunit_count: usize,
    pub z_rotation_deg: f64,
    pub xy_rotation_deg: f64,
    pub tilt_deg: f64,
    /// Ring radius in Angstroms; when set, the circle fit is skipped.
    pub radius_override: Option<f64>,
}

impl RingSpec {
    pub fn new(subunit_count: usize) -> Self {
        Self {
            subunit_count,
            z_rotation_deg: 0.0,
            xy_rotation_deg: 0.0,
            tilt_deg: 0.0,
            radius_override: None,
        }
    }

    /// Checks the subunit count against the available chain labels and
    /// rejects non-finite angles or radii.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let max = chain_label_capacity();
        if self.subunit_count == 0 || self.subunit_count > max {
            return Err(ConfigError::SubunitCountOutOfRange {
                count: self.subunit_count,
                max,
            });
        }
        for (name, value) in [
            ("z_rotation", self.z_rotation_deg),
            ("xy_rotation", self.xy_rotation_deg),
            ("tilt", self.tilt_deg),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::InvalidAngle { name, value });
            }
        }
        if let Some(radius) = self.radius_override {
            if !radius.is_finite() || radius < 0.0 {
                return Err(ConfigError::InvalidRadius(radius));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleFitConfig {
    pub max_iterations: usize,
    /// A solution counts as converged when no component of the cost
    /// gradient, averaged over the points, exceeds `sqrt(tolerance)` Angstrom.
    pub tolerance: f64,
}

impl Default for CircleFitConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl CircleFitConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidIterationLimit);
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ConfigError::InvalidTolerance(self.tolerance));
        }
        Ok(())
    }
}

/// Where per-subunit intermediate structures are written and whether they
/// survive the run.
#[derive(Debug, Clone, PartialEq)]
pub struct IntermediatesConfig {
    pub directory: PathBuf,
    pub keep: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    pub ring: RingSpec,
    pub fit: CircleFitConfig,
    /// Atoms whose xy-projection the circle is fitted to.
    pub fit_selection: AtomSelection,
    /// Atoms used to superimpose each monomer copy onto the reference.
    pub alignment_selection: AtomSelection,
    pub intermediates: Option<IntermediatesConfig>,
}

#[derive(Default)]
pub struct BuildConfigBuilder {
    subunit_count: Option<usize>,
    z_rotation_deg: Option<f64>,
    xy_rotation_deg: Option<f64>,
    tilt_deg: Option<f64>,
    radius_override: Option<f64>,
    max_iterations: Option<usize>,
    tolerance: Option<f64>,
    fit_selection: Option<AtomSelection>,
    alignment_selection: Option<AtomSelection>,
    intermediates: Option<IntermediatesConfig>,
}

impl BuildConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subunit_count(mut self, count: usize) -> Self {
        self.subunit_count = Some(count);
        self
    }
    pub fn z_rotation(mut self, degrees: f64) -> Self {
        self.z_rotation_deg = Some(degrees);
        self
    }
    pub fn xy_rotation(mut self, degrees: f64) -> Self {
        self.xy_rotation_deg = Some(degrees);
        self
    }
    pub fn tilt(mut self, degrees: f64) -> Self {
        self.tilt_deg = Some(degrees);
        self
    }
    pub fn radius_override(mut self, radius: Option<f64>) -> Self {
        self.radius_override = radius;
        self
    }
    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = Some(iterations);
        self
    }
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
    pub fn fit_selection(mut self, selection: AtomSelection) -> Self {
        self.fit_selection = Some(selection);
        self
    }
    pub fn alignment_selection(mut self, selection: AtomSelection) -> Self {
        self.alignment_selection = Some(selection);
        self
    }
    pub fn intermediates(mut self, intermediates: Option<IntermediatesConfig>) -> Self {
        self.intermediates = intermediates;
        self
    }

    /// Assembles and validates the configuration.
    ///
    /// Only the subunit count is required; angles default to 0, the fit
    /// parameters to [`CircleFitConfig::default`], the fit selection to all
    /// atoms and the alignment selection to alpha carbons.
    pub fn build(self) -> Result<BuildConfig, ConfigError> {
        let ring = RingSpec {
            subunit_count: self
                .subunit_count
                .ok_or(ConfigError::MissingParameter("subunit_count"))?,
            z_rotation_deg: self.z_rotation_deg.unwrap_or(0.0),
            xy_rotation_deg: self.xy_rotation_deg.unwrap_or(0.0),
            tilt_deg: self.tilt_deg.unwrap_or(0.0),
            radius_override: self.radius_override,
        };
        ring.validate()?;

        let defaults = CircleFitConfig::default();
        let fit = CircleFitConfig {
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
            tolerance: self.tolerance.unwrap_or(defaults.tolerance),
        };
        fit.validate()?;

        Ok(BuildConfig {
            ring,
            fit,
            fit_selection: self.fit_selection.unwrap_or_default(),
            alignment_selection: self
                .alignment_selection
                .unwrap_or(AtomSelection::AlphaCarbons),
            intermediates: self.intermediates,
        })
    }
}
