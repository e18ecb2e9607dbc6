use crate::core::models::system::MolecularSystem;
use crate::core::selection::AtomSelection;
use crate::engine::circle_fit::{CircleFit, fit_circle, project_xy};
use crate::engine::config::{CircleFitConfig, ConfigError};
use crate::engine::error::EngineError;
use serde::Serialize;
use tracing::{info, instrument};

/// Outcome of fitting a circle to a structure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct FitReport {
    pub selection: String,
    pub point_count: usize,
    pub circle: CircleFit,
}

/// Fits a circle to the xy-projection of the atoms of `structure` matched by
/// `selection`.
///
/// # Errors
///
/// Returns a configuration error if the selection matches fewer than three
/// atoms, or [`EngineError::FitConvergence`] if the fit does not converge.
#[instrument(skip_all, name = "circle_fit_workflow", fields(selection = %selection))]
pub fn run(
    structure: &MolecularSystem,
    selection: &AtomSelection,
    config: &CircleFitConfig,
) -> Result<FitReport, EngineError> {
    let positions = structure.selected_positions(selection);
    if positions.is_empty() {
        return Err(ConfigError::EmptySelection {
            selection: selection.to_string(),
            context: "input structure",
        }
        .into());
    }

    info!(
        points = positions.len(),
        "Fitting the radius of the ring from the input structure."
    );
    let circle = fit_circle(&project_xy(&positions), config)?;
    info!(
        radius = circle.radius,
        "The circular assembly has a radius of about {:.0} Angstrom.",
        circle.radius
    );

    Ok(FitReport {
        selection: selection.to_string(),
        point_count: positions.len(),
        circle,
    })
}
