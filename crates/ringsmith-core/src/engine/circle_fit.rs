use super::config::{CircleFitConfig, ConfigError};
use super::error::EngineError;
use nalgebra::{Point2, Point3, Vector2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tiny_solver::Optimizer;
use tiny_solver::factors::na as ts_na;
use tracing::debug;

const MIN_POINTS: usize = 3;
const CENTER_KEY: &str = "c";

/// How the ring radius was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FitSource {
    Fitted {
        /// Root mean square of `R_i - mean(R)` at the solution.
        rms_residual: f64,
    },
    UserSupplied,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleFit {
    pub center: Point2<f64>,
    pub radius: f64,
    pub source: FitSource,
}

impl CircleFit {
    /// A circle of the given radius centered on the origin; no fitting involved.
    pub fn user_supplied(radius: f64) -> Self {
        Self {
            center: Point2::origin(),
            radius,
            source: FitSource::UserSupplied,
        }
    }

    pub fn is_fitted(&self) -> bool {
        matches!(self.source, FitSource::Fitted { .. })
    }
}

/// Projects points onto the xy-plane.
pub fn project_xy(points: &[Point3<f64>]) -> Vec<Point2<f64>> {
    points.iter().map(|p| Point2::new(p.x, p.y)).collect()
}

fn distances(points: &[Point2<f64>], center: &Point2<f64>) -> Vec<f64> {
    points.iter().map(|p| (p - center).norm()).collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Deviations of each point's distance to `center` from the mean distance.
pub fn radial_residuals(points: &[Point2<f64>], center: &Point2<f64>) -> Vec<f64> {
    let radii = distances(points, center);
    let mean_radius = mean(&radii);
    radii.into_iter().map(|r| r - mean_radius).collect()
}

fn cost(points: &[Point2<f64>], center: &Point2<f64>) -> f64 {
    radial_residuals(points, center)
        .iter()
        .map(|r| r * r)
        .sum()
}

/// `Jᵀr` of the radial residuals at `center`, with
/// `∂r_i/∂c = (c - p_i)/R_i - mean_j((c - p_j)/R_j)`.
fn cost_gradient(points: &[Point2<f64>], center: &Point2<f64>) -> Vector2<f64> {
    let radii = distances(points, center);
    let mean_radius = mean(&radii);
    let unit_offsets: Vec<Vector2<f64>> = points
        .iter()
        .zip(&radii)
        .map(|(p, &r)| {
            if r > 0.0 {
                (center - p) / r
            } else {
                Vector2::zeros()
            }
        })
        .collect();
    let mean_offset = unit_offsets.iter().sum::<Vector2<f64>>() / points.len() as f64;

    unit_offsets
        .iter()
        .zip(&radii)
        .map(|(offset, &r)| (offset - mean_offset) * (r - mean_radius))
        .sum()
}

/// All radial residuals of the point set as a single factor over the center.
#[derive(Debug, Clone)]
struct RadialSpreadFactor {
    points: Vec<(f64, f64)>,
}

impl<T: ts_na::RealField> tiny_solver::factors::Factor<T> for RadialSpreadFactor {
    fn residual_func(&self, params: &[ts_na::DVector<T>]) -> ts_na::DVector<T> {
        let c = &params[0];
        let radii: Vec<T> = self
            .points
            .iter()
            .map(|&(x, y)| {
                let dx = ts_na::convert::<f64, T>(x) - c[0].clone();
                let dy = ts_na::convert::<f64, T>(y) - c[1].clone();
                (dx.clone() * dx + dy.clone() * dy).sqrt()
            })
            .collect();
        let count = ts_na::convert::<f64, T>(radii.len() as f64);
        let mean_radius = radii
            .iter()
            .cloned()
            .fold(T::zero(), |acc, r| acc + r)
            / count;
        ts_na::DVector::<T>::from_iterator(
            radii.len(),
            radii.into_iter().map(|r| r - mean_radius.clone()),
        )
    }
}

/// Fits a circle to `points` by minimizing the variance of their distances to
/// the center with a Levenberg-Marquardt optimizer, starting from the mean of
/// the points.
///
/// # Errors
///
/// Returns [`ConfigError::TooFewPoints`] for fewer than three points and
/// [`EngineError::FitConvergence`] if the optimizer gives up, produces a
/// non-finite center, or stops at the iteration limit short of a stationary
/// point.
pub fn fit_circle(
    points: &[Point2<f64>],
    config: &CircleFitConfig,
) -> Result<CircleFit, EngineError> {
    if points.len() < MIN_POINTS {
        return Err(ConfigError::TooFewPoints {
            found: points.len(),
        }
        .into());
    }
    config.validate()?;

    let start = Point2::from(
        points.iter().map(|p| p.coords).sum::<Vector2<f64>>() / points.len() as f64,
    );
    if !cost(points, &start).is_finite() {
        return Err(EngineError::FitConvergence {
            iterations: 0,
            reason: "input coordinates are not finite",
        });
    }

    let mut problem = tiny_solver::Problem::new();
    problem.add_residual_block(
        points.len(),
        &[CENTER_KEY],
        Box::new(RadialSpreadFactor {
            points: points.iter().map(|p| (p.x, p.y)).collect(),
        }),
        None,
    );

    let mut initial_values = HashMap::<String, ts_na::DVector<f64>>::new();
    initial_values.insert(
        CENTER_KEY.to_string(),
        ts_na::DVector::<f64>::from_vec(vec![start.x, start.y]),
    );

    let optimizer = tiny_solver::LevenbergMarquardtOptimizer::default();
    let options = tiny_solver::OptimizerOptions {
        max_iteration: config.max_iterations,
        verbosity_level: 0,
        ..Default::default()
    };

    let not_converged = |reason| EngineError::FitConvergence {
        iterations: config.max_iterations,
        reason,
    };
    let solution = optimizer
        .optimize(&problem, &initial_values, Some(options))
        .ok_or_else(|| not_converged("optimizer found no solution"))?;
    let center = solution
        .get(CENTER_KEY)
        .filter(|c| c.len() == 2)
        .map(|c| Point2::new(c[0], c[1]))
        .ok_or_else(|| not_converged("optimizer returned no center"))?;
    if !center.coords.iter().all(|v| v.is_finite()) {
        return Err(not_converged("center became non-finite"));
    }

    let gradient = cost_gradient(points, &center) / points.len() as f64;
    if gradient.amax() > config.tolerance.sqrt() {
        return Err(not_converged("iteration limit reached"));
    }

    Ok(finish(points, center))
}

fn finish(points: &[Point2<f64>], center: Point2<f64>) -> CircleFit {
    let radius = mean(&distances(points, &center));
    let rms_residual = (cost(points, &center) / points.len() as f64).sqrt();
    debug!(
        radius,
        center_x = center.x,
        center_y = center.y,
        rms_residual,
        "Circle fit converged."
    );
    CircleFit {
        center,
        radius,
        source: FitSource::Fitted { rms_residual },
    }
}
