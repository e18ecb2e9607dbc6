use super::circle_fit::CircleFit;
use super::config::{ConfigError, RingSpec};
use super::error::EngineError;
use crate::core::utils::geometry::{radial_direction, tangential_direction};
use crate::core::utils::identifiers::chain_label;
use nalgebra::{Point3, Vector3};

/// Where and how a single subunit is placed on the ring.
///
/// The axes are the values implied by `target_position`; the assembler
/// recomputes them from the subunit's actual centroid after translation.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub index: usize,
    pub chain_id: char,
    pub z_angle_deg: f64,
    pub radial_axis: Vector3<f64>,
    pub tangential_axis: Vector3<f64>,
    pub target_position: Point3<f64>,
}

/// The radius the ring is built with: the override if given, the fitted one otherwise.
pub fn resolve_radius(ring: &RingSpec, circle: &CircleFit) -> f64 {
    ring.radius_override.unwrap_or(circle.radius)
}

/// Computes one placement per subunit, in index order.
///
/// # Errors
///
/// Returns a configuration error if `ring` is invalid (checked before any
/// geometry), and [`EngineError::GeometryDegeneracy`] if a target position
/// coincides with the ring center.
pub fn plan(ring: &RingSpec, circle: &CircleFit) -> Result<Vec<Placement>, EngineError> {
    ring.validate()?;
    let radius = resolve_radius(ring, circle);
    if !radius.is_finite() || radius < 0.0 {
        return Err(ConfigError::InvalidRadius(radius).into());
    }

    let spacing = 360.0 / ring.subunit_count as f64;

    (0..ring.subunit_count)
        .map(|index| {
            let z_angle_deg = spacing * index as f64 + ring.z_rotation_deg;
            let theta = z_angle_deg.to_radians();
            let target_position = Point3::new(radius * theta.cos(), radius * theta.sin(), 0.0);

            let radial_axis = radial_direction(&target_position)
                .ok_or(EngineError::GeometryDegeneracy {
                    index,
                    axis: "radial",
                })?;
            let tangential_axis = tangential_direction(&radial_axis).ok_or(
                EngineError::GeometryDegeneracy {
                    index,
                    axis: "tangential",
                },
            )?;
            let chain_id = chain_label(index).ok_or_else(|| {
                EngineError::Internal(format!("no chain label for subunit {}", index))
            })?;

            Ok(Placement {
                index,
                chain_id,
                z_angle_deg,
                radial_axis,
                tangential_axis,
                target_position,
            })
        })
        .collect()
}
