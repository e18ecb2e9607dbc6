use nalgebra::{Matrix3, Point3, Rotation3, Unit, Vector3};

/// Squared norms below this are treated as zero-length directions.
const DEGENERATE_NORM_SQUARED: f64 = 1e-24;

pub fn rotation_from_axis_angle(axis: &Vector3<f64>, angle_degrees: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Unit::new_normalize(*axis), angle_degrees.to_radians())
}

/// Rotates `point` by `rotation` about an axis passing through `pivot`.
pub fn rotate_about(
    point: &Point3<f64>,
    pivot: &Point3<f64>,
    rotation: &Rotation3<f64>,
) -> Point3<f64> {
    pivot + rotation * (point - pivot)
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
    Some(Point3::from(sum / points.len() as f64))
}

/// Unit vector pointing from the z-axis toward `point`, within the xy-plane.
///
/// Returns `None` when the point lies on the z-axis.
pub fn radial_direction(point: &Point3<f64>) -> Option<Vector3<f64>> {
    let planar = Vector3::new(point.x, point.y, 0.0);
    if planar.norm_squared() < DEGENERATE_NORM_SQUARED {
        return None;
    }
    Some(planar.normalize())
}

/// In-plane perpendicular of `axis`, i.e. `axis` rotated by 90° about z.
///
/// Returns `None` when `axis` has no xy component.
pub fn tangential_direction(axis: &Vector3<f64>) -> Option<Vector3<f64>> {
    let perpendicular = Vector3::new(-axis.y, axis.x, 0.0);
    if perpendicular.norm_squared() < DEGENERATE_NORM_SQUARED {
        return None;
    }
    Some(perpendicular.normalize())
}

/// Computes the rigid transformation that best superimposes `from_points` onto
/// `to_points` in the least-squares sense (Kabsch algorithm).
///
/// Points are paired by index.
///
/// # Return
///
/// Returns `(rotation, translation)` such that `rotation * p + translation` maps
/// each `from` point onto its partner, or `None` if the slices are empty,
/// differ in length, or the decomposition fails.
pub fn calculate_superposition(
    from_points: &[Point3<f64>],
    to_points: &[Point3<f64>],
) -> Option<(Rotation3<f64>, Vector3<f64>)> {
    if from_points.len() != to_points.len() {
        return None;
    }
    let from_centroid = centroid(from_points)?;
    let to_centroid = centroid(to_points)?;

    let h = from_points
        .iter()
        .zip(to_points.iter())
        .fold(Matrix3::<f64>::zeros(), |acc, (f, t)| {
            acc + (t - to_centroid) * (f - from_centroid).transpose()
        });

    let svd = h.svd(true, true);
    let u = svd.u?;
    let v_t = svd.v_t?;

    let d = (u * v_t).determinant();
    let mut correction = Matrix3::identity();
    if d < 0.0 {
        correction[(2, 2)] = -1.0;
    }

    let rotation = Rotation3::from_matrix_unchecked(u * correction * v_t);
    let translation = to_centroid.coords - rotation * from_centroid.coords;

    Some((rotation, translation))
}

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}
