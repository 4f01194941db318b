//! Math types and small geometric helpers.
//!
//! Everything here is a thin layer over [`glam`]; the geometry crate works
//! in `Vec3` space even for 2D content (z = 0).

pub use glam::{Affine2, Affine3A, Mat3, Mat4, Quat, Vec2, Vec3, Vec3A, Vec4};

/// Matrix that maps normals under `transform`: the inverse transpose of its
/// linear part.
///
/// Singular transforms (a zero scale) fall back to the linear part itself.
pub fn normal_matrix(transform: &Affine3A) -> Mat3 {
    let linear = Mat3::from(transform.matrix3);
    if linear.determinant().abs() <= f32::EPSILON {
        return linear;
    }
    linear.inverse().transpose()
}

/// Flat face normal of the triangle `(p0, p1, p2)`.
///
/// Computed as `(p0 - p1) x (p2 - p1)`. Degenerate triangles yield zero.
pub fn face_normal(p0: Vec3, p1: Vec3, p2: Vec3) -> Vec3 {
    (p0 - p1).cross(p2 - p1).normalize_or_zero()
}

/// Newell's method: a robust normal for a (possibly non-convex) polygon.
///
/// The result is not normalized; its length is twice the projected area.
pub fn newell_normal(points: impl IntoIterator<Item = Vec3>) -> Vec3 {
    let points: Vec<Vec3> = points.into_iter().collect();
    let mut normal = Vec3::ZERO;
    for (i, current) in points.iter().enumerate() {
        let next = points[(i + 1) % points.len()];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    normal
}

/// Index (0 = x, 1 = y, 2 = z) of the largest absolute component.
pub fn dominant_axis(v: Vec3) -> usize {
    let a = v.abs();
    if a.x > a.y && a.x > a.z {
        0
    } else if a.y > a.z {
        1
    } else {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_normal_ccw_xy() {
        // (p0 - p1) x (p2 - p1) with p1 as the pivot.
        let n = face_normal(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        assert!((n - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_face_normal_degenerate() {
        let n = face_normal(Vec3::ONE, Vec3::ONE, Vec3::ONE);
        assert_eq!(n, Vec3::ZERO);
    }

    #[test]
    fn test_newell_normal_square() {
        let square = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let n = newell_normal(square);
        assert_eq!(dominant_axis(n), 2);
        assert!(n.z > 0.0);
    }

    #[test]
    fn test_normal_matrix_non_uniform_scale() {
        let t = Affine3A::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let m = normal_matrix(&t);
        let n = (m * Vec3::X).normalize();
        assert!((n - Vec3::X).length() < 1e-6);
        assert!((m.col(0).x - 0.5).abs() < 1e-6);
    }
}
