use glam::Vec3;

/// Denominator used when normalizing a vector of exactly zero length.
pub const ZERO_LENGTH_FALLBACK: f32 = 0.001;

/// Scales `v` to unit length.
///
/// A zero-length vector is divided by [`ZERO_LENGTH_FALLBACK`] instead of its
/// length, so the result is always finite (the zero vector maps to itself).
pub fn normalize(v: Vec3) -> Vec3 {
    let mut len = v.length();
    if len == 0.0 {
        len = ZERO_LENGTH_FALLBACK;
    }
    v / len
}

/// Cross product of `u` and `v`, normalized with [`normalize`].
pub fn normalized_cross(u: Vec3, v: Vec3) -> Vec3 {
    normalize(u.cross(v))
}

/// Flat normal of triangle `(a, b, c)` built from the edges `a - b` and `b - c`.
///
/// The sign follows the winding of the arguments.
pub fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    normalized_cross(a - b, b - c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_scales_to_unit_length() {
        let n = normalize(Vec3::new(3.0, 0.0, 4.0));
        assert!((n.length() - 1.0).abs() < 1e-6);
        assert!((n.x - 0.6).abs() < 1e-6);
        assert!((n.z - 0.8).abs() < 1e-6);
    }

    #[test]
    fn normalize_zero_vector_is_finite() {
        let n = normalize(Vec3::ZERO);
        assert!(n.is_finite());
        assert_eq!(n, Vec3::ZERO);
    }

    #[test]
    fn normalized_cross_of_axes() {
        let n = normalized_cross(Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 3.0, 0.0));
        assert!((n - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn parallel_cross_does_not_produce_nan() {
        let n = normalized_cross(Vec3::X, Vec3::X * 2.0);
        assert!(n.is_finite());
    }

    #[test]
    fn face_normal_follows_winding() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(1.0, 0.0, 0.0);
        let c = Vec3::new(0.0, 1.0, 0.0);
        let n = face_normal(a, b, c);
        assert!((n - Vec3::Z).length() < 1e-6);

        let flipped = face_normal(a, c, b);
        assert!((flipped + Vec3::Z).length() < 1e-6);
    }
}
