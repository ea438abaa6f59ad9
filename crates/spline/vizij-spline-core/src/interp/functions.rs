//! Interpolation helpers:
//! - catmull_rom / catmull_rom_terms (uniform Catmull-Rom, tangent scale 0.5)
//! - quat_ln / quat_exp for unit quaternions, defined for the zero-angle case
//! - slerp without shortest-arc flipping, as required inside SQUAD
//! - squad_intermediate / squad
//!
//! Quaternion helpers return `SplineError::DegenerateInterpolation` instead of
//! propagating NaN.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::error::SplineError;

/// Below this imaginary length a rotation is treated as the identity in log/exp.
const ANGLE_EPS: f32 = 1e-6;
/// Above this |dot| slerp falls back to a normalized lerp.
const SLERP_LINEAR_DOT: f32 = 0.9995;

/// The four terms of the Catmull-Rom blend before the final `0.5 *` scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CatmullRomTerms {
    /// `2 * p1`
    pub constant: Vector3<f32>,
    /// `(-p0 + p2) * u`
    pub linear: Vector3<f32>,
    /// `(2p0 - 5p1 + 4p2 - p3) * u²`
    pub quadratic: Vector3<f32>,
    /// `(-p0 + 3p1 - 3p2 + p3) * u³`
    pub cubic: Vector3<f32>,
}

impl CatmullRomTerms {
    #[inline]
    pub fn sum(&self) -> Vector3<f32> {
        (self.constant + self.linear + self.quadratic + self.cubic) * 0.5
    }
}

/// Expand the Catmull-Rom blend for the segment `p1 -> p2` at local parameter `u`.
#[inline]
pub fn catmull_rom_terms(
    p0: Vector3<f32>,
    p1: Vector3<f32>,
    p2: Vector3<f32>,
    p3: Vector3<f32>,
    u: f32,
) -> CatmullRomTerms {
    let u2 = u * u;
    let u3 = u2 * u;
    CatmullRomTerms {
        constant: p1 * 2.0,
        linear: (-p0 + p2) * u,
        quadratic: (p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3) * u2,
        cubic: (-p0 + p1 * 3.0 - p2 * 3.0 + p3) * u3,
    }
}

/// Point on the uniform Catmull-Rom segment between `p1` (u = 0) and `p2` (u = 1).
///
/// `0.5 * (2p1 + (-p0+p2)u + (2p0-5p1+4p2-p3)u² + (-p0+3p1-3p2+p3)u³)`
#[inline]
pub fn catmull_rom(
    p0: Vector3<f32>,
    p1: Vector3<f32>,
    p2: Vector3<f32>,
    p3: Vector3<f32>,
    u: f32,
) -> Vector3<f32> {
    catmull_rom_terms(p0, p1, p2, p3, u).sum()
}

#[inline]
fn is_finite_quat(q: &Quaternion<f32>) -> bool {
    q.coords.iter().all(|c| c.is_finite())
}

/// Flip `q` onto the hemisphere of `reference` so the pair spans the shorter arc.
#[inline]
pub fn align_hemisphere(reference: &UnitQuaternion<f32>, q: &UnitQuaternion<f32>) -> UnitQuaternion<f32> {
    if reference.coords.dot(&q.coords) < 0.0 {
        UnitQuaternion::new_unchecked(-q.into_inner())
    } else {
        *q
    }
}

/// Logarithm of a unit quaternion: a pure quaternion `(0, axis * angle)`.
pub fn quat_ln(q: &Quaternion<f32>) -> Result<Quaternion<f32>, SplineError> {
    if !is_finite_quat(q) {
        return Err(SplineError::degenerate("quaternion log of non-finite input"));
    }
    let imag = q.imag();
    let sin_angle = imag.norm();
    if sin_angle < ANGLE_EPS {
        return Ok(Quaternion::from_imag(Vector3::zeros()));
    }
    let angle = sin_angle.atan2(q.scalar());
    let out = Quaternion::from_imag(imag * (angle / sin_angle));
    if !is_finite_quat(&out) {
        return Err(SplineError::degenerate("quaternion log produced a non-finite result"));
    }
    Ok(out)
}

/// Exponential of a pure quaternion, producing a unit quaternion.
pub fn quat_exp(q: &Quaternion<f32>) -> Result<Quaternion<f32>, SplineError> {
    if !is_finite_quat(q) {
        return Err(SplineError::degenerate("quaternion exp of non-finite input"));
    }
    let imag = q.imag();
    let angle = imag.norm();
    if angle < ANGLE_EPS {
        return Ok(Quaternion::from_parts(1.0, imag));
    }
    Ok(Quaternion::from_parts(angle.cos(), imag * (angle.sin() / angle)))
}

fn normalize_checked(q: Quaternion<f32>, what: &str) -> Result<UnitQuaternion<f32>, SplineError> {
    let norm = q.norm();
    if !norm.is_finite() || norm < ANGLE_EPS {
        return Err(SplineError::degenerate(format!(
            "{what} has zero or non-finite length"
        )));
    }
    Ok(UnitQuaternion::new_unchecked(q / norm))
}

/// Spherical linear interpolation that keeps the given hemisphere (no sign flip).
pub fn slerp(
    a: &UnitQuaternion<f32>,
    b: &UnitQuaternion<f32>,
    t: f32,
) -> Result<UnitQuaternion<f32>, SplineError> {
    let dot = a.coords.dot(&b.coords);
    if !dot.is_finite() {
        return Err(SplineError::degenerate("slerp of non-finite quaternions"));
    }
    if dot > SLERP_LINEAR_DOT {
        let lerped = a.into_inner() * (1.0 - t) + b.into_inner() * t;
        return normalize_checked(lerped, "slerp (linear fallback)");
    }
    if dot < -SLERP_LINEAR_DOT {
        return Err(SplineError::degenerate(
            "slerp between near-antipodal quaternions",
        ));
    }
    let theta = dot.clamp(-1.0, 1.0).acos();
    let sin_theta = theta.sin();
    let wa = ((1.0 - t) * theta).sin() / sin_theta;
    let wb = (t * theta).sin() / sin_theta;
    normalize_checked(a.into_inner() * wa + b.into_inner() * wb, "slerp")
}

/// Spherical-quadrangle control point for `q1` given its neighbours:
/// `q1 * exp(-(log(q1⁻¹q0) + log(q1⁻¹q2)) / 4)`.
pub fn squad_intermediate(
    q0: &UnitQuaternion<f32>,
    q1: &UnitQuaternion<f32>,
    q2: &UnitQuaternion<f32>,
) -> Result<UnitQuaternion<f32>, SplineError> {
    let q0 = align_hemisphere(q1, q0);
    let q2 = align_hemisphere(q1, q2);
    let inv = q1.inverse();

    let log_prev = quat_ln((inv * q0).quaternion())?;
    let log_next = quat_ln((inv * q2).quaternion())?;
    let exponent = (log_prev + log_next) * -0.25;
    let rel = quat_exp(&exponent)?;

    normalize_checked(q1.into_inner() * rel, "squad intermediate")
}

/// `slerp(slerp(q1, q2, u), slerp(a, b, u), 2u(1 - u))`
pub fn squad(
    u: f32,
    q1: &UnitQuaternion<f32>,
    q2: &UnitQuaternion<f32>,
    a: &UnitQuaternion<f32>,
    b: &UnitQuaternion<f32>,
) -> Result<UnitQuaternion<f32>, SplineError> {
    let outer = slerp(q1, q2, u)?;
    let inner = slerp(a, b, u)?;
    slerp(&outer, &inner, 2.0 * u * (1.0 - u))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn v(x: f32, y: f32, z: f32) -> Vector3<f32> {
        Vector3::new(x, y, z)
    }

    #[test]
    fn catmull_rom_hits_inner_knots() {
        let (p0, p1, p2, p3) = (v(0.0, 0.0, 0.0), v(1.0, 2.0, 0.0), v(3.0, 1.0, 0.0), v(4.0, 4.0, 1.0));
        assert_eq!(catmull_rom(p0, p1, p2, p3, 0.0), p1);
        assert_relative_eq!(catmull_rom(p0, p1, p2, p3, 1.0), p2, epsilon = 1e-5);
    }

    #[test]
    fn catmull_rom_on_collinear_evenly_spaced_points_is_linear() {
        let p = catmull_rom(v(0.0, 0.0, 0.0), v(1.0, 0.0, 0.0), v(2.0, 0.0, 0.0), v(3.0, 0.0, 0.0), 0.25);
        assert_relative_eq!(p, v(1.25, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn terms_sum_matches_blend() {
        let (p0, p1, p2, p3) = (v(-1.0, 0.0, 2.0), v(0.0, 1.0, 0.0), v(2.0, 1.0, -1.0), v(3.0, 0.0, 0.0));
        let terms = catmull_rom_terms(p0, p1, p2, p3, 0.4);
        assert_eq!(terms.constant, p1 * 2.0);
        assert_eq!(terms.sum(), catmull_rom(p0, p1, p2, p3, 0.4));
    }

    #[test]
    fn ln_exp_round_trip() {
        let q = UnitQuaternion::from_euler_angles(0.3, -0.2, 1.1);
        let back = quat_exp(&quat_ln(q.quaternion()).unwrap()).unwrap();
        assert_relative_eq!(back.coords, q.coords, epsilon = 1e-5);
    }

    #[test]
    fn ln_of_identity_is_zero() {
        let l = quat_ln(UnitQuaternion::<f32>::identity().quaternion()).unwrap();
        assert_eq!(l.coords.norm(), 0.0);
    }

    #[test]
    fn ln_rejects_nan() {
        let q = Quaternion::new(f32::NAN, 0.0, 0.0, 0.0);
        assert!(matches!(
            quat_ln(&q),
            Err(SplineError::DegenerateInterpolation { .. })
        ));
    }

    #[test]
    fn slerp_endpoints_and_midpoint() {
        let a = UnitQuaternion::identity();
        let b = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 1.0);
        assert_relative_eq!(slerp(&a, &b, 0.0).unwrap().coords, a.coords, epsilon = 1e-6);
        assert_relative_eq!(slerp(&a, &b, 1.0).unwrap().coords, b.coords, epsilon = 1e-6);
        let mid = slerp(&a, &b, 0.5).unwrap();
        assert_relative_eq!(mid.angle(), 0.5, epsilon = 1e-5);
    }

    #[test]
    fn slerp_rejects_antipodal_pair() {
        let a = UnitQuaternion::identity();
        let b = UnitQuaternion::new_unchecked(-a.into_inner());
        assert!(slerp(&a, &b, 0.5).is_err());
    }

    #[test]
    fn squad_intermediate_of_identical_rotations_is_that_rotation() {
        let q = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.7);
        let a = squad_intermediate(&q, &q, &q).unwrap();
        assert_relative_eq!(a.coords, q.coords, epsilon = 1e-6);
    }

    #[test]
    fn squad_is_exact_at_segment_ends() {
        let axis = Vector3::z_axis();
        let qs: Vec<_> = (0..4)
            .map(|i| UnitQuaternion::from_axis_angle(&axis, 0.4 * i as f32))
            .collect();
        let a = squad_intermediate(&qs[0], &qs[1], &qs[2]).unwrap();
        let b = squad_intermediate(&qs[1], &qs[2], &qs[3]).unwrap();
        let start = squad(0.0, &qs[1], &qs[2], &a, &b).unwrap();
        let end = squad(1.0, &qs[1], &qs[2], &a, &b).unwrap();
        assert!(start.angle_to(&qs[1]) < 1e-4);
        assert!(end.angle_to(&qs[2]) < 1e-4);
    }

    #[test]
    fn align_hemisphere_flips_negative_dot() {
        let a = UnitQuaternion::identity();
        let b = UnitQuaternion::new_unchecked(-a.into_inner());
        let aligned = align_hemisphere(&a, &b);
        assert!(aligned.coords.dot(&a.coords) > 0.0);
    }
}
