//! Euler-parameter rotation math.
//!
//! Utilities shared by the rigid-body node, the rigid body and the
//! rotation-coordinate marker. The Euler parameters `ep = (p0, p1, p2, p3)`
//! are a unit quaternion with scalar part first; the G matrices map
//! Euler-parameter velocities to angular velocity:
//!
//! - global frame: `omega = G(ep) * ep_t`
//! - body-fixed frame: `omega_local = G_local(ep) * ep_t`
//!
//! Both are `2x` the standard quaternion rate matrices E / E_local.

use nalgebra::{Matrix3, Matrix3x4, Vector3, Vector4};

/// Rotation matrix from Euler parameters.
///
/// Valid for unit-norm parameters; callers maintain the unit constraint
/// through the algebraic normalization equation.
#[must_use]
pub fn rotation_matrix(ep: &Vector4<f64>) -> Matrix3<f64> {
    let (p0, p1, p2, p3) = (ep[0], ep[1], ep[2], ep[3]);
    Matrix3::new(
        p0 * p0 + p1 * p1 - p2 * p2 - p3 * p3,
        2.0 * (p1 * p2 - p0 * p3),
        2.0 * (p1 * p3 + p0 * p2),
        2.0 * (p1 * p2 + p0 * p3),
        p0 * p0 - p1 * p1 + p2 * p2 - p3 * p3,
        2.0 * (p2 * p3 - p0 * p1),
        2.0 * (p1 * p3 - p0 * p2),
        2.0 * (p2 * p3 + p0 * p1),
        p0 * p0 - p1 * p1 - p2 * p2 + p3 * p3,
    )
}

/// G matrix: `omega = G(ep) * ep_t` (global frame).
#[must_use]
pub fn g_matrix(ep: &Vector4<f64>) -> Matrix3x4<f64> {
    let (p0, p1, p2, p3) = (ep[0], ep[1], ep[2], ep[3]);
    2.0 * Matrix3x4::new(
        -p1, p0, -p3, p2, //
        -p2, p3, p0, -p1, //
        -p3, -p2, p1, p0,
    )
}

/// Local G matrix: `omega_local = G_local(ep) * ep_t` (body-fixed frame).
#[must_use]
pub fn g_matrix_local(ep: &Vector4<f64>) -> Matrix3x4<f64> {
    let (p0, p1, p2, p3) = (ep[0], ep[1], ep[2], ep[3]);
    2.0 * Matrix3x4::new(
        -p1, p0, p3, -p2, //
        -p2, -p3, p0, p1, //
        -p3, p2, -p1, p0,
    )
}

/// Skew-symmetric cross-product matrix: `skew(a) * b == a x b`.
#[must_use]
pub fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(
        0.0, -v[2], v[1], //
        v[2], 0.0, -v[0], //
        -v[1], v[0], 0.0,
    )
}

/// Tait-Bryan XYZ angles `(alpha, beta, gamma)` from a rotation matrix,
/// with `R = Rx(alpha) * Ry(beta) * Rz(gamma)`.
///
/// `beta` is returned in `[-pi/2, pi/2]`; at the gimbal-lock boundary
/// (`|R[(0,2)]| == 1`) the split between `alpha` and `gamma` is not unique
/// and `alpha` absorbs the free angle.
#[must_use]
pub fn rotation_matrix_to_xyz_angles(r: &Matrix3<f64>) -> Vector3<f64> {
    let beta = r[(0, 2)].clamp(-1.0, 1.0).asin();
    let alpha = (-r[(1, 2)]).atan2(r[(2, 2)]);
    let gamma = (-r[(0, 1)]).atan2(r[(0, 0)]);
    Vector3::new(alpha, beta, gamma)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const IDENTITY_EP: Vector4<f64> = Vector4::new(1.0, 0.0, 0.0, 0.0);

    fn ep_about_z(angle: f64) -> Vector4<f64> {
        Vector4::new((angle / 2.0).cos(), 0.0, 0.0, (angle / 2.0).sin())
    }

    #[test]
    fn test_identity_rotation() {
        assert_relative_eq!(
            rotation_matrix(&IDENTITY_EP),
            Matrix3::identity(),
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_rotation_about_z() {
        let angle = 0.7;
        let r = rotation_matrix(&ep_about_z(angle));
        let v = r * Vector3::x();
        assert_relative_eq!(v[0], angle.cos(), epsilon = 1e-12);
        assert_relative_eq!(v[1], angle.sin(), epsilon = 1e-12);
        assert_relative_eq!(v[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_g_matrix_angular_velocity() {
        // At identity orientation, ep_t = (0, 0, 0, w/2) spins about z with
        // angular velocity w.
        let w = 3.0;
        let ep_t = Vector4::new(0.0, 0.0, 0.0, w / 2.0);
        let omega = g_matrix(&IDENTITY_EP) * ep_t;
        assert_relative_eq!(omega, Vector3::new(0.0, 0.0, w), epsilon = 1e-12);

        // At identity, global and local frames coincide.
        let omega_local = g_matrix_local(&IDENTITY_EP) * ep_t;
        assert_relative_eq!(omega, omega_local, epsilon = 1e-12);
    }

    #[test]
    fn test_local_vs_global_g() {
        // omega_local = R^T * omega for any orientation.
        let ep = Vector4::new(0.8, 0.2, -0.4, 0.4).normalize();
        let ep_t = Vector4::new(0.1, -0.3, 0.2, 0.05);
        let r = rotation_matrix(&ep);
        let omega = g_matrix(&ep) * ep_t;
        let omega_local = g_matrix_local(&ep) * ep_t;
        assert_relative_eq!(r.transpose() * omega, omega_local, epsilon = 1e-12);
    }

    #[test]
    fn test_skew_is_cross_product() {
        let a = Vector3::new(1.0, -2.0, 0.5);
        let b = Vector3::new(0.3, 0.7, -1.1);
        assert_relative_eq!(skew(&a) * b, a.cross(&b), epsilon = 1e-14);
    }

    #[test]
    fn test_xyz_angles_roundtrip() {
        let (alpha, beta, gamma): (f64, f64, f64) = (0.3, -0.4, 1.1);
        let rx = rotation_matrix(&Vector4::new(
            (alpha / 2.0).cos(),
            (alpha / 2.0).sin(),
            0.0,
            0.0,
        ));
        let ry = rotation_matrix(&Vector4::new(
            (beta / 2.0).cos(),
            0.0,
            (beta / 2.0).sin(),
            0.0,
        ));
        let rz = rotation_matrix(&ep_about_z(gamma));
        let angles = rotation_matrix_to_xyz_angles(&(rx * ry * rz));
        assert_relative_eq!(angles, Vector3::new(alpha, beta, gamma), epsilon = 1e-12);
    }
}
