//! # Spherical coordinate rotation
//!
//! Rotate geographic coordinates so that an arbitrary pole `(θ₀, φ₀)` maps to
//! the origin `(0, 0)`, with an extra twist `ψ` about the new polar axis, and
//! the exact algebraic inverse. Used to align a study region with the
//! coordinate axes before gridding, and to map results back.
//!
//! The forward chain is `R_x(ψ) · R_y(θ₀) · R_z(-φ₀)`; the reverse chain
//! applies the inverse factors in reverse order, so a round trip restores the
//! input to machine precision.

use nalgebra::{Rotation3, Vector3};

use crate::constants::{Degree, DEG2RAD, RAD2DEG};

/// Unit-sphere position of a geographic point (latitude `theta`, longitude `phi`).
pub fn rtp2xyz(r: f64, theta: Degree, phi: Degree) -> Vector3<f64> {
    let t = theta * DEG2RAD;
    let p = phi * DEG2RAD;
    Vector3::new(r * t.cos() * p.cos(), r * t.cos() * p.sin(), r * t.sin())
}

/// Cartesian position back to `(r, latitude, longitude)` in degrees.
pub fn xyz2rtp(v: &Vector3<f64>) -> (f64, Degree, Degree) {
    let r = v.norm();
    let theta = v.z.atan2((v.x * v.x + v.y * v.y).sqrt());
    let phi = v.y.atan2(v.x);
    (r, theta * RAD2DEG, phi * RAD2DEG)
}

/// Anti-clockwise rotation about the x-axis by `angle` degrees.
fn rot_x(angle: Degree) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::x_axis(), angle * DEG2RAD)
}

/// Anti-clockwise rotation about the y-axis by `angle` degrees.
fn rot_y(angle: Degree) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::y_axis(), angle * DEG2RAD)
}

/// Anti-clockwise rotation about the z-axis by `angle` degrees.
fn rot_z(angle: Degree) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), angle * DEG2RAD)
}

/// Rotate a point into the frame in which `(theta0, phi0)` is the origin.
///
/// Arguments
/// -----------------
/// * `t`, `p`: latitude and longitude of the point, degrees.
/// * `theta0`, `phi0`: latitude and longitude of the new origin, degrees.
/// * `psi`: additional anti-clockwise twist about the new polar axis, degrees.
///
/// Return
/// ----------
/// * `(t', p')` – the point's latitude and longitude in the rotated frame.
pub fn rtp_rotation(t: Degree, p: Degree, theta0: Degree, phi0: Degree, psi: Degree) -> (Degree, Degree) {
    let v = rtp2xyz(1.0, t, p);
    let v = rot_x(psi) * rot_y(theta0) * rot_z(-phi0) * v;
    let (_, new_t, new_p) = xyz2rtp(&v);
    (new_t, new_p)
}

/// Exact inverse of [`rtp_rotation`].
///
/// Applies the inverse elementary rotations in reverse order, so
/// `rtp_rotation_reverse(rtp_rotation(t, p, ..), ..)` restores `(t, p)` to
/// floating-point precision for any pole and twist, including `psi = 0`.
pub fn rtp_rotation_reverse(
    new_t: Degree,
    new_p: Degree,
    theta0: Degree,
    phi0: Degree,
    psi: Degree,
) -> (Degree, Degree) {
    let v = rtp2xyz(1.0, new_t, new_p);
    let v = rot_z(phi0) * rot_y(-theta0) * rot_x(-psi) * v;
    let (_, t, p) = xyz2rtp(&v);
    (t, p)
}
