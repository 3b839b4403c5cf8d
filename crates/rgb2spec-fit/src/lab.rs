//! CIE 1976 L*a*b* transform and the ΔE*ab perceptual difference,
//! with the analytic adjoint used by Stage B refinement.

use rgb2spec_math::Vec3;
use rgb2spec_primaries::ColorSpace;

const DELTA: f32 = 6.0 / 29.0;
const DELTA_SQ: f32 = DELTA * DELTA;
const DELTA_CB: f32 = DELTA * DELTA * DELTA;

/// CIE 1976 transfer function: cube root above (6/29)³, linear below.
#[inline]
fn f(t: f32) -> f32 {
    if t > DELTA_CB {
        t.cbrt()
    } else {
        t / (3.0 * DELTA_SQ) + 4.0 / 29.0
    }
}

/// Derivative of the transfer function.
#[inline]
fn f_prime(t: f32) -> f32 {
    if t > DELTA_CB {
        let r = t.cbrt();
        1.0 / (3.0 * r * r)
    } else {
        1.0 / (3.0 * DELTA_SQ)
    }
}

/// Converts XYZ to Lab relative to a white point with unit luminance.
pub fn xyz_to_lab(xyz: Vec3, white_xyz: Vec3) -> Vec3 {
    let scaled = xyz / white_xyz;
    let fx = f(scaled.x);
    let fy = f(scaled.y);
    let fz = f(scaled.z);
    Vec3::new(
        116.0 * fy - 16.0,
        500.0 * (fx - fy),
        200.0 * (fy - fz),
    )
}

/// ΔE*ab between a predicted and a reference linear RGB value.
///
/// Both sides go RGB→XYZ through the gamut matrix, then to Lab against the
/// gamut's white point; the distance is the Euclidean Lab norm. Identical
/// inputs give exactly zero.
pub fn delta_e(rgb_pred: Vec3, rgb_ref: Vec3, cs: &ColorSpace) -> f32 {
    let lab_p = xyz_to_lab(cs.rgb_to_xyz * rgb_pred, cs.white_xyz);
    let lab_r = xyz_to_lab(cs.rgb_to_xyz * rgb_ref, cs.white_xyz);
    (lab_p - lab_r).length()
}

/// ΔE*ab plus its gradient with respect to the predicted RGB.
///
/// Adjoint of the ΔE pipeline: with d = lab_p − lab_r and e = ‖d‖,
/// de/dlab = d/e, pulled back through the Lab Jacobian and the RGB→XYZ
/// matrix transpose. At e = 0 the gradient is zero.
pub fn delta_e_with_grad(rgb_pred: Vec3, rgb_ref: Vec3, cs: &ColorSpace) -> (f32, Vec3) {
    let xyz_p = cs.rgb_to_xyz * rgb_pred;
    let lab_p = xyz_to_lab(xyz_p, cs.white_xyz);
    let lab_r = xyz_to_lab(cs.rgb_to_xyz * rgb_ref, cs.white_xyz);

    let d = lab_p - lab_r;
    let e = d.length();
    if e == 0.0 {
        return (0.0, Vec3::ZERO);
    }

    // de/d(fx, fy, fz) through L = 116 fy − 16, a = 500 (fx − fy),
    // b = 200 (fy − fz)
    let de_dfx = 500.0 * d.y / e;
    let de_dfy = (116.0 * d.x - 500.0 * d.y + 200.0 * d.z) / e;
    let de_dfz = -200.0 * d.z / e;

    let scaled = xyz_p / cs.white_xyz;
    let de_dxyz = Vec3::new(
        de_dfx * f_prime(scaled.x) / cs.white_xyz.x,
        de_dfy * f_prime(scaled.y) / cs.white_xyz.y,
        de_dfz * f_prime(scaled.z) / cs.white_xyz.z,
    );

    (e, cs.rgb_to_xyz.transform_transpose(de_dxyz))
}
