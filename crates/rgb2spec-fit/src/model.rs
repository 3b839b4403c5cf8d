//! The sigmoid-polynomial spectral model and its tristimulus integration.
//!
//! Reflectance at normalized wavelength t is `sigmoid(a·t² + b·t + c)`,
//! bounded in (0, 1) by construction, so every decoded coefficient triple
//! is a physically valid reflectance spectrum.

use rgb2spec_math::{Mat3, Vec3};

use crate::basis::SpectralBasis;

/// Logistic sigmoid. Saturates cleanly for infinite inputs, which the
/// uniform-RGB closed form produces at the cube corners.
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Learned positive scales decoding raw predictor outputs into model
/// coefficients.
///
/// The quadratic term is bounded through tanh so gradient search operates
/// in unconstrained space while the decoded value stays in a range that
/// keeps the sigmoid well-conditioned across the visible axis; the linear
/// and constant terms scale linearly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoeffScales {
    /// Scale of the quadratic coefficient (tanh-bounded).
    pub a: f32,
    /// Scale of the linear coefficient.
    pub b: f32,
    /// Scale of the constant coefficient.
    pub c: f32,
}

impl CoeffScales {
    /// Starting point of the learned scales.
    pub const INIT: Self = Self {
        a: 160.0,
        b: 35.0,
        c: 15.0,
    };

    /// Decodes raw parameters into model coefficients.
    #[inline]
    pub fn decode(&self, raw: [f32; 3]) -> [f32; 3] {
        [self.a * raw[0].tanh(), self.b * raw[1], self.c * raw[2]]
    }

    /// Derivative of each decoded coefficient w.r.t. its raw parameter.
    #[inline]
    pub fn decode_grad(&self, raw: [f32; 3]) -> [f32; 3] {
        let th = raw[0].tanh();
        [self.a * (1.0 - th * th), self.b, self.c]
    }

    /// Derivative of each decoded coefficient w.r.t. its scale.
    #[inline]
    pub fn scale_grad(&self, raw: [f32; 3]) -> [f32; 3] {
        [raw[0].tanh(), raw[1], raw[2]]
    }

    /// Squared magnitude of the scales, the quantity the Stage A
    /// regularizer penalizes.
    #[inline]
    pub fn squared_norm(&self) -> f32 {
        self.a * self.a + self.b * self.b + self.c * self.c
    }

    /// True if all scales are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.a.is_finite() && self.b.is_finite() && self.c.is_finite()
    }
}

/// Evaluates the modeled reflectance at one normalized wavelength.
#[inline]
pub fn reflectance(coeff: [f32; 3], t: f32, t_sq: f32) -> f32 {
    sigmoid(coeff[0] * t_sq + coeff[1] * t + coeff[2])
}

/// Integrates the modeled spectrum against the basis, yielding XYZ.
pub fn eval_xyz(basis: &SpectralBasis, coeff: [f32; 3]) -> Vec3 {
    let mut xyz = Vec3::ZERO;
    for i in 0..basis.weights.len() {
        let s = reflectance(coeff, basis.wavelength_norm[i], basis.wavelength_norm_sq[i]);
        xyz += Vec3::from_array(basis.weights[i]) * s;
    }
    xyz
}

/// Integrates the spectrum and accumulates the Jacobian d(XYZ)/d(a,b,c).
///
/// The Jacobian row i is the XYZ channel, column j the coefficient:
/// `J[i][j] = Σ w_i(λ) · s'(u) · (t², t, 1)_j`, with s' = s(1−s).
/// Back-propagation applies it as `dL/dcoeff = Jᵀ · dL/dxyz`.
pub fn eval_xyz_with_jacobian(basis: &SpectralBasis, coeff: [f32; 3]) -> (Vec3, Mat3) {
    let mut xyz = Vec3::ZERO;
    let mut jac = [[0.0f32; 3]; 3];
    for i in 0..basis.weights.len() {
        let t = basis.wavelength_norm[i];
        let t_sq = basis.wavelength_norm_sq[i];
        let s = reflectance(coeff, t, t_sq);
        let ds = s * (1.0 - s);
        let w = basis.weights[i];
        xyz += Vec3::from_array(w) * s;
        for ch in 0..3 {
            let g = w[ch] * ds;
            jac[ch][0] += g * t_sq;
            jac[ch][1] += g * t;
            jac[ch][2] += g;
        }
    }
    (xyz, Mat3::from_rows(jac))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid_bounds() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-7);
        assert_eq!(sigmoid(f32::NEG_INFINITY), 0.0);
        assert_eq!(sigmoid(f32::INFINITY), 1.0);
        assert!(sigmoid(100.0) <= 1.0);
        assert!(sigmoid(-100.0) >= 0.0);
    }

    #[test]
    fn test_decode_bounds_quadratic_term() {
        let scales = CoeffScales::INIT;
        let c = scales.decode([1e6, 0.0, 0.0]);
        assert!((c[0] - scales.a).abs() < 1e-3);
        let c = scales.decode([-1e6, 0.0, 0.0]);
        assert!((c[0] + scales.a).abs() < 1e-3);
    }

    #[test]
    fn test_decode_linear_terms() {
        let scales = CoeffScales::INIT;
        let c = scales.decode([0.0, 0.5, -0.2]);
        assert_eq!(c[0], 0.0);
        assert!((c[1] - 17.5).abs() < 1e-5);
        assert!((c[2] + 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_unit_reflectance_xyz_is_whitepoint_shaped() {
        // A hard-saturated sigmoid is the perfect reflector, whose Y is 1
        // under the unit-luminance illuminant.
        let basis = SpectralBasis::new();
        let xyz = eval_xyz(&basis, [0.0, 0.0, 1e4]);
        assert!((xyz.y - 1.0).abs() < 1e-4, "Y = {}", xyz.y);
    }

    #[test]
    fn test_unit_reflectance_maps_to_gamut_white() {
        // Under a D65 gamut the perfect reflector's XYZ is the reference
        // white, so the gamut's own RGB comes back as (1, 1, 1) up to the
        // resampled-data tolerance.
        use rgb2spec_primaries::{ColorSpace, Gamut};

        let basis = SpectralBasis::new();
        let cs = ColorSpace::from_gamut(Gamut::Srgb);
        let rgb = cs.xyz_to_rgb * eval_xyz(&basis, [0.0, 0.0, 1e4]);
        assert!((rgb.x - 1.0).abs() < 0.02, "rgb = {rgb:?}");
        assert!((rgb.y - 1.0).abs() < 0.02, "rgb = {rgb:?}");
        assert!((rgb.z - 1.0).abs() < 0.02, "rgb = {rgb:?}");
    }

    #[test]
    fn test_jacobian_matches_finite_difference() {
        let basis = SpectralBasis::new();
        let coeff = [12.0, -7.0, 1.5];
        let (_, jac) = eval_xyz_with_jacobian(&basis, coeff);

        // f32 integration noise bounds how tight a central difference can
        // get; eps and tolerance are sized for that
        let eps = 1e-2;
        for j in 0..3 {
            let mut lo = coeff;
            let mut hi = coeff;
            lo[j] -= eps;
            hi[j] += eps;
            let d = (eval_xyz(&basis, hi) - eval_xyz(&basis, lo)) / (2.0 * eps);
            for ch in 0..3 {
                let analytic = jac.m[ch][j];
                assert!(
                    (analytic - d[ch]).abs() < 1e-2 * d[ch].abs().max(1e-1),
                    "d xyz[{ch}] / d c[{j}]: analytic {analytic}, fd {}",
                    d[ch]
                );
            }
        }
    }
}
