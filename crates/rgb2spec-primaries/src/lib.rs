//! # rgb2spec-primaries
//!
//! Color primaries, white points, and RGB-XYZ matrix generation for the six
//! gamuts the spectral table fitter supports.
//!
//! Each gamut is defined by the CIE xy chromaticities of its primaries and
//! white point. The 3x3 conversion matrices are derived from those, in f64,
//! with the standard white-point scaling construction, then narrowed to the
//! f32 [`Mat3`] the fitting engine works in.
//!
//! # Supported gamuts
//!
//! | Gamut | White point | Table file |
//! |-------|-------------|------------|
//! | sRGB | D65 | srgb_table.bin |
//! | P3-D65 | D65 | dcip3d65_table.bin |
//! | Adobe RGB (1998) | D65 | adobergb_table.bin |
//! | BT.2020 | D65 | rec2020_table.bin |
//! | ACEScg | D60 | acescg_table.bin |
//! | ACES2065-1 | D60 | aces2065_1_table.bin |
//!
//! # Usage
//!
//! ```rust
//! use rgb2spec_primaries::{ColorSpace, Gamut};
//!
//! let cs = ColorSpace::from_gamut(Gamut::Srgb);
//! let xyz = cs.rgb_to_xyz * rgb2spec_math::Vec3::ONE;
//! assert!((xyz.y - 1.0).abs() < 1e-4);
//! ```
//!
//! # Dependencies
//!
//! - [`rgb2spec-math`] - Mat3/Vec3
//! - [`glam`] - f64 derivation path
//! - [`thiserror`] - unknown-gamut configuration error
//!
//! # Used By
//!
//! - `rgb2spec-fit` - target construction and color transforms
//! - `rgb2spec-cli` - gamut selection

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

use std::fmt;
use std::str::FromStr;

use rgb2spec_math::{Mat3, Vec3};
use thiserror::Error;

/// Errors raised by gamut configuration.
#[derive(Debug, Error)]
pub enum PrimariesError {
    /// A gamut name that is not in the registry. Configuration error,
    /// fatal at startup.
    #[error("unknown gamut name: {0:?}")]
    UnknownGamut(String),
}

/// RGB color space primaries definition.
///
/// Defines a gamut by its three primary colors and white point, all given
/// as CIE xy chromaticity coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Primaries {
    /// Red primary (x, y) chromaticity
    pub r: (f64, f64),
    /// Green primary (x, y) chromaticity
    pub g: (f64, f64),
    /// Blue primary (x, y) chromaticity
    pub b: (f64, f64),
    /// White point (x, y) chromaticity
    pub w: (f64, f64),
    /// Color space name
    pub name: &'static str,
}

// ============================================================================
// Standard White Points
// ============================================================================

/// D65 white point chromaticity (daylight, ~6500K).
pub const D65_XY: (f64, f64) = (0.3127, 0.3290);

/// D60 white point chromaticity (~6000K, used by ACES).
pub const D60_XY: (f64, f64) = (0.32168, 0.33767);

// ============================================================================
// Gamut Primaries
// ============================================================================

/// sRGB / Rec.709 primaries (D65 white point).
pub const SRGB: Primaries = Primaries {
    r: (0.6400, 0.3300),
    g: (0.3000, 0.6000),
    b: (0.1500, 0.0600),
    w: D65_XY,
    name: "sRGB",
};

/// P3-D65 primaries (DCI-P3 gamut with a D65 white point).
pub const P3_D65: Primaries = Primaries {
    r: (0.6800, 0.3200),
    g: (0.2650, 0.6900),
    b: (0.1500, 0.0600),
    w: D65_XY,
    name: "P3-D65",
};

/// Adobe RGB (1998) primaries (D65 white point).
pub const ADOBE_RGB: Primaries = Primaries {
    r: (0.6400, 0.3300),
    g: (0.2100, 0.7100),
    b: (0.1500, 0.0600),
    w: D65_XY,
    name: "Adobe RGB (1998)",
};

/// ITU-R BT.2020 primaries (D65 white point).
pub const BT2020: Primaries = Primaries {
    r: (0.7080, 0.2920),
    g: (0.1700, 0.7970),
    b: (0.1310, 0.0460),
    w: D65_XY,
    name: "BT.2020",
};

/// ACEScg primaries (ACES AP1, D60 white point).
pub const ACES_CG: Primaries = Primaries {
    r: (0.7130, 0.2930),
    g: (0.1650, 0.8300),
    b: (0.1280, 0.0440),
    w: D60_XY,
    name: "ACEScg",
};

/// ACES2065-1 primaries (ACES AP0, D60 white point).
pub const ACES_2065_1: Primaries = Primaries {
    r: (0.7347, 0.2653),
    g: (0.0000, 1.0000),
    b: (0.0001, -0.0770),
    w: D60_XY,
    name: "ACES2065-1",
};

// ============================================================================
// Gamut Registry
// ============================================================================

/// The six gamuts a spectral coefficient table is produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gamut {
    /// sRGB / Rec.709
    Srgb,
    /// P3-D65 (Display P3 gamut)
    P3D65,
    /// Adobe RGB (1998)
    AdobeRgb,
    /// ITU-R BT.2020
    Bt2020,
    /// ACEScg (AP1)
    AcesCg,
    /// ACES2065-1 (AP0)
    Aces2065_1,
}

/// All gamuts, in the order tables are produced.
pub const ALL_GAMUTS: [Gamut; 6] = [
    Gamut::Srgb,
    Gamut::P3D65,
    Gamut::AdobeRgb,
    Gamut::Bt2020,
    Gamut::AcesCg,
    Gamut::Aces2065_1,
];

impl Gamut {
    /// The gamut's primaries and white point.
    pub const fn primaries(self) -> Primaries {
        match self {
            Gamut::Srgb => SRGB,
            Gamut::P3D65 => P3_D65,
            Gamut::AdobeRgb => ADOBE_RGB,
            Gamut::Bt2020 => BT2020,
            Gamut::AcesCg => ACES_CG,
            Gamut::Aces2065_1 => ACES_2065_1,
        }
    }

    /// Human-readable gamut name.
    pub const fn name(self) -> &'static str {
        self.primaries().name
    }

    /// Canonical file name of this gamut's coefficient table.
    pub const fn table_file_name(self) -> &'static str {
        match self {
            Gamut::Srgb => "srgb_table.bin",
            Gamut::P3D65 => "dcip3d65_table.bin",
            Gamut::AdobeRgb => "adobergb_table.bin",
            Gamut::Bt2020 => "rec2020_table.bin",
            Gamut::AcesCg => "acescg_table.bin",
            Gamut::Aces2065_1 => "aces2065_1_table.bin",
        }
    }
}

impl fmt::Display for Gamut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Gamut {
    type Err = PrimariesError;

    /// Accepts the registry names plus the short spellings the CLI uses.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "srgb" => Ok(Gamut::Srgb),
            "p3-d65" | "p3d65" | "dcip3d65" => Ok(Gamut::P3D65),
            "adobe rgb (1998)" | "adobergb" | "adobe-rgb" => Ok(Gamut::AdobeRgb),
            "bt.2020" | "bt2020" | "rec2020" => Ok(Gamut::Bt2020),
            "acescg" => Ok(Gamut::AcesCg),
            "aces2065-1" | "aces2065_1" => Ok(Gamut::Aces2065_1),
            _ => Err(PrimariesError::UnknownGamut(s.to_string())),
        }
    }
}

// ============================================================================
// Matrix Generation
// ============================================================================

/// Converts xy chromaticity to XYZ with unit luminance (Y=1).
fn xy_to_xyz(x: f64, y: f64) -> glam::DVec3 {
    if y.abs() < 1e-10 {
        glam::DVec3::ZERO
    } else {
        glam::DVec3::new(x / y, 1.0, (1.0 - x - y) / y)
    }
}

/// Computes the RGB to XYZ matrix for a set of primaries, in f64.
///
/// Standard construction: xy chromaticities become XYZ columns, then each
/// column is scaled so that RGB (1,1,1) maps to the white point's XYZ.
fn rgb_to_xyz_dmat3(p: &Primaries) -> glam::DMat3 {
    let r = xy_to_xyz(p.r.0, p.r.1);
    let g = xy_to_xyz(p.g.0, p.g.1);
    let b = xy_to_xyz(p.b.0, p.b.1);
    let w = xy_to_xyz(p.w.0, p.w.1);

    let m = glam::DMat3::from_cols(r, g, b);
    let s = m.inverse() * w;
    glam::DMat3::from_cols(r * s.x, g * s.y, b * s.z)
}

/// A gamut's derived conversion state: the matrix pair and whitepoint XYZ.
///
/// Matrices are mutual inverses within f32 tolerance; the white point has
/// unit luminance.
#[derive(Debug, Clone, Copy)]
pub struct ColorSpace {
    /// Which gamut this state was derived from.
    pub gamut: Gamut,
    /// XYZ to linear RGB.
    pub xyz_to_rgb: Mat3,
    /// Linear RGB to XYZ.
    pub rgb_to_xyz: Mat3,
    /// Reference white as XYZ with Y = 1.
    pub white_xyz: Vec3,
}

impl ColorSpace {
    /// Derives the conversion state for a gamut.
    pub fn from_gamut(gamut: Gamut) -> Self {
        let p = gamut.primaries();
        let rgb_to_xyz = rgb_to_xyz_dmat3(&p);
        let xyz_to_rgb = rgb_to_xyz.inverse();
        let white = xy_to_xyz(p.w.0, p.w.1);
        Self {
            gamut,
            xyz_to_rgb: Mat3::from_dmat3(xyz_to_rgb),
            rgb_to_xyz: Mat3::from_dmat3(rgb_to_xyz),
            white_xyz: Vec3::from_dvec3(white),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_srgb_matrix_known_values() {
        let cs = ColorSpace::from_gamut(Gamut::Srgb);
        // IEC 61966-2-1 reference values
        assert!((cs.rgb_to_xyz.m[0][0] - 0.4124564).abs() < 1e-4);
        assert!((cs.rgb_to_xyz.m[1][0] - 0.2126729).abs() < 1e-4);
        assert!((cs.xyz_to_rgb.m[0][0] - 3.2404542).abs() < 1e-3);
    }

    #[test]
    fn test_white_maps_to_whitepoint() {
        for gamut in ALL_GAMUTS {
            let cs = ColorSpace::from_gamut(gamut);
            let white = cs.rgb_to_xyz * Vec3::ONE;
            assert_relative_eq!(white.x, cs.white_xyz.x, max_relative = 1e-4);
            assert_relative_eq!(white.y, 1.0, max_relative = 1e-4);
            assert_relative_eq!(white.z, cs.white_xyz.z, max_relative = 1e-4);
        }
    }

    #[test]
    fn test_roundtrip_all_gamuts() {
        let rgb = Vec3::new(0.2, 0.5, 0.8);
        for gamut in ALL_GAMUTS {
            let cs = ColorSpace::from_gamut(gamut);
            let back = cs.xyz_to_rgb * (cs.rgb_to_xyz * rgb);
            assert_relative_eq!(back.x, rgb.x, max_relative = 1e-5, epsilon = 1e-6);
            assert_relative_eq!(back.y, rgb.y, max_relative = 1e-5, epsilon = 1e-6);
            assert_relative_eq!(back.z, rgb.z, max_relative = 1e-5, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_matrices_are_mutual_inverses() {
        for gamut in ALL_GAMUTS {
            let cs = ColorSpace::from_gamut(gamut);
            let product = cs.xyz_to_rgb * cs.rgb_to_xyz;
            for i in 0..3 {
                for j in 0..3 {
                    let expected = if i == j { 1.0 } else { 0.0 };
                    assert!(
                        (product.m[i][j] - expected).abs() < 1e-5,
                        "{}: product[{}][{}] = {}",
                        gamut,
                        i,
                        j,
                        product.m[i][j]
                    );
                }
            }
        }
    }

    #[test]
    fn test_gamut_from_str() {
        assert_eq!("srgb".parse::<Gamut>().unwrap(), Gamut::Srgb);
        assert_eq!("P3-D65".parse::<Gamut>().unwrap(), Gamut::P3D65);
        assert_eq!("Adobe RGB (1998)".parse::<Gamut>().unwrap(), Gamut::AdobeRgb);
        assert_eq!("rec2020".parse::<Gamut>().unwrap(), Gamut::Bt2020);
        assert_eq!("ACEScg".parse::<Gamut>().unwrap(), Gamut::AcesCg);
        assert_eq!("aces2065-1".parse::<Gamut>().unwrap(), Gamut::Aces2065_1);
        assert!("ntsc".parse::<Gamut>().is_err());
    }

    #[test]
    fn test_table_file_names_unique() {
        let names: Vec<_> = ALL_GAMUTS.iter().map(|g| g.table_file_name()).collect();
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
