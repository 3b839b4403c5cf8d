//! # rgb2spec-math
//!
//! Small color math layer for the spectral table fitter: [`Vec3`] for RGB,
//! XYZ, and Lab triples, and [`Mat3`] for the linear gamut transforms.
//!
//! # Convention
//!
//! Matrices are stored in **row-major** order and apply to **column
//! vectors**: `xyz = m_rgb_to_xyz * rgb`.
//!
//! # Usage
//!
//! ```rust
//! use rgb2spec_math::{Mat3, Vec3};
//!
//! let m = Mat3::IDENTITY;
//! let rgb = Vec3::new(0.25, 0.5, 1.0);
//! assert_eq!(m * rgb, rgb);
//! ```
//!
//! # Dependencies
//!
//! - [`glam`] - f64 matrix path for high-precision derivation
//!
//! # Used By
//!
//! - `rgb2spec-primaries` - gamut matrix generation
//! - `rgb2spec-fit` - spectral integration and Lab math

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod mat3;
mod vec3;

pub use mat3::Mat3;
pub use vec3::Vec3;
