//! # rgb2spec-table
//!
//! The spectral coefficient table: in-memory representation, the binary
//! file layout, and coefficient lookup for arbitrary RGB values.
//!
//! # Layout
//!
//! A table of resolution N serializes as little-endian f32:
//!
//! ```text
//! offset 0:        N floats                 - z-node axis
//! offset 4*N:      3 * N^3 * 3 floats       - coefficients,
//!                  ordered [major_axis][z][y][x][coeff], coeff fastest
//! ```
//!
//! For N = 64 that is 256 + 9,437,184 = 9,437,440 bytes.
//!
//! # Usage
//!
//! ```rust
//! use rgb2spec_table::SpectrumTable;
//!
//! let n = 4;
//! let z_nodes = vec![0.0, 0.2, 0.6, 1.0];
//! let coeffs = vec![[0.0f32; 3]; 3 * n * n * n];
//! let table = SpectrumTable::new(n, z_nodes, coeffs).unwrap();
//! let bytes = table.to_bytes();
//! let back = SpectrumTable::from_bytes(&bytes, n).unwrap();
//! assert_eq!(back.z_nodes, table.z_nodes);
//! ```
//!
//! # Dependencies
//!
//! - [`rgb2spec-math`] - Vec3
//! - [`thiserror`] - error types
//!
//! # Used By
//!
//! - `rgb2spec-fit` - checkpoint/final serialization and verification
//! - `rgb2spec-cli` - table verification

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
mod table;

pub use error::{TableError, TableResult};
pub use table::{Interpolation, SpectrumTable};
