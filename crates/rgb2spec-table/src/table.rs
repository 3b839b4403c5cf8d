//! Spectral coefficient table: storage, binary IO, and lookup.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use rgb2spec_math::Vec3;

use crate::{TableError, TableResult};

/// Interpolation mode for coefficient lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    /// Coefficients of the nearest grid cell.
    Nearest,
    /// Trilinear blend of the eight surrounding cells.
    Trilinear,
}

/// A fitted coefficient table for one gamut.
///
/// Stores the non-linear z-node axis and, for each of the three major-axis
/// parameterizations, an N^3 grid of sigmoid-polynomial coefficient triples
/// (a, b, c). The flat buffer is ordered `[major][z][y][x]`, x fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumTable {
    size: usize,
    /// Non-linear z-axis sample positions, ascending in [0, 1].
    pub z_nodes: Vec<f32>,
    /// Coefficient triples, `3 * size^3` entries in `[major][z][y][x]` order.
    pub coeffs: Vec<[f32; 3]>,
}

impl SpectrumTable {
    /// Creates a table from its parts, validating buffer lengths.
    pub fn new(size: usize, z_nodes: Vec<f32>, coeffs: Vec<[f32; 3]>) -> TableResult<Self> {
        if size < 2 {
            return Err(TableError::InvalidSize(format!(
                "resolution must be at least 2, got {size}"
            )));
        }
        if z_nodes.len() != size {
            return Err(TableError::SizeMismatch {
                expected: size,
                got: z_nodes.len(),
            });
        }
        let expected = 3 * size * size * size;
        if coeffs.len() != expected {
            return Err(TableError::SizeMismatch {
                expected,
                got: coeffs.len(),
            });
        }
        Ok(Self {
            size,
            z_nodes,
            coeffs,
        })
    }

    /// Table resolution N.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Serialized byte length for a table of resolution `size`.
    #[inline]
    pub const fn byte_len(size: usize) -> usize {
        4 * size + 3 * size * size * size * 3 * 4
    }

    /// Flat index of a grid cell.
    #[inline]
    pub fn cell_index(&self, major: usize, zi: usize, yi: usize, xi: usize) -> usize {
        ((major * self.size + zi) * self.size + yi) * self.size + xi
    }

    #[inline]
    fn cell(&self, major: usize, zi: usize, yi: usize, xi: usize) -> [f32; 3] {
        self.coeffs[self.cell_index(major, zi, yi, xi)]
    }

    // ========================================================================
    // Binary IO
    // ========================================================================

    /// Serializes to the binary layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::byte_len(self.size));
        for &z in &self.z_nodes {
            out.extend_from_slice(&z.to_le_bytes());
        }
        for triple in &self.coeffs {
            for &c in triple {
                out.extend_from_slice(&c.to_le_bytes());
            }
        }
        out
    }

    /// Parses a table of resolution `size` from the binary layout.
    pub fn from_bytes(data: &[u8], size: usize) -> TableResult<Self> {
        let expected = Self::byte_len(size);
        if data.len() != expected {
            return Err(TableError::SizeMismatch {
                expected,
                got: data.len(),
            });
        }

        let mut floats = data
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]));

        let z_nodes: Vec<f32> = floats.by_ref().take(size).collect();
        let mut coeffs = Vec::with_capacity(3 * size * size * size);
        while let (Some(a), Some(b), Some(c)) = (floats.next(), floats.next(), floats.next()) {
            coeffs.push([a, b, c]);
        }

        Self::new(size, z_nodes, coeffs)
    }

    /// Writes the table to `path`, replacing any existing file.
    ///
    /// The bytes go to a temporary sibling first and are renamed into place,
    /// so an interrupted checkpoint never leaves a truncated table at the
    /// target path. The table at `path` is valid once this returns Ok.
    pub fn write(&self, path: &Path) -> TableResult<()> {
        let tmp = tmp_path(path);
        let result = (|| -> TableResult<()> {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            for &z in &self.z_nodes {
                writer.write_all(&z.to_le_bytes())?;
            }
            for triple in &self.coeffs {
                for &c in triple {
                    writer.write_all(&c.to_le_bytes())?;
                }
            }
            writer.flush()?;
            Ok(())
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Reads a table of resolution `size` from `path`.
    pub fn read(path: &Path, size: usize) -> TableResult<Self> {
        let mut data = Vec::new();
        File::open(path)?.read_to_end(&mut data)?;
        Self::from_bytes(&data, size)
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Looks up the coefficient triple for an RGB value in [0, 1]^3.
    ///
    /// Uniform RGB has the closed form (0, 0, logit(v)): a constant
    /// reflectance spectrum. Otherwise the largest channel selects the
    /// major axis and its grid, and the cell coefficients are interpolated.
    /// Inputs are clamped into the unit cube.
    pub fn coefficients(&self, rgb: Vec3, interp: Interpolation) -> [f32; 3] {
        let rgb = rgb.max_zero().min(Vec3::ONE);
        let n = self.size;

        // Constant spectra need no table: sigmoid(c) == v solves directly.
        if rgb.x == rgb.y && rgb.y == rgb.z {
            return [0.0, 0.0, (rgb.x / (1.0 - rgb.x)).ln()];
        }

        let major = rgb.max_position();
        let z = rgb[major];
        let scale = (n as f32 - 1.0) / z;
        let x = rgb[(major + 1) % 3] * scale;
        let y = rgb[(major + 2) % 3] * scale;

        let xi = (x as usize).min(n - 2);
        let yi = (y as usize).min(n - 2);
        let zi = (0..=n - 2)
            .find(|&i| self.z_nodes[i + 1] > z)
            .unwrap_or(n - 2);

        let dx = x - xi as f32;
        let dy = y - yi as f32;
        let dz = (z - self.z_nodes[zi]) / (self.z_nodes[zi + 1] - self.z_nodes[zi]);

        match interp {
            Interpolation::Nearest => {
                let xi = if dx < 0.5 { xi } else { xi + 1 };
                let yi = if dy < 0.5 { yi } else { yi + 1 };
                let zi = if dz < 0.5 { zi } else { zi + 1 };
                self.cell(major, zi, yi, xi)
            }
            Interpolation::Trilinear => {
                let mut cs = [0.0f32; 3];
                for (i, c) in cs.iter_mut().enumerate() {
                    let co = |dz: usize, dy: usize, dx: usize| {
                        self.cell(major, zi + dz, yi + dy, xi + dx)[i]
                    };
                    *c = lerp(
                        lerp(
                            lerp(co(0, 0, 0), co(0, 0, 1), dx),
                            lerp(co(0, 1, 0), co(0, 1, 1), dx),
                            dy,
                        ),
                        lerp(
                            lerp(co(1, 0, 0), co(1, 0, 1), dx),
                            lerp(co(1, 1, 0), co(1, 1, 1), dx),
                            dy,
                        ),
                        dz,
                    );
                }
                cs
            }
        }
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn tmp_path(path: &Path) -> std::path::PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "table".into());
    name.push(".tmp");
    path.with_file_name(name)
}
