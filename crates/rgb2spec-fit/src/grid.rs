//! Z-node axis and target grid construction.
//!
//! The achromatic axis is warped by a double smoothstep so nodes cluster
//! near 0 and 1, where spectral reconstruction is most sensitive. The full
//! RGB cube is covered by three overlapping parameterizations, one per
//! dominant channel.

use rgb2spec_math::Vec3;

/// Hermite smoothstep, t²(3 − 2t) on [0, 1].
#[inline]
pub fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// The non-linear z-axis: `s(i) = smoothstep(smoothstep(i / (n - 1)))`.
///
/// Exactly 0 at the first node and 1 at the last, non-decreasing, denser
/// near the ends than around 0.5.
pub fn z_nodes(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| smoothstep(smoothstep(i as f32 / (n - 1) as f32)))
        .collect()
}

/// The full per-gamut target grid.
///
/// For grid cell `(major, zi, yi, xi)` with `z = s(zi)`,
/// `y = (yi/(n−1))·z`, `x = (xi/(n−1))·z`, the target triple places z in
/// the dominant channel: major 0 → (z, x, y), 1 → (y, z, x), 2 → (x, y, z).
/// Targets are stored flat in `[major][z][y][x]` order, x fastest — the
/// same cell order the coefficient table serializes in.
#[derive(Debug, Clone)]
pub struct TargetGrid {
    /// Grid resolution per axis.
    pub size: usize,
    /// The shared z-node axis.
    pub z_nodes: Vec<f32>,
    /// `3 * size^3` target RGB triples.
    pub targets: Vec<Vec3>,
}

impl TargetGrid {
    /// Builds the grid for resolution `n`.
    pub fn build(n: usize) -> Self {
        let z_nodes = z_nodes(n);
        let inv = 1.0 / (n - 1) as f32;
        let mut targets = Vec::with_capacity(3 * n * n * n);

        for major in 0..3 {
            for zi in 0..n {
                let z = z_nodes[zi];
                for yi in 0..n {
                    let y = yi as f32 * inv * z;
                    for xi in 0..n {
                        let x = xi as f32 * inv * z;
                        targets.push(match major {
                            0 => Vec3::new(z, x, y),
                            1 => Vec3::new(y, z, x),
                            _ => Vec3::new(x, y, z),
                        });
                    }
                }
            }
        }

        Self {
            size: n,
            z_nodes,
            targets,
        }
    }

    /// Number of cells across the three major axes.
    #[inline]
    pub fn cell_count(&self) -> usize {
        3 * self.size * self.size * self.size
    }
}
