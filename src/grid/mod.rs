//! Uniform cell grid for distance-cutoff neighbour queries
//!
//! Space is cut into cubes of side `cell_size`; each occupied cell keeps the
//! indices of the atoms inside it. A neighbour query scans the cells covered
//! by the bounding box of the query sphere and checks real distances, so with
//! `cell_size` equal to the cutoff at most 27 cells are visited.

use std::collections::HashMap;

type CellKey = (i32, i32, i32);

/// Spatial hash of atom positions
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f64,
    inv_cell_size: f64,
    cells: HashMap<CellKey, Vec<usize>>,
}

impl SpatialGrid {
    /// Build a grid from flat coordinates `[x0, y0, z0, x1, ...]`
    ///
    /// A non-positive `cell_size` is replaced by 1 Å.
    pub fn from_positions(positions: &[f64], cell_size: f64) -> Self {
        let cell_size = if cell_size > 0.0 { cell_size } else { 1.0 };
        let inv_cell_size = 1.0 / cell_size;
        let mut cells: HashMap<CellKey, Vec<usize>> = HashMap::new();

        for (i, p) in positions.chunks_exact(3).enumerate() {
            let key = Self::cell_of(p[0], p[1], p[2], inv_cell_size);
            cells.entry(key).or_default().push(i);
        }

        Self {
            cell_size,
            inv_cell_size,
            cells,
        }
    }

    fn cell_of(x: f64, y: f64, z: f64, inv_cell_size: f64) -> CellKey {
        (
            (x * inv_cell_size).floor() as i32,
            (y * inv_cell_size).floor() as i32,
            (z * inv_cell_size).floor() as i32,
        )
    }

    /// Call `f(j)` for every atom `j != center` closer than `radius` to `center`
    ///
    /// Each unordered pair is reported from both ends; callers that want each
    /// pair once filter on `j > center`.
    pub fn for_each_neighbor<F: FnMut(usize)>(
        &self,
        positions: &[f64],
        center: usize,
        radius: f64,
        mut f: F,
    ) {
        let c = &positions[3 * center..3 * center + 3];
        let radius_sq = radius * radius;
        let lo = Self::cell_of(c[0] - radius, c[1] - radius, c[2] - radius, self.inv_cell_size);
        let hi = Self::cell_of(c[0] + radius, c[1] + radius, c[2] + radius, self.inv_cell_size);

        for gx in lo.0..=hi.0 {
            for gy in lo.1..=hi.1 {
                for gz in lo.2..=hi.2 {
                    let Some(atoms) = self.cells.get(&(gx, gy, gz)) else {
                        continue;
                    };
                    for &j in atoms {
                        if j == center {
                            continue;
                        }
                        let p = &positions[3 * j..3 * j + 3];
                        let dx = c[0] - p[0];
                        let dy = c[1] - p[1];
                        let dz = c[2] - p[2];
                        if dx * dx + dy * dy + dz * dz < radius_sq {
                            f(j);
                        }
                    }
                }
            }
        }
    }

    /// Collect the neighbours of `center` within `radius`, sorted by index
    pub fn neighbors(&self, positions: &[f64], center: usize, radius: f64) -> Vec<usize> {
        let mut out = Vec::new();
        self.for_each_neighbor(positions, center, radius, |j| out.push(j));
        out.sort_unstable();
        out
    }

    /// Side length of a cell in Angstroms
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of occupied cells
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }
}
