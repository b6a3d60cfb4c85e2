//! Voxel-grid downsampling for colored point clouds.
//!
//! Space is divided into axis-aligned boxes of `leaf_size` and every occupied
//! box is replaced by the centroid of the points inside it. Colors are
//! averaged per channel.
//!
//! ```text
//! index = (ix - min_x) + (iy - min_y)·nx + (iz - min_z)·nx·ny
//! ix    = floor(x / leaf_x)   (likewise y, z)
//! ```
//!
//! Output points are ordered by this linear index, so x varies fastest.

use crate::cloud::{PointCloud, PointXyzRgb};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration for voxel-grid downsampling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoxelGridConfig {
    /// Edge length of a voxel along x, y and z (meters).
    ///
    /// Default: 1cm cubes
    pub leaf_size: [f32; 3],

    /// Voxels holding fewer points than this are discarded.
    ///
    /// Default: 1 (keep every occupied voxel)
    pub min_points_per_voxel: u32,
}

impl Default for VoxelGridConfig {
    fn default() -> Self {
        Self {
            leaf_size: [0.01, 0.01, 0.01],
            min_points_per_voxel: 1,
        }
    }
}

/// Running sum of the points that fell into one voxel.
#[derive(Debug, Default)]
struct Accumulator {
    x: f64,
    y: f64,
    z: f64,
    rgb: [u64; 3],
    count: u64,
}

impl Accumulator {
    fn add(&mut self, p: &PointXyzRgb) {
        self.x += p.x as f64;
        self.y += p.y as f64;
        self.z += p.z as f64;
        for (sum, &c) in self.rgb.iter_mut().zip(p.rgb.iter()) {
            *sum += c as u64;
        }
        self.count += 1;
    }

    fn centroid(&self) -> PointXyzRgb {
        let n = self.count as f64;
        PointXyzRgb {
            x: (self.x / n) as f32,
            y: (self.y / n) as f32,
            z: (self.z / n) as f32,
            rgb: self.rgb.map(|sum| (sum / self.count) as u8),
        }
    }
}

/// Voxel-grid filter.
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    config: VoxelGridConfig,
    inverse_leaf: [f64; 3],
}

impl VoxelGrid {
    /// Create a filter, rejecting leaf sizes that are not finite and positive.
    pub fn new(config: VoxelGridConfig) -> Result<Self> {
        if config.leaf_size.iter().any(|l| !l.is_finite() || *l <= 0.0) {
            return Err(Error::InvalidLeafSize(config.leaf_size));
        }

        Ok(Self {
            inverse_leaf: config.leaf_size.map(|l| 1.0 / l as f64),
            config,
        })
    }

    /// Downsample `cloud`, returning a new cloud with the same header.
    ///
    /// Non-finite points are dropped. If the occupied grid has more cells
    /// than an `i32` can index the input is returned unchanged.
    pub fn filter(&self, cloud: &PointCloud) -> PointCloud {
        let finite: Vec<&PointXyzRgb> = cloud.points.iter().filter(|p| p.is_finite()).collect();
        if finite.is_empty() {
            return PointCloud::new(cloud.header.clone(), Vec::new());
        }

        let cells: Vec<[f64; 3]> = finite.iter().map(|p| self.cell_of(p)).collect();

        let mut min_b = [f64::INFINITY; 3];
        let mut max_b = [f64::NEG_INFINITY; 3];
        for cell in &cells {
            for axis in 0..3 {
                min_b[axis] = min_b[axis].min(cell[axis]);
                max_b[axis] = max_b[axis].max(cell[axis]);
            }
        }

        let Some(divisions) = grid_divisions(&min_b, &max_b) else {
            log::warn!(
                "Leaf size {:?} is too small for this cloud, the voxel index would overflow; \
                 returning input unchanged",
                self.config.leaf_size
            );
            return cloud.clone();
        };

        let mut indexed: Vec<(i64, usize)> = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let ix = (cell[0] - min_b[0]) as i64;
                let iy = (cell[1] - min_b[1]) as i64;
                let iz = (cell[2] - min_b[2]) as i64;
                (ix + iy * divisions[0] + iz * divisions[0] * divisions[1], i)
            })
            .collect();
        indexed.sort_unstable();

        let mut points = Vec::new();
        let mut start = 0;
        while start < indexed.len() {
            let index = indexed[start].0;
            let mut acc = Accumulator::default();
            let mut end = start;
            while end < indexed.len() && indexed[end].0 == index {
                acc.add(finite[indexed[end].1]);
                end += 1;
            }
            if acc.count >= u64::from(self.config.min_points_per_voxel) {
                points.push(acc.centroid());
            }
            start = end;
        }

        PointCloud::new(cloud.header.clone(), points)
    }

    /// Integer cell coordinates of `p`, kept as floats until range-checked.
    fn cell_of(&self, p: &PointXyzRgb) -> [f64; 3] {
        [
            (p.x as f64 * self.inverse_leaf[0]).floor(),
            (p.y as f64 * self.inverse_leaf[1]).floor(),
            (p.z as f64 * self.inverse_leaf[2]).floor(),
        ]
    }
}

/// Cells per axis, or `None` if the grid cannot be indexed by an `i32`.
fn grid_divisions(min_b: &[f64; 3], max_b: &[f64; 3]) -> Option<[i64; 3]> {
    let limit = i32::MAX as f64;
    let mut divisions = [0i64; 3];
    for axis in 0..3 {
        if min_b[axis].abs() > limit || max_b[axis].abs() > limit {
            return None;
        }
        divisions[axis] = (max_b[axis] - min_b[axis]) as i64 + 1;
    }

    let total = divisions[0]
        .checked_mul(divisions[1])?
        .checked_mul(divisions[2])?;
    (total <= i32::MAX as i64).then_some(divisions)
}

/// Downsample `cloud` with the given leaf size and default settings.
pub fn downsample(cloud: &PointCloud, leaf_size: [f32; 3]) -> Result<PointCloud> {
    let grid = VoxelGrid::new(VoxelGridConfig {
        leaf_size,
        ..VoxelGridConfig::default()
    })?;
    Ok(grid.filter(cloud))
}
