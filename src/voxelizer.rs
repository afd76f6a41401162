//! Solid/void classification of a distance field on a cubic voxel grid.
//!
//! The adaptive pass works on a flat `3^L`-sided grid. Level `n` looks at
//! blocks of `3^n` voxels per side: the field is evaluated once at the block
//! center, and when the distance exceeds the radius of the sphere enclosing
//! every voxel center of the block, the whole block receives the sign of the
//! distance in one write. Blocks that cannot be decided are split into 27
//! children at the next level. Level 0 decides single voxels. Each level is
//! evaluated one slice along the first axis at a time, so the working set
//! beyond the grid stays at one slice of block centers.
//!
//! Pruning is only exact when `|d|` is a lower bound of the distance to the
//! surface (see [`DistanceField::is_lower_bound`]). Escape-time fractal
//! estimators only approximate that bound, so a block close to a thin feature
//! may be stamped with the wrong sign. This is accepted: the estimator's
//! correction factor is the knob, the voxelizer does not clamp anything.

use cgmath::EuclideanSpace;
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::{
    Error,
    aabb::AABB,
    array3d::Array3d,
    constants::{DEFAULT_MAX_CELLS, SQRT_THREE},
    sdf::DistanceField,
    vec::{Point3, Vec3, Vec3i, is_finite},
};

/// Inputs of a voxelization.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoxelizerSettings {
    /// Number of subdivision levels `L`, the grid side is `3^L`
    pub levels: u32,
    /// Edge length of the sampled cube
    pub size: f64,
    /// Center of the sampled cube
    pub center: Point3,
    /// A cell is solid when its value (-1, 0 or 1) is `<= cutoff`
    pub cutoff: f64,
    /// Refuse grids with more cells than this
    pub max_cells: usize,
}

impl Default for VoxelizerSettings {
    fn default() -> Self {
        Self {
            levels: 5,
            size: 2.0,
            center: Point3::new(0.0, 0.0, 0.0),
            cutoff: 0.0,
            max_cells: DEFAULT_MAX_CELLS,
        }
    }
}

impl VoxelizerSettings {
    /// Check every precondition, before anything is allocated.
    pub fn validate(&self) -> crate::Result<()> {
        if self.levels == 0 {
            return Err(Error::NonPositive("levels"));
        }
        // NaN is not finite
        if !self.size.is_finite() || self.size <= 0.0 {
            return Err(Error::NonPositive("size"));
        }
        let cells = 27u128.checked_pow(self.levels).unwrap_or(u128::MAX);
        if cells > self.max_cells as u128 {
            return Err(Error::TooManyCells(self.levels, cells, self.max_cells));
        }
        if self.resolution() <= 0.0 {
            return Err(Error::NonPositive("resolution"));
        }
        if !is_finite(&self.center.to_vec()) {
            return Err(Error::InvalidParameter(
                "center".to_string(),
                format!("must be finite, got {:?}", self.center),
            ));
        }
        Ok(())
    }

    /// Number of voxels along one axis
    #[must_use]
    pub fn side(&self) -> usize {
        3usize.pow(self.levels)
    }

    /// Edge length of one voxel
    #[must_use]
    pub fn resolution(&self) -> f64 {
        self.size / 3f64.powi(self.levels as i32)
    }

    /// World position of the corner of voxel (0, 0, 0)
    #[must_use]
    pub fn origin(&self) -> Point3 {
        let half = self.size / 2.0;
        self.center - Vec3::new(half, half, half)
    }
}

fn cell_center(origin: Point3, resolution: f64, [i, j, k]: [usize; 3]) -> Point3 {
    origin + Vec3::new(i as f64 + 0.5, j as f64 + 0.5, k as f64 + 0.5) * resolution
}

/// Sign of a distance: -1 inside, 1 outside, 0 on the surface or for NaN.
#[must_use]
pub fn sign(d: f64) -> i8 {
    if d > 0.0 {
        1
    } else if d < 0.0 {
        -1
    } else {
        0
    }
}

/// Cell values -1 (inside), 0 (undetermined) or +1 (outside).
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelGrid {
    pub cells: Array3d<i8>,
    pub origin: Point3,
    pub resolution: f64,
}

impl VoxelGrid {
    fn new(settings: &VoxelizerSettings) -> Self {
        Self {
            cells: Array3d::with_side(settings.side(), 0),
            origin: settings.origin(),
            resolution: settings.resolution(),
        }
    }

    /// Final inclusion test `value <= cutoff`
    #[must_use]
    pub fn threshold(&self, cutoff: f64) -> VoxelMask {
        VoxelMask {
            solid: self.cells.map(|&v| f64::from(v) <= cutoff),
            origin: self.origin,
            resolution: self.resolution,
        }
    }

    #[must_use]
    pub fn count(&self, value: i8) -> usize {
        self.cells.data().iter().filter(|&&v| v == value).count()
    }
}

/// Boolean voxel classification, `true` is solid.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelMask {
    pub solid: Array3d<bool>,
    pub origin: Point3,
    pub resolution: f64,
}

impl VoxelMask {
    #[must_use]
    pub fn side(&self) -> usize {
        self.solid.side()
    }

    /// Solid test with signed coordinates, everything outside the grid is void
    #[must_use]
    pub fn is_solid(&self, p: Vec3i) -> bool {
        self.solid.get(p).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn count_solid(&self) -> usize {
        self.solid.data().iter().filter(|&&v| v).count()
    }

    /// World position of the lattice corner `(i, j, k)`, `0..=side` on each axis
    #[must_use]
    pub fn corner(&self, p: Vec3i) -> Point3 {
        self.origin + Vec3::new(p.x as f64, p.y as f64, p.z as f64) * self.resolution
    }

    #[must_use]
    pub fn bounds(&self) -> AABB {
        let side = self.side() as i64;
        AABB::from_points(self.origin, self.corner(Vec3i::new(side, side, side)))
    }

    /// Number of cells where the two masks differ
    #[must_use]
    pub fn disagreements(&self, other: &Self) -> usize {
        self.solid
            .data()
            .iter()
            .zip(other.solid.data())
            .filter(|(a, b)| a != b)
            .count()
    }
}

/// Work done at one subdivision level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LevelStats {
    pub level: u32,
    /// Field evaluations, one per unresolved block center
    pub evaluations: usize,
    /// Blocks written with a sign
    pub stamped: usize,
    /// Evaluations that returned NaN, left unresolved
    pub nan: usize,
}

/// Reported once per (level, slice) along the first axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub level: u32,
    pub slice: usize,
    pub slices: usize,
}

pub struct Voxelization {
    pub grid: VoxelGrid,
    pub mask: VoxelMask,
    /// Coarsest level first
    pub stats: Vec<LevelStats>,
}

impl Voxelization {
    #[must_use]
    pub fn evaluations(&self) -> usize {
        self.stats.iter().map(|s| s.evaluations).sum()
    }
}

/// Adaptive voxelization, see the module documentation.
pub fn voxelize(field: &dyn DistanceField, settings: &VoxelizerSettings) -> crate::Result<Voxelization> {
    voxelize_with_progress(field, settings, &mut |_| {})
}

/// [`voxelize`] reporting progress; the callback has no influence on the result.
pub fn voxelize_with_progress(
    field: &dyn DistanceField,
    settings: &VoxelizerSettings,
    progress: &mut dyn FnMut(Progress),
) -> crate::Result<Voxelization> {
    settings.validate()?;
    let side = settings.side();
    info!(
        "Voxelizing `{}`: {} levels, {side}^3 cells, size {}",
        field.name(),
        settings.levels,
        settings.size
    );
    if !field.is_lower_bound() {
        debug!("`{}` is an estimate, block pruning is approximate", field.name());
    }

    let mut grid = VoxelGrid::new(settings);
    let mut stats = Vec::with_capacity(settings.levels as usize);

    for level in (0..settings.levels).rev() {
        let stride = 3usize.pow(level);
        let span = (stride - 1) / 2;
        let centers: Vec<usize> = (span..side - span).step_by(stride).collect();

        let mut level_stats = LevelStats {
            level,
            ..LevelStats::default()
        };
        let threshold = span as f64;
        // Reused across slices, at most one slice of block centers
        let mut candidates: Vec<[usize; 3]> = Vec::with_capacity(centers.len() * centers.len());
        let mut points: Vec<Point3> = Vec::with_capacity(centers.len() * centers.len());
        let mut distances: Vec<f64> = Vec::with_capacity(centers.len() * centers.len());

        for (slice, &i) in centers.iter().enumerate() {
            // Unresolved block centers of this slice. Blocks of one level are
            // disjoint, so stamps from earlier slices never touch them.
            candidates.clear();
            for &j in &centers {
                for &k in &centers {
                    if *grid.cells.at(i, j, k) == 0 {
                        candidates.push([i, j, k]);
                    }
                }
            }

            if !candidates.is_empty() {
                points.clear();
                points.par_extend(
                    candidates
                        .par_iter()
                        .map(|&c| cell_center(grid.origin, grid.resolution, c)),
                );
                distances.clear();
                distances.resize(points.len(), 0.0);
                field.signed_distance_batch(&points, &mut distances);
                level_stats.evaluations += candidates.len();
            }

            for (c, &d) in candidates.iter().zip(&distances) {
                if d.is_nan() {
                    level_stats.nan += 1;
                    continue;
                }
                if level == 0 {
                    *grid.cells.at_mut(c[0], c[1], c[2]) = sign(d);
                    level_stats.stamped += 1;
                    continue;
                }
                // Voxels away from the center, rounded down, that the distance
                // is guaranteed to cover
                let r = (d.abs() / (SQRT_THREE * grid.resolution) - 0.5).floor();
                if r >= threshold {
                    let lo = c.map(|x| x - span);
                    let hi = c.map(|x| x + span + 1);
                    grid.cells.fill_block(lo, hi, &sign(d));
                    level_stats.stamped += 1;
                }
            }
            progress(Progress {
                level,
                slice,
                slices: centers.len(),
            });
        }

        debug!(
            "Level {level}: {} evaluations, {} blocks stamped",
            level_stats.evaluations, level_stats.stamped
        );
        if level_stats.nan > 0 {
            warn!(
                "Level {level}: {} NaN distances left unresolved",
                level_stats.nan
            );
        }
        stats.push(level_stats);
    }

    let mask = grid.threshold(settings.cutoff);
    info!(
        "Voxelization done: {} evaluations, {} solid voxels",
        stats.iter().map(|s| s.evaluations).sum::<usize>(),
        mask.count_solid()
    );
    Ok(Voxelization { grid, mask, stats })
}

/// Baseline without pruning: every voxel center is evaluated.
pub fn voxelize_dense(field: &dyn DistanceField, settings: &VoxelizerSettings) -> crate::Result<Voxelization> {
    voxelize_dense_with_progress(field, settings, &mut |_| {})
}

pub fn voxelize_dense_with_progress(
    field: &dyn DistanceField,
    settings: &VoxelizerSettings,
    progress: &mut dyn FnMut(Progress),
) -> crate::Result<Voxelization> {
    settings.validate()?;
    let side = settings.side();
    info!(
        "Dense sampling of `{}`: {side}^3 cells, size {}",
        field.name(),
        settings.size
    );

    let mut grid = VoxelGrid::new(settings);
    let mut level_stats = LevelStats::default();
    let mut points = vec![Point3::new(0.0, 0.0, 0.0); side * side];
    let mut distances = vec![0.0; side * side];

    // One batch per slice keeps memory at side² samples
    for i in 0..side {
        points.par_iter_mut().enumerate().for_each(|(index, p)| {
            *p = cell_center(grid.origin, grid.resolution, [i, index / side, index % side]);
        });
        field.signed_distance_batch(&points, &mut distances);
        for (index, &d) in distances.iter().enumerate() {
            if d.is_nan() {
                level_stats.nan += 1;
            }
            *grid.cells.at_mut(i, index / side, index % side) = sign(d);
        }
        level_stats.evaluations += side * side;
        progress(Progress {
            level: 0,
            slice: i,
            slices: side,
        });
    }
    level_stats.stamped = level_stats.evaluations - level_stats.nan;
    if level_stats.nan > 0 {
        warn!("{} NaN distances left unresolved", level_stats.nan);
    }

    let mask = grid.threshold(settings.cutoff);
    Ok(Voxelization {
        grid,
        mask,
        stats: vec![level_stats],
    })
}
