//! Dense signed-distance grid with dirty tracking.
//!
//! A [`VoxelField`] stores one `f32` distance per voxel in a flat array
//! indexed by `x + y*N + z*N*N`. Negative values are inside the solid.
//!
//! Alongside the distances the field keeps two per-cell bitmaps used by the
//! surface estimator:
//!
//! - `dirty[s]`: a voxel of the cell whose minimum corner is `s` changed
//!   since the last estimate.
//! - `cached_on_surface[s]`: the last estimate produced a vertex in `s`.
//!
//! A cell is re-evaluated iff either flag is set, so every write marks the
//! written voxel's cell and the up to seven cells below it whose corner
//! neighborhood also contains that voxel.

use glam::UVec3;
use voxel_config::ChunkConfig;

use crate::error::{Result, VoxelError};
use crate::tables::CUBE_CORNERS;

/// Smallest grid side that still leaves an interior after the border.
pub const MIN_FIELD_SIZE: usize = 4;

/// Largest grid side (keeps strides and vertex indices inside `u32`).
pub const MAX_FIELD_SIZE: usize = 256;

/// Half-open box of cell coordinates `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub min: UVec3,
    pub max: UVec3,
}

impl Region {
    /// Create a region from its inclusive minimum and exclusive maximum.
    pub fn new(min: UVec3, max: UVec3) -> Self {
        Self { min, max }
    }

    /// A region containing no cells.
    pub fn empty() -> Self {
        Self {
            min: UVec3::ZERO,
            max: UVec3::ZERO,
        }
    }

    /// Whether the region contains no cells.
    pub fn is_empty(&self) -> bool {
        self.min.x >= self.max.x || self.min.y >= self.max.y || self.min.z >= self.max.z
    }

    /// Number of cells in the region.
    pub fn cell_count(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        let extent = self.max - self.min;
        extent.x as usize * extent.y as usize * extent.z as usize
    }

    /// Check if the region contains a cell.
    pub fn contains(&self, cell: UVec3) -> bool {
        cell.cmpge(self.min).all() && cell.cmplt(self.max).all()
    }

    /// Smallest region containing both inputs. Empty inputs are ignored.
    pub fn union(&self, other: &Region) -> Region {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Region::new(self.min.min(other.min), self.max.max(other.max))
    }
}

/// Dense cubic SDF grid plus the dirty and cached-surface bitmaps.
#[derive(Debug, Clone)]
pub struct VoxelField {
    size: usize,
    values: Vec<f32>,
    dirty: Vec<bool>,
    cached_on_surface: Vec<bool>,
}

impl VoxelField {
    /// Create a field of side `size` filled with `background`.
    ///
    /// Every cell starts dirty so the first extraction evaluates the whole
    /// region.
    pub fn new(size: usize, background: f32) -> Result<Self> {
        if !(MIN_FIELD_SIZE..=MAX_FIELD_SIZE).contains(&size) {
            return Err(VoxelError::InvalidConfig(format!(
                "chunk size {} outside {}..={}",
                size, MIN_FIELD_SIZE, MAX_FIELD_SIZE
            )));
        }
        if !background.is_finite() {
            return Err(VoxelError::InvalidConfig(format!(
                "background value {} is not finite",
                background
            )));
        }

        let len = size * size * size;
        Ok(Self {
            size,
            values: vec![background; len],
            dirty: vec![true; len],
            cached_on_surface: vec![false; len],
        })
    }

    /// Create a field from chunk configuration.
    pub fn from_config(config: &ChunkConfig) -> Result<Self> {
        let field = Self::new(config.size, config.background)?;
        if field.interior_region(config.border).is_empty() {
            return Err(VoxelError::InvalidConfig(format!(
                "border {} leaves no interior in a chunk of size {}",
                config.border, config.size
            )));
        }
        Ok(field)
    }

    /// Side length of the grid.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total number of voxels.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false; a field has at least `MIN_FIELD_SIZE^3` voxels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Flatten a coordinate. Does not bounds-check.
    #[inline]
    pub fn linearize(&self, x: usize, y: usize, z: usize) -> usize {
        x + y * self.size + z * self.size * self.size
    }

    /// Inverse of [`linearize`](Self::linearize).
    #[inline]
    pub fn delinearize(&self, stride: usize) -> UVec3 {
        let n = self.size;
        UVec3::new((stride % n) as u32, ((stride / n) % n) as u32, (stride / (n * n)) as u32)
    }

    /// Stride offsets of one step along x, y and z.
    #[inline]
    pub fn axis_strides(&self) -> [usize; 3] {
        [
            self.linearize(1, 0, 0),
            self.linearize(0, 1, 0),
            self.linearize(0, 0, 1),
        ]
    }

    /// Cells `[border, size - border)` on every axis.
    pub fn interior_region(&self, border: usize) -> Region {
        let lo = border.min(self.size) as u32;
        let hi = self.size.saturating_sub(border) as u32;
        Region::new(UVec3::splat(lo), UVec3::splat(hi))
    }

    fn checked_index(&self, x: usize, y: usize, z: usize) -> Result<usize> {
        if x >= self.size || y >= self.size || z >= self.size {
            return Err(VoxelError::OutOfBounds {
                x,
                y,
                z,
                size: self.size,
            });
        }
        Ok(self.linearize(x, y, z))
    }

    /// Read the distance at a voxel.
    pub fn get(&self, x: usize, y: usize, z: usize) -> Result<f32> {
        let index = self.checked_index(x, y, z)?;
        Ok(self.values[index])
    }

    /// Write the distance at a voxel and mark its neighborhood dirty.
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: f32) -> Result<()> {
        let index = self.checked_index(x, y, z)?;
        self.values[index] = value;
        self.mark_dirty(x, y, z);
        Ok(())
    }

    /// Distance at a stride, or `None` outside the grid.
    #[inline]
    pub fn value_at(&self, stride: usize) -> Option<f32> {
        self.values.get(stride).copied()
    }

    /// All distances in stride order.
    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Overwrite every voxel and mark the whole grid dirty.
    pub fn fill(&mut self, value: f32) {
        self.values.fill(value);
        self.mark_all_dirty();
    }

    /// Mark every cell whose corner neighborhood contains voxel `(x, y, z)`.
    ///
    /// Coordinates must be inside the grid.
    pub fn mark_dirty(&mut self, x: usize, y: usize, z: usize) {
        for corner in &CUBE_CORNERS {
            if x < corner[0] || y < corner[1] || z < corner[2] {
                continue;
            }
            let cell = self.linearize(x - corner[0], y - corner[1], z - corner[2]);
            self.dirty[cell] = true;
        }
    }

    /// Force a full re-evaluation on the next extraction.
    pub fn mark_all_dirty(&mut self) {
        self.dirty.fill(true);
    }

    /// Whether the cell at `stride` is waiting for re-estimation.
    #[inline]
    pub fn is_dirty(&self, stride: usize) -> bool {
        self.dirty.get(stride).copied().unwrap_or(false)
    }

    /// Whether the last estimate placed a vertex in the cell at `stride`.
    #[inline]
    pub fn is_cached_on_surface(&self, stride: usize) -> bool {
        self.cached_on_surface.get(stride).copied().unwrap_or(false)
    }

    /// Number of dirty cells in the whole grid.
    pub fn dirty_count(&self) -> usize {
        self.dirty.iter().filter(|&&d| d).count()
    }

    /// Number of cells cached as on the surface.
    pub fn cached_surface_count(&self) -> usize {
        self.cached_on_surface.iter().filter(|&&c| c).count()
    }

    /// Brush write: marks the voxel dirty even when the value is unchanged.
    /// Coordinates must be inside the grid. Returns whether the value changed.
    pub(crate) fn write_brush(&mut self, x: usize, y: usize, z: usize, value: f32) -> bool {
        let index = self.linearize(x, y, z);
        let changed = self.values[index] != value;
        self.values[index] = value;
        self.mark_dirty(x, y, z);
        changed
    }

    /// Split borrow for the estimator: distances read-only, flags mutable.
    pub(crate) fn estimator_view(&mut self) -> (&[f32], &mut [bool], &mut [bool]) {
        (&self.values, &mut self.dirty, &mut self.cached_on_surface)
    }
}
