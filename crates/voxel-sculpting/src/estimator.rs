//! Surface point estimation with dirty-driven caching.
//!
//! For every cell of the scanned region whose dirty or cached-surface flag is
//! set, the estimator samples the 8 corner distances and, when their signs
//! differ, places one vertex at the centroid of the zero crossings along the
//! cell's edges. The normal is a bilinear blend of per-axis corner
//! differences, which approximates the SDF gradient without sampling outside
//! the cell.
//!
//! Scan order is fixed (z outer, y middle, x inner) so vertex order, and
//! therefore every output buffer, is reproducible.

use glam::{UVec3, Vec3, Vec3Swizzles};
use rayon::prelude::*;
use tracing::{debug, error};

use crate::error::{Result, VoxelError};
use crate::field::{Region, VoxelField};
use crate::tables::{CUBE_CORNERS, CUBE_CORNER_VECTORS, CUBE_EDGES};

/// `stride_to_index` entry for cells without a vertex.
pub const NO_VERTEX: u32 = u32::MAX;

/// Vertices and cell lookups produced by one extraction pass.
#[derive(Debug, Clone, Default)]
pub struct SurfaceBatch {
    /// Vertex positions in emission order
    pub positions: Vec<Vec3>,
    /// Unit normals, parallel to `positions`
    pub normals: Vec<Vec3>,
    /// Minimum corner of every cell that produced a vertex, in scan order
    pub surface_points: Vec<UVec3>,
    /// Stride of every cell in `surface_points`
    pub surface_strides: Vec<usize>,
    /// Grid-sized lookup from cell stride to vertex index, or `NO_VERTEX`
    pub(crate) stride_to_index: Vec<u32>,
}

impl SurfaceBatch {
    /// Create an empty batch. The lookup is sized on first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of vertices in the batch.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Whether the last pass found no surface.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Vertex generated in the cell at `stride`, if any.
    #[inline]
    pub fn vertex_at(&self, stride: usize) -> Option<u32> {
        match self.stride_to_index.get(stride) {
            Some(&index) if index != NO_VERTEX => Some(index),
            _ => None,
        }
    }

    /// Raw stride to vertex lookup.
    #[inline]
    pub fn stride_to_index(&self) -> &[u32] {
        &self.stride_to_index
    }

    /// Clear all lists and reset every lookup entry to `NO_VERTEX`.
    fn reset(&mut self, field_len: usize) {
        self.positions.clear();
        self.normals.clear();
        self.surface_points.clear();
        self.surface_strides.clear();
        self.stride_to_index.clear();
        self.stride_to_index.resize(field_len, NO_VERTEX);
    }

    fn push(&mut self, cell: UVec3, stride: usize, surface: CellSurface) {
        let index = self.positions.len() as u32;
        self.positions.push(cell.as_vec3() + surface.offset);
        self.normals.push(surface.normal);
        self.surface_points.push(cell);
        self.surface_strides.push(stride);
        self.stride_to_index[stride] = index;
    }
}

/// Counters from one estimation pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EstimateStats {
    /// Cells in the scanned region
    pub cells_scanned: usize,
    /// Cells whose corners were sampled (dirty or cached on surface)
    pub cells_evaluated: usize,
    /// Vertices produced
    pub vertices: usize,
}

/// Surface found inside one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSurface {
    /// Vertex offset from the cell's minimum corner, inside `[0, 1]^3`
    pub offset: Vec3,
    /// Unit normal pointing toward positive distance
    pub normal: Vec3,
}

/// Sample the 8 corner distances of the cell at `cell`.
///
/// Corners outside the grid are `None`.
pub fn sample_corners(values: &[f32], size: usize, cell: UVec3) -> [Option<f32>; 8] {
    let (x, y, z) = (cell.x as usize, cell.y as usize, cell.z as usize);
    let mut corners = [None; 8];
    for (i, offset) in CUBE_CORNERS.iter().enumerate() {
        let (cx, cy, cz) = (x + offset[0], y + offset[1], z + offset[2]);
        if cx >= size || cy >= size || cz >= size {
            continue;
        }
        corners[i] = values.get(cx + cy * size + cz * size * size).copied();
    }
    corners
}

/// Estimate the surface inside one cell from its corner samples.
///
/// Returns `Ok(None)` when all sampled corners share a sign. Absent corners
/// take no part in the sign count or in edge crossings.
pub fn estimate_cell(corners: &[Option<f32>; 8], cell: UVec3) -> Result<Option<CellSurface>> {
    let mut sampled = 0;
    let mut negative = 0;
    for d in corners.iter().flatten() {
        sampled += 1;
        if *d < 0.0 {
            negative += 1;
        }
    }

    if negative == 0 || negative == sampled {
        return Ok(None);
    }

    let offset = centroid_of_edge_crossings(corners).ok_or(VoxelError::DegenerateCell {
        x: cell.x,
        y: cell.y,
        z: cell.z,
    })?;

    // The min corner is always inside the grid; absent corners borrow it so
    // their edges contribute no gradient.
    let base = corners[0].unwrap_or(0.0);
    let dists = corners.map(|d| d.unwrap_or(base));

    Ok(Some(CellSurface {
        offset,
        normal: sdf_gradient(&dists, offset),
    }))
}

/// Mean of the zero crossings on edges whose corners differ in sign.
///
/// `None` when no edge crosses.
pub fn centroid_of_edge_crossings(corners: &[Option<f32>; 8]) -> Option<Vec3> {
    let mut count = 0;
    let mut sum = Vec3::ZERO;

    for &(a, b) in &CUBE_EDGES {
        let (Some(d1), Some(d2)) = (corners[a], corners[b]) else {
            continue;
        };
        if (d1 < 0.0) != (d2 < 0.0) {
            count += 1;
            sum += edge_crossing(a, b, d1, d2);
        }
    }

    (count > 0).then(|| sum / count as f32)
}

/// Linear zero crossing between two corners with opposite signs.
#[inline]
pub fn edge_crossing(corner1: usize, corner2: usize, d1: f32, d2: f32) -> Vec3 {
    let t = d1 / (d1 - d2);
    (1.0 - t) * CUBE_CORNER_VECTORS[corner1] + t * CUBE_CORNER_VECTORS[corner2]
}

/// Approximate SDF gradient at offset `s` inside the cell.
///
/// Each component of `d00..d11` is the difference along one of the 12 edges;
/// the four edges parallel to each axis are blended bilinearly over the two
/// remaining axes.
pub fn sdf_gradient(dists: &[f32; 8], s: Vec3) -> Vec3 {
    let p00 = Vec3::new(dists[0b001], dists[0b010], dists[0b100]);
    let n00 = Vec3::splat(dists[0b000]);

    let p10 = Vec3::new(dists[0b101], dists[0b011], dists[0b110]);
    let n10 = Vec3::new(dists[0b100], dists[0b001], dists[0b010]);

    let p01 = Vec3::new(dists[0b011], dists[0b110], dists[0b101]);
    let n01 = Vec3::new(dists[0b010], dists[0b100], dists[0b001]);

    let p11 = Vec3::splat(dists[0b111]);
    let n11 = Vec3::new(dists[0b110], dists[0b101], dists[0b011]);

    let d00 = p00 - n00; // edges (0b00x, 0b0y0, 0bz00)
    let d10 = p10 - n10; // edges (0b10x, 0b0y1, 0bz10)
    let d01 = p01 - n01; // edges (0b01x, 0b1y0, 0bz01)
    let d11 = p11 - n11; // edges (0b11x, 0b1y1, 0bz11)

    let neg = Vec3::ONE - s;

    let gradient = neg.yzx() * neg.zxy() * d00
        + neg.yzx() * s.zxy() * d10
        + s.yzx() * neg.zxy() * d01
        + s.yzx() * s.zxy() * d11;
    gradient.normalize_or_zero()
}

fn validate_region(field: &VoxelField, region: Region) -> Result<()> {
    let size = field.size() as u32;
    if region.max.cmpgt(UVec3::splat(size)).any() {
        return Err(VoxelError::InvalidConfig(format!(
            "extraction region {:?}..{:?} exceeds grid of size {}",
            region.min, region.max, size
        )));
    }
    Ok(())
}

/// Estimate surface vertices for every cell of `region`.
///
/// Only cells that are dirty or were on the surface last pass are sampled;
/// all others are known to have no vertex. Clears `dirty` for every sampled
/// cell and updates `cached_on_surface` to the new result.
pub fn estimate_surface(
    field: &mut VoxelField,
    region: Region,
    batch: &mut SurfaceBatch,
) -> Result<EstimateStats> {
    validate_region(field, region)?;
    batch.reset(field.len());

    let size = field.size();
    let (values, dirty, cached) = field.estimator_view();
    let mut stats = EstimateStats {
        cells_scanned: region.cell_count(),
        ..Default::default()
    };

    for z in region.min.z..region.max.z {
        for y in region.min.y..region.max.y {
            for x in region.min.x..region.max.x {
                let cell = UVec3::new(x, y, z);
                let stride = x as usize + y as usize * size + z as usize * size * size;
                if !(dirty[stride] || cached[stride]) {
                    continue;
                }

                stats.cells_evaluated += 1;
                let surface = estimate_cell(&sample_corners(values, size, cell), cell)
                    .inspect_err(|e| error!("estimate_surface: {}", e))?;

                cached[stride] = surface.is_some();
                dirty[stride] = false;
                if let Some(surface) = surface {
                    batch.push(cell, stride, surface);
                }
            }
        }
    }

    stats.vertices = batch.vertex_count();
    debug!(
        "estimate_surface: scanned {} cells, evaluated {}, {} vertices",
        stats.cells_scanned, stats.cells_evaluated, stats.vertices
    );
    Ok(stats)
}

/// Cells of one z-slab that were sampled, in scan order.
type SlabResult = Vec<(UVec3, usize, Option<CellSurface>)>;

fn estimate_slab(
    values: &[f32],
    dirty: &[bool],
    cached: &[bool],
    size: usize,
    region: Region,
    z: u32,
) -> Result<SlabResult> {
    let mut cells = Vec::new();
    for y in region.min.y..region.max.y {
        for x in region.min.x..region.max.x {
            let cell = UVec3::new(x, y, z);
            let stride = x as usize + y as usize * size + z as usize * size * size;
            if dirty[stride] || cached[stride] {
                let surface = estimate_cell(&sample_corners(values, size, cell), cell)?;
                cells.push((cell, stride, surface));
            }
        }
    }
    Ok(cells)
}

/// Parallel variant of [`estimate_surface`].
///
/// Slabs of constant z are sampled on the rayon pool into per-slab buffers,
/// then merged in z order, so the output is identical to the sequential pass.
pub fn estimate_surface_parallel(
    field: &mut VoxelField,
    region: Region,
    batch: &mut SurfaceBatch,
) -> Result<EstimateStats> {
    validate_region(field, region)?;
    batch.reset(field.len());

    let size = field.size();
    let (values, dirty, cached) = field.estimator_view();
    let mut stats = EstimateStats {
        cells_scanned: region.cell_count(),
        ..Default::default()
    };
    if region.is_empty() {
        return Ok(stats);
    }

    let slabs: Vec<SlabResult> = {
        let dirty: &[bool] = &*dirty;
        let cached: &[bool] = &*cached;
        (region.min.z..region.max.z)
            .into_par_iter()
            .map(|z| estimate_slab(values, dirty, cached, size, region, z))
            .collect::<Result<Vec<_>>>()
            .inspect_err(|e| error!("estimate_surface_parallel: {}", e))?
    };

    for (cell, stride, surface) in slabs.into_iter().flatten() {
        stats.cells_evaluated += 1;
        cached[stride] = surface.is_some();
        dirty[stride] = false;
        if let Some(surface) = surface {
            batch.push(cell, stride, surface);
        }
    }

    stats.vertices = batch.vertex_count();
    debug!(
        "estimate_surface_parallel: scanned {} cells, evaluated {}, {} vertices",
        stats.cells_scanned, stats.cells_evaluated, stats.vertices
    );
    Ok(stats)
}
