//! Quad emission from surface cells.
//!
//! Every sign change between two neighboring voxels is surrounded by four
//! cells that all carry a vertex. For each surface cell we look at the three
//! voxel edges leaving its minimum corner in +X, +Y and +Z, and for each one
//! that crosses the surface we connect the four surrounding vertices into a
//! quad, split along its shorter diagonal.

use tracing::{debug, error};

use crate::error::{Result, VoxelError};
use crate::estimator::SurfaceBatch;
use crate::field::{Region, VoxelField};

/// Face axis and the two in-plane axes (B, C) for the +X, +Y and +Z faces.
const FACE_AXES: [(usize, usize, usize); 3] = [(0, 1, 2), (1, 2, 0), (2, 0, 1)];

/// Emit triangle indices for every surface cell of `batch`.
///
/// `region` must be the region the batch was estimated over. Appends to
/// `indices` and returns the number of quads emitted.
pub fn emit_quads(
    field: &VoxelField,
    region: Region,
    batch: &SurfaceBatch,
    indices: &mut Vec<u32>,
) -> Result<usize> {
    let strides = field.axis_strides();
    let values = field.values();
    let min = region.min.to_array();
    let max = region.max.to_array();
    let mut quads = 0;

    for (point, &p1) in batch.surface_points.iter().zip(&batch.surface_strides) {
        let cell = point.to_array();
        for &(axis, b, c) in &FACE_AXES {
            // The quad reaches back one cell along B and C, and the far voxel
            // must stay inside the scanned region.
            if cell[b] == min[b] || cell[c] == min[c] || cell[axis] + 1 == max[axis] {
                continue;
            }
            let p2 = p1 + strides[axis];
            if maybe_make_quad(values, batch, p1, p2, strides[b], strides[c], indices)? {
                quads += 1;
            }
        }
    }

    debug!(
        "emit_quads: {} surface cells -> {} quads ({} indices)",
        batch.surface_points.len(),
        quads,
        indices.len()
    );
    Ok(quads)
}

fn vertex(batch: &SurfaceBatch, stride: usize) -> Result<u32> {
    batch.vertex_at(stride).ok_or_else(|| {
        let err = VoxelError::MissingQuadVertex { stride };
        error!("emit_quads: {}", err);
        err
    })
}

/// Emit the quad around the voxel edge `p1 -> p2` if its ends differ in sign.
///
/// Returns whether a quad was emitted.
fn maybe_make_quad(
    values: &[f32],
    batch: &SurfaceBatch,
    p1: usize,
    p2: usize,
    axis_b_stride: usize,
    axis_c_stride: usize,
    indices: &mut Vec<u32>,
) -> Result<bool> {
    let d1 = values[p1];
    let d2 = values[p2];

    let negative_face = if d1 < 0.0 && d2 >= 0.0 {
        false
    } else if d1 >= 0.0 && d2 < 0.0 {
        true
    } else {
        return Ok(false);
    };

    let v1 = vertex(batch, p1)?;
    let v2 = vertex(batch, p1 - axis_b_stride)?;
    let v3 = vertex(batch, p1 - axis_c_stride)?;
    let v4 = vertex(batch, p1 - axis_b_stride - axis_c_stride)?;

    let pos = |v: u32| batch.positions[v as usize];
    let short_diagonal = pos(v1).distance_squared(pos(v4)) < pos(v2).distance_squared(pos(v3));

    let quad = match (short_diagonal, negative_face) {
        (true, true) => [v1, v4, v2, v1, v3, v4],
        (true, false) => [v1, v2, v4, v1, v4, v3],
        (false, true) => [v2, v3, v4, v2, v1, v3],
        (false, false) => [v2, v4, v3, v2, v3, v1],
    };
    indices.extend_from_slice(&quad);
    Ok(true)
}
