//! Core sculpting types.
//!
//! These are the values exchanged with the input-handling collaborator:
//! an edit request in, a summary of what the edit wrote out.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::field::Region;

/// CSG operation applied by a brush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum CsgOp {
    /// Add solid: `field = min(field, brush)`
    #[default]
    Union = 0,
    /// Carve solid: `field = max(-brush, field)`
    Subtract = 1,
}

/// Shape of a brush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum BrushShape {
    /// Exact sphere distance
    #[default]
    Sphere = 0,
    /// Axis-aligned box with a binary inside/outside value
    Cube = 1,
}

/// A single brush edit request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceEdit {
    /// Brush center in voxel coordinates
    pub center: Vec3,
    /// Sphere radius, or cube edge length
    pub extent: f32,
    pub op: CsgOp,
    pub shape: BrushShape,
}

impl SurfaceEdit {
    /// Union a sphere of the given radius.
    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            extent: radius,
            op: CsgOp::Union,
            shape: BrushShape::Sphere,
        }
    }

    /// Union an axis-aligned cube with the given edge length.
    pub fn cube(center: Vec3, size: f32) -> Self {
        Self {
            center,
            extent: size,
            op: CsgOp::Union,
            shape: BrushShape::Cube,
        }
    }

    /// Same edit with a different CSG operation.
    pub fn with_op(mut self, op: CsgOp) -> Self {
        self.op = op;
        self
    }

    /// Same edit, carving instead of adding.
    pub fn subtract(self) -> Self {
        self.with_op(CsgOp::Subtract)
    }

    /// Same edit with a different extent.
    pub fn with_extent(mut self, extent: f32) -> Self {
        self.extent = extent;
        self
    }
}

/// Summary of one brush application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDelta {
    /// Voxels the brush visited (after clipping to the safe interior)
    pub region: Region,
    /// Number of voxels written
    pub voxels_written: usize,
    /// Number of voxels whose value actually changed
    pub voxels_changed: usize,
}

impl Default for FieldDelta {
    fn default() -> Self {
        Self {
            region: Region::empty(),
            voxels_written: 0,
            voxels_changed: 0,
        }
    }
}

impl FieldDelta {
    /// Whether the brush wrote nothing.
    pub fn is_empty(&self) -> bool {
        self.voxels_written == 0
    }

    /// Accumulate another delta into this one.
    pub fn merge(&mut self, other: &FieldDelta) {
        self.region = self.region.union(&other.region);
        self.voxels_written += other.voxels_written;
        self.voxels_changed += other.voxels_changed;
    }
}
