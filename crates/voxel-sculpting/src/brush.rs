//! Animated brush growth.
//!
//! A brush placed by the user does not land at full size; it is re-applied
//! every frame with a growing extent until it reaches its target.

use glam::Vec3;
use tracing::trace;
use voxel_config::BrushConfig;

use crate::deformation::apply_edit;
use crate::error::{Result, VoxelError};
use crate::field::VoxelField;
use crate::types::{FieldDelta, SurfaceEdit};

/// A brush edit applied repeatedly with a growing extent.
#[derive(Debug, Clone, PartialEq)]
pub struct BrushAnimation {
    edit: SurfaceEdit,
    extent: f32,
    target_extent: f32,
    growth_rate: f32,
    steps: u32,
    finished: bool,
}

impl BrushAnimation {
    /// Start an animation growing toward `edit.extent`.
    ///
    /// The target is capped at `config.max_extent` and the center is rounded
    /// up to whole voxels.
    pub fn new(edit: SurfaceEdit, config: &BrushConfig) -> Self {
        let target_extent = edit.extent.min(config.max_extent);
        Self {
            edit: SurfaceEdit {
                center: edit.center.ceil(),
                ..edit
            },
            extent: config.start_extent.min(target_extent),
            target_extent,
            growth_rate: config.growth_rate,
            steps: 0,
            finished: false,
        }
    }

    /// Center the brush is applied at.
    pub fn center(&self) -> Vec3 {
        self.edit.center
    }

    /// Extent the next step will apply.
    pub fn extent(&self) -> f32 {
        self.extent
    }

    /// Extent the animation stops at.
    pub fn target_extent(&self) -> f32 {
        self.target_extent
    }

    /// Number of steps applied so far.
    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Apply one step at the current extent, then grow by `dt * growth_rate`.
    ///
    /// The last step applies exactly the target extent. Returns `None` once
    /// the animation has finished.
    pub fn advance(&mut self, field: &mut VoxelField, dt: f32) -> Result<Option<FieldDelta>> {
        if self.finished {
            return Ok(None);
        }
        validate_time_step(dt)?;

        let delta = apply_edit(field, &self.edit.with_extent(self.extent))?;
        self.steps += 1;
        trace!(
            "brush step {}: center={:?} extent={} -> {} changed",
            self.steps, self.edit.center, self.extent, delta.voxels_changed
        );

        if self.extent >= self.target_extent {
            self.finished = true;
        } else {
            self.extent = (self.extent + dt * self.growth_rate).min(self.target_extent);
        }
        Ok(Some(delta))
    }
}

pub(crate) fn validate_time_step(dt: f32) -> Result<()> {
    if !dt.is_finite() || dt < 0.0 {
        return Err(VoxelError::InvalidBrush(format!(
            "time step {} must be finite and non-negative",
            dt
        )));
    }
    Ok(())
}
