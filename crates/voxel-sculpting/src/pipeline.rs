//! Sculpting pipeline orchestration.
//!
//! This module coordinates the per-frame workflow for one chunk:
//! 1. Edit requests → immediate field writes, or brush animations
//! 2. Active animations → one growth step per frame
//! 3. Field writes → re-extraction of the chunk mesh
//!
//! The mesh handed to the renderer is only replaced after a full, successful
//! extraction pass.

use glam::Vec3;
use tracing::{debug, error};
use voxel_config::SculptConfig;

use crate::assembler::MeshOutput;
use crate::brush::{validate_time_step, BrushAnimation};
use crate::chunk::VoxelChunk;
use crate::deformation::validate_brush;
use crate::error::Result;
use crate::types::{FieldDelta, SurfaceEdit};

/// Radius of both spheres in the two-sphere scene.
pub const SCENE_SPHERE_RADIUS: f32 = 10.0;

/// Centers of the two-sphere scene.
pub const SCENE_SPHERE_CENTERS: [Vec3; 2] =
    [Vec3::new(25.0, 25.0, 25.0), Vec3::new(35.0, 25.0, 25.0)];

/// Result of advancing the pipeline by one frame.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct AdvanceResult {
    /// Brush steps applied this frame.
    pub steps_applied: usize,
    /// Brushes that finished this frame.
    pub brushes_finished: usize,
    /// Brushes dropped this frame because a step failed.
    pub brushes_failed: usize,
    /// Combined write summary of all steps.
    pub delta: FieldDelta,
    /// Whether the mesh was re-extracted.
    pub remeshed: bool,
}

/// The sculpting pipeline owns a chunk, its brush animations and the last
/// extracted mesh.
#[derive(Debug)]
pub struct SculptingPipeline {
    /// Pipeline configuration.
    pub config: SculptConfig,
    chunk: VoxelChunk,
    brushes: Vec<BrushAnimation>,
    last_mesh: MeshOutput,
}

impl SculptingPipeline {
    /// Create a pipeline over an empty chunk.
    pub fn new(config: SculptConfig) -> Result<Self> {
        let chunk = VoxelChunk::new(&config.chunk)?.with_extraction(config.extraction.clone());
        Ok(Self {
            config,
            chunk,
            brushes: Vec::new(),
            last_mesh: MeshOutput::default(),
        })
    }

    /// Create a pipeline with two overlapping spheres already meshed.
    pub fn two_sphere_scene(config: SculptConfig) -> Result<Self> {
        let mut pipeline = Self::new(config)?;
        for center in SCENE_SPHERE_CENTERS {
            pipeline
                .chunk
                .edit_surface(&SurfaceEdit::sphere(center, SCENE_SPHERE_RADIUS))?;
        }
        pipeline.remesh()?;
        Ok(pipeline)
    }

    pub fn chunk(&self) -> &VoxelChunk {
        &self.chunk
    }

    /// Mesh from the last successful extraction.
    pub fn last_mesh(&self) -> &MeshOutput {
        &self.last_mesh
    }

    /// Whether any brush animation is still running.
    pub fn is_brush_active(&self) -> bool {
        !self.brushes.is_empty()
    }

    /// Number of running brush animations.
    pub fn active_brush_count(&self) -> usize {
        self.brushes.len()
    }

    /// Apply an edit at full size and remesh.
    pub fn edit_surface(&mut self, edit: SurfaceEdit) -> Result<FieldDelta> {
        let delta = self.chunk.edit_surface(&edit)?;
        if !delta.is_empty() {
            self.remesh()?;
        }
        Ok(delta)
    }

    /// Start an animated brush. Nothing is written until the next
    /// [`advance`](Self::advance).
    ///
    /// Rejects non-finite centers and negative or non-finite extents.
    pub fn begin_brush(&mut self, edit: SurfaceEdit) -> Result<()> {
        validate_brush(edit.center, Vec3::splat(edit.extent))?;
        debug!("begin_brush: {:?} at {:?}", edit.shape, edit.center);
        self.brushes.push(BrushAnimation::new(edit, &self.config.brush));
        Ok(())
    }

    /// Stop every running brush animation.
    pub fn cancel_brushes(&mut self) {
        self.brushes.clear();
    }

    /// Step every active brush by `dt` seconds and remesh if any step wrote
    /// to the field. Finished brushes are dropped.
    ///
    /// A brush whose step fails is dropped while the others keep stepping;
    /// the mesh is still rebuilt for the steps that succeeded, then the first
    /// failure is returned.
    pub fn advance(&mut self, dt: f32) -> Result<AdvanceResult> {
        validate_time_step(dt)?;

        let mut result = AdvanceResult::default();
        let mut failure = None;
        let field = self.chunk.field_mut();

        self.brushes.retain_mut(|brush| match brush.advance(field, dt) {
            Ok(Some(delta)) => {
                result.steps_applied += 1;
                result.delta.merge(&delta);
                if brush.is_finished() {
                    result.brushes_finished += 1;
                }
                !brush.is_finished()
            }
            Ok(None) => {
                result.brushes_finished += 1;
                false
            }
            Err(e) => {
                error!("dropping brush at {:?}: {}", brush.center(), e);
                result.brushes_failed += 1;
                if failure.is_none() {
                    failure = Some(e);
                }
                false
            }
        });

        if !result.delta.is_empty() {
            self.remesh()?;
            result.remeshed = true;
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(result),
        }
    }

    /// Re-extract the chunk mesh.
    ///
    /// On failure the previous mesh is kept.
    pub fn remesh(&mut self) -> Result<&MeshOutput> {
        match self.chunk.extract() {
            Ok(mesh) => {
                self.last_mesh = mesh;
                Ok(&self.last_mesh)
            }
            Err(e) => {
                error!("remesh failed, keeping previous mesh: {}", e);
                Err(e)
            }
        }
    }
}
