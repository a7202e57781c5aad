//! Shared configuration for voxel sculpting
//!
//! This crate provides the single source of truth for chunk dimensions,
//! brush growth and extraction settings. Everything here is plain data with
//! defaults; validation against the voxel grid happens in `voxel-sculpting`.

use serde::{Deserialize, Serialize};

#[cfg(feature = "bevy")]
use bevy::prelude::Resource;

/// Default chunk side length in voxels
pub const DEFAULT_CHUNK_SIZE: usize = 64;

/// Default distance value for voxels no brush has touched
pub const DEFAULT_BACKGROUND: f32 = 10.0;

/// Default width of the unevaluated border around a chunk, in voxels
pub const DEFAULT_BORDER: usize = 1;

/// Default brush extent at the first animation step
pub const DEFAULT_START_EXTENT: f32 = 1.0;

/// Default upper bound on an animated brush extent
pub const DEFAULT_MAX_EXTENT: f32 = 5.0;

/// Default brush growth in extent units per second
pub const DEFAULT_GROWTH_RATE: f32 = 15.0;

/// Dense voxel chunk configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[cfg_attr(feature = "bevy", derive(Resource))]
pub struct ChunkConfig {
    /// Side length of the cubic grid
    pub size: usize,
    /// Initial distance stored in every voxel
    pub background: f32,
    /// Voxels left unevaluated on each face of the chunk
    pub border: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_CHUNK_SIZE,
            background: DEFAULT_BACKGROUND,
            border: DEFAULT_BORDER,
        }
    }
}

impl ChunkConfig {
    /// Create a chunk config with the given side length
    pub fn new(size: usize) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    /// Total number of voxels in the chunk
    pub fn voxel_count(&self) -> usize {
        self.size * self.size * self.size
    }
}

/// Animated brush growth configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[cfg_attr(feature = "bevy", derive(Resource))]
pub struct BrushConfig {
    /// Extent applied at the first step
    pub start_extent: f32,
    /// Largest extent an animation may reach
    pub max_extent: f32,
    /// Extent units added per second of animation
    pub growth_rate: f32,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            start_extent: DEFAULT_START_EXTENT,
            max_extent: DEFAULT_MAX_EXTENT,
            growth_rate: DEFAULT_GROWTH_RATE,
        }
    }
}

/// Surface extraction configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[cfg_attr(feature = "bevy", derive(Resource))]
pub struct ExtractionConfig {
    /// Estimate z-slabs on the rayon pool instead of a single scan
    pub parallel_estimate: bool,
}

/// Complete configuration for a sculpting pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[cfg_attr(feature = "bevy", derive(Resource))]
pub struct SculptConfig {
    pub chunk: ChunkConfig,
    pub brush: BrushConfig,
    pub extraction: ExtractionConfig,
}
