//! Error types for voxel field edits and surface extraction.

/// Errors that can occur while editing or meshing a voxel chunk.
///
/// `DegenerateCell` and `MissingQuadVertex` mean the dirty/cached-surface
/// bookkeeping went out of sync with the field. They are never skipped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VoxelError {
    #[error("Voxel ({x}, {y}, {z}) is outside a grid of size {size}")]
    OutOfBounds {
        x: usize,
        y: usize,
        z: usize,
        size: usize,
    },

    #[error("Cell ({x}, {y}, {z}) has mixed corner signs but no crossing edge")]
    DegenerateCell { x: u32, y: u32, z: u32 },

    #[error("Quad corner at stride {stride} has no surface vertex")]
    MissingQuadVertex { stride: usize },

    #[error("Invalid brush: {0}")]
    InvalidBrush(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias for voxel operations.
pub type Result<T> = std::result::Result<T, VoxelError>;
