//! Voxel sculpting with Surface Nets extraction.
//!
//! This crate turns a dense signed distance field into a smooth triangle mesh
//! and lets the field be edited with CSG brushes:
//! - Sphere and cube brushes that union or subtract solid
//! - Dirty-cell tracking so unchanged regions are not resampled
//! - One vertex per surface cell, connected into quads across sign changes
//! - Exact-size mesh buffers ready for GPU upload
//!
//! # Architecture
//!
//! A [`VoxelChunk`] owns the field and the buffers reused between passes.
//! Each pass runs three stages in order: the estimator places vertices, the
//! emitter connects them, and the assembler packages the result. The
//! emitter depends on the estimator's cell lookup for the whole region, so a
//! pass is sequential; independent chunks mesh in parallel through
//! [`extract_chunks`].
//!
//! ## Key Components
//!
//! - **Field**: SDF values with dirty and cached-surface flags
//! - **Deformation**: Sphere/cube CSG brushes
//! - **Estimator**: Surface vertex and normal per cell
//! - **Emitter**: Quad connectivity and winding
//! - **Assembler**: Final buffers and bounds
//! - **Brush**: Animated brush growth
//! - **Pipeline**: Edit → step → remesh per frame

pub mod assembler;
pub mod brush;
pub mod chunk;
pub mod deformation;
pub mod emitter;
pub mod error;
pub mod estimator;
pub mod field;
pub mod pipeline;
pub mod tables;
pub mod types;

pub use assembler::{assemble, Aabb, MeshOutput};
pub use brush::BrushAnimation;
pub use chunk::{extract_chunks, VoxelChunk};
pub use deformation::{apply_edit, union_cube, union_sphere};
pub use emitter::emit_quads;
pub use error::{Result, VoxelError};
pub use estimator::{
    estimate_surface, estimate_surface_parallel, EstimateStats, SurfaceBatch, NO_VERTEX,
};
pub use field::{Region, VoxelField};
pub use pipeline::{AdvanceResult, SculptingPipeline};
pub use types::{BrushShape, CsgOp, FieldDelta, SurfaceEdit};
pub use voxel_config::{BrushConfig, ChunkConfig, ExtractionConfig, SculptConfig};
