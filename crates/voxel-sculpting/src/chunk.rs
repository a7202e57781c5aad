//! A single editable chunk and its extraction pass.

use rayon::prelude::*;
use tracing::debug;
use voxel_config::{ChunkConfig, ExtractionConfig};

use crate::assembler::{assemble, MeshOutput};
use crate::deformation::apply_edit;
use crate::emitter::emit_quads;
use crate::error::Result;
use crate::estimator::{estimate_surface, estimate_surface_parallel, EstimateStats, SurfaceBatch};
use crate::field::{Region, VoxelField};
use crate::types::{FieldDelta, SurfaceEdit};

/// Voxel field plus the buffers reused across extraction passes.
#[derive(Debug, Clone)]
pub struct VoxelChunk {
    field: VoxelField,
    region: Region,
    batch: SurfaceBatch,
    indices: Vec<u32>,
    extraction: ExtractionConfig,
    last_stats: EstimateStats,
}

impl VoxelChunk {
    /// Create a chunk filled with the configured background value.
    pub fn new(config: &ChunkConfig) -> Result<Self> {
        let field = VoxelField::from_config(config)?;
        let region = field.interior_region(config.border);
        Ok(Self {
            field,
            region,
            batch: SurfaceBatch::new(),
            indices: Vec::new(),
            extraction: ExtractionConfig::default(),
            last_stats: EstimateStats::default(),
        })
    }

    /// Same chunk with a different extraction configuration.
    pub fn with_extraction(mut self, extraction: ExtractionConfig) -> Self {
        self.extraction = extraction;
        self
    }

    pub fn field(&self) -> &VoxelField {
        &self.field
    }

    /// Mutable access for direct voxel writes. Writes through
    /// [`VoxelField::set`] keep the dirty flags consistent.
    pub fn field_mut(&mut self) -> &mut VoxelField {
        &mut self.field
    }

    /// Cells scanned by each extraction pass.
    pub fn region(&self) -> Region {
        self.region
    }

    /// Vertices and cell lookups from the last pass.
    pub fn batch(&self) -> &SurfaceBatch {
        &self.batch
    }

    /// Estimator counters from the last pass.
    pub fn last_stats(&self) -> EstimateStats {
        self.last_stats
    }

    /// Apply a brush edit to the field.
    pub fn edit_surface(&mut self, edit: &SurfaceEdit) -> Result<FieldDelta> {
        apply_edit(&mut self.field, edit)
    }

    /// Run estimate, emit and assemble over the chunk region.
    pub fn extract(&mut self) -> Result<MeshOutput> {
        self.last_stats = if self.extraction.parallel_estimate {
            estimate_surface_parallel(&mut self.field, self.region, &mut self.batch)?
        } else {
            estimate_surface(&mut self.field, self.region, &mut self.batch)?
        };

        self.indices.clear();
        let quads = emit_quads(&self.field, self.region, &self.batch, &mut self.indices)?;

        let mesh = assemble(&self.batch, &self.indices);
        debug!(
            "extract: {} vertices, {} quads, {} triangles",
            mesh.vertex_count(),
            quads,
            mesh.triangle_count()
        );
        Ok(mesh)
    }
}

/// Extract every chunk on the rayon pool.
///
/// Each chunk is owned by exactly one task. Results are returned in input
/// order.
pub fn extract_chunks(chunks: &mut [VoxelChunk]) -> Vec<Result<MeshOutput>> {
    chunks.par_iter_mut().map(VoxelChunk::extract).collect()
}
