//! Final mesh buffers for the rendering and physics collaborators.
//!
//! The estimator and emitter reuse their buffers between passes, so the
//! assembler copies their contents into vectors sized exactly to content and
//! computes the bounding box of the vertices.

#[cfg(feature = "bevy")]
use bevy::asset::RenderAssetUsages;
#[cfg(feature = "bevy")]
use bevy::mesh::{Indices, PrimitiveTopology};
#[cfg(feature = "bevy")]
use bevy::prelude::Mesh;

use glam::Vec3;

use crate::estimator::SurfaceBatch;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min/max corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB that contains nothing (for accumulation).
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(f32::MIN),
        }
    }

    /// Whether no point has been included yet.
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    /// Expand this AABB to include a point.
    pub fn include_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Bounds of a set of points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        let mut bounds = Self::empty();
        for point in points {
            bounds.include_point(*point);
        }
        bounds
    }

    /// Check if this AABB contains a point.
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Get the center of this AABB.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the size (extent) of this AABB.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Triangle mesh extracted from one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshOutput {
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// Triangle list, three indices per triangle
    pub indices: Vec<u32>,
    pub bounds: Aabb,
}

impl Default for MeshOutput {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
            bounds: Aabb::empty(),
        }
    }
}

impl MeshOutput {
    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Whether the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Vertex positions as raw bytes for buffer upload.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Vertex normals as raw bytes for buffer upload.
    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    /// Indices as raw bytes for buffer upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Convert into a Bevy triangle-list mesh.
    #[cfg(feature = "bevy")]
    pub fn to_bevy_mesh(&self) -> Mesh {
        let positions: Vec<[f32; 3]> = self.vertices.iter().map(|v| v.to_array()).collect();
        let normals: Vec<[f32; 3]> = self.normals.iter().map(|n| n.to_array()).collect();

        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        );
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
        mesh.insert_indices(Indices::U32(self.indices.clone()));
        mesh
    }
}

/// Package a surface batch and its index buffer into exact-size buffers.
pub fn assemble(batch: &SurfaceBatch, indices: &[u32]) -> MeshOutput {
    let vertices = batch.positions.as_slice().to_vec();
    let normals = batch.normals.as_slice().to_vec();
    let bounds = Aabb::from_points(&vertices);

    MeshOutput {
        vertices,
        normals,
        indices: indices.to_vec(),
        bounds,
    }
}
