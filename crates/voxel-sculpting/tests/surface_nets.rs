//! End-to-end extraction scenarios on full-size chunks.

use glam::Vec3;
use voxel_sculpting::{
    extract_chunks, ChunkConfig, MeshOutput, SculptConfig, SculptingPipeline, SurfaceEdit,
    VoxelChunk,
};

fn chunk() -> VoxelChunk {
    VoxelChunk::new(&ChunkConfig::default()).unwrap()
}

fn assert_valid_mesh(mesh: &MeshOutput) {
    assert_eq!(mesh.indices.len() % 6, 0);
    assert_eq!(mesh.vertices.len(), mesh.normals.len());
    for &i in &mesh.indices {
        assert!((i as usize) < mesh.vertex_count());
    }
    for n in &mesh.normals {
        assert!(n.is_finite());
    }
}

#[test]
fn test_single_sphere_vertices_near_surface() {
    let center = Vec3::splat(25.0);
    let mut c = chunk();
    c.edit_surface(&SurfaceEdit::sphere(center, 10.0)).unwrap();
    let mesh = c.extract().unwrap();

    assert!(mesh.vertex_count() > 0);
    assert_valid_mesh(&mesh);
    let diagonal = 3.0f32.sqrt();
    for v in &mesh.vertices {
        let r = v.distance(center);
        assert!(r <= 10.0 + diagonal, "vertex {:?} at distance {}", v, r);
        assert!(r >= 10.0 - diagonal, "vertex {:?} at distance {}", v, r);
    }

    // Normals point away from the sphere center
    let outward = mesh
        .vertices
        .iter()
        .zip(&mesh.normals)
        .filter(|(v, n)| n.dot(**v - center) > 0.0)
        .count();
    assert_eq!(outward, mesh.vertex_count());
}

#[test]
fn test_two_disjoint_spheres() {
    let left = Vec3::new(16.0, 32.0, 32.0);
    let right = Vec3::new(46.0, 32.0, 32.0);
    let mut c = chunk();
    c.edit_surface(&SurfaceEdit::sphere(left, 8.0)).unwrap();
    c.edit_surface(&SurfaceEdit::sphere(right, 8.0)).unwrap();
    let mesh = c.extract().unwrap();
    assert_valid_mesh(&mesh);

    let is_left = |i: u32| mesh.vertices[i as usize].x < 31.0;
    let left_count = mesh.vertices.iter().filter(|v| v.x < 31.0).count();
    assert!(left_count > 0);
    assert!(left_count < mesh.vertex_count());
    for v in &mesh.vertices {
        assert!(v.distance(left) < 8.0 + 2.0 || v.distance(right) < 8.0 + 2.0);
    }

    for tri in mesh.indices.chunks(3) {
        let side = is_left(tri[0]);
        assert!(tri.iter().all(|&i| is_left(i) == side));
    }
}

#[test]
fn test_repeated_extraction_is_identical() {
    let mut c = chunk();
    c.edit_surface(&SurfaceEdit::sphere(Vec3::new(30.0, 28.0, 33.0), 9.0))
        .unwrap();
    let first = c.extract().unwrap();
    let second = c.extract().unwrap();
    let third = c.extract().unwrap();
    assert_eq!(first, second);
    assert_eq!(second, third);
}

#[test]
fn test_incremental_remesh_matches_full_remesh() {
    let edits = [
        SurfaceEdit::sphere(Vec3::splat(30.0), 10.0),
        SurfaceEdit::cube(Vec3::new(38.0, 30.0, 30.0), 8.0),
        SurfaceEdit::sphere(Vec3::new(24.0, 30.0, 30.0), 4.0).subtract(),
        SurfaceEdit::sphere(Vec3::new(30.0, 40.0, 30.0), 3.0),
    ];

    let mut incremental = chunk();
    for edit in &edits {
        incremental.edit_surface(edit).unwrap();
        incremental.extract().unwrap();
    }
    let incremental_mesh = incremental.extract().unwrap();

    let mut full = chunk();
    for edit in &edits {
        full.edit_surface(edit).unwrap();
    }
    let full_mesh = full.extract().unwrap();

    assert_eq!(incremental.field().values(), full.field().values());
    assert_eq!(incremental_mesh, full_mesh);
    assert_valid_mesh(&full_mesh);
}

#[test]
fn test_subtract_everything_leaves_no_mesh() {
    let mut c = chunk();
    let center = Vec3::splat(32.0);
    c.edit_surface(&SurfaceEdit::sphere(center, 8.0)).unwrap();
    assert!(!c.extract().unwrap().is_empty());

    c.edit_surface(&SurfaceEdit::sphere(center, 8.0).subtract())
        .unwrap();
    let mesh = c.extract().unwrap();
    assert!(mesh.is_empty());
    assert_eq!(mesh.vertex_count(), 0);
}

#[test]
fn test_parallel_chunks_match_sequential() {
    let mut chunks: Vec<VoxelChunk> = (0..3).map(|_| chunk()).collect();
    for (i, c) in chunks.iter_mut().enumerate() {
        let center = Vec3::new(20.0 + i as f32 * 8.0, 30.0, 30.0);
        c.edit_surface(&SurfaceEdit::sphere(center, 6.0)).unwrap();
    }

    let mut sequential = chunks.clone();
    let expected: Vec<MeshOutput> = sequential
        .iter_mut()
        .map(|c| c.extract().unwrap())
        .collect();

    let meshes: Vec<MeshOutput> = extract_chunks(&mut chunks)
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(meshes, expected);
}

#[test]
fn test_animated_brush_on_two_sphere_scene() {
    let mut pipeline = SculptingPipeline::two_sphere_scene(SculptConfig::default()).unwrap();
    let before = pipeline.last_mesh().clone();
    assert_valid_mesh(&before);

    pipeline
        .begin_brush(SurfaceEdit::sphere(Vec3::new(30.0, 36.0, 25.0), 5.0))
        .unwrap();
    let mut frames = 0;
    while pipeline.is_brush_active() {
        pipeline.advance(1.0 / 60.0).unwrap();
        frames += 1;
        assert!(frames < 1000);
    }

    let after = pipeline.last_mesh();
    assert_valid_mesh(after);
    assert_ne!(after, &before);
    assert!(after.bounds.max.y > before.bounds.max.y);
}
