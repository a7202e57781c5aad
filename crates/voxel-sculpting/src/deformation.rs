//! CSG brush writers for the voxel field.
//!
//! Each brush visits a box around its center, clipped to `[1, N-1)` so the
//! one-voxel border of the chunk is never written, combines its own distance
//! with the stored one, and marks every visited voxel dirty.

use glam::{UVec3, Vec3};
use tracing::trace;

use crate::error::{Result, VoxelError};
use crate::field::{Region, VoxelField};
use crate::types::{BrushShape, CsgOp, FieldDelta, SurfaceEdit};

/// Distance written by the cube brush inside and outside the box.
pub const CUBE_INSIDE_VALUE: f32 = -10.0;
pub const CUBE_OUTSIDE_VALUE: f32 = 10.0;

/// Apply a [`SurfaceEdit`] to the field.
pub fn apply_edit(field: &mut VoxelField, edit: &SurfaceEdit) -> Result<FieldDelta> {
    let subtract = edit.op == CsgOp::Subtract;
    match edit.shape {
        BrushShape::Sphere => union_sphere(field, edit.center, edit.extent, subtract),
        BrushShape::Cube => apply_cube(field, edit.center, Vec3::splat(edit.extent), subtract),
    }
}

/// Combine a sphere with the field.
///
/// Union keeps `min(field, d)`, subtraction keeps `max(-d, field)` where
/// `d = |cell - center| - radius`. Visits `[center - (radius + 1), center + (radius + 1))`.
pub fn union_sphere(
    field: &mut VoxelField,
    center: Vec3,
    radius: f32,
    subtract: bool,
) -> Result<FieldDelta> {
    validate_brush(center, Vec3::splat(radius))?;

    let reach = Vec3::splat(radius + 1.0);
    let region = clip_to_interior(field, center - reach, center + reach);
    let delta = write_region(field, region, |pos, current| {
        let val = pos.distance(center) - radius;
        if subtract {
            (-val).max(current)
        } else {
            current.min(val)
        }
    });

    trace!(
        "union_sphere: center={:?} radius={} subtract={} -> {} written, {} changed",
        center, radius, subtract, delta.voxels_written, delta.voxels_changed
    );
    Ok(delta)
}

/// Union an axis-aligned box of edge lengths `size` with the field.
///
/// Voxels strictly inside the box get `-10`, all others `+10`. The visited
/// region uses the looser `size / 1.5` half-extent so the box boundary is
/// always covered.
pub fn union_cube(field: &mut VoxelField, center: Vec3, size: Vec3) -> Result<FieldDelta> {
    apply_cube(field, center, size, false)
}

fn apply_cube(
    field: &mut VoxelField,
    center: Vec3,
    size: Vec3,
    subtract: bool,
) -> Result<FieldDelta> {
    validate_brush(center, size)?;

    let reach = size / 1.5;
    let half = size / 2.0;
    let region = clip_to_interior(field, center - reach, center + reach);
    let delta = write_region(field, region, |pos, current| {
        let inside = pos.cmpgt(center - half).all() && pos.cmplt(center + half).all();
        let val = if inside {
            CUBE_INSIDE_VALUE
        } else {
            CUBE_OUTSIDE_VALUE
        };
        if subtract {
            (-val).max(current)
        } else {
            current.min(val)
        }
    });

    trace!(
        "cube brush: center={:?} size={:?} subtract={} -> {} written, {} changed",
        center, size, subtract, delta.voxels_written, delta.voxels_changed
    );
    Ok(delta)
}

pub(crate) fn validate_brush(center: Vec3, extent: Vec3) -> Result<()> {
    if !center.is_finite() {
        return Err(VoxelError::InvalidBrush(format!(
            "center {:?} is not finite",
            center
        )));
    }
    if !extent.is_finite() || extent.min_element() < 0.0 {
        return Err(VoxelError::InvalidBrush(format!(
            "extent {:?} must be finite and non-negative",
            extent
        )));
    }
    Ok(())
}

/// Integer box `[floor(min), ceil(max))` clipped to `[1, N-1)`.
fn clip_to_interior(field: &VoxelField, min: Vec3, max: Vec3) -> Region {
    let upper = field.size().saturating_sub(1) as f32;
    let lo = min.floor().max(Vec3::ONE).min(Vec3::splat(upper));
    let hi = max.ceil().min(Vec3::splat(upper)).max(lo);
    Region::new(lo.as_uvec3(), hi.as_uvec3())
}

fn write_region(
    field: &mut VoxelField,
    region: Region,
    combine: impl Fn(Vec3, f32) -> f32,
) -> FieldDelta {
    if region.is_empty() {
        return FieldDelta::default();
    }

    let mut delta = FieldDelta {
        region,
        ..Default::default()
    };
    for z in region.min.z..region.max.z {
        for y in region.min.y..region.max.y {
            for x in region.min.x..region.max.x {
                let (ux, uy, uz) = (x as usize, y as usize, z as usize);
                let current = field.values()[field.linearize(ux, uy, uz)];
                let value = combine(UVec3::new(x, y, z).as_vec3(), current);
                if field.write_brush(ux, uy, uz, value) {
                    delta.voxels_changed += 1;
                }
                delta.voxels_written += 1;
            }
        }
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> VoxelField {
        VoxelField::new(32, 10.0).unwrap()
    }

    #[test]
    fn test_sphere_union_carves_solid() {
        let mut f = field();
        let delta = union_sphere(&mut f, Vec3::splat(16.0), 4.0, false).unwrap();

        assert!(delta.voxels_changed > 0);
        assert_eq!(delta.region.min, UVec3::splat(11));
        assert_eq!(delta.region.max, UVec3::splat(21));
        assert_eq!(f.get(16, 16, 16).unwrap(), -4.0);
        assert_eq!(f.get(18, 16, 16).unwrap(), -2.0);
        assert_eq!(f.get(20, 16, 16).unwrap(), 0.0);
        // Outside the visited box nothing changes
        assert_eq!(f.get(25, 16, 16).unwrap(), 10.0);
    }

    #[test]
    fn test_sphere_union_is_idempotent() {
        let mut f = field();
        union_sphere(&mut f, Vec3::new(12.5, 14.0, 16.2), 5.0, false).unwrap();
        let once = f.values().to_vec();
        let delta = union_sphere(&mut f, Vec3::new(12.5, 14.0, 16.2), 5.0, false).unwrap();
        assert_eq!(f.values(), once.as_slice());
        assert_eq!(delta.voxels_changed, 0);
        assert!(delta.voxels_written > 0);
    }

    #[test]
    fn test_sphere_subtract_removes_matching_union() {
        let mut f = field();
        let center = Vec3::splat(16.0);
        union_sphere(&mut f, center, 5.0, false).unwrap();
        union_sphere(&mut f, center, 5.0, true).unwrap();

        assert!(f.values().iter().all(|&v| v >= 0.0));
        assert_eq!(f.get(16, 16, 16).unwrap(), 5.0);
        // Voxels the union left at background stay at background
        assert_eq!(f.get(16, 16, 28).unwrap(), 10.0);
        assert_eq!(f.get(5, 5, 5).unwrap(), 10.0);
    }

    #[test]
    fn test_sphere_subtract_into_solid() {
        let mut f = field();
        f.fill(-10.0);
        union_sphere(&mut f, Vec3::splat(16.0), 3.0, true).unwrap();
        assert_eq!(f.get(16, 16, 16).unwrap(), 3.0);
        assert_eq!(f.get(16, 16, 18).unwrap(), 1.0);
        // The visited box is half-open, so its upper face is untouched
        assert_eq!(f.get(16, 16, 20).unwrap(), -10.0);
    }

    #[test]
    fn test_brush_never_writes_border() {
        let mut f = field();
        let delta = union_sphere(&mut f, Vec3::ZERO, 6.0, false).unwrap();
        assert_eq!(delta.region.min, UVec3::ONE);
        assert_eq!(f.get(0, 0, 0).unwrap(), 10.0);
        assert_eq!(f.get(0, 1, 1).unwrap(), 10.0);
        assert!(f.get(1, 1, 1).unwrap() < 0.0);

        let delta = union_sphere(&mut f, Vec3::splat(31.0), 6.0, false).unwrap();
        assert_eq!(delta.region.max, UVec3::splat(31));
        assert_eq!(f.get(31, 31, 31).unwrap(), 10.0);
        assert!(f.get(30, 30, 30).unwrap() < 0.0);
    }

    #[test]
    fn test_brush_outside_grid_is_empty() {
        let mut f = field();
        let delta = union_sphere(&mut f, Vec3::splat(200.0), 3.0, false).unwrap();
        assert!(delta.is_empty());
        assert!(f.values().iter().all(|&v| v == 10.0));
    }

    #[test]
    fn test_brush_marks_dirty() {
        let mut f = field();
        f.estimator_view().1.fill(false);
        let delta = union_sphere(&mut f, Vec3::splat(10.0), 2.0, false).unwrap();
        let s = f.linearize(10, 10, 10);
        assert!(f.is_dirty(s));
        // The cell below the visited box also sees the change
        let below = f.linearize(
            delta.region.min.x as usize - 1,
            delta.region.min.y as usize - 1,
            delta.region.min.z as usize - 1,
        );
        assert!(f.is_dirty(below));
        assert!(!f.is_dirty(f.linearize(25, 25, 25)));
    }

    #[test]
    fn test_cube_union() {
        let mut f = field();
        union_cube(&mut f, Vec3::splat(16.0), Vec3::splat(4.0)).unwrap();
        assert_eq!(f.get(16, 16, 16).unwrap(), CUBE_INSIDE_VALUE);
        assert_eq!(f.get(15, 17, 15).unwrap(), CUBE_INSIDE_VALUE);
        // On the box face is not strictly inside
        assert_eq!(f.get(18, 16, 16).unwrap(), CUBE_OUTSIDE_VALUE);
        assert_eq!(f.get(14, 16, 16).unwrap(), CUBE_OUTSIDE_VALUE);
    }

    #[test]
    fn test_cube_region_uses_loose_bound() {
        let mut f = field();
        let delta = union_cube(&mut f, Vec3::splat(16.0), Vec3::splat(6.0)).unwrap();
        assert_eq!(delta.region.min, UVec3::splat(12));
        assert_eq!(delta.region.max, UVec3::splat(20));
    }

    #[test]
    fn test_apply_edit_dispatch() {
        let mut f = field();
        apply_edit(&mut f, &SurfaceEdit::cube(Vec3::splat(16.0), 4.0)).unwrap();
        assert_eq!(f.get(16, 16, 16).unwrap(), CUBE_INSIDE_VALUE);

        apply_edit(&mut f, &SurfaceEdit::cube(Vec3::splat(16.0), 4.0).subtract()).unwrap();
        assert_eq!(f.get(16, 16, 16).unwrap(), -CUBE_INSIDE_VALUE);

        apply_edit(&mut f, &SurfaceEdit::sphere(Vec3::splat(8.0), 2.0)).unwrap();
        assert_eq!(f.get(8, 8, 8).unwrap(), -2.0);
    }

    #[test]
    fn test_invalid_brush_rejected() {
        let mut f = field();
        assert!(matches!(
            union_sphere(&mut f, Vec3::splat(f32::NAN), 2.0, false),
            Err(VoxelError::InvalidBrush(_))
        ));
        assert!(union_sphere(&mut f, Vec3::splat(8.0), -1.0, false).is_err());
        assert!(union_cube(&mut f, Vec3::splat(8.0), Vec3::new(1.0, f32::INFINITY, 1.0)).is_err());
        assert!(f.values().iter().all(|&v| v == 10.0));
    }
}
