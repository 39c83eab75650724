use glam::Vec3;

use super::pointer::PointerSample;
use crate::camera::PerspectiveCamera;
use crate::math::Plane;

/// Plane through the origin facing +Z, where pointer targets land
pub fn reference_plane() -> Plane {
    Plane::new(Vec3::Z, 0.0)
}

/// Casts the pointer into the scene; holds no per-frame state
#[derive(Debug, Clone, Copy)]
pub struct TargetProjector {
    plane: Plane,
}

impl TargetProjector {
    pub fn new(plane: Plane) -> Self {
        Self { plane }
    }

    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// World point under the pointer, `None` when the ray misses the plane
    pub fn project(&self, camera: &PerspectiveCamera, pointer: PointerSample) -> Option<Vec3> {
        camera
            .ray_through_ndc(pointer.as_vec2())
            .intersect_plane(&self.plane)
    }
}

impl Default for TargetProjector {
    fn default() -> Self {
        Self::new(reference_plane())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(35.0, 1.5, 1.0, 500.0);
        camera.position = Vec3::new(0.0, 0.0, 5.0);
        camera
    }

    #[test]
    fn centered_pointer_hits_origin() {
        let hit = TargetProjector::default()
            .project(&camera(), PointerSample::default())
            .unwrap();
        assert!(hit.length() < 1e-4, "got {hit:?}");
    }

    #[test]
    fn upper_pointer_hits_above_origin() {
        let hit = TargetProjector::default()
            .project(&camera(), PointerSample { x: 0.0, y: 1.0 })
            .unwrap();
        let expected = 5.0 * 17.5_f32.to_radians().tan();
        assert!(hit.z.abs() < 1e-4);
        assert!((hit.y - expected).abs() < 1e-3, "got {hit:?}");
    }

    #[test]
    fn plane_behind_camera_misses() {
        let mut camera = camera();
        camera.rotation = glam::Quat::from_rotation_y(std::f32::consts::PI);
        assert!(TargetProjector::default()
            .project(&camera, PointerSample::default())
            .is_none());
    }
}
