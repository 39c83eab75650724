use glam::Vec3;

const PARALLEL_EPSILON: f32 = 1e-6;

/// Half-line starting at `origin` and extending along `direction`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray; the direction is normalized
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Distance along the ray to `plane`, if the ray reaches it
    pub fn distance_to_plane(&self, plane: &Plane) -> Option<f32> {
        let denominator = plane.normal.dot(self.direction);

        if denominator.abs() < PARALLEL_EPSILON {
            // Parallel: only a hit when the ray lies inside the plane
            return if plane.distance_to_point(self.origin) == 0.0 {
                Some(0.0)
            } else {
                None
            };
        }

        let t = -(self.origin.dot(plane.normal) + plane.constant) / denominator;
        if t >= 0.0 {
            Some(t)
        } else {
            None
        }
    }

    pub fn intersect_plane(&self, plane: &Plane) -> Option<Vec3> {
        self.distance_to_plane(plane).map(|t| self.at(t))
    }
}

/// Infinite plane `normal · p + constant = 0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub constant: f32,
}

impl Plane {
    pub fn new(normal: Vec3, constant: f32) -> Self {
        Self {
            normal: normal.normalize_or_zero(),
            constant,
        }
    }

    /// Signed distance from `point` to the plane
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.constant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_hits_plane_head_on() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let plane = Plane::new(Vec3::Z, 0.0);
        let hit = ray.intersect_plane(&plane).unwrap();
        assert!((hit - Vec3::ZERO).length() < 1e-6);
    }

    #[test]
    fn test_ray_parallel_to_plane() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::X);
        let plane = Plane::new(Vec3::Z, 0.0);
        assert!(ray.intersect_plane(&plane).is_none());
    }

    #[test]
    fn test_ray_inside_plane() {
        let ray = Ray::new(Vec3::new(1.0, 2.0, 0.0), Vec3::X);
        let plane = Plane::new(Vec3::Z, 0.0);
        assert_eq!(ray.intersect_plane(&plane), Some(Vec3::new(1.0, 2.0, 0.0)));
    }

    #[test]
    fn test_plane_behind_ray() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        let plane = Plane::new(Vec3::Z, 0.0);
        assert!(ray.intersect_plane(&plane).is_none());
    }

    #[test]
    fn test_oblique_hit() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 4.0), Vec3::new(1.0, 0.0, -1.0));
        let plane = Plane::new(Vec3::Z, 0.0);
        let hit = ray.intersect_plane(&plane).unwrap();
        assert!((hit - Vec3::new(4.0, 0.0, 0.0)).length() < 1e-4);
    }
}
