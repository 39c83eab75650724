mod aabb;
mod ray;

pub use aabb::AABB;
pub use ray::{Plane, Ray};
