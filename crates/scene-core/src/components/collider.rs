//! Collision solids used by picking
//!
//! Shapes are expressed in the owning node's local space; the picker moves the
//! ray into that space before testing.

use crate::graph::Component;
use crate::math::{safe_normalize, project_on_plane, Ray, Vec3, AABB};

/// Bit mask selecting which colliders a pick ray may hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CollisionMask(pub u32);

impl CollisionMask {
    pub const NONE: Self = Self(0);
    /// Ordinary scene objects
    pub const SCENE: Self = Self(1);
    /// Manipulator handles
    pub const GIZMO: Self = Self(1 << 1);
    pub const ALL: Self = Self(u32::MAX);

    #[inline]
    pub fn intersects(self, other: CollisionMask) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub fn union(self, other: CollisionMask) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub fn intersection(self, other: CollisionMask) -> Self {
        Self(self.0 & other.0)
    }
}

impl Default for CollisionMask {
    fn default() -> Self {
        Self::SCENE
    }
}

/// Collision shape in node-local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionShape {
    Box(AABB),
    Sphere { center: Vec3, radius: f32 },
    /// Thickened segment, used for translate arrows and scale shafts
    Cylinder { start: Vec3, end: Vec3, radius: f32 },
    /// Flat annulus, used for rotation rings
    Ring {
        center: Vec3,
        normal: Vec3,
        radius: f32,
        thickness: f32,
    },
}

/// Intersection in node-local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalHit {
    pub point: Vec3,
    pub normal: Vec3,
}

impl CollisionShape {
    /// Intersect a ray already transformed into the shape's space.
    pub fn intersect(&self, ray: &Ray) -> Option<LocalHit> {
        match *self {
            CollisionShape::Box(aabb) => {
                let point = ray.at(ray.intersect_aabb(&aabb)?);
                Some(LocalHit {
                    point,
                    normal: box_face_normal(&aabb, point),
                })
            }
            CollisionShape::Sphere { center, radius } => {
                let point = ray.at(ray.intersect_sphere(center, radius)?);
                Some(LocalHit {
                    point,
                    normal: safe_normalize(point - center).unwrap_or(-ray.direction),
                })
            }
            CollisionShape::Cylinder { start, end, radius } => {
                let point = ray.at(ray.intersect_cylinder(start, end, radius)?);
                let axis = safe_normalize(end - start)?;
                let radial = project_on_plane(point - start, axis);
                Some(LocalHit {
                    point,
                    normal: safe_normalize(radial).unwrap_or(-ray.direction),
                })
            }
            CollisionShape::Ring {
                center,
                normal,
                radius,
                thickness,
            } => {
                let point = ray.at(ray.intersect_ring(center, normal, radius, thickness)?);
                let axis = safe_normalize(normal)?;
                // radial direction of the ring at the hit, i.e. the torus normal
                let radial = project_on_plane(point - center, axis);
                Some(LocalHit {
                    point,
                    normal: safe_normalize(radial).unwrap_or(axis),
                })
            }
        }
    }
}

fn box_face_normal(aabb: &AABB, point: Vec3) -> Vec3 {
    let half = ((aabb.max - aabb.min) * 0.5).max(Vec3::splat(f32::EPSILON));
    let rel = (point - aabb.center()) / half;
    let abs = rel.abs();
    if abs.x >= abs.y && abs.x >= abs.z {
        Vec3::X * rel.x.signum()
    } else if abs.y >= abs.z {
        Vec3::Y * rel.y.signum()
    } else {
        Vec3::Z * rel.z.signum()
    }
}

/// Collider component: a solid plus the mask it answers to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub shape: CollisionShape,
    pub mask: CollisionMask,
}

impl Collider {
    pub fn new(shape: CollisionShape, mask: CollisionMask) -> Self {
        Self { shape, mask }
    }

    /// Unit cube centered on the node, in the scene mask.
    pub fn unit_box() -> Self {
        Self::new(
            CollisionShape::Box(AABB::unit_cube(Vec3::ZERO, Vec3::ONE)),
            CollisionMask::SCENE,
        )
    }
}

impl Component for Collider {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_intersects() {
        assert!(CollisionMask::ALL.intersects(CollisionMask::GIZMO));
        assert!(!CollisionMask::SCENE.intersects(CollisionMask::GIZMO));
        assert!(CollisionMask::SCENE
            .union(CollisionMask::GIZMO)
            .intersects(CollisionMask::GIZMO));
    }

    #[test]
    fn test_box_hit_normal_faces_ray() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z).unwrap();
        let hit = Collider::unit_box().shape.intersect(&ray).unwrap();
        assert!((hit.point.z - 0.5).abs() < 1e-5);
        assert_eq!(hit.normal, Vec3::Z);
    }

    #[test]
    fn test_ring_normal_is_radial() {
        let ring = CollisionShape::Ring {
            center: Vec3::ZERO,
            normal: Vec3::Z,
            radius: 1.0,
            thickness: 0.1,
        };
        let ray = Ray::new(Vec3::new(0.0, 1.0, 5.0), Vec3::NEG_Z).unwrap();
        let hit = ring.intersect(&ray).unwrap();
        assert!((hit.normal - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_cylinder_normal_is_perpendicular() {
        let shape = CollisionShape::Cylinder {
            start: Vec3::ZERO,
            end: Vec3::X,
            radius: 0.1,
        };
        let ray = Ray::new(Vec3::new(0.5, 0.0, 5.0), Vec3::NEG_Z).unwrap();
        let hit = shape.intersect(&ray).unwrap();
        assert!(hit.normal.dot(Vec3::X).abs() < 1e-5);
    }
}
