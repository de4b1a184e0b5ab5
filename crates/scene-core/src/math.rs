//! Ray, plane and solid intersection helpers
//!
//! Every direction that gets normalized here goes through [`safe_normalize`],
//! so a gizmo sitting on top of the camera or a zero-length axis never
//! produces NaNs.

pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

/// Lengths below this are treated as zero.
pub const EPSILON: f32 = 1e-6;

/// Normalize `v`, or `None` if it is too short to have a direction.
#[inline]
pub fn safe_normalize(v: Vec3) -> Option<Vec3> {
    let len = v.length();
    if len > EPSILON && len.is_finite() {
        Some(v / len)
    } else {
        None
    }
}

/// Ray for raycasting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin point
    pub origin: Vec3,
    /// Ray direction (unit length)
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray. Returns `None` for a zero-length direction.
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        Some(Self {
            origin,
            direction: safe_normalize(direction)?,
        })
    }

    /// Point at distance `t` along the ray
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Transform the ray by an affine matrix (e.g. world -> node-local).
    pub fn transformed(&self, matrix: &Mat4) -> Option<Ray> {
        Ray::new(
            matrix.transform_point3(self.origin),
            matrix.transform_vector3(self.direction),
        )
    }

    /// Check intersection with AABB using slab method
    /// Returns the distance to intersection point if hit, None otherwise
    pub fn intersect_aabb(&self, aabb: &AABB) -> Option<f32> {
        let inv = |d: f32| if d.abs() > f32::EPSILON { 1.0 / d } else { f32::MAX };
        let inv_dir = Vec3::new(
            inv(self.direction.x),
            inv(self.direction.y),
            inv(self.direction.z),
        );

        let t1 = (aabb.min - self.origin) * inv_dir;
        let t2 = (aabb.max - self.origin) * inv_dir;

        let tmin_vec = t1.min(t2);
        let tmax_vec = t1.max(t2);

        let tmin = tmin_vec.x.max(tmin_vec.y).max(tmin_vec.z);
        let tmax = tmax_vec.x.min(tmax_vec.y).min(tmax_vec.z);

        if tmax >= tmin && tmax >= 0.0 {
            Some(tmin.max(0.0))
        } else {
            None
        }
    }

    /// Distance to a sphere surface, if hit in front of the origin.
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let sqrt_disc = disc.sqrt();
        [-b - sqrt_disc, -b + sqrt_disc]
            .into_iter()
            .find(|t| *t >= 0.0)
    }

    /// Finite cylinder (a thickened segment) intersection.
    pub fn intersect_cylinder(&self, start: Vec3, end: Vec3, radius: f32) -> Option<f32> {
        let axis = end - start;
        let axis_len = axis.length();
        let axis_dir = safe_normalize(axis)?;

        let oc = self.origin - start;

        // only the components perpendicular to the cylinder axis matter
        let ray_perp = self.direction - axis_dir * self.direction.dot(axis_dir);
        let oc_perp = oc - axis_dir * oc.dot(axis_dir);

        let a = ray_perp.dot(ray_perp);
        if a < EPSILON {
            return None;
        }
        let b = 2.0 * ray_perp.dot(oc_perp);
        let c = oc_perp.dot(oc_perp) - radius * radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_disc = discriminant.sqrt();
        let t1 = (-b - sqrt_disc) / (2.0 * a);
        let t2 = (-b + sqrt_disc) / (2.0 * a);

        for t in [t1, t2] {
            if t < 0.0 {
                continue;
            }
            let projection = (self.at(t) - start).dot(axis_dir);
            if (0.0..=axis_len).contains(&projection) {
                return Some(t);
            }
        }

        None
    }

    /// Flat ring (annulus of `radius ± thickness`) lying in the plane `normal`.
    pub fn intersect_ring(
        &self,
        center: Vec3,
        normal: Vec3,
        radius: f32,
        thickness: f32,
    ) -> Option<f32> {
        let plane = Plane::new(center, normal)?;
        let t = plane.intersect_distance(self)?;
        let dist = (self.at(t) - center).length();
        ((dist - radius).abs() <= thickness).then_some(t)
    }
}

/// Infinite plane through `point` with unit `normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub point: Vec3,
    pub normal: Vec3,
}

impl Plane {
    /// `None` if the normal is degenerate.
    pub fn new(point: Vec3, normal: Vec3) -> Option<Self> {
        Some(Self {
            point,
            normal: safe_normalize(normal)?,
        })
    }

    /// Distance along the ray to the plane. `None` when parallel or behind.
    pub fn intersect_distance(&self, ray: &Ray) -> Option<f32> {
        let denom = ray.direction.dot(self.normal);
        if denom.abs() < EPSILON {
            return None;
        }
        let t = (self.point - ray.origin).dot(self.normal) / denom;
        (t >= 0.0).then_some(t)
    }

    /// Intersection point of the ray and the plane.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<Vec3> {
        self.intersect_distance(ray).map(|t| ray.at(t))
    }

    /// Orthogonal projection of `point` onto the plane.
    pub fn project_point(&self, point: Vec3) -> Vec3 {
        point - self.normal * (point - self.point).dot(self.normal)
    }
}

/// Axis-Aligned Bounding Box
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AABB {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Create a box centered at position with given size
    pub fn unit_cube(center: Vec3, scale: Vec3) -> Self {
        let half = scale * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Check if a point is inside the AABB
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// Remove the component of `v` along `normal` (which must be unit length).
#[inline]
pub fn project_on_plane(v: Vec3, normal: Vec3) -> Vec3 {
    v - normal * v.dot(normal)
}

/// Closest point to `point` on the infinite line through `origin` along `direction`.
pub fn project_point_on_line(point: Vec3, origin: Vec3, direction: Vec3) -> Option<Vec3> {
    let dir = safe_normalize(direction)?;
    Some(origin + dir * (point - origin).dot(dir))
}

/// Rotate `v` by `angle` radians about an arbitrary `axis`.
pub fn rotate_about_axis(v: Vec3, axis: Vec3, angle: f32) -> Option<Vec3> {
    let axis = safe_normalize(axis)?;
    Some(Quat::from_axis_angle(axis, angle) * v)
}

/// Unsigned angle between two vectors in degrees.
pub fn angle_between_deg(a: Vec3, b: Vec3) -> Option<f32> {
    let a = safe_normalize(a)?;
    let b = safe_normalize(b)?;
    Some(a.dot(b).clamp(-1.0, 1.0).acos().to_degrees())
}
