use glam::Vec3;

use crate::ray::Ray;

/// Entry/exit distances of a ray through a bounding volume.
///
/// `near` is clamped to zero: a ray starting inside the volume enters at its
/// own origin, never at a negative distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayInterval {
    pub near: f32,
    pub far: f32,
}

impl RayInterval {
    pub fn span(&self) -> f32 {
        self.far - self.near
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extents(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Slab test. Returns the clamped entry and the exit distance, or `None`
    /// when the ray misses the box entirely or the box lies behind it.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<RayInterval> {
        let inv = ray.direction.recip();
        let a = (self.min - ray.origin) * inv;
        let b = (self.max - ray.origin) * inv;
        let t_min = a.min(b).max_element();
        let t_max = a.max(b).min_element();

        let near = t_min.max(0.0);
        if t_max < near || t_max < t_min {
            return None;
        }
        Some(RayInterval { near, far: t_max })
    }

    /// Distance from an interior point to the box surface along `direction`.
    pub fn exit_distance(&self, point: Vec3, direction: Vec3) -> f32 {
        let inv = direction.recip();
        let a = (self.min - point) * inv;
        let b = (self.max - point) * inv;
        a.max(b).min_element().max(0.0)
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            min: Vec3::ZERO,
            max: Vec3::ZERO,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        self.center.distance_squared(point) <= self.radius * self.radius
    }

    /// Unclamped entry/exit distances; either may be negative.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, f32)> {
        let oc = ray.origin - self.center;
        let b = oc.dot(ray.direction);
        let c = oc.length_squared() - self.radius * self.radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let s = disc.sqrt();
        Some((-b - s, -b + s))
    }
}

/// A spherical annulus: the cloud layer between an inner and an outer radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shell {
    pub center: Vec3,
    pub inner_radius: f32,
    pub outer_radius: f32,
}

impl Shell {
    pub fn new(center: Vec3, inner_radius: f32, outer_radius: f32) -> Self {
        Self {
            center,
            inner_radius,
            outer_radius,
        }
    }

    fn outer(&self) -> Sphere {
        Sphere::new(self.center, self.outer_radius)
    }

    fn inner(&self) -> Sphere {
        Sphere::new(self.center, self.inner_radius)
    }

    /// Entry = max(0, outer-sphere entry). Exit = outer-sphere exit, carved
    /// back to the hollow core's near side when the core lies ahead of the
    /// entry point. A ray starting inside the core enters where it leaves
    /// the core.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<RayInterval> {
        let (o_near, o_far) = self.outer().intersect_ray(ray)?;
        if o_far <= 0.0 {
            return None;
        }
        let mut near = o_near.max(0.0);
        let mut far = o_far;

        if self.inner_radius > 0.0 {
            if let Some((i_near, i_far)) = self.inner().intersect_ray(ray) {
                if i_near > near {
                    far = far.min(i_near);
                } else if i_far > near {
                    near = i_far.min(far);
                }
            }
        }

        if far <= near {
            return None;
        }
        Some(RayInterval { near, far })
    }

    /// Distance from an interior point to the shell boundary along
    /// `direction`, stopping at the hollow core when it lies ahead.
    pub fn exit_distance(&self, point: Vec3, direction: Vec3) -> f32 {
        let ray = Ray {
            origin: point,
            direction,
        };
        let Some((_, o_far)) = self.outer().intersect_ray(&ray) else {
            return 0.0;
        };
        let mut far = o_far;
        if self.inner_radius > 0.0 {
            if let Some((i_near, _)) = self.inner().intersect_ray(&ray) {
                if i_near > 0.0 {
                    far = far.min(i_near);
                }
            }
        }
        far.max(0.0)
    }
}
