//! # Object Picking System
//!
//! Mouse ray-casting against scene meshes.
//!
//! ## How it works
//!
//! 1. **Mouse to device coordinates**: [`pixel_to_ndc`] maps a pixel position
//!    inside the viewport to `[-1, 1]` on both axes, flipping Y
//! 2. **Device coordinates to ray**: [`Raycaster::set_from_camera`] unprojects
//!    through the camera's inverse view-projection
//! 3. **Ray-object intersection**: world-space bounding box early-out, then
//!    per-triangle tests
//! 4. **Ordering**: hits are returned nearest first
//!
//! ## Usage
//!
//! ```no_run
//! use quickscene::gfx::camera::PerspectiveCamera;
//! use quickscene::gfx::picking::{pixel_to_ndc, Raycaster};
//! use quickscene::gfx::scene::Scene;
//!
//! let scene = Scene::new();
//! let camera = PerspectiveCamera::with_aspect(800.0 / 600.0);
//! let mut raycaster = Raycaster::new();
//! raycaster.set_from_camera(pixel_to_ndc(400.0, 300.0, 800, 600), &camera);
//! let hits = raycaster.intersect_objects(&scene, scene.roots(), true).unwrap();
//! ```

pub mod raycaster;

pub use raycaster::{Intersection, Raycaster, Side};

use cgmath::{ElementWise, InnerSpace, Matrix4, Vector2, Vector3, Vector4};

/// Maps a pixel position (origin top-left, Y down) to normalized device
/// coordinates (origin center, Y up).
pub fn pixel_to_ndc(x: f32, y: f32, width: u32, height: u32) -> Vector2<f32> {
    let mut ndc = Vector2::new(0.0, 0.0);
    write_pixel_to_ndc(&mut ndc, x, y, width, height);
    ndc
}

/// In-place variant of [`pixel_to_ndc`] for reusable scratch buffers
pub fn write_pixel_to_ndc(out: &mut Vector2<f32>, x: f32, y: f32, width: u32, height: u32) {
    out.x = (x / width as f32) * 2.0 - 1.0;
    out.y = -(y / height as f32) * 2.0 + 1.0;
}

/// A 3D ray for intersection testing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin point in world space
    pub origin: Vector3<f32>,
    /// Ray direction (normalized)
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vector3<f32> {
        self.origin + self.direction * t
    }

    /// Möller–Trumbore ray-triangle test, both faces. Returns the hit distance.
    pub fn intersect_triangle(&self, v0: Vector3<f32>, v1: Vector3<f32>, v2: Vector3<f32>) -> Option<f32> {
        const EPSILON: f32 = 1e-7;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        let h = self.direction.cross(edge2);
        let a = edge1.dot(h);

        // Ray parallel to triangle
        if a.abs() < EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = self.origin - v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * self.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        (t >= 0.0).then_some(t)
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self {
            origin: Vector3::new(0.0, 0.0, 0.0),
            direction: Vector3::new(0.0, 0.0, -1.0),
        }
    }
}

/// Axis-aligned bounding box for intersection testing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vector3<f32>,
    /// Maximum corner of the bounding box
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    /// Bounds of a set of points; `None` when there are none
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = [f32; 3]>,
    {
        let mut points = points.into_iter().map(Vector3::from);
        let first = points.next()?;

        Some(points.fold(Self::new(first, first), |aabb, v| {
            Self::new(
                Vector3::new(aabb.min.x.min(v.x), aabb.min.y.min(v.y), aabb.min.z.min(v.z)),
                Vector3::new(aabb.max.x.max(v.x), aabb.max.y.max(v.y), aabb.max.z.max(v.z)),
            )
        }))
    }

    /// Test ray-AABB intersection
    /// Returns the distance to intersection point, or None if no intersection
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inv_dir = Vector3::new(
            1.0 / ray.direction.x,
            1.0 / ray.direction.y,
            1.0 / ray.direction.z,
        );

        let t_min = (self.min - ray.origin).mul_element_wise(inv_dir);
        let t_max = (self.max - ray.origin).mul_element_wise(inv_dir);

        let t_near = t_min.x.min(t_max.x).max(t_min.y.min(t_max.y)).max(t_min.z.min(t_max.z));
        let t_far = t_min.x.max(t_max.x).min(t_min.y.max(t_max.y)).min(t_min.z.max(t_max.z));

        if t_near <= t_far && t_far >= 0.0 {
            Some(if t_near >= 0.0 { t_near } else { t_far })
        } else {
            None
        }
    }

    /// Bounds of this box after applying `matrix` to all 8 corners
    pub fn transform(&self, matrix: &Matrix4<f32>) -> Self {
        let corners = (0..8).map(|i| {
            let corner = Vector4::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
                1.0,
            );
            let transformed = matrix * corner;
            [
                transformed.x / transformed.w,
                transformed.y / transformed.w,
                transformed.z / transformed.w,
            ]
        });

        // Eight corners are always present
        Self::from_points(corners).unwrap_or(*self)
    }
}
