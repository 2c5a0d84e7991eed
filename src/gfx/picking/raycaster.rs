use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Transform, Vector2};

use super::{Aabb, Ray};
use crate::error::{Result, SessionError};
use crate::gfx::camera::PerspectiveCamera;
use crate::gfx::scene::{ObjectId, Scene};

/// A single ray hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Distance from the ray origin to the hit point
    pub distance: f32,
    /// World-space hit point
    pub point: Point3<f32>,
    /// The object whose mesh was hit
    pub object: ObjectId,
    /// Index of the hit triangle within the object's mesh
    pub face_index: usize,
}

/// Which triangle faces a ray can hit. Front faces wind counter-clockwise
/// as seen from the ray origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// Casts rays from a camera into a scene.
///
/// Hits closer than `near` or farther than `far` are discarded, as are
/// faces `side` excludes. Hidden objects, and everything below them, are
/// never hit.
#[derive(Debug, Clone)]
pub struct Raycaster {
    pub ray: Ray,
    pub near: f32,
    pub far: f32,
    pub side: Side,
}

impl Raycaster {
    pub fn new() -> Self {
        Self {
            ray: Ray::default(),
            near: 0.0,
            far: f32::INFINITY,
            side: Side::Front,
        }
    }

    /// Aims the ray from the camera position through `ndc` on the camera's projection
    ///
    /// The direction is built from the view basis and the field of view
    /// rather than by inverting the projection, which loses precision in f32
    /// for wide depth ranges.
    pub fn set_from_camera(&mut self, ndc: Vector2<f32>, camera: &PerspectiveCamera) {
        let (forward, right, up) = camera.view_basis();
        let half_height = (Rad::from(camera.fovy) * 0.5).0.tan();
        let half_width = half_height * camera.aspect;

        self.ray.origin = camera.position.to_vec();
        self.ray.direction =
            (forward + right * (ndc.x * half_width) + up * (ndc.y * half_height)).normalize();
    }

    /// Intersects one object (and optionally its descendants), appending hits to `hits`
    ///
    /// `hits` is left unsorted.
    pub fn intersect_object(
        &self,
        scene: &Scene,
        id: ObjectId,
        recursive: bool,
        hits: &mut Vec<Intersection>,
    ) -> Result<()> {
        let object = scene.get(id).ok_or(SessionError::UnknownObject(id))?;
        if !scene.is_visible(id) {
            return Ok(());
        }

        if let Some(mesh) = &object.mesh {
            let world = scene
                .world_transform(id)
                .ok_or(SessionError::UnknownObject(id))?;
            self.intersect_mesh(id, mesh, &world, hits);
        }

        if recursive {
            for &child in object.children() {
                self.intersect_object(scene, child, true, hits)?;
            }
        }

        Ok(())
    }

    /// Intersects a list of objects, returning hits nearest first
    pub fn intersect_objects(
        &self,
        scene: &Scene,
        ids: &[ObjectId],
        recursive: bool,
    ) -> Result<Vec<Intersection>> {
        let mut hits = Vec::new();
        for &id in ids {
            self.intersect_object(scene, id, recursive, &mut hits)?;
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(hits)
    }

    fn intersect_mesh(
        &self,
        id: ObjectId,
        mesh: &crate::gfx::scene::Mesh,
        world: &Matrix4<f32>,
        hits: &mut Vec<Intersection>,
    ) {
        let Some(local_bounds) = Aabb::from_points(mesh.vertices().iter().map(|v| v.position))
        else {
            return;
        };
        if local_bounds.transform(world).intersect_ray(&self.ray).is_none() {
            return;
        }

        let to_world = |p: [f32; 3]| world.transform_point(Point3::from(p)).to_vec();
        // Mirroring transforms flip the winding
        let mirrored = world.determinant() < 0.0;

        for (face_index, [a, b, c]) in mesh.triangles().enumerate() {
            let (a, b, c) = (to_world(a), to_world(b), to_world(c));

            if self.side != Side::Double {
                let facing_ray = ((b - a).cross(c - a).dot(self.ray.direction) < 0.0) != mirrored;
                if facing_ray != (self.side == Side::Front) {
                    continue;
                }
            }

            let Some(distance) = self.ray.intersect_triangle(a, b, c) else {
                continue;
            };

            if distance < self.near || distance > self.far {
                continue;
            }

            hits.push(Intersection {
                distance,
                point: Point3::from_vec(self.ray.point_at(distance)),
                object: id,
                face_index,
            });
        }
    }
}

impl Default for Raycaster {
    fn default() -> Self {
        Self::new()
    }
}
