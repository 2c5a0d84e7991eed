use std::path::Path;

use cgmath::{Matrix4, SquareMatrix};

use super::object::{Mesh, Object3D};
use super::ObjectId;
use crate::error::{Result, SessionError};
use crate::gfx::geometry::GeometryData;

/// Scene graph root.
///
/// Objects live in an arena and are addressed by [`ObjectId`]. Top-level
/// objects are children of the root; nested objects inherit their parent's
/// transform.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    objects: Vec<Object3D>,
    roots: Vec<ObjectId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an object directly under the root
    pub fn add(&mut self, mut object: Object3D) -> ObjectId {
        let id = ObjectId(self.objects.len());
        object.parent = None;
        object.children.clear();
        self.objects.push(object);
        self.roots.push(id);
        id
    }

    /// Adds an object as a child of `parent`
    pub fn add_child(&mut self, parent: ObjectId, mut object: Object3D) -> Result<ObjectId> {
        if self.get(parent).is_none() {
            return Err(SessionError::UnknownObject(parent));
        }

        let id = ObjectId(self.objects.len());
        object.parent = Some(parent);
        object.children.clear();
        self.objects.push(object);
        self.objects[parent.0].children.push(id);
        Ok(id)
    }

    /// Adds procedurally generated geometry under the root
    pub fn add_geometry(&mut self, name: &str, geometry: &GeometryData) -> ObjectId {
        self.add(Object3D::with_mesh(name, Mesh::from(geometry)))
    }

    /// Loads a 3D object from an OBJ file.
    ///
    /// Returns a group node whose children hold one mesh per OBJ model.
    /// Materials are ignored.
    pub fn load_obj(&mut self, path: impl AsRef<Path>) -> Result<ObjectId> {
        let path = path.as_ref();
        let (models, _materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )?;

        let group_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());
        let group = self.add(Object3D::group(group_name));

        for model in models {
            let mesh = model.mesh;

            // Use normals from OBJ if available, otherwise calculate them
            let normals = if mesh.normals.len() == mesh.positions.len() {
                mesh.normals
            } else {
                Mesh::calculate_face_normals(&mesh.positions, &mesh.indices)
            };

            let name = if model.name.is_empty() {
                "mesh".to_string()
            } else {
                model.name
            };
            self.add_child(
                group,
                Object3D::with_mesh(name, Mesh::new(mesh.positions, normals, mesh.indices)),
            )?;
        }

        log::info!(
            "Loaded {} with {} mesh(es)",
            path.display(),
            self.objects[group.0].children.len()
        );
        Ok(group)
    }

    pub fn get(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id.0)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object3D> {
        self.objects.get_mut(id.0)
    }

    /// Top-level objects, in insertion order
    pub fn roots(&self) -> &[ObjectId] {
        &self.roots
    }

    /// All objects with their ids, in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &Object3D)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, object)| (ObjectId(i), object))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Removes every object
    pub fn clear(&mut self) {
        self.objects.clear();
        self.roots.clear();
    }

    /// Object-to-world transform: the product of all ancestor transforms
    pub fn world_transform(&self, id: ObjectId) -> Option<Matrix4<f32>> {
        let mut object = self.get(id)?;
        let mut transform = object.transform;
        while let Some(parent) = object.parent {
            object = self.get(parent)?;
            transform = object.transform * transform;
        }
        Some(transform)
    }

    /// Whether the object and all its ancestors are visible
    pub fn is_visible(&self, id: ObjectId) -> bool {
        let mut current = self.get(id);
        while let Some(object) = current {
            if !object.visible {
                return false;
            }
            current = object.parent.and_then(|parent| self.get(parent));
        }
        true
    }

    /// Visible meshes with their world transforms, for rendering
    pub fn visible_meshes(&self) -> impl Iterator<Item = (&Mesh, Matrix4<f32>)> + '_ {
        self.iter().filter_map(move |(id, object)| {
            let mesh = object.mesh.as_ref()?;
            if !self.is_visible(id) {
                return None;
            }
            Some((mesh, self.world_transform(id).unwrap_or_else(Matrix4::identity)))
        })
    }

    /// Gets statistics about the scene
    pub fn get_statistics(&self) -> SceneStatistics {
        let meshes = self.objects.iter().filter_map(|object| object.mesh.as_ref());
        let (total_triangles, total_vertices) = meshes.fold((0, 0), |(tris, verts), mesh| {
            (tris + mesh.triangle_count(), verts + mesh.vertices().len())
        });

        SceneStatistics {
            object_count: self.objects.len(),
            total_triangles,
            total_vertices,
        }
    }
}

/// Scene statistics for debugging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneStatistics {
    pub object_count: usize,
    pub total_triangles: usize,
    pub total_vertices: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::generate_cube;
    use cgmath::{Vector3, Vector4};

    #[test]
    fn test_hierarchy_and_world_transform() {
        let mut scene = Scene::new();
        let mut parent = Object3D::group("parent");
        parent.set_translation(Vector3::new(10.0, 0.0, 0.0));
        let parent = scene.add(parent);

        let mut child = Object3D::group("child");
        child.set_translation(Vector3::new(0.0, 5.0, 0.0));
        let child = scene.add_child(parent, child).unwrap();

        assert_eq!(scene.roots(), &[parent]);
        assert_eq!(scene.get(parent).unwrap().children(), &[child]);
        assert_eq!(scene.get(child).unwrap().parent(), Some(parent));

        let world = scene.world_transform(child).unwrap();
        let origin = world * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_eq!(origin, Vector4::new(10.0, 5.0, 0.0, 1.0));
    }

    #[test]
    fn test_add_child_to_unknown_parent() {
        let mut scene = Scene::new();
        let result = scene.add_child(ObjectId(3), Object3D::group("orphan"));
        assert!(matches!(result, Err(SessionError::UnknownObject(ObjectId(3)))));
        assert!(scene.is_empty());
    }

    #[test]
    fn test_hidden_parent_hides_children() {
        let mut scene = Scene::new();
        let parent = scene.add(Object3D::group("parent"));
        scene
            .add_child(parent, Object3D::with_mesh("cube", Mesh::from(&generate_cube())))
            .unwrap();

        assert_eq!(scene.visible_meshes().count(), 1);
        scene.get_mut(parent).unwrap().visible = false;
        assert_eq!(scene.visible_meshes().count(), 0);
    }

    #[test]
    fn test_statistics() {
        let mut scene = Scene::new();
        scene.add_geometry("cube", &generate_cube());
        scene.add(Object3D::group("empty"));

        let stats = scene.get_statistics();
        assert_eq!(stats.object_count, 2);
        assert_eq!(stats.total_triangles, 12);
        assert_eq!(stats.total_vertices, 24);
    }

    #[test]
    fn test_load_missing_obj_is_error() {
        let mut scene = Scene::new();
        let result = scene.load_obj("does/not/exist.obj");
        assert!(matches!(result, Err(SessionError::ModelLoad(_))));
        assert!(scene.is_empty());
    }
}
