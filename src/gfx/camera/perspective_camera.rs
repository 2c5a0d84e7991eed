use cgmath::*;

use super::camera_utils::{Camera, CameraUniform, OPENGL_TO_WGPU_MATRIX};

pub const DEFAULT_FOV_DEGREES: f32 = 75.0;
pub const DEFAULT_NEAR: f32 = 0.1;
pub const DEFAULT_FAR: f32 = 1000.0;

/// Perspective camera with a Y-up look-at view.
///
/// The projection matrix is cached: after changing `aspect`, `fovy`, `znear`
/// or `zfar` call [`update_projection_matrix`](Self::update_projection_matrix)
/// before rendering or picking.
#[derive(Debug, Clone, Copy)]
pub struct PerspectiveCamera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub aspect: f32,
    pub fovy: Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub uniform: CameraUniform,
    projection: Matrix4<f32>,
}

impl Camera for PerspectiveCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * self.view_projection_matrix()
    }
}

impl PerspectiveCamera {
    pub fn new(fovy: Deg<f32>, aspect: f32, znear: f32, zfar: f32) -> Self {
        let mut camera = Self {
            position: Point3::origin(),
            target: Point3::new(0.0, 0.0, -1.0),
            up: Vector3::unit_y(),
            aspect,
            fovy,
            znear,
            zfar,
            uniform: CameraUniform::default(),
            projection: Matrix4::identity(),
        };
        camera.update_projection_matrix();
        camera
    }

    /// Camera with 75° vertical field of view and a 0.1..1000 depth range
    pub fn with_aspect(aspect: f32) -> Self {
        Self::new(Deg(DEFAULT_FOV_DEGREES), aspect, DEFAULT_NEAR, DEFAULT_FAR)
    }

    pub fn set_position(&mut self, position: [f32; 3]) {
        self.position = Point3::from(position);
    }

    pub fn look_at(&mut self, target: Point3<f32>) {
        self.target = target;
    }

    /// Recomputes the cached projection from `fovy`, `aspect`, `znear`, `zfar`
    pub fn update_projection_matrix(&mut self) {
        self.projection = perspective(self.fovy, self.aspect, self.znear, self.zfar);
    }

    /// Sets the aspect ratio from a pixel size and refreshes the projection
    pub fn resize_projection(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
        self.update_projection_matrix();
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        let (forward, _, up) = self.view_basis();
        Matrix4::look_to_rh(self.position, forward, up)
    }

    /// View-projection in OpenGL clip space (z in -1..1), used for unprojection
    pub fn view_projection_matrix(&self) -> Matrix4<f32> {
        self.projection * self.view_matrix()
    }

    pub fn forward(&self) -> Vector3<f32> {
        self.view_basis().0
    }

    /// Orthonormal `(forward, right, up)` of the view.
    ///
    /// Stays finite when the camera sits on its target (looks down -Z) or
    /// looks along `up` (another world axis stands in for `up`).
    pub fn view_basis(&self) -> (Vector3<f32>, Vector3<f32>, Vector3<f32>) {
        let offset = self.target - self.position;
        let forward = if offset.magnitude2() > f32::EPSILON * f32::EPSILON {
            offset.normalize()
        } else {
            -Vector3::unit_z()
        };

        let right = [self.up, Vector3::unit_z(), Vector3::unit_x()]
            .into_iter()
            .map(|up| forward.cross(up))
            .find(|right| right.magnitude2() > 1e-8)
            .unwrap_or_else(Vector3::unit_x)
            .normalize();
        let up = right.cross(forward);

        (forward, right, up)
    }

    pub fn update_view_proj(&mut self) {
        self.uniform.view_position = self.position.to_homogeneous().into();
        self.uniform.view_proj = self.build_view_projection_matrix().into();
    }
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::with_aspect(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults() {
        let camera = PerspectiveCamera::with_aspect(2.0);
        assert_eq!(camera.fovy, Deg(75.0));
        assert_eq!(camera.znear, 0.1);
        assert_eq!(camera.zfar, 1000.0);
        assert_eq!(camera.aspect, 2.0);
        assert_eq!(camera.up, Vector3::unit_y());
    }

    #[test]
    fn test_projection_is_cached_until_updated() {
        let mut camera = PerspectiveCamera::with_aspect(1.0);
        let before = camera.projection_matrix();

        camera.aspect = 2.0;
        assert_eq!(camera.projection_matrix(), before);

        camera.update_projection_matrix();
        assert_ne!(camera.projection_matrix(), before);
        assert_eq!(
            camera.projection_matrix(),
            perspective(Deg(75.0), 2.0, 0.1, 1000.0)
        );
    }

    #[test]
    fn test_resize_projection() {
        let mut camera = PerspectiveCamera::with_aspect(1.0);
        camera.resize_projection(1920, 1080);
        assert_relative_eq!(camera.aspect, 1920.0 / 1080.0);
        assert_eq!(
            camera.projection_matrix(),
            perspective(Deg(75.0), 1920.0 / 1080.0, 0.1, 1000.0)
        );
    }

    #[test]
    fn test_look_at_origin_centers_origin() {
        let mut camera = PerspectiveCamera::with_aspect(1.5);
        camera.set_position([100.0, 100.0, 100.0]);
        camera.look_at(Point3::origin());

        let clip = camera.view_projection_matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(clip.x / clip.w, 0.0, epsilon = 1e-5);
        assert_relative_eq!(clip.y / clip.w, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_update_view_proj_fills_uniform() {
        let mut camera = PerspectiveCamera::with_aspect(1.0);
        camera.set_position([1.0, 2.0, 3.0]);
        camera.update_view_proj();
        assert_eq!(camera.uniform.view_position, [1.0, 2.0, 3.0, 1.0]);
    }

    fn assert_vector_eq(actual: Vector3<f32>, expected: Vector3<f32>) {
        assert_relative_eq!(actual.x, expected.x, epsilon = 1e-6);
        assert_relative_eq!(actual.y, expected.y, epsilon = 1e-6);
        assert_relative_eq!(actual.z, expected.z, epsilon = 1e-6);
    }

    fn assert_finite(matrix: Matrix4<f32>) {
        let columns: [[f32; 4]; 4] = matrix.into();
        assert!(columns.iter().flatten().all(|v| v.is_finite()), "{:?}", matrix);
    }

    #[test]
    fn test_looking_straight_down_stays_finite() {
        let mut camera = PerspectiveCamera::with_aspect(4.0 / 3.0);
        camera.set_position([0.0, 200.0, 0.0]);
        camera.look_at(Point3::origin());

        assert_finite(camera.view_projection_matrix());
        let (forward, right, up) = camera.view_basis();
        assert_vector_eq(forward, -Vector3::unit_y());
        assert_relative_eq!(right.dot(up), 0.0, epsilon = 1e-6);
        assert_relative_eq!(up.dot(forward), 0.0, epsilon = 1e-6);

        let clip = camera.view_projection_matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(clip.x / clip.w, 0.0, epsilon = 1e-5);
        assert_relative_eq!(clip.y / clip.w, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_looking_straight_up_stays_finite() {
        let mut camera = PerspectiveCamera::with_aspect(1.0);
        camera.set_position([0.0, -50.0, 0.0]);
        camera.look_at(Point3::origin());

        assert_finite(camera.view_projection_matrix());
        assert_vector_eq(camera.forward(), Vector3::unit_y());
    }

    #[test]
    fn test_camera_on_target_stays_finite() {
        let mut camera = PerspectiveCamera::with_aspect(1.0);
        camera.set_position([5.0, 5.0, 5.0]);
        camera.look_at(Point3::new(5.0, 5.0, 5.0));

        assert_finite(camera.view_projection_matrix());
        assert_vector_eq(camera.forward(), -Vector3::unit_z());
    }

    #[test]
    fn test_regular_view_matches_look_at() {
        let mut camera = PerspectiveCamera::with_aspect(1.0);
        camera.set_position([100.0, 100.0, 100.0]);
        camera.look_at(Point3::origin());

        let expected = Matrix4::look_at_rh(camera.position, camera.target, Vector3::unit_y());
        let actual: [[f32; 4]; 4] = camera.view_matrix().into();
        let expected: [[f32; 4]; 4] = expected.into();
        for (a, e) in actual.iter().flatten().zip(expected.iter().flatten()) {
            assert_relative_eq!(*a, *e, epsilon = 1e-5);
        }
    }
}
