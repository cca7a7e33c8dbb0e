
use crate::{Vec3F, Mat4F};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CameraType {
    /// rotate around the position, used to look at a model.
    LookAt,
    /// move through the scene from the position.
    FirstPerson,
}

/// A camera producing view and projection matrices for Vulkan clip space.
///
/// The projection maps depth into [0, 1].
#[derive(Debug, Clone)]
pub struct Camera {

    pub camera_type: CameraType,

    position: Vec3F,
    /// rotation around x, y and z axis, in degrees.
    rotation: Vec3F,

    /// vertical field of view, in degrees.
    fov  : f32,
    znear: f32,
    zfar : f32,
    aspect: f32,

    /// Vulkan clip space has its +Y axis pointing downwards, contrary to OpenGL.
    /// Set `flip_y` to true to keep a +Y up world when rendering.
    flip_y: bool,

    view: Mat4F,
    perspective: Mat4F,
}

impl Default for Camera {

    fn default() -> Camera {

        let mut camera = Camera {
            camera_type: CameraType::LookAt,
            position: Vec3F::zeros(),
            rotation: Vec3F::zeros(),
            fov: 60.0,
            znear: 1.0,
            zfar: 256.0,
            aspect: 1.0,
            flip_y: false,
            view: Mat4F::identity(),
            perspective: Mat4F::identity(),
        };
        camera.update_view_matrix();
        camera.update_perspective_matrix();

        camera
    }
}

impl Camera {

    pub fn new(camera_type: CameraType) -> Camera {
        Camera { camera_type, ..Default::default() }
    }

    pub fn set_position(&mut self, position: Vec3F) {
        self.position = position;
        self.update_view_matrix();
    }

    /// Set the rotation around x, y and z axis in degrees.
    pub fn set_rotation(&mut self, rotation: Vec3F) {
        self.rotation = rotation;
        self.update_view_matrix();
    }

    pub fn rotate(&mut self, delta: Vec3F) {
        self.rotation += delta;
        self.update_view_matrix();
    }

    /// `fov` is the vertical field of view in degrees.
    pub fn set_perspective(&mut self, fov: f32, aspect: f32, znear: f32, zfar: f32) {
        self.fov = fov;
        self.aspect = aspect;
        self.znear = znear;
        self.zfar = zfar;
        self.update_perspective_matrix();
    }

    pub fn update_aspect_ratio(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.update_perspective_matrix();
    }

    pub fn set_flip_y(&mut self, flip_y: bool) {
        self.flip_y = flip_y;
        self.update_view_matrix();
        self.update_perspective_matrix();
    }

    #[inline]
    pub fn position(&self) -> Vec3F {
        self.position
    }

    #[inline]
    pub fn view_matrix(&self) -> Mat4F {
        self.view
    }

    #[inline]
    pub fn perspective_matrix(&self) -> Mat4F {
        self.perspective
    }

    fn update_view_matrix(&mut self) {

        let pitch = if self.flip_y { -self.rotation.x } else { self.rotation.x };

        let rotation =
            Mat4F::from_axis_angle(&Vec3F::x_axis(), pitch.to_radians()) *
            Mat4F::from_axis_angle(&Vec3F::y_axis(), self.rotation.y.to_radians()) *
            Mat4F::from_axis_angle(&Vec3F::z_axis(), self.rotation.z.to_radians());

        let mut translation = self.position;
        if self.flip_y {
            translation.y = -translation.y;
        }
        let translation = Mat4F::new_translation(&translation);

        self.view = match self.camera_type {
            | CameraType::LookAt      => translation * rotation,
            | CameraType::FirstPerson => rotation * translation,
        };
    }

    fn update_perspective_matrix(&mut self) {

        self.perspective = perspective_zo(self.fov.to_radians(), self.aspect, self.znear, self.zfar);

        if self.flip_y {
            self.perspective[(1, 1)] *= -1.0;
        }
    }
}

/// Right handed perspective projection with depth in [0, 1].
fn perspective_zo(fovy: f32, aspect: f32, znear: f32, zfar: f32) -> Mat4F {

    let focal = 1.0 / (fovy / 2.0).tan();
    let depth = zfar - znear;

    Mat4F::new(
        focal / aspect, 0.0,   0.0,           0.0,
        0.0,            focal, 0.0,           0.0,
        0.0,            0.0,   -zfar / depth, -(zfar * znear) / depth,
        0.0,            0.0,   -1.0,          0.0,
    )
}


#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector4;

    fn project_depth(camera: &Camera, z: f32) -> f32 {
        let clip = camera.perspective_matrix() * Vector4::new(0.0, 0.0, z, 1.0);
        clip.z / clip.w
    }

    #[test]
    fn look_at_view_translates_by_position() {

        let mut camera = Camera::new(CameraType::LookAt);
        camera.set_position(Vec3F::new(0.0, 0.0, -2.5));

        let origin = camera.view_matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(origin, Vector4::new(0.0, 0.0, -2.5, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn look_at_rotates_before_translating() {

        let mut camera = Camera::new(CameraType::LookAt);
        camera.set_position(Vec3F::new(0.0, 0.0, -2.5));
        camera.set_rotation(Vec3F::new(0.0, 90.0, 0.0));

        // the rotation happens around the model, so the model stays centered in front of the camera.
        let origin = camera.view_matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(origin, Vector4::new(0.0, 0.0, -2.5, 1.0), epsilon = 1e-6);

        let point = camera.view_matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(point, Vector4::new(0.0, 0.0, -3.5, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn perspective_maps_depth_to_zero_one() {

        let mut camera = Camera::default();
        camera.set_perspective(60.0, 16.0 / 9.0, 1.0, 256.0);

        assert_relative_eq!(project_depth(&camera, -1.0), 0.0, epsilon = 1e-6);
        assert_relative_eq!(project_depth(&camera, -256.0), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn aspect_ratio_only_scales_horizontally() {

        let mut camera = Camera::default();
        camera.set_perspective(60.0, 1.0, 1.0, 256.0);
        let square = camera.perspective_matrix();

        camera.update_aspect_ratio(2.0);
        let wide = camera.perspective_matrix();

        assert_relative_eq!(wide[(0, 0)], square[(0, 0)] / 2.0, epsilon = 1e-6);
        assert_relative_eq!(wide[(1, 1)], square[(1, 1)], epsilon = 1e-6);
    }

    #[test]
    fn flip_y_inverts_vertical_axis() {

        let mut camera = Camera::default();
        let upright = camera.perspective_matrix();

        camera.set_flip_y(true);
        assert_relative_eq!(camera.perspective_matrix()[(1, 1)], -upright[(1, 1)], epsilon = 1e-6);
    }
}
