use glam::{Mat4, Vec3};

/// 2D orthographic camera.
///
/// Bounds are fixed at construction. Every mutation of position or rotation
/// recomputes the view and view-projection matrices before returning.
#[derive(Debug, Clone, PartialEq)]
pub struct OrthographicCamera {
    projection: Mat4,
    view: Mat4,
    view_projection: Mat4,

    position: Vec3,
    /// Degrees around +Z.
    rotation: f32,
}

impl OrthographicCamera {
    pub fn new(left: f32, right: f32, bottom: f32, top: f32) -> Self {
        let projection = Mat4::orthographic_rh(left, right, bottom, top, -1.0, 1.0);
        let mut camera = Self {
            projection,
            view: Mat4::IDENTITY,
            view_projection: projection,
            position: Vec3::ZERO,
            rotation: 0.0,
        };
        camera.recalculate_view_matrix();
        camera
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.recalculate_view_matrix();
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, degrees: f32) {
        self.rotation = degrees;
        self.recalculate_view_matrix();
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.view_projection
    }

    fn recalculate_view_matrix(&mut self) {
        let transform = Mat4::from_translation(self.position)
            * Mat4::from_rotation_z(self.rotation.to_radians());
        self.view = transform.inverse();
        self.view_projection = self.projection * self.view;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn camera() -> OrthographicCamera {
        OrthographicCamera::new(-1.6, 1.6, -0.9, 0.9)
    }

    fn expected(camera: &OrthographicCamera, position: Vec3, degrees: f32) -> Mat4 {
        camera.projection_matrix()
            * (Mat4::from_translation(position) * Mat4::from_rotation_z(degrees.to_radians()))
                .inverse()
    }

    #[test]
    fn fresh_camera_view_projection_is_projection() {
        let camera = camera();
        assert_eq!(camera.view_matrix(), Mat4::IDENTITY);
        assert_eq!(camera.view_projection_matrix(), camera.projection_matrix());
    }

    #[test]
    fn projection_maps_bounds_to_ndc_corners() {
        let camera = camera();
        let top_right = camera.projection_matrix() * Vec4::new(1.6, 0.9, 0.0, 1.0);
        assert!((top_right.x - 1.0).abs() < 1e-6);
        assert!((top_right.y - 1.0).abs() < 1e-6);
        let bottom_left = camera.projection_matrix() * Vec4::new(-1.6, -0.9, 0.0, 1.0);
        assert!((bottom_left.x + 1.0).abs() < 1e-6);
        assert!((bottom_left.y + 1.0).abs() < 1e-6);
    }

    #[test]
    fn mutation_recomputes_view_projection_eagerly() {
        let mut camera = camera();
        let position = Vec3::new(0.5, -0.25, 0.0);

        camera.set_position(position);
        assert!(camera
            .view_projection_matrix()
            .abs_diff_eq(expected(&camera, position, 0.0), 1e-6));

        camera.set_rotation(45.0);
        assert!(camera
            .view_projection_matrix()
            .abs_diff_eq(expected(&camera, position, 45.0), 1e-6));
    }

    #[test]
    fn no_op_mutation_is_idempotent() {
        let mut camera = camera();
        camera.set_position(Vec3::new(1.0, 2.0, 0.0));
        camera.set_rotation(30.0);
        let before = camera.view_projection_matrix();

        camera.set_position(camera.position());
        camera.set_rotation(camera.rotation());

        assert_eq!(camera.view_projection_matrix(), before);
    }

    #[test]
    fn camera_position_maps_to_screen_center() {
        let mut camera = camera();
        camera.set_position(Vec3::new(3.0, -2.0, 0.0));
        camera.set_rotation(90.0);
        let center = camera.view_projection_matrix() * Vec4::new(3.0, -2.0, 0.0, 1.0);
        assert!(center.x.abs() < 1e-5);
        assert!(center.y.abs() < 1e-5);
    }
}
