/// Perspective camera and screen projection
use nalgebra::{
    Isometry3, Matrix4, Point3, Rotation3, Translation3, UnitQuaternion, Vector3, Vector4,
};

use crate::transform::RotationState;

/// Output surface dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height, with each side clamped to at least one pixel
    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

/// A point after projection: pixel coordinates plus NDC depth in `[-1, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    pub x: f32,
    pub y: f32,
    pub depth: f32,
}

/// Camera with a vertical field of view in degrees.
///
/// The projection matrix is cached. After changing `fov`, `aspect`, `near`
/// or `far`, call [`PerspectiveCamera::update_projection_matrix`].
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vector3<f32>,
    pub rotation: RotationState,
    projection: Matrix4<f32>,
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov,
            aspect,
            near,
            far,
            position: Vector3::zeros(),
            rotation: RotationState::zero(),
            projection: Matrix4::identity(),
        };
        camera.update_projection_matrix();
        camera
    }

    /// Rebuild the cached projection. A degenerate frustum keeps the last
    /// valid matrix.
    pub fn update_projection_matrix(&mut self) {
        if !self.has_valid_frustum() {
            log::warn!(
                "ignoring degenerate frustum: aspect {} fov {} near {} far {}",
                self.aspect,
                self.fov,
                self.near,
                self.far
            );
            return;
        }
        self.projection =
            Matrix4::new_perspective(self.aspect, self.fov.to_radians(), self.near, self.far);
    }

    /// Whether the parameters satisfy `Matrix4::new_perspective`
    fn has_valid_frustum(&self) -> bool {
        self.aspect.is_finite()
            && self.aspect > f32::EPSILON
            && self.fov > 0.0
            && self.fov < 180.0
            && self.near > 0.0
            && self.far.is_finite()
            && self.far - self.near > f32::EPSILON
    }

    pub fn projection_matrix(&self) -> &Matrix4<f32> {
        &self.projection
    }

    fn isometry(&self) -> Isometry3<f32> {
        Isometry3::from_parts(
            Translation3::from(self.position),
            UnitQuaternion::from_rotation_matrix(&self.rotation.to_rotation()),
        )
    }

    /// Camera to world
    pub fn world_matrix(&self) -> Matrix4<f32> {
        self.isometry().to_homogeneous()
    }

    /// World to camera
    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.isometry().inverse().to_homogeneous()
    }

    /// Turn so that local -Z points at `target`, keeping +Y up
    pub fn look_at(&mut self, target: &Point3<f32>) {
        let backward = self.position - target.coords;
        if backward.norm() <= f32::EPSILON {
            return;
        }

        let up = if backward.cross(&Vector3::y()).norm() <= f32::EPSILON {
            // Looking straight up or down
            Vector3::z()
        } else {
            Vector3::y()
        };
        let rotation = Rotation3::face_towards(&backward, &up);
        self.rotation = RotationState::from_rotation(&rotation);
    }

    /// Project a world-space point to pixel coordinates.
    ///
    /// Returns `None` for points behind the near plane or past the far
    /// plane. Points off the sides of the screen are still returned so
    /// rasterizers can clip partially visible primitives.
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        width: u32,
        height: u32,
    ) -> Option<ProjectedPoint> {
        let view_projection = self.projection * self.view_matrix();
        self.project_with(&view_projection, point, width, height)
    }

    /// Like [`Self::project_to_screen`] with a precomputed view-projection
    /// matrix (possibly already multiplied by a model matrix).
    pub fn project_with(
        &self,
        matrix: &Matrix4<f32>,
        point: &Point3<f32>,
        width: u32,
        height: u32,
    ) -> Option<ProjectedPoint> {
        let clip = matrix * Vector4::new(point.x, point.y, point.z, 1.0);

        // Prevent division by near-zero depth values
        if clip.w < self.near * 0.5 {
            return None;
        }

        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        let depth = clip.z / clip.w;

        if !(-1.0..=1.0).contains(&depth) {
            return None;
        }

        Some(ProjectedPoint {
            x: (ndc_x + 1.0) * 0.5 * width as f32,
            y: (1.0 - ndc_y) * 0.5 * height as f32,
            depth,
        })
    }
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(75.0, 800.0 / 600.0, 0.1, 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_creation() {
        let camera = PerspectiveCamera::new(75.0, 800.0 / 600.0, 0.1, 1000.0);
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
        assert!(camera.projection_matrix().norm() > 0.0);
    }

    #[test]
    fn test_projection_is_cached_until_updated() {
        let mut camera = PerspectiveCamera::default();
        let before = *camera.projection_matrix();

        camera.aspect = 2.0;
        assert_eq!(*camera.projection_matrix(), before);

        camera.update_projection_matrix();
        assert_ne!(*camera.projection_matrix(), before);
    }

    #[test]
    fn test_origin_projects_to_center() {
        let mut camera = PerspectiveCamera::default();
        camera.position = Vector3::new(0.0, 0.0, 30.0);

        let projected = camera
            .project_to_screen(&Point3::origin(), 800, 600)
            .expect("origin is in front of the camera");
        assert!((projected.x - 400.0).abs() < 1e-3);
        assert!((projected.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_point_behind_camera_is_rejected() {
        let mut camera = PerspectiveCamera::default();
        camera.position = Vector3::new(0.0, 0.0, 30.0);
        assert!(camera.project_to_screen(&Point3::new(0.0, 0.0, 40.0), 800, 600).is_none());
    }

    #[test]
    fn test_yaw_moves_scene_sideways() {
        let mut camera = PerspectiveCamera::default();
        camera.position = Vector3::new(0.0, 0.0, 30.0);
        camera.rotation.y = 0.1;

        // Turning left shifts what was straight ahead to the right
        let projected = camera.project_to_screen(&Point3::origin(), 800, 600).unwrap();
        assert!(projected.x > 400.0);
    }

    #[test]
    fn test_look_at_centers_target() {
        let mut camera = PerspectiveCamera::default();
        camera.position = Vector3::new(-3.0, 12.0, 30.0);
        let target = Point3::new(1.0, 2.0, -4.0);
        camera.look_at(&target);

        let projected = camera.project_to_screen(&target, 800, 600).unwrap();
        assert!((projected.x - 400.0).abs() < 1e-2);
        assert!((projected.y - 300.0).abs() < 1e-2);
    }

    #[test]
    fn test_viewport_aspect_guards_zero_sides() {
        assert_eq!(Viewport::new(640, 0).aspect(), 640.0);
        assert_eq!(Viewport::new(0, 600).aspect(), 1.0 / 600.0);
        assert_eq!(Viewport::new(0, 0).aspect(), 1.0);
        assert!((Viewport::new(1920, 1080).aspect() - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_frustum_keeps_last_projection() {
        let mut camera = PerspectiveCamera::default();
        let before = *camera.projection_matrix();

        camera.aspect = 0.0;
        camera.update_projection_matrix();
        assert_eq!(*camera.projection_matrix(), before);

        camera.aspect = 4.0 / 3.0;
        camera.near = 0.1;
        camera.far = 0.1000001;
        camera.update_projection_matrix();
        assert_eq!(*camera.projection_matrix(), before);

        camera.far = f32::INFINITY;
        camera.update_projection_matrix();
        assert_eq!(*camera.projection_matrix(), before);
    }

    #[test]
    fn test_degenerate_camera_starts_with_identity() {
        let camera = PerspectiveCamera::new(75.0, 0.0, 0.1, 1000.0);
        assert_eq!(*camera.projection_matrix(), Matrix4::identity());
    }
}
