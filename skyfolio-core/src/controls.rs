/// Drag-to-orbit camera controls with optional damping
use nalgebra::{Point3, Vector3};
use std::f32::consts::{PI, TAU};

use crate::camera::PerspectiveCamera;

const POLAR_EPSILON: f32 = 1e-6;
const SETTLED: f32 = 1e-6;

/// Orbits the camera around `target` on a sphere whose radius is the
/// current camera distance. With damping enabled, each update applies a
/// fraction of the pending motion so the camera coasts to a stop.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Point3<f32>,
    pub enabled: bool,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    theta_delta: f32,
    phi_delta: f32,
}

impl OrbitControls {
    pub fn new() -> Self {
        Self {
            target: Point3::origin(),
            enabled: true,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            theta_delta: 0.0,
            phi_delta: 0.0,
        }
    }

    /// Queue an orbit from a pointer drag of `(dx, dy)` pixels
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: u32) {
        if !self.enabled {
            return;
        }
        let height = viewport_height.max(1) as f32;
        self.theta_delta -= TAU * dx / height * self.rotate_speed;
        self.phi_delta -= TAU * dy / height * self.rotate_speed;
    }

    pub fn is_settled(&self) -> bool {
        self.theta_delta.abs() < SETTLED && self.phi_delta.abs() < SETTLED
    }

    /// Apply pending orbit motion. Returns whether the camera moved.
    ///
    /// An idle control leaves the camera untouched, so orientation set by
    /// other handlers (such as scrolling) survives between drags.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        if self.is_settled() {
            self.theta_delta = 0.0;
            self.phi_delta = 0.0;
            return false;
        }

        let offset = camera.position - self.target.coords;
        let radius = offset.norm();
        if radius <= f32::EPSILON {
            return false;
        }

        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        if self.enable_damping {
            theta += self.theta_delta * self.damping_factor;
            phi += self.phi_delta * self.damping_factor;
        } else {
            theta += self.theta_delta;
            phi += self.phi_delta;
        }
        let phi = phi.clamp(POLAR_EPSILON, PI - POLAR_EPSILON);

        let orbit = Vector3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        camera.position = self.target.coords + orbit;
        camera.look_at(&self.target);

        if self.enable_damping {
            self.theta_delta *= 1.0 - self.damping_factor;
            self.phi_delta *= 1.0 - self.damping_factor;
        } else {
            self.theta_delta = 0.0;
            self.phi_delta = 0.0;
        }

        true
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_at(x: f32, y: f32, z: f32) -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::default();
        camera.position = Vector3::new(x, y, z);
        camera
    }

    #[test]
    fn test_idle_controls_leave_camera_alone() {
        let mut controls = OrbitControls::new();
        let mut camera = camera_at(-3.0, 0.0, 30.0);
        camera.rotation.y = 0.1;

        assert!(!controls.update(&mut camera));
        assert_eq!(camera.rotation.y, 0.1);
        assert_eq!(camera.position, Vector3::new(-3.0, 0.0, 30.0));
    }

    #[test]
    fn test_orbit_preserves_distance() {
        let mut controls = OrbitControls::new();
        let mut camera = camera_at(0.0, 0.0, 30.0);

        controls.rotate(200.0, 50.0, 600);
        assert!(controls.update(&mut camera));
        assert!((camera.position.norm() - 30.0).abs() < 1e-3);
        assert!(controls.is_settled());

        // Dragging right swings the camera toward -X
        assert!(camera.position.x < 0.0);
    }

    #[test]
    fn test_damping_coasts_to_a_stop() {
        let mut controls = OrbitControls::new();
        controls.enable_damping = true;
        let mut camera = camera_at(0.0, 0.0, 30.0);

        controls.rotate(100.0, 0.0, 600);
        let mut frames = 0;
        while controls.update(&mut camera) {
            frames += 1;
            assert!(frames < 10_000, "damping never settled");
        }
        assert!(frames > 1);

        // The full queued angle is eventually covered
        let expected = -TAU * 100.0 / 600.0;
        let theta = camera.position.x.atan2(camera.position.z);
        assert!((theta - expected).abs() < 1e-3);
    }

    #[test]
    fn test_disabled_controls_ignore_drags() {
        let mut controls = OrbitControls::new();
        controls.enabled = false;
        controls.rotate(100.0, 100.0, 600);
        assert!(controls.is_settled());
    }

    #[test]
    fn test_polar_angle_is_clamped() {
        let mut controls = OrbitControls::new();
        let mut camera = camera_at(0.0, 0.0, 30.0);

        controls.rotate(0.0, 10_000.0, 600);
        controls.update(&mut camera);
        assert!(camera.position.y <= 30.0);
        assert!(camera.position.y.is_finite());
    }
}
