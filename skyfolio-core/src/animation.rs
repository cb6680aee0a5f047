/// The update loop: per-frame spin, throttled scroll response and resize.
///
/// [`Stage`] owns all mutable state the handlers share. [`FrameLoop`] wraps
/// a stage and a [`Renderer`] with an explicit start/stop lifecycle; the
/// host (a terminal loop or `requestAnimationFrame`) calls
/// [`FrameLoop::tick`] once per display refresh.
use crate::assembler::{assemble, Assembly, SceneHandles};
use crate::camera::{PerspectiveCamera, Viewport};
use crate::config::StageConfig;
use crate::controls::OrbitControls;
use crate::error::LoopError;
use crate::scene::Scene;
use crate::transform::RotationState;

/// Rotation added to the animated objects on every tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameDeltas {
    pub torus_y: f32,
    pub moon_x: f32,
    pub line_x: f32,
    pub line_y: f32,
}

impl Default for FrameDeltas {
    fn default() -> Self {
        Self {
            torus_y: 0.005,
            moon_x: 0.005,
            line_x: 0.01,
            line_y: 0.01,
        }
    }
}

/// How a scroll offset moves the scene.
///
/// Object spins are increments applied on every scroll update. Camera
/// factors multiply the offset and overwrite the camera fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollResponse {
    pub moon_spin: RotationState,
    pub jeff_spin: RotationState,
    pub camera_z: f32,
    pub camera_x: f32,
    pub camera_yaw: f32,
}

impl Default for ScrollResponse {
    fn default() -> Self {
        Self {
            moon_spin: RotationState::new(0.05, 0.075, 0.05),
            jeff_spin: RotationState::new(0.0, 0.01, 0.01),
            camera_z: -0.01,
            camera_x: -0.0002,
            camera_yaw: -0.0002,
        }
    }
}

/// Coalesces scroll events into at most one pending update per frame.
///
/// The first offset requested while idle is kept; later requests are
/// dropped, not queued, until [`ScrollThrottle::take`] runs.
#[derive(Debug, Clone, Default)]
pub struct ScrollThrottle {
    ticking: bool,
    pending: Option<f32>,
}

impl ScrollThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an update for `offset`. Returns false if one is pending.
    pub fn request(&mut self, offset: f32) -> bool {
        if self.ticking {
            return false;
        }
        self.ticking = true;
        self.pending = Some(offset);
        true
    }

    /// Hand over the scheduled offset and re-arm the throttle
    pub fn take(&mut self) -> Option<f32> {
        self.ticking = false;
        self.pending.take()
    }

    pub fn is_ticking(&self) -> bool {
        self.ticking
    }
}

/// A surface that can draw a scene
pub trait Renderer {
    type Error;

    /// Resize the output buffer
    fn set_size(&mut self, width: u32, height: u32);

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<(), Self::Error>;
}

/// Application state shared by the tick, scroll and resize handlers
#[derive(Debug, Clone)]
pub struct Stage {
    scene: Scene,
    camera: PerspectiveCamera,
    handles: SceneHandles,
    controls: OrbitControls,
    throttle: ScrollThrottle,
    deltas: FrameDeltas,
    scroll: ScrollResponse,
    viewport: Viewport,
    frames: u64,
}

impl Stage {
    pub fn new(assembly: Assembly, viewport: Viewport) -> Self {
        let Assembly { scene, camera, handles } = assembly;
        Self {
            scene,
            camera,
            handles,
            controls: OrbitControls::new(),
            throttle: ScrollThrottle::new(),
            deltas: FrameDeltas::default(),
            scroll: ScrollResponse::default(),
            viewport,
            frames: 0,
        }
    }

    /// Assemble the scene described by `config` and wire up orbit controls
    pub fn from_config(config: &StageConfig, viewport: Viewport) -> Self {
        let mut controls = OrbitControls::new();
        controls.enable_damping = config.enable_damping;
        controls.damping_factor = config.damping_factor;
        Self::new(assemble(config, viewport), viewport).with_controls(controls)
    }

    pub fn with_controls(mut self, controls: OrbitControls) -> Self {
        self.controls = controls;
        self
    }

    /// Spin the animated objects by one tick
    pub fn advance(&mut self) {
        let FrameDeltas {
            torus_y,
            moon_x,
            line_x,
            line_y,
        } = self.deltas;

        self.scene[self.handles.torus].transform.rotation.y += torus_y;
        self.scene[self.handles.moon].transform.rotation.x += moon_x;

        let line = &mut self.scene[self.handles.line].transform.rotation;
        line.y += line_y;
        line.x += line_x;
    }

    /// Scroll event with the page's top offset (negative once scrolled
    /// down). Returns whether this event scheduled the next camera update.
    pub fn on_scroll(&mut self, offset: f32) -> bool {
        let scheduled = self.throttle.request(offset);
        if !scheduled {
            log::trace!("scroll to {} dropped; update already pending", offset);
        }
        scheduled
    }

    /// Apply the scroll response for `offset` right away
    pub fn move_camera(&mut self, offset: f32) {
        let ScrollResponse {
            moon_spin,
            jeff_spin,
            camera_z,
            camera_x,
            camera_yaw,
        } = self.scroll;

        self.scene[self.handles.moon]
            .transform
            .rotation
            .rotate(moon_spin.x, moon_spin.y, moon_spin.z);
        self.scene[self.handles.jeff]
            .transform
            .rotation
            .rotate(jeff_spin.x, jeff_spin.y, jeff_spin.z);

        self.camera.position.z = offset * camera_z;
        self.camera.position.x = offset * camera_x;
        self.camera.rotation.y = offset * camera_yaw;
    }

    /// Run the deferred scroll update, if one was scheduled
    pub fn flush_scroll(&mut self) -> bool {
        match self.throttle.take() {
            Some(offset) => {
                self.move_camera(offset);
                true
            }
            None => false,
        }
    }

    pub fn resize<R: Renderer>(&mut self, renderer: &mut R, width: u32, height: u32) {
        renderer.set_size(width, height);
        self.viewport = Viewport::new(width, height);
        self.camera.aspect = self.viewport.aspect();
        self.camera.update_projection_matrix();
        log::debug!("resized to {}x{}", width, height);
    }

    /// One display refresh: pending scroll, spin, orbit, draw
    pub fn frame<R: Renderer>(&mut self, renderer: &mut R) -> Result<(), R::Error> {
        self.flush_scroll();
        self.advance();
        self.controls.update(&mut self.camera);
        renderer.render(&self.scene, &self.camera)?;
        self.frames += 1;
        Ok(())
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut PerspectiveCamera {
        &mut self.camera
    }

    pub fn handles(&self) -> &SceneHandles {
        &self.handles
    }

    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Frames rendered so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_scroll_pending(&self) -> bool {
        self.throttle.is_ticking()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

/// A stage, its renderer and the loop lifecycle
pub struct FrameLoop<R: Renderer> {
    stage: Stage,
    renderer: R,
    state: LoopState,
}

impl<R: Renderer> FrameLoop<R> {
    /// Wrap `stage`, sizing `renderer` to the stage viewport
    pub fn new(mut stage: Stage, mut renderer: R) -> Self {
        let Viewport { width, height } = stage.viewport();
        stage.resize(&mut renderer, width, height);
        Self {
            stage,
            renderer,
            state: LoopState::Idle,
        }
    }

    pub fn start(&mut self) -> Result<(), LoopError> {
        match self.state {
            LoopState::Idle => {
                self.state = LoopState::Running;
                log::debug!("frame loop started");
                Ok(())
            }
            LoopState::Running => Err(LoopError::AlreadyRunning),
            LoopState::Stopped => Err(LoopError::Stopped),
        }
    }

    pub fn stop(&mut self) {
        if self.state != LoopState::Stopped {
            log::debug!("frame loop stopped after {} frames", self.stage.frames());
        }
        self.state = LoopState::Stopped;
    }

    /// Render one frame if running. Returns whether a frame ran.
    pub fn tick(&mut self) -> Result<bool, R::Error> {
        if self.state != LoopState::Running {
            return Ok(false);
        }
        self.stage.frame(&mut self.renderer)?;
        Ok(true)
    }

    pub fn on_scroll(&mut self, offset: f32) -> bool {
        self.stage.on_scroll(offset)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.stage.resize(&mut self.renderer, width, height);
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_keeps_first_offset() {
        let mut throttle = ScrollThrottle::new();
        assert!(throttle.request(-10.0));
        assert!(!throttle.request(-20.0));
        assert!(!throttle.request(-30.0));
        assert!(throttle.is_ticking());

        assert_eq!(throttle.take(), Some(-10.0));
        assert!(!throttle.is_ticking());
        assert_eq!(throttle.take(), None);
    }

    #[test]
    fn test_throttle_rearms_after_take() {
        let mut throttle = ScrollThrottle::new();
        throttle.request(-1.0);
        throttle.take();
        assert!(throttle.request(-2.0));
        assert_eq!(throttle.take(), Some(-2.0));
    }

    #[test]
    fn test_default_constants() {
        let deltas = FrameDeltas::default();
        assert_eq!(
            (deltas.torus_y, deltas.moon_x, deltas.line_x, deltas.line_y),
            (0.005, 0.005, 0.01, 0.01)
        );

        let scroll = ScrollResponse::default();
        assert_eq!(scroll.moon_spin, RotationState::new(0.05, 0.075, 0.05));
        assert_eq!(scroll.jeff_spin, RotationState::new(0.0, 0.01, 0.01));
        assert_eq!(
            (scroll.camera_z, scroll.camera_x, scroll.camera_yaw),
            (-0.01, -0.0002, -0.0002)
        );
    }
}
