use skyfolio_core::{
    FrameLoop, LoopError, LoopState, PerspectiveCamera, Renderer, Scene, Stage, StageConfig,
    Viewport,
};

/// Counts calls and remembers the last camera it was asked to draw with
#[derive(Default)]
struct RecordingRenderer {
    renders: usize,
    sizes: Vec<(u32, u32)>,
    last_camera_z: Option<f32>,
    fail: bool,
}

impl Renderer for RecordingRenderer {
    type Error = String;

    fn set_size(&mut self, width: u32, height: u32) {
        self.sizes.push((width, height));
    }

    fn render(&mut self, _scene: &Scene, camera: &PerspectiveCamera) -> Result<(), String> {
        if self.fail {
            return Err("context lost".to_string());
        }
        self.renders += 1;
        self.last_camera_z = Some(camera.position.z);
        Ok(())
    }
}

fn small_config() -> StageConfig {
    StageConfig {
        star_count: 5,
        ..StageConfig::default()
    }
}

fn running_loop() -> FrameLoop<RecordingRenderer> {
    let viewport = Viewport::new(1280, 720);
    let stage = Stage::from_config(&small_config(), viewport);
    let mut frame_loop = FrameLoop::new(stage, RecordingRenderer::default());
    frame_loop.start().unwrap();
    frame_loop
}

fn close(actual: f32, expected: f32, tolerance: f32) -> bool {
    (actual - expected).abs() <= tolerance
}

mod tick_tests {
    use super::*;

    #[test]
    fn test_first_tick() {
        let mut frame_loop = running_loop();
        let stage = frame_loop.stage();
        let handles = *stage.handles();
        for id in [handles.torus, handles.moon, handles.line] {
            assert_eq!(stage.scene()[id].transform.rotation, Default::default());
        }

        assert!(frame_loop.tick().unwrap());

        let scene = frame_loop.stage().scene();
        assert!(close(scene[handles.torus].transform.rotation.y, 0.005, 1e-7));
        assert_eq!(frame_loop.renderer().renders, 1);
    }

    #[test]
    fn test_rotation_accumulates_over_ticks() {
        for frames in [0usize, 1, 10, 600] {
            let mut frame_loop = running_loop();
            for _ in 0..frames {
                frame_loop.tick().unwrap();
            }

            let n = frames as f32;
            let tolerance = 1e-6 + n * 1e-6;
            let stage = frame_loop.stage();
            let handles = *stage.handles();
            let scene = stage.scene();
            assert!(close(scene[handles.torus].transform.rotation.y, 0.005 * n, tolerance));
            assert!(close(scene[handles.moon].transform.rotation.x, 0.005 * n, tolerance));
            assert!(close(scene[handles.line].transform.rotation.y, 0.01 * n, tolerance));
            assert!(close(scene[handles.line].transform.rotation.x, 0.01 * n, tolerance));
            assert_eq!(stage.frames(), frames as u64);
        }
    }

    #[test]
    fn test_idle_loop_does_not_tick() {
        let viewport = Viewport::new(640, 480);
        let stage = Stage::from_config(&small_config(), viewport);
        let mut frame_loop = FrameLoop::new(stage, RecordingRenderer::default());

        assert_eq!(frame_loop.state(), LoopState::Idle);
        assert!(!frame_loop.tick().unwrap());
        assert_eq!(frame_loop.renderer().renders, 0);
    }

    #[test]
    fn test_render_error_propagates() {
        let mut frame_loop = running_loop();
        frame_loop.renderer_mut().fail = true;
        assert_eq!(frame_loop.tick(), Err("context lost".to_string()));
    }
}

mod scroll_tests {
    use super::*;

    #[test]
    fn test_single_scroll_moves_camera() {
        let mut frame_loop = running_loop();
        assert!(frame_loop.on_scroll(-500.0));
        assert!(frame_loop.stage().is_scroll_pending());

        frame_loop.tick().unwrap();

        let camera = frame_loop.stage().camera();
        assert!(close(camera.position.z, 5.0, 1e-5));
        assert!(close(camera.position.x, 0.1, 1e-6));
        assert!(close(camera.rotation.y, 0.1, 1e-6));
        assert!(!frame_loop.stage().is_scroll_pending());

        // The scroll update lands before that frame is drawn
        assert!(close(frame_loop.renderer().last_camera_z.unwrap(), 5.0, 1e-5));
    }

    #[test]
    fn test_burst_of_scrolls_coalesces() {
        let mut frame_loop = running_loop();
        let handles = *frame_loop.stage().handles();

        let scheduled: Vec<bool> = [-100.0, -200.0, -300.0, -400.0]
            .into_iter()
            .map(|t| frame_loop.on_scroll(t))
            .collect();
        assert_eq!(scheduled, vec![true, false, false, false]);

        frame_loop.tick().unwrap();

        let stage = frame_loop.stage();
        // First offset wins
        assert!(close(stage.camera().position.z, 1.0, 1e-6));
        // Exactly one scroll increment (0.05) plus one tick (0.005)
        let moon = stage.scene()[handles.moon].transform.rotation;
        assert!(close(moon.x, 0.055, 1e-6));
        assert!(close(moon.y, 0.075, 1e-6));

        // The next event after the frame schedules again
        assert!(frame_loop.on_scroll(-600.0));
    }

    #[test]
    fn test_repeated_offset_is_absolute_for_camera_cumulative_for_objects() {
        let mut stage = Stage::from_config(&small_config(), Viewport::new(800, 600));
        let handles = *stage.handles();

        stage.move_camera(-250.0);
        let once_moon_x = stage.scene()[handles.moon].transform.rotation.x;
        let once_camera_z = stage.camera().position.z;

        stage.move_camera(-250.0);
        let twice_moon_x = stage.scene()[handles.moon].transform.rotation.x;

        assert!(close(twice_moon_x, 2.0 * once_moon_x, 1e-6));
        assert_eq!(stage.camera().position.z, once_camera_z);
        assert!(close(once_camera_z, -250.0 * -0.01, 1e-6));

        let jeff = stage.scene()[handles.jeff].transform.rotation;
        assert!(close(jeff.y, 0.02, 1e-6));
        assert!(close(jeff.z, 0.02, 1e-6));
        assert_eq!(jeff.x, 0.0);
    }

    #[test]
    fn test_flush_without_scroll_is_noop() {
        let mut stage = Stage::from_config(&small_config(), Viewport::new(800, 600));
        let before = stage.camera().position;
        assert!(!stage.flush_scroll());
        assert_eq!(stage.camera().position, before);
    }
}

mod lifecycle_tests {
    use super::*;

    #[test]
    fn test_resize_is_idempotent() {
        let mut frame_loop = running_loop();

        frame_loop.resize(1920, 1080);
        let camera_after_first = frame_loop.stage().camera().clone();

        frame_loop.resize(1920, 1080);
        let camera = frame_loop.stage().camera();

        assert_eq!(camera.aspect, camera_after_first.aspect);
        assert_eq!(camera.projection_matrix(), camera_after_first.projection_matrix());
        assert!(close(camera.aspect, 1920.0 / 1080.0, 1e-6));
        assert_eq!(frame_loop.stage().viewport(), Viewport::new(1920, 1080));
        assert_eq!(frame_loop.renderer().sizes.last(), Some(&(1920, 1080)));
    }

    #[test]
    fn test_zero_size_resize_keeps_rendering() {
        let mut frame_loop = running_loop();

        for (width, height) in [(0, 600), (800, 0), (0, 0)] {
            frame_loop.resize(width, height);
            assert_eq!(frame_loop.renderer().sizes.last(), Some(&(width, height)));
            assert!(frame_loop.tick().unwrap());

            let camera = frame_loop.stage().camera();
            assert!(camera.aspect > 0.0);
            assert!(camera.projection_matrix().iter().all(|value| value.is_finite()));
        }

        frame_loop.resize(1920, 1080);
        assert!(close(frame_loop.stage().camera().aspect, 1920.0 / 1080.0, 1e-6));
    }

    #[test]
    fn test_zero_width_stage_assembles() {
        let stage = Stage::from_config(&small_config(), Viewport::new(0, 600));
        let mut frame_loop = FrameLoop::new(stage, RecordingRenderer::default());
        frame_loop.start().unwrap();
        assert!(frame_loop.tick().unwrap());
        assert_eq!(frame_loop.renderer().sizes, vec![(0, 600)]);
    }

    #[test]
    fn test_new_loop_sizes_renderer() {
        let frame_loop = running_loop();
        assert_eq!(frame_loop.renderer().sizes, vec![(1280, 720)]);
    }

    #[test]
    fn test_loop_cannot_restart() {
        let mut frame_loop = running_loop();
        assert_eq!(frame_loop.start(), Err(LoopError::AlreadyRunning));

        frame_loop.stop();
        assert_eq!(frame_loop.state(), LoopState::Stopped);
        assert!(!frame_loop.tick().unwrap());
        assert_eq!(frame_loop.start(), Err(LoopError::Stopped));
    }
}
