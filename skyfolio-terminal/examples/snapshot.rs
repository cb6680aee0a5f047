/// Example: Render a few frames off-screen and print the last one
///
/// Usage: cargo run --example snapshot -- [scroll offset in px]

use skyfolio_core::{FrameLoop, Stage, StageConfig, Viewport};
use skyfolio_terminal::AsciiRenderer;
use std::env;
use std::io;

fn main() -> io::Result<()> {
    let offset: f32 = env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(0.0);

    let viewport = Viewport::new(100, 60);
    let stage = Stage::from_config(&StageConfig::default(), viewport);
    let renderer = AsciiRenderer::new(io::sink(), viewport.width, viewport.height);
    let mut frame_loop = FrameLoop::new(stage, renderer);
    frame_loop
        .start()
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

    frame_loop.on_scroll(offset);
    for _ in 0..30 {
        frame_loop.tick()?;
    }

    for line in frame_loop.renderer().buffer_text() {
        println!("{line}");
    }
    println!(
        "frames: {} | camera z: {:.2}",
        frame_loop.stage().frames(),
        frame_loop.stage().camera().position.z
    );
    Ok(())
}
