/// Terminal front-end for the scroll-reactive star scene
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal,
};
use skyfolio_core::{FrameLoop, Stage, StageConfig, Viewport};
use std::io::{self, stdout, Stdout};
use std::time::{Duration, Instant};

pub mod input;
pub mod renderer;

pub use input::PageScroll;
pub use renderer::{AsciiRenderer, CELL_ASPECT};

/// Runtime knobs that do not affect the scene itself
#[derive(Debug, Clone, Copy)]
pub struct AppOptions {
    pub fps: u32,
    pub page_height: f32,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            fps: 30,
            page_height: 4000.0,
        }
    }
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    frame_loop: FrameLoop<AsciiRenderer<Stdout>>,
    page: PageScroll,
    rows: u16,
    drag_from: Option<(u16, u16)>,
    target_frame_time: Duration,
    last_sample: Instant,
    frame_count: u32,
    fps: f32,
}

/// Terminal size as a square-pixel viewport
fn viewport_for(columns: u16, rows: u16) -> Viewport {
    Viewport::new(columns as u32, rows as u32 * CELL_ASPECT)
}

/// Raw mode plus the alternate screen. Dropping it restores the terminal,
/// so an early return or a panic in the main loop still cleans up.
struct TerminalSession {
    restored: bool,
}

impl TerminalSession {
    fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let session = Self { restored: false };
        execute!(stdout(), terminal::EnterAlternateScreen, EnableMouseCapture, cursor::Hide)?;
        Ok(session)
    }

    fn finish(mut self) -> io::Result<()> {
        self.restored = true;
        restore_terminal()
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        if let Err(err) = restore_terminal() {
            log::warn!("failed to restore terminal: {}", err);
        }
    }
}

fn restore_terminal() -> io::Result<()> {
    run_cleanup(
        || execute!(stdout(), DisableMouseCapture, terminal::LeaveAlternateScreen, cursor::Show),
        terminal::disable_raw_mode,
    )
}

/// Run both cleanup steps even if the first fails; report the first error
fn run_cleanup(
    leave_screen: impl FnOnce() -> io::Result<()>,
    disable_raw: impl FnOnce() -> io::Result<()>,
) -> io::Result<()> {
    let screen = leave_screen();
    let raw = disable_raw();
    screen.and(raw)
}

impl TerminalApp {
    pub fn new(config: &StageConfig, options: AppOptions) -> io::Result<Self> {
        let (columns, rows) = terminal::size()?;
        let viewport = viewport_for(columns, rows);

        let stage = Stage::from_config(config, viewport);
        let renderer = AsciiRenderer::new(stdout(), viewport.width, viewport.height);

        Ok(Self {
            frame_loop: FrameLoop::new(stage, renderer),
            page: PageScroll::new(options.page_height, rows),
            rows,
            drag_from: None,
            target_frame_time: Duration::from_millis(1000 / options.fps.max(1) as u64),
            last_sample: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        let session = TerminalSession::enter()?;
        let result = self.main_loop();
        // A main loop error takes precedence over a cleanup error
        let cleanup = session.finish();
        result.and(cleanup)
    }

    fn main_loop(&mut self) -> io::Result<()> {
        self.frame_loop
            .start()
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

        while self.frame_loop.is_running() {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::from_millis(0))? {
                let event = event::read()?;
                self.handle_event(event);
            }

            let status = format!(
                "Skyfolio | {:.1} fps | scroll {:.0}px | wheel/PgUp/PgDn=Scroll drag=Orbit Q=Quit",
                self.fps,
                self.page.top()
            );
            self.frame_loop.renderer_mut().set_status(status);

            self.frame_loop.tick()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < self.target_frame_time {
                std::thread::sleep(self.target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_sample).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_sample).as_secs_f32();
                self.frame_count = 0;
                self.last_sample = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent { code, kind, .. }) if kind != KeyEventKind::Release => match code {
                KeyCode::Char('q') | KeyCode::Esc => self.frame_loop.stop(),
                KeyCode::PageDown => self.scroll(5),
                KeyCode::PageUp => self.scroll(-5),
                KeyCode::Char('j') | KeyCode::Down => self.scroll(1),
                KeyCode::Char('k') | KeyCode::Up => self.scroll(-1),
                _ => {}
            },
            Event::Mouse(MouseEvent { kind, column, row, .. }) => match kind {
                MouseEventKind::ScrollDown => self.scroll(1),
                MouseEventKind::ScrollUp => self.scroll(-1),
                MouseEventKind::Down(MouseButton::Left) => self.drag_from = Some((column, row)),
                MouseEventKind::Drag(MouseButton::Left) => self.drag_to(column, row),
                MouseEventKind::Up(MouseButton::Left) => self.drag_from = None,
                _ => {}
            },
            Event::Resize(columns, rows) => self.resize(columns, rows),
            _ => {}
        }
    }

    fn scroll(&mut self, notches: i32) {
        if let Some(top) = self.page.scroll_by(notches) {
            self.frame_loop.on_scroll(top);
        }
    }

    fn drag_to(&mut self, column: u16, row: u16) {
        let Some((from_column, from_row)) = self.drag_from.replace((column, row)) else {
            return;
        };
        let dx = column as f32 - from_column as f32;
        let dy = (row as f32 - from_row as f32) * CELL_ASPECT as f32;
        let height = self.rows as u32 * CELL_ASPECT;
        self.frame_loop.stage_mut().controls_mut().rotate(dx, dy, height);
    }

    fn resize(&mut self, columns: u16, rows: u16) {
        let viewport = viewport_for(columns, rows);
        self.rows = rows;
        self.frame_loop.resize(viewport.width, viewport.height);
        if let Some(top) = self.page.set_rows(rows) {
            self.frame_loop.on_scroll(top);
        }
    }
}
