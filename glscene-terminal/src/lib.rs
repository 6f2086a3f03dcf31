/// Terminal front end: drives a glscene scene through the ASCII rasterizer
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal,
};
use glscene_core::clock::{FixedTimestep, FrameClock};
use glscene_core::{InputEvent, Scene, SceneKind};
use std::io::{stdout, Write};
use std::time::{Duration, Instant};

pub mod config;
pub mod error;
pub mod logging;
pub mod renderer;

pub use config::AppConfig;
pub use error::AppError;
pub use renderer::AsciiRenderer;

/// Smallest terminal the overlay and a scene still fit in
const MIN_SIZE: (u16, u16) = (20, 8);

/// Pixels one cell of mouse motion stands for
const CELL_PIXELS: (f32, f32) = (8.0, 16.0);

/// Drag distance of one arrow key press, in pixels
const KEY_DRAG: f32 = 12.0;

const ZOOM_STEP: f32 = 1.1;

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Quit,
    NextScene,
    Input(InputEvent),
}

/// Map a key to an action; `None` for unbound keys.
pub fn key_action(code: KeyCode) -> Option<Action> {
    let drag = |dx: f32, dy: f32| Some(Action::Input(InputEvent::Drag { dx, dy }));
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Tab => Some(Action::NextScene),
        KeyCode::Char('w') | KeyCode::Up => drag(0.0, -KEY_DRAG),
        KeyCode::Char('s') | KeyCode::Down => drag(0.0, KEY_DRAG),
        KeyCode::Char('a') | KeyCode::Left => drag(-KEY_DRAG, 0.0),
        KeyCode::Char('d') | KeyCode::Right => drag(KEY_DRAG, 0.0),
        KeyCode::Char('+') | KeyCode::Char('=') => Some(Action::Input(InputEvent::Zoom(ZOOM_STEP))),
        KeyCode::Char('-') => Some(Action::Input(InputEvent::Zoom(1.0 / ZOOM_STEP))),
        KeyCode::Char('r') => Some(Action::Input(InputEvent::Reset)),
        _ => None,
    }
}

/// Turns mouse events into drags and zooms
#[derive(Debug, Default)]
pub struct MouseTracker {
    last: Option<(u16, u16)>,
}

impl MouseTracker {
    pub fn handle(&mut self, mouse: &MouseEvent) -> Option<InputEvent> {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.last = Some((mouse.column, mouse.row));
                None
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let (column, row) = self.last.replace((mouse.column, mouse.row))?;
                let dx = (f32::from(mouse.column) - f32::from(column)) * CELL_PIXELS.0;
                let dy = (f32::from(mouse.row) - f32::from(row)) * CELL_PIXELS.1;
                Some(InputEvent::Drag { dx, dy })
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.last = None;
                None
            }
            MouseEventKind::ScrollUp => Some(InputEvent::Zoom(ZOOM_STEP)),
            MouseEventKind::ScrollDown => Some(InputEvent::Zoom(1.0 / ZOOM_STEP)),
            _ => None,
        }
    }
}

/// Main application struct for terminal rendering
pub struct TerminalApp {
    config: AppConfig,
    kind: SceneKind,
    scene: Box<dyn Scene>,
    renderer: AsciiRenderer,
    mouse: MouseTracker,
    clock: FrameClock,
    timestep: FixedTimestep,
    running: bool,
    last_sample: Instant,
    frame_count: u32,
    fps: f32,
    aborted_frames: u64,
}

impl TerminalApp {
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        let (width, height) = terminal::size()?;
        if width < MIN_SIZE.0 || height < MIN_SIZE.1 {
            return Err(AppError::TooSmall {
                width,
                height,
                min_width: MIN_SIZE.0,
                min_height: MIN_SIZE.1,
            });
        }

        let kind = config.scene_kind();
        let scene = kind.build(&config.scene_config(width, height));
        log::info!("starting {} scene at {}x{}", kind.name(), width, height);

        Ok(Self {
            config,
            kind,
            scene,
            renderer: AsciiRenderer::new(width as usize, height as usize),
            mouse: MouseTracker::default(),
            clock: FrameClock::new(),
            timestep: FixedTimestep::default(),
            running: true,
            last_sample: Instant::now(),
            frame_count: 0,
            fps: 0.0,
            aborted_frames: 0,
        })
    }

    pub fn run(&mut self) -> Result<(), AppError> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide, EnableMouseCapture)?;
        // Records written now would land on top of the frame.
        logging::stderr_gate().hold();

        let result = self.main_loop();

        // Cleanup
        let restored = execute!(stdout(), DisableMouseCapture, terminal::LeaveAlternateScreen, cursor::Show)
            .and_then(|()| terminal::disable_raw_mode());
        let released = logging::stderr_gate().release();
        restored?;
        released?;

        if self.aborted_frames > 0 {
            log::warn!("{} frames were aborted", self.aborted_frames);
        }
        result
    }

    fn main_loop(&mut self) -> Result<(), AppError> {
        let target_frame_time = Duration::from_secs(1) / self.config.fps;
        self.clock.reset();

        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::ZERO)? {
                self.handle_event(event::read()?);
            }

            // Update
            let time = self.clock.tick();
            for _ in 0..self.timestep.advance(time.dt) {
                self.scene.update(self.timestep.step());
            }

            // Render
            self.render(time.frame_index)?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
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
            Event::Key(KeyEvent { code, kind, .. }) if kind != KeyEventKind::Release => {
                match key_action(code) {
                    Some(Action::Quit) => self.running = false,
                    Some(Action::NextScene) => self.switch_scene(self.kind.next()),
                    Some(Action::Input(input)) => self.scene.handle_input(input),
                    None => {}
                }
            }
            Event::Mouse(mouse) => {
                if let Some(input) = self.mouse.handle(&mouse) {
                    self.scene.handle_input(input);
                }
            }
            Event::Resize(width, height) => {
                self.renderer.resize(width as usize, height as usize);
                let (w, h) = config::cell_viewport(width, height);
                self.scene.camera_mut().set_viewport(w, h);
                log::debug!("resized to {}x{}", width, height);
            }
            _ => {}
        }
    }

    fn switch_scene(&mut self, kind: SceneKind) {
        let (width, height) = self.renderer.size();
        self.kind = kind;
        self.scene = kind.build(&self.config.scene_config(width as u16, height as u16));
        log::info!("switched to {} scene", kind.name());
    }

    fn render(&mut self, frame_index: u64) -> Result<(), AppError> {
        if let Err(err) = self.scene.render(&mut self.renderer) {
            // Leave the previous frame on screen.
            self.aborted_frames += 1;
            log::error!("frame {} of {} scene aborted: {}", frame_index, self.scene.name(), err);
            return Ok(());
        }

        // Output to terminal
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.renderer.present(&mut stdout)?;

        // Draw UI overlay
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "glscene | {} | FPS: {:.1} | drag/WASD rotate  +/- zoom  r reset  Tab scene  q quit",
                self.scene.name(),
                self.fps
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(key_action(KeyCode::Char('q')), Some(Action::Quit));
        assert_eq!(key_action(KeyCode::Esc), Some(Action::Quit));
        assert_eq!(key_action(KeyCode::Tab), Some(Action::NextScene));
        assert_eq!(
            key_action(KeyCode::Left),
            Some(Action::Input(InputEvent::Drag { dx: -KEY_DRAG, dy: 0.0 }))
        );
        assert_eq!(key_action(KeyCode::Char('r')), Some(Action::Input(InputEvent::Reset)));
        assert_eq!(key_action(KeyCode::Char('x')), None);
    }

    #[test]
    fn test_zoom_keys_are_inverse() {
        let Some(Action::Input(InputEvent::Zoom(zoom_in))) = key_action(KeyCode::Char('+')) else {
            panic!("+ should zoom");
        };
        let Some(Action::Input(InputEvent::Zoom(zoom_out))) = key_action(KeyCode::Char('-')) else {
            panic!("- should zoom");
        };
        assert!((zoom_in * zoom_out - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_mouse_drag_reports_pixel_deltas() {
        let mut tracker = MouseTracker::default();
        assert_eq!(tracker.handle(&mouse(MouseEventKind::Down(MouseButton::Left), 10, 5)), None);
        assert_eq!(
            tracker.handle(&mouse(MouseEventKind::Drag(MouseButton::Left), 12, 4)),
            Some(InputEvent::Drag { dx: 16.0, dy: -16.0 })
        );
        assert_eq!(
            tracker.handle(&mouse(MouseEventKind::Drag(MouseButton::Left), 12, 4)),
            Some(InputEvent::Drag { dx: 0.0, dy: 0.0 })
        );
        assert_eq!(tracker.handle(&mouse(MouseEventKind::Up(MouseButton::Left), 12, 4)), None);
    }

    #[test]
    fn test_drag_without_press_is_ignored() {
        let mut tracker = MouseTracker::default();
        assert_eq!(tracker.handle(&mouse(MouseEventKind::Drag(MouseButton::Left), 3, 3)), None);
        // The first drag event anchors the next one.
        assert!(tracker.handle(&mouse(MouseEventKind::Drag(MouseButton::Left), 4, 3)).is_some());
    }

    #[test]
    fn test_scroll_zooms() {
        let mut tracker = MouseTracker::default();
        assert_eq!(
            tracker.handle(&mouse(MouseEventKind::ScrollUp, 0, 0)),
            Some(InputEvent::Zoom(ZOOM_STEP))
        );
    }
}
