use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::window::WindowBuilder;

use super::input::{EditorKey, KeyStates};
use super::{AppHandler, FrameCommand, InputSnapshot, Renderer, Vec2};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    /// `None` or `Some(0)` renders as fast as the surface allows.
    pub max_render_fps: Option<u32>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Region Editor".to_string(),
            window_width: 1280,
            window_height: 720,
            max_render_fps: Some(60),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create editor window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize frame surface: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Opens the window and drives `app` until it asks to exit or the window is
/// closed. Each redraw runs exactly one `update` followed by one `render`.
pub fn run_app(config: LoopConfig, mut app: Box<dyn AppHandler>) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut pacer = FramePacer::new(config.max_render_fps);
    let viewport = renderer.viewport();
    let mut input = InputCollector::new(viewport.width, viewport.height);

    info!(
        window_width = viewport.width,
        window_height = viewport.height,
        render_fps_cap = %pacer.label(),
        "loop_config"
    );
    app.load();

    let mut frame_count: u64 = 0;
    event_loop
        .run(move |event, target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    input.quit_requested = true;
                    info!(reason = "window_close", "shutdown_requested");
                    target.exit();
                }
                WindowEvent::Resized(size) => {
                    resize_surface(&mut renderer, &mut input, size, target);
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    resize_surface(&mut renderer, &mut input, window.inner_size(), target);
                }
                WindowEvent::CursorMoved { position, .. } => {
                    input.cursor_px = Some(Vec2::new(position.x as f32, position.y as f32));
                }
                WindowEvent::CursorLeft { .. } => input.cursor_px = None,
                WindowEvent::MouseInput { state, button, .. } => input.mouse_button(button, state),
                WindowEvent::MouseWheel { delta, .. } => input.wheel(delta),
                WindowEvent::KeyboardInput { event, .. } => input.key(&event),
                WindowEvent::RedrawRequested => {
                    let snapshot = input.take_frame();
                    if app.update(&snapshot) == FrameCommand::Exit {
                        info!(reason = "editor_exit", "shutdown_requested");
                        target.exit();
                        return;
                    }
                    pacer.wait();
                    if let Err(error) = renderer.render_app(app.as_mut()) {
                        warn!(error = %error, "frame_present_failed");
                        target.exit();
                    }
                    pacer.presented();
                    frame_count = frame_count.saturating_add(1);
                }
                _ => {}
            },
            Event::AboutToWait => window.request_redraw(),
            Event::LoopExiting => {
                app.shutdown();
                info!(frame_count, "loop_exited");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn resize_surface(
    renderer: &mut Renderer,
    input: &mut InputCollector,
    size: PhysicalSize<u32>,
    target: &EventLoopWindowTarget<()>,
) {
    input.window_size = (size.width, size.height);
    if let Err(error) = renderer.resize(size.width, size.height) {
        warn!(
            width = size.width,
            height = size.height,
            error = %error,
            "frame_surface_resize_failed"
        );
        target.exit();
    }
}

/// Sleeps out the remainder of a frame when a render cap is set.
#[derive(Debug)]
struct FramePacer {
    cap: Option<u32>,
    last_present: Instant,
}

impl FramePacer {
    fn new(cap: Option<u32>) -> Self {
        Self {
            cap: cap.filter(|fps| *fps > 0),
            last_present: Instant::now(),
        }
    }

    fn frame_budget(&self) -> Option<Duration> {
        self.cap
            .map(|fps| Duration::from_nanos(1_000_000_000 / u64::from(fps)))
    }

    fn remaining(&self, elapsed: Duration) -> Duration {
        self.frame_budget()
            .map_or(Duration::ZERO, |budget| budget.saturating_sub(elapsed))
    }

    fn wait(&self) {
        let remaining = self.remaining(self.last_present.elapsed());
        if !remaining.is_zero() {
            thread::sleep(remaining);
        }
    }

    fn presented(&mut self) {
        self.last_present = Instant::now();
    }

    fn label(&self) -> String {
        self.cap.map_or_else(|| "off".to_string(), |fps| fps.to_string())
    }
}

/// A mouse button's held state plus the press edge seen since the last frame.
#[derive(Debug, Default, Clone, Copy)]
struct ButtonLatch {
    held: bool,
    pressed: bool,
}

impl ButtonLatch {
    fn apply(&mut self, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.pressed |= !self.held;
                self.held = true;
            }
            ElementState::Released => self.held = false,
        }
    }

    fn take_pressed(&mut self) -> bool {
        std::mem::take(&mut self.pressed)
    }
}

/// Accumulates window events between redraws.
#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    cursor_px: Option<Vec2>,
    left: ButtonLatch,
    right: ButtonLatch,
    scroll_steps: i32,
    keys: KeyStates,
    window_size: (u32, u32),
}

impl InputCollector {
    fn new(width: u32, height: u32) -> Self {
        Self {
            window_size: (width, height),
            ..Self::default()
        }
    }

    fn key(&mut self, event: &KeyEvent) {
        if let Some(key) = EditorKey::from_physical_key(event.physical_key) {
            self.keys.handle(key, event.state);
        }
    }

    fn mouse_button(&mut self, button: MouseButton, state: ElementState) {
        match button {
            MouseButton::Left => self.left.apply(state),
            MouseButton::Right => self.right.apply(state),
            _ => {}
        }
    }

    fn wheel(&mut self, delta: MouseScrollDelta) {
        self.scroll_steps = self.scroll_steps.saturating_add(wheel_steps(delta));
    }

    /// Builds this frame's snapshot and clears every one-shot edge.
    fn take_frame(&mut self) -> InputSnapshot {
        let (width, height) = self.window_size;
        InputSnapshot::new(
            self.quit_requested,
            self.cursor_px,
            self.left.take_pressed(),
            self.right.take_pressed(),
            self.left.held,
            std::mem::take(&mut self.scroll_steps),
            self.keys.take_edges(),
            width,
            height,
        )
    }
}

/// Line deltas count notches; pixel deltas (touchpads) count as one notch.
fn wheel_steps(delta: MouseScrollDelta) -> i32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y.round() as i32,
        MouseScrollDelta::PixelDelta(position) if position.y > 0.0 => 1,
        MouseScrollDelta::PixelDelta(position) if position.y < 0.0 => -1,
        MouseScrollDelta::PixelDelta(_) => 0,
    }
}
