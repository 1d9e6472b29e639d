//! Desktop window: winit events in, pixels framebuffer out.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Context as _;
use pixels::{Pixels, SurfaceTexture};
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, KeyEvent, StartCause, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key as LogicalKey, NamedKey},
    window::{Fullscreen, Window, WindowId},
};

use crate::{
    app::{Installation, ShellRequest},
    config::Settings,
    dialogs::NativeDialogs,
    foundation::{
        core::{Point, Viewport},
        error::{ReelError, ReelResult},
    },
    input::Key,
    video::ffmpeg::FfmpegLoader,
};

struct Surface {
    window: Arc<Window>,
    pixels: Pixels<'static>,
}

struct Shell {
    app: Installation,
    dialogs: NativeDialogs,
    start_fullscreen: bool,
    tick: Duration,
    next_tick: Instant,
    surface: Option<Surface>,
    error: Option<ReelError>,
}

impl Shell {
    fn create_surface(&self, event_loop: &ActiveEventLoop) -> ReelResult<Surface> {
        let settings = self.app.settings();
        let mut attrs = Window::default_attributes()
            .with_title("scorereel")
            .with_inner_size(PhysicalSize::new(
                settings.window_width,
                settings.window_height,
            ));
        if self.start_fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let size = window.inner_size();
        let texture = SurfaceTexture::new(size.width, size.height, window.clone());
        let viewport = self.app.viewport();
        let pixels = Pixels::new(viewport.width, viewport.height, texture)
            .context("create pixel surface")?;
        Ok(Surface { window, pixels })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.app.resized(size.width, size.height);
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let viewport = self.app.viewport();
        if let Err(err) = surface
            .pixels
            .resize_surface(size.width, size.height)
            .and_then(|()| surface.pixels.resize_buffer(viewport.width, viewport.height))
        {
            tracing::error!(error = %err, "resizing pixel surface failed");
        }
    }

    fn key(&mut self, event: &KeyEvent) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        let c = match &event.logical_key {
            LogicalKey::Named(NamedKey::Space) => Some(' '),
            LogicalKey::Character(s) => s.chars().next(),
            _ => None,
        };
        if let Some(key) = c.and_then(Key::from_char) {
            self.app.key_pressed(key, &mut self.dialogs);
        }
    }

    fn handle_requests(&mut self) {
        let Some(surface) = self.surface.as_ref() else {
            return;
        };
        for request in self.app.take_requests() {
            match request {
                ShellRequest::WarpCursor(p) => {
                    if let Err(err) = surface
                        .window
                        .set_cursor_position(PhysicalPosition::new(p.x, p.y))
                    {
                        tracing::warn!(error = %err, "cursor warp unsupported");
                    }
                }
                ShellRequest::ToggleFullscreen => {
                    let next = match surface.window.fullscreen() {
                        Some(_) => None,
                        None => Some(Fullscreen::Borderless(None)),
                    };
                    surface.window.set_fullscreen(next);
                }
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.app.update();
        let frame = self.app.draw();
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let target = surface.pixels.frame_mut();
        let source = frame.data_as_u8_slice();
        if target.len() == source.len() {
            target.copy_from_slice(source);
        } else {
            tracing::debug!("framebuffer size mismatch, skipping present");
        }
        if let Err(err) = surface.pixels.render() {
            self.error = Some(ReelError::render(format!("present frame: {err}")));
            event_loop.exit();
        }
        self.handle_requests();
    }
}

impl ApplicationHandler for Shell {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.surface.is_some() {
            return;
        }
        match self.create_surface(event_loop) {
            Ok(surface) => {
                let size = surface.window.inner_size();
                self.surface = Some(surface);
                self.resize(size);
                self.handle_requests();
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to open window");
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn new_events(&mut self, _event_loop: &ActiveEventLoop, cause: StartCause) {
        if let StartCause::ResumeTimeReached { .. } = cause
            && let Some(surface) = &self.surface
        {
            surface.window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => self.resize(size),
            WindowEvent::CursorMoved { position, .. } => {
                self.app.cursor_moved(Point::new(position.x, position.y));
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.key(&event);
                self.handle_requests();
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if self.next_tick <= now {
            self.next_tick = now + self.tick;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_tick));
    }
}

/// Open the installation window and run until it is closed.
pub fn run(settings: Settings, fullscreen: bool) -> ReelResult<()> {
    let viewport = Viewport::new(settings.window_width, settings.window_height)?;
    let tick = Duration::from_secs_f64(1.0 / f64::from(settings.frame_rate));
    let loader = FfmpegLoader::new(settings.assets_root.clone());

    let mut app = Installation::new(settings, viewport, Box::new(loader));
    app.setup();

    let event_loop = EventLoop::new().context("create event loop")?;
    let mut shell = Shell {
        app,
        dialogs: NativeDialogs,
        start_fullscreen: fullscreen,
        tick,
        next_tick: Instant::now(),
        surface: None,
        error: None,
    };
    event_loop.run_app(&mut shell).context("run event loop")?;

    match shell.error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
