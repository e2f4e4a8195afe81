//! Glint viewport - an on-screen [`Display`] for the progressive renderer.
//!
//! The window is driven by pumping the winit event loop once per render
//! tick instead of handing control to `EventLoop::run`, so the renderer's
//! control thread stays in charge of pacing. Each tick uploads the tone
//! mapped BGRA frame to a texture and blits it with a fullscreen triangle.

mod gpu;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use glint_math::Vec2;
use glint_renderer::{Display, InputState, Key, MouseButton, Pixel};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use gpu::Gpu;

/// Pump attempts allowed for the platform to hand out the window.
const STARTUP_PUMPS: usize = 200;

/// A native window presenting the renderer's pixels.
pub struct Viewport {
    event_loop: EventLoop<()>,
    app: ViewportApp,
}

impl Viewport {
    /// Open a window of `width` x `height` physical pixels.
    pub fn new(title: &str, width: u32, height: u32) -> Result<Self> {
        let mut event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = ViewportApp::new(title, width.max(1), height.max(1));

        for _ in 0..STARTUP_PUMPS {
            let status = event_loop.pump_app_events(Some(Duration::from_millis(10)), &mut app);
            if let Some(err) = app.init_error.take() {
                return Err(err);
            }
            if app.gpu.is_some() {
                break;
            }
            if let PumpStatus::Exit(code) = status {
                return Err(anyhow!("event loop exited during startup ({code})"));
            }
        }

        if app.gpu.is_none() {
            return Err(anyhow!("window was never created"));
        }

        Ok(Self { event_loop, app })
    }

    pub fn window(&self) -> Option<&Window> {
        self.app.window.as_deref()
    }
}

impl Display for Viewport {
    fn size(&self) -> (usize, usize) {
        (self.app.size.0 as usize, self.app.size.1 as usize)
    }

    fn resized(&self) -> bool {
        self.app.resized
    }

    fn input(&self) -> &InputState {
        &self.app.input
    }

    fn pixels_mut(&mut self) -> &mut [Pixel] {
        &mut self.app.pixels
    }

    fn update(&mut self) -> bool {
        let app = &mut self.app;

        if let Some(gpu) = app.gpu.as_mut() {
            if let Err(err) = gpu.present(&app.pixels, app.size) {
                log::error!("Failed to present frame: {err:#}");
                return false;
            }
        }
        if let Some(window) = &app.window {
            window.request_redraw();
        }

        app.input.end_frame();
        app.resized = false;

        let status = self.event_loop.pump_app_events(Some(Duration::ZERO), app);
        if let PumpStatus::Exit(code) = status {
            log::info!("Event loop exited ({code})");
            return false;
        }

        !app.close_requested
    }
}

struct ViewportApp {
    title: String,
    initial_size: (u32, u32),
    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,
    init_error: Option<anyhow::Error>,

    input: InputState,
    pixels: Vec<Pixel>,
    size: (u32, u32),
    resized: bool,
    close_requested: bool,
}

impl ViewportApp {
    fn new(title: &str, width: u32, height: u32) -> Self {
        Self {
            title: title.to_string(),
            initial_size: (width, height),
            window: None,
            gpu: None,
            init_error: None,
            input: InputState::new(),
            pixels: vec![Pixel::BLACK; (width * height) as usize],
            size: (width, height),
            resized: false,
            close_requested: false,
        }
    }

    fn set_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || (width, height) == self.size {
            return;
        }
        self.size = (width, height);
        self.pixels = vec![Pixel::BLACK; (width * height) as usize];
        self.resized = true;
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.resize(self.size);
        }
    }
}

impl ApplicationHandler for ViewportApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(PhysicalSize::new(self.initial_size.0, self.initial_size.1));

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                self.init_error = Some(err.into());
                return;
            }
        };

        match pollster::block_on(Gpu::new(window.clone())) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(err) => {
                self.init_error = Some(err);
                return;
            }
        }

        // The platform may not honour the requested size
        let actual = window.inner_size();
        self.window = Some(window);
        self.set_size(actual.width, actual.height);
        self.resized = false;
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.close_requested = true;
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                self.set_size(physical_size.width, physical_size.height);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input
                    .set_cursor(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    winit::event::MouseButton::Left => MouseButton::Left,
                    winit::event::MouseButton::Middle => MouseButton::Middle,
                    winit::event::MouseButton::Right => MouseButton::Right,
                    _ => return,
                };
                self.input
                    .set_button(button, state == ElementState::Pressed);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
                self.input.add_scroll(lines);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    if let Some(key) = map_key(code) {
                        self.input
                            .set_key(key, event.state == ElementState::Pressed);
                    }
                }
            }
            _ => {}
        }
    }
}

fn map_key(code: KeyCode) -> Option<Key> {
    Some(match code {
        KeyCode::KeyW => Key::W,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyR => Key::R,
        KeyCode::KeyF => Key::F,
        KeyCode::KeyP => Key::P,
        KeyCode::Escape => Key::Escape,
        _ => return None,
    })
}
