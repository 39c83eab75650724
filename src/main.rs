use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use fishbones::cli::Cli;
use fishbones::config::Config;
use fishbones::core::{Button, Controller, FpsCounter, WinitController};
use fishbones::frame::FrameClock;
use fishbones::loaders::load_model;
use fishbones::renderer::{OverlayStats, Renderer};
use fishbones::session::Session;

struct App {
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    session: Session,
    input: WinitController,
    clock: FrameClock,
    fps: FpsCounter,
}

impl App {
    fn new(session: Session) -> Self {
        Self {
            window: None,
            renderer: None,
            session,
            input: WinitController::new(),
            clock: FrameClock::new(),
            fps: FpsCounter::default(),
        }
    }

    fn redraw(&mut self) {
        let Some(frame) = self.clock.next() else {
            return;
        };
        if let Some(fps) = self.fps.tick(frame.delta) {
            log::trace!("FPS: {:.1}", fps);
        }

        self.session.drag(self.input.take_drag());
        self.session.zoom(self.input.take_scroll());
        self.session.tick(frame.delta);

        if let (Some(renderer), Some(window)) = (&mut self.renderer, &self.window) {
            let stats = OverlayStats::from_session(&self.session, self.fps.fps());
            if let Err(e) = renderer.render(&self.session, window, &stats) {
                log::error!("Render error: {}", e);
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let config = self.session.config();
        let transparent = config.background[3] < 1.0;
        let attributes = Window::default_attributes()
            .with_title(config.window.title.clone())
            .with_transparent(transparent)
            .with_inner_size(winit::dpi::LogicalSize::new(config.window.width, config.window.height));

        let window = match event_loop.create_window(attributes) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let renderer = match pollster::block_on(Renderer::new(window.clone(), config.background, config.ui)) {
            Ok(r) => r,
            Err(e) => {
                log::error!("Failed to initialize renderer: {}", e);
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.session.resize(size.width, size.height);
        self.window = Some(window);
        self.renderer = Some(renderer);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        // Let egui handle the event first
        if let (Some(renderer), Some(window)) = (&mut self.renderer, &self.window) {
            if renderer.handle_event(window, &event) {
                self.input.process_consumed_event(&event);
                return;
            }
        }

        self.input.process_event(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { .. } if self.input.is_down(Button::Escape) => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(size.width, size.height);
                }
                self.session.resize(size.width, size.height);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.session.pointer_moved(position.x as f32, position.y as f32);
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::resolve(&cli)?;
    log::info!("Starting {:?} demo with {}", config.demo, config.model.path.display());

    let model = load_model(&config.model.path);
    let mut session = Session::new(config.clone(), config.window.width, config.window.height);
    session.attach(model);

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = App::new(session);

    if config.orbit.is_some() {
        log::info!("Controls: drag to orbit, wheel to zoom, Escape to quit");
    } else {
        log::info!("Controls: Escape to quit");
    }
    event_loop.run_app(&mut app).context("Event loop terminated with an error")?;

    Ok(())
}
