use std::sync::Arc;

use tracing::{error, info};

use crate::engine::animation_loop::AnimationLoop;
use crate::engine::universe::Universe;
use crate::engine::user_input::UserInput;
use crate::engine::xr::XrRuntime;
use crate::engine::{EngineError, EngineResult};

use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowAttributes, WindowId};

/// Desktop preview: a winit window driving the animation loop once per redraw.
pub struct Windowing;

impl Windowing {
    pub fn run_app<R: XrRuntime>(universe: Universe<R>, user_input: UserInput) -> EngineResult<()> {
        let event_loop = EventLoop::new().map_err(|e| EngineError::Windowing(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App {
            window: None,
            universe,
            user_input,
        };

        event_loop
            .run_app(&mut app)
            .map_err(|e| EngineError::Windowing(e.to_string()))?;

        Ok(())
    }
}

struct App<R: XrRuntime> {
    window: Option<Arc<Window>>,
    universe: Universe<R>,
    user_input: UserInput,
}

impl<R: XrRuntime> ApplicationHandler for App<R> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs: WindowAttributes = Window::default_attributes()
            .with_title("little-ar (x: enter AR, click: place)")
            .with_inner_size(winit::dpi::LogicalSize::new(1024.0, 768.0));

        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.universe.queue_mut().queue_resize(size.width, size.height);
        info!(width = size.width, height = size.height, "preview window created");

        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => event_loop.exit(),

            WindowEvent::Resized(size) => {
                self.universe.queue_mut().queue_resize(size.width, size.height);
                if let Some(w) = &self.window {
                    w.request_redraw();
                }
            }

            WindowEvent::RedrawRequested => {
                AnimationLoop::new(&mut self.universe).tick();

                if let Some(w) = &self.window {
                    w.pre_present_notify();
                    w.request_redraw();
                }
            }

            other => {
                self.user_input
                    .handle_window_event(&other, self.universe.queue_mut());
            }
        }
    }
}
