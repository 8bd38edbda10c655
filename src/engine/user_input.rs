//! Input handling (winit -> engine events).
//!
//! `Windowing` forwards raw window events here; `UserInput` keeps a small
//! `InputState` and turns the interesting transitions into queued `Event`s:
//! - left press: select (place the model at the reticle)
//! - `x`: enter / leave the immersive session
//! - right drag: orbit the preview camera

use std::collections::HashSet;

use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::Key;

use crate::engine::event_queue::{Event, EventQueue};

/// Keys and buttons currently held, plus the last cursor position.
#[derive(Default, Debug, Clone)]
pub struct InputState {
    pub keys_down: HashSet<Key>,
    pub mouse_down: HashSet<MouseButton>,

    /// Physical pixels.
    pub cursor_pos: Option<(f32, f32)>,
}

impl InputState {
    #[inline]
    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.mouse_down.contains(&button)
    }
}

/// Abstract user intent, independent of the device that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputAction {
    Select,
    ToggleSession,
    Orbit { dx: f32, dy: f32 },
}

impl From<InputAction> for Event {
    fn from(action: InputAction) -> Self {
        match action {
            InputAction::Select => Event::Select,
            InputAction::ToggleSession => Event::ToggleSession,
            InputAction::Orbit { dx, dy } => Event::Orbit { dx, dy },
        }
    }
}

/// Turns raw window events into queued viewer actions.
#[derive(Default, Debug, Clone)]
pub struct UserInput {
    state: InputState,
}

impl UserInput {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_toggle_key(key: &Key) -> bool {
        matches!(key, Key::Character(c) if c.eq_ignore_ascii_case("x"))
    }

    pub fn on_key(&mut self, key: Key, state: ElementState) -> Option<InputAction> {
        match state {
            ElementState::Pressed => {
                let was_down = !self.state.keys_down.insert(key.clone());
                (!was_down && Self::is_toggle_key(&key)).then_some(InputAction::ToggleSession)
            }
            ElementState::Released => {
                self.state.keys_down.remove(&key);
                None
            }
        }
    }

    pub fn on_mouse_button(&mut self, button: MouseButton, state: ElementState) -> Option<InputAction> {
        match state {
            ElementState::Pressed => {
                let was_down = !self.state.mouse_down.insert(button);
                (!was_down && button == MouseButton::Left).then_some(InputAction::Select)
            }
            ElementState::Released => {
                self.state.mouse_down.remove(&button);
                None
            }
        }
    }

    pub fn on_cursor_moved(&mut self, x: f32, y: f32) -> Option<InputAction> {
        let prev = self.state.cursor_pos.replace((x, y));
        match prev {
            Some((px, py)) if self.state.mouse_down(MouseButton::Right) => Some(InputAction::Orbit {
                dx: x - px,
                dy: y - py,
            }),
            _ => None,
        }
    }

    /// Queue whatever action `event` maps to. `false` for non-input events.
    pub fn handle_window_event(&mut self, event: &WindowEvent, queue: &mut EventQueue) -> bool {
        let action = match event {
            WindowEvent::KeyboardInput { event, .. } => {
                self.on_key(event.logical_key.clone(), event.state)
            }
            WindowEvent::MouseInput { state, button, .. } => self.on_mouse_button(*button, *state),
            WindowEvent::CursorMoved { position, .. } => {
                self.on_cursor_moved(position.x as f32, position.y as f32)
            }
            _ => return false,
        };

        if let Some(action) = action {
            queue.push(action.into());
        }
        true
    }
}
