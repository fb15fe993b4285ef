use glam::Vec2;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use crate::renderer::camera::CameraBounds;

/// Pointer state handed to the advance program for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    /// World space position.
    pub position: Vec2,
    pub pressed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    None,
    Exit,
}

/// Keeps the latest cursor position and primary button state.
/// Only the state at sampling time matters; events in between are not queued.
#[derive(Debug, Default)]
pub struct InputManager {
    cursor: Vec2,
    pressed: bool,
}

impl InputManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn manage_input(&mut self, event: &WindowEvent) -> InputAction {
        match event {
            WindowEvent::CloseRequested => InputAction::Exit,
            WindowEvent::KeyboardInput {
                event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(KeyCode::Escape),
                    state: ElementState::Pressed,
                    ..
                },
                ..
            } => InputAction::Exit,
            WindowEvent::CursorMoved { position, .. } => {
                self.set_cursor(Vec2::new(position.x as f32, position.y as f32));
                InputAction::None
            }
            WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => {
                self.set_pressed(state.is_pressed());
                InputAction::None
            }
            _ => InputAction::None,
        }
    }

    pub fn set_cursor(&mut self, cursor: Vec2) {
        self.cursor = cursor;
    }

    pub fn set_pressed(&mut self, pressed: bool) {
        self.pressed = pressed;
    }

    /// Converts the latest pointer state from window pixels into world space.
    pub fn sample(&self, bounds: &CameraBounds, window_size: Vec2) -> PointerSample {
        PointerSample {
            position: bounds.screen_to_world(self.cursor, window_size),
            pressed: self.pressed,
        }
    }
}
