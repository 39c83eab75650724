use glam::Vec2;
use std::collections::HashSet;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use super::controller::{Button, Controller};

/// Pixels of trackpad scroll that count as one wheel line
const PIXELS_PER_LINE: f32 = 50.0;

/// Adapter that bridges Winit events to the Controller trait
///
/// Besides button state it accumulates the left-button drag and the wheel
/// since the last `take_*` call, which is what the orbit camera consumes.
#[derive(Debug, Clone, Default)]
pub struct WinitController {
    pressed: HashSet<Button>,
    cursor: Option<Vec2>,
    drag: Vec2,
    scroll: f32,
}

impl WinitController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a Winit WindowEvent and update internal state
    pub fn process_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(keycode) = event.physical_key {
                    if let Some(button) = Self::keycode_to_button(keycode) {
                        self.button_changed(button, event.state == ElementState::Pressed);
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(button) = Self::mouse_button_to_button(*button) {
                    self.button_changed(button, *state == ElementState::Pressed);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::CursorLeft { .. } => self.cursor = None,
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
                };
                self.scrolled(lines);
            }
            WindowEvent::Focused(false) => self.pressed.clear(),
            _ => {}
        }
    }

    /// Handle an event the overlay already consumed.
    ///
    /// Presses stay with the overlay, but releases and focus loss are still
    /// applied so no button is left held.
    pub fn process_consumed_event(&mut self, event: &WindowEvent) {
        let releases = match event {
            WindowEvent::KeyboardInput { event, .. } => event.state == ElementState::Released,
            WindowEvent::MouseInput { state, .. } => *state == ElementState::Released,
            WindowEvent::Focused(false) => true,
            _ => false,
        };
        if releases {
            self.process_event(event);
        }
    }

    pub fn button_changed(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.pressed.insert(button);
        } else {
            self.pressed.remove(&button);
        }
    }

    pub fn cursor_moved(&mut self, position: Vec2) {
        if let Some(previous) = self.cursor {
            if self.is_down(Button::MouseLeft) {
                self.drag += position - previous;
            }
        }
        self.cursor = Some(position);
    }

    /// Wheel lines, positive away from the user
    pub fn scrolled(&mut self, lines: f32) {
        self.scroll += lines;
    }

    /// Drag accumulated since the last call
    pub fn take_drag(&mut self) -> Vec2 {
        std::mem::take(&mut self.drag)
    }

    /// Wheel lines accumulated since the last call
    pub fn take_scroll(&mut self) -> f32 {
        std::mem::take(&mut self.scroll)
    }

    fn keycode_to_button(keycode: KeyCode) -> Option<Button> {
        match keycode {
            KeyCode::Escape => Some(Button::Escape),
            _ => None,
        }
    }

    fn mouse_button_to_button(button: MouseButton) -> Option<Button> {
        match button {
            MouseButton::Left => Some(Button::MouseLeft),
            MouseButton::Right => Some(Button::MouseRight),
            _ => None,
        }
    }
}

impl Controller for WinitController {
    fn is_down(&self, button: Button) -> bool {
        self.pressed.contains(&button)
    }

    fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mouse(button: MouseButton, state: ElementState) -> WindowEvent {
        WindowEvent::MouseInput {
            device_id: winit::event::DeviceId::dummy(),
            state,
            button,
        }
    }

    #[test]
    fn test_new_controller_empty() {
        let mut controller = WinitController::new();
        assert!(!controller.is_down(Button::MouseLeft));
        assert_eq!(controller.cursor(), None);
        assert_eq!(controller.take_drag(), Vec2::ZERO);
        assert_eq!(controller.take_scroll(), 0.0);
    }

    #[test]
    fn test_drag_only_while_left_down() {
        let mut controller = WinitController::new();
        controller.cursor_moved(Vec2::new(10.0, 10.0));
        controller.cursor_moved(Vec2::new(20.0, 10.0));
        assert_eq!(controller.take_drag(), Vec2::ZERO);

        controller.button_changed(Button::MouseLeft, true);
        controller.cursor_moved(Vec2::new(25.0, 13.0));
        controller.cursor_moved(Vec2::new(30.0, 15.0));
        assert_eq!(controller.take_drag(), Vec2::new(10.0, 5.0));
        assert_eq!(controller.take_drag(), Vec2::ZERO);

        controller.button_changed(Button::MouseLeft, false);
        controller.cursor_moved(Vec2::new(0.0, 0.0));
        assert_eq!(controller.take_drag(), Vec2::ZERO);
        assert_eq!(controller.cursor(), Some(Vec2::ZERO));
    }

    #[test]
    fn test_scroll_accumulates() {
        let mut controller = WinitController::new();
        controller.scrolled(1.0);
        controller.scrolled(0.5);
        assert_eq!(controller.take_scroll(), 1.5);
        assert_eq!(controller.take_scroll(), 0.0);
    }

    #[test]
    fn test_consumed_release_still_lifts_button() {
        let mut controller = WinitController::new();
        controller.process_event(&mouse(MouseButton::Left, ElementState::Pressed));
        assert!(controller.is_down(Button::MouseLeft));

        controller.process_consumed_event(&mouse(MouseButton::Left, ElementState::Released));
        assert!(!controller.is_down(Button::MouseLeft));

        controller.cursor_moved(Vec2::new(5.0, 5.0));
        controller.cursor_moved(Vec2::new(50.0, 5.0));
        assert_eq!(controller.take_drag(), Vec2::ZERO);
    }

    #[test]
    fn test_consumed_press_is_ignored() {
        let mut controller = WinitController::new();
        controller.process_consumed_event(&mouse(MouseButton::Left, ElementState::Pressed));
        assert!(!controller.is_down(Button::MouseLeft));
    }

    #[test]
    fn test_consumed_focus_loss_clears_buttons() {
        let mut controller = WinitController::new();
        controller.button_changed(Button::MouseRight, true);
        controller.process_consumed_event(&WindowEvent::Focused(false));
        assert!(!controller.is_down(Button::MouseRight));
    }
}
