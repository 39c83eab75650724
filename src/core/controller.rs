use glam::Vec2;

/// Input button identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Escape,
    MouseLeft,
    MouseRight,
}

/// Read-only view of the current input state
pub trait Controller {
    /// Check if button is currently down
    fn is_down(&self, button: Button) -> bool;

    /// Last cursor position in window pixels, `None` once it leaves the window
    fn cursor(&self) -> Option<Vec2>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct MockController {
        pressed: Vec<Button>,
        cursor: Option<Vec2>,
    }

    impl Controller for MockController {
        fn is_down(&self, button: Button) -> bool {
            self.pressed.contains(&button)
        }

        fn cursor(&self) -> Option<Vec2> {
            self.cursor
        }
    }

    #[test]
    fn test_button_hash() {
        let set: HashSet<_> = [Button::Escape, Button::MouseLeft, Button::MouseLeft].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&Button::MouseLeft));
        assert!(!set.contains(&Button::MouseRight));
    }

    #[test]
    fn test_mock_controller() {
        let controller = MockController {
            pressed: vec![Button::MouseLeft],
            cursor: Some(Vec2::new(3.0, 4.0)),
        };
        assert!(controller.is_down(Button::MouseLeft));
        assert!(!controller.is_down(Button::Escape));
        assert_eq!(controller.cursor(), Some(Vec2::new(3.0, 4.0)));
    }
}
