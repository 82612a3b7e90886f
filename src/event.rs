//! Normalized input and lifecycle events.
//!
//! An out-of-scope input adapter translates platform mouse/keyboard
//! events into these records; the core only consumes normalized cursor
//! coordinates and button signals.

use crate::dirty::Dirty;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,
    Left,
    Right,
    Up,
    Down,
    Char(char),
}

/// An event delivered to an entity's handlers.
///
/// Cursor coordinates are in the receiving entity's local space.
#[derive(Debug, Clone)]
pub enum Event {
    /// Cursor moved while over the entity.
    CursorMove { x: f32, y: f32, dx: f32, dy: f32 },
    /// Cursor entered the entity's frame.
    CursorEnter { x: f32, y: f32 },
    /// Cursor left the entity's frame.
    CursorLeave,
    /// Button pressed over the entity.
    Press { x: f32, y: f32, button: Button },
    /// Button released over the entity.
    Release { x: f32, y: f32, button: Button },
    /// Press and release both landed on the entity.
    Click { button: Button },
    /// Key pressed while the entity had key focus.
    KeyPress { key: Key },
    /// Key released.
    KeyRelease { key: Key },
    /// The entity was attached to a parent.
    Added,
    /// The entity was detached from its parent.
    Removed,
    /// The entity was dirtied with the given flags.
    Dirty(Dirty),
}

/// Keying discriminant for handler registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    CursorMove,
    CursorEnter,
    CursorLeave,
    LeftPress,
    MiddlePress,
    RightPress,
    LeftRelease,
    MiddleRelease,
    RightRelease,
    LeftClick,
    MiddleClick,
    RightClick,
    KeyPress,
    KeyRelease,
    Added,
    Removed,
    Dirty,
}

impl EventKind {
    /// Whether handlers of this kind require cursor position forwarding
    /// into the entity's subtree.
    pub fn is_cursor_kind(&self) -> bool {
        matches!(
            self,
            EventKind::CursorMove
                | EventKind::CursorEnter
                | EventKind::CursorLeave
                | EventKind::LeftPress
                | EventKind::MiddlePress
                | EventKind::RightPress
                | EventKind::LeftRelease
                | EventKind::MiddleRelease
                | EventKind::RightRelease
                | EventKind::LeftClick
                | EventKind::MiddleClick
                | EventKind::RightClick
        )
    }

    pub fn press(button: Button) -> Self {
        match button {
            Button::Left => EventKind::LeftPress,
            Button::Middle => EventKind::MiddlePress,
            Button::Right => EventKind::RightPress,
        }
    }

    pub fn release(button: Button) -> Self {
        match button {
            Button::Left => EventKind::LeftRelease,
            Button::Middle => EventKind::MiddleRelease,
            Button::Right => EventKind::RightRelease,
        }
    }

    pub fn click(button: Button) -> Self {
        match button {
            Button::Left => EventKind::LeftClick,
            Button::Middle => EventKind::MiddleClick,
            Button::Right => EventKind::RightClick,
        }
    }
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::CursorMove { .. } => EventKind::CursorMove,
            Event::CursorEnter { .. } => EventKind::CursorEnter,
            Event::CursorLeave => EventKind::CursorLeave,
            Event::Press { button, .. } => EventKind::press(*button),
            Event::Release { button, .. } => EventKind::release(*button),
            Event::Click { button } => EventKind::click(*button),
            Event::KeyPress { .. } => EventKind::KeyPress,
            Event::KeyRelease { .. } => EventKind::KeyRelease,
            Event::Added => EventKind::Added,
            Event::Removed => EventKind::Removed,
            Event::Dirty(_) => EventKind::Dirty,
        }
    }

    pub fn coords(&self) -> Option<(f32, f32)> {
        match self {
            Event::CursorMove { x, y, .. }
            | Event::CursorEnter { x, y }
            | Event::Press { x, y, .. }
            | Event::Release { x, y, .. } => Some((*x, *y)),
            _ => None,
        }
    }

    /// The same event with coordinates mapped into another space.
    pub fn with_coords(&self, new_x: f32, new_y: f32) -> Self {
        match self {
            Event::CursorMove { dx, dy, .. } => Event::CursorMove {
                x: new_x,
                y: new_y,
                dx: *dx,
                dy: *dy,
            },
            Event::CursorEnter { .. } => Event::CursorEnter { x: new_x, y: new_y },
            Event::Press { button, .. } => Event::Press {
                x: new_x,
                y: new_y,
                button: *button,
            },
            Event::Release { button, .. } => Event::Release {
                x: new_x,
                y: new_y,
                button: *button,
            },
            other => other.clone(),
        }
    }
}
