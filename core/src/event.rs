//! Event payloads delivered to registered listeners.
//!
//! Hosts translate native input into an [`Event`] and dispatch it by
//! [`HandlerId`](crate::HandlerId). Higher level interactions (taps, drags,
//! pinches) are synthesized by recognizers sitting on top of the raw pointer and
//! key events defined here.

use ripple_str::Str;

/// A two-dimensional point in the coordinate space of the target node.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal component.
    pub x: f32,
    /// Vertical component.
    pub y: f32,
}

impl Point {
    /// Creates a new [`Point`].
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Represents the phase of a pointer interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    /// The pointer was pressed.
    Down,
    /// The pointer moved while tracked.
    Move,
    /// The pointer was released.
    Up,
    /// The interaction was cancelled by the host.
    Cancel,
}

/// Raw pointer input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Location of the pointer.
    pub location: Point,
    /// Phase of the interaction.
    pub phase: PointerPhase,
    /// Host-defined button index, `0` being the primary button.
    pub button: u8,
}

/// Raw keyboard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// Logical key name, e.g. `"Enter"` or `"a"`.
    pub key: Str,
    /// `true` on key down, `false` on key up.
    pub pressed: bool,
}

/// Event specific data.
#[derive(Debug, Clone, PartialEq, Default)]
#[non_exhaustive]
pub enum EventDetail {
    /// The event carries no data (e.g. `focus`).
    #[default]
    None,
    /// Pointer input.
    Pointer(PointerEvent),
    /// Keyboard input.
    Key(KeyEvent),
    /// New value of a text input.
    Input(Str),
}

/// An event dispatched to a listener.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    name: Str,
    detail: EventDetail,
}

impl Event {
    /// Creates an event without payload.
    #[must_use]
    pub fn new(name: impl Into<Str>) -> Self {
        Self {
            name: name.into(),
            detail: EventDetail::None,
        }
    }

    /// Creates a pointer event.
    #[must_use]
    pub fn pointer(name: impl Into<Str>, pointer: PointerEvent) -> Self {
        Self::new(name).with_detail(EventDetail::Pointer(pointer))
    }

    /// Creates a key event.
    #[must_use]
    pub fn key(name: impl Into<Str>, key: impl Into<Str>, pressed: bool) -> Self {
        Self::new(name).with_detail(EventDetail::Key(KeyEvent {
            key: key.into(),
            pressed,
        }))
    }

    /// Creates an `input` event carrying the new text value.
    #[must_use]
    pub fn input(value: impl Into<Str>) -> Self {
        Self::new("input").with_detail(EventDetail::Input(value.into()))
    }

    /// Replaces the payload.
    #[must_use]
    pub fn with_detail(mut self, detail: EventDetail) -> Self {
        self.detail = detail;
        self
    }

    /// Returns the event name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the payload.
    #[must_use]
    pub const fn detail(&self) -> &EventDetail {
        &self.detail
    }

    /// Returns the text value if this is an input event.
    #[must_use]
    pub fn input_value(&self) -> Option<&str> {
        match &self.detail {
            EventDetail::Input(value) => Some(value),
            _ => None,
        }
    }
}
