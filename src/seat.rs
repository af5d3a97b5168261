use smithay::{
    input::keyboard::ModifiersState,
    utils::{Logical, Point},
};

use crate::{
    cursor::GrabCursor,
    grabs::{GrabKind, PointerGrab},
    ids::{SeatId, SurfaceId, ViewId},
};

/// Linux evdev code of the primary mouse button.
pub const BTN_LEFT: u32 = 0x110;
pub const BTN_RIGHT: u32 = 0x111;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonState {
    Pressed,
    Released,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Where and when the button sequence that may start a grab began.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrabStartData {
    pub location: Point<f64, Logical>,
    pub button: u32,
    pub time: u32,
}

impl Default for GrabStartData {
    fn default() -> Self {
        Self {
            location: Point::from((0.0, 0.0)),
            button: 0,
            time: 0,
        }
    }
}

pub struct Pointer {
    location: Point<f64, Logical>,
    pub(crate) focus: Option<ViewId>,
    pressed: Vec<u32>,
    start: GrabStartData,
    pub(crate) grab: Option<Box<dyn PointerGrab>>,
    pub(crate) grab_kind: Option<GrabKind>,
    pub(crate) grab_serial: u64,
    pub(crate) end_requested: bool,
    pub(crate) cursor: Option<GrabCursor>,
}

impl std::fmt::Debug for Pointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pointer")
            .field("location", &self.location)
            .field("focus", &self.focus)
            .field("pressed", &self.pressed)
            .field("grab", &self.grab_kind)
            .field("cursor", &self.cursor)
            .finish()
    }
}

impl Default for Pointer {
    fn default() -> Self {
        Self {
            location: Point::from((0.0, 0.0)),
            focus: None,
            pressed: Vec::new(),
            start: GrabStartData::default(),
            grab: None,
            grab_kind: None,
            grab_serial: 0,
            end_requested: false,
            cursor: None,
        }
    }
}

impl Pointer {
    pub fn location(&self) -> Point<f64, Logical> {
        self.location
    }

    pub(crate) fn set_location(&mut self, location: Point<f64, Logical>) {
        self.location = location;
    }

    pub fn focus(&self) -> Option<ViewId> {
        self.focus
    }

    pub fn button_count(&self) -> usize {
        self.pressed.len()
    }

    pub fn grab_start(&self) -> GrabStartData {
        self.start
    }

    pub fn grab_kind(&self) -> Option<GrabKind> {
        self.grab_kind
    }

    pub fn is_grabbed(&self) -> bool {
        self.grab_kind.is_some()
    }

    pub fn cursor(&self) -> Option<GrabCursor> {
        self.cursor
    }

    /// Records the press or release. The first press of a sequence becomes
    /// the grab start data.
    pub(crate) fn update_button(&mut self, time: u32, button: u32, state: ButtonState) {
        match state {
            ButtonState::Pressed => {
                if self.pressed.is_empty() {
                    self.start = GrabStartData {
                        location: self.location,
                        button,
                        time,
                    };
                }
                if !self.pressed.contains(&button) {
                    self.pressed.push(button);
                }
            }
            ButtonState::Released => self.pressed.retain(|b| *b != button),
        }
    }
}

#[derive(Debug, Default)]
pub struct Keyboard {
    pub(crate) focus: Option<SurfaceId>,
    pub(crate) modifiers: ModifiersState,
}

impl Keyboard {
    pub fn focus(&self) -> Option<SurfaceId> {
        self.focus
    }

    pub fn modifiers(&self) -> &ModifiersState {
        &self.modifiers
    }
}

#[derive(Debug)]
pub struct Seat {
    pub id: SeatId,
    pub name: String,
    pub pointer: Pointer,
    pub keyboard: Keyboard,
}

impl Seat {
    pub fn new(id: SeatId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            pointer: Pointer::default(),
            keyboard: Keyboard::default(),
        }
    }
}
