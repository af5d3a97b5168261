pub mod client_grab;
pub mod move_grab;
pub mod panel_grab;
pub mod popup_grab;
pub mod resize_grab;

use tracing::debug;

use crate::{
    cursor::GrabCursor,
    errors::{Result, ShellError},
    ids::{ClientGrabId, PanelId, PopupId, SeatId, ShellSurfaceId},
    seat::ButtonState,
    state::{Shell, ShellEvent},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrabStatus {
    Continue,
    End,
}

/// Which popup a dismissal grab guards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PopupTarget {
    Window(ShellSurfaceId),
    Desktop(PopupId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrabKind {
    Move(ShellSurfaceId),
    Resize(ShellSurfaceId),
    Popup(PopupTarget),
    Client(ClientGrabId),
    Panel(PanelId),
}

/// A state machine that owns a seat's pointer until it ends.
///
/// The grab is taken out of the seat while one of its callbacks runs, so the
/// callbacks get the whole shell mutably.
pub trait PointerGrab {
    fn kind(&self) -> GrabKind;

    /// The pointer moved or the scene changed beneath it.
    fn focus(&mut self, _shell: &mut Shell, _seat: SeatId) -> GrabStatus {
        GrabStatus::Continue
    }

    fn motion(&mut self, shell: &mut Shell, seat: SeatId, time: u32) -> GrabStatus;

    fn button(
        &mut self,
        shell: &mut Shell,
        seat: SeatId,
        time: u32,
        button: u32,
        state: ButtonState,
    ) -> GrabStatus;

    fn ended(&mut self, _shell: &mut Shell, _seat: SeatId) {}
}

impl Shell {
    /// Hands the seat's pointer to `grab`. A grab already running on the
    /// seat is ended first.
    pub fn start_grab(
        &mut self,
        seat: SeatId,
        mut grab: Box<dyn PointerGrab>,
        cursor: Option<GrabCursor>,
    ) -> Result<()> {
        let pointer = &mut self
            .seats
            .get_mut(&seat)
            .ok_or(ShellError::UnknownSeat(seat))?
            .pointer;

        if pointer.grab_kind.is_some() {
            match pointer.grab.take() {
                Some(previous) => {
                    debug!(%seat, kind = ?previous.kind(), "ending grab superseded by a new one");
                    self.finish_grab(seat, previous, false);
                }
                // The running grab is out of its slot mid-callback; the serial
                // bump below makes the dispatcher end it on return.
                None => debug!(%seat, "superseding grab from inside its own callback"),
            }
        }

        let kind = grab.kind();
        let serial = {
            let Some(seat_state) = self.seats.get_mut(&seat) else {
                return Err(ShellError::UnknownSeat(seat));
            };
            let pointer = &mut seat_state.pointer;
            pointer.grab_serial += 1;
            pointer.grab_kind = Some(kind);
            pointer.end_requested = false;
            pointer.grab_serial
        };
        debug!(%seat, ?kind, "grab started");
        self.set_grab_cursor(seat, cursor);

        let status = grab.focus(self, seat);
        let Some(pointer) = self.seats.get_mut(&seat).map(|s| &mut s.pointer) else {
            grab.ended(self, seat);
            return Ok(());
        };
        if pointer.grab_serial != serial {
            grab.ended(self, seat);
        } else if status == GrabStatus::End || pointer.end_requested {
            pointer.end_requested = false;
            self.finish_grab(seat, grab, true);
        } else {
            pointer.grab = Some(grab);
        }
        Ok(())
    }

    /// Ends the seat's grab, running its `ended()` before returning. Called
    /// from inside the grab's own callback, the end happens as soon as that
    /// callback returns.
    pub fn end_grab(&mut self, seat: SeatId) {
        let Some(pointer) = self.seats.get_mut(&seat).map(|s| &mut s.pointer) else {
            return;
        };
        if pointer.grab_kind.is_none() {
            return;
        }
        match pointer.grab.take() {
            Some(grab) => self.finish_grab(seat, grab, true),
            None => pointer.end_requested = true,
        }
    }

    /// Ends the grab if it is of the given kind.
    pub(crate) fn end_grab_of(&mut self, seat: SeatId, kind: GrabKind) {
        if self.grab_kind(seat) == Some(kind) {
            self.end_grab(seat);
        }
    }

    /// Ends every grab that matches `predicate`, on any seat.
    pub(crate) fn end_grabs_where(&mut self, predicate: impl Fn(GrabKind) -> bool) {
        let seats: Vec<_> = self
            .seats
            .values()
            .filter(|s| s.pointer.grab_kind.is_some_and(&predicate))
            .map(|s| s.id)
            .collect();
        for seat in seats {
            self.end_grab(seat);
        }
    }

    pub fn grab_kind(&self, seat: SeatId) -> Option<GrabKind> {
        self.seats.get(&seat).and_then(|s| s.pointer.grab_kind)
    }

    /// Runs one callback on the seat's grab. Returns `false` when the seat
    /// has no grab and the event should take the ungrabbed path.
    pub(crate) fn dispatch_grab(
        &mut self,
        seat: SeatId,
        callback: impl FnOnce(&mut dyn PointerGrab, &mut Shell) -> GrabStatus,
    ) -> bool {
        let Some(pointer) = self.seats.get_mut(&seat).map(|s| &mut s.pointer) else {
            return false;
        };
        let Some(mut grab) = pointer.grab.take() else {
            return false;
        };
        let serial = pointer.grab_serial;

        let status = callback(grab.as_mut(), self);

        let Some(pointer) = self.seats.get_mut(&seat).map(|s| &mut s.pointer) else {
            grab.ended(self, seat);
            return true;
        };
        if pointer.grab_serial != serial {
            // A new grab took over during the callback and owns the pointer now.
            grab.ended(self, seat);
        } else if status == GrabStatus::End || pointer.end_requested {
            pointer.end_requested = false;
            self.finish_grab(seat, grab, true);
        } else {
            pointer.grab = Some(grab);
        }
        true
    }

    fn finish_grab(&mut self, seat: SeatId, mut grab: Box<dyn PointerGrab>, refocus: bool) {
        if let Some(pointer) = self.seats.get_mut(&seat).map(|s| &mut s.pointer) {
            pointer.grab_kind = None;
            pointer.end_requested = false;
        }
        debug!(%seat, kind = ?grab.kind(), "grab ended");
        grab.ended(self, seat);
        self.set_grab_cursor(seat, None);
        if refocus {
            self.repick_pointer_focus(seat);
        }
    }

    pub(crate) fn set_grab_cursor(&mut self, seat: SeatId, cursor: Option<GrabCursor>) {
        let Some(pointer) = self.seats.get_mut(&seat).map(|s| &mut s.pointer) else {
            return;
        };
        if pointer.cursor == cursor {
            return;
        }
        pointer.cursor = cursor;
        self.emit(ShellEvent::GrabCursor { seat, cursor });
        if cursor.is_some() {
            self.focus_grab_surface(seat);
        }
    }
}
