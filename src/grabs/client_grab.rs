use smithay::utils::{Logical, Point};

use crate::{
    grabs::{GrabKind, GrabStatus, PointerGrab},
    ids::{ClientGrabId, ClientId, SeatId, ViewId},
    seat::ButtonState,
    state::{Shell, ShellEvent},
};

/// Routes the pointer to the desktop-shell client that asked for it.
pub struct ClientGrab {
    pub id: ClientGrabId,
    pub client: ClientId,
    current_focus: Option<ViewId>,
    /// The button that was down when the grab started; its release still
    /// goes to the window under the pointer.
    pressed: bool,
}

impl ClientGrab {
    pub fn new(id: ClientGrabId, client: ClientId, pressed: bool) -> Self {
        Self {
            id,
            client,
            current_focus: None,
            pressed,
        }
    }

    fn local(&self, shell: &Shell, location: Point<f64, Logical>) -> Point<f64, Logical> {
        match self.current_focus {
            Some(view) => shell.scene().map_from_global(view, location),
            None => location,
        }
    }
}

impl PointerGrab for ClientGrab {
    fn kind(&self) -> GrabKind {
        GrabKind::Client(self.id)
    }

    fn focus(&mut self, shell: &mut Shell, seat: SeatId) -> GrabStatus {
        let Some(location) = shell.seat(seat).map(|s| s.pointer.location()) else {
            return GrabStatus::End;
        };
        let Some((view, local)) = shell.pick_view(location) else {
            return GrabStatus::Continue;
        };
        let Some(surface) = shell.scene().view(view).map(|v| v.surface) else {
            return GrabStatus::Continue;
        };
        if shell.surface(surface).map(|s| s.client) != Some(self.client) {
            return GrabStatus::Continue;
        }
        if self.current_focus != Some(view) {
            self.current_focus = Some(view);
            shell.emit(ShellEvent::GrabFocus {
                grab: self.id,
                surface,
                location: local,
            });
        }
        GrabStatus::Continue
    }

    fn motion(&mut self, shell: &mut Shell, seat: SeatId, time: u32) -> GrabStatus {
        let Some(location) = shell.seat(seat).map(|s| s.pointer.location()) else {
            return GrabStatus::End;
        };
        let location = self.local(shell, location);
        shell.emit(ShellEvent::GrabMotion {
            grab: self.id,
            time,
            location,
        });
        GrabStatus::Continue
    }

    fn button(
        &mut self,
        shell: &mut Shell,
        seat: SeatId,
        time: u32,
        button: u32,
        state: ButtonState,
    ) -> GrabStatus {
        let start_button = shell.seat(seat).map(|s| s.pointer.grab_start().button);
        if self.pressed && state == ButtonState::Released && start_button == Some(button) {
            shell.send_pointer_button(seat, time, button, state);
            self.pressed = false;
        }
        shell.emit(ShellEvent::GrabButton {
            grab: self.id,
            time,
            button,
            state,
        });
        GrabStatus::Continue
    }

    fn ended(&mut self, shell: &mut Shell, _seat: SeatId) {
        if !shell.desktop.take_detached_grab(self.id) {
            shell.emit(ShellEvent::GrabEnded(self.id));
        }
    }
}
