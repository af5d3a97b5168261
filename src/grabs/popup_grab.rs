use tracing::debug;

use crate::{
    grabs::{GrabKind, GrabStatus, PointerGrab, PopupTarget},
    ids::{SeatId, SurfaceId},
    seat::ButtonState,
    state::{Shell, ShellEvent},
};

/// Keeps a popup open until the user presses a button outside of it.
pub struct PopupGrab {
    pub target: PopupTarget,
    pub surface: SurfaceId,
    inside: bool,
    creation_time: u32,
    grace_ms: u32,
}

impl PopupGrab {
    /// `creation_time` is the time of the button press that opened the popup.
    /// Presses outside within `grace_ms` of it are ignored.
    pub fn new(target: PopupTarget, surface: SurfaceId, creation_time: u32, grace_ms: u32) -> Self {
        Self {
            target,
            surface,
            inside: false,
            creation_time,
            grace_ms,
        }
    }
}

impl PointerGrab for PopupGrab {
    fn kind(&self) -> GrabKind {
        GrabKind::Popup(self.target)
    }

    fn focus(&mut self, shell: &mut Shell, seat: SeatId) -> GrabStatus {
        let Some(pointer) = shell.seat(seat).map(|s| &s.pointer) else {
            return GrabStatus::End;
        };
        if pointer.button_count() > 0 {
            return GrabStatus::Continue;
        }
        let location = pointer.location();
        let current = pointer.focus();

        let picked = shell.pick_view(location);
        self.inside = picked
            .and_then(|(view, _)| shell.scene().view(view))
            .is_some_and(|v| v.surface == self.surface);

        match picked {
            Some((view, local)) if self.inside => {
                if current != Some(view) {
                    shell.set_pointer_focus(seat, Some(view), local);
                }
            }
            _ => shell.set_pointer_focus(seat, None, location),
        }
        GrabStatus::Continue
    }

    fn motion(&mut self, shell: &mut Shell, seat: SeatId, time: u32) -> GrabStatus {
        shell.send_pointer_motion(seat, time);
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
        shell.send_pointer_button(seat, time, button, state);

        let elapsed = time.wrapping_sub(self.creation_time);
        if !self.inside && state == ButtonState::Pressed && elapsed >= self.grace_ms {
            debug!(%seat, target = ?self.target, elapsed, "press outside popup, closing");
            match self.target {
                PopupTarget::Desktop(popup) => shell.emit(ShellEvent::PopupClose(popup)),
                PopupTarget::Window(shell_surface) => shell.send_popup_done(shell_surface),
            }
            return GrabStatus::End;
        }
        GrabStatus::Continue
    }
}
