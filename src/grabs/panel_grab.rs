use tracing::warn;

use crate::{
    grabs::{GrabKind, GrabStatus, PointerGrab},
    ids::{PanelId, SeatId},
    output::PanelPosition,
    seat::ButtonState,
    state::Shell,
};

/// Docks a panel to whichever output edge the pointer is closest to.
pub struct PanelGrab {
    pub panel: PanelId,
}

impl PointerGrab for PanelGrab {
    fn kind(&self) -> GrabKind {
        GrabKind::Panel(self.panel)
    }

    fn motion(&mut self, shell: &mut Shell, seat: SeatId, _time: u32) -> GrabStatus {
        let Some(location) = shell.seat(seat).map(|s| s.pointer.location()) else {
            return GrabStatus::End;
        };
        let Some((output, current)) = shell.panel(self.panel).map(|p| (p.output, p.position))
        else {
            return GrabStatus::End;
        };
        let Some(geometry) = shell.output(output).map(|o| o.geometry().to_f64()) else {
            return GrabStatus::End;
        };

        let local = location - geometry.loc;
        let distances = [
            (PanelPosition::Top, local.y),
            (PanelPosition::Left, local.x),
            (PanelPosition::Bottom, geometry.size.h - local.y),
            (PanelPosition::Right, geometry.size.w - local.x),
        ];
        let mut nearest = distances[0];
        for candidate in distances {
            if candidate.1 < nearest.1 {
                nearest = candidate;
            }
        }

        if nearest.0 != current
            && let Err(err) = shell.panel_set_position(self.panel, nearest.0 as u32)
        {
            warn!(panel = %self.panel, "cannot dock panel: {err}");
            return GrabStatus::End;
        }
        GrabStatus::Continue
    }

    fn button(
        &mut self,
        shell: &mut Shell,
        seat: SeatId,
        _time: u32,
        _button: u32,
        state: ButtonState,
    ) -> GrabStatus {
        let idle = shell
            .seat(seat)
            .is_none_or(|s| s.pointer.button_count() == 0);
        if state == ButtonState::Released && idle {
            GrabStatus::End
        } else {
            GrabStatus::Continue
        }
    }
}
