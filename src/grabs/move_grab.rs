use smithay::utils::{Logical, Point};

use crate::{
    grabs::{GrabKind, GrabStatus, PointerGrab},
    ids::{SeatId, ShellSurfaceId, ViewId},
    seat::ButtonState,
    state::Shell,
};

/// Drags a window with the pointer, snapping its edges to the output's
/// usable area.
pub struct MoveGrab {
    pub shell_surface: ShellSurfaceId,
    pub view: ViewId,
    /// Window position minus pointer position when the grab started.
    pub offset: Point<f64, Logical>,
}

impl MoveGrab {
    pub fn new(shell: &Shell, seat: SeatId, shell_surface: ShellSurfaceId, view: ViewId) -> Self {
        let pointer = shell
            .seat(seat)
            .map(|s| s.pointer.location())
            .unwrap_or_else(|| Point::from((0.0, 0.0)));
        let offset = shell.scene().global_pos(view).to_f64() - pointer;
        Self {
            shell_surface,
            view,
            offset,
        }
    }
}

impl PointerGrab for MoveGrab {
    fn kind(&self) -> GrabKind {
        GrabKind::Move(self.shell_surface)
    }

    fn motion(&mut self, shell: &mut Shell, seat: SeatId, _time: u32) -> GrabStatus {
        let Some(pointer) = shell.seat(seat).map(|s| s.pointer.location()) else {
            return GrabStatus::End;
        };
        let Some(geometry) = shell.shell_surface_geometry(self.shell_surface) else {
            return GrabStatus::End;
        };
        let output = shell
            .scene()
            .view(self.view)
            .and_then(|v| v.output)
            .or_else(|| shell.output_at(pointer));

        let mut p = pointer + self.offset;
        if let Some(output) = output {
            let top_left = geometry.loc.to_f64();
            let bottom_right = (geometry.loc + geometry.size).to_f64();

            if let Some(snapped) = shell.snap_pos(output, p + bottom_right) {
                p = snapped - bottom_right;
            }
            if let Some(snapped) = shell.snap_pos(output, p + top_left) {
                p = snapped - top_left;
            }
        }

        shell.move_views(self.shell_surface, Point::from((p.x as i32, p.y as i32)));
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

#[cfg(test)]
mod tests {
    use smithay::utils::{Rectangle, Size};

    use super::*;
    use crate::{config::ShellConfig, seat::BTN_LEFT};

    #[test]
    fn dragging_snaps_to_output_edges_and_ends_on_release() {
        let mut config = ShellConfig::default();
        config.snap_margin = 10;
        let mut shell = Shell::new(config);
        shell.add_output(
            "A",
            Rectangle::new(Point::from((0, 0)), Size::from((800, 600))),
        );
        let seat = shell.add_seat("seat0");
        let client = shell.create_client(None);
        let surface = shell.create_surface(client).unwrap();
        let ss = shell.create_shell_surface(surface).unwrap();
        shell.set_toplevel(ss).unwrap();
        shell
            .commit_surface(surface, Size::from((200, 100)), Point::from((0, 0)))
            .unwrap();
        shell.move_views(ss, Point::from((100, 100)));

        shell.pointer_motion(seat, 0, Point::from((150.0, 120.0)));
        shell.pointer_button(seat, 1, BTN_LEFT, ButtonState::Pressed);
        shell.move_shell_surface(ss, seat).unwrap();

        // The window would land at (5, 100); its left edge snaps to 0.
        shell.pointer_motion(seat, 2, Point::from((55.0, 120.0)));
        assert_eq!(shell.window_position(ss), Some(Point::from((0, 100))));

        // Bottom-right corner at (795, 597) pulls to (800, 600).
        shell.pointer_motion(seat, 3, Point::from((645.0, 517.0)));
        assert_eq!(shell.window_position(ss), Some(Point::from((600, 500))));

        shell.pointer_button(seat, 4, BTN_LEFT, ButtonState::Released);
        assert_eq!(shell.grab_kind(seat), None);
        shell.pointer_motion(seat, 5, Point::from((300.0, 300.0)));
        assert_eq!(shell.window_position(ss), Some(Point::from((600, 500))));
    }
}
