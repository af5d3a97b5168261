use bitflags::bitflags;
use smithay::utils::{Logical, Size};

use crate::{
    grabs::{GrabKind, GrabStatus, PointerGrab},
    ids::{SeatId, ShellSurfaceId, ViewId},
    seat::ButtonState,
    state::{Shell, ShellEvent},
};

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ResizeEdge: u32 {
        const TOP = 1;
        const BOTTOM = 2;
        const LEFT = 4;
        const RIGHT = 8;

        const TOP_LEFT = Self::TOP.bits() | Self::LEFT.bits();
        const BOTTOM_LEFT = Self::BOTTOM.bits() | Self::LEFT.bits();
        const TOP_RIGHT = Self::TOP.bits() | Self::RIGHT.bits();
        const BOTTOM_RIGHT = Self::BOTTOM.bits() | Self::RIGHT.bits();
    }
}

impl ResizeEdge {
    /// Accepts a single edge or two adjacent ones. Opposite edges and unknown
    /// bits are rejected.
    pub fn from_wire(value: u32) -> Option<Self> {
        if value == 0 || value > 15 || value & 3 == 3 || value & 12 == 12 {
            return None;
        }
        Self::from_bits(value)
    }
}

pub struct ResizeGrab {
    pub shell_surface: ShellSurfaceId,
    pub view: ViewId,
    pub edges: ResizeEdge,
    pub initial_size: Size<i32, Logical>,
}

impl PointerGrab for ResizeGrab {
    fn kind(&self) -> GrabKind {
        GrabKind::Resize(self.shell_surface)
    }

    fn motion(&mut self, shell: &mut Shell, seat: SeatId, _time: u32) -> GrabStatus {
        let Some(pointer) = shell.seat(seat).map(|s| &s.pointer) else {
            return GrabStatus::End;
        };
        let from = shell
            .scene()
            .map_from_global(self.view, pointer.grab_start().location);
        let to = shell.scene().map_from_global(self.view, pointer.location());
        let d = to - from;

        let mut w = self.initial_size.w;
        if self.edges.contains(ResizeEdge::LEFT) {
            w -= d.x as i32;
        } else if self.edges.contains(ResizeEdge::RIGHT) {
            w += d.x as i32;
        }

        let mut h = self.initial_size.h;
        if self.edges.contains(ResizeEdge::TOP) {
            h -= d.y as i32;
        } else if self.edges.contains(ResizeEdge::BOTTOM) {
            h += d.y as i32;
        }

        let size = Size::from((w.max(1), h.max(1)));
        shell.emit(ShellEvent::Configure {
            shell_surface: self.shell_surface,
            size,
            edges: self.edges,
        });
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

    fn ended(&mut self, shell: &mut Shell, _seat: SeatId) {
        shell.clear_resize_edges(self.shell_surface);
    }
}
