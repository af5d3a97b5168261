use smithay::{
    input::keyboard::{Keysym, ModifiersState},
    utils::{Logical, Point},
};
use tracing::{debug, trace, warn};

use crate::{
    desktop_shell::KeyModifiers,
    errors::{Result, ShellError},
    grabs::resize_grab::ResizeEdge,
    ids::{SeatId, ShellSurfaceId, SurfaceId, ViewId},
    seat::{BTN_LEFT, BTN_RIGHT, ButtonState, KeyState},
    state::{Shell, ShellEvent},
    view::ViewOwner,
};

/// Transform chains deeper than this are treated as broken.
const MAX_RAISE_DEPTH: usize = 64;

impl Shell {
    /// The pointer moved to `location`, in global coordinates.
    pub fn pointer_motion(&mut self, seat: SeatId, time: u32, location: Point<f64, Logical>) {
        let Some(seat_state) = self.seats.get_mut(&seat) else {
            warn!(%seat, "motion on unknown seat");
            return;
        };
        seat_state.pointer.set_location(location);

        if self.dispatch_grab(seat, |grab, shell| grab.focus(shell, seat)) {
            self.dispatch_grab(seat, |grab, shell| grab.motion(shell, seat, time));
            return;
        }

        self.repick_pointer_focus(seat);
        self.send_pointer_motion(seat, time);
    }

    pub fn pointer_button(&mut self, seat: SeatId, time: u32, button: u32, state: ButtonState) {
        let Some(seat_state) = self.seats.get_mut(&seat) else {
            warn!(%seat, "button on unknown seat");
            return;
        };
        seat_state.pointer.update_button(time, button, state);

        if self.dispatch_grab(seat, |grab, shell| grab.button(shell, seat, time, button, state)) {
            return;
        }

        if state == ButtonState::Pressed {
            // A press may come without any motion before it.
            self.repick_pointer_focus(seat);

            if let Some((window, local)) = self.window_under_pointer(seat) {
                if let Err(err) = self.activate_shell_surface(seat, window) {
                    warn!(%seat, shell_surface = %window, "failed to activate window: {err}");
                }

                let main_key_held = self
                    .seats
                    .get(&seat)
                    .is_some_and(|s| self.config.main_key.matches(&s.keyboard.modifiers));
                if main_key_held && (button == BTN_LEFT || button == BTN_RIGHT) {
                    let started = if button == BTN_LEFT {
                        self.move_shell_surface(window, seat)
                    } else {
                        let size = self
                            .shell_surface_geometry(window)
                            .map(|r| r.size)
                            .unwrap_or_default();
                        let edges = resize_edges_from_local_point(local, size.w, size.h);
                        self.resize_shell_surface(window, seat, edges.bits())
                    };
                    started
                        .map_err(|err| warn!(%seat, "failed to start window grab: {err}"))
                        .ok();
                    return;
                }
            }
        }

        self.send_pointer_button(seat, time, button, state);
    }

    pub fn keyboard_modifiers(&mut self, seat: SeatId, modifiers: ModifiersState) {
        match self.seats.get_mut(&seat) {
            Some(s) => s.keyboard.modifiers = modifiers,
            None => warn!(%seat, "modifiers on unknown seat"),
        }
    }

    /// Runs bindings on key presses and forwards everything else to the
    /// keyboard focus.
    pub fn keyboard_key(&mut self, seat: SeatId, time: u32, keysym: Keysym, state: KeyState) {
        let Some(seat_state) = self.seats.get(&seat) else {
            warn!(%seat, "key on unknown seat");
            return;
        };
        let modifiers = seat_state.keyboard.modifiers;
        let focus = seat_state.keyboard.focus;

        if state == KeyState::Pressed && self.handle_keybinding(seat, &modifiers, keysym) {
            return;
        }

        if let Some(surface) = focus {
            self.emit(ShellEvent::Key {
                seat,
                surface,
                time,
                keysym: keysym.raw(),
                state,
            });
        }
    }

    fn handle_keybinding(&mut self, seat: SeatId, modifiers: &ModifiersState, keysym: Keysym) -> bool {
        if !self.locked {
            let mask = KeyModifiers::from_state(modifiers);
            if let Some(binding) = self.desktop.binding_for(keysym.raw(), mask) {
                debug!(%binding, "desktop binding triggered");
                self.emit(ShellEvent::BindingTriggered(binding));
                return true;
            }
        }

        let Some(action) = self.config.keybind_action_for(modifiers, keysym) else {
            return false;
        };
        if self.locked && !action.allowed_while_locked() {
            return false;
        }
        action
            .execute(self, seat)
            .map_err(|err| warn!(?action, "keybinding failed: {err}"))
            .ok();
        true
    }

    /// Topmost view under a global point, and the point in that view's
    /// coordinates.
    pub fn pick_view(&self, point: Point<f64, Logical>) -> Option<(ViewId, Point<f64, Logical>)> {
        let output = self.outputs.get(&self.output_at(point)?)?;
        self.scene
            .flatten(&output.input_layers())
            .into_iter()
            .find_map(|view| {
                let surface = self.surfaces.get(&self.scene.view(view)?.surface)?;
                let local = self.scene.map_from_global(view, point);
                surface
                    .bounding_box()
                    .to_f64()
                    .contains(local)
                    .then_some((view, local))
            })
    }

    fn window_under_pointer(&self, seat: SeatId) -> Option<(ShellSurfaceId, Point<f64, Logical>)> {
        let location = self.seats.get(&seat)?.pointer.location();
        let (view, local) = self.pick_view(location)?;
        match self.scene.view(view)?.owner {
            ViewOwner::Window(id) | ViewOwner::WindowExtra(id) => Some((id, local)),
            _ => None,
        }
    }

    /// Points the seat at `view`. Hovered notifications that ignore input
    /// fade out and never take the focus.
    pub(crate) fn set_pointer_focus(
        &mut self,
        seat: SeatId,
        view: Option<ViewId>,
        location: Point<f64, Logical>,
    ) {
        let view = self.notification_hover(seat, view);
        let Some(pointer) = self.seats.get_mut(&seat).map(|s| &mut s.pointer) else {
            return;
        };
        if pointer.focus == view {
            return;
        }
        pointer.focus = view;
        let surface = view.and_then(|v| self.scene.view(v)).map(|v| v.surface);
        trace!(%seat, ?surface, "pointer focus");
        self.emit(ShellEvent::PointerFocus {
            seat,
            surface,
            location,
        });
    }

    pub(crate) fn repick_pointer_focus(&mut self, seat: SeatId) {
        let Some(location) = self.seats.get(&seat).map(|s| s.pointer.location()) else {
            return;
        };
        match self.pick_view(location) {
            Some((view, local)) => self.set_pointer_focus(seat, Some(view), local),
            None => self.set_pointer_focus(seat, None, location),
        }
    }

    pub(crate) fn send_pointer_motion(&mut self, seat: SeatId, time: u32) {
        let Some(pointer) = self.seats.get(&seat).map(|s| &s.pointer) else {
            return;
        };
        let Some(view) = pointer.focus else {
            return;
        };
        let location = self.scene.map_from_global(view, pointer.location());
        if let Some(surface) = self.scene.view(view).map(|v| v.surface) {
            self.emit(ShellEvent::PointerMotion {
                seat,
                surface,
                time,
                location,
            });
        }
    }

    pub(crate) fn send_pointer_button(
        &mut self,
        seat: SeatId,
        time: u32,
        button: u32,
        state: ButtonState,
    ) {
        let surface = self
            .seats
            .get(&seat)
            .and_then(|s| s.pointer.focus)
            .and_then(|view| self.scene.view(view))
            .map(|v| v.surface);
        if let Some(surface) = surface {
            self.emit(ShellEvent::PointerButton {
                seat,
                surface,
                time,
                button,
                state,
            });
        }
    }

    /// Moves the seat's keyboard focus. While locked only the lock surface
    /// may take it.
    pub fn set_keyboard_focus(&mut self, seat: SeatId, surface: Option<SurfaceId>) {
        if self.locked && surface.is_some() && surface != self.lock_focus {
            debug!(%seat, ?surface, "keyboard focus refused while locked");
            return;
        }
        let Some(keyboard) = self.seats.get_mut(&seat).map(|s| &mut s.keyboard) else {
            return;
        };
        let old = keyboard.focus;
        if old == surface {
            return;
        }
        keyboard.focus = surface;

        if let Some(old) = old {
            self.emit(ShellEvent::Deactivated { seat, surface: old });
        }
        if let Some(new) = surface {
            self.emit(ShellEvent::Activated { seat, surface: new });
        }
        self.emit(ShellEvent::KeyboardFocus { seat, surface });

        for window in [old, surface]
            .into_iter()
            .flatten()
            .filter_map(|s| self.shell_surface_for(s))
        {
            self.send_window_state(window);
        }
    }

    /// Raises every view of the window and gives it the keyboard unless it
    /// refuses activation.
    pub fn activate_shell_surface(&mut self, seat: SeatId, id: ShellSurfaceId) -> Result<()> {
        let ss = self
            .shell_surfaces
            .get(&id)
            .ok_or(ShellError::UnknownShellSurface(id))?;
        let surface = ss.surface;
        let views: Vec<_> = ss.views().collect();
        for view in views {
            self.raise_view_tree(view, 0);
        }
        if self.surfaces.get(&surface).is_some_and(|s| s.activable) {
            self.set_keyboard_focus(seat, Some(surface));
        }
        Ok(())
    }

    /// Raises a view, then everything stacked on it so dialogs and popups
    /// stay above their parent.
    fn raise_view_tree(&mut self, view: ViewId, depth: usize) {
        if depth > MAX_RAISE_DEPTH {
            return;
        }
        self.scene.raise_on_top(view);
        for dependent in self.scene.dependents(view) {
            self.raise_view_tree(dependent, depth + 1);
        }
    }
}

/// Picks the corner nearest to the grabbed point.
fn resize_edges_from_local_point(local: Point<f64, Logical>, width: i32, height: i32) -> ResizeEdge {
    let width = width.max(1) as f64;
    let height = height.max(1) as f64;

    let horizontal = if local.x < width / 2.0 {
        ResizeEdge::LEFT
    } else {
        ResizeEdge::RIGHT
    };
    let vertical = if local.y < height / 2.0 {
        ResizeEdge::TOP
    } else {
        ResizeEdge::BOTTOM
    };

    horizontal | vertical
}
