//! Requests of the desktop-shell interface used by the companion UI client:
//! backgrounds, panels, the lock screen, desktop popups, key bindings,
//! client grabs and the window list.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::PathBuf,
};

use bitflags::bitflags;
use smithay::{
    input::keyboard::ModifiersState,
    utils::{Logical, Point, SERIAL_COUNTER},
};
use tracing::{debug, info, warn};

use crate::{
    cursor::GrabCursor,
    errors::{Result, ShellError},
    grabs::{
        GrabKind, PopupTarget, client_grab::ClientGrab, panel_grab::PanelGrab,
        popup_grab::PopupGrab,
    },
    ids::{
        BindingId, ClientGrabId, ClientId, LayerId, OutputId, PanelId, PopupId, SeatId,
        ShellSurfaceId, SurfaceId, ViewId, WorkspaceId,
    },
    output::{OutputLayers, PanelPosition},
    shell_surface::ShellSurfaceType,
    state::{Shell, ShellEvent},
    surface::{Surface, SurfaceRole},
    view::ViewOwner,
};

bitflags! {
    /// Window list state bits, as sent to and received from the companion client.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct WindowState: u32 {
        const ACTIVE = 1;
        const MINIMIZED = 2;
    }
}

bitflags! {
    /// Modifier mask of a key binding.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct KeyModifiers: u32 {
        const CTRL = 1;
        const ALT = 2;
        const SUPER = 4;
        const SHIFT = 8;
    }
}

impl KeyModifiers {
    pub fn from_state(state: &ModifiersState) -> Self {
        let mut mods = KeyModifiers::empty();
        mods.set(KeyModifiers::CTRL, state.ctrl);
        mods.set(KeyModifiers::ALT, state.alt);
        mods.set(KeyModifiers::SUPER, state.logo);
        mods.set(KeyModifiers::SHIFT, state.shift);
        mods
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Panel {
    pub output: OutputId,
    pub surface: SurfaceId,
    pub position: PanelPosition,
}

#[derive(Clone, Debug)]
pub struct DesktopPopup {
    pub parent: SurfaceId,
    pub surface: SurfaceId,
    pub x: i32,
    pub y: i32,
    pub views: Vec<ViewId>,
}

#[derive(Debug, Default)]
pub struct DesktopShell {
    /// The companion client, the only one allowed to bind.
    pub(crate) client: Option<ClientId>,
    bound: bool,
    load_serial: u32,
    loaded: bool,
    lock_requested: bool,
    grab_surface: Option<SurfaceId>,
    grab_view: Option<ViewId>,
    panels: BTreeMap<PanelId, Panel>,
    popups: BTreeMap<PopupId, DesktopPopup>,
    bindings: BTreeMap<BindingId, (u32, KeyModifiers)>,
    client_grabs: BTreeMap<ClientGrabId, SeatId>,
    /// Grabs terminated by the client; their end is not reported back.
    detached: BTreeSet<ClientGrabId>,
    windows: BTreeSet<ShellSurfaceId>,
    hold_state: bool,
}

impl DesktopShell {
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn has_window(&self, id: ShellSurfaceId) -> bool {
        self.windows.contains(&id)
    }

    pub fn popup(&self, id: PopupId) -> Option<&DesktopPopup> {
        self.popups.get(&id)
    }

    pub(crate) fn binding_for(&self, key: u32, mods: KeyModifiers) -> Option<BindingId> {
        self.bindings
            .iter()
            .find(|(_, binding)| **binding == (key, mods))
            .map(|(id, _)| *id)
    }

    pub(crate) fn forget_popup_view(&mut self, popup: PopupId, view: ViewId) {
        if let Some(p) = self.popups.get_mut(&popup) {
            p.views.retain(|v| *v != view);
        }
    }

    /// Drops the grab's bookkeeping. Returns `true` when nobody should be
    /// told the grab ended.
    pub(crate) fn take_detached_grab(&mut self, id: ClientGrabId) -> bool {
        self.client_grabs.remove(&id);
        self.detached.remove(&id) || !self.bound
    }
}

impl Shell {
    pub fn desktop(&self) -> &DesktopShell {
        &self.desktop
    }

    pub fn panel(&self, id: PanelId) -> Option<&Panel> {
        self.desktop.panels.get(&id)
    }

    /// Marks the client allowed to bind the desktop-shell interface.
    pub fn set_desktop_client(&mut self, client: ClientId) {
        self.desktop.client = Some(client);
    }

    pub fn bind(&mut self, client: ClientId) -> Result<()> {
        if self.desktop.client != Some(client) {
            warn!(%client, "refusing desktop_shell bind");
            return Err(ShellError::PermissionDenied(client));
        }
        self.desktop.bound = true;
        info!(%client, "desktop shell bound");

        let workspaces: Vec<_> = self.workspaces.keys().copied().collect();
        for workspace in workspaces {
            self.emit(ShellEvent::WorkspaceAdded(workspace));
        }
        self.resend_workspace_states(None);

        let windows: Vec<_> = self
            .shell_surfaces
            .values()
            .filter(|ss| self.scene.is_surface_mapped(ss.surface) || ss.is_minimized())
            .map(|ss| ss.id)
            .collect();
        for window in windows {
            self.add_window_entry(window);
        }

        if self.locked && self.desktop.lock_requested {
            self.emit(ShellEvent::Locked);
        }
        self.emit(ShellEvent::Load);
        Ok(())
    }

    /// The companion client went away: everything it bound is released.
    pub(crate) fn client_exited(&mut self) {
        info!("desktop shell client exited");
        self.desktop.bound = false;
        self.desktop.client = None;
        self.desktop.loaded = false;
        self.desktop.load_serial = 0;
        self.desktop.grab_surface = None;
        if let Some(view) = self.desktop.grab_view.take() {
            self.destroy_view(view);
        }
        self.desktop.windows.clear();
        self.desktop.bindings.clear();

        let grabs: Vec<_> = self
            .desktop
            .client_grabs
            .iter()
            .map(|(id, seat)| (*id, *seat))
            .collect();
        for (id, seat) in grabs {
            self.desktop.detached.insert(id);
            self.end_grab_of(seat, GrabKind::Client(id));
        }
        self.desktop.detached.clear();
        self.desktop.client_grabs.clear();
    }

    fn resend_workspace_states(&mut self, output: Option<OutputId>) {
        let active: Vec<_> = self
            .outputs
            .keys()
            .filter(|o| output.is_none_or(|wanted| wanted == **o))
            .filter_map(|o| self.pager.active(*o).map(|ws| (ws, *o)))
            .collect();
        for (workspace, output) in active {
            self.emit(ShellEvent::WorkspaceActivated { workspace, output });
        }
    }

    fn output_layer(
        &self,
        output: OutputId,
        pick: impl Fn(&OutputLayers) -> LayerId,
    ) -> Result<LayerId> {
        self.outputs
            .get(&output)
            .map(|o| pick(&o.layers))
            .ok_or(ShellError::UnknownOutput(output))
    }

    fn claim_role(&mut self, surface: SurfaceId, role: SurfaceRole, label: &str) -> Result<()> {
        let s = self.surface_mut(surface)?;
        s.set_role(role)?;
        s.label = label.to_owned();
        Ok(())
    }

    /// Maps the view at the layer's front while the surface has content and
    /// unmaps it otherwise.
    fn show_if_content(&mut self, view: ViewId, layer: LayerId) {
        let has_content = self
            .scene
            .view(view)
            .and_then(|v| self.surfaces.get(&v.surface))
            .is_some_and(Surface::has_content);
        let mapped = self.scene.view(view).is_some_and(|v| v.is_mapped());
        match (has_content, mapped) {
            (true, false) => self.scene.add_view(layer, view),
            (false, true) => self.scene.unlink_view(view),
            _ => {}
        }
    }

    pub fn set_background(&mut self, output: OutputId, surface: SurfaceId) -> Result<()> {
        let layer = self.output_layer(output, |l| l.background)?;
        self.claim_role(surface, SurfaceRole::Background, "background")?;

        let old = self.outputs.get_mut(&output).and_then(|o| o.background.take());
        if let Some(old) = old {
            self.destroy_view(old);
        }
        let view = self
            .scene
            .create_view(surface, ViewOwner::Background, Some(output));
        if let Some(o) = self.outputs.get_mut(&output) {
            o.background = Some(view);
        }
        self.show_if_content(view, layer);
        debug!(%output, %surface, "background set");
        Ok(())
    }

    pub(crate) fn configure_background(&mut self, surface: SurfaceId) {
        let views: Vec<_> = self
            .outputs
            .values()
            .filter_map(|o| o.background.map(|v| (v, o.layers.background)))
            .filter(|(v, _)| self.scene.view(*v).is_some_and(|v| v.surface == surface))
            .collect();
        for (view, layer) in views {
            self.show_if_content(view, layer);
        }
    }

    pub fn set_panel(
        &mut self,
        id: PanelId,
        output: OutputId,
        surface: SurfaceId,
        position: u32,
    ) -> Result<()> {
        let position = PanelPosition::try_from(position)?;
        if !self.outputs.contains_key(&output) {
            return Err(ShellError::UnknownOutput(output));
        }
        self.claim_role(surface, SurfaceRole::Panel, "panel")?;
        if self.desktop.panels.contains_key(&id) {
            self.destroy_panel(id);
        }

        let view = self
            .scene
            .create_view(surface, ViewOwner::Panel(id), Some(output));
        if let Some(o) = self.outputs.get_mut(&output) {
            o.panels.insert(id, view);
        }
        self.desktop.panels.insert(
            id,
            Panel {
                output,
                surface,
                position,
            },
        );
        debug!(panel = %id, %output, ?position, "panel created");
        self.place_panel(id);
        Ok(())
    }

    pub fn panel_set_position(&mut self, id: PanelId, position: u32) -> Result<()> {
        let position = PanelPosition::try_from(position)?;
        let panel = self
            .desktop
            .panels
            .get_mut(&id)
            .ok_or(ShellError::UnknownPanel(id))?;
        panel.position = position;
        self.place_panel(id);
        Ok(())
    }

    /// Lets the user drag the panel to another edge.
    pub fn panel_move(&mut self, id: PanelId, seat: SeatId) -> Result<()> {
        if !self.desktop.panels.contains_key(&id) {
            return Err(ShellError::UnknownPanel(id));
        }
        self.start_grab(seat, Box::new(PanelGrab { panel: id }), Some(GrabCursor::Move))
    }

    fn place_panel(&mut self, id: PanelId) {
        let Some(panel) = self.desktop.panels.get(&id).copied() else {
            return;
        };
        let Some(output) = self.outputs.get(&panel.output) else {
            return;
        };
        let Some(view) = output.panels.get(&id).copied() else {
            return;
        };
        let layer = output.layers.panels;
        let area = output.geometry().size;
        let (size, has_content) = self
            .surfaces
            .get(&panel.surface)
            .map(|s| (s.size(), s.has_content()))
            .unwrap_or_default();

        let pos = match panel.position {
            PanelPosition::Top | PanelPosition::Left => Point::from((0, 0)),
            PanelPosition::Bottom => Point::from((0, area.h - size.h)),
            PanelPosition::Right => Point::from((area.w - size.w, 0)),
        };
        self.scene.set_pos(view, pos);
        self.show_if_content(view, layer);

        let thickness = match panel.position {
            PanelPosition::Top | PanelPosition::Bottom => size.h,
            PanelPosition::Left | PanelPosition::Right => size.w,
        };
        let changed = match self.outputs.get_mut(&panel.output) {
            Some(o) if has_content => o.set_exclusive_zone(id, panel.position, thickness),
            Some(o) => o.remove_exclusive_zone(id),
            None => false,
        };
        if changed {
            self.available_geometry_changed(panel.output);
        }
    }

    pub fn destroy_panel(&mut self, id: PanelId) {
        let Some(panel) = self.desktop.panels.remove(&id) else {
            return;
        };
        self.end_grabs_where(|kind| kind == GrabKind::Panel(id));
        let (view, changed) = match self.outputs.get_mut(&panel.output) {
            Some(o) => (o.panels.remove(&id), o.remove_exclusive_zone(id)),
            None => (None, false),
        };
        if let Some(view) = view {
            self.destroy_view(view);
        }
        if changed {
            self.available_geometry_changed(panel.output);
        }
        debug!(panel = %id, "panel destroyed");
    }

    pub(crate) fn configure_panels_of(&mut self, surface: SurfaceId) {
        let panels: Vec<_> = self
            .desktop
            .panels
            .iter()
            .filter(|(_, p)| p.surface == surface)
            .map(|(id, _)| *id)
            .collect();
        for panel in panels {
            self.place_panel(panel);
        }
    }

    pub(crate) fn destroy_panels_of(&mut self, surface: SurfaceId) {
        let panels: Vec<_> = self
            .desktop
            .panels
            .iter()
            .filter(|(_, p)| p.surface == surface)
            .map(|(id, _)| *id)
            .collect();
        for panel in panels {
            self.destroy_panel(panel);
        }
    }

    /// Forgets the panels of an output that is going away. Their views are
    /// destroyed with the output.
    pub(crate) fn desktop_output_removed(&mut self, output: OutputId) {
        self.desktop.panels.retain(|_, p| p.output != output);
    }

    pub fn set_lock_surface(&mut self, surface: SurfaceId, output: OutputId) -> Result<()> {
        let layer = self.output_layer(output, |l| l.lock)?;
        self.claim_role(surface, SurfaceRole::Lock, "lock")?;

        let old = self.outputs.get_mut(&output).and_then(|o| o.lock_view.take());
        if let Some(old) = old {
            self.destroy_view(old);
        }
        let view = self.scene.create_view(surface, ViewOwner::Lock, Some(output));
        if let Some(o) = self.outputs.get_mut(&output) {
            o.lock_view = Some(view);
        }
        self.show_if_content(view, layer);

        self.lock_focus = Some(surface);
        if self.locked {
            self.focus_all_keyboards(Some(surface));
        }
        Ok(())
    }

    pub(crate) fn configure_lock_surface(&mut self, surface: SurfaceId) {
        let views: Vec<_> = self
            .outputs
            .values()
            .filter_map(|o| o.lock_view.map(|v| (v, o.layers.lock)))
            .filter(|(v, _)| self.scene.view(*v).is_some_and(|v| v.surface == surface))
            .collect();
        for (view, layer) in views {
            self.show_if_content(view, layer);
        }
    }

    pub fn add_overlay(&mut self, output: OutputId, surface: SurfaceId) -> Result<()> {
        let layer = self.output_layer(output, |l| l.overlay)?;
        self.claim_role(surface, SurfaceRole::Overlay, "overlay")?;
        let view = self
            .scene
            .create_view(surface, ViewOwner::Overlay, Some(output));
        if let Some(o) = self.outputs.get_mut(&output) {
            o.overlays.push(view);
        }
        self.show_if_content(view, layer);
        Ok(())
    }

    pub(crate) fn configure_overlay(&mut self, surface: SurfaceId) {
        let views: Vec<_> = self
            .outputs
            .values()
            .flat_map(|o| o.overlays.iter().map(|v| (*v, o.layers.overlay)))
            .filter(|(v, _)| self.scene.view(*v).is_some_and(|v| v.surface == surface))
            .collect();
        for (view, layer) in views {
            self.show_if_content(view, layer);
        }
    }

    /// Opens a shell popup (a panel menu, say) next to `parent`. A press
    /// outside of it, once the grace period has passed, asks the client to
    /// close it.
    pub fn set_desktop_popup(
        &mut self,
        id: PopupId,
        parent: SurfaceId,
        surface: SurfaceId,
        x: i32,
        y: i32,
    ) -> Result<()> {
        if !self.surfaces.contains_key(&parent) {
            return Err(ShellError::UnknownSurface(parent));
        }
        self.claim_role(surface, SurfaceRole::Popup, "popup")?;
        self.desktop.popups.insert(
            id,
            DesktopPopup {
                parent,
                surface,
                x,
                y,
                views: Vec::new(),
            },
        );

        let Some(seat) = self.first_seat() else {
            warn!(popup = %id, "no seat to grab for popup");
            return Ok(());
        };
        let creation_time = self
            .seats
            .get(&seat)
            .map(|s| s.pointer.grab_start().time)
            .unwrap_or_default();
        let grab = PopupGrab::new(
            PopupTarget::Desktop(id),
            surface,
            creation_time,
            self.config.popup_grace_ms,
        );
        self.start_grab(seat, Box::new(grab), None)
    }

    pub(crate) fn configure_desktop_popups(&mut self, surface: SurfaceId) {
        let popups: Vec<_> = self
            .desktop
            .popups
            .iter()
            .filter(|(_, p)| p.surface == surface)
            .map(|(id, _)| *id)
            .collect();
        let size = self.surfaces.get(&surface).map(|s| s.size()).unwrap_or_default();
        if size.w == 0 {
            return;
        }

        for id in popups {
            let Some(popup) = self.desktop.popups.get(&id) else {
                continue;
            };
            let (parent, offset) = (popup.parent, Point::<i32, Logical>::from((popup.x, popup.y)));

            if popup.views.is_empty() {
                let parents: Vec<_> = self
                    .scene
                    .views_of_surface(parent)
                    .map(|v| (v.id, v.output, v.layer()))
                    .collect();
                let mut views = Vec::with_capacity(parents.len());
                for (parent_view, output, layer) in parents {
                    let view = self.scene.create_view(surface, ViewOwner::Popup(id), output);
                    self.scene.set_transform_parent(view, Some(parent_view));
                    if let Some(layer) = layer {
                        self.scene.add_view(layer, view);
                    }
                    views.push(view);
                }
                if let Some(popup) = self.desktop.popups.get_mut(&id) {
                    popup.views = views;
                }
            }

            let views = self
                .desktop
                .popups
                .get(&id)
                .map(|p| p.views.clone())
                .unwrap_or_default();
            for view in views {
                let Some(v) = self.scene.view(view) else {
                    continue;
                };
                let (Some(parent_view), Some(output)) = (v.transform_parent(), v.output) else {
                    continue;
                };
                let Some(area) = self.outputs.get(&output).map(|o| o.geometry()) else {
                    continue;
                };
                let parent_local = self.scene.global_pos(parent_view) - area.loc;
                let mut local = parent_local + offset;
                local.x = local.x.max(0);
                if local.x + size.w > area.size.w {
                    local.x = area.size.w - size.w;
                }
                local.y = local.y.max(0);
                if local.y + size.h > area.size.h {
                    local.y = area.size.h - size.h;
                }
                self.scene.set_pos(view, local - parent_local);
            }
        }
    }

    pub(crate) fn destroy_popups_of(&mut self, surface: SurfaceId) {
        let popups: Vec<_> = self
            .desktop
            .popups
            .iter()
            .filter(|(_, p)| p.surface == surface)
            .map(|(id, _)| *id)
            .collect();
        for id in popups {
            self.end_grabs_where(|kind| kind == GrabKind::Popup(PopupTarget::Desktop(id)));
            if let Some(popup) = self.desktop.popups.remove(&id) {
                for view in popup.views {
                    self.destroy_view(view);
                }
            }
        }
    }

    /// Locks the session. Locking an already locked session only repeats
    /// the notification.
    pub fn lock(&mut self) {
        if !self.locked {
            self.lock_outputs();
        }
        self.desktop.lock_requested = true;
        self.emit(ShellEvent::Locked);
    }

    pub fn unlock(&mut self) {
        if self.locked {
            self.unlock_outputs();
        }
        self.desktop.lock_requested = false;
        self.emit(ShellEvent::Unlocked);
    }

    /// The surface that takes pointer focus while a grab cursor is shown.
    pub fn set_grab_surface(&mut self, surface: SurfaceId) -> Result<()> {
        if self.desktop.grab_surface == Some(surface) {
            return Ok(());
        }
        self.claim_role(surface, SurfaceRole::GrabSurface, "grab")?;
        if let Some(old) = self.desktop.grab_view.take() {
            self.destroy_view(old);
        }
        let view = self.scene.create_view(surface, ViewOwner::GrabSurface, None);
        self.desktop.grab_surface = Some(surface);
        self.desktop.grab_view = Some(view);
        Ok(())
    }

    pub(crate) fn focus_grab_surface(&mut self, seat: SeatId) {
        if !self.desktop.bound {
            return;
        }
        let Some(view) = self.desktop.grab_view else {
            return;
        };
        let Some(location) = self.seats.get(&seat).map(|s| s.pointer.location()) else {
            return;
        };
        self.set_pointer_focus(seat, Some(view), location);
    }

    pub(crate) fn clear_grab_surface(&mut self, surface: SurfaceId) {
        if self.desktop.grab_surface != Some(surface) {
            return;
        }
        self.desktop.grab_surface = None;
        if let Some(view) = self.desktop.grab_view.take() {
            self.destroy_view(view);
        }
    }

    pub fn add_key_binding(&mut self, id: BindingId, key: u32, modifiers: u32) {
        let modifiers = KeyModifiers::from_bits_truncate(modifiers);
        debug!(binding = %id, key, ?modifiers, "key binding added");
        self.desktop.bindings.insert(id, (key, modifiers));
    }

    /// Starts a pointer grab reported to the companion client.
    pub fn create_grab(&mut self, id: ClientGrabId) -> Result<()> {
        let client = self
            .desktop
            .client
            .filter(|_| self.desktop.bound)
            .ok_or(ShellError::NotBound)?;
        let seat = self.first_seat().ok_or(ShellError::NoSeat)?;
        let pressed = self
            .seats
            .get(&seat)
            .is_some_and(|s| s.pointer.button_count() > 0);

        self.desktop.client_grabs.insert(id, seat);
        self.start_grab(seat, Box::new(ClientGrab::new(id, client, pressed)), None)
    }

    /// Ends a client grab on the client's request; no end event follows.
    pub fn terminate_grab(&mut self, id: ClientGrabId) -> Result<()> {
        let seat = *self
            .desktop
            .client_grabs
            .get(&id)
            .ok_or(ShellError::UnknownGrab(id))?;
        self.desktop.detached.insert(id);
        self.end_grab_of(seat, GrabKind::Client(id));
        if self.grab_kind(seat) != Some(GrabKind::Client(id)) {
            self.desktop.detached.remove(&id);
            self.desktop.client_grabs.remove(&id);
        }
        Ok(())
    }

    pub fn select_workspace(&mut self, output: OutputId, workspace: WorkspaceId) -> Result<()> {
        self.activate_workspace(workspace, output)
    }

    /// The client bound the output: a fresh load serial is handed out and
    /// the workspace state repeated for it.
    pub fn output_bound(&mut self, output: OutputId) -> Result<u32> {
        let name = self
            .outputs
            .get(&output)
            .map(|o| o.name.clone())
            .ok_or(ShellError::UnknownOutput(output))?;
        let serial = u32::from(SERIAL_COUNTER.next_serial());
        self.desktop.load_serial = serial;
        self.desktop.loaded = false;
        self.emit(ShellEvent::OutputLoad {
            output,
            name,
            serial,
        });
        self.resend_workspace_states(Some(output));
        Ok(serial)
    }

    /// Only the latest serial counts, and only once.
    pub fn output_loaded(&mut self, serial: u32) {
        let desktop = &mut self.desktop;
        if serial == 0 || serial != desktop.load_serial || desktop.loaded {
            debug!(serial, current = desktop.load_serial, "ignoring stale output load ack");
            return;
        }
        desktop.loaded = true;
        desktop.load_serial = 0;
        info!("desktop shell loaded");
        self.emit(ShellEvent::Loaded);

        let cursors: Vec<_> = self
            .seats
            .values()
            .filter_map(|s| s.pointer.cursor().map(|c| (s.id, c)))
            .collect();
        for (seat, cursor) in cursors {
            self.emit(ShellEvent::GrabCursor {
                seat,
                cursor: Some(cursor),
            });
        }
    }

    pub(crate) fn add_window_entry(&mut self, id: ShellSurfaceId) {
        if !self.desktop.bound {
            return;
        }
        let Some(ss) = self.shell_surfaces.get(&id) else {
            return;
        };
        if ss.ty() != ShellSurfaceType::Toplevel || !self.desktop.windows.insert(id) {
            return;
        }
        let pid = ss.pid();
        let title = if ss.title().is_empty() {
            pid.and_then(process_name).unwrap_or_default()
        } else {
            ss.title().to_owned()
        };
        self.emit(ShellEvent::WindowAdded {
            shell_surface: id,
            pid,
            title,
        });
        self.send_window_state(id);
    }

    pub(crate) fn remove_window_entry(&mut self, id: ShellSurfaceId) {
        if self.desktop.windows.remove(&id) {
            self.emit(ShellEvent::WindowRemoved(id));
        }
    }

    pub(crate) fn send_window_state(&mut self, id: ShellSurfaceId) {
        if self.desktop.hold_state || !self.desktop.windows.contains(&id) {
            return;
        }
        let state = self.window_state(id);
        self.emit(ShellEvent::WindowState {
            shell_surface: id,
            state,
        });
    }

    /// Window list request: minimize, restore or activate the window. One
    /// state update is sent back at the end.
    pub fn window_set_state(&mut self, id: ShellSurfaceId, output: OutputId, state: u32) -> Result<()> {
        let state = WindowState::from_bits_truncate(state);
        self.desktop.hold_state = true;
        let result = self.apply_window_state(id, output, state);
        self.desktop.hold_state = false;
        self.send_window_state(id);
        result
    }

    fn apply_window_state(&mut self, id: ShellSurfaceId, output: OutputId, state: WindowState) -> Result<()> {
        let ss = self
            .shell_surfaces
            .get(&id)
            .ok_or(ShellError::UnknownShellSurface(id))?;
        let minimized = ss.is_minimized();
        let workspace = ss.workspace();

        if minimized && !state.contains(WindowState::MINIMIZED) {
            self.restore(id)?;
        } else if !minimized && state.contains(WindowState::MINIMIZED) {
            self.minimize(id)?;
        }

        if state.contains(WindowState::ACTIVE) && !state.contains(WindowState::MINIMIZED) {
            if let Some(workspace) = workspace {
                self.activate_workspace(workspace, output)?;
            }
            if let Some(seat) = self.first_seat() {
                self.activate_shell_surface(seat, id)?;
            }
        }
        Ok(())
    }

    pub fn window_close(&mut self, id: ShellSurfaceId) -> Result<()> {
        self.close(id)
    }

    pub fn window_preview(&mut self, id: ShellSurfaceId, output: OutputId) -> Result<()> {
        self.preview(id, output)
    }

    pub fn window_end_preview(&mut self, id: ShellSurfaceId) -> Result<()> {
        self.end_preview(id)
    }
}

/// Executable name of a process, used as a window title fallback.
fn process_name(pid: i32) -> Option<String> {
    let exe = std::fs::read_link(PathBuf::from(format!("/proc/{pid}/exe"))).ok()?;
    exe.file_name().map(|name| name.to_string_lossy().into_owned())
}
