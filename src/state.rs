use std::{
    collections::{BTreeMap, VecDeque},
    fmt::Write as _,
    time::Duration,
};

use smithay::utils::{Logical, Point, Rectangle, Size};
use tracing::{debug, info, warn};

use crate::{
    animation::{Animations, OnFinish, Tween, TweenValue},
    config::ShellConfig,
    cursor::GrabCursor,
    desktop_shell::{DesktopShell, WindowState},
    errors::{Result, ShellError},
    grabs::resize_grab::ResizeEdge,
    ids::{
        BindingId, ClientGrabId, ClientId, IdGen, OutputId, PopupId, SeatId, ShellSurfaceId,
        SurfaceId, ViewId, WorkspaceId,
    },
    notifications::Notifications,
    output::Output,
    placement::PlacementMemory,
    seat::{ButtonState, KeyState, Seat},
    shell_surface::ShellSurface,
    surface::{Surface, SurfaceRole},
    view::{Scene, ViewOwner},
    workspace::{Pager, Workspace},
};

/// Outbound notification, queued after the state change that caused it.
#[derive(Clone, Debug, PartialEq)]
pub enum ShellEvent {
    Mapped(ShellSurfaceId),
    Unmapped(SurfaceId),
    ContentLost(ShellSurfaceId),
    Configure {
        shell_surface: ShellSurfaceId,
        size: Size<i32, Logical>,
        edges: ResizeEdge,
    },
    PopupDone(ShellSurfaceId),
    Minimized(ShellSurfaceId),
    Restored(ShellSurfaceId),
    TitleChanged(ShellSurfaceId),
    AppIdChanged(ShellSurfaceId),
    Activated {
        seat: SeatId,
        surface: SurfaceId,
    },
    Deactivated {
        seat: SeatId,
        surface: SurfaceId,
    },
    Terminated {
        pid: i32,
    },
    PointerFocus {
        seat: SeatId,
        surface: Option<SurfaceId>,
        location: Point<f64, Logical>,
    },
    PointerMotion {
        seat: SeatId,
        surface: SurfaceId,
        time: u32,
        location: Point<f64, Logical>,
    },
    PointerButton {
        seat: SeatId,
        surface: SurfaceId,
        time: u32,
        button: u32,
        state: ButtonState,
    },
    KeyboardFocus {
        seat: SeatId,
        surface: Option<SurfaceId>,
    },
    Key {
        seat: SeatId,
        surface: SurfaceId,
        time: u32,
        keysym: u32,
        state: KeyState,
    },
    GrabCursor {
        seat: SeatId,
        cursor: Option<GrabCursor>,
    },
    Load,
    OutputLoad {
        output: OutputId,
        name: String,
        serial: u32,
    },
    Loaded,
    Locked,
    Unlocked,
    PopupClose(PopupId),
    BindingTriggered(BindingId),
    GrabFocus {
        grab: ClientGrabId,
        surface: SurfaceId,
        location: Point<f64, Logical>,
    },
    GrabMotion {
        grab: ClientGrabId,
        time: u32,
        location: Point<f64, Logical>,
    },
    GrabButton {
        grab: ClientGrabId,
        time: u32,
        button: u32,
        state: ButtonState,
    },
    GrabEnded(ClientGrabId),
    WorkspaceAdded(WorkspaceId),
    WorkspaceActivated {
        workspace: WorkspaceId,
        output: OutputId,
    },
    WorkspaceDeactivated {
        workspace: WorkspaceId,
        output: OutputId,
    },
    WindowAdded {
        shell_surface: ShellSurfaceId,
        pid: Option<i32>,
        title: String,
    },
    WindowTitle {
        shell_surface: ShellSurfaceId,
        title: String,
    },
    WindowState {
        shell_surface: ShellSurfaceId,
        state: WindowState,
    },
    WindowRemoved(ShellSurfaceId),
    Quit,
}

#[derive(Clone, Copy, Debug)]
pub struct Client {
    pub id: ClientId,
    pub pid: Option<i32>,
}

/// The window-management core: every arena, the pager and the outbound queue.
pub struct Shell {
    pub config: ShellConfig,
    pub(crate) ids: IdGen,
    pub(crate) scene: Scene,
    pub(crate) clients: BTreeMap<ClientId, Client>,
    pub(crate) surfaces: BTreeMap<SurfaceId, Surface>,
    pub(crate) shell_surfaces: BTreeMap<ShellSurfaceId, ShellSurface>,
    pub(crate) outputs: BTreeMap<OutputId, Output>,
    pub(crate) workspaces: BTreeMap<WorkspaceId, Workspace>,
    pub(crate) pager: Pager,
    pub(crate) seats: BTreeMap<SeatId, Seat>,
    pub(crate) animations: Animations,
    pub(crate) placement: PlacementMemory,
    pub(crate) desktop: DesktopShell,
    pub(crate) notifications: Notifications,
    pub(crate) locked: bool,
    pub(crate) lock_focus: Option<SurfaceId>,
    running: bool,
    events: VecDeque<ShellEvent>,
}

impl Shell {
    pub fn new(config: ShellConfig) -> Self {
        let initial_workspaces = config.workspaces;
        let mut placement = PlacementMemory::default();
        placement.clear();

        let mut shell = Self {
            config,
            ids: IdGen::default(),
            scene: Scene::new(),
            clients: BTreeMap::new(),
            surfaces: BTreeMap::new(),
            shell_surfaces: BTreeMap::new(),
            outputs: BTreeMap::new(),
            workspaces: BTreeMap::new(),
            pager: Pager::default(),
            seats: BTreeMap::new(),
            animations: Animations::default(),
            placement,
            desktop: DesktopShell::default(),
            notifications: Notifications::default(),
            locked: false,
            lock_focus: None,
            running: true,
            events: VecDeque::new(),
        };
        for _ in 0..initial_workspaces {
            shell.add_workspace();
        }
        shell
    }

    pub(crate) fn emit(&mut self, event: ShellEvent) {
        self.events.push_back(event);
    }

    pub fn drain_events(&mut self) -> Vec<ShellEvent> {
        self.events.drain(..).collect()
    }

    pub fn pending_events(&self) -> impl Iterator<Item = &ShellEvent> {
        self.events.iter()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn quit(&mut self) {
        if self.running {
            info!("shell quitting");
            self.running = false;
            self.emit(ShellEvent::Quit);
        }
    }

    pub fn create_client(&mut self, pid: Option<i32>) -> ClientId {
        let id = self.ids.next();
        self.clients.insert(id, Client { id, pid });
        debug!(client = %id, ?pid, "client connected");
        id
    }

    /// Tears down every surface of the client.
    pub fn destroy_client(&mut self, client: ClientId) {
        let surfaces: Vec<_> = self
            .surfaces
            .values()
            .filter(|s| s.client == client)
            .map(|s| s.id)
            .collect();
        for surface in surfaces {
            if let Err(err) = self.destroy_surface(surface) {
                warn!(%client, "failed to destroy surface of exiting client: {err}");
            }
        }
        if self.desktop.client == Some(client) {
            self.client_exited();
        }
        self.clients.remove(&client);
        debug!(%client, "client disconnected");
    }

    pub fn client(&self, id: ClientId) -> Option<&Client> {
        self.clients.get(&id)
    }

    pub fn create_surface(&mut self, client: ClientId) -> Result<SurfaceId> {
        if !self.clients.contains_key(&client) {
            return Err(ShellError::UnknownClient(client));
        }
        let id = self.ids.next();
        self.surfaces.insert(id, Surface::new(id, client));
        Ok(id)
    }

    pub fn surface(&self, id: SurfaceId) -> Option<&Surface> {
        self.surfaces.get(&id)
    }

    pub(crate) fn surface_mut(&mut self, id: SurfaceId) -> Result<&mut Surface> {
        self.surfaces
            .get_mut(&id)
            .ok_or(ShellError::UnknownSurface(id))
    }

    pub fn set_subsurfaces(
        &mut self,
        surface: SurfaceId,
        rects: Vec<Rectangle<i32, Logical>>,
    ) -> Result<()> {
        self.surface_mut(surface)?.set_subsurfaces(rects);
        Ok(())
    }

    /// New buffer content: records the size and runs the role's configure step.
    pub fn commit_surface(
        &mut self,
        surface: SurfaceId,
        size: Size<i32, Logical>,
        offset: Point<i32, Logical>,
    ) -> Result<()> {
        let role = {
            let s = self.surface_mut(surface)?;
            s.set_size(size);
            s.role()
        };

        match role {
            Some(SurfaceRole::ShellWindow(shell_surface)) => {
                self.configure_shell_surface(shell_surface, offset)
            }
            Some(SurfaceRole::Panel) => self.configure_panels_of(surface),
            Some(SurfaceRole::Background) => self.configure_background(surface),
            Some(SurfaceRole::Lock) => self.configure_lock_surface(surface),
            Some(SurfaceRole::Overlay) => self.configure_overlay(surface),
            Some(SurfaceRole::Popup) => self.configure_desktop_popups(surface),
            Some(SurfaceRole::Notification) => self.configure_notification(surface),
            Some(SurfaceRole::GrabSurface) | None => {}
        }

        if let Some(s) = self.surfaces.get_mut(&surface) {
            s.damage();
        }
        Ok(())
    }

    pub fn destroy_surface(&mut self, surface: SurfaceId) -> Result<()> {
        let role = self
            .surfaces
            .get(&surface)
            .ok_or(ShellError::UnknownSurface(surface))?
            .role();

        match role {
            Some(SurfaceRole::ShellWindow(shell_surface)) => {
                self.destroy_shell_surface(shell_surface)
            }
            Some(SurfaceRole::Panel) => self.destroy_panels_of(surface),
            Some(SurfaceRole::Popup) => self.destroy_popups_of(surface),
            Some(SurfaceRole::Notification) => self.destroy_notification(surface),
            Some(SurfaceRole::GrabSurface) => self.clear_grab_surface(surface),
            Some(SurfaceRole::Background | SurfaceRole::Lock | SurfaceRole::Overlay) | None => {}
        }

        let dependents: Vec<_> = self
            .shell_surfaces
            .values()
            .filter(|ss| ss.parent() == Some(surface))
            .map(|ss| ss.id)
            .collect();
        for dependent in dependents {
            self.parent_surface_destroyed(dependent);
        }

        let views: Vec<_> = self.scene.views_of_surface(surface).map(|v| v.id).collect();
        for view in views {
            self.destroy_view(view);
        }
        for output in self.outputs.values_mut() {
            if let Some(background) = output.background
                && !self.scene.views.contains_key(&background)
            {
                output.background = None;
            }
            if let Some(lock) = output.lock_view
                && !self.scene.views.contains_key(&lock)
            {
                output.lock_view = None;
            }
            let scene = &self.scene;
            output.overlays.retain(|v| scene.views.contains_key(v));
        }
        if self.lock_focus == Some(surface) {
            self.lock_focus = None;
        }
        let seats: Vec<_> = self.seats.keys().copied().collect();
        for seat in seats {
            if self.seats.get(&seat).and_then(|s| s.keyboard.focus) == Some(surface) {
                self.set_keyboard_focus(seat, None);
            }
        }

        self.surfaces.remove(&surface);
        debug!(%surface, "surface destroyed");
        Ok(())
    }

    /// Destroys a view, the desktop popups stacked on it, and every
    /// reference the shell holds to it.
    pub(crate) fn destroy_view(&mut self, view: ViewId) {
        for dependent in self.scene.dependents(view) {
            if let Some(ViewOwner::Popup(popup)) = self.scene.view(dependent).map(|v| v.owner) {
                self.desktop.forget_popup_view(popup, dependent);
                self.destroy_view(dependent);
            }
        }
        self.animations.cancel_view(view);
        self.scene.destroy_view(view);
        let seats: Vec<_> = self.seats.keys().copied().collect();
        for seat in seats {
            let focused = self.seats.get(&seat).and_then(|s| s.pointer.focus);
            if focused == Some(view) {
                self.set_pointer_focus(seat, None, Point::from((0.0, 0.0)));
            }
        }
    }

    pub fn add_output(&mut self, name: &str, geometry: Rectangle<i32, Logical>) -> OutputId {
        let id = self.ids.next();
        let output = Output::new(id, name, geometry, &mut self.scene);
        let apps = output.layers.apps;
        self.outputs.insert(id, output);
        info!(output = %id, name, ?geometry, "output added");

        let workspace_ids: Vec<_> = self.workspaces.keys().copied().collect();
        for ws in &workspace_ids {
            let layer = self.scene.create_layer(Some(id));
            self.scene.add_child_layer(apps, layer);
            self.scene.set_layer_visible(layer, false);
            if let Some(workspace) = self.workspaces.get_mut(ws) {
                workspace.layers.insert(id, layer);
            }
        }
        if let Some(activation) = self.pager.assign(id, &workspace_ids) {
            self.apply_activation(activation);
        }

        if self.locked
            && let Some(output) = self.outputs.get_mut(&id)
        {
            output.set_locked(true, &mut self.scene);
        }

        let shell_surfaces: Vec<_> = self.shell_surfaces.keys().copied().collect();
        for ss in shell_surfaces {
            self.shell_surface_output_created(ss, id);
        }
        self.notifications_output_created(id);
        id
    }

    pub fn remove_output(&mut self, id: OutputId) -> Result<()> {
        if !self.outputs.contains_key(&id) {
            return Err(ShellError::UnknownOutput(id));
        }

        let shell_surfaces: Vec<_> = self.shell_surfaces.keys().copied().collect();
        self.notifications_output_removed(id);
        self.desktop_output_removed(id);

        let Some(output) = self.outputs.remove(&id) else {
            return Err(ShellError::UnknownOutput(id));
        };
        let owned: Vec<_> = output
            .background
            .into_iter()
            .chain(output.panels.values().copied())
            .chain(output.overlays.iter().copied())
            .chain(output.lock_view)
            .collect();
        for view in owned {
            self.destroy_view(view);
        }

        for ss in shell_surfaces {
            self.shell_surface_output_removed(ss, id);
        }

        for workspace in self.workspaces.values_mut() {
            if let Some(layer) = workspace.layers.remove(&id) {
                self.scene.destroy_layer(layer);
            }
        }
        self.pager.remove_output(id);
        self.animations.cancel_output(id);
        output.destroy_layers(&mut self.scene);
        info!(output = %id, "output removed");
        Ok(())
    }

    pub fn output(&self, id: OutputId) -> Option<&Output> {
        self.outputs.get(&id)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Output> {
        self.outputs.values()
    }

    pub fn output_at(&self, point: Point<f64, Logical>) -> Option<OutputId> {
        self.outputs
            .values()
            .find(|o| o.contains(point))
            .map(|o| o.id)
    }

    pub fn add_seat(&mut self, name: &str) -> SeatId {
        let id = self.ids.next();
        self.seats.insert(id, Seat::new(id, name));
        debug!(seat = %id, name, "seat added");
        id
    }

    pub fn seat(&self, id: SeatId) -> Option<&Seat> {
        self.seats.get(&id)
    }

    pub fn first_seat(&self) -> Option<SeatId> {
        self.seats.keys().next().copied()
    }

    pub fn shell_surface(&self, id: ShellSurfaceId) -> Option<&ShellSurface> {
        self.shell_surfaces.get(&id)
    }

    pub fn shell_surface_for(&self, surface: SurfaceId) -> Option<ShellSurfaceId> {
        match self.surfaces.get(&surface)?.role()? {
            SurfaceRole::ShellWindow(id) => Some(id),
            _ => None,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn placement(&self) -> &PlacementMemory {
        &self.placement
    }

    pub fn workspace(&self, id: WorkspaceId) -> Option<&Workspace> {
        self.workspaces.get(&id)
    }

    pub fn workspaces(&self) -> impl Iterator<Item = &Workspace> {
        self.workspaces.values()
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    /// Creates a workspace with a hidden child layer on every output, and
    /// places windows that were waiting for one.
    pub fn add_workspace(&mut self) -> WorkspaceId {
        let id: WorkspaceId = self.ids.next();
        let mut workspace = Workspace::new(id, self.workspaces.len());
        let outputs: Vec<_> = self
            .outputs
            .values()
            .map(|o| (o.id, o.layers.apps))
            .collect();
        for (output, apps) in outputs {
            let layer = self.scene.create_layer(Some(output));
            self.scene.add_child_layer(apps, layer);
            self.scene.set_layer_visible(layer, false);
            workspace.layers.insert(output, layer);
        }
        self.workspaces.insert(id, workspace);
        self.emit(ShellEvent::WorkspaceAdded(id));
        debug!(workspace = %id, "workspace added");

        let workspace_ids: Vec<_> = self.workspaces.keys().copied().collect();
        let outputs: Vec<_> = self.outputs.keys().copied().collect();
        for output in outputs {
            if let Some(activation) = self.pager.assign(output, &workspace_ids) {
                self.apply_activation(activation);
            }
        }

        let waiting: Vec<_> = self
            .shell_surfaces
            .values()
            .filter(|ss| ss.workspace().is_none() && ss.next_ty() != Default::default())
            .map(|ss| ss.id)
            .collect();
        for ss in waiting {
            let has_content = self
                .shell_surfaces
                .get(&ss)
                .and_then(|s| self.surfaces.get(&s.surface))
                .is_some_and(Surface::has_content);
            if has_content && let Err(err) = self.configure_shell_surface(ss, Point::from((0, 0))) {
                warn!(shell_surface = %ss, "deferred configure failed: {err}");
            }
        }
        id
    }

    pub fn activate_workspace(&mut self, workspace: WorkspaceId, output: OutputId) -> Result<()> {
        if !self.workspaces.contains_key(&workspace) {
            return Err(ShellError::UnknownWorkspace(workspace));
        }
        if !self.outputs.contains_key(&output) {
            return Err(ShellError::UnknownOutput(output));
        }
        let activation = self.pager.activate(workspace, output);
        self.apply_activation(activation);
        Ok(())
    }

    /// Switches `output` to the workspace `delta` steps away, wrapping around.
    pub fn cycle_workspace(&mut self, output: OutputId, delta: isize) -> Result<()> {
        let order: Vec<_> = self.workspaces.keys().copied().collect();
        if order.is_empty() {
            return Ok(());
        }
        let current = self
            .pager
            .active(output)
            .and_then(|ws| order.iter().position(|w| *w == ws))
            .unwrap_or(0);
        let len = order.len() as isize;
        let next = (current as isize + delta).rem_euclid(len) as usize;
        self.activate_workspace(order[next], output)
    }

    fn apply_activation(&mut self, activation: crate::workspace::Activation) {
        for (workspace, output) in &activation.hidden {
            if let Some(layer) = self.workspaces.get(workspace).and_then(|w| w.layer(*output)) {
                self.scene.set_layer_visible(layer, false);
            }
            self.emit(ShellEvent::WorkspaceDeactivated {
                workspace: *workspace,
                output: *output,
            });
        }
        for (workspace, output) in &activation.changes {
            if let Some(layer) = self.workspaces.get(workspace).and_then(|w| w.layer(*output)) {
                self.scene.set_layer_visible(layer, true);
            }
            debug!(%workspace, %output, "workspace activated");
            self.emit(ShellEvent::WorkspaceActivated {
                workspace: *workspace,
                output: *output,
            });
        }
        if activation.changes.is_empty() {
            return;
        }
        for listener in self.pager.listeners() {
            self.shell_surface_workspace_activated(listener);
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub(crate) fn lock_outputs(&mut self) {
        self.locked = true;
        for output in self.outputs.values_mut() {
            output.set_locked(true, &mut self.scene);
        }
        self.focus_all_keyboards(self.lock_focus);
        info!("session locked");
    }

    pub(crate) fn unlock_outputs(&mut self) {
        self.locked = false;
        for output in self.outputs.values_mut() {
            output.set_locked(false, &mut self.scene);
        }
        self.focus_all_keyboards(None);
        info!("session unlocked");
    }

    pub(crate) fn focus_all_keyboards(&mut self, surface: Option<SurfaceId>) {
        let seats: Vec<_> = self.seats.keys().copied().collect();
        for seat in seats {
            self.set_keyboard_focus(seat, surface);
        }
    }

    /// Pulls a point onto the closest available-geometry edge within the
    /// snap margin. Returns `None` when nothing is close enough.
    pub fn snap_pos(
        &self,
        output: OutputId,
        point: Point<f64, Logical>,
    ) -> Option<Point<f64, Logical>> {
        let margin = self.config.snap_margin as f64;
        if margin <= 0.0 {
            return None;
        }
        let area = self.outputs.get(&output)?.available_geometry().to_f64();
        let mut snapped = point;
        let mut hit = false;

        for edge in [area.loc.x, area.loc.x + area.size.w] {
            if (point.x - edge).abs() <= margin {
                snapped.x = edge;
                hit = true;
                break;
            }
        }
        for edge in [area.loc.y, area.loc.y + area.size.h] {
            if (point.y - edge).abs() <= margin {
                snapped.y = edge;
                hit = true;
                break;
            }
        }
        hit.then_some(snapped)
    }

    /// Runs one frame of animations on the output.
    pub fn output_frame(&mut self, output: OutputId, now: Duration) {
        for step in self.animations.advance(output, now) {
            match step.value {
                TweenValue::Alpha(alpha) => self.scene.set_alpha(step.view, alpha),
                TweenValue::Position(pos) => self.scene.set_pos(step.view, pos),
            }
            if step.finished == Some(OnFinish::Unmap) {
                self.scene.unlink_view(step.view);
            }
        }
    }

    pub(crate) fn animate(
        &mut self,
        view: ViewId,
        tween: Tween,
        duration: Duration,
        on_finish: OnFinish,
    ) {
        let Some(output) = self.scene.view(view).and_then(|v| v.output) else {
            return;
        };
        self.animations
            .start(view, output, tween, duration, on_finish);
    }

    pub fn animations_pending(&self) -> Vec<OutputId> {
        self.animations.outputs()
    }

    pub(crate) fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.config.animation_ms as u64)
    }

    /// Views of the output front to back, as the pointer sees them.
    pub fn stacking(&self, output: OutputId) -> Vec<ViewId> {
        self.outputs
            .get(&output)
            .map(|o| self.scene.flatten(&o.layers.front_to_back()))
            .unwrap_or_default()
    }

    pub fn stacking_report(&self) -> String {
        let mut report = String::new();
        for output in self.outputs.values() {
            let workspace = self
                .pager
                .active(output.id)
                .map(|ws| ws.to_string())
                .unwrap_or_else(|| "-".to_owned());
            let _ = writeln!(
                report,
                "{} {} {:?} workspace={workspace}",
                output.id,
                output.name,
                output.geometry()
            );
            for view in self.stacking(output.id) {
                let Some(v) = self.scene.view(view) else {
                    continue;
                };
                let label = self
                    .surfaces
                    .get(&v.surface)
                    .map(|s| s.label.as_str())
                    .unwrap_or("");
                let pos = self.scene.global_pos(view);
                let _ = writeln!(
                    report,
                    "  {view} {} {:?} label={label:?} pos=({}, {}) alpha={:.2}",
                    v.surface, v.owner, pos.x, pos.y, v.alpha
                );
            }
        }
        report
    }

    pub(crate) fn window_state(&self, id: ShellSurfaceId) -> WindowState {
        let Some(ss) = self.shell_surfaces.get(&id) else {
            return WindowState::empty();
        };
        let mut state = WindowState::empty();
        if ss.is_minimized() {
            state |= WindowState::MINIMIZED;
        }
        if self
            .seats
            .values()
            .any(|seat| seat.keyboard.focus == Some(ss.surface))
        {
            state |= WindowState::ACTIVE;
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: i32, y: i32, w: i32, h: i32) -> Rectangle<i32, Logical> {
        Rectangle::new(Point::from((x, y)), Size::from((w, h)))
    }

    #[test]
    fn new_output_gets_a_free_workspace() {
        let mut shell = Shell::new(ShellConfig::default());
        let o1 = shell.add_output("A", rect(0, 0, 800, 600));
        let o2 = shell.add_output("B", rect(800, 0, 800, 600));
        let ws: Vec<_> = shell.workspaces().map(|w| w.id).collect();
        assert_eq!(shell.pager().active(o1), Some(ws[0]));
        assert_eq!(shell.pager().active(o2), Some(ws[1]));

        let layer = shell.workspace(ws[0]).unwrap().layer(o1).unwrap();
        assert!(shell.scene().layer(layer).unwrap().is_visible());
        let hidden = shell.workspace(ws[2]).unwrap().layer(o1).unwrap();
        assert!(!shell.scene().layer(hidden).unwrap().is_visible());
    }

    #[test]
    fn cycle_workspace_wraps() {
        let mut shell = Shell::new(ShellConfig::default());
        let o1 = shell.add_output("A", rect(0, 0, 800, 600));
        let ws: Vec<_> = shell.workspaces().map(|w| w.id).collect();
        shell.cycle_workspace(o1, -1).unwrap();
        assert_eq!(shell.pager().active(o1), Some(*ws.last().unwrap()));
        shell.cycle_workspace(o1, 1).unwrap();
        assert_eq!(shell.pager().active(o1), Some(ws[0]));
    }

    #[test]
    fn snap_pulls_points_to_available_edges() {
        let mut config = ShellConfig::default();
        config.snap_margin = 10;
        let mut shell = Shell::new(config);
        let o1 = shell.add_output("A", rect(0, 0, 800, 600));

        let snapped = shell.snap_pos(o1, Point::from((795.0, 300.0))).unwrap();
        assert_eq!(snapped, Point::from((800.0, 300.0)));
        let corner = shell.snap_pos(o1, Point::from((-4.0, 7.0))).unwrap();
        assert_eq!(corner, Point::from((0.0, 0.0)));
        assert!(shell.snap_pos(o1, Point::from((400.0, 300.0))).is_none());
    }

    #[test]
    fn removing_output_drops_its_layers() {
        let mut shell = Shell::new(ShellConfig::default());
        let o1 = shell.add_output("A", rect(0, 0, 800, 600));
        let apps = shell.output(o1).unwrap().layers.apps;
        shell.remove_output(o1).unwrap();
        assert!(shell.scene().layer(apps).is_none());
        assert!(shell.pager().active(o1).is_none());
        assert!(shell.workspaces().all(|w| w.layer(o1).is_none()));
        assert_eq!(
            shell.remove_output(o1).unwrap_err(),
            ShellError::UnknownOutput(o1)
        );
    }

    #[test]
    fn surface_of_unknown_client_is_rejected() {
        let mut shell = Shell::new(ShellConfig::default());
        let client = shell.create_client(None);
        shell.destroy_client(client);
        assert_eq!(
            shell.create_surface(client),
            Err(ShellError::UnknownClient(client))
        );
    }

    #[test]
    fn first_workspace_maps_waiting_windows() {
        let mut shell = Shell::new(ShellConfig {
            workspaces: 0,
            ..ShellConfig::default()
        });
        shell.add_output("A", rect(0, 0, 800, 600));
        let client = shell.create_client(None);
        let surface = shell.create_surface(client).unwrap();
        let ss = shell.create_shell_surface(surface).unwrap();
        shell.set_toplevel(ss).unwrap();
        shell
            .commit_surface(surface, Size::from((100, 100)), Point::from((0, 0)))
            .unwrap();
        assert!(!shell.scene().is_surface_mapped(surface));

        shell.add_workspace();
        assert!(shell.scene().is_surface_mapped(surface));
        assert!(shell.drain_events().contains(&ShellEvent::Mapped(ss)));
    }
}
