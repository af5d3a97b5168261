//! The window role: one logical window backed by a [`Surface`], shown through
//! one view per output.
//!
//! Requests only record the wanted state in the `next_*` fields. Nothing
//! visible changes until the client commits content and
//! [`Shell::configure_shell_surface`] applies it.

use std::collections::BTreeMap;

use smithay::utils::{Logical, Point, Rectangle, Size};
use tracing::{debug, info, warn};

use crate::{
    animation::{OnFinish, Tween},
    cursor::GrabCursor,
    errors::{Result, ShellError},
    grabs::{
        GrabKind, PopupTarget, move_grab::MoveGrab, popup_grab::PopupGrab,
        resize_grab::{ResizeEdge, ResizeGrab},
    },
    ids::{OutputId, SeatId, ShellSurfaceId, SurfaceId, ViewId, WorkspaceId},
    state::{Shell, ShellEvent},
    surface::{Surface, SurfaceRole},
    view::ViewOwner,
};

const PREVIEW_ALPHA: f32 = 0.8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShellSurfaceType {
    #[default]
    None,
    Toplevel,
    Transient,
    Popup,
    XWayland,
}

#[derive(Clone, Copy, Debug, Default)]
struct ToplevelState {
    maximized: bool,
    fullscreen: bool,
    output: Option<OutputId>,
}

/// What the views were last laid out for.
#[derive(Clone, Copy, Debug, Default)]
struct AppliedState {
    size: Size<i32, Logical>,
    maximized: bool,
    fullscreen: bool,
}

/// Offset from the parent. XWayland windows reuse it as a global position.
#[derive(Clone, Copy, Debug, Default)]
struct TransientState {
    x: i32,
    y: i32,
    inactive: bool,
}

#[derive(Clone, Copy, Debug, Default)]
struct PopupState {
    x: i32,
    y: i32,
    seat: Option<SeatId>,
}

#[derive(Debug)]
pub struct ShellSurface {
    pub id: ShellSurfaceId,
    pub surface: SurfaceId,
    ty: ShellSurfaceType,
    next_ty: ShellSurfaceType,
    geometry: Option<Rectangle<i32, Logical>>,
    next_geometry: Option<Rectangle<i32, Logical>>,
    toplevel: ToplevelState,
    applied: AppliedState,
    transient: TransientState,
    popup: PopupState,
    parent: Option<SurfaceId>,
    title: String,
    app_id: String,
    pid: Option<i32>,
    resize_edges: ResizeEdge,
    resize_size: Size<i32, Logical>,
    force_map: bool,
    workspace: Option<WorkspaceId>,
    pub(crate) views: BTreeMap<OutputId, ViewId>,
    pub(crate) extra_views: Vec<ViewId>,
    preview: Option<ViewId>,
    /// Global top-left of the views while the window is neither maximized
    /// nor fullscreen.
    position: Option<Point<i32, Logical>>,
    minimized: bool,
}

impl ShellSurface {
    fn new(id: ShellSurfaceId, surface: SurfaceId, pid: Option<i32>) -> Self {
        Self {
            id,
            surface,
            ty: ShellSurfaceType::None,
            next_ty: ShellSurfaceType::None,
            geometry: None,
            next_geometry: None,
            toplevel: ToplevelState::default(),
            applied: AppliedState::default(),
            transient: TransientState::default(),
            popup: PopupState::default(),
            parent: None,
            title: String::new(),
            app_id: String::new(),
            pid,
            resize_edges: ResizeEdge::empty(),
            resize_size: Size::from((0, 0)),
            force_map: false,
            workspace: None,
            views: BTreeMap::new(),
            extra_views: Vec::new(),
            preview: None,
            position: None,
            minimized: false,
        }
    }

    pub fn ty(&self) -> ShellSurfaceType {
        self.ty
    }

    pub fn next_ty(&self) -> ShellSurfaceType {
        self.next_ty
    }

    pub fn parent(&self) -> Option<SurfaceId> {
        self.parent
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn pid(&self) -> Option<i32> {
        self.pid
    }

    pub fn workspace(&self) -> Option<WorkspaceId> {
        self.workspace
    }

    pub fn resize_edges(&self) -> ResizeEdge {
        self.resize_edges
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    pub fn is_maximized(&self) -> bool {
        self.next_ty == ShellSurfaceType::Toplevel && self.toplevel.maximized
    }

    pub fn is_fullscreen(&self) -> bool {
        self.ty == ShellSurfaceType::Toplevel && self.toplevel.fullscreen
    }

    pub fn is_inactive(&self) -> bool {
        self.ty == ShellSurfaceType::Transient && self.transient.inactive
    }

    pub fn maximize_output(&self) -> Option<OutputId> {
        self.toplevel.output
    }

    pub fn view_for_output(&self, output: OutputId) -> Option<ViewId> {
        self.views.get(&output).copied()
    }

    pub fn views(&self) -> impl Iterator<Item = ViewId> + '_ {
        self.views.values().copied()
    }

    pub fn extra_views(&self) -> &[ViewId] {
        &self.extra_views
    }

    pub fn preview_view(&self) -> Option<ViewId> {
        self.preview
    }

    /// The explicit window geometry if the client set one, else the bounding
    /// box of the surface tree.
    pub fn geometry(&self, surface: &Surface) -> Rectangle<i32, Logical> {
        self.geometry.unwrap_or_else(|| surface.bounding_box())
    }
}

impl Shell {
    /// Gives `surface` the window role and one view per output.
    pub fn create_shell_surface(&mut self, surface: SurfaceId) -> Result<ShellSurfaceId> {
        let id: ShellSurfaceId = self.ids.next();
        let client = {
            let s = self.surface_mut(surface)?;
            s.set_role(SurfaceRole::ShellWindow(id))?;
            s.client
        };
        let pid = self.clients.get(&client).and_then(|c| c.pid);

        let mut shell_surface = ShellSurface::new(id, surface, pid);
        let outputs: Vec<_> = self.outputs.keys().copied().collect();
        for output in outputs {
            let view = self
                .scene
                .create_view(surface, ViewOwner::Window(id), Some(output));
            shell_surface.views.insert(output, view);
        }
        self.shell_surfaces.insert(id, shell_surface);
        debug!(shell_surface = %id, %surface, "shell surface created");
        Ok(id)
    }

    pub(crate) fn shell_surface_mut(&mut self, id: ShellSurfaceId) -> Result<&mut ShellSurface> {
        self.shell_surfaces
            .get_mut(&id)
            .ok_or(ShellError::UnknownShellSurface(id))
    }

    pub fn shell_surface_geometry(&self, id: ShellSurfaceId) -> Option<Rectangle<i32, Logical>> {
        let ss = self.shell_surfaces.get(&id)?;
        let surface = self.surfaces.get(&ss.surface)?;
        Some(ss.geometry(surface))
    }

    pub fn set_toplevel(&mut self, id: ShellSurfaceId) -> Result<()> {
        let ss = self.shell_surface_mut(id)?;
        ss.next_ty = ShellSurfaceType::Toplevel;
        ss.toplevel.maximized = false;
        ss.toplevel.fullscreen = false;
        ss.parent = None;
        self.pager.unsubscribe(id);
        Ok(())
    }

    pub fn set_transient(
        &mut self,
        id: ShellSurfaceId,
        parent: SurfaceId,
        x: i32,
        y: i32,
        inactive: bool,
    ) -> Result<()> {
        if !self.surfaces.contains_key(&parent) {
            return Err(ShellError::UnknownSurface(parent));
        }
        let ss = self.shell_surface_mut(id)?;
        ss.parent = Some(parent);
        ss.transient = TransientState { x, y, inactive };
        ss.next_ty = ShellSurfaceType::Transient;
        self.pager.unsubscribe(id);
        Ok(())
    }

    pub fn set_popup(
        &mut self,
        id: ShellSurfaceId,
        parent: SurfaceId,
        seat: SeatId,
        x: i32,
        y: i32,
    ) -> Result<()> {
        if !self.surfaces.contains_key(&parent) {
            return Err(ShellError::UnknownSurface(parent));
        }
        if !self.seats.contains_key(&seat) {
            return Err(ShellError::UnknownSeat(seat));
        }
        let ss = self.shell_surface_mut(id)?;
        ss.parent = Some(parent);
        ss.popup = PopupState {
            x,
            y,
            seat: Some(seat),
        };
        ss.next_ty = ShellSurfaceType::Popup;
        self.pager.unsubscribe(id);
        Ok(())
    }

    pub fn set_xwayland(&mut self, id: ShellSurfaceId, x: i32, y: i32, inactive: bool) -> Result<()> {
        let ss = self.shell_surface_mut(id)?;
        ss.parent = None;
        ss.transient = TransientState { x, y, inactive };
        ss.next_ty = ShellSurfaceType::XWayland;
        self.pager.unsubscribe(id);
        Ok(())
    }

    pub fn set_maximized(&mut self, id: ShellSurfaceId) -> Result<()> {
        let output = self.select_output(id);
        let ss = self.shell_surface_mut(id)?;
        ss.next_ty = ShellSurfaceType::Toplevel;
        ss.toplevel.maximized = true;
        ss.toplevel.fullscreen = false;
        ss.toplevel.output = output;
        self.pager.subscribe(id);

        if let Some(rect) = output.and_then(|o| self.outputs.get(&o)).map(|o| o.available_geometry()) {
            info!(shell_surface = %id, ?output, ?rect, "maximizing");
            self.send_configure(id, rect.size);
        }
        Ok(())
    }

    pub fn set_fullscreen(&mut self, id: ShellSurfaceId) -> Result<()> {
        let output = self.select_output(id);
        let ss = self.shell_surface_mut(id)?;
        ss.next_ty = ShellSurfaceType::Toplevel;
        ss.toplevel.fullscreen = true;
        ss.toplevel.maximized = false;
        ss.toplevel.output = output;
        self.pager.subscribe(id);

        if let Some(rect) = output.and_then(|o| self.outputs.get(&o)).map(|o| o.geometry()) {
            info!(shell_surface = %id, ?output, ?rect, "going fullscreen");
            self.send_configure(id, rect.size);
        }
        Ok(())
    }

    fn send_configure(&mut self, id: ShellSurfaceId, size: Size<i32, Logical>) {
        let edges = self
            .shell_surfaces
            .get(&id)
            .map(|ss| ss.resize_edges)
            .unwrap_or_default();
        self.emit(ShellEvent::Configure {
            shell_surface: id,
            size,
            edges,
        });
    }

    pub fn set_title(&mut self, id: ShellSurfaceId, title: &str) -> Result<()> {
        let ss = self.shell_surface_mut(id)?;
        if ss.title == title {
            return Ok(());
        }
        ss.title = title.to_owned();
        let surface = ss.surface;
        if let Some(s) = self.surfaces.get_mut(&surface) {
            s.label = title.to_owned();
        }
        self.emit(ShellEvent::TitleChanged(id));
        if self.desktop.has_window(id) {
            self.emit(ShellEvent::WindowTitle {
                shell_surface: id,
                title: title.to_owned(),
            });
        }
        Ok(())
    }

    pub fn set_app_id(&mut self, id: ShellSurfaceId, app_id: &str) -> Result<()> {
        let ss = self.shell_surface_mut(id)?;
        if ss.app_id == app_id {
            return Ok(());
        }
        ss.app_id = app_id.to_owned();
        self.emit(ShellEvent::AppIdChanged(id));
        Ok(())
    }

    pub fn set_geometry(&mut self, id: ShellSurfaceId, geometry: Rectangle<i32, Logical>) -> Result<()> {
        self.shell_surface_mut(id)?.next_geometry = Some(geometry);
        Ok(())
    }

    /// Output for a maximized or fullscreen window: +10 where its workspace
    /// is shown, +1 per seat pointer inside. The first best output wins.
    pub fn select_output(&self, id: ShellSurfaceId) -> Option<OutputId> {
        let workspace = self.shell_surfaces.get(&id).and_then(|ss| ss.workspace);
        let mut candidates: Vec<(OutputId, u32)> = self
            .outputs
            .values()
            .map(|o| {
                let active = workspace.is_some_and(|ws| self.pager.is_workspace_active(ws, o.id));
                (o.id, if active { 10 } else { 0 })
            })
            .collect();

        if candidates.len() <= 1 {
            return candidates.first().map(|(o, _)| *o);
        }

        for (output, vote) in &mut candidates {
            let Some(geometry) = self.outputs.get(output).map(|o| o.geometry().to_f64()) else {
                continue;
            };
            *vote += self
                .seats
                .values()
                .filter(|seat| geometry.contains(seat.pointer.location()))
                .count() as u32;
        }

        let mut best: Option<(OutputId, u32)> = None;
        for candidate in candidates {
            if best.is_none_or(|(_, vote)| vote < candidate.1) {
                best = Some(candidate);
            }
        }
        best.map(|(o, _)| o)
    }

    /// Applies the pending state after a content commit. `offset` is the
    /// buffer attach offset.
    pub fn configure_shell_surface(
        &mut self,
        id: ShellSurfaceId,
        offset: Point<i32, Logical>,
    ) -> Result<()> {
        let surface = self.shell_surface_mut(id)?.surface;
        let has_content = self.surfaces.get(&surface).is_some_and(Surface::has_content);

        if !has_content {
            self.shell_surface_lost_content(id);
            return Ok(());
        }

        let (ty, type_changed, inactive) = {
            let ss = self.shell_surface_mut(id)?;
            let old = ss.ty;
            ss.ty = ss.next_ty;
            ss.geometry = ss.next_geometry;
            (ss.ty, ss.ty != old, ss.is_inactive())
        };
        if ty == ShellSurfaceType::None {
            return Ok(());
        }

        if let Some(s) = self.surfaces.get_mut(&surface) {
            s.activable = !inactive;
        }

        let was_mapped = self.scene.is_surface_mapped(surface);
        self.place_shell_surface(id);
        if self.shell_surfaces.get(&id).and_then(|ss| ss.workspace).is_none() {
            debug!(shell_surface = %id, "no workspace yet, deferring");
            return Ok(());
        }

        if type_changed {
            self.destroy_extra_views(id);
        }

        match ty {
            ShellSurfaceType::Toplevel => self.configure_toplevel(id, offset),
            ShellSurfaceType::Popup if type_changed => self.configure_popup(id),
            ShellSurfaceType::Transient => self.configure_transient(id),
            ShellSurfaceType::XWayland => self.configure_xwayland(id),
            ShellSurfaceType::Popup | ShellSurfaceType::None => {}
        }
        if let Some(s) = self.surfaces.get_mut(&surface) {
            s.damage();
        }

        if !was_mapped && self.scene.is_surface_mapped(surface) {
            debug!(shell_surface = %id, ?ty, "mapped");
            self.emit(ShellEvent::Mapped(id));
            self.add_window_entry(id);
            if ty == ShellSurfaceType::Toplevel
                && !inactive
                && let Some(seat) = self.first_seat()
                && let Err(err) = self.activate_shell_surface(seat, id)
            {
                warn!(shell_surface = %id, "failed to activate new window: {err}");
            }
        }
        Ok(())
    }

    fn shell_surface_lost_content(&mut self, id: ShellSurfaceId) {
        let Some(ss) = self.shell_surfaces.get_mut(&id) else {
            return;
        };
        let popup_seat = ss.popup.seat;
        let surface = ss.surface;
        if ss.ty == ShellSurfaceType::None && !self.scene.is_surface_mapped(surface) {
            return;
        }
        ss.ty = ShellSurfaceType::None;
        ss.next_ty = ShellSurfaceType::None;
        ss.workspace = None;
        let views: Vec<_> = ss.views.values().chain(ss.extra_views.iter()).copied().collect();

        if let Some(seat) = popup_seat {
            self.end_grab_of(seat, GrabKind::Popup(PopupTarget::Window(id)));
        }
        for view in views {
            self.scene.unlink_view(view);
        }
        debug!(shell_surface = %id, "content lost");
        self.emit(ShellEvent::ContentLost(id));
        self.emit(ShellEvent::Unmapped(surface));
        self.remove_window_entry(id);
    }

    /// Puts an unmapped window on a workspace and asks for a full remap.
    fn place_shell_surface(&mut self, id: ShellSurfaceId) {
        let first = self.workspaces.values().next().map(|w| (w.id, w.mask()));
        let Some(ss) = self.shell_surfaces.get_mut(&id) else {
            return;
        };
        if self.scene.is_surface_mapped(ss.surface) || ss.minimized {
            return;
        }
        if ss.workspace.is_none() {
            let Some((workspace, mask)) = first else {
                return;
            };
            ss.workspace = Some(workspace);
            let surface = ss.surface;
            if let Some(s) = self.surfaces.get_mut(&surface) {
                s.workspace_mask = mask;
            }
        }
        if let Some(ss) = self.shell_surfaces.get_mut(&id) {
            ss.force_map = true;
        }
    }

    fn destroy_extra_views(&mut self, id: ShellSurfaceId) {
        let Some(ss) = self.shell_surfaces.get_mut(&id) else {
            return;
        };
        let extra = std::mem::take(&mut ss.extra_views);
        for view in extra {
            self.destroy_view(view);
        }
    }

    fn configure_toplevel(&mut self, id: ShellSurfaceId, offset: Point<i32, Logical>) {
        let Some(rect) = self.shell_surface_geometry(id) else {
            return;
        };
        let Some(ss) = self.shell_surfaces.get_mut(&id) else {
            return;
        };

        let mut shift = Point::<i32, Logical>::from((0, 0));
        if !ss.resize_edges.is_empty() {
            if ss.resize_edges.contains(ResizeEdge::TOP) {
                shift.y = ss.resize_size.h - rect.size.h;
            }
            if ss.resize_edges.contains(ResizeEdge::LEFT) {
                shift.x = ss.resize_size.w - rect.size.w;
            }
            ss.resize_size = rect.size;
        }

        let map = ss.applied.maximized != ss.toplevel.maximized
            || ss.applied.fullscreen != ss.toplevel.fullscreen
            || ss.applied.size != rect.size
            || ss.force_map;
        ss.force_map = false;
        ss.applied = AppliedState {
            size: rect.size,
            maximized: ss.toplevel.maximized,
            fullscreen: ss.toplevel.fullscreen,
        };
        if ss.minimized {
            return;
        }

        let toplevel = ss.toplevel;
        let workspace = ss.workspace;
        let pos = if toplevel.fullscreen || toplevel.maximized {
            let target = toplevel
                .output
                .filter(|o| self.outputs.contains_key(o))
                .or_else(|| self.select_output(id));
            let area = target.and_then(|o| self.outputs.get(&o)).map(|o| {
                if toplevel.fullscreen {
                    o.geometry()
                } else {
                    o.available_geometry()
                }
            });
            match area {
                Some(area) => area.loc - rect.loc,
                None => return,
            }
        } else {
            let base = self.normal_position(id, rect);
            let pos = base + shift + offset;
            self.remember_position(id, pos);
            pos
        };

        let Some(ss) = self.shell_surfaces.get(&id) else {
            return;
        };
        let views: Vec<_> = ss.views.iter().map(|(o, v)| (*o, *v)).collect();
        for (output, view) in views {
            let origin = self
                .outputs
                .get(&output)
                .map(|o| o.geometry().loc)
                .unwrap_or_default();
            self.scene.set_transform_parent(view, None);
            self.scene.set_pos(view, pos - origin);

            let unmapped = !self.scene.view(view).is_some_and(|v| v.is_mapped());
            if map || unmapped {
                let layer = workspace
                    .and_then(|ws| self.workspaces.get(&ws))
                    .and_then(|ws| ws.layer(output));
                if let Some(layer) = layer {
                    self.scene.add_view(layer, view);
                }
            }
        }
    }

    /// Where a normal toplevel goes: where it already is, where a window
    /// with the same identity was last seen, or centred on an output.
    fn normal_position(&self, id: ShellSurfaceId, rect: Rectangle<i32, Logical>) -> Point<i32, Logical> {
        let Some(ss) = self.shell_surfaces.get(&id) else {
            return Point::from((0, 0));
        };
        if let Some(pos) = ss.position {
            return pos;
        }
        if let Some(pos) = self.placement.recall(&ss.app_id, &ss.title) {
            return pos;
        }
        let area = self
            .select_output(id)
            .and_then(|o| self.outputs.get(&o))
            .map(|o| o.available_geometry());
        match area {
            Some(area) => {
                let x = area.loc.x + ((area.size.w - rect.size.w) / 2).max(0);
                let y = area.loc.y + ((area.size.h - rect.size.h) / 2).max(0);
                Point::from((x, y)) - rect.loc
            }
            None => Point::from((0, 0)),
        }
    }

    fn remember_position(&mut self, id: ShellSurfaceId, pos: Point<i32, Logical>) {
        let Some(ss) = self.shell_surfaces.get_mut(&id) else {
            return;
        };
        ss.position = Some(pos);
        let (app_id, title) = (ss.app_id.clone(), ss.title.clone());
        self.placement.remember(&app_id, &title, pos);
    }

    fn configure_popup(&mut self, id: ShellSurfaceId) {
        let Some(ss) = self.shell_surfaces.get(&id) else {
            return;
        };
        let Some(parent) = ss.parent else {
            return;
        };
        let popup = ss.popup;
        let surface = ss.surface;
        let offset = Point::from((popup.x, popup.y));

        if let Some(parent_ss) = self.shell_surface_for(parent) {
            let pairs = self.parent_view_pairs(id, parent_ss);
            for (view, parent_view) in pairs {
                self.attach_dependent_view(view, parent_view, offset);
            }
        } else {
            let parent_views: Vec<_> = self
                .scene
                .views_of_surface(parent)
                .map(|v| (v.id, v.output))
                .collect();
            let mut extra = Vec::with_capacity(parent_views.len());
            for (parent_view, output) in parent_views {
                let view = self
                    .scene
                    .create_view(surface, ViewOwner::WindowExtra(id), output);
                self.attach_dependent_view(view, Some(parent_view), offset);
                extra.push(view);
            }
            if let Some(ss) = self.shell_surfaces.get_mut(&id) {
                ss.extra_views = extra;
            }
        }

        if let Some(seat) = popup.seat {
            let creation_time = self
                .seats
                .get(&seat)
                .map(|s| s.pointer.grab_start().time)
                .unwrap_or_default();
            let grab = PopupGrab::new(PopupTarget::Window(id), surface, creation_time, 0);
            if let Err(err) = self.start_grab(seat, Box::new(grab), None) {
                warn!(shell_surface = %id, "cannot grab popup: {err}");
            }
        }
    }

    fn configure_transient(&mut self, id: ShellSurfaceId) {
        let Some(ss) = self.shell_surfaces.get(&id) else {
            return;
        };
        let Some(parent) = ss.parent else {
            return;
        };
        let offset = Point::from((ss.transient.x, ss.transient.y));

        if let Some(parent_ss) = self.shell_surface_for(parent) {
            let pairs = self.parent_view_pairs(id, parent_ss);
            for (view, parent_view) in pairs {
                self.attach_dependent_view(view, parent_view, offset);
            }
        } else {
            let Some((parent_view, Some(output))) = self
                .scene
                .views_of_surface(parent)
                .next()
                .map(|v| (v.id, v.output))
            else {
                return;
            };
            if let Some(view) = ss.view_for_output(output) {
                self.attach_dependent_view(view, Some(parent_view), offset);
            }
        }
    }

    fn configure_xwayland(&mut self, id: ShellSurfaceId) {
        let Some(ss) = self.shell_surfaces.get(&id) else {
            return;
        };
        let pos = Point::from((ss.transient.x, ss.transient.y));
        let workspace = ss.workspace;
        let views: Vec<_> = ss.views.iter().map(|(o, v)| (*o, *v)).collect();
        for (output, view) in views {
            let origin = self
                .outputs
                .get(&output)
                .map(|o| o.geometry().loc)
                .unwrap_or_default();
            self.scene.set_transform_parent(view, None);
            self.scene.set_pos(view, pos - origin);
            let mapped = self.scene.view(view).is_some_and(|v| v.is_mapped());
            let layer = workspace
                .and_then(|ws| self.workspaces.get(&ws))
                .and_then(|ws| ws.layer(output));
            if let (false, Some(layer)) = (mapped, layer) {
                self.scene.add_view(layer, view);
            }
        }
    }

    fn parent_view_pairs(
        &self,
        id: ShellSurfaceId,
        parent: ShellSurfaceId,
    ) -> Vec<(ViewId, Option<ViewId>)> {
        let (Some(ss), Some(parent)) = (self.shell_surfaces.get(&id), self.shell_surfaces.get(&parent))
        else {
            return Vec::new();
        };
        ss.views
            .iter()
            .map(|(output, view)| (*view, parent.view_for_output(*output)))
            .collect()
    }

    /// Stacks `view` directly above `parent`, offset from it.
    fn attach_dependent_view(
        &mut self,
        view: ViewId,
        parent: Option<ViewId>,
        offset: Point<i32, Logical>,
    ) {
        self.scene.set_transform_parent(view, parent);
        self.scene.set_pos(view, offset);
        match parent.and_then(|p| self.scene.view(p)).and_then(|p| p.layer()) {
            Some(layer) => self.scene.add_view(layer, view),
            None => self.scene.unlink_view(view),
        }
    }

    /// The popup was dismissed; it stays unmapped until the client asks for
    /// a role again.
    pub fn send_popup_done(&mut self, id: ShellSurfaceId) {
        let Some(ss) = self.shell_surfaces.get_mut(&id) else {
            return;
        };
        ss.next_ty = ShellSurfaceType::None;
        ss.popup.seat = None;
        self.emit(ShellEvent::PopupDone(id));
    }

    /// The view of this window the seat's pointer is over, falling back to
    /// the one on the pointer's output.
    fn grabbed_view(&self, id: ShellSurfaceId, seat: SeatId) -> Option<ViewId> {
        let ss = self.shell_surfaces.get(&id)?;
        let location = self.seats.get(&seat)?.pointer.location();
        if let Some((view, _)) = self.pick_view(location)
            && self.scene.view(view).is_some_and(|v| v.surface == ss.surface)
        {
            return Some(view);
        }
        self.output_at(location)
            .and_then(|o| ss.view_for_output(o))
            .or_else(|| ss.views.values().next().copied())
    }

    pub fn move_shell_surface(&mut self, id: ShellSurfaceId, seat: SeatId) -> Result<()> {
        let ss = self
            .shell_surfaces
            .get(&id)
            .ok_or(ShellError::UnknownShellSurface(id))?;
        if ss.is_fullscreen() {
            return Ok(());
        }
        let Some(view) = self.grabbed_view(id, seat) else {
            return Ok(());
        };
        let grab = MoveGrab::new(self, seat, id, view);
        self.start_grab(seat, Box::new(grab), Some(GrabCursor::Move))
    }

    /// Starts an interactive resize. Edge masks that are empty, unknown or
    /// name opposite edges are ignored.
    pub fn resize_shell_surface(&mut self, id: ShellSurfaceId, seat: SeatId, edges: u32) -> Result<()> {
        if !self.shell_surfaces.contains_key(&id) {
            return Err(ShellError::UnknownShellSurface(id));
        }
        let Some(edges) = ResizeEdge::from_wire(edges) else {
            debug!(shell_surface = %id, edges, "ignoring invalid resize edges");
            return Ok(());
        };
        let Some(view) = self.grabbed_view(id, seat) else {
            return Ok(());
        };
        let size = self
            .shell_surface_geometry(id)
            .map(|r| r.size)
            .unwrap_or_default();
        let ss = self.shell_surface_mut(id)?;
        ss.resize_edges = edges;
        ss.resize_size = size;

        let grab = ResizeGrab {
            shell_surface: id,
            view,
            edges,
            initial_size: size,
        };
        self.start_grab(seat, Box::new(grab), Some(GrabCursor::from_edges(edges.bits())))
    }

    pub(crate) fn clear_resize_edges(&mut self, id: ShellSurfaceId) {
        if let Some(ss) = self.shell_surfaces.get_mut(&id) {
            ss.resize_edges = ResizeEdge::empty();
        }
    }

    /// Moves every view of the window so its top-left lands on `pos`, in
    /// global coordinates.
    pub fn move_views(&mut self, id: ShellSurfaceId, pos: Point<i32, Logical>) {
        self.remember_position(id, pos);
        let Some(ss) = self.shell_surfaces.get(&id) else {
            return;
        };
        let views: Vec<_> = ss.views.iter().map(|(o, v)| (*o, *v)).collect();
        for (output, view) in views {
            let origin = self
                .outputs
                .get(&output)
                .map(|o| o.geometry().loc)
                .unwrap_or_default();
            self.scene.set_pos(view, pos - origin);
        }
    }

    pub fn window_position(&self, id: ShellSurfaceId) -> Option<Point<i32, Logical>> {
        let ss = self.shell_surfaces.get(&id)?;
        match ss.views.values().next() {
            Some(view) => Some(self.scene.global_pos(*view)),
            None => ss.position,
        }
    }

    pub fn minimize(&mut self, id: ShellSurfaceId) -> Result<()> {
        let ss = self.shell_surface_mut(id)?;
        ss.minimized = true;
        let surface = ss.surface;
        let views: Vec<_> = ss.views.values().chain(ss.extra_views.iter()).copied().collect();
        for view in views {
            self.scene.unlink_view(view);
        }
        let focused: Vec<_> = self
            .seats
            .values()
            .filter(|s| s.keyboard.focus == Some(surface))
            .map(|s| s.id)
            .collect();
        for seat in focused {
            self.set_keyboard_focus(seat, None);
        }
        self.emit(ShellEvent::Unmapped(surface));
        self.emit(ShellEvent::Minimized(id));
        self.send_window_state(id);
        Ok(())
    }

    pub fn restore(&mut self, id: ShellSurfaceId) -> Result<()> {
        let ss = self.shell_surface_mut(id)?;
        ss.minimized = false;
        ss.force_map = true;
        self.configure_shell_surface(id, Point::from((0, 0)))?;
        self.emit(ShellEvent::Restored(id));
        self.send_window_state(id);
        Ok(())
    }

    /// Asks the owning process to terminate. The shell never signals itself.
    pub fn close(&mut self, id: ShellSurfaceId) -> Result<()> {
        let ss = self
            .shell_surfaces
            .get(&id)
            .ok_or(ShellError::UnknownShellSurface(id))?;
        let Some(pid) = ss.pid.filter(|pid| *pid > 0) else {
            debug!(shell_surface = %id, "no pid to signal");
            return Ok(());
        };
        if pid as u32 == std::process::id() {
            return Ok(());
        }
        info!(shell_surface = %id, pid, "sending SIGTERM");
        // Safety: kill takes no pointers; a stale pid only yields ESRCH
        unsafe { libc::kill(pid, libc::SIGTERM) };
        self.emit(ShellEvent::Terminated { pid });
        Ok(())
    }

    /// Shows a faded copy of the window on the output's dashboard layer.
    pub fn preview(&mut self, id: ShellSurfaceId, output: OutputId) -> Result<()> {
        let dashboard = self
            .outputs
            .get(&output)
            .ok_or(ShellError::UnknownOutput(output))?
            .layers
            .dashboard;
        let ss = self
            .shell_surfaces
            .get(&id)
            .ok_or(ShellError::UnknownShellSurface(id))?;
        let surface = ss.surface;
        let pos = ss
            .view_for_output(output)
            .and_then(|v| self.scene.view(v))
            .map(|v| v.pos())
            .unwrap_or_default();

        let view = match ss.preview {
            Some(view) => view,
            None => {
                let view = self
                    .scene
                    .create_view(surface, ViewOwner::Preview(id), Some(output));
                self.shell_surface_mut(id)?.preview = Some(view);
                view
            }
        };
        if let Some(v) = self.scene.view_mut(view) {
            v.output = Some(output);
        }
        self.scene.set_pos(view, pos);
        self.scene.add_view(dashboard, view);
        self.scene.set_alpha(view, 0.0);
        let duration = self.animation_duration();
        self.animate(
            view,
            Tween::Alpha {
                from: 0.0,
                to: PREVIEW_ALPHA,
            },
            duration,
            OnFinish::Nothing,
        );
        Ok(())
    }

    pub fn end_preview(&mut self, id: ShellSurfaceId) -> Result<()> {
        let ss = self
            .shell_surfaces
            .get(&id)
            .ok_or(ShellError::UnknownShellSurface(id))?;
        let Some(view) = ss.preview else {
            return Ok(());
        };
        let from = self.scene.view(view).map(|v| v.alpha).unwrap_or_default();
        let duration = self.animation_duration();
        self.animate(view, Tween::Alpha { from, to: 0.0 }, duration, OnFinish::Unmap);
        Ok(())
    }

    pub(crate) fn shell_surface_output_created(&mut self, id: ShellSurfaceId, output: OutputId) {
        let Some(ss) = self.shell_surfaces.get(&id) else {
            return;
        };
        let surface = ss.surface;
        let seed = ss.views.values().next().map(|v| self.scene.global_pos(*v));
        let origin = self
            .outputs
            .get(&output)
            .map(|o| o.geometry().loc)
            .unwrap_or_default();

        let view = self
            .scene
            .create_view(surface, ViewOwner::Window(id), Some(output));
        if let Some(seed) = seed {
            self.scene.set_pos(view, seed - origin);
        }
        let Some(ss) = self.shell_surfaces.get_mut(&id) else {
            return;
        };
        ss.views.insert(output, view);
        ss.force_map = true;

        let configurable = ss.next_ty != ShellSurfaceType::None
            && self.surfaces.get(&surface).is_some_and(Surface::has_content);
        if configurable && let Err(err) = self.configure_shell_surface(id, Point::from((0, 0))) {
            warn!(shell_surface = %id, %output, "reconfigure after output creation failed: {err}");
        }
    }

    pub(crate) fn shell_surface_output_removed(&mut self, id: ShellSurfaceId, output: OutputId) {
        let Some(ss) = self.shell_surfaces.get_mut(&id) else {
            return;
        };
        let view = ss.views.remove(&output);
        let preview = ss.preview.filter(|p| self.scene.view(*p).and_then(|v| v.output) == Some(output));
        if preview.is_some() {
            ss.preview = None;
        }
        let scene = &self.scene;
        let (gone, kept): (Vec<ViewId>, Vec<ViewId>) = ss
            .extra_views
            .iter()
            .copied()
            .partition(|v| scene.view(*v).and_then(|v| v.output) == Some(output));
        ss.extra_views = kept;
        let rearm = ss.next_ty == ShellSurfaceType::Toplevel
            && ss.toplevel.maximized
            && ss.toplevel.output == Some(output);

        for view in view.into_iter().chain(preview).chain(gone) {
            self.destroy_view(view);
        }
        if rearm {
            debug!(shell_surface = %id, %output, "maximize target removed, reselecting");
            if let Err(err) = self.set_maximized(id) {
                warn!(shell_surface = %id, "re-maximize failed: {err}");
            }
        }
    }

    /// Re-sends the maximized size to windows maximized on `output`.
    pub(crate) fn available_geometry_changed(&mut self, output: OutputId) {
        let Some(rect) = self.outputs.get(&output).map(|o| o.available_geometry()) else {
            return;
        };
        let affected: Vec<_> = self
            .shell_surfaces
            .values()
            .filter(|ss| ss.is_maximized() && ss.toplevel.output == Some(output))
            .map(|ss| ss.id)
            .collect();
        for id in affected {
            self.send_configure(id, rect.size);
        }
    }

    /// Pager listener: a maximized or fullscreen window follows its
    /// workspace when its output switches away from it.
    pub(crate) fn shell_surface_workspace_activated(&mut self, id: ShellSurfaceId) {
        let Some(ss) = self.shell_surfaces.get(&id) else {
            self.pager.unsubscribe(id);
            return;
        };
        let Some(workspace) = ss.workspace else {
            return;
        };
        let fullscreen = ss.next_ty == ShellSurfaceType::Toplevel && ss.toplevel.fullscreen;
        if !fullscreen && !ss.is_maximized() {
            return;
        }
        let still_shown = ss
            .toplevel
            .output
            .is_some_and(|o| self.pager.is_workspace_active(workspace, o));
        if still_shown {
            return;
        }
        let followed = if fullscreen {
            self.set_fullscreen(id)
        } else {
            self.set_maximized(id)
        };
        match followed {
            Ok(()) => {
                if let Some(ss) = self.shell_surfaces.get_mut(&id) {
                    ss.force_map = true;
                }
                if let Err(err) = self.configure_shell_surface(id, Point::from((0, 0))) {
                    warn!(shell_surface = %id, "cannot replace window: {err}");
                }
            }
            Err(err) => warn!(shell_surface = %id, "cannot follow workspace: {err}"),
        }
    }

    /// A transient or popup whose parent is gone loses its content.
    pub(crate) fn parent_surface_destroyed(&mut self, id: ShellSurfaceId) {
        let Some(ss) = self.shell_surfaces.get_mut(&id) else {
            return;
        };
        ss.parent = None;
        ss.next_ty = ShellSurfaceType::None;
        self.shell_surface_lost_content(id);
    }

    pub(crate) fn destroy_shell_surface(&mut self, id: ShellSurfaceId) {
        let Some(ss) = self.shell_surfaces.remove(&id) else {
            return;
        };
        self.end_grabs_where(|kind| match kind {
            GrabKind::Move(s) | GrabKind::Resize(s) => s == id,
            GrabKind::Popup(PopupTarget::Window(s)) => s == id,
            _ => false,
        });
        self.pager.unsubscribe(id);
        for view in ss
            .views
            .values()
            .chain(ss.extra_views.iter())
            .chain(ss.preview.iter())
        {
            self.destroy_view(*view);
        }
        if let Some(surface) = self.surfaces.get_mut(&ss.surface) {
            surface.clear_role();
        }
        self.remove_window_entry(id);
        debug!(shell_surface = %id, "shell surface destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ShellConfig, errors::ShellError};

    fn rect(x: i32, y: i32, w: i32, h: i32) -> Rectangle<i32, Logical> {
        Rectangle::new(Point::from((x, y)), Size::from((w, h)))
    }

    fn window(shell: &mut Shell) -> (SurfaceId, ShellSurfaceId) {
        let client = shell.create_client(None);
        let surface = shell.create_surface(client).unwrap();
        let ss = shell.create_shell_surface(surface).unwrap();
        (surface, ss)
    }

    fn commit(shell: &mut Shell, surface: SurfaceId, w: i32, h: i32) {
        shell
            .commit_surface(surface, Size::from((w, h)), Point::from((0, 0)))
            .unwrap();
    }

    #[test]
    fn second_window_role_is_rejected() {
        let mut shell = Shell::new(ShellConfig::default());
        let (surface, _) = window(&mut shell);
        assert!(matches!(
            shell.create_shell_surface(surface),
            Err(ShellError::RoleConflict { .. })
        ));
    }

    #[test]
    fn toplevel_maps_once_with_one_view_per_output() {
        let mut shell = Shell::new(ShellConfig::default());
        let o1 = shell.add_output("A", rect(0, 0, 800, 600));
        let o2 = shell.add_output("B", rect(800, 0, 800, 600));
        let (surface, ss) = window(&mut shell);

        commit(&mut shell, surface, 100, 100);
        assert!(!shell.scene().is_surface_mapped(surface));

        shell.set_toplevel(ss).unwrap();
        commit(&mut shell, surface, 100, 100);
        commit(&mut shell, surface, 120, 100);

        let mapped = shell
            .drain_events()
            .into_iter()
            .filter(|e| *e == ShellEvent::Mapped(ss))
            .count();
        assert_eq!(mapped, 1);

        let window = shell.shell_surface(ss).unwrap();
        assert!(window.view_for_output(o1).is_some());
        assert!(window.view_for_output(o2).is_some());
        assert_eq!(window.views().count(), 2);
    }

    #[test]
    fn content_lost_round_trip() {
        let mut shell = Shell::new(ShellConfig::default());
        shell.add_output("A", rect(0, 0, 800, 600));
        let (surface, ss) = window(&mut shell);
        shell.set_toplevel(ss).unwrap();
        commit(&mut shell, surface, 100, 100);
        shell.drain_events();

        commit(&mut shell, surface, 0, 0);
        let events = shell.drain_events();
        assert_eq!(
            events
                .iter()
                .filter(|e| **e == ShellEvent::ContentLost(ss))
                .count(),
            1
        );
        assert_eq!(
            events
                .iter()
                .filter(|e| **e == ShellEvent::Unmapped(surface))
                .count(),
            1
        );
        let window = shell.shell_surface(ss).unwrap();
        assert_eq!(window.ty(), ShellSurfaceType::None);
        assert_eq!(window.workspace(), None);
        assert!(!shell.scene().is_surface_mapped(surface));

        // New content alone does not bring the window back.
        commit(&mut shell, surface, 100, 100);
        assert_eq!(shell.shell_surface(ss).unwrap().ty(), ShellSurfaceType::None);
        assert!(!shell.scene().is_surface_mapped(surface));

        shell.set_toplevel(ss).unwrap();
        commit(&mut shell, surface, 100, 100);
        assert_eq!(shell.shell_surface(ss).unwrap().ty(), ShellSurfaceType::Toplevel);
        assert!(shell.drain_events().contains(&ShellEvent::Mapped(ss)));
    }

    #[test]
    fn maximize_prefers_active_workspace_with_pointers() {
        let mut shell = Shell::new(ShellConfig::default());
        let o1 = shell.add_output("A", rect(0, 0, 800, 600));
        let o2 = shell.add_output("B", rect(800, 0, 1024, 768));
        let s1 = shell.add_seat("one");
        let s2 = shell.add_seat("two");
        shell.pointer_motion(s1, 0, Point::from((900.0, 100.0)));
        shell.pointer_motion(s2, 0, Point::from((1000.0, 300.0)));

        let (surface, ss) = window(&mut shell);
        shell.set_toplevel(ss).unwrap();
        commit(&mut shell, surface, 100, 100);
        let ws = shell.shell_surface(ss).unwrap().workspace().unwrap();
        shell.activate_workspace(ws, o2).unwrap();
        assert!(!shell.pager().is_workspace_active(ws, o1));
        shell.drain_events();

        // o2 scores 10 + 2, o1 scores 0.
        assert_eq!(shell.select_output(ss), Some(o2));
        shell.set_maximized(ss).unwrap();
        assert_eq!(shell.shell_surface(ss).unwrap().maximize_output(), Some(o2));
        assert!(shell.drain_events().contains(&ShellEvent::Configure {
            shell_surface: ss,
            size: Size::from((1024, 768)),
            edges: ResizeEdge::empty(),
        }));
    }

    #[test]
    fn equal_scores_keep_the_first_output() {
        let mut shell = Shell::new(ShellConfig::default());
        let o1 = shell.add_output("A", rect(0, 0, 800, 600));
        shell.add_output("B", rect(800, 0, 800, 600));
        let (_, ss) = window(&mut shell);
        assert_eq!(shell.select_output(ss), Some(o1));
    }

    #[test]
    fn removing_an_output_drops_exactly_its_view() {
        let mut shell = Shell::new(ShellConfig::default());
        let o1 = shell.add_output("A", rect(0, 0, 800, 600));
        let o2 = shell.add_output("B", rect(800, 0, 800, 600));
        let (surface, ss) = window(&mut shell);
        shell.set_toplevel(ss).unwrap();
        commit(&mut shell, surface, 100, 100);

        let gone = shell.shell_surface(ss).unwrap().view_for_output(o2).unwrap();
        let before = shell.scene().views_of_surface(surface).count();
        shell.remove_output(o2).unwrap();

        assert_eq!(shell.scene().views_of_surface(surface).count(), before - 1);
        assert!(shell.scene().view(gone).is_none());
        let window = shell.shell_surface(ss).unwrap();
        assert_eq!(window.views().collect::<Vec<_>>().len(), 1);
        assert!(window.view_for_output(o1).is_some());
        assert!(
            shell
                .scene()
                .layers
                .values()
                .all(|layer| !layer.views().contains(&gone))
        );
    }

    #[test]
    fn maximized_window_follows_its_workspace() {
        let mut shell = Shell::new(ShellConfig::default());
        let o1 = shell.add_output("A", rect(0, 0, 800, 600));
        let o2 = shell.add_output("B", rect(800, 0, 1280, 1024));
        let (surface, ss) = window(&mut shell);
        shell.set_toplevel(ss).unwrap();
        commit(&mut shell, surface, 100, 100);

        let a = shell.shell_surface(ss).unwrap().workspace().unwrap();
        let b = shell.pager().active(o2).unwrap();
        assert_eq!(shell.pager().active(o1), Some(a));

        shell.set_maximized(ss).unwrap();
        assert_eq!(shell.shell_surface(ss).unwrap().maximize_output(), Some(o1));
        shell.drain_events();

        shell.activate_workspace(b, o1).unwrap();
        assert_eq!(shell.pager().active(o2), Some(a));
        assert_eq!(shell.shell_surface(ss).unwrap().maximize_output(), Some(o2));
        assert!(shell.drain_events().contains(&ShellEvent::Configure {
            shell_surface: ss,
            size: Size::from((1280, 1024)),
            edges: ResizeEdge::empty(),
        }));
    }

    #[test]
    fn fullscreen_window_follows_its_workspace() {
        let mut shell = Shell::new(ShellConfig::default());
        let o1 = shell.add_output("A", rect(0, 0, 800, 600));
        let o2 = shell.add_output("B", rect(800, 0, 1280, 1024));
        let (surface, ss) = window(&mut shell);
        shell.set_toplevel(ss).unwrap();
        commit(&mut shell, surface, 100, 100);

        let a = shell.shell_surface(ss).unwrap().workspace().unwrap();
        let b = shell.pager().active(o2).unwrap();
        shell.set_fullscreen(ss).unwrap();
        commit(&mut shell, surface, 800, 600);
        assert_eq!(shell.shell_surface(ss).unwrap().maximize_output(), Some(o1));
        shell.drain_events();

        shell.activate_workspace(b, o1).unwrap();
        assert_eq!(shell.pager().active(o2), Some(a));
        let window = shell.shell_surface(ss).unwrap();
        assert!(window.is_fullscreen());
        assert_eq!(window.maximize_output(), Some(o2));
        let view = window.view_for_output(o2).unwrap();
        let view = shell.scene().view(view).unwrap();
        assert!(view.is_mapped());
        assert_eq!(view.pos(), Point::from((0, 0)));
        assert!(shell.drain_events().contains(&ShellEvent::Configure {
            shell_surface: ss,
            size: Size::from((1280, 1024)),
            edges: ResizeEdge::empty(),
        }));
    }

    #[test]
    fn popup_losing_content_releases_its_grab() {
        let mut shell = Shell::new(ShellConfig::default());
        shell.add_output("A", rect(0, 0, 800, 600));
        let seat = shell.add_seat("seat0");
        let (parent_surface, parent) = window(&mut shell);
        shell.set_toplevel(parent).unwrap();
        commit(&mut shell, parent_surface, 200, 200);

        let (surface, popup) = window(&mut shell);
        shell.set_popup(popup, parent_surface, seat, 10, 10).unwrap();
        commit(&mut shell, surface, 50, 50);
        assert_eq!(
            shell.grab_kind(seat),
            Some(GrabKind::Popup(PopupTarget::Window(popup)))
        );
        shell.drain_events();

        commit(&mut shell, surface, 0, 0);
        assert_eq!(shell.grab_kind(seat), None);
        let events = shell.drain_events();
        assert_eq!(
            events.iter().filter(|e| **e == ShellEvent::ContentLost(popup)).count(),
            1
        );
        assert_eq!(
            events.iter().filter(|e| **e == ShellEvent::Unmapped(surface)).count(),
            1
        );
        assert!(!shell.scene().is_surface_mapped(surface));
    }

    #[test]
    fn transient_views_follow_parent_views() {
        let mut shell = Shell::new(ShellConfig::default());
        shell.add_output("A", rect(0, 0, 800, 600));
        shell.add_output("B", rect(800, 0, 800, 600));
        let (parent_surface, parent) = window(&mut shell);
        shell.set_toplevel(parent).unwrap();
        commit(&mut shell, parent_surface, 300, 300);

        let (surface, dialog) = window(&mut shell);
        shell.set_transient(dialog, parent_surface, 20, 30, true).unwrap();
        commit(&mut shell, surface, 50, 50);

        let parent_pos = shell.window_position(parent).unwrap();
        assert_eq!(
            shell.window_position(dialog),
            Some(parent_pos + Point::from((20, 30)))
        );
        assert!(!shell.surface(surface).unwrap().activable);

        let views: Vec<_> = shell.shell_surface(dialog).unwrap().views().collect();
        for view in views {
            let view = shell.scene().view(view).unwrap();
            assert!(view.is_mapped());
            assert!(view.transform_parent().is_some());
        }

        shell.drain_events();
        shell.destroy_surface(parent_surface).unwrap();
        let events = shell.drain_events();
        assert_eq!(
            events.iter().filter(|e| **e == ShellEvent::ContentLost(dialog)).count(),
            1
        );
        assert_eq!(
            events.iter().filter(|e| **e == ShellEvent::Unmapped(surface)).count(),
            1
        );
        let window = shell.shell_surface(dialog).unwrap();
        assert_eq!(window.ty(), ShellSurfaceType::None);
        assert_eq!(window.next_ty(), ShellSurfaceType::None);
        assert_eq!(window.parent(), None);
        assert_eq!(window.workspace(), None);
        assert!(!shell.scene().is_surface_mapped(surface));
    }

    #[test]
    fn close_never_signals_the_shell() {
        let mut shell = Shell::new(ShellConfig::default());
        let client = shell.create_client(Some(std::process::id() as i32));
        let surface = shell.create_surface(client).unwrap();
        let ss = shell.create_shell_surface(surface).unwrap();
        shell.close(ss).unwrap();
        assert!(
            !shell
                .drain_events()
                .iter()
                .any(|e| matches!(e, ShellEvent::Terminated { .. }))
        );
    }

    #[test]
    fn inactive_only_applies_to_transients() {
        let mut shell = Shell::new(ShellConfig::default());
        shell.add_output("A", rect(0, 0, 800, 600));
        let (surface, ss) = window(&mut shell);
        shell.set_xwayland(ss, 40, 40, true).unwrap();
        commit(&mut shell, surface, 50, 50);
        assert!(shell.scene().is_surface_mapped(surface));
        assert!(!shell.shell_surface(ss).unwrap().is_inactive());
        assert!(shell.surface(surface).unwrap().activable);
    }

    #[test]
    fn empty_commit_before_mapping_is_silent() {
        let mut shell = Shell::new(ShellConfig::default());
        shell.add_output("A", rect(0, 0, 800, 600));
        let (surface, ss) = window(&mut shell);
        shell.set_toplevel(ss).unwrap();
        commit(&mut shell, surface, 0, 0);
        commit(&mut shell, surface, 0, 0);
        let events = shell.drain_events();
        assert!(!events.contains(&ShellEvent::ContentLost(ss)));
        assert!(!events.contains(&ShellEvent::Unmapped(surface)));

        commit(&mut shell, surface, 100, 100);
        assert!(shell.drain_events().contains(&ShellEvent::Mapped(ss)));

        commit(&mut shell, surface, 0, 0);
        commit(&mut shell, surface, 0, 0);
        let events = shell.drain_events();
        assert_eq!(
            events.iter().filter(|e| **e == ShellEvent::ContentLost(ss)).count(),
            1
        );
        assert_eq!(
            events.iter().filter(|e| **e == ShellEvent::Unmapped(surface)).count(),
            1
        );
    }

    #[test]
    fn window_popup_closes_on_outside_press() {
        let mut shell = Shell::new(ShellConfig::default());
        shell.add_output("A", rect(0, 0, 800, 600));
        let seat = shell.add_seat("seat0");
        let (parent_surface, parent) = window(&mut shell);
        shell.set_toplevel(parent).unwrap();
        commit(&mut shell, parent_surface, 200, 200);
        shell.move_views(parent, Point::from((0, 0)));

        let (surface, popup) = window(&mut shell);
        shell.set_popup(popup, parent_surface, seat, 10, 10).unwrap();
        commit(&mut shell, surface, 50, 50);
        assert_eq!(
            shell.grab_kind(seat),
            Some(GrabKind::Popup(PopupTarget::Window(popup)))
        );

        shell.pointer_motion(seat, 5, Point::from((500.0, 500.0)));
        shell.pointer_button(seat, 6, crate::seat::BTN_LEFT, crate::seat::ButtonState::Pressed);
        assert_eq!(shell.grab_kind(seat), None);
        assert!(shell.drain_events().contains(&ShellEvent::PopupDone(popup)));
        assert_eq!(
            shell.shell_surface(popup).unwrap().next_ty(),
            ShellSurfaceType::None
        );
    }

    #[test]
    fn minimize_and_restore() {
        let mut shell = Shell::new(ShellConfig::default());
        shell.add_output("A", rect(0, 0, 800, 600));
        let (surface, ss) = window(&mut shell);
        shell.set_toplevel(ss).unwrap();
        commit(&mut shell, surface, 100, 100);

        shell.minimize(ss).unwrap();
        assert!(!shell.scene().is_surface_mapped(surface));
        commit(&mut shell, surface, 100, 100);
        assert!(!shell.scene().is_surface_mapped(surface));

        shell.restore(ss).unwrap();
        assert!(shell.scene().is_surface_mapped(surface));
        let events = shell.drain_events();
        assert!(events.contains(&ShellEvent::Minimized(ss)));
        assert!(events.contains(&ShellEvent::Restored(ss)));
    }

    #[test]
    fn placement_is_remembered_by_identity() {
        let mut shell = Shell::new(ShellConfig::default());
        shell.add_output("A", rect(0, 0, 800, 600));
        let (surface, ss) = window(&mut shell);
        shell.set_app_id(ss, "term").unwrap();
        shell.set_title(ss, "shell").unwrap();
        shell.set_toplevel(ss).unwrap();
        commit(&mut shell, surface, 100, 100);
        shell.move_views(ss, Point::from((42, 24)));
        shell.destroy_surface(surface).unwrap();

        let (surface, ss) = window(&mut shell);
        shell.set_app_id(ss, "term").unwrap();
        shell.set_title(ss, "shell").unwrap();
        shell.set_toplevel(ss).unwrap();
        commit(&mut shell, surface, 100, 100);
        assert_eq!(shell.window_position(ss), Some(Point::from((42, 24))));
    }

    #[test]
    fn title_change_is_reported_once() {
        let mut shell = Shell::new(ShellConfig::default());
        let (_, ss) = window(&mut shell);
        shell.set_title(ss, "a").unwrap();
        shell.set_title(ss, "a").unwrap();
        let changes = shell
            .drain_events()
            .into_iter()
            .filter(|e| *e == ShellEvent::TitleChanged(ss))
            .count();
        assert_eq!(changes, 1);
    }
}
