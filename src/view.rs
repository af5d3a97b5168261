use std::collections::{BTreeMap, BTreeSet};

use smithay::utils::{Logical, Point};

use crate::{
    ids::{IdGen, LayerId, OutputId, PanelId, PopupId, ShellSurfaceId, SurfaceId, ViewId},
    layer::Layer,
};

/// Who created a view and is therefore responsible for destroying it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewOwner {
    /// The per-output view of a window.
    Window(ShellSurfaceId),
    /// A dependent view a window builds for a foreign parent surface.
    WindowExtra(ShellSurfaceId),
    Preview(ShellSurfaceId),
    Background,
    Panel(PanelId),
    Lock,
    Overlay,
    Popup(PopupId),
    Notification,
    GrabSurface,
}

#[derive(Debug, Clone)]
pub struct View {
    pub id: ViewId,
    pub surface: SurfaceId,
    pub owner: ViewOwner,
    pub output: Option<OutputId>,
    pub alpha: f32,
    pos: Point<i32, Logical>,
    transform_parent: Option<ViewId>,
    pub(crate) layer: Option<LayerId>,
}

impl View {
    /// Position relative to the transform parent, or to the output origin
    /// when the view has no parent.
    pub fn pos(&self) -> Point<i32, Logical> {
        self.pos
    }

    pub fn transform_parent(&self) -> Option<ViewId> {
        self.transform_parent
    }

    pub fn layer(&self) -> Option<LayerId> {
        self.layer
    }

    pub fn is_mapped(&self) -> bool {
        self.layer.is_some()
    }
}

/// Arena owning every view and layer of the shell.
#[derive(Debug, Default)]
pub struct Scene {
    pub(crate) views: BTreeMap<ViewId, View>,
    pub(crate) layers: BTreeMap<LayerId, Layer>,
    origins: BTreeMap<OutputId, Point<i32, Logical>>,
    damage: BTreeSet<OutputId>,
    ids: IdGen,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn next_layer_id(&mut self) -> LayerId {
        self.ids.next()
    }

    pub fn set_output_origin(&mut self, output: OutputId, origin: Point<i32, Logical>) {
        self.origins.insert(output, origin);
    }

    pub fn remove_output_origin(&mut self, output: OutputId) {
        self.origins.remove(&output);
        self.damage.remove(&output);
    }

    pub fn create_view(
        &mut self,
        surface: SurfaceId,
        owner: ViewOwner,
        output: Option<OutputId>,
    ) -> ViewId {
        let id = self.ids.next();
        self.views.insert(
            id,
            View {
                id,
                surface,
                owner,
                output,
                alpha: 1.0,
                pos: Point::from((0, 0)),
                transform_parent: None,
                layer: None,
            },
        );
        id
    }

    pub fn view(&self, id: ViewId) -> Option<&View> {
        self.views.get(&id)
    }

    pub fn view_mut(&mut self, id: ViewId) -> Option<&mut View> {
        self.views.get_mut(&id)
    }

    pub fn views(&self) -> impl Iterator<Item = &View> {
        self.views.values()
    }

    /// Unlinks the view from its layer and drops it. Views parented to it
    /// lose their transform parent.
    pub fn destroy_view(&mut self, id: ViewId) -> Option<View> {
        self.unlink_view(id);
        let view = self.views.remove(&id)?;
        for other in self.views.values_mut() {
            if other.transform_parent == Some(id) {
                other.transform_parent = None;
            }
        }
        Some(view)
    }

    pub fn dependents(&self, id: ViewId) -> Vec<ViewId> {
        self.views
            .values()
            .filter(|view| view.transform_parent == Some(id))
            .map(|view| view.id)
            .collect()
    }

    pub fn views_of_surface(&self, surface: SurfaceId) -> impl Iterator<Item = &View> {
        self.views.values().filter(move |view| view.surface == surface)
    }

    pub fn is_surface_mapped(&self, surface: SurfaceId) -> bool {
        self.views_of_surface(surface).any(View::is_mapped)
    }

    pub fn set_pos(&mut self, id: ViewId, pos: Point<i32, Logical>) {
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        if view.pos != pos {
            view.pos = pos;
            let output = view.output;
            self.damage_output(output);
        }
    }

    pub fn set_alpha(&mut self, id: ViewId, alpha: f32) {
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        view.alpha = alpha.clamp(0.0, 1.0);
        let output = view.output;
        self.damage_output(output);
    }

    pub fn set_transform_parent(&mut self, id: ViewId, parent: Option<ViewId>) {
        if parent == Some(id) {
            return;
        }
        if let Some(view) = self.views.get_mut(&id) {
            view.transform_parent = parent;
        }
    }

    /// Position in the global compositor space: the parent chain is
    /// accumulated and the root is offset by its output origin.
    pub fn global_pos(&self, id: ViewId) -> Point<i32, Logical> {
        let mut pos = Point::from((0, 0));
        let mut current = self.views.get(&id);
        let mut depth = 0;
        while let Some(view) = current {
            pos += view.pos;
            depth += 1;
            match view.transform_parent {
                Some(parent) if depth < 64 => current = self.views.get(&parent),
                _ => {
                    if let Some(origin) = view.output.and_then(|o| self.origins.get(&o)) {
                        pos += *origin;
                    }
                    current = None;
                }
            }
        }
        pos
    }

    pub fn map_from_global(&self, id: ViewId, point: Point<f64, Logical>) -> Point<f64, Logical> {
        point - self.global_pos(id).to_f64()
    }

    pub(crate) fn damage_output(&mut self, output: Option<OutputId>) {
        if let Some(output) = output {
            self.damage.insert(output);
        }
    }

    pub fn take_damage(&mut self) -> BTreeSet<OutputId> {
        std::mem::take(&mut self.damage)
    }
}
