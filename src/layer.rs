use crate::{
    ids::{LayerId, OutputId, ViewId},
    view::{Scene, View},
};

/// Ordered z-stack of views. Index 0 is the front.
#[derive(Debug, Clone)]
pub struct Layer {
    pub id: LayerId,
    pub output: Option<OutputId>,
    parent: Option<LayerId>,
    children: Vec<LayerId>,
    views: Vec<ViewId>,
    visible: bool,
}

impl Layer {
    pub fn views(&self) -> &[ViewId] {
        &self.views
    }

    pub fn children(&self) -> &[LayerId] {
        &self.children
    }

    pub fn parent(&self) -> Option<LayerId> {
        self.parent
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl Scene {
    pub fn create_layer(&mut self, output: Option<OutputId>) -> LayerId {
        let id = self.next_layer_id();
        self.layers.insert(
            id,
            Layer {
                id,
                output,
                parent: None,
                children: Vec::new(),
                views: Vec::new(),
                visible: true,
            },
        );
        id
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(&id)
    }

    /// Nests `child` under `parent`, behind any children the parent already has.
    pub fn add_child_layer(&mut self, parent: LayerId, child: LayerId) {
        if parent == child || !self.layers.contains_key(&parent) {
            return;
        }
        self.detach_layer(child);
        let Some(layer) = self.layers.get_mut(&child) else {
            return;
        };
        layer.parent = Some(parent);
        if let Some(parent) = self.layers.get_mut(&parent) {
            parent.children.push(child);
        }
    }

    fn detach_layer(&mut self, id: LayerId) {
        let Some(parent) = self.layers.get_mut(&id).and_then(|l| l.parent.take()) else {
            return;
        };
        if let Some(parent) = self.layers.get_mut(&parent) {
            parent.children.retain(|c| *c != id);
        }
    }

    /// Destroys a layer and its children. Their views stay alive but unmapped.
    pub fn destroy_layer(&mut self, id: LayerId) {
        self.detach_layer(id);
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let Some(layer) = self.layers.remove(&current) else {
                continue;
            };
            for view in layer.views {
                if let Some(view) = self.views.get_mut(&view) {
                    view.layer = None;
                }
            }
            pending.extend(layer.children);
            self.damage_output(layer.output);
        }
    }

    pub fn set_layer_visible(&mut self, id: LayerId, visible: bool) {
        let Some(layer) = self.layers.get_mut(&id) else {
            return;
        };
        if layer.visible != visible {
            layer.visible = visible;
            let output = layer.output;
            self.damage_output(output);
        }
    }

    /// Puts the view at the front of `layer`, unlinking it from wherever it was.
    pub fn add_view(&mut self, layer: LayerId, view: ViewId) {
        if !self.layers.contains_key(&layer) || !self.views.contains_key(&view) {
            return;
        }
        self.unlink_view(view);
        if let Some(l) = self.layers.get_mut(&layer) {
            l.views.insert(0, view);
        }
        if let Some(v) = self.views.get_mut(&view) {
            v.layer = Some(layer);
        }
        self.damage_layer(layer);
    }

    pub fn unlink_view(&mut self, view: ViewId) {
        let Some(layer) = self.views.get_mut(&view).and_then(|v| v.layer.take()) else {
            return;
        };
        if let Some(l) = self.layers.get_mut(&layer) {
            l.views.retain(|v| *v != view);
        }
        self.damage_layer(layer);
    }

    pub fn raise_on_top(&mut self, view: ViewId) {
        let Some(layer) = self.views.get(&view).and_then(View::layer) else {
            return;
        };
        if self.top_view(layer) == Some(view) {
            return;
        }
        self.add_view(layer, view);
    }

    /// Moves the view one slot towards the back of its layer.
    pub fn lower(&mut self, view: ViewId) {
        let Some(layer) = self.views.get(&view).and_then(View::layer) else {
            return;
        };
        let Some(l) = self.layers.get_mut(&layer) else {
            return;
        };
        let Some(index) = l.views.iter().position(|v| *v == view) else {
            return;
        };
        if index + 1 < l.views.len() {
            l.views.swap(index, index + 1);
            self.damage_layer(layer);
        }
    }

    pub fn top_view(&self, layer: LayerId) -> Option<ViewId> {
        self.layers.get(&layer).and_then(|l| l.views.first().copied())
    }

    /// Views of the given root layers, front to back. A layer's own views
    /// come before its children; invisible layers are skipped with their
    /// children.
    pub fn flatten(&self, roots: &[LayerId]) -> Vec<ViewId> {
        let mut out = Vec::new();
        for root in roots {
            self.collect_layer(*root, &mut out);
        }
        out
    }

    fn collect_layer(&self, id: LayerId, out: &mut Vec<ViewId>) {
        let Some(layer) = self.layers.get(&id) else {
            return;
        };
        if !layer.visible {
            return;
        }
        out.extend(layer.views.iter().copied());
        for child in &layer.children {
            self.collect_layer(*child, out);
        }
    }

    fn damage_layer(&mut self, layer: LayerId) {
        let output = self.layers.get(&layer).and_then(|l| l.output);
        self.damage_output(output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ids::SurfaceId, view::ViewOwner};

    fn scene_with_views(n: usize) -> (Scene, LayerId, Vec<ViewId>) {
        let mut scene = Scene::new();
        let layer = scene.create_layer(None);
        let views = (0..n)
            .map(|i| {
                let v = scene.create_view(SurfaceId::new(i as u32 + 1), ViewOwner::Overlay, None);
                scene.add_view(layer, v);
                v
            })
            .collect();
        (scene, layer, views)
    }

    #[test]
    fn add_view_inserts_at_front_and_is_idempotent() {
        let (mut scene, layer, views) = scene_with_views(3);
        assert_eq!(scene.layer(layer).unwrap().views(), &[views[2], views[1], views[0]]);

        scene.add_view(layer, views[2]);
        assert_eq!(scene.layer(layer).unwrap().views(), &[views[2], views[1], views[0]]);
    }

    #[test]
    fn raising_topmost_view_changes_nothing() {
        let (mut scene, layer, views) = scene_with_views(3);
        let before = scene.layer(layer).unwrap().views().to_vec();
        scene.raise_on_top(views[2]);
        assert_eq!(scene.layer(layer).unwrap().views(), before.as_slice());
    }

    #[test]
    fn raising_moves_to_front_and_keeps_relative_order() {
        let (mut scene, layer, views) = scene_with_views(4);
        // front to back: 3 2 1 0
        scene.raise_on_top(views[1]);
        assert_eq!(
            scene.layer(layer).unwrap().views(),
            &[views[1], views[3], views[2], views[0]]
        );
        assert_eq!(scene.top_view(layer), Some(views[1]));
    }

    #[test]
    fn lower_moves_one_slot_back() {
        let (mut scene, layer, views) = scene_with_views(3);
        scene.lower(views[2]);
        assert_eq!(scene.layer(layer).unwrap().views(), &[views[1], views[2], views[0]]);
        scene.lower(views[0]);
        assert_eq!(scene.layer(layer).unwrap().views(), &[views[1], views[2], views[0]]);
    }

    #[test]
    fn view_belongs_to_one_layer() {
        let (mut scene, first, views) = scene_with_views(1);
        let second = scene.create_layer(None);
        scene.add_view(second, views[0]);
        assert!(scene.layer(first).unwrap().views().is_empty());
        assert_eq!(scene.view(views[0]).unwrap().layer(), Some(second));
    }

    #[test]
    fn child_layers_keep_insertion_order_behind_parent_views() {
        let mut scene = Scene::new();
        let apps = scene.create_layer(None);
        let ws1 = scene.create_layer(None);
        let ws2 = scene.create_layer(None);
        scene.add_child_layer(apps, ws1);
        scene.add_child_layer(apps, ws2);
        assert_eq!(scene.layer(apps).unwrap().children(), &[ws1, ws2]);

        let a = scene.create_view(SurfaceId::new(1), ViewOwner::Overlay, None);
        let b = scene.create_view(SurfaceId::new(2), ViewOwner::Overlay, None);
        let c = scene.create_view(SurfaceId::new(3), ViewOwner::Overlay, None);
        scene.add_view(ws2, a);
        scene.add_view(ws1, b);
        scene.add_view(apps, c);
        assert_eq!(scene.flatten(&[apps]), vec![c, b, a]);

        scene.set_layer_visible(ws1, false);
        assert_eq!(scene.flatten(&[apps]), vec![c, a]);
    }

    #[test]
    fn destroying_layer_unmaps_its_views() {
        let (mut scene, layer, views) = scene_with_views(2);
        scene.destroy_layer(layer);
        assert!(scene.layer(layer).is_none());
        assert!(views.iter().all(|v| !scene.view(*v).unwrap().is_mapped()));
    }
}
