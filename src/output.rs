use std::collections::BTreeMap;

use smithay::utils::{Logical, Point, Rectangle};

use crate::{
    errors::{Result, ShellError},
    ids::{LayerId, OutputId, PanelId, ViewId},
    view::Scene,
};

/// Edge a panel is docked to, with the desktop-shell wire values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelPosition {
    Top = 0,
    Left = 1,
    Bottom = 2,
    Right = 3,
}

impl TryFrom<u32> for PanelPosition {
    type Error = ShellError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(PanelPosition::Top),
            1 => Ok(PanelPosition::Left),
            2 => Ok(PanelPosition::Bottom),
            3 => Ok(PanelPosition::Right),
            other => Err(ShellError::InvalidPanelPosition(other)),
        }
    }
}

/// The fixed root layers of an output.
#[derive(Clone, Copy, Debug)]
pub struct OutputLayers {
    pub overlay: LayerId,
    pub lock: LayerId,
    pub dashboard: LayerId,
    pub panels: LayerId,
    pub apps: LayerId,
    pub background: LayerId,
}

impl OutputLayers {
    fn create(scene: &mut Scene, output: OutputId) -> Self {
        Self {
            overlay: scene.create_layer(Some(output)),
            lock: scene.create_layer(Some(output)),
            dashboard: scene.create_layer(Some(output)),
            panels: scene.create_layer(Some(output)),
            apps: scene.create_layer(Some(output)),
            background: scene.create_layer(Some(output)),
        }
    }

    pub fn front_to_back(&self) -> [LayerId; 6] {
        [
            self.overlay,
            self.lock,
            self.dashboard,
            self.panels,
            self.apps,
            self.background,
        ]
    }

    /// Layers that stay reachable while the session is locked.
    pub fn while_locked(&self) -> [LayerId; 2] {
        [self.overlay, self.lock]
    }
}

#[derive(Clone, Copy, Debug)]
struct ExclusiveZone {
    position: PanelPosition,
    thickness: i32,
}

#[derive(Debug)]
pub struct Output {
    pub id: OutputId,
    pub name: String,
    geometry: Rectangle<i32, Logical>,
    pub layers: OutputLayers,
    pub(crate) background: Option<ViewId>,
    pub(crate) panels: BTreeMap<PanelId, ViewId>,
    pub(crate) overlays: Vec<ViewId>,
    pub(crate) lock_view: Option<ViewId>,
    zones: BTreeMap<PanelId, ExclusiveZone>,
    locked: bool,
}

impl Output {
    pub fn new(
        id: OutputId,
        name: impl Into<String>,
        geometry: Rectangle<i32, Logical>,
        scene: &mut Scene,
    ) -> Self {
        scene.set_output_origin(id, geometry.loc);
        let layers = OutputLayers::create(scene, id);
        scene.set_layer_visible(layers.lock, false);
        Self {
            id,
            name: name.into(),
            geometry,
            layers,
            background: None,
            panels: BTreeMap::new(),
            overlays: Vec::new(),
            lock_view: None,
            zones: BTreeMap::new(),
            locked: false,
        }
    }

    /// Releases every layer of this output. Views owned by others are left unmapped.
    pub(crate) fn destroy_layers(&self, scene: &mut Scene) {
        for layer in self.layers.front_to_back() {
            scene.destroy_layer(layer);
        }
        scene.remove_output_origin(self.id);
    }

    pub fn geometry(&self) -> Rectangle<i32, Logical> {
        self.geometry
    }

    /// Output geometry minus the strips claimed by docked panels.
    pub fn available_geometry(&self) -> Rectangle<i32, Logical> {
        let mut rect = self.geometry;
        for zone in self.zones.values() {
            let t = zone.thickness.max(0);
            match zone.position {
                PanelPosition::Top => {
                    rect.loc.y += t;
                    rect.size.h -= t;
                }
                PanelPosition::Bottom => rect.size.h -= t,
                PanelPosition::Left => {
                    rect.loc.x += t;
                    rect.size.w -= t;
                }
                PanelPosition::Right => rect.size.w -= t,
            }
        }
        rect.size.w = rect.size.w.max(0);
        rect.size.h = rect.size.h.max(0);
        rect
    }

    pub fn contains(&self, point: Point<f64, Logical>) -> bool {
        self.geometry.to_f64().contains(point)
    }

    /// Returns whether the available geometry changed.
    pub(crate) fn set_exclusive_zone(
        &mut self,
        panel: PanelId,
        position: PanelPosition,
        thickness: i32,
    ) -> bool {
        let before = self.available_geometry();
        self.zones.insert(
            panel,
            ExclusiveZone {
                position,
                thickness,
            },
        );
        before != self.available_geometry()
    }

    pub(crate) fn remove_exclusive_zone(&mut self, panel: PanelId) -> bool {
        let before = self.available_geometry();
        self.zones.remove(&panel);
        before != self.available_geometry()
    }

    pub fn background_view(&self) -> Option<ViewId> {
        self.background
    }

    pub fn panel_views(&self) -> impl Iterator<Item = ViewId> + '_ {
        self.panels.values().copied()
    }

    pub fn overlay_views(&self) -> &[ViewId] {
        &self.overlays
    }

    pub fn lock_view(&self) -> Option<ViewId> {
        self.lock_view
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Shows the lock layer and hides everything except overlays behind it.
    pub(crate) fn set_locked(&mut self, locked: bool, scene: &mut Scene) {
        self.locked = locked;
        scene.set_layer_visible(self.layers.lock, locked);
        for layer in [
            self.layers.dashboard,
            self.layers.panels,
            self.layers.apps,
            self.layers.background,
        ] {
            scene.set_layer_visible(layer, !locked);
        }
    }

    /// Root layers reachable by the pointer right now, front to back.
    pub fn input_layers(&self) -> Vec<LayerId> {
        if self.locked {
            self.layers.while_locked().to_vec()
        } else {
            self.layers.front_to_back().to_vec()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smithay::utils::Size;

    fn output(scene: &mut Scene) -> Output {
        Output::new(
            OutputId::new(1),
            "HDMI-A-1",
            Rectangle::new(Point::from((0, 0)), Size::from((1920, 1080))),
            scene,
        )
    }

    #[test]
    fn panels_shrink_available_geometry() {
        let mut scene = Scene::new();
        let mut out = output(&mut scene);

        assert!(out.set_exclusive_zone(PanelId::new(1), PanelPosition::Top, 30));
        assert!(out.set_exclusive_zone(PanelId::new(2), PanelPosition::Left, 50));
        let avail = out.available_geometry();
        assert_eq!(avail.loc, Point::from((50, 30)));
        assert_eq!(avail.size, Size::from((1870, 1050)));

        assert!(!out.set_exclusive_zone(PanelId::new(1), PanelPosition::Top, 30));
        assert!(out.remove_exclusive_zone(PanelId::new(2)));
        assert_eq!(out.available_geometry().loc, Point::from((0, 30)));
    }

    #[test]
    fn panel_position_wire_values() {
        assert_eq!(PanelPosition::try_from(2).unwrap(), PanelPosition::Bottom);
        assert_eq!(
            PanelPosition::try_from(4).unwrap_err(),
            ShellError::InvalidPanelPosition(4)
        );
    }

    #[test]
    fn locking_hides_everything_but_lock_and_overlay() {
        let mut scene = Scene::new();
        let mut out = output(&mut scene);
        assert!(!scene.layer(out.layers.lock).unwrap().is_visible());

        out.set_locked(true, &mut scene);
        assert!(scene.layer(out.layers.lock).unwrap().is_visible());
        assert!(!scene.layer(out.layers.apps).unwrap().is_visible());
        assert_eq!(out.input_layers(), out.layers.while_locked().to_vec());

        out.set_locked(false, &mut scene);
        assert!(scene.layer(out.layers.apps).unwrap().is_visible());
    }
}
