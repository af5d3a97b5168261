//! Notification surfaces, stacked at the top-right corner of every output.

use std::collections::{BTreeMap, BTreeSet};

use smithay::utils::Point;
use tracing::debug;

use crate::{
    animation::{OnFinish, Tween},
    errors::Result,
    ids::{OutputId, SeatId, SurfaceId, ViewId},
    state::Shell,
    surface::{Surface, SurfaceRole},
    view::ViewOwner,
};

const MARGIN: i32 = 20;
const SPACING: i32 = 10;
const HOVER_ALPHA: f32 = 0.3;

#[derive(Debug, Default)]
struct Notification {
    /// Inactive notifications let the pointer through and fade while hovered.
    inactive: bool,
    views: BTreeMap<OutputId, ViewId>,
    /// Views that got their first position; later moves are animated.
    placed: BTreeSet<ViewId>,
}

#[derive(Debug, Default)]
pub struct Notifications {
    entries: BTreeMap<SurfaceId, Notification>,
    /// Shown notifications, newest first.
    order: Vec<SurfaceId>,
    hovered: BTreeMap<SeatId, ViewId>,
}

impl Notifications {
    pub fn shown(&self) -> &[SurfaceId] {
        &self.order
    }

    pub fn view(&self, surface: SurfaceId, output: OutputId) -> Option<ViewId> {
        self.entries.get(&surface)?.views.get(&output).copied()
    }

    fn is_inactive_view(&self, view: ViewId) -> bool {
        self.entries
            .values()
            .any(|n| n.inactive && n.views.values().any(|v| *v == view))
    }
}

impl Shell {
    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn push_notification(&mut self, surface: SurfaceId, inactive: bool) -> Result<()> {
        {
            let s = self.surface_mut(surface)?;
            s.set_role(SurfaceRole::Notification)?;
            s.label = "notification".to_owned();
        }
        let outputs: Vec<_> = self.outputs.keys().copied().collect();
        let mut notification = Notification {
            inactive,
            ..Default::default()
        };
        for output in outputs {
            let view = self
                .scene
                .create_view(surface, ViewOwner::Notification, Some(output));
            notification.views.insert(output, view);
        }
        self.notifications.entries.insert(surface, notification);
        debug!(%surface, inactive, "notification pushed");
        Ok(())
    }

    pub(crate) fn configure_notification(&mut self, surface: SurfaceId) {
        let has_content = self
            .surfaces
            .get(&surface)
            .is_some_and(Surface::has_content);
        let Some(views) = self
            .notifications
            .entries
            .get(&surface)
            .map(|n| n.views.clone())
        else {
            return;
        };
        let shown = self.notifications.order.contains(&surface);

        if has_content && !shown {
            for (output, view) in views {
                if let Some(overlay) = self.outputs.get(&output).map(|o| o.layers.overlay) {
                    self.scene.add_view(overlay, view);
                }
            }
            self.notifications.order.insert(0, surface);
            self.relayout_notifications();
        } else if !has_content && shown {
            for view in views.into_values() {
                self.scene.unlink_view(view);
            }
            self.notifications.order.retain(|s| *s != surface);
            self.relayout_notifications();
        }
    }

    /// Stacks the shown notifications downwards from the top-right corner.
    fn relayout_notifications(&mut self) {
        let duration = self.animation_duration();
        let outputs: Vec<_> = self
            .outputs
            .values()
            .map(|o| (o.id, o.geometry().size.w))
            .collect();

        for (output, width) in outputs {
            let mut y = 0;
            for surface in self.notifications.order.clone() {
                let size = self.surfaces.get(&surface).map(|s| s.size()).unwrap_or_default();
                let Some(view) = self.notifications.view(surface, output) else {
                    continue;
                };
                let target = Point::from((width - size.w - MARGIN, y + MARGIN));
                y += size.h + SPACING;

                let first = self
                    .notifications
                    .entries
                    .get_mut(&surface)
                    .is_some_and(|n| n.placed.insert(view));
                if first {
                    self.scene.set_pos(view, target);
                } else {
                    let from = self.scene.view(view).map(|v| v.pos()).unwrap_or_default();
                    if from != target {
                        self.animate(
                            view,
                            Tween::Position { from, to: target },
                            duration,
                            OnFinish::Nothing,
                        );
                    }
                }
            }
        }
    }

    pub(crate) fn destroy_notification(&mut self, surface: SurfaceId) {
        let Some(notification) = self.notifications.entries.remove(&surface) else {
            return;
        };
        self.notifications
            .hovered
            .retain(|_, v| !notification.views.values().any(|view| view == v));
        for view in notification.views.into_values() {
            self.destroy_view(view);
        }
        let shown = self.notifications.order.len();
        self.notifications.order.retain(|s| *s != surface);
        if self.notifications.order.len() != shown {
            self.relayout_notifications();
        }
    }

    pub(crate) fn notifications_output_created(&mut self, output: OutputId) {
        let Some(overlay) = self.outputs.get(&output).map(|o| o.layers.overlay) else {
            return;
        };
        let surfaces: Vec<_> = self.notifications.entries.keys().copied().collect();
        for surface in surfaces {
            let view = self
                .scene
                .create_view(surface, ViewOwner::Notification, Some(output));
            if self.notifications.order.contains(&surface) {
                self.scene.add_view(overlay, view);
            }
            if let Some(n) = self.notifications.entries.get_mut(&surface) {
                n.views.insert(output, view);
            }
        }
        self.relayout_notifications();
    }

    pub(crate) fn notifications_output_removed(&mut self, output: OutputId) {
        let views: Vec<_> = self
            .notifications
            .entries
            .values_mut()
            .filter_map(|n| {
                let view = n.views.remove(&output)?;
                n.placed.remove(&view);
                Some(view)
            })
            .collect();
        for view in views {
            self.notifications.hovered.retain(|_, v| *v != view);
            self.destroy_view(view);
        }
    }

    /// Pointer crossing for notifications. An inactive notification fades
    /// while hovered and never takes the focus, so `None` is returned for it.
    pub(crate) fn notification_hover(&mut self, seat: SeatId, view: Option<ViewId>) -> Option<ViewId> {
        let entered = view.filter(|v| self.notifications.is_inactive_view(*v));
        let left = self.notifications.hovered.get(&seat).copied();
        if entered == left {
            return if entered.is_some() { None } else { view };
        }

        let duration = self.animation_duration();
        if let Some(left) = left {
            self.notifications.hovered.remove(&seat);
            let from = self.scene.view(left).map(|v| v.alpha).unwrap_or(HOVER_ALPHA);
            self.animate(left, Tween::Alpha { from, to: 1.0 }, duration, OnFinish::Nothing);
        }
        match entered {
            Some(entered) => {
                self.notifications.hovered.insert(seat, entered);
                let from = self.scene.view(entered).map(|v| v.alpha).unwrap_or(1.0);
                self.animate(
                    entered,
                    Tween::Alpha {
                        from,
                        to: HOVER_ALPHA,
                    },
                    duration,
                    OnFinish::Nothing,
                );
                None
            }
            None => view,
        }
    }
}
