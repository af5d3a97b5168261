use smithay::utils::{Logical, Point, Rectangle, Size};

use crate::{
    errors::{Result, ShellError},
    ids::{ClientId, ShellSurfaceId, SurfaceId},
};

/// Exclusive role a surface takes on the first time a shell interface claims it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceRole {
    Background,
    Panel,
    Lock,
    Popup,
    Overlay,
    Notification,
    GrabSurface,
    ShellWindow(ShellSurfaceId),
}

impl SurfaceRole {
    pub fn name(self) -> &'static str {
        match self {
            SurfaceRole::Background => "desktop_shell_background_surface",
            SurfaceRole::Panel => "desktop_shell_panel_surface",
            SurfaceRole::Lock => "desktop_shell_lock_surface",
            SurfaceRole::Popup => "desktop_shell_popup_surface",
            SurfaceRole::Overlay => "desktop_shell_overlay_surface",
            SurfaceRole::Notification => "notification_surface",
            SurfaceRole::GrabSurface => "desktop_shell_grab_surface",
            SurfaceRole::ShellWindow(_) => "shell_surface",
        }
    }
}

/// Client content as seen by the shell: a size, sub-surface extents and a role.
#[derive(Debug)]
pub struct Surface {
    pub id: SurfaceId,
    pub client: ClientId,
    size: Size<i32, Logical>,
    subsurfaces: Vec<Rectangle<i32, Logical>>,
    role: Option<SurfaceRole>,
    pub label: String,
    pub activable: bool,
    pub workspace_mask: u32,
    pub damaged: bool,
}

impl Surface {
    pub fn new(id: SurfaceId, client: ClientId) -> Self {
        Self {
            id,
            client,
            size: Size::from((0, 0)),
            subsurfaces: Vec::new(),
            role: None,
            label: String::new(),
            activable: true,
            workspace_mask: 0,
            damaged: false,
        }
    }

    pub fn size(&self) -> Size<i32, Logical> {
        self.size
    }

    pub fn width(&self) -> i32 {
        self.size.w
    }

    pub fn height(&self) -> i32 {
        self.size.h
    }

    pub fn set_size(&mut self, size: Size<i32, Logical>) {
        self.size = size;
    }

    pub fn has_content(&self) -> bool {
        self.size.w > 0 && self.size.h > 0
    }

    pub fn set_subsurfaces(&mut self, rects: Vec<Rectangle<i32, Logical>>) {
        self.subsurfaces = rects;
    }

    /// Extents of the surface and all its sub-surfaces in surface-local space.
    pub fn bounding_box(&self) -> Rectangle<i32, Logical> {
        let own = Rectangle::new(Point::from((0, 0)), self.size);
        self.subsurfaces
            .iter()
            .fold(own, |acc, rect| acc.merge(*rect))
    }

    pub fn role(&self) -> Option<SurfaceRole> {
        self.role
    }

    /// Assigning the role the surface already has is a no-op; any other
    /// role is refused and the current one is kept.
    pub fn set_role(&mut self, role: SurfaceRole) -> Result<()> {
        match self.role {
            None => {
                self.role = Some(role);
                Ok(())
            }
            Some(current) if current == role => Ok(()),
            Some(current) => Err(ShellError::RoleConflict {
                surface: self.id,
                current: current.name(),
                requested: role.name(),
            }),
        }
    }

    /// Releases the role once the object that handled it is gone.
    pub fn clear_role(&mut self) {
        self.role = None;
    }

    pub fn damage(&mut self) {
        self.damaged = true;
    }
}
