//! Copyable handles into the shell's arenas.
//!
//! Every cross-object link (layer membership, transform parents, per-output
//! views) is one of these ids resolved through the owning arena, so
//! destruction order never leaves a dangling pointer behind.

use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }
    };
}

id_type!(ClientId, "client");
id_type!(SurfaceId, "surface");
id_type!(ShellSurfaceId, "shell-surface");
id_type!(ViewId, "view");
id_type!(LayerId, "layer");
id_type!(OutputId, "output");
id_type!(WorkspaceId, "workspace");
id_type!(SeatId, "seat");
id_type!(AnimationId, "animation");
id_type!(
    /// Chosen by the desktop-shell client when it creates the panel.
    PanelId,
    "panel"
);
id_type!(
    /// Chosen by the desktop-shell client when it creates the popup.
    PopupId,
    "popup"
);
id_type!(
    /// Chosen by the desktop-shell client when it creates the grab.
    ClientGrabId,
    "grab"
);
id_type!(
    /// Chosen by the desktop-shell client when it adds the binding.
    BindingId,
    "binding"
);

/// Monotonic id source. Ids start at 1 so a zero never names a live object.
#[derive(Debug, Default)]
pub struct IdGen {
    last: u32,
}

impl IdGen {
    pub fn next<T: From<u32>>(&mut self) -> T {
        self.last += 1;
        T::from(self.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_nonzero() {
        let mut ids = IdGen::default();
        let a: SurfaceId = ids.next();
        let b: ViewId = ids.next();
        assert_eq!(a.raw(), 1);
        assert_eq!(b.raw(), 2);
        assert_eq!(a.to_string(), "surface#1");
    }
}
