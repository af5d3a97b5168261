use thiserror::Error;

use crate::ids::{
    ClientGrabId, ClientId, OutputId, PanelId, PopupId, SeatId, ShellSurfaceId, SurfaceId,
    WorkspaceId,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    #[error("{surface} already has role `{current}`, cannot assign `{requested}`")]
    RoleConflict {
        surface: SurfaceId,
        current: &'static str,
        requested: &'static str,
    },

    #[error("permission to bind desktop_shell denied for {0}")]
    PermissionDenied(ClientId),

    #[error("unknown {0}")]
    UnknownClient(ClientId),

    #[error("unknown {0}")]
    UnknownSurface(SurfaceId),

    #[error("unknown {0}")]
    UnknownShellSurface(ShellSurfaceId),

    #[error("unknown {0}")]
    UnknownOutput(OutputId),

    #[error("unknown {0}")]
    UnknownSeat(SeatId),

    #[error("unknown {0}")]
    UnknownWorkspace(WorkspaceId),

    #[error("unknown {0}")]
    UnknownPanel(PanelId),

    #[error("unknown {0}")]
    UnknownPopup(PopupId),

    #[error("unknown {0}")]
    UnknownGrab(ClientGrabId),

    #[error("invalid panel position {0}")]
    InvalidPanelPosition(u32),

    #[error("no seat available")]
    NoSeat,

    #[error("desktop shell is not bound")]
    NotBound,

    #[error("config error: {0}")]
    Config(String),

    #[error("script error on line {line}: {message}")]
    Script { line: usize, message: String },

    #[error("event loop error: {0}")]
    EventLoop(String),
}

pub type Result<T, E = ShellError> = std::result::Result<T, E>;
