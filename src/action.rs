use tracing::{debug, info};

use crate::{
    errors::{Result, ShellError},
    ids::{OutputId, SeatId, ShellSurfaceId},
    shell_surface::ShellSurfaceType,
    state::Shell,
};

/// What a compositor keybinding does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    FocusNext,
    FocusPrevious,
    NextWorkspace,
    PreviousWorkspace,
    /// Zero-based index into the workspace list.
    SwitchWorkspace(usize),
    CloseFocused,
    MinimizeFocused,
    Lock,
    Quit,
}

enum Direction {
    Next,
    Previous,
}

impl Action {
    pub fn allowed_while_locked(self) -> bool {
        matches!(self, Action::Quit)
    }

    pub fn execute(self, shell: &mut Shell, seat: SeatId) -> Result<()> {
        match self {
            Action::FocusNext => change_focus(Direction::Next, shell, seat),
            Action::FocusPrevious => change_focus(Direction::Previous, shell, seat),
            Action::NextWorkspace => {
                let output = target_output(shell, seat)?;
                shell.cycle_workspace(output, 1)
            }
            Action::PreviousWorkspace => {
                let output = target_output(shell, seat)?;
                shell.cycle_workspace(output, -1)
            }
            Action::SwitchWorkspace(index) => {
                let output = target_output(shell, seat)?;
                let Some(workspace) = shell.workspaces().nth(index).map(|w| w.id) else {
                    debug!(index, "no such workspace");
                    return Ok(());
                };
                shell.activate_workspace(workspace, output)
            }
            Action::CloseFocused => match focused_window(shell, seat) {
                Some(window) => {
                    info!(shell_surface = %window, "closing focused window");
                    shell.close(window)
                }
                None => Ok(()),
            },
            Action::MinimizeFocused => match focused_window(shell, seat) {
                Some(window) => shell.minimize(window),
                None => Ok(()),
            },
            Action::Lock => {
                shell.lock();
                Ok(())
            }
            Action::Quit => {
                shell.quit();
                Ok(())
            }
        }
    }
}

/// The output under the seat's pointer, or the first one.
fn target_output(shell: &Shell, seat: SeatId) -> Result<OutputId> {
    let location = shell
        .seat(seat)
        .ok_or(ShellError::UnknownSeat(seat))?
        .pointer
        .location();
    shell
        .output_at(location)
        .or_else(|| shell.outputs().next().map(|o| o.id))
        .ok_or_else(|| ShellError::Config("no output to act on".to_owned()))
}

fn focused_window(shell: &Shell, seat: SeatId) -> Option<ShellSurfaceId> {
    let surface = shell.seat(seat)?.keyboard.focus()?;
    shell.shell_surface_for(surface)
}

fn change_focus(direction: Direction, shell: &mut Shell, seat: SeatId) -> Result<()> {
    let windows: Vec<ShellSurfaceId> = shell
        .shell_surfaces
        .values()
        .filter(|ss| ss.ty() == ShellSurfaceType::Toplevel && !ss.is_minimized())
        .filter(|ss| shell.scene().is_surface_mapped(ss.surface))
        .filter(|ss| shell.surface(ss.surface).is_some_and(|s| s.activable))
        .filter(|ss| {
            ss.workspace()
                .is_some_and(|ws| shell.pager().output_of(ws).is_some())
        })
        .map(|ss| ss.id)
        .collect();
    if windows.is_empty() {
        return Ok(());
    }

    let current_idx = focused_window(shell, seat)
        .and_then(|current| windows.iter().position(|w| *w == current));

    let target_idx = match (direction, current_idx) {
        (Direction::Next, Some(i)) => usize::min(i + 1, windows.len() - 1),
        (Direction::Previous, Some(i)) => i.saturating_sub(1),
        (_, None) => 0,
    };

    shell.activate_shell_surface(seat, windows[target_idx])
}
