//! End-to-end scenarios driven through the shell's public operations.

mod desktop;
mod grabs;

use smithay::utils::{Point, Rectangle, Size};

use crate::{
    config::ShellConfig,
    ids::{ClientId, OutputId, SeatId, ShellSurfaceId, SurfaceId},
    state::{Shell, ShellEvent},
};

struct Fixture {
    shell: Shell,
    seat: SeatId,
    output: OutputId,
    /// The companion client, already allowed to bind.
    desktop: ClientId,
}

fn fixture() -> Fixture {
    let mut shell = Shell::new(ShellConfig::default());
    let output = shell.add_output(
        "A",
        Rectangle::new(Point::from((0, 0)), Size::from((800, 600))),
    );
    let seat = shell.add_seat("seat0");
    let desktop = shell.create_client(None);
    shell.set_desktop_client(desktop);
    Fixture {
        shell,
        seat,
        output,
        desktop,
    }
}

fn commit(shell: &mut Shell, surface: SurfaceId, w: i32, h: i32) {
    shell
        .commit_surface(surface, Size::from((w, h)), Point::from((0, 0)))
        .unwrap();
}

fn map_toplevel(shell: &mut Shell, w: i32, h: i32) -> (SurfaceId, ShellSurfaceId) {
    let client = shell.create_client(None);
    let surface = shell.create_surface(client).unwrap();
    let ss = shell.create_shell_surface(surface).unwrap();
    shell.set_toplevel(ss).unwrap();
    commit(shell, surface, w, h);
    (surface, ss)
}

fn count(events: &[ShellEvent], pred: impl Fn(&ShellEvent) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}
