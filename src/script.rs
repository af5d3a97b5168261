//! Line-oriented command script for driving a headless shell.
//!
//! Objects are created under a name and referred to by it afterwards:
//!
//! ```text
//! output A 0 0 1920 1080
//! client term 4242
//! surface win term
//! shell-surface win
//! toplevel win
//! commit win 640 480
//! motion 100 100
//! press left
//! ```

use std::{collections::HashMap, time::Duration};

use smithay::{
    input::keyboard::{
        Keysym, ModifiersState,
        xkb::{self, KEYSYM_CASE_INSENSITIVE},
    },
    utils::{Point, Rectangle, Size},
};
use tracing::debug;

use crate::{
    errors::{Result, ShellError},
    ids::{ClientGrabId, ClientId, OutputId, PanelId, PopupId, SeatId, ShellSurfaceId, SurfaceId, WorkspaceId},
    seat::{BTN_LEFT, BTN_RIGHT, ButtonState, KeyState},
    state::Shell,
};

/// Name tables and the virtual clock of one script run.
#[derive(Debug, Default)]
pub struct Script {
    outputs: HashMap<String, OutputId>,
    clients: HashMap<String, ClientId>,
    surfaces: HashMap<String, SurfaceId>,
    windows: HashMap<String, ShellSurfaceId>,
    seat: Option<SeatId>,
    /// Milliseconds, advanced by `wait` and `frame`.
    time: u32,
    line: usize,
}

type Args<'a> = std::iter::Peekable<std::str::SplitWhitespace<'a>>;

impl Script {
    pub fn new(seat: SeatId) -> Self {
        Self {
            seat: Some(seat),
            ..Default::default()
        }
    }

    /// Registers an output created outside of the script.
    pub fn name_output(&mut self, name: &str, output: OutputId) {
        self.outputs.insert(name.to_owned(), output);
    }

    pub fn time(&self) -> u32 {
        self.time
    }

    pub fn advance(&mut self, ms: u32) {
        self.time = self.time.saturating_add(ms);
    }

    /// Runs every line of `source`, stopping at the first error.
    pub fn run(&mut self, shell: &mut Shell, source: &str) -> Result<()> {
        for line in source.lines() {
            self.run_line(shell, line)?;
        }
        Ok(())
    }

    /// Runs one command. Blank lines and `#` comments are skipped.
    pub fn run_line(&mut self, shell: &mut Shell, line: &str) -> Result<()> {
        self.line += 1;
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            return Ok(());
        }
        debug!(line = self.line, command = line, "script");
        let mut args = line.split_whitespace().peekable();
        let Some(command) = args.next() else {
            return Ok(());
        };
        self.execute(shell, command, &mut args)
            .map_err(|err| match err {
                ShellError::Script { .. } => err,
                other => self.error(other.to_string()),
            })
    }

    fn error(&self, message: impl Into<String>) -> ShellError {
        ShellError::Script {
            line: self.line,
            message: message.into(),
        }
    }

    fn execute(&mut self, shell: &mut Shell, command: &str, args: &mut Args<'_>) -> Result<()> {
        match command {
            "output" => {
                let name = self.word(args, "output name")?;
                let x = self.int(args)?;
                let y = self.int(args)?;
                let w = self.int(args)?;
                let h = self.int(args)?;
                let id = shell.add_output(name, Rectangle::new(Point::from((x, y)), Size::from((w, h))));
                self.outputs.insert(name.to_owned(), id);
            }
            "remove-output" => {
                let output = self.output(args)?;
                shell.remove_output(output)?;
                self.outputs.retain(|_, id| *id != output);
            }
            "seat" => {
                let name = self.word(args, "seat name")?;
                self.seat = Some(shell.add_seat(name));
            }
            "client" => {
                let name = self.word(args, "client name")?;
                let pid = match args.next() {
                    Some(raw) => Some(self.parse::<i32>(raw)?),
                    None => None,
                };
                let id = shell.create_client(pid);
                self.clients.insert(name.to_owned(), id);
            }
            "disconnect" => {
                let client = self.client(args)?;
                shell.destroy_client(client);
            }
            "surface" => {
                let name = self.word(args, "surface name")?;
                let client = self.client(args)?;
                let id = shell.create_surface(client)?;
                self.surfaces.insert(name.to_owned(), id);
            }
            "commit" => {
                let surface = self.surface(args)?;
                let w = self.int(args)?;
                let h = self.int(args)?;
                let dx = self.opt_int(args)?.unwrap_or(0);
                let dy = self.opt_int(args)?.unwrap_or(0);
                shell.commit_surface(surface, Size::from((w, h)), Point::from((dx, dy)))?;
            }
            "destroy" => {
                let name = self.word(args, "surface name")?;
                let surface = self.lookup(&self.surfaces, name, "surface")?;
                shell.destroy_surface(surface)?;
                self.surfaces.remove(name);
                self.windows.remove(name);
            }
            "shell-surface" => {
                let name = self.word(args, "surface name")?;
                let surface = self.lookup(&self.surfaces, name, "surface")?;
                let id = shell.create_shell_surface(surface)?;
                self.windows.insert(name.to_owned(), id);
            }
            "toplevel" => shell.set_toplevel(self.window(args)?)?,
            "transient" => {
                let window = self.window(args)?;
                let parent = self.surface(args)?;
                let x = self.int(args)?;
                let y = self.int(args)?;
                let inactive = self.flag(args, "inactive");
                shell.set_transient(window, parent, x, y, inactive)?;
            }
            "popup" => {
                let window = self.window(args)?;
                let parent = self.surface(args)?;
                let x = self.int(args)?;
                let y = self.int(args)?;
                let seat = self.seat()?;
                shell.set_popup(window, parent, seat, x, y)?;
            }
            "xwayland" => {
                let window = self.window(args)?;
                let x = self.int(args)?;
                let y = self.int(args)?;
                let inactive = self.flag(args, "inactive");
                shell.set_xwayland(window, x, y, inactive)?;
            }
            "maximize" => shell.set_maximized(self.window(args)?)?,
            "fullscreen" => shell.set_fullscreen(self.window(args)?)?,
            "title" => {
                let window = self.window(args)?;
                let title = args.by_ref().collect::<Vec<_>>().join(" ");
                shell.set_title(window, &title)?;
            }
            "app-id" => {
                let window = self.window(args)?;
                let app_id = self.word(args, "app id")?;
                shell.set_app_id(window, app_id)?;
            }
            "minimize" => shell.minimize(self.window(args)?)?,
            "restore" => shell.restore(self.window(args)?)?,
            "close" => shell.close(self.window(args)?)?,
            "preview" => {
                let window = self.window(args)?;
                let output = self.output(args)?;
                shell.preview(window, output)?;
            }
            "end-preview" => shell.end_preview(self.window(args)?)?,
            "move" => {
                let window = self.window(args)?;
                shell.move_shell_surface(window, self.seat()?)?;
            }
            "resize" => {
                let window = self.window(args)?;
                let edges = self.parse::<u32>(self.word(args, "edge mask")?)?;
                shell.resize_shell_surface(window, self.seat()?, edges)?;
            }
            "motion" => {
                let x = self.float(args)?;
                let y = self.float(args)?;
                let seat = self.seat()?;
                shell.pointer_motion(seat, self.time, Point::from((x, y)));
            }
            "press" | "release" => {
                let button = self.button(args)?;
                let state = if command == "press" {
                    ButtonState::Pressed
                } else {
                    ButtonState::Released
                };
                let seat = self.seat()?;
                shell.pointer_button(seat, self.time, button, state);
            }
            "click" => {
                let button = self.button(args)?;
                let seat = self.seat()?;
                shell.pointer_button(seat, self.time, button, ButtonState::Pressed);
                shell.pointer_button(seat, self.time, button, ButtonState::Released);
            }
            "mods" => {
                let modifiers = self.modifiers(args)?;
                shell.keyboard_modifiers(self.seat()?, modifiers);
            }
            "key" => {
                let keysym = self.keysym(args)?;
                let seat = self.seat()?;
                shell.keyboard_key(seat, self.time, keysym, KeyState::Pressed);
                shell.keyboard_key(seat, self.time, keysym, KeyState::Released);
            }
            "add-workspace" => {
                shell.add_workspace();
            }
            "workspace" => {
                let index = self.parse::<usize>(self.word(args, "workspace index")?)?;
                let output = self.output(args)?;
                let workspace = self.workspace(shell, index)?;
                shell.activate_workspace(workspace, output)?;
            }
            "desktop-client" => {
                let client = self.client(args)?;
                shell.set_desktop_client(client);
            }
            "bind" => shell.bind(self.client(args)?)?,
            "output-bound" => {
                let output = self.output(args)?;
                shell.output_bound(output)?;
            }
            "output-loaded" => {
                let serial = self.parse::<u32>(self.word(args, "serial")?)?;
                shell.output_loaded(serial);
            }
            "background" => {
                let output = self.output(args)?;
                let surface = self.surface(args)?;
                shell.set_background(output, surface)?;
            }
            "panel" => {
                let id = PanelId::new(self.parse(self.word(args, "panel id")?)?);
                let output = self.output(args)?;
                let surface = self.surface(args)?;
                let position = self.parse::<u32>(self.word(args, "panel position")?)?;
                shell.set_panel(id, output, surface, position)?;
            }
            "panel-position" => {
                let id = PanelId::new(self.parse(self.word(args, "panel id")?)?);
                let position = self.parse::<u32>(self.word(args, "panel position")?)?;
                shell.panel_set_position(id, position)?;
            }
            "lock-surface" => {
                let surface = self.surface(args)?;
                let output = self.output(args)?;
                shell.set_lock_surface(surface, output)?;
            }
            "overlay" => {
                let output = self.output(args)?;
                let surface = self.surface(args)?;
                shell.add_overlay(output, surface)?;
            }
            "desktop-popup" => {
                let id = PopupId::new(self.parse(self.word(args, "popup id")?)?);
                let parent = self.surface(args)?;
                let surface = self.surface(args)?;
                let x = self.int(args)?;
                let y = self.int(args)?;
                shell.set_desktop_popup(id, parent, surface, x, y)?;
            }
            "grab-surface" => shell.set_grab_surface(self.surface(args)?)?,
            "grab" => {
                let id = ClientGrabId::new(self.parse(self.word(args, "grab id")?)?);
                shell.create_grab(id)?;
            }
            "end-grab" => {
                let id = ClientGrabId::new(self.parse(self.word(args, "grab id")?)?);
                shell.terminate_grab(id)?;
            }
            "notification" => {
                let surface = self.surface(args)?;
                let inactive = self.flag(args, "inactive");
                shell.push_notification(surface, inactive)?;
            }
            "lock" => shell.lock(),
            "unlock" => shell.unlock(),
            "wait" => {
                let ms = self.parse::<u32>(self.word(args, "milliseconds")?)?;
                self.time = self.time.saturating_add(ms);
            }
            "frame" => {
                if let Some(raw) = args.next() {
                    let ms = self.parse::<u32>(raw)?;
                    self.time = self.time.saturating_add(ms);
                }
                self.frame(shell);
            }
            "quit" => shell.quit(),
            other => return Err(self.error(format!("unknown command `{other}`"))),
        }

        if let Some(extra) = args.next() {
            return Err(self.error(format!("unexpected argument `{extra}`")));
        }
        Ok(())
    }

    /// Runs one animation frame on every output at the script clock.
    pub fn frame(&self, shell: &mut Shell) {
        let now = Duration::from_millis(u64::from(self.time));
        let outputs: Vec<_> = shell.outputs().map(|o| o.id).collect();
        for output in outputs {
            shell.output_frame(output, now);
        }
    }

    fn word<'a>(&self, args: &mut Args<'a>, what: &str) -> Result<&'a str> {
        args.next()
            .ok_or_else(|| self.error(format!("missing {what}")))
    }

    fn parse<T: std::str::FromStr>(&self, raw: &str) -> Result<T> {
        raw.parse()
            .map_err(|_| self.error(format!("invalid number `{raw}`")))
    }

    fn int(&self, args: &mut Args<'_>) -> Result<i32> {
        self.parse(self.word(args, "number")?)
    }

    fn opt_int(&self, args: &mut Args<'_>) -> Result<Option<i32>> {
        args.next().map(|raw| self.parse(raw)).transpose()
    }

    fn float(&self, args: &mut Args<'_>) -> Result<f64> {
        self.parse(self.word(args, "coordinate")?)
    }

    fn flag(&self, args: &mut Args<'_>, name: &str) -> bool {
        args.next_if_eq(&name).is_some()
    }

    fn lookup<T: Copy>(&self, table: &HashMap<String, T>, name: &str, what: &str) -> Result<T> {
        table
            .get(name)
            .copied()
            .ok_or_else(|| self.error(format!("unknown {what} `{name}`")))
    }

    fn output(&self, args: &mut Args<'_>) -> Result<OutputId> {
        let name = self.word(args, "output name")?;
        self.lookup(&self.outputs, name, "output")
    }

    fn client(&self, args: &mut Args<'_>) -> Result<ClientId> {
        let name = self.word(args, "client name")?;
        self.lookup(&self.clients, name, "client")
    }

    fn surface(&self, args: &mut Args<'_>) -> Result<SurfaceId> {
        let name = self.word(args, "surface name")?;
        self.lookup(&self.surfaces, name, "surface")
    }

    fn window(&self, args: &mut Args<'_>) -> Result<ShellSurfaceId> {
        let name = self.word(args, "window name")?;
        self.lookup(&self.windows, name, "window")
    }

    fn seat(&self) -> Result<SeatId> {
        self.seat.ok_or_else(|| self.error("no seat"))
    }

    fn workspace(&self, shell: &Shell, index: usize) -> Result<WorkspaceId> {
        shell
            .workspaces()
            .nth(index)
            .map(|w| w.id)
            .ok_or_else(|| self.error(format!("no workspace {index}")))
    }

    fn button(&self, args: &mut Args<'_>) -> Result<u32> {
        match self.word(args, "button")? {
            "left" => Ok(BTN_LEFT),
            "right" => Ok(BTN_RIGHT),
            raw => self.parse(raw),
        }
    }

    fn modifiers(&self, args: &mut Args<'_>) -> Result<ModifiersState> {
        let mut state = ModifiersState::default();
        let Some(combo) = args.next() else {
            return Ok(state);
        };
        for part in combo.split('+') {
            match part.to_ascii_lowercase().as_str() {
                "none" => {}
                "shift" => state.shift = true,
                "ctrl" | "control" => state.ctrl = true,
                "alt" => state.alt = true,
                "super" | "logo" => state.logo = true,
                other => return Err(self.error(format!("unknown modifier `{other}`"))),
            }
        }
        Ok(state)
    }

    fn keysym(&self, args: &mut Args<'_>) -> Result<Keysym> {
        let name = self.word(args, "key name")?;
        let keysym = xkb::keysym_from_name(name, KEYSYM_CASE_INSENSITIVE);
        if keysym == Keysym::NoSymbol {
            return Err(self.error(format!("unknown key `{name}`")));
        }
        Ok(keysym)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ShellConfig, state::ShellEvent};

    fn shell() -> (Shell, Script) {
        let mut shell = Shell::new(ShellConfig::default());
        let seat = shell.add_seat("seat0");
        (shell, Script::new(seat))
    }

    #[test]
    fn maps_a_window_by_name() {
        let (mut shell, mut script) = shell();
        script
            .run(
                &mut shell,
                "output A 0 0 800 600\n\
                 client app 10 # comment\n\
                 surface win app\n\
                 shell-surface win\n\
                 title win hello world\n\
                 toplevel win\n\
                 commit win 200 100\n",
            )
            .unwrap();

        let window = script.windows["win"];
        assert_eq!(shell.shell_surface(window).unwrap().title(), "hello world");
        assert!(shell.drain_events().contains(&ShellEvent::Mapped(window)));
    }

    #[test]
    fn errors_carry_the_line_number() {
        let (mut shell, mut script) = shell();
        let err = script
            .run(&mut shell, "output A 0 0 800 600\n\nsurface win nobody\n")
            .unwrap_err();
        assert_eq!(
            err,
            ShellError::Script {
                line: 3,
                message: "unknown client `nobody`".to_owned(),
            }
        );

        let err = script.run_line(&mut shell, "frobnicate").unwrap_err();
        assert!(matches!(err, ShellError::Script { line: 4, .. }));
        let err = script.run_line(&mut shell, "wait 10 20").unwrap_err();
        assert!(err.to_string().contains("unexpected argument `20`"));
    }

    #[test]
    fn shell_errors_are_wrapped() {
        let (mut shell, mut script) = shell();
        script
            .run(
                &mut shell,
                "output A 0 0 800 600\nclient c\nsurface s c\npanel 1 A s 0\n",
            )
            .unwrap();
        let err = script.run_line(&mut shell, "background A s").unwrap_err();
        assert!(matches!(err, ShellError::Script { line: 5, .. }));
    }

    #[test]
    fn wait_and_frame_advance_the_clock() {
        let (mut shell, mut script) = shell();
        script.run(&mut shell, "wait 100\nframe 16\n").unwrap();
        assert_eq!(script.time(), 116);
    }

    #[test]
    fn key_names_resolve_case_insensitively() {
        let (mut shell, mut script) = shell();
        script.run_line(&mut shell, "key escape").unwrap();
        assert!(script.run_line(&mut shell, "key not-a-key").is_err());
    }
}
