use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use smithay::{
    input::keyboard::{Keysym, ModifiersState},
    utils::{Logical, Point, Size},
};

use crate::{action::Action, errors::ShellError};

#[derive(Clone, Debug)]
pub struct ShellConfig {
    pub main_key: MainKey,
    pub keybinds: Vec<Keybind>,
    /// Workspaces created at startup.
    pub workspaces: usize,
    /// Distance in pixels within which a moved window snaps to an edge.
    pub snap_margin: u32,
    /// Presses outside a desktop popup sooner than this after it opened are ignored.
    pub popup_grace_ms: u32,
    pub animation_ms: u32,
    pub cursor_theme: String,
    pub cursor_size: u32,
    pub outputs: Vec<OutputConfig>,
}

/// A display the headless driver creates at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputConfig {
    pub name: String,
    pub size: Size<i32, Logical>,
    pub position: Point<i32, Logical>,
}

impl ShellConfig {
    pub fn keybind_action_for(&self, modifiers: &ModifiersState, keysym: Keysym) -> Option<Action> {
        self.keybinds
            .iter()
            .find(|bind| bind.matches(modifiers, keysym))
            .map(|bind| bind.action)
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        let main_key = MainKey::Super;
        Self {
            main_key,
            keybinds: default_keybinds(main_key),
            workspaces: 4,
            snap_margin: 10,
            popup_grace_ms: 500,
            animation_ms: 200,
            cursor_theme: "default".to_owned(),
            cursor_size: 24,
            outputs: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MainKey {
    Super,
    Alt,
    Ctrl,
}

impl MainKey {
    pub fn matches(self, modifiers: &ModifiersState) -> bool {
        match self {
            MainKey::Super => modifiers.logo,
            MainKey::Alt => modifiers.alt,
            MainKey::Ctrl => modifiers.ctrl,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Keybind {
    pub modifiers: KeybindModifiers,
    pub key: String,
    pub action: Action,
}

impl Keybind {
    fn matches(&self, modifiers: &ModifiersState, keysym: Keysym) -> bool {
        self.modifiers.matches(modifiers) && keysym_matches_token(keysym, &self.key)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeybindModifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub logo: bool,
}

impl KeybindModifiers {
    fn set_main_key(&mut self, main_key: MainKey) {
        match main_key {
            MainKey::Super => self.logo = true,
            MainKey::Alt => self.alt = true,
            MainKey::Ctrl => self.ctrl = true,
        }
    }

    fn matches(self, modifiers: &ModifiersState) -> bool {
        self.shift == modifiers.shift
            && self.ctrl == modifiers.ctrl
            && self.alt == modifiers.alt
            && self.logo == modifiers.logo
    }
}

pub struct LoadedConfig {
    pub path: PathBuf,
    pub config: ShellConfig,
}

pub fn load_or_create_default() -> Result<LoadedConfig, ShellError> {
    let path = config_path()?;
    if ensure_config_file(&path)? {
        tracing::info!(path = %path.display(), "created default config.lua");
    }

    let config = load_from_path(&path)?;
    Ok(LoadedConfig { path, config })
}

/// Writes the default template when the file is missing or blank. Returns
/// whether it wrote anything.
pub fn ensure_config_file(path: &Path) -> Result<bool, ShellError> {
    let blank = match fs::read_to_string(path) {
        Ok(content) => content.trim().is_empty(),
        Err(_) => !path.exists(),
    };
    if !blank {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            ShellError::Config(format!(
                "failed to create config directory {}: {err}",
                parent.display()
            ))
        })?;
    }
    fs::write(path, default_config_template()).map_err(|err| {
        ShellError::Config(format!(
            "failed to write default config {}: {err}",
            path.display()
        ))
    })?;
    Ok(true)
}

pub fn load_from_path(path: &Path) -> Result<ShellConfig, ShellError> {
    if !path.exists() {
        return Err(ShellError::Config(format!(
            "config file not found: {}",
            path.display()
        )));
    }
    let values = load_lua_values(path)?;
    from_values(&values)
}

/// Builds a config from the flattened `key=value` map the Lua loader prints.
pub fn from_values(values: &HashMap<String, String>) -> Result<ShellConfig, ShellError> {
    let mut config = ShellConfig::default();

    if let Some(value) = values.get("main_key") {
        config.main_key = parse_main_key(value)?;
    }
    if let Some(value) = values.get("modkey") {
        config.main_key = parse_main_key(value)?;
    }

    config.workspaces = parse_u32(values, "workspaces", config.workspaces as u32)? as usize;
    if !(1..=32).contains(&config.workspaces) {
        return Err(ShellError::Config(
            "workspaces must be between 1 and 32".to_owned(),
        ));
    }

    config.snap_margin = parse_u32(values, "snap_margin", config.snap_margin)?;
    config.popup_grace_ms = parse_u32(values, "popup_grace_ms", config.popup_grace_ms)?;
    config.animation_ms = parse_u32(values, "animation_ms", config.animation_ms)?;

    if let Some(value) = values.get("cursor_theme") {
        config.cursor_theme = value.clone();
    }
    config.cursor_size = parse_u32(values, "cursor_size", config.cursor_size)?;
    if config.cursor_size == 0 {
        return Err(ShellError::Config(
            "cursor_size must be greater than 0".to_owned(),
        ));
    }

    config.outputs = parse_output_configs(values)?;

    let keybind_lines = collect_indexed_values(values, "keybind.")?;
    config.keybinds = if keybind_lines.is_empty() {
        default_keybinds(config.main_key)
    } else {
        keybind_lines
            .iter()
            .map(|line| parse_keybind_line(line, config.main_key))
            .collect::<Result<Vec<_>, _>>()?
    };

    Ok(config)
}

pub fn config_path() -> Result<PathBuf, ShellError> {
    if let Some(path) = std::env::var_os("ORRERY_CONFIG_PATH")
        && !path.is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME")
        && !xdg.is_empty()
    {
        return Ok(PathBuf::from(xdg).join("orrery").join("config.lua"));
    }

    if let Some(home) = std::env::var_os("HOME")
        && !home.is_empty()
    {
        return Ok(PathBuf::from(home)
            .join(".config")
            .join("orrery")
            .join("config.lua"));
    }

    Err(ShellError::Config(
        "unable to resolve config path: HOME and XDG_CONFIG_HOME are unset".to_owned(),
    ))
}

fn load_lua_values(path: &Path) -> Result<HashMap<String, String>, ShellError> {
    let output = Command::new("lua")
        .arg("-e")
        .arg(lua_loader_script())
        .env("ORRERY_CONFIG_FILE", path)
        .output()
        .map_err(|err| ShellError::Config(format!("failed to execute lua: {err}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
        let reason = if stderr.is_empty() {
            "lua exited with non-zero status".to_owned()
        } else {
            stderr
        };
        return Err(ShellError::Config(format!(
            "failed to load {}: {reason}",
            path.display()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_key_value_stdout(&stdout)
}

pub fn parse_key_value_stdout(stdout: &str) -> Result<HashMap<String, String>, ShellError> {
    let mut values = HashMap::new();
    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(ShellError::Config(format!("invalid lua output line: {line}")));
        };
        values.insert(key.to_owned(), value.to_owned());
    }
    Ok(values)
}

fn collect_indexed_values(
    values: &HashMap<String, String>,
    prefix: &str,
) -> Result<Vec<String>, ShellError> {
    let mut indexed = Vec::<(usize, String)>::new();

    for (key, value) in values {
        let Some(index_str) = key.strip_prefix(prefix) else {
            continue;
        };

        let index = index_str.parse::<usize>().map_err(|err| {
            ShellError::Config(format!(
                "invalid indexed key `{key}`: index is not a number ({err})"
            ))
        })?;
        indexed.push((index, value.clone()));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, value)| value).collect())
}

fn parse_output_configs(values: &HashMap<String, String>) -> Result<Vec<OutputConfig>, ShellError> {
    let mut indices = values
        .keys()
        .filter_map(|key| key.strip_prefix("output."))
        .filter_map(|rest| rest.split_once('.'))
        .map(|(index, _)| {
            index.parse::<usize>().map_err(|err| {
                ShellError::Config(format!("invalid output index `{index}` ({err})"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    indices.sort_unstable();
    indices.dedup();

    let mut outputs = Vec::with_capacity(indices.len());
    let mut next_x = 0;
    for index in indices {
        let prefix = format!("output.{index}.");
        let name = values
            .get(&format!("{prefix}name"))
            .cloned()
            .ok_or_else(|| ShellError::Config(format!("output.{index} is missing a name")))?;
        let size = match values.get(&format!("{prefix}mode")) {
            Some(mode) => parse_mode(mode)?,
            None => Size::from((1920, 1080)),
        };
        let x = parse_i32(values, &format!("{prefix}x"), next_x)?;
        let y = parse_i32(values, &format!("{prefix}y"), 0)?;
        next_x = x + size.w;
        outputs.push(OutputConfig {
            name,
            size,
            position: Point::from((x, y)),
        });
    }
    Ok(outputs)
}

fn parse_mode(raw: &str) -> Result<Size<i32, Logical>, ShellError> {
    let invalid = || ShellError::Config(format!("invalid output mode `{raw}` (expected WxH)"));
    let (w, h) = raw.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
    let w = w.trim().parse::<i32>().map_err(|_| invalid())?;
    let h = h.trim().parse::<i32>().map_err(|_| invalid())?;
    if w <= 0 || h <= 0 {
        return Err(invalid());
    }
    Ok(Size::from((w, h)))
}

fn parse_main_key(raw: &str) -> Result<MainKey, ShellError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "super" | "logo" | "win" | "windows" | "mod4" => Ok(MainKey::Super),
        "alt" | "mod1" => Ok(MainKey::Alt),
        "ctrl" | "control" => Ok(MainKey::Ctrl),
        _ => Err(ShellError::Config(format!(
            "invalid main_key/modkey `{raw}` (expected Super/Mod4, Alt/Mod1, or Ctrl)"
        ))),
    }
}

fn default_keybinds(main_key: MainKey) -> Vec<Keybind> {
    const DEFAULT_BINDS: &[(&str, Action)] = &[
        ("Main+Right", Action::NextWorkspace),
        ("Main+Left", Action::PreviousWorkspace),
        ("Main+J", Action::FocusNext),
        ("Main+K", Action::FocusPrevious),
        ("Main+Q", Action::CloseFocused),
        ("Main+M", Action::MinimizeFocused),
        ("Main+L", Action::Lock),
        ("Main+Shift+Escape", Action::Quit),
    ];

    DEFAULT_BINDS
        .iter()
        .filter_map(|(combo, action)| {
            parse_combo(combo, main_key)
                .ok()
                .map(|(modifiers, key)| Keybind {
                    modifiers,
                    key,
                    action: *action,
                })
        })
        .collect()
}

pub fn parse_keybind_line(line: &str, main_key: MainKey) -> Result<Keybind, ShellError> {
    let trimmed = line.trim();
    let mut parts = trimmed.split_whitespace();
    let Some(combo) = parts.next() else {
        return Err(ShellError::Config(
            "keybind entry must not be empty".to_owned(),
        ));
    };
    let action_name = parts.next().ok_or_else(|| {
        ShellError::Config(format!(
            "invalid keybind `{trimmed}`: missing action (expected format `<combo> <action> [arg]`)"
        ))
    })?;
    let action_args = parts.collect::<Vec<_>>().join(" ");

    let (modifiers, key) = parse_combo(combo, main_key)?;
    let action = parse_keybind_action(action_name, action_args.as_str(), trimmed)?;

    Ok(Keybind {
        modifiers,
        key,
        action,
    })
}

fn parse_combo(combo: &str, main_key: MainKey) -> Result<(KeybindModifiers, String), ShellError> {
    let mut modifiers = KeybindModifiers::default();
    let mut key: Option<String> = None;

    for raw_part in combo.split('+') {
        let part = raw_part.trim();
        if part.is_empty() {
            return Err(ShellError::Config(format!(
                "invalid key combo `{combo}`: empty segment"
            )));
        }

        match part.to_ascii_lowercase().as_str() {
            "shift" => modifiers.shift = true,
            "ctrl" | "control" => modifiers.ctrl = true,
            "alt" | "mod1" => modifiers.alt = true,
            "super" | "logo" | "win" | "windows" | "mod4" => modifiers.logo = true,
            "main" => modifiers.set_main_key(main_key),
            _ => {
                if key.is_some() {
                    return Err(ShellError::Config(format!(
                        "invalid key combo `{combo}`: multiple key tokens"
                    )));
                }
                key = Some(normalize_key_token(part));
            }
        }
    }

    let key = key.ok_or_else(|| {
        ShellError::Config(format!(
            "invalid key combo `{combo}`: missing non-modifier key"
        ))
    })?;

    Ok((modifiers, key))
}

fn normalize_key_token(raw: &str) -> String {
    let mut chars = raw.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        return ch.to_ascii_uppercase().to_string();
    }

    match raw.to_ascii_uppercase().as_str() {
        "ENTER" => "RETURN".to_owned(),
        "ESC" => "ESCAPE".to_owned(),
        "SPACEBAR" => "SPACE".to_owned(),
        other => other.to_owned(),
    }
}

fn parse_keybind_action(
    action_name: &str,
    action_args: &str,
    full_line: &str,
) -> Result<Action, ShellError> {
    let action = match action_name.to_ascii_lowercase().as_str() {
        "next_workspace" | "workspace_next" => Action::NextWorkspace,
        "previous_workspace" | "prev_workspace" | "workspace_prev" => Action::PreviousWorkspace,
        "focus_next" | "next" => Action::FocusNext,
        "focus_prev" | "focus_previous" | "prev" => Action::FocusPrevious,
        "close" | "close_focused" | "close_window" => Action::CloseFocused,
        "minimize" | "minimize_focused" => Action::MinimizeFocused,
        "lock" => Action::Lock,
        "quit" => Action::Quit,
        "workspace" => Action::SwitchWorkspace(parse_workspace_index(action_args, full_line)?),
        _ => {
            return Err(ShellError::Config(format!(
                "invalid keybind `{full_line}`: unknown action `{action_name}`"
            )));
        }
    };

    if !matches!(action, Action::SwitchWorkspace(_)) && !action_args.trim().is_empty() {
        return Err(ShellError::Config(format!(
            "invalid keybind `{full_line}`: action `{action_name}` does not accept arguments"
        )));
    }

    Ok(action)
}

fn parse_workspace_index(action_args: &str, full_line: &str) -> Result<usize, ShellError> {
    let raw = action_args.trim();
    if raw.is_empty() {
        return Err(ShellError::Config(format!(
            "invalid keybind `{full_line}`: action `workspace` requires workspace number"
        )));
    }
    if raw.contains(char::is_whitespace) {
        return Err(ShellError::Config(format!(
            "invalid keybind `{full_line}`: action `workspace` expects a single number"
        )));
    }

    let number = raw.parse::<usize>().map_err(|err| {
        ShellError::Config(format!(
            "invalid keybind `{full_line}`: invalid workspace number `{raw}` ({err})"
        ))
    })?;

    if !(1..=10).contains(&number) {
        return Err(ShellError::Config(format!(
            "invalid keybind `{full_line}`: workspace must be between 1 and 10"
        )));
    }

    Ok(number - 1)
}

fn keysym_matches_token(keysym: Keysym, token: &str) -> bool {
    let mut chars = token.chars();
    if let (Some(token_char), None) = (chars.next(), chars.next()) {
        if token_char.is_ascii_digit() {
            return digit_matches_keysym(token_char, keysym);
        }

        if token_char.is_ascii_alphabetic() {
            return keysym
                .key_char()
                .is_some_and(|ch| ch.eq_ignore_ascii_case(&token_char));
        }

        return keysym.key_char() == Some(token_char);
    }

    match token {
        "RETURN" => matches!(keysym, Keysym::Return | Keysym::KP_Enter),
        "ESCAPE" => keysym == Keysym::Escape,
        "PRINT" => keysym == Keysym::Print,
        "SPACE" => keysym.key_char() == Some(' '),
        "TAB" => matches!(keysym, Keysym::Tab | Keysym::ISO_Left_Tab | Keysym::KP_Tab),
        "LEFT" => keysym == Keysym::Left,
        "RIGHT" => keysym == Keysym::Right,
        "UP" => keysym == Keysym::Up,
        "DOWN" => keysym == Keysym::Down,
        "BACKSPACE" => keysym == Keysym::BackSpace,
        _ => false,
    }
}

fn digit_matches_keysym(digit: char, keysym: Keysym) -> bool {
    match digit {
        '1' => matches!(keysym, Keysym::_1 | Keysym::exclam),
        '2' => matches!(keysym, Keysym::_2 | Keysym::at),
        '3' => matches!(keysym, Keysym::_3 | Keysym::numbersign),
        '4' => matches!(keysym, Keysym::_4 | Keysym::dollar),
        '5' => matches!(keysym, Keysym::_5 | Keysym::percent),
        '6' => matches!(keysym, Keysym::_6 | Keysym::asciicircum),
        '7' => matches!(keysym, Keysym::_7 | Keysym::ampersand),
        '8' => matches!(keysym, Keysym::_8 | Keysym::asterisk),
        '9' => matches!(keysym, Keysym::_9 | Keysym::parenleft),
        '0' => matches!(keysym, Keysym::_0 | Keysym::parenright),
        _ => false,
    }
}

fn parse_u32(values: &HashMap<String, String>, key: &str, default: u32) -> Result<u32, ShellError> {
    match values.get(key) {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|err| ShellError::Config(format!("invalid value for {key}: {raw} ({err})"))),
        None => Ok(default),
    }
}

fn parse_i32(values: &HashMap<String, String>, key: &str, default: i32) -> Result<i32, ShellError> {
    match values.get(key) {
        Some(raw) => raw
            .parse::<i32>()
            .map_err(|err| ShellError::Config(format!("invalid value for {key}: {raw} ({err})"))),
        None => Ok(default),
    }
}

fn default_config_template() -> &'static str {
    r#"-- orrery config
-- File: ~/.config/orrery/config.lua (or $XDG_CONFIG_HOME/orrery/config.lua)
return {
  general = {
    modkey = "Super",
    workspaces = 4,
    snap_margin = 10,
    popup_grace_ms = 500,
    animation_ms = 200,
  },

  cursor = {
    theme = "default",
    size = 24,
  },

  keybindings = {
    { combo = "Main+Right", action = "next_workspace" },
    { combo = "Main+Left", action = "previous_workspace" },
    { combo = "Main+J", action = "focus_next" },
    { combo = "Main+K", action = "focus_prev" },
    { combo = "Main+Q", action = "close" },
    { combo = "Main+M", action = "minimize" },
    { combo = "Main+L", action = "lock" },
    { combo = "Main+Shift+Escape", action = "quit" },

    { combo = "Main+1", action = "workspace", arg = "1" },
    { combo = "Main+2", action = "workspace", arg = "2" },
    { combo = "Main+3", action = "workspace", arg = "3" },
    { combo = "Main+4", action = "workspace", arg = "4" },
  },

  outputs = {
    -- Displays created by the headless driver, left to right when x is omitted.
    { name = "HEADLESS-1", mode = "1920x1080" },
    -- { name = "HEADLESS-2", mode = "1280x1024", x = 1920, y = 0 },
  },
}
"#
}

fn lua_loader_script() -> &'static str {
    r#"
local path = os.getenv("ORRERY_CONFIG_FILE")
if type(path) ~= "string" or path == "" then
  io.stderr:write("ORRERY_CONFIG_FILE is not set\n")
  os.exit(1)
end

local chunk, load_err = loadfile(path)
if not chunk then
  io.stderr:write(load_err .. "\n")
  os.exit(1)
end

local ok, result = pcall(chunk)
if not ok then
  io.stderr:write(result .. "\n")
  os.exit(1)
end

local cfg = nil
if type(result) == "table" then
  cfg = result
elseif type(_G.config) == "table" then
  cfg = _G.config
else
  cfg = {}
end

local function emit(key, value)
  io.write(key)
  io.write("=")
  io.write(tostring(value))
  io.write("\n")
end

local function expect_table(name, value)
  if value ~= nil and type(value) ~= "table" then
    io.stderr:write(name .. " must be a table\n")
    os.exit(1)
  end
end

local function emit_string(name, value)
  if value == nil then
    return
  end
  if type(value) ~= "string" then
    io.stderr:write(name .. " must be a string\n")
    os.exit(1)
  end
  emit(name, value)
end

local function emit_number(name, value)
  if value == nil then
    return
  end
  if type(value) ~= "number" then
    io.stderr:write(name .. " must be a number\n")
    os.exit(1)
  end
  emit(name, math.floor(value))
end

local function pick(primary, fallback)
  if primary ~= nil then
    return primary
  end
  return fallback
end

local function as_string(value)
  if value == nil then
    return nil
  end
  if type(value) ~= "string" then
    return tostring(value)
  end
  return value
end

expect_table("general", cfg.general)
expect_table("cursor", cfg.cursor)
local general = cfg.general or {}

emit_string("main_key", pick(general.main_key, cfg.main_key))
emit_string("modkey", pick(general.modkey, cfg.modkey))
emit_number("workspaces", pick(general.workspaces, cfg.workspaces))
emit_number("snap_margin", pick(general.snap_margin, cfg.snap_margin))
emit_number("popup_grace_ms", pick(general.popup_grace_ms, cfg.popup_grace_ms))
emit_number("animation_ms", pick(general.animation_ms, cfg.animation_ms))

local cursor = cfg.cursor or {}
emit_string("cursor_theme", pick(cursor.theme, cfg.cursor_theme))
emit_number("cursor_size", pick(cursor.size, cfg.cursor_size))

local function render_keybind_entry(entry, index)
  if type(entry) == "string" then
    return entry
  end

  if type(entry) ~= "table" then
    io.stderr:write("keybindings[" .. tostring(index) .. "] must be string or table\n")
    os.exit(1)
  end

  local combo = as_string(pick(entry.combo, entry[1]))
  local action = as_string(pick(entry.action, entry[2]))
  local arg = as_string(pick(entry.arg, entry[3]))

  if combo == nil or combo == "" then
    io.stderr:write("keybindings[" .. tostring(index) .. "] missing combo\n")
    os.exit(1)
  end
  if action == nil or action == "" then
    io.stderr:write("keybindings[" .. tostring(index) .. "] missing action\n")
    os.exit(1)
  end

  if arg and arg ~= "" then
    return combo .. " " .. action .. " " .. arg
  end
  return combo .. " " .. action
end

local keybinds_table = pick(cfg.keybindings, cfg.keybinds)
expect_table("keybindings", keybinds_table)
if keybinds_table then
  for index, bind in ipairs(keybinds_table) do
    emit("keybind." .. tostring(index), render_keybind_entry(bind, index))
  end
end

local outputs = cfg.outputs
expect_table("outputs", outputs)
if outputs then
  for index, output in ipairs(outputs) do
    if type(output) ~= "table" then
      io.stderr:write("outputs[" .. tostring(index) .. "] must be a table\n")
      os.exit(1)
    end
    local prefix = "output." .. tostring(index) .. "."
    emit_string(prefix .. "name", output.name)
    emit_string(prefix .. "mode", output.mode)
    emit_number(prefix .. "x", output.x)
    emit_number(prefix .. "y", output.y)
  end
end
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = from_values(&HashMap::new()).unwrap();
        assert_eq!(config.main_key, MainKey::Super);
        assert_eq!(config.workspaces, 4);
        assert_eq!(config.snap_margin, 10);
        assert_eq!(config.popup_grace_ms, 500);
        assert!(!config.keybinds.is_empty());
        assert!(config.outputs.is_empty());
    }

    #[test]
    fn flat_values_are_parsed() {
        let stdout = "modkey=Alt\nworkspaces=6\nsnap_margin=0\ncursor_theme=Adwaita\n\
                      keybind.2=Main+Shift+3 workspace 3\nkeybind.1=Main+L lock\n\
                      output.1.name=A\noutput.1.mode=800x600\n\
                      output.2.name=B\noutput.2.mode=1024x768\n";
        let config = from_values(&parse_key_value_stdout(stdout).unwrap()).unwrap();

        assert_eq!(config.main_key, MainKey::Alt);
        assert_eq!(config.workspaces, 6);
        assert_eq!(config.snap_margin, 0);
        assert_eq!(config.cursor_theme, "Adwaita");

        assert_eq!(config.keybinds.len(), 2);
        assert_eq!(config.keybinds[0].action, Action::Lock);
        assert!(config.keybinds[0].modifiers.alt);
        assert_eq!(config.keybinds[1].action, Action::SwitchWorkspace(2));
        assert!(config.keybinds[1].modifiers.shift);

        assert_eq!(config.outputs.len(), 2);
        assert_eq!(config.outputs[1].position, Point::from((800, 0)));
        assert_eq!(config.outputs[1].size, Size::from((1024, 768)));
    }

    #[test]
    fn combos_need_exactly_one_key() {
        assert!(parse_keybind_line("Main+Shift lock", MainKey::Super).is_err());
        assert!(parse_keybind_line("Main+A+B lock", MainKey::Super).is_err());
        assert!(parse_keybind_line("Main++A lock", MainKey::Super).is_err());
        assert!(parse_keybind_line("Main+A", MainKey::Super).is_err());

        let bind = parse_keybind_line("ctrl+alt+enter quit", MainKey::Super).unwrap();
        assert_eq!(bind.key, "RETURN");
        assert!(bind.modifiers.ctrl && bind.modifiers.alt && !bind.modifiers.logo);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        for pairs in [
            &[("modkey", "Hyper")][..],
            &[("workspaces", "0")][..],
            &[("cursor_size", "0")][..],
            &[("snap_margin", "-3")][..],
            &[("keybind.1", "Main+L lock now")][..],
            &[("keybind.1", "Main+1 workspace 11")][..],
            &[("keybind.x", "Main+L lock")][..],
            &[("output.1.mode", "800x600")][..],
            &[("output.1.name", "A"), ("output.1.mode", "800by600")][..],
        ] {
            assert!(
                matches!(from_values(&values(pairs)), Err(ShellError::Config(_))),
                "{pairs:?}"
            );
        }
        assert!(parse_key_value_stdout("no separator").is_err());
    }

    #[test]
    fn keybinds_match_exact_modifiers() {
        let config = ShellConfig::default();
        let mut modifiers = ModifiersState::default();
        modifiers.logo = true;
        assert_eq!(
            config.keybind_action_for(&modifiers, Keysym::l),
            Some(Action::Lock)
        );
        modifiers.shift = true;
        assert_eq!(config.keybind_action_for(&modifiers, Keysym::l), None);
        assert_eq!(
            config.keybind_action_for(&modifiers, Keysym::Escape),
            Some(Action::Quit)
        );
    }

    #[test]
    fn default_file_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orrery").join("config.lua");

        assert!(ensure_config_file(&path).unwrap());
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("keybindings"));
        assert!(!ensure_config_file(&path).unwrap());

        fs::write(&path, "  \n").unwrap();
        assert!(ensure_config_file(&path).unwrap());
    }
}
