use std::{
    backtrace::Backtrace,
    fs::{self, File},
    io::{self, BufRead, BufReader},
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{Context, bail};
use calloop::{
    EventLoop, LoopSignal,
    channel::{self, Event},
    timer::{TimeoutAction, Timer},
};
use orrery::{
    Shell, ShellEvent,
    config::{self, ShellConfig},
    cursor::CursorThemeManager,
    script::Script,
};
use smithay::utils::{Point, Rectangle, Size};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

const DEFAULT_LOG_FILTER: &str = concat!(
    "orrery=debug,",
    "orrery::input=info,",
    "orrery::animation=info"
);

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    script: Option<PathBuf>,
}

impl Args {
    fn parse(mut raw: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut args = Args::default();
        while let Some(arg) = raw.next() {
            match arg.as_str() {
                "--config" => {
                    let path = raw.next().context("--config needs a path")?;
                    args.config = Some(PathBuf::from(path));
                }
                "--script" => {
                    let path = raw.next().context("--script needs a path")?;
                    args.script = Some(PathBuf::from(path));
                }
                other => bail!("unknown argument `{other}` (usage: orrery [--config PATH] [--script FILE])"),
            }
        }
        Ok(args)
    }
}

struct Driver {
    shell: Shell,
    script: Script,
    cursors: CursorThemeManager,
    last_frame: Instant,
    signal: LoopSignal,
}

impl Driver {
    fn run_line(&mut self, line: &str) {
        if let Err(err) = self.script.run_line(&mut self.shell, line) {
            warn!("{err}");
        }
        self.flush_events();
    }

    fn frame(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);
        self.last_frame = now;
        self.script
            .advance(u32::try_from(elapsed.as_millis()).unwrap_or(u32::MAX));
        self.script.frame(&mut self.shell);
        self.flush_events();
    }

    fn flush_events(&mut self) {
        for event in self.shell.drain_events() {
            match &event {
                ShellEvent::GrabCursor {
                    seat,
                    cursor: Some(cursor),
                } => {
                    let time = Duration::from_millis(u64::from(self.script.time()));
                    if let Some(image) = self.cursors.image(*cursor, time) {
                        debug!(%seat, ?cursor, width = image.width, height = image.height, "grab cursor image");
                    }
                }
                ShellEvent::Quit => self.signal.stop(),
                _ => {}
            }
            info!(?event, "shell event");
        }
        if !self.shell.is_running() {
            self.signal.stop();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_logging()?;
    std::panic::set_hook(Box::new(|panic_info| {
        let backtrace = Backtrace::force_capture();
        error!("panic: {panic_info}\n{backtrace}");
        eprintln!("panic: {panic_info}\n{backtrace}");
    }));

    let args = Args::parse(std::env::args().skip(1))?;
    let config = match &args.config {
        Some(path) => config::load_from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => {
            let loaded = config::load_or_create_default().context("failed to load config")?;
            info!(path = %loaded.path.display(), "config loaded");
            loaded.config
        }
    };

    let mut event_loop: EventLoop<Driver> =
        EventLoop::try_new().context("failed to create event loop")?;
    let mut driver = build_driver(config, event_loop.get_signal());

    let (sender, commands) = channel::channel::<String>();
    let script_path = args.script.clone();
    std::thread::Builder::new()
        .name("orrery-script".to_owned())
        .spawn(move || {
            let reader: Box<dyn BufRead> = match &script_path {
                Some(path) => match File::open(path) {
                    Ok(file) => Box::new(BufReader::new(file)),
                    Err(err) => {
                        error!(path = %path.display(), "cannot open script: {err}");
                        return;
                    }
                },
                None => Box::new(BufReader::new(io::stdin())),
            };
            for line in reader.lines() {
                let Ok(line) = line else {
                    break;
                };
                if sender.send(line).is_err() {
                    break;
                }
            }
        })
        .context("failed to spawn script reader")?;

    let handle = event_loop.handle();
    handle
        .insert_source(commands, |event, _, driver| match event {
            Event::Msg(line) => driver.run_line(&line),
            Event::Closed => {
                info!("script finished");
                driver.signal.stop();
            }
        })
        .map_err(|err| anyhow::anyhow!("failed to insert script source: {err}"))?;
    handle
        .insert_source(Timer::from_duration(FRAME_INTERVAL), |_, _, driver| {
            driver.frame();
            TimeoutAction::ToDuration(FRAME_INTERVAL)
        })
        .map_err(|err| anyhow::anyhow!("failed to insert frame timer: {err}"))?;

    event_loop
        .run(None, &mut driver, |_| {})
        .context("event loop failed")?;

    driver.flush_events();
    print!("{}", driver.shell.stacking_report());
    Ok(())
}

fn build_driver(config: ShellConfig, signal: LoopSignal) -> Driver {
    let cursors = CursorThemeManager::load(&config.cursor_theme, config.cursor_size);
    let outputs = if config.outputs.is_empty() {
        vec![config::OutputConfig {
            name: "HEADLESS-1".to_owned(),
            size: Size::from((1920, 1080)),
            position: Point::from((0, 0)),
        }]
    } else {
        config.outputs.clone()
    };

    let mut shell = Shell::new(config);
    let seat = shell.add_seat("seat0");
    let mut script = Script::new(seat);
    for output in &outputs {
        let id = shell.add_output(&output.name, Rectangle::new(output.position, output.size));
        script.name_output(&output.name, id);
    }

    Driver {
        shell,
        script,
        cursors,
        last_frame: Instant::now(),
        signal,
    }
}

fn init_logging() -> anyhow::Result<()> {
    let log_dir = std::env::var_os("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/state")))
        .unwrap_or_else(std::env::temp_dir)
        .join("orrery");
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "orrery.log");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(true)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_appender),
        )
        .init();

    let log_file = log_dir.join("orrery.log");
    info!(path = %log_file.display(), "logging initialized");

    Ok(())
}
