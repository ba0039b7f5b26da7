// Keychord CLI
// Interactive driver: feeds scripted key transitions into the engine and
// prints every listener invocation

use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;

use keychord_core::{Callback, Engine, EventKind, KeyEvent, Platform, Settings};

/// Keyboard chord listener engine demo
#[derive(Parser, Debug)]
#[command(name = "keychord")]
#[command(version = "0.1.0")]
#[command(about = "Keyboard chord listener engine demo", long_about = None)]
struct Args {
    /// TOML settings file (default: ~/.config/keychord/settings.toml)
    #[arg(short, long, value_name = "SETTINGS")]
    settings: Option<PathBuf>,

    /// Platform override: "mac" or "pc"
    #[arg(short, long, value_name = "PLATFORM")]
    platform: Option<String>,

    /// Register a press listener for a key name (can be used multiple times)
    #[arg(long, value_name = "KEY")]
    on_press: Vec<String>,

    /// Register a down listener for a key name (can be used multiple times)
    #[arg(long, value_name = "KEY")]
    on_down: Vec<String>,

    /// Register an up listener for a key name (can be used multiple times)
    #[arg(long, value_name = "KEY")]
    on_up: Vec<String>,

    /// Register a chord, e.g. "ctrl+shift+a" (can be used multiple times)
    #[arg(long, value_name = "CHORD")]
    chord: Vec<String>,

    /// Log every key press with its name and code
    #[arg(long)]
    log_presses: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Held-modifier flags reconstructed from the scripted transitions, the way
/// a real host would report them on each event
#[derive(Debug, Default, Clone, Copy)]
struct HeldModifiers {
    alt: bool,
    ctrl: bool,
    meta: bool,
    shift: bool,
}

impl HeldModifiers {
    fn apply(&mut self, code: u16, down: bool) {
        match code {
            16 => self.shift = down,
            17 => self.ctrl = down,
            18 => self.alt = down,
            91 | 92 | 93 => self.meta = down,
            _ => {}
        }
    }

    fn event(&self, code: u16) -> KeyEvent {
        KeyEvent::new(code).with_modifiers(self.alt, self.ctrl, self.meta, self.shift)
    }
}

fn dispatch_line(label: &str, ev: &KeyEvent) -> String {
    format!("fired: {} (code {})", label, ev.code)
}

fn announce(label: String) -> Callback {
    std::rc::Rc::new(move |ev| log::info!("{}", dispatch_line(&label, ev)))
}

fn build_engine(args: &Args) -> anyhow::Result<Engine> {
    let settings = match &args.settings {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::load_default().context("loading default settings")?,
    };

    // CLI platform flag wins over the settings file
    let mut engine = match &args.platform {
        Some(name) => {
            let platform = Platform::from_name(name)
                .with_context(|| format!("unknown platform '{}'", name))?;
            let mut engine = Engine::with_platform(platform);
            if settings.key_press_logging() {
                engine.enable_key_press_logging();
            }
            engine
        }
        None => Engine::with_settings(&settings),
    };

    if args.log_presses {
        engine.enable_key_press_logging();
    }

    for name in &args.on_press {
        engine
            .listen(EventKind::Press, None, announce(format!("press {}", name)), &[name], false, "default")
            .with_context(|| format!("registering press listener for '{}'", name))?;
    }
    for name in &args.on_down {
        engine
            .listen(EventKind::Down, None, announce(format!("down {}", name)), &[name], false, "default")
            .with_context(|| format!("registering down listener for '{}'", name))?;
    }
    for name in &args.on_up {
        engine
            .listen(EventKind::Up, None, announce(format!("up {}", name)), &[name], false, "default")
            .with_context(|| format!("registering up listener for '{}'", name))?;
    }
    for spec in &args.chord {
        let names: Vec<&str> = spec.split('+').map(str::trim).collect();
        engine
            .listen(EventKind::Chord, None, announce(format!("chord {}", spec)), &names, false, "default")
            .with_context(|| format!("registering chord '{}'", spec))?;
    }

    Ok(engine)
}

/// One scripted command. Key transitions go through the same modifier
/// bookkeeping a host event source would do.
fn run_command(
    engine: &mut Engine,
    held: &mut HeldModifiers,
    line: &str,
) -> anyhow::Result<bool> {
    let mut parts = line.split_whitespace();
    let Some(command) = parts.next() else {
        return Ok(true);
    };

    match command {
        "down" | "up" => {
            let rest: Vec<&str> = parts.collect();
            if rest.is_empty() {
                bail!("{} needs a key name", command);
            }
            let name = rest.join(" ");
            let key = engine
                .catalog()
                .key_from_name(&name)
                .with_context(|| format!("unknown key '{}'", name))?;
            // flags flip before the event is built, the way a host
            // reports modifier state on the transition itself
            held.apply(key.code(), command == "down");
            if command == "down" {
                engine.key_down(held.event(key.code()));
            } else {
                engine.key_up(held.event(key.code()));
            }
        }
        "tick" => {
            let ms: f64 = parts
                .next()
                .context("tick needs a millisecond count")?
                .parse()
                .context("tick takes a number of milliseconds")?;
            engine.tick(ms);
        }
        "blur" => {
            *held = HeldModifiers::default();
            engine.blur();
        }
        "context" => {
            let name = parts.next().context("context needs a name")?;
            engine.add_context(name)?;
            engine.set_context(name);
            println!("context: {}", engine.current_context_name());
        }
        "enable" => engine.enable(),
        "disable" => engine.disable(),
        "state" => {
            println!(
                "context={} disabled={} alt={} ctrl={} meta={} shift={}",
                engine.current_context_name(),
                engine.is_disabled(),
                engine.is_alt_down(),
                engine.is_ctrl_down(),
                engine.is_meta_down(),
                engine.is_shift_down(),
            );
        }
        "quit" | "exit" => return Ok(false),
        other => bail!("unknown command '{}'", other),
    }
    Ok(true)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .init();

    let mut engine = build_engine(&args)?;
    let mut held = HeldModifiers::default();

    println!(
        "keychord ready (platform root shortcut: {}). Commands: down/up <key>, tick <ms>, blur, context <name>, enable, disable, state, quit",
        engine.root_shortcut_key_name()
    );

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        match run_command(&mut engine, &mut held, &line) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => log::error!("{:#}", e),
        }
    }
    Ok(())
}
