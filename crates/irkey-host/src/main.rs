//! IrKey host entry point.
//!
//! Loads the config, picks a profile, opens the receiver's serial port and
//! runs the dispatch loop until Ctrl-C or the remote's `stop` button.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  ├─ load_config() + CLI overrides
//!  ├─ ProfileStore::resolve_startup_profile()
//!  ├─ tokio::spawn(ctrl_c → StopSignal::trigger)
//!  └─ spawn_blocking(run_bridge)
//!       └─ loop: connect_with_retry() → Dispatcher::run(&mut link)
//! ```
//!
//! The dispatch loop is synchronous: it blocks on the serial port with a
//! short read timeout and executes actions with real sleeps.  Running it on a
//! blocking task keeps the async runtime free for signal handling.
//!
//! # Other modes
//!
//! `--list-profiles`, `--create-default`, `--status`, `--reset-receiver` and
//! `--monitor` each do one job and exit.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use irkey_core::protocol::parse_line;
use irkey_core::{Profile, ReceiverLine};
use irkey_host::application::debounce::Debouncer;
use irkey_host::application::dispatch::{DispatchError, Dispatcher};
use irkey_host::application::execute_action::{ActionExecutor, KeyboardInjector};
use irkey_host::application::mapper::ActiveProfile;
use irkey_host::application::session::{StatusSnapshot, StopSignal};
use irkey_host::infrastructure::injection::{mock::MockInjector, platform_injector};
use irkey_host::infrastructure::serial::{
    available_ports, connect_with_retry, LinkError, ReconnectPolicy, SerialLink, SerialSettings,
};
use irkey_host::infrastructure::storage::config::{
    config_file_path, load_config_from, save_config_to, AppConfig,
};
use irkey_host::infrastructure::storage::profiles::ProfileStore;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Use an IR remote as a keyboard.
#[derive(Debug, Parser)]
#[command(
    name = "irkey",
    about = "Bridges an IR receiver on a serial port to keyboard input",
    version
)]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory).
    #[arg(long, env = "IRKEY_CONFIG")]
    config: Option<PathBuf>,

    /// Profile file to use, e.g. `Vizio_Generic_TV_Remote.json`.
    #[arg(short, long, env = "IRKEY_PROFILE")]
    profile: Option<String>,

    /// List available profiles and exit.
    #[arg(long)]
    list_profiles: bool,

    /// Write the default profile to the profile directory and exit.
    #[arg(long)]
    create_default: bool,

    /// Print every line from the receiver and whether it is mapped.
    #[arg(long)]
    monitor: bool,

    /// Ask the receiver for its status and exit.
    #[arg(long)]
    status: bool,

    /// Reset the receiver's decoder and exit.
    #[arg(long)]
    reset_receiver: bool,

    /// Serial port of the receiver (e.g. COM5, /dev/ttyUSB0).
    #[arg(long, env = "IRKEY_PORT")]
    port: Option<String>,

    #[arg(long, env = "IRKEY_BAUD_RATE")]
    baud_rate: Option<u32>,

    /// Ghost key name, e.g. `f10`.
    #[arg(long)]
    ghost_key: Option<String>,

    /// Tap the ghost key after every action.
    #[arg(long)]
    enable_ghost: bool,

    /// Start in single-tap mode.
    #[arg(long)]
    enable_tap: bool,

    /// Log key events instead of injecting them.
    #[arg(long)]
    dry_run: bool,

    /// Debug logging.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(port) = &self.port {
            config.serial.port = port.clone();
        }
        if let Some(baud) = self.baud_rate {
            config.serial.baud_rate = baud;
        }
        if let Some(key) = &self.ghost_key {
            config.ghost.key = key.clone();
        }
        if self.enable_ghost {
            config.ghost.enabled = true;
        }
        if self.enable_tap {
            config.dispatch.single_tap = true;
        }
    }

    fn log_level<'a>(&self, config: &'a AppConfig) -> &'a str {
        if self.verbose {
            "debug"
        } else {
            &config.log_level
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config_file_path().context("cannot locate config directory")?,
    };
    let mut config = load_config_from(&config_path)
        .with_context(|| format!("cannot load {}", config_path.display()))?;
    cli.apply_overrides(&mut config);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level(&config))),
        )
        .init();

    let store = ProfileStore::new(config.profiles_dir()?);

    if cli.list_profiles {
        return list_profiles(&store);
    }
    if cli.create_default {
        let name = store.save(&Profile::default_vizio())?;
        println!("{}", store.dir().join(name).display());
        return Ok(());
    }
    if cli.status || cli.reset_receiver {
        let settings = config.serial_settings();
        return tokio::task::spawn_blocking(move || receiver_command(&settings, cli.reset_receiver))
            .await?;
    }

    let (profile_name, profile) = store
        .resolve_startup_profile(cli.profile.as_deref(), config.profiles.last_used.as_deref())
        .context("no usable profile; dispatch cannot start")?;
    info!(profile = %profile.name, file = %profile_name, mappings = profile.len(), "profile loaded");
    let active = ActiveProfile::new(profile);

    let stop = StopSignal::new();
    spawn_ctrl_c_handler(stop.clone());

    if cli.monitor {
        let settings = config.serial_settings();
        let policy = config.reconnect_policy();
        return tokio::task::spawn_blocking(move || monitor(&settings, &policy, &active, &stop))
            .await?;
    }

    remember_last_used(&mut config, &config_path, &profile_name);

    let injector: Arc<dyn KeyboardInjector> = if cli.dry_run {
        info!("dry run: key events are logged, not injected");
        Arc::new(MockInjector::dry_run())
    } else {
        platform_injector().context("keyboard injection unavailable")?
    };
    let dispatcher = Dispatcher::new(
        Debouncer::new(config.debounce_config()),
        active,
        ActionExecutor::new(injector, stop.clone()),
        config.session().context("invalid ghost key setting")?,
        stop.clone(),
    );
    log_status("starting", &dispatcher.status());

    let settings = config.serial_settings();
    let policy = config.reconnect_policy();
    let dispatcher =
        tokio::task::spawn_blocking(move || run_bridge(dispatcher, &settings, &policy, &stop))
            .await??;

    log_status("stopped", &dispatcher.status());
    Ok(())
}

fn spawn_ctrl_c_handler(stop: StopSignal) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, stopping");
                stop.trigger();
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });
}

fn log_status(phase: &str, status: &StatusSnapshot) {
    info!(
        running = status.running,
        connected = status.connected,
        profile = %status.profile,
        ghost_key = status.ghost_key_enabled,
        single_tap = status.single_tap_enabled,
        "bridge {phase}"
    );
}

fn remember_last_used(config: &mut AppConfig, path: &std::path::Path, profile_name: &str) {
    if config.profiles.last_used.as_deref() == Some(profile_name) {
        return;
    }
    config.profiles.last_used = Some(profile_name.to_string());
    if let Err(err) = save_config_to(path, config) {
        warn!("could not remember last used profile: {err}");
    }
}

// ── Modes ─────────────────────────────────────────────────────────────────────

/// Connects, dispatches until the link drops, and reconnects until stopped.
fn run_bridge(
    mut dispatcher: Dispatcher,
    settings: &SerialSettings,
    policy: &ReconnectPolicy,
    stop: &StopSignal,
) -> anyhow::Result<Dispatcher> {
    loop {
        let mut link = match connect_with_retry(policy, stop, || SerialLink::open(settings)) {
            Ok(link) => link,
            Err(LinkError::Cancelled) => return Ok(dispatcher),
            Err(err) => {
                let ports = available_ports();
                if !ports.is_empty() {
                    info!("available ports: {}", ports.join(", "));
                }
                return Err(err).with_context(|| format!("cannot connect to {}", settings.port));
            }
        };

        info!("listening for IR codes on {}", settings.port);
        match dispatcher.run(&mut link) {
            Ok(()) if stop.is_triggered() => return Ok(dispatcher),
            Ok(()) => warn!("receiver closed the connection, reconnecting"),
            Err(DispatchError::Connection(err)) => warn!("{err}, reconnecting"),
        }
    }
}

fn monitor(
    settings: &SerialSettings,
    policy: &ReconnectPolicy,
    profile: &ActiveProfile,
    stop: &StopSignal,
) -> anyhow::Result<()> {
    let mut link = match connect_with_retry(policy, stop, || SerialLink::open(settings)) {
        Ok(link) => link,
        Err(LinkError::Cancelled) => return Ok(()),
        Err(err) => return Err(err).context("cannot open receiver port"),
    };
    println!("monitoring {} (Ctrl+C to stop)", settings.port);

    while !stop.is_triggered() {
        let line = match link.next_line() {
            Ok(Some(line)) => line,
            Ok(None) => continue,
            Err(LinkError::Closed) => break,
            Err(err) => return Err(err).context("receiver connection lost"),
        };
        match parse_line(&line) {
            Some(ReceiverLine::Code(code)) => match profile.lookup(&code) {
                Some(mapping) => {
                    println!("{line:<12} {code:<8} {} ({})", mapping.action, mapping.description)
                }
                None => println!("{line:<12} {code:<8} UNMAPPED"),
            },
            _ if line.is_empty() => {}
            _ => println!("{line:<12} (not a code)"),
        }
    }
    Ok(())
}

fn receiver_command(settings: &SerialSettings, reset: bool) -> anyhow::Result<()> {
    let mut link = SerialLink::open(settings)?;
    if reset {
        link.reset_receiver().context("receiver did not acknowledge reset")?;
        println!("receiver reset");
        return Ok(());
    }
    let status = link.query_status().context("receiver did not answer status query")?;
    match status.last_code {
        Some(code) => println!("last code: {code}"),
        None => println!("last code: none"),
    }
    println!("status: {}", status.text);
    Ok(())
}

fn list_profiles(store: &ProfileStore) -> anyhow::Result<()> {
    let names = store.list()?;
    if names.is_empty() {
        println!("no profiles in {} (try --create-default)", store.dir().display());
        return Ok(());
    }
    for name in names {
        match store.load(&name) {
            Ok(profile) => println!("{name:<40} {} ({} mappings)", profile.name, profile.len()),
            Err(err) => println!("{name:<40} INVALID: {err}"),
        }
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_leave_config_untouched() {
        // Arrange
        let cli = Cli::parse_from(["irkey"]);
        let mut config = AppConfig::default();

        // Act
        cli.apply_overrides(&mut config);

        // Assert
        assert_eq!(config, AppConfig::default());
        assert_eq!(cli.log_level(&config), "info");
    }

    #[test]
    fn test_cli_overrides_serial_and_session_settings() {
        // Arrange
        let cli = Cli::parse_from([
            "irkey",
            "--port",
            "COM7",
            "--baud-rate",
            "115200",
            "--ghost-key",
            "f9",
            "--enable-ghost",
            "--enable-tap",
            "--verbose",
        ]);
        let mut config = AppConfig::default();

        // Act
        cli.apply_overrides(&mut config);

        // Assert
        assert_eq!(config.serial.port, "COM7");
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.ghost.key, "f9");
        assert!(config.ghost.enabled);
        assert!(config.dispatch.single_tap);
        assert_eq!(cli.log_level(&config), "debug");
    }

    #[test]
    fn test_cli_parses_profile_and_modes() {
        let cli = Cli::parse_from(["irkey", "-p", "LG_Magic.json", "--monitor", "--dry-run"]);

        assert_eq!(cli.profile.as_deref(), Some("LG_Magic.json"));
        assert!(cli.monitor);
        assert!(cli.dry_run);
        assert!(!cli.list_profiles);
    }
}
