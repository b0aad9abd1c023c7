mod logging;
mod signals;

use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use zpttlink_core::config::DEFAULT_CONFIG_FILE;
use zpttlink_core::{
    load_or_default, ports, AppConfig, ConfigSource, DryRunInjector, Hotkey, KeyInjector,
    ListenerConfig, PttError, PttListener, RdevInjector, SerialSettings, StopReason, DEFAULT_BAUD,
};

#[derive(Parser)]
#[command(
    name = "zpttlink",
    about = "ZPTTLink: hold a hotkey while the serial PTT line is asserted"
)]
struct Cli {
    /// Path to config JSON
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Hotkey to send (e.g. F8, F9, ENTER or a single letter)
    #[arg(long)]
    key: Option<String>,

    /// Serial port (overrides config and autodetect)
    #[arg(long)]
    serial: Option<String>,

    /// Serial baud rate
    #[arg(long, default_value_t = DEFAULT_BAUD)]
    baud: u32,

    /// List serial ports and exit
    #[arg(long)]
    list_serial: bool,

    /// Log PTT events but do not press keys
    #[arg(long)]
    dry_run: bool,

    /// Logging level (DEBUG, INFO, WARNING, ERROR)
    #[arg(long)]
    log_level: Option<String>,

    /// Modem line sampling period in milliseconds
    #[arg(long, default_value_t = 5)]
    tick_ms: u64,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("{}", e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<(), PttError> {
    let (config, config_source) = load_or_default(&cli.config);

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    logging::init(&level, Path::new(&config.logging.file));

    match config_source {
        ConfigSource::File => {}
        ConfigSource::Created => {
            tracing::info!("Created default configuration at {}", cli.config.display())
        }
        ConfigSource::Fallback(e) => {
            tracing::error!("Failed to read '{}': {}", cli.config.display(), e);
            tracing::error!("Using internal defaults.");
        }
    }

    tracing::info!("Starting ZPTTLink core...");
    wayland_warning_if_needed();

    if cli.list_serial {
        print_serial_ports();
        return Ok(());
    }

    let hotkey = resolve_hotkey(cli.key.as_deref(), &config);
    let port = resolve_port(cli.serial.as_deref(), &config)?;

    let settings = SerialSettings::new(port.clone(), cli.baud);
    let listener_config = ListenerConfig {
        debounce: config.debounce_config(),
        tick: Duration::from_millis(cli.tick_ms),
        hotkey,
        ..ListenerConfig::default()
    };

    let injector: Box<dyn KeyInjector> = if cli.dry_run {
        Box::new(DryRunInjector)
    } else {
        Box::new(RdevInjector::new())
    };

    let listener = PttListener::open(&settings, listener_config, injector)?;
    tracing::info!(
        "PTT system ready (listening on {}, hotkey={}, dry_run={})",
        port,
        hotkey,
        cli.dry_run
    );

    let handle = listener.start();
    tracing::info!("ZPTTLink is running! (Ctrl+C to exit)");

    tokio::select! {
        _ = signals::shutdown_signal() => {
            tracing::info!("Shutting down...");
        }
        _ = handle.wait_stopped() => {
            tracing::warn!("Listener ended on its own");
        }
    }

    let report = handle.stop().await;
    tracing::info!("ZPTTLink stopped. Goodbye.");

    match report.reason {
        StopReason::Requested => Ok(()),
        StopReason::Fatal(msg) => Err(PttError::Fatal(msg)),
    }
}

fn resolve_hotkey(cli_key: Option<&str>, config: &AppConfig) -> Hotkey {
    let name = cli_key.unwrap_or(&config.ptt_hotkey);
    let (hotkey, fell_back) = Hotkey::parse_or_default(name);
    if fell_back {
        tracing::warn!("Unrecognised hotkey '{}', using {}", name, hotkey);
    }
    tracing::info!("Hotkey set to: {}", hotkey);
    hotkey
}

/// `--serial`, then `com_port` from the config, then autodetect.
fn resolve_port(cli_port: Option<&str>, config: &AppConfig) -> Result<String, PttError> {
    if let Some(port) = cli_port.filter(|p| !p.is_empty()) {
        return Ok(port.to_string());
    }
    if !config.com_port.is_empty() {
        return Ok(config.com_port.clone());
    }

    match ports::autodetect(&config.serial_autodetect_hints) {
        Some(port) => {
            tracing::info!("Auto-detected serial port: {}", port);
            Ok(port)
        }
        None => {
            tracing::error!("Use --serial or set 'com_port' in config.json.");
            Err(PttError::NoPort)
        }
    }
}

fn print_serial_ports() {
    let found = ports::list_ports();
    if found.is_empty() {
        println!("No serial ports found.");
        return;
    }
    for port in found {
        println!("{:20}  {}  [{}]", port.device, port.description, port.hwid);
    }
}

fn wayland_warning_if_needed() {
    let wayland = std::env::var("XDG_SESSION_TYPE")
        .map(|v| v.eq_ignore_ascii_case("wayland"))
        .unwrap_or(false);
    if cfg!(target_os = "linux") && wayland {
        tracing::warn!(
            "Wayland session detected. Global key injection may be blocked. \
             If PTT doesn't work, try an X11 session."
        );
    }
}
