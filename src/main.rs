use anyhow::Result;
use clap::Parser;
use crossbeam::channel::{select, unbounded, Receiver};
use log::{error, info, warn};
use round_panel::config::{load_color_table, SettingsStore};
use round_panel::core::RoundController;
use round_panel::serial::{PortSession, SerialPortConnector};
use round_panel::ui::{ActivityLog, App};
use round_panel_core::{ColorTable, Connector, LineSettings, DEFAULT_BAUD_RATE};
use std::io::BufRead;
use std::ops::ControlFlow;
use std::path::PathBuf;

/// round-panel - serial control panel for timed game rounds
#[derive(Parser, Debug, Clone)]
#[command(name = "round-panel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Connect to this serial port at startup
    #[arg(short = 'p', long = "port", value_name = "PORT")]
    port: Option<String>,

    /// Baud rate
    #[arg(short = 'b', long = "baud", value_name = "RATE", default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Settings file to use instead of the platform default
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// JSON file mapping color tokens to names (e.g. {"01": "Blue"})
    #[arg(long = "colors", value_name = "PATH")]
    colors: Option<PathBuf>,

    /// List available serial ports and exit
    #[arg(short = 'l', long = "list")]
    list_ports: bool,

    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0")]
    debug: u8,
}

fn main() {
    let cli = Cli::parse();

    // Level 0 (default): warn only
    // Level 1: info
    // Level 2: debug
    // Level 3+: trace
    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Allow RUST_LOG to override CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    info!("Starting round-panel v{}", env!("CARGO_PKG_VERSION"));

    if cli.list_ports {
        list_available_ports();
        return;
    }

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// List available serial ports to stdout
fn list_available_ports() {
    match SerialPortConnector.available_ports() {
        Ok(ports) if ports.is_empty() => println!("No serial ports found"),
        Ok(ports) => {
            println!("Available serial ports ({}):", ports.len());
            for port in ports {
                println!("  {}", port);
            }
        }
        Err(e) => {
            eprintln!("Error: could not enumerate serial ports: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let store = match cli.config {
        Some(path) => SettingsStore::at(path),
        None => SettingsStore::default_location()?,
    };
    let settings = store.load_or_default();
    info!("Loaded settings from {}: {}", store.path().display(), settings.summary());

    let colors = match cli.colors {
        Some(ref path) => load_color_table(path)?,
        None => ColorTable::default(),
    };

    let (event_tx, event_rx) = unbounded();
    let session = PortSession::new(SerialPortConnector, event_tx);
    let controller = RoundController::new(session, settings, colors);
    let mut app = App::new(
        controller,
        store,
        LineSettings::with_baud_rate(cli.baud),
        ActivityLog::new(true),
    );

    app.refresh_ports();
    if let Some(port) = cli.port {
        app.connect(Some(port));
    }
    println!("Type `help` for commands.");

    let input_rx = spawn_input_reader();
    loop {
        let ticker = app.ticker();
        select! {
            recv(input_rx) -> line => match line {
                Ok(line) => {
                    if let ControlFlow::Break(()) = app.handle_line(&line) {
                        break;
                    }
                }
                // stdin closed
                Err(_) => break,
            },
            recv(event_rx) -> event => {
                if let Ok(event) = event {
                    app.handle_port_event(event);
                }
            },
            recv(ticker) -> _ => app.on_tick(),
        }
    }

    app.shutdown();
    Ok(())
}

/// Forward stdin lines to the foreground loop
fn spawn_input_reader() -> Receiver<String> {
    let (tx, rx) = unbounded();
    let spawned = std::thread::Builder::new()
        .name("console-input".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to read console input: {}", e);
                        break;
                    }
                }
            }
        });
    if let Err(e) = spawned {
        error!("Failed to start console input thread: {}", e);
    }
    rx
}
