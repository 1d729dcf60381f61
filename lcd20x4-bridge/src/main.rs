//! lcd20x4-bridge - LCD 20x4 bridge on the console
//!
//! Runs the bridge lifecycle against the simulated peripheral. Host commands
//! are read from stdin, one per line; the screen is printed after each one.
//! Button edges are relayed to the host while commands run.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

use clap::Parser;
use embassy_futures::block_on;
use embassy_futures::select::select;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use lcd20x4_bridge::{
    parse_command, render, Bridge, BridgeConfig, ConsoleCommand, ConsoleHost, DEFAULT_CONFIG,
};
use lcd20x4_core::{ControlPoint, ErrorKind, HostPlatform};
use lcd20x4_display::SimulatedLcd;

/// Lines read from stdin; `None` marks end of input
static INPUT_LINES: Channel<CriticalSectionRawMutex, Option<String>, 8> = Channel::new();

#[derive(Parser)]
#[command(name = "lcd20x4-bridge")]
#[command(about = "Expose an LCD 20x4 as automation control points")]
#[command(version)]
struct Cli {
    /// Configuration file (default: built-in bridge.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bricklet UID
    #[arg(long)]
    uid: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn load_config(cli: &Cli) -> Result<BridgeConfig, lcd20x4_bridge::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::from_toml(DEFAULT_CONFIG)?,
    };
    if let Some(uid) = &cli.uid {
        config.uid = uid.clone();
    }
    config.debug |= cli.debug;
    Ok(config)
}

fn exit_code(kind: ErrorKind) -> ExitCode {
    match kind {
        ErrorKind::Configuration => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}

fn read_stdin() {
    for line in io::stdin().lock().lines() {
        match line {
            Ok(line) => block_on(INPUT_LINES.send(Some(line))),
            Err(e) => {
                log::error!("stdin: {}", e);
                break;
            }
        }
    }
    block_on(INPUT_LINES.send(None));
}

/// Handle console lines until `quit` or end of input
async fn run_console(bridge: &Bridge<SimulatedLcd, ConsoleHost>, lcd: &SimulatedLcd) {
    while let Some(line) = INPUT_LINES.receive().await {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        match command {
            ConsoleCommand::Switch { unit, command } => {
                let _ = bridge.on_command(unit, command).await;
            }
            ConsoleCommand::Press(button) => lcd.press(button),
            ConsoleCommand::Release(button) => lcd.release(button),
            ConsoleCommand::Batch(text) => {
                bridge.host().set_text(ControlPoint::Json, &text);
                let _ = bridge.on_device_modified(ControlPoint::Json.unit()).await;
            }
            ConsoleCommand::Show => {}
            ConsoleCommand::Quit => break,
        }

        for point in ControlPoint::ALL.iter().filter(|p| p.is_switch()) {
            if let Some(on) = bridge.host().switch_state(*point) {
                log::debug!("{}: {}", point, if on { "On" } else { "Off" });
            }
        }
        println!("{}", render(&lcd.screen()));
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("lcd20x4-bridge: {}", e);
            return exit_code(ErrorKind::Configuration);
        }
    };

    let level = if config.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .init();

    let lcd = SimulatedLcd::new();
    let mut bridge = Bridge::new(config, lcd.clone(), ConsoleHost::new());
    if let Err(e) = block_on(bridge.start()) {
        return exit_code(e.kind());
    }
    println!("{}", render(&lcd.screen()));

    // The reader thread stays blocked on stdin after quit; it ends with the process
    thread::spawn(read_stdin);
    block_on(select(bridge.run_relay(), run_console(&bridge, &lcd)));

    if bridge.state().is_running() {
        if let Err(e) = block_on(bridge.stop()) {
            return exit_code(e.kind());
        }
    }
    ExitCode::SUCCESS
}
