//! LW2 CLI - monitor and control LW2 matrix switchers from the command line

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use lw2_client::{Lw2Client, Lw2ClientBuilder};
use lw2_core::{ConnectionStatus, DeviceConfig, DeviceEvent, DeviceState};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{timeout, Instant};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

use config::{FileConfig, Overrides};

/// How long to wait for the socket and for discovery to finish
const SESSION_TIMEOUT: Duration = Duration::from_secs(10);

/// How long the device must stay quiet before a dump is printed
const QUIET_PERIOD: Duration = Duration::from_millis(500);

const CONFIRM_TIMEOUT: Duration = Duration::from_secs(3);

/// LW2 - control a legacy matrix switcher over TCP
#[derive(Parser)]
#[command(name = "lw2")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Device IP address
    #[arg(short = 'H', long, global = true, env = "LW2_HOST")]
    host: Option<String>,

    /// Device TCP port
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Number of inputs on the device
    #[arg(short, long, global = true)]
    inputs: Option<u32>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every change the device reports until Ctrl+C
    Monitor,

    /// Route an input to an output
    Route {
        /// Input number
        input: u32,

        /// Output number
        output: u32,
    },

    /// Load or save a preset
    Preset {
        #[command(subcommand)]
        action: PresetAction,
    },

    /// Print inputs, outputs, crosspoints and presets
    Dump {
        /// Print the state as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PresetAction {
    /// Recall a stored preset
    Load { preset: u32 },

    /// Store the current crosspoints as a preset
    Save { preset: u32 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(&cli.log_level, cli.json_logs)?;

    // Handle Ctrl+C
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            let _ = shutdown_tx.send(()).await;
        }
    });

    let file = cli.config.as_deref().map(FileConfig::load).transpose()?;
    let config = config::resolve(
        file,
        Overrides {
            host: cli.host,
            port: cli.port,
            inputs: cli.inputs,
        },
    );
    if !config.is_configured() {
        bail!("No device host configured; pass --host or --config");
    }

    let (client, mut events) = open_session(config).await?;

    let result = match cli.command {
        Commands::Monitor => monitor(&client, &mut events, &mut shutdown_rx).await,
        Commands::Route { input, output } => route(&client, &mut events, input, output).await,
        Commands::Preset { action } => preset(&client, action).await,
        Commands::Dump { json } => dump(&client, &mut events, json, &mut shutdown_rx).await,
    };

    client.close().await;
    result
}

fn setup_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Failed to parse log level")?;

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).compact())
            .init();
    }

    Ok(())
}

/// Connect and wait for the socket to come up
async fn open_session(
    config: DeviceConfig,
) -> Result<(Lw2Client, broadcast::Receiver<DeviceEvent>)> {
    println!(
        "{} Connecting to {}:{}",
        "LW2".cyan().bold(),
        config.host,
        config.port
    );

    let client = Lw2ClientBuilder::from_config(config)
        .build()
        .context("Invalid device configuration")?;
    let mut events = client.subscribe();
    client.connect().await.context("Failed to connect")?;

    timeout(SESSION_TIMEOUT, async {
        loop {
            match events.recv().await {
                Ok(DeviceEvent::StatusChanged { status }) => match status {
                    ConnectionStatus::Ok => return Ok::<(), anyhow::Error>(()),
                    ConnectionStatus::Error(e) => return Err(anyhow!("Connection failed: {}", e)),
                    _ => {}
                },
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => bail!("Client shut down"),
            }
        }
    })
    .await
    .context("Timed out waiting for the device")??;

    Ok((client, events))
}

async fn monitor(
    client: &Lw2Client,
    events: &mut broadcast::Receiver<DeviceEvent>,
    shutdown_rx: &mut mpsc::Receiver<()>,
) -> Result<()> {
    println!(
        "{} Monitoring {} (Ctrl+C to stop)",
        "LW2".cyan().bold(),
        client.config().host.yellow()
    );

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,

            event = events.recv() => match event {
                Ok(event) => {
                    print_event(&event);
                    if let DeviceEvent::StatusChanged { status: ConnectionStatus::Error(e) } = event {
                        bail!("Connection lost: {}", e);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => warn!("Skipped {} events", n),
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    Ok(())
}

async fn route(
    client: &Lw2Client,
    events: &mut broadcast::Receiver<DeviceEvent>,
    input: u32,
    output: u32,
) -> Result<()> {
    client.route(input, output).await;

    let confirmed = wait_for_event(events, CONFIRM_TIMEOUT, |event| {
        matches!(event, DeviceEvent::CrosspointChanged { output: o, input: i } if *o == output && *i == input)
    })
    .await;

    if confirmed {
        let (input_name, output_name) =
            client.with_state(|s| (s.input_name(input), s.output_name(output)));
        println!(
            "{} {} <- {}",
            "Routed".green().bold(),
            output_name.yellow(),
            input_name.yellow()
        );
    } else {
        println!(
            "{} Sent {{{}@{}}} but the device did not confirm it",
            "Warning".yellow().bold(),
            input,
            output
        );
    }
    Ok(())
}

async fn preset(client: &Lw2Client, action: PresetAction) -> Result<()> {
    match action {
        PresetAction::Load { preset } => {
            client.load_preset(preset).await;
            println!("{} preset {}", "Loaded".green().bold(), preset);
        }
        PresetAction::Save { preset } => {
            client.save_preset(preset).await;
            println!("{} preset {}", "Saved".green().bold(), preset);
        }
    }
    Ok(())
}

async fn dump(
    client: &Lw2Client,
    events: &mut broadcast::Receiver<DeviceEvent>,
    json: bool,
    shutdown_rx: &mut mpsc::Receiver<()>,
) -> Result<()> {
    // Names trickle in after discovery; wait until the device goes quiet.
    let deadline = Instant::now() + SESSION_TIMEOUT;
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => return Ok(()),

            event = timeout(QUIET_PERIOD, events.recv()) => match event {
                Err(_) if !client.is_discovering() => break,
                Ok(Err(broadcast::error::RecvError::Closed)) => break,
                Ok(Ok(DeviceEvent::StatusChanged { status: ConnectionStatus::Error(e) })) => {
                    bail!("Connection lost: {}", e);
                }
                _ => {}
            }
        }
        if Instant::now() >= deadline {
            warn!("Device still busy, printing what has arrived so far");
            break;
        }
    }

    let state = client.state();
    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        print_state(&state);
    }
    Ok(())
}

/// Wait up to `max_wait` for an event matching `pred`
async fn wait_for_event<F>(
    events: &mut broadcast::Receiver<DeviceEvent>,
    max_wait: Duration,
    pred: F,
) -> bool
where
    F: Fn(&DeviceEvent) -> bool,
{
    timeout(max_wait, async {
        loop {
            match events.recv().await {
                Ok(event) if pred(&event) => return true,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return false,
            }
        }
    })
    .await
    .unwrap_or(false)
}

fn print_event(event: &DeviceEvent) {
    let tag = "LW2".cyan().bold();
    match event {
        DeviceEvent::TopologyChanged { inputs, outputs } => {
            println!("{} topology: {} inputs, {} outputs", tag, inputs, outputs)
        }
        DeviceEvent::InputNameChanged { index, name } => {
            println!("{} input {} = {}", tag, index, name.yellow())
        }
        DeviceEvent::OutputNameChanged { index, name } => {
            println!("{} output {} = {}", tag, index, name.yellow())
        }
        DeviceEvent::PresetNameChanged { index, name } => {
            println!("{} preset {} = {}", tag, index, name.yellow())
        }
        DeviceEvent::CrosspointChanged { output, input } => println!(
            "{} output {} <- input {}",
            tag,
            output.to_string().green(),
            input.to_string().green()
        ),
        DeviceEvent::PresetsDiscovered { count } => println!("{} {} presets", tag, count),
        DeviceEvent::Identity { banner } => println!("{} device: {}", tag, banner.bold()),
        DeviceEvent::StatusChanged { status } => match status {
            ConnectionStatus::Error(_) => println!("{} status: {}", tag, status.to_string().red()),
            _ => println!("{} status: {}", tag, status.to_string().green()),
        },
    }
}

fn print_state(state: &DeviceState) {
    if let Some(identity) = state.identity() {
        println!("{} {}", "Device".bold(), identity);
    }

    println!("{}", "Inputs".cyan().bold());
    for input in state.inputs() {
        println!("  {:>3}  {}", input.index, input.name);
    }

    println!("{}", "Outputs".cyan().bold());
    for output in state.outputs() {
        let source = match state.crosspoints().get(output.index) {
            Some(input) => state.input_name(input).green(),
            None => "(none)".dimmed(),
        };
        println!("  {:>3}  {} <- {}", output.index, output.name, source);
    }

    println!("{}", "Presets".cyan().bold());
    if state.presets().is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for preset in state.presets() {
        println!("  {}", preset.label());
    }
}
