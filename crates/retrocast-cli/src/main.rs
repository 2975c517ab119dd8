//! retrocast - command-line client for the Retrocast realtime gateway
//!
//! Connects with a bearer token, prints every dispatch event to stdout as
//! one JSON object per line and logs connection progress to stderr.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use retrocast_gateway::{ConnectionState, GatewayClient, GatewayConfig, PresenceStatus, GATEWAY_CLOSED};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "retrocast")]
#[command(about = "Retrocast realtime gateway client")]
#[command(version)]
struct Cli {
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and stream dispatch events until interrupted
    Connect {
        /// Gateway WebSocket URL
        #[arg(long, env = "RETROCAST_GATEWAY_URL")]
        url: String,

        /// Bearer token
        #[arg(long, env = "RETROCAST_TOKEN", hide_env_values = true)]
        token: String,

        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Presence to announce once the session is ready
        #[arg(long)]
        status: Option<PresenceStatus>,

        /// Only print these events (repeatable)
        #[arg(long = "event")]
        events: Vec<String>,
    },

    /// Write a config file with the default settings
    InitConfig {
        /// Path to write config
        #[arg(short, long, default_value = "retrocast.toml")]
        output: PathBuf,
    },

    /// Validate a config file and print the effective settings
    CheckConfig {
        /// Path to the config file
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    match cli.command {
        Commands::Connect {
            url,
            token,
            config,
            status,
            events,
        } => {
            run_connect(&url, &token, config, status, events).await?;
        }

        Commands::InitConfig { output } => {
            init_config(&output)?;
        }

        Commands::CheckConfig { config } => {
            check_config(&config)?;
        }
    }

    Ok(())
}

fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("retrocast_gateway=info".parse()?)
        .add_directive("retrocast=info".parse()?);
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<GatewayConfig> {
    match path {
        Some(path) => GatewayConfig::from_file(&path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(GatewayConfig::default()),
    }
}

async fn run_connect(
    url: &str,
    token: &str,
    config: Option<PathBuf>,
    status: Option<PresenceStatus>,
    events: Vec<String>,
) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let client = GatewayClient::new(config);

    let wanted: HashSet<String> = events.into_iter().collect();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    client.on_event(move |name, payload| {
        if wanted.is_empty() || wanted.contains(name) || name == GATEWAY_CLOSED {
            let _ = event_tx.send((name.to_string(), payload.clone()));
        }
    });

    let mut states = client.state_changes();
    client.connect(url, token)?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, disconnecting");
                client.disconnect();
                return Ok(());
            }
            Some((name, payload)) = event_rx.recv() => {
                if name == GATEWAY_CLOSED {
                    anyhow::bail!("gateway closed after exhausting reconnect attempts");
                }
                println!("{}", serde_json::json!({ "t": name, "d": payload }));
            }
            changed = states.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let state = *states.borrow_and_update();
                if state == ConnectionState::Connected {
                    if let Some(status) = status {
                        if let Err(e) = client.update_presence(status) {
                            warn!(error = %e, "presence update failed");
                        }
                    }
                }
            }
        }
    }
}

fn init_config(output: &Path) -> anyhow::Result<()> {
    let rendered = GatewayConfig::default().to_toml()?;
    std::fs::write(output, rendered)
        .with_context(|| format!("writing {}", output.display()))?;

    info!(path = %output.display(), "wrote default config");
    Ok(())
}

fn check_config(path: &Path) -> anyhow::Result<()> {
    let config = load_config(Some(path.to_path_buf()))?;
    print!("{}", config.to_toml()?);
    info!(path = %path.display(), "config is valid");
    Ok(())
}
