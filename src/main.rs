//! CLI Entry Point for chemion-designer
//!
//! Provides a command-line interface for:
//! - Discovering glasses through the backend
//! - Previewing frame sketches
//! - Pushing a sketch to a pair of glasses in one shot
//! - An interactive shell for drawing and pushing frames
//!
//! # Usage
//!
//! ```bash
//! chemion-designer discover
//! chemion-designer preview smile.txt
//! chemion-designer push smile.txt --device 0
//! chemion-designer --mock shell
//! ```

use anyhow::{anyhow, Context, Result};
use chemion_designer::config::{DesignerConfig, DEFAULT_CONFIG_PATH};
use chemion_designer::directory::Device;
use chemion_designer::logging;
use chemion_designer::service::{GlassesService, HttpGlassesService, MockGlassesService};
use chemion_designer::shell::{self, Outcome};
use chemion_designer::{sketch, Designer};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "chemion-designer")]
#[command(about = "Design frames for Chemion glasses and display them", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Backend base URL (overrides the configuration)
    #[arg(long, global = true)]
    server: Option<String>,

    /// Log level (overrides the configuration)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Use an in-process mock backend instead of HTTP
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List glasses visible to the backend
    Discover,

    /// Print a sketch file as the glasses would show it
    Preview {
        /// Sketch (.txt) or matrix (.json) file
        frame: PathBuf,
    },

    /// Connect to a device and display a frame on it
    Push {
        /// Sketch (.txt) or matrix (.json) file
        frame: PathBuf,

        /// Index of the device in discovery order
        #[arg(long, default_value = "0")]
        device: usize,

        /// Leave the glasses connected afterwards
        #[arg(long)]
        keep_connected: bool,
    },

    /// Interactive drawing shell
    Shell,
}

fn load_config(cli: &Cli) -> Result<DesignerConfig> {
    let mut config = DesignerConfig::load_from(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    if let Some(server) = &cli.server {
        config.service.base_url = server.clone();
    }
    if let Some(level) = &cli.log_level {
        config.application.log_level = level.clone();
    }
    config.validate().map_err(|e| anyhow!(e))?;
    Ok(config)
}

fn build_service(cli: &Cli, config: &DesignerConfig) -> Result<Arc<dyn GlassesService>> {
    if cli.mock {
        let devices = vec![
            Device::new("CHEMION_MOCK_1", "00:11:22:33:44:01"),
            Device::new("CHEMION_MOCK_2", "00:11:22:33:44:02"),
        ];
        return Ok(Arc::new(MockGlassesService::new().with_devices(devices)));
    }
    Ok(Arc::new(HttpGlassesService::new(&config.service.base_url)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    logging::init_from_config(&config).map_err(|e| anyhow!(e))?;

    let service = build_service(&cli, &config)?;
    let designer = Designer::new(service).with_brush(config.designer.default_intensity);

    match cli.command {
        Commands::Discover => discover(&designer).await,
        Commands::Preview { frame } => preview(&designer, frame).await,
        Commands::Push {
            frame,
            device,
            keep_connected,
        } => push(&designer, frame, device, keep_connected).await,
        Commands::Shell => run_shell(&designer).await,
    }
}

async fn discover(designer: &Designer) -> Result<()> {
    let devices = designer.discover().await?;
    if devices.is_empty() {
        println!("No devices found");
    }
    for (index, device) in devices.iter().enumerate() {
        println!("{:>2}: {}", index, device);
    }
    Ok(())
}

async fn preview(designer: &Designer, frame: PathBuf) -> Result<()> {
    shell::load_file(designer, &frame).await?;
    print!("{}", sketch::render(&designer.grid()));
    Ok(())
}

async fn push(designer: &Designer, frame: PathBuf, index: usize, keep_connected: bool) -> Result<()> {
    shell::load_file(designer, &frame).await?;

    println!("🔍 Discovering devices...");
    designer.discover().await?;
    let device = designer.select(index)?;

    println!("🔗 Connecting to {}...", device);
    designer.connect().await?;

    // Errors are reported once, by main's anyhow output
    let result = designer.push().await;
    if result.is_ok() {
        println!("✅ Frame displayed on {}", device.name);
    }

    if !keep_connected {
        if let Err(e) = designer.disconnect().await {
            warn!(error = %e, "Disconnect after push failed");
        }
    }
    result.map(|_| ()).map_err(Into::into)
}

async fn run_shell(designer: &Designer) -> Result<()> {
    info!("Starting shell");
    println!("chemion-designer shell, type 'help' for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = match shell::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        match shell::execute(designer, command).await {
            Ok(Outcome::Output(text)) => println!("{}", text),
            Ok(Outcome::Exit) => break,
            Err(e) => println!("error: {}", e),
        }
    }
    Ok(())
}
