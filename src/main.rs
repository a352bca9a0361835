use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use tokio_stream::StreamExt;
use tracing::{info, warn};

use audio_context_manager::OpenAlManager;
use audio_context_manager::config::{AuxiliarySends, Config, ContextConfig};
use audio_context_manager::logging::{LoggingConfig, initialize_logging};
use audio_context_manager::system::alc;

#[derive(Parser)]
#[command(name = "audio-context-manager")]
#[command(about = "Open, inspect and hold OpenAL playback contexts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List playback devices known to the driver
    ListDevices,
    /// Open a context, print what was negotiated, then dispose it
    Open(ContextArgs),
    /// Open a context and keep it processing until interrupted
    Hold(ContextArgs),
    /// Validate configuration file
    CheckConfig,
}

/// Overrides for the `[context]` section of the configuration file
#[derive(Args)]
struct ContextArgs {
    /// Playback device name
    #[arg(short, long)]
    device: Option<String>,

    /// Mixing frequency in Hz
    #[arg(long)]
    frequency: Option<i32>,

    /// Refresh interval in Hz
    #[arg(long)]
    refresh: Option<i32>,

    /// Request a synchronous context
    #[arg(long)]
    sync: bool,

    /// Request the EFX extension
    #[arg(long)]
    efx: bool,

    /// Auxiliary sends to request with --efx (0 = driver default)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=4))]
    aux_sends: Option<u8>,

    /// Mono source hint
    #[arg(long, allow_negative_numbers = true)]
    mono: Option<i32>,

    /// Stereo source hint
    #[arg(long, allow_negative_numbers = true)]
    stereo: Option<i32>,
}

impl ContextArgs {
    fn apply(&self, base: &ContextConfig) -> Result<ContextConfig> {
        let mut config = base.clone();
        if let Some(device) = &self.device {
            config = config.with_device(device.clone());
        }
        if let Some(frequency) = self.frequency {
            config = config.with_frequency(frequency);
        }
        if let Some(refresh) = self.refresh {
            config = config.with_refresh_rate(refresh);
        }
        if self.sync {
            config = config.synchronous(true);
        }
        if let Some(mono) = self.mono {
            config = config.with_mono_sources(mono);
        }
        if let Some(stereo) = self.stereo {
            config = config.with_stereo_sources(stereo);
        }
        if let Some(sends) = self.aux_sends {
            config.max_auxiliary_sends = AuxiliarySends::try_from(sends)
                .map_err(anyhow::Error::msg)
                .context("Invalid --aux-sends")?;
        }
        if self.efx {
            config.enable_efx = true;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;

    let logging = LoggingConfig::from_section(&config.logging, cli.verbose)?;
    let (_log_guard, log_dir) = initialize_logging(logging)?;
    if let Some(dir) = log_dir {
        info!("Writing logs to {}", dir.display());
    }

    match cli.command {
        Commands::ListDevices => list_devices()?,
        Commands::Open(args) => open_context(&args.apply(&config.context)?)?,
        Commands::Hold(args) => hold_context(&args.apply(&config.context)?).await?,
        Commands::CheckConfig => check_config(&config)?,
    }

    Ok(())
}

fn list_devices() -> Result<()> {
    let manager = OpenAlManager::global().context("Failed to load OpenAL")?;

    match manager.available_devices() {
        Ok(devices) if devices.is_empty() => println!("No playback devices found!"),
        Ok(devices) => {
            println!("Available playback devices:");
            for (i, device) in devices.iter().enumerate() {
                println!("  {}. {}", i + 1, device);
            }
        }
        Err(e) => println!("Device enumeration unavailable: {}", e),
    }

    match manager.default_device() {
        Some(name) => println!("Default device: {}", name),
        None => println!("Default device: unknown"),
    }

    Ok(())
}

fn open_context(config: &ContextConfig) -> Result<()> {
    let manager = OpenAlManager::global().context("Failed to load OpenAL")?;
    let context = manager
        .open_context(config)
        .context("Failed to open audio context")?;

    println!("Opened {}", context);
    println!("  Device:         {}", context.current_device()?);
    println!("  Attributes:     {}", context.attributes()?);
    println!("  Mono sources:   {}", context.mono_sources()?);
    println!("  Stereo sources: {}", context.stereo_sources()?);
    println!(
        "  EFX:            {}",
        context.supports_extension(alc::EXT_EFX)?
    );
    println!("  Current:        {}", context.is_current()?);

    context.check_errors()?;
    context.dispose();
    Ok(())
}

async fn hold_context(config: &ContextConfig) -> Result<()> {
    let manager = OpenAlManager::global().context("Failed to load OpenAL")?;
    let context = manager
        .open_context(config)
        .context("Failed to open audio context")?;

    context.make_current()?;
    context.process()?;

    println!("Holding {}", context);
    println!("  Press Ctrl+C to stop, send SIGHUP to suspend/resume");

    let mut signals = Signals::new([SIGTERM, SIGINT, SIGHUP])?;
    while let Some(signal) = signals.next().await {
        match signal {
            SIGTERM | SIGINT => {
                info!("Received shutdown signal ({})", signal);
                break;
            }
            SIGHUP => {
                let toggled = context.is_processing().and_then(|processing| {
                    if processing {
                        context.suspend().map(|()| "Suspended")
                    } else {
                        context.process().map(|()| "Resumed")
                    }
                });
                match toggled {
                    Ok(action) => info!("{} {}", action, context),
                    Err(e) => warn!("Could not toggle processing: {}", e),
                }
            }
            _ => {}
        }
    }

    context.dispose();
    println!("Context released");
    Ok(())
}

fn check_config(config: &Config) -> Result<()> {
    info!("Validating configuration");

    let context = &config.context;
    println!("Configuration validation:");
    println!("  ✓ Configuration file parsed successfully");
    println!("  ✓ Log level: {}", config.logging.level);
    println!(
        "  ✓ Device: {}",
        context.requested_device().unwrap_or("default")
    );
    println!("  ✓ Frequency: {}", context.frequency);
    println!("  ✓ Refresh rate: {}", context.refresh_rate);
    println!("  ✓ Synchronous: {}", context.synchronous);
    println!("  ✓ Mono sources: {}", context.mono_sources);
    println!("  ✓ Stereo sources: {}", context.stereo_sources);
    if context.enable_efx {
        println!("  ✓ EFX auxiliary sends: {}", context.max_auxiliary_sends);
    } else {
        println!("  ✓ EFX: disabled");
    }

    Ok(())
}
