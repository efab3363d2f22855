//! Hik Rig CLI
//!
//! Lists connected cameras and captures JPEG snapshots from every camera
//! named in a rig configuration file.

use chrono::Local;
use clap::{Args, Parser, Subcommand};
use hik_rig::{
    rig::{self, CameraRig, JpegQuality, RigConfig},
    CameraError, CameraSdk, ConfigError, SdkError, ShutdownError,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "hik-rig", version, about = "Capture stills from a configured set of MVS cameras")]
struct Cli {
    /// Rig configuration file (JSON, or TOML with a .toml extension).
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List connected devices and the camera key each one matches.
    List,
    /// Open every configured camera and save one JPEG per camera.
    Capture(CaptureArgs),
}

#[derive(Debug, Args)]
struct CaptureArgs {
    /// Directory the images are written to.
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Only capture from these camera keys (repeatable). Defaults to all.
    #[arg(long = "camera", value_name = "KEY")]
    cameras: Vec<String>,

    /// JPEG quality.
    #[arg(short, long, default_value_t = 90, value_parser = clap::value_parser!(u32).range(0..=100))]
    quality: u32,

    /// Number of capture rounds.
    #[arg(long, default_value_t = 1)]
    repeat: u32,

    /// Pause between rounds in milliseconds.
    #[arg(long, default_value_t = 0)]
    interval_ms: u64,

    /// Append a local timestamp to each file name.
    #[arg(long)]
    timestamp: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sdk(#[from] SdkError),
    #[error(transparent)]
    Shutdown(#[from] ShutdownError),
    #[error("failed to install Ctrl-C handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    info!("Hik Rig v{}", hik_rig::VERSION);

    if let Err(e) = run(&cli) {
        error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(feature = "mvs")]
fn run(cli: &Cli) -> Result<(), CliError> {
    dispatch(hik_rig::MvsSdk::new(), cli)
}

#[cfg(not(feature = "mvs"))]
fn run(cli: &Cli) -> Result<(), CliError> {
    use hik_rig::{MockDevice, MockSdk};

    warn!("Built without the `mvs` feature, simulating one device per configured camera");
    let config = RigConfig::from_file(&cli.config)?;
    let sdk = MockSdk::with_devices(
        config
            .iter()
            .map(|(_, settings)| MockDevice::new(settings.serial.clone()).with_resolution(640, 480)),
    );
    dispatch(sdk, cli)
}

fn dispatch<S: CameraSdk>(sdk: S, cli: &Cli) -> Result<(), CliError> {
    match &cli.command {
        Command::List => list(&sdk, cli),
        Command::Capture(args) => capture(sdk, cli, args),
    }
}

fn list<S: CameraSdk>(sdk: &S, cli: &Cli) -> Result<(), CliError> {
    let config = match RigConfig::from_file(&cli.config) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("Not matching against config: {e}");
            None
        }
    };

    let devices = rig::enumerate(sdk)?;
    info!("Found {} device(s)", devices.len());
    println!("{:<4} {:<6} {:<20} {:<24} KEY", "#", "BUS", "SERIAL", "MODEL");
    for device in &devices {
        let key = config
            .as_ref()
            .and_then(|c| c.key_for_serial(&device.serial))
            .unwrap_or("-");
        println!(
            "{:<4} {:<6} {:<20} {:<24} {}",
            device.index, device.transport, device.serial, device.model, key
        );
    }

    if let Some(config) = &config {
        if config.len() != devices.len() {
            warn!(
                "Config lists {} camera(s) but {} device(s) are connected",
                config.len(),
                devices.len()
            );
        }
    }
    Ok(())
}

fn capture<S: CameraSdk>(sdk: S, cli: &Cli, args: &CaptureArgs) -> Result<(), CliError> {
    let quality = JpegQuality::new(args.quality)?;
    let mut rig = CameraRig::from_config_file(sdk, &cli.config)?;

    let keys: Vec<String> = if args.cameras.is_empty() {
        rig.config().keys().map(str::to_string).collect()
    } else {
        for key in &args.cameras {
            if !rig.config().contains_key(key) {
                return Err(CameraError::UnknownCamera(key.clone()).into());
            }
        }
        args.cameras.clone()
    };

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))?;
    }

    let result = capture_rounds(&mut rig, &keys, args, quality, &stop);
    // Release cameras whether or not capturing succeeded.
    let shutdown = rig.shutdown();
    result?;
    shutdown?;
    Ok(())
}

fn capture_rounds<S: CameraSdk>(
    rig: &mut CameraRig<S>,
    keys: &[String],
    args: &CaptureArgs,
    quality: JpegQuality,
    stop: &AtomicBool,
) -> Result<(), CliError> {
    rig.open_devices()?;

    for round in 0..args.repeat {
        if stop.load(Ordering::SeqCst) {
            warn!("Interrupted after {} round(s)", round);
            break;
        }
        for key in keys {
            let path = args.out_dir.join(file_name(key, args.timestamp));
            let saved = rig.save_image(key, &path, quality)?;
            println!("{}\t{}\t{} bytes", saved.key, saved.path.display(), saved.bytes);
        }
        if round + 1 < args.repeat && args.interval_ms > 0 {
            std::thread::sleep(Duration::from_millis(args.interval_ms));
        }
    }
    Ok(())
}

fn file_name(key: &str, timestamp: bool) -> String {
    if timestamp {
        format!("{key}_{}.jpg", Local::now().format("%Y%m%d-%H%M%S%.3f"))
    } else {
        format!("{key}.jpg")
    }
}
