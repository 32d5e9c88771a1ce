//! DishaIO daemon
//!
//! Brings the configured sensor to streaming, then polls it at a fixed rate
//! and publishes transformed outputs over UDP.
//!
//! - **UDP**: one datagram per output to each configured target
//! - **TCP (admin address)**: reset-filter requests
//!
//! Initialization failures are fatal: the daemon exits before polling.

use disha_io::acquisition::AcquisitionLoop;
use disha_io::config::Config;
use disha_io::core::admin::admin_channel;
use disha_io::devices::create_device;
use disha_io::error::{Error, Result};
use disha_io::lifecycle::DeviceSession;
use disha_io::streaming::{AdminServer, Serializer, UdpPublisher};
use std::env;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Command line options
struct Args {
    config_path: Option<String>,
    ticks: Option<u64>,
}

/// Parse command line arguments.
///
/// Supports:
/// - `disha-io <path>` (positional)
/// - `disha-io --config <path>` / `disha-io -c <path>`
/// - `--ticks <n>`: stop after n ticks
///
/// Without a config path every setting takes its default.
fn parse_args() -> Result<Args> {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args {
        config_path: None,
        ticks: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" if i + 1 < args.len() => {
                parsed.config_path = Some(args[i + 1].clone());
                i += 1;
            }
            "--ticks" if i + 1 < args.len() => {
                let n = args[i + 1]
                    .parse()
                    .map_err(|e| Error::Config(format!("Invalid --ticks value: {}", e)))?;
                parsed.ticks = Some(n);
                i += 1;
            }
            arg if !arg.starts_with('-') && parsed.config_path.is_none() => {
                parsed.config_path = Some(arg.to_string());
            }
            arg => log::warn!("Ignoring argument: {}", arg),
        }
        i += 1;
    }

    Ok(parsed)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("DishaIO v{} starting...", env!("CARGO_PKG_VERSION"));

    let args = parse_args()?;
    let config = match &args.config_path {
        Some(path) => {
            log::info!("Using config: {}", path);
            Config::load(Path::new(path))?
        }
        None => {
            log::info!("No config given, using defaults");
            Config::default()
        }
    };

    log::info!(
        "Device: {} on {} @ {} baud",
        config.device.device_type,
        config.device.port,
        config.device.baud_rate
    );

    // Transports and signal handler are set up before the device is armed
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    log::info!("Wire format: {:?}", config.streaming.wire_format);
    let publisher = UdpPublisher::from_config(&config.streaming)?;

    let (admin_tx, admin_rx) = admin_channel();
    let _admin_server = match &config.streaming.admin_address {
        Some(address) => Some(AdminServer::start(
            address,
            Serializer::new(config.streaming.wire_format),
            admin_tx,
        )?),
        None => {
            log::info!("Admin endpoint disabled");
            None
        }
    };

    // Device bring-up
    let device = create_device(&config.device)?;
    let mut session = DeviceSession::from_config(device, &config.device);
    session.open(&config.device.port, config.device.baud_rate)?;
    session.initialize()?;
    log::info!("Initialization completed.");

    let mut acquisition = AcquisitionLoop::new(session, publisher, &config).with_admin(admin_rx);

    log::info!("DishaIO running. Press Ctrl-C to stop.");
    let stats = acquisition.run_until(&running, args.ticks)?;

    log::info!(
        "Shutdown complete: {} ticks, {} published, {} poll failures",
        stats.ticks,
        stats.published,
        stats.poll_failures
    );
    Ok(())
}
