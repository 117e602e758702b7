use std::path::Path;
use std::thread;
use std::time::Duration;

use tapline_capture::{
    default_device, find_all_devices, CaptureConfig, CaptureManager, PacketMeta, SessionId,
};
use tapline_cli::{Cli, Commands};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Pause between empty polls of a live session
const IDLE_SLEEP: Duration = Duration::from_millis(10);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_args();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Devices => list_devices()?,
        Commands::DefaultDevice => println!("{}", default_device()?),
        Commands::Version => println!("{}", CaptureManager::new().lib_version()),
        Commands::Live {
            interface,
            filter,
            count,
            copy_len,
            ..
        } => {
            let config = cli
                .command
                .capture_config()
                .unwrap_or_else(CaptureConfig::default);
            let device = match interface {
                Some(name) => name.clone(),
                None => default_device()?,
            };
            run_live(&device, filter, config, *count, *copy_len)?;
        }
        Commands::Offline {
            path,
            filter,
            copy_len,
        } => run_offline(path, filter, *copy_len)?,
    }

    Ok(())
}

fn list_devices() -> Result<(), Box<dyn std::error::Error>> {
    for device in find_all_devices()? {
        let loopback = if device.is_loopback { " [loopback]" } else { "" };
        println!("{}{}", device.name, loopback);
        if let Some(desc) = &device.description {
            println!("    {}", desc);
        }
        for address in &device.addresses {
            match address.netmask {
                Some(mask) => println!("    inet {} netmask {}", address.addr, mask),
                None => println!("    inet {}", address.addr),
            }
        }
    }
    Ok(())
}

fn print_packet(index: u64, meta: &PacketMeta, data: &[u8], capacity: usize) {
    let marker = if meta.truncated_by(capacity) {
        " (truncated)"
    } else {
        ""
    };
    println!(
        "#{} {}.{:06} caplen={} len={} copied={}{}",
        index,
        meta.tv_sec,
        meta.tv_usec,
        meta.caplen,
        meta.len,
        data.len(),
        marker
    );
}

fn print_delivery(manager: &CaptureManager, session: SessionId) -> tapline_capture::Result<()> {
    let delivery = manager.delivery_stats(session)?;
    println!(
        "Delivered: {} packets, {} bytes copied, {} truncated ({:.1} pkt/s)",
        delivery.packets_delivered,
        delivery.bytes_copied,
        delivery.truncated,
        delivery.packets_per_second
    );
    Ok(())
}

fn run_live(
    device: &str,
    filter: &str,
    config: CaptureConfig,
    count: u64,
    copy_len: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut manager = CaptureManager::new();
    let session = manager.open_live_with_config(device, filter, config)?;

    let link_type = manager.link_type(session)?;
    let fd = manager.fileno(session)?;
    info!(device, %link_type, ?fd, "Capturing");

    let mut buffer = vec![0u8; copy_len];
    let mut seen = 0u64;
    while count == 0 || seen < count {
        let delivered = manager.dispatch(session, &mut buffer, |meta, data| {
            print_packet(seen, meta, data, copy_len);
        })?;
        if delivered == 0 {
            thread::sleep(IDLE_SLEEP);
        }
        seen += delivered as u64;
    }

    match manager.stats(session) {
        Ok(counters) => println!("{}", counters.format()),
        Err(e) => warn!("Kernel statistics unavailable: {}", e),
    }
    print_delivery(&manager, session)?;
    manager.close(session)?;
    Ok(())
}

fn run_offline(
    path: &Path,
    filter: &str,
    copy_len: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut manager = CaptureManager::new();
    let session = manager.open_offline(path, filter)?;
    let link_type = manager.link_type(session)?;
    info!(path = %path.display(), %link_type, "Replaying");

    let mut buffer = vec![0u8; copy_len];
    let mut seen = 0u64;
    loop {
        let delivered = manager.dispatch(session, &mut buffer, |meta, data| {
            print_packet(seen, meta, data, copy_len);
        })?;
        if delivered == 0 {
            break;
        }
        seen += delivered as u64;
    }

    print_delivery(&manager, session)?;
    manager.close(session)?;
    Ok(())
}
