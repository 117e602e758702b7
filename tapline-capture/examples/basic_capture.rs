//! Example: Live capture driven by a polling loop
//!
//! Opens the default device, sleeps briefly between empty polls, and
//! prints 20 packets.
//! Note: Requires root/administrator privileges to run.
//!
//! Run with: sudo cargo run --example basic_capture

use std::thread;
use std::time::{Duration, Instant};
use tapline_capture::{default_device, CaptureManager};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let device = default_device()?;
    println!("Capturing on: {}", device);

    let mut manager = CaptureManager::new();
    let session = manager.open_live(&device, "", 10 * 1024 * 1024)?;
    println!(
        "Session {} ({}), descriptor {:?}",
        session,
        manager.link_type(session)?,
        manager.fileno(session)?
    );
    println!("Starting packet capture... (will capture 20 packets)\n");

    let mut buffer = vec![0u8; 65535];
    let mut count = 0;
    let start = Instant::now();

    while count < 20 && start.elapsed() < Duration::from_secs(10) {
        let n = manager.dispatch(session, &mut buffer, |meta, data| {
            println!(
                "[{}.{:06}] {} bytes on the wire, {} captured, {} copied",
                meta.tv_sec,
                meta.tv_usec,
                meta.len,
                meta.caplen,
                data.len()
            );
        })?;

        if n == 0 {
            thread::sleep(Duration::from_millis(10));
        }
        count += n;
    }

    println!("\n=== Final Statistics ===");
    println!("{}", manager.stats(session)?.format());

    manager.close(session)?;
    Ok(())
}
