//! Example: Replay a save file through a filter
//!
//! Run with: cargo run --example offline_replay -- trace.pcap "tcp port 80"

use std::env;
use tapline_capture::CaptureManager;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let path = args.next().ok_or("usage: offline_replay <file> [filter]")?;
    let filter = args.next().unwrap_or_default();

    let mut manager = CaptureManager::new();
    let session = manager.open_offline(&path, &filter)?;
    println!("{}: {}", path, manager.link_type(session)?);

    // Small on purpose: long frames show up as truncated.
    let mut buffer = vec![0u8; 128];
    let mut index = 0;
    while manager.dispatch(session, &mut buffer, |meta, data| {
        index += 1;
        let marker = if meta.truncated_by(data.len()) { " [truncated]" } else { "" };
        println!("#{} len={} caplen={}{}", index, meta.len, meta.caplen, marker);
    })? > 0
    {}

    let delivery = manager.delivery_stats(session)?;
    println!(
        "{} packets, {} truncated",
        delivery.packets_delivered, delivery.truncated
    );
    Ok(())
}
