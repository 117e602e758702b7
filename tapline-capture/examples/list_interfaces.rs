//! Example: List capture devices
//!
//! Run with: cargo run --example list_interfaces

use tapline_capture::{default_device, find_all_devices};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Capture Devices ===\n");

    let devices = find_all_devices()?;

    for dev in &devices {
        println!("Device: {}", dev.name);
        if let Some(ref description) = dev.description {
            println!("  Description: {}", description);
        }

        println!("  IPv4 Addresses:");
        for address in &dev.addresses {
            print!("    - {}", address.addr);
            if let Some(netmask) = address.netmask {
                print!(" netmask {}", netmask);
            }
            if let Some(broadaddr) = address.broadaddr {
                print!(" broadcast {}", broadaddr);
            }
            if let Some(dstaddr) = address.dstaddr {
                print!(" peer {}", dstaddr);
            }
            println!();
        }

        println!("  Loopback: {}", dev.is_loopback);
        println!();
    }

    println!("=== Default Device ===\n");

    match default_device() {
        Ok(name) => println!("Default: {}", name),
        Err(e) => println!("No default device found: {}", e),
    }

    Ok(())
}
