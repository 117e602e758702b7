//! Packet capture session manager for tapline
//!
//! This crate bridges libpcap's poll-style capture to event-driven callers.
//! Sessions are opened on a live interface or a save file, each gets a BPF
//! filter and a stable integer handle, and packets are handed over one per
//! [`CaptureManager::dispatch`] call.
//!
//! ## Features
//!
//! - **Live and offline sessions**: interfaces and save files behind one handle type
//! - **Non-blocking dispatch**: at most one packet per call, copied into a caller buffer
//! - **Event loop friendly**: [`CaptureManager::fileno`] exposes the pollable descriptor
//! - **Diagnostics**: link type, kernel counters, per-session delivery statistics
//! - **Device enumeration**: IPv4 addresses and a default device guess
//!
//! ## Example
//!
//! ```no_run
//! use tapline_capture::CaptureManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut manager = CaptureManager::new();
//! let session = manager.open_offline("trace.pcap", "tcp")?;
//!
//! let mut buffer = vec![0u8; 65535];
//! while manager.dispatch(session, &mut buffer, |meta, data| {
//!     println!("{} bytes on the wire, {} copied", meta.len, data.len());
//! })? > 0 {}
//!
//! manager.close(session)?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod capture;
pub mod dispatch;
pub mod filters;
pub mod interface;
pub mod pcap_backend;
pub mod registry;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types
pub use backend::{CaptureBackend, CaptureSource, Frame};
pub use capture::{CaptureConfig, CaptureManager, DEFAULT_SNAPLEN, DEFAULT_TIMEOUT_MS};
pub use filters::FilterProgram;
pub use interface::{default_device, find_all_devices, DeviceAddress, DeviceInfo};
pub use pcap_backend::{PcapBackend, PcapSource};
pub use registry::{SessionInfo, SessionSource};
pub use stats::{CaptureCounters, DeliveryStats};
pub use tapline_core::{
    CaptureMode, Error, LinkType, NetMask, PacketMeta, Result, SessionId, SessionState,
};
