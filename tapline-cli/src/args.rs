//! CLI argument parsing

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tapline_capture::{CaptureConfig, DEFAULT_SNAPLEN, DEFAULT_TIMEOUT_MS};

#[derive(Parser, Debug)]
#[command(name = "tapline")]
#[command(version, about = "Non-blocking packet capture sessions", long_about = None)]
pub struct Cli {
    /// Verbose output (-v, -vv, -vvv for increasing verbosity)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List capture devices and their IPv4 addresses
    Devices,

    /// Print the device a live capture would use by default
    DefaultDevice,

    /// Print the capture library version
    Version,

    /// Capture from a network interface
    Live {
        /// Interface name (defaults to the first non-loopback device with an IPv4 address)
        #[arg(short, long)]
        interface: Option<String>,

        /// BPF filter expression
        #[arg(short, long, default_value = "")]
        filter: String,

        /// Kernel capture buffer size in bytes
        #[arg(short, long, default_value = "10485760")]
        buffer_size: i32,

        /// Snapshot length
        #[arg(short, long, default_value_t = DEFAULT_SNAPLEN)]
        snaplen: i32,

        /// Read timeout in milliseconds
        #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_MS)]
        timeout: i32,

        /// Leave promiscuous mode off
        #[arg(long)]
        no_promisc: bool,

        /// Request immediate mode at activation
        #[arg(long)]
        immediate: bool,

        /// Stop after this many packets (0 = run until interrupted)
        #[arg(short = 'c', long, default_value = "0")]
        count: u64,

        /// Size of the buffer packets are copied into
        #[arg(long, default_value = "65535")]
        copy_len: usize,
    },

    /// Replay a capture file
    Offline {
        /// Path to a pcap save file
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// BPF filter expression
        #[arg(short, long, default_value = "")]
        filter: String,

        /// Size of the buffer packets are copied into
        #[arg(long, default_value = "65535")]
        copy_len: usize,
    },
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log filter directive matching the verbosity count
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

impl Commands {
    /// Live capture configuration built from the flags
    pub fn capture_config(&self) -> Option<CaptureConfig> {
        match self {
            Commands::Live {
                buffer_size,
                snaplen,
                timeout,
                no_promisc,
                immediate,
                ..
            } => Some(CaptureConfig {
                snaplen: *snaplen,
                promiscuous: !no_promisc,
                buffer_size: *buffer_size,
                timeout_ms: *timeout,
                immediate_mode: *immediate,
            }),
            _ => None,
        }
    }
}
