//! Capture library seam
//!
//! [`CaptureBackend`] opens capture contexts and [`CaptureSource`] drives one
//! of them. The session manager only talks to these traits, so the pcap
//! binding in [`crate::pcap_backend`] can be swapped for a scripted source in
//! tests.

use std::path::Path;

use tapline_core::{NetMask, PacketMeta, Result};

use crate::capture::CaptureConfig;
use crate::filters::FilterProgram;
use crate::stats::CaptureCounters;

/// One packet borrowed from the capture library's own buffer
///
/// Valid until the next poll on the same source.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub meta: PacketMeta,
    pub data: &'a [u8],
}

/// Opens capture contexts
pub trait CaptureBackend {
    /// Capture context produced by this backend
    type Source: CaptureSource;

    /// Network address and mask of a live device
    fn lookup_net(&self, device: &str) -> Result<NetMask>;

    /// Create, configure and activate a live capture context
    ///
    /// Fails with `DeviceOpen` when the context cannot be created and with
    /// `Activation` when activation is refused.
    fn activate_live(&self, device: &str, config: &CaptureConfig) -> Result<Self::Source>;

    /// Open a save file; fails with `FileOpen`
    fn open_offline(&self, path: &Path) -> Result<Self::Source>;

    /// Switch a context to non-blocking reads; fails with `NonBlockingMode`
    fn set_nonblocking(&self, source: Self::Source) -> Result<Self::Source>;

    /// Human-readable name and version of the capture library
    fn version(&self) -> String;
}

/// One activated capture context
pub trait CaptureSource {
    /// Compile a filter expression against this context's link layer
    fn compile_filter(&self, expression: &str, netmask: NetMask) -> Result<FilterProgram>;

    /// Attach a compiled filter, replacing any previous one
    fn install_filter(&mut self, program: &FilterProgram) -> Result<()>;

    /// Poll once for at most one packet
    ///
    /// `Ok(None)` means nothing is ready right now (or a save file is
    /// exhausted). Errors are read failures and map to `Dispatch`.
    fn next_frame(&mut self) -> Result<Option<Frame<'_>>>;

    /// Raw data-link value
    fn datalink(&self) -> i32;

    /// Kernel packet counters
    fn stats(&mut self) -> Result<CaptureCounters>;

    /// Descriptor an event loop can wait on for readability
    fn selectable_fd(&self) -> Option<i32>;

    /// Ask the OS to hand packets over as soon as they arrive
    fn request_immediate_delivery(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
