//! Capture session manager
//!
//! [`CaptureManager`] opens live and offline sessions, owns the registry
//! that hands out their handles, and answers diagnostic queries about them.
//! Packet delivery lives in [`crate::dispatch`].

use std::path::{Path, PathBuf};

use tapline_core::{CaptureMode, Error, LinkType, NetMask, Result, SessionId};
use tracing::{debug, info, warn};

use crate::backend::{CaptureBackend, CaptureSource};
use crate::filters;
use crate::pcap_backend::PcapBackend;
use crate::registry::{Session, SessionInfo, SessionRegistry, SessionSource};
use crate::stats::{CaptureCounters, DeliveryStats};

/// Default snapshot length; 64KB is the largest IPv4 packet
pub const DEFAULT_SNAPLEN: i32 = 65535;

/// Read timeout (milliseconds); still required on some platforms when
/// non-blocking mode is on
pub const DEFAULT_TIMEOUT_MS: i32 = 1000;

/// Largest snapshot length libpcap accepts
const MAX_SNAPLEN: i32 = 262_144;

/// Configuration for a live capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Maximum bytes to capture per packet
    pub snaplen: i32,
    /// Enable promiscuous mode
    pub promiscuous: bool,
    /// Kernel buffer size in bytes (0 = library default); the OS may
    /// silently clamp it
    pub buffer_size: i32,
    /// Read timeout in milliseconds
    pub timeout_ms: i32,
    /// Ask libpcap for immediate mode at activation
    pub immediate_mode: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            snaplen: DEFAULT_SNAPLEN,
            promiscuous: true,
            buffer_size: 0,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            immediate_mode: false,
        }
    }
}

impl CaptureConfig {
    /// Defaults with the given kernel buffer size
    pub fn with_buffer_size(buffer_size: i32) -> Self {
        Self {
            buffer_size,
            ..Self::default()
        }
    }

    /// Check every knob, in the order they are applied
    pub fn validate(&self) -> Result<()> {
        if self.snaplen <= 0 || self.snaplen > MAX_SNAPLEN {
            return Err(Error::configuration(
                "snaplen",
                format!("{} is outside 1..={}", self.snaplen, MAX_SNAPLEN),
            ));
        }
        if !self.promiscuous {
            debug!("Promiscuous mode disabled by configuration");
        }
        if self.buffer_size < 0 {
            return Err(Error::configuration(
                "buffer size",
                format!("{} is negative", self.buffer_size),
            ));
        }
        if self.timeout_ms < 0 {
            return Err(Error::configuration(
                "read timeout",
                format!("{}ms is negative", self.timeout_ms),
            ));
        }
        Ok(())
    }
}

/// Owner of a set of capture sessions
///
/// Each manager has its own registry, so independent managers can coexist
/// in one process. Not synchronized: drive it from one thread.
pub struct CaptureManager<B: CaptureBackend = PcapBackend> {
    backend: B,
    pub(crate) sessions: SessionRegistry<B::Source>,
}

impl CaptureManager<PcapBackend> {
    /// Manager backed by libpcap
    pub fn new() -> Self {
        Self::with_backend(PcapBackend)
    }
}

impl Default for CaptureManager<PcapBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: CaptureBackend> CaptureManager<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            sessions: SessionRegistry::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Open a live capture on `device` with the default knobs and the given
    /// kernel buffer size
    pub fn open_live(&mut self, device: &str, filter: &str, buffer_size: i32) -> Result<SessionId> {
        self.open_live_with_config(device, filter, CaptureConfig::with_buffer_size(buffer_size))
    }

    /// Open a live capture on `device` with explicit configuration
    pub fn open_live_with_config(
        &mut self,
        device: &str,
        filter: &str,
        config: CaptureConfig,
    ) -> Result<SessionId> {
        if device.trim().is_empty() {
            return Err(Error::invalid_argument("device name is empty"));
        }

        let netmask = match self.backend.lookup_net(device) {
            Ok(netmask) => netmask,
            Err(e) => {
                warn!(device, error = %e, "Network lookup failed, filters may not match as expected");
                NetMask::UNKNOWN
            }
        };

        // Knobs are checked before any capture context exists.
        config.validate()?;
        debug!(
            device,
            snaplen = config.snaplen,
            promiscuous = config.promiscuous,
            buffer_size = config.buffer_size,
            timeout_ms = config.timeout_ms,
            "Activating live capture"
        );

        let mut source = self.backend.activate_live(device, &config)?;

        if let Err(e) = source.request_immediate_delivery() {
            warn!(device, error = %e, "Could not enable immediate packet delivery");
        }

        self.finish_open(
            CaptureMode::Live,
            SessionSource::Device(device.to_string()),
            netmask,
            source,
            filter,
        )
    }

    /// Open a save file for replay
    ///
    /// `filter` is compiled without network context.
    pub fn open_offline<P: AsRef<Path>>(&mut self, path: P, filter: &str) -> Result<SessionId> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(Error::invalid_argument("capture file path is empty"));
        }
        let source = self.backend.open_offline(path)?;

        self.finish_open(
            CaptureMode::Offline,
            SessionSource::File(PathBuf::from(path)),
            NetMask::UNKNOWN,
            source,
            filter,
        )
    }

    fn finish_open(
        &mut self,
        mode: CaptureMode,
        origin: SessionSource,
        netmask: NetMask,
        source: B::Source,
        filter: &str,
    ) -> Result<SessionId> {
        let mut source = self.backend.set_nonblocking(source)?;
        let program = filters::apply(&mut source, filter, netmask)?;

        let id = self
            .sessions
            .create(|id| Session::open(id, mode, origin.clone(), netmask, program, source));

        info!(session = %id, %mode, source = %origin, filter, "Capture session opened");
        Ok(id)
    }

    /// Compile `expression` and install it in place of the session's filter
    pub fn set_filter(&mut self, id: SessionId, expression: &str) -> Result<()> {
        let session = self.sessions.get_mut(id)?;
        let netmask = session.netmask();
        let program = filters::apply(session.handle_mut()?, expression, netmask)?;
        session.replace_filter(program);

        info!(session = %id, filter = expression, "Filter replaced");
        Ok(())
    }

    /// Release the session's capture context; the handle stays reserved
    pub fn close(&mut self, id: SessionId) -> Result<()> {
        let session = self.sessions.get_mut(id)?;
        if session.close() {
            info!(session = %id, "Capture session closed");
        } else {
            debug!(session = %id, "Session already closed");
        }
        Ok(())
    }

    /// Data-link type of the session's capture
    pub fn link_type(&self, id: SessionId) -> Result<LinkType> {
        let session = self.sessions.get(id)?;
        Ok(LinkType::from_raw(session.handle()?.datalink()))
    }

    /// Kernel packet counters
    pub fn stats(&mut self, id: SessionId) -> Result<CaptureCounters> {
        self.sessions.get_mut(id)?.handle_mut()?.stats()
    }

    /// Descriptor to wait on before calling dispatch
    ///
    /// `None` when the capture context has no selectable descriptor, as with
    /// save files.
    pub fn fileno(&self, id: SessionId) -> Result<Option<i32>> {
        Ok(self.sessions.get(id)?.handle()?.selectable_fd())
    }

    /// What dispatch has delivered for this session so far
    pub fn delivery_stats(&self, id: SessionId) -> Result<DeliveryStats> {
        Ok(self.sessions.get(id)?.delivery().snapshot())
    }

    /// Summary of a session, open or closed
    pub fn session(&self, id: SessionId) -> Result<SessionInfo> {
        Ok(self.sessions.get(id)?.info())
    }

    /// Resolve a raw caller-supplied handle
    pub fn resolve(&self, raw: i32) -> Result<SessionId> {
        self.sessions.resolve(raw)
    }

    /// Capture library name and version
    pub fn lib_version(&self) -> String {
        self.backend.version()
    }

    /// Sessions ever opened, including closed ones
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Sessions currently open
    pub fn open_count(&self) -> usize {
        self.sessions.open_count()
    }
}
