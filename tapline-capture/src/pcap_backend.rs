//! libpcap backend built on the `pcap` crate

use std::ffi::CStr;
use std::path::Path;

use pcap::{Active, Capture, Offline, Packet};
use tapline_core::{Error, NetMask, PacketMeta, Result};
use tracing::debug;

use crate::backend::{CaptureBackend, CaptureSource, Frame};
use crate::capture::CaptureConfig;
use crate::filters::{FilterProgram, OPTIMIZE};
use crate::interface;
use crate::stats::CaptureCounters;

// Linked through the pcap crate, which does not re-export it.
extern "C" {
    fn pcap_lib_version() -> *const libc::c_char;
}

/// Opens capture contexts through libpcap
#[derive(Debug, Clone, Copy, Default)]
pub struct PcapBackend;

/// An activated libpcap handle
pub enum PcapSource {
    Live(Capture<Active>),
    Offline(Capture<Offline>),
}

impl CaptureBackend for PcapBackend {
    type Source = PcapSource;

    fn lookup_net(&self, device: &str) -> Result<NetMask> {
        interface::lookup_net(device)
    }

    fn activate_live(&self, device: &str, config: &CaptureConfig) -> Result<PcapSource> {
        let inactive =
            Capture::from_device(device).map_err(|e| Error::device_open(device, e))?;

        let mut inactive = inactive
            .snaplen(config.snaplen)
            .promisc(config.promiscuous)
            .timeout(config.timeout_ms)
            .immediate_mode(config.immediate_mode);

        if config.buffer_size > 0 {
            inactive = inactive.buffer_size(config.buffer_size);
        }

        let capture = inactive
            .open()
            .map_err(|e| Error::Activation(e.to_string()))?;

        debug!(device, "libpcap handle activated");
        Ok(PcapSource::Live(capture))
    }

    fn open_offline(&self, path: &Path) -> Result<PcapSource> {
        let capture = Capture::from_file(path)
            .map_err(|e| Error::file_open(path.display().to_string(), e))?;
        Ok(PcapSource::Offline(capture))
    }

    fn set_nonblocking(&self, source: PcapSource) -> Result<PcapSource> {
        match source {
            PcapSource::Live(capture) => capture
                .setnonblock()
                .map(PcapSource::Live)
                .map_err(|e| Error::NonBlockingMode(e.to_string())),
            // Save-file reads never block.
            PcapSource::Offline(capture) => Ok(PcapSource::Offline(capture)),
        }
    }

    fn version(&self) -> String {
        // Returns a static, NUL-terminated string owned by libpcap.
        let raw = unsafe { pcap_lib_version() };
        if raw.is_null() {
            return "libpcap (unknown version)".to_string();
        }
        unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned()
    }
}

fn frame_of<'a>(packet: Packet<'a>) -> Frame<'a> {
    let header = packet.header;
    Frame {
        meta: PacketMeta {
            tv_sec: header.ts.tv_sec as u32,
            tv_usec: header.ts.tv_usec as u32,
            caplen: header.caplen,
            len: header.len,
        },
        data: packet.data,
    }
}

impl CaptureSource for PcapSource {
    fn compile_filter(&self, expression: &str, netmask: NetMask) -> Result<FilterProgram> {
        // The binding compiles against an unspecified netmask; it only
        // affects `ip broadcast` style primitives.
        let program = match self {
            PcapSource::Live(capture) => capture.compile(expression, OPTIMIZE),
            PcapSource::Offline(capture) => capture.compile(expression, OPTIMIZE),
        }
        .map_err(|e| Error::FilterCompile(e.to_string()))?;

        Ok(FilterProgram::new(
            expression,
            netmask,
            program.get_instructions().len(),
        ))
    }

    fn install_filter(&mut self, program: &FilterProgram) -> Result<()> {
        match self {
            PcapSource::Live(capture) => capture.filter(program.expression(), OPTIMIZE),
            PcapSource::Offline(capture) => capture.filter(program.expression(), OPTIMIZE),
        }
        .map_err(|e| Error::FilterInstall(e.to_string()))
    }

    fn next_frame(&mut self) -> Result<Option<Frame<'_>>> {
        let polled = match self {
            PcapSource::Live(capture) => capture.next_packet(),
            PcapSource::Offline(capture) => capture.next_packet(),
        };

        match polled {
            Ok(packet) => Ok(Some(frame_of(packet))),
            Err(pcap::Error::TimeoutExpired) | Err(pcap::Error::NoMorePackets) => Ok(None),
            Err(e) => Err(Error::Dispatch(e.to_string())),
        }
    }

    fn datalink(&self) -> i32 {
        match self {
            PcapSource::Live(capture) => capture.get_datalink().0,
            PcapSource::Offline(capture) => capture.get_datalink().0,
        }
    }

    fn stats(&mut self) -> Result<CaptureCounters> {
        match self {
            PcapSource::Live(capture) => capture.stats(),
            PcapSource::Offline(capture) => capture.stats(),
        }
        .map(CaptureCounters::from)
        .map_err(|e| Error::Stats(e.to_string()))
    }

    #[cfg(unix)]
    fn selectable_fd(&self) -> Option<i32> {
        use std::os::unix::io::AsRawFd;

        match self {
            PcapSource::Live(capture) => Some(capture.as_raw_fd()),
            PcapSource::Offline(_) => None,
        }
    }

    #[cfg(not(unix))]
    fn selectable_fd(&self) -> Option<i32> {
        None
    }

    // BPF on macOS buffers packets in non-blocking mode until the store
    // buffer fills; BIOCIMMEDIATE turns that off at the cost of more drops
    // under load.
    #[cfg(target_os = "macos")]
    fn request_immediate_delivery(&mut self) -> std::io::Result<()> {
        const BIOCIMMEDIATE: libc::c_ulong = 0x8004_4270;

        let Some(fd) = self.selectable_fd() else {
            return Ok(());
        };
        let enable: libc::c_uint = 1;
        let ret = unsafe { libc::ioctl(fd, BIOCIMMEDIATE, &enable as *const libc::c_uint) };
        if ret == -1 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_file() {
        let result = PcapBackend.open_offline(Path::new("/nonexistent/dir/trace.pcap"));
        match result {
            Err(Error::FileOpen { path, reason }) => {
                assert!(path.contains("trace.pcap"));
                assert!(!reason.is_empty());
            }
            Err(e) => panic!("Expected FileOpen, got {}", e),
            Ok(_) => panic!("Opening a missing file succeeded"),
        }
    }

    #[test]
    fn test_version_comes_from_libpcap() {
        let version = PcapBackend.version();
        assert!(
            version.contains("libpcap") || version.contains("Npcap") || version.contains("WinPcap"),
            "unexpected version string: {}",
            version
        );
        assert!(!version.contains("tapline"));
        assert!(!version.contains("pcap crate"));
    }

    #[test]
    fn test_activate_bogus_device() {
        let config = CaptureConfig::default();
        match PcapBackend.activate_live("tapline_no_such_if0", &config) {
            Err(Error::DeviceOpen { .. }) | Err(Error::Activation(_)) => {}
            Err(e) => panic!("Unexpected error kind: {}", e),
            Ok(_) => panic!("Activated a device that does not exist"),
        }
    }
}
