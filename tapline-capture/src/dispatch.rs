//! Single-packet dispatch
//!
//! Each call polls the capture context once and delivers at most one packet.
//! An event loop calls [`CaptureManager::dispatch`] when the session's
//! descriptor turns readable (or on a timer; the read timeout bounds every
//! poll either way).

use tapline_core::{PacketMeta, Result, SessionId};
use tracing::{error, trace};

use crate::backend::{CaptureBackend, CaptureSource};
use crate::capture::CaptureManager;

impl<B: CaptureBackend> CaptureManager<B> {
    /// Poll session `id` once and hand at most one packet to `on_packet`
    ///
    /// The packet is copied into `buffer`, truncated to its length when it
    /// does not fit. `on_packet` runs before this returns and receives the
    /// header metadata, whose `caplen` and `len` stay untruncated, and the
    /// filled prefix of `buffer`.
    ///
    /// Returns the number of packets delivered: 1, or 0 when nothing was
    /// ready. A read failure leaves the session open for later calls.
    pub fn dispatch<F>(&mut self, id: SessionId, buffer: &mut [u8], on_packet: F) -> Result<usize>
    where
        F: FnOnce(&PacketMeta, &[u8]),
    {
        let session = self.sessions.get_mut(id)?;
        let (source, delivery) = session.dispatch_parts()?;

        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                delivery.record_empty_poll();
                trace!(session = %id, "No packet ready");
                return Ok(0);
            }
            Err(e) => {
                error!(session = %id, error = %e, "Capture read failed");
                return Err(e);
            }
        };

        let meta = frame.meta;
        let copied = meta.copy_len(buffer.len()).min(frame.data.len());
        buffer[..copied].copy_from_slice(&frame.data[..copied]);

        let truncated = copied < meta.caplen as usize;
        delivery.record_delivery(copied, truncated);
        trace!(
            session = %id,
            caplen = meta.caplen,
            len = meta.len,
            copied,
            truncated,
            "Delivering packet"
        );

        on_packet(&meta, &buffer[..copied]);
        Ok(1)
    }
}
