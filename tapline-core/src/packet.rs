//! Packet types

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Header metadata handed to a dispatch handler
///
/// `caplen` and `len` always report the capture library's values, even when
/// the caller's buffer was too small to hold the whole capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PacketMeta {
    /// Capture timestamp, seconds
    pub tv_sec: u32,
    /// Capture timestamp, microseconds
    pub tv_usec: u32,
    /// Bytes captured (bounded by the snapshot length)
    pub caplen: u32,
    /// Original length on the wire
    pub len: u32,
}

impl PacketMeta {
    /// Capture timestamp as a `SystemTime`
    pub fn timestamp(&self) -> SystemTime {
        UNIX_EPOCH
            + Duration::from_secs(u64::from(self.tv_sec))
            + Duration::from_micros(u64::from(self.tv_usec))
    }

    /// Whether the snapshot length cut the packet short
    pub fn is_snapped(&self) -> bool {
        self.caplen < self.len
    }

    /// Whether copying into a buffer of `capacity` bytes loses data
    pub fn truncated_by(&self, capacity: usize) -> bool {
        (self.caplen as usize) > capacity
    }

    /// Bytes that fit into a buffer of `capacity` bytes
    pub fn copy_len(&self, capacity: usize) -> usize {
        (self.caplen as usize).min(capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_len_bounds() {
        let meta = PacketMeta {
            tv_sec: 0,
            tv_usec: 0,
            caplen: 60,
            len: 60,
        };
        assert_eq!(meta.copy_len(1500), 60);
        assert_eq!(meta.copy_len(16), 16);
        assert_eq!(meta.copy_len(0), 0);
        assert!(meta.truncated_by(16));
        assert!(!meta.truncated_by(60));
    }

    #[test]
    fn test_snapped() {
        let meta = PacketMeta {
            caplen: 96,
            len: 1514,
            ..Default::default()
        };
        assert!(meta.is_snapped());
    }

    #[test]
    fn test_timestamp() {
        let meta = PacketMeta {
            tv_sec: 10,
            tv_usec: 500_000,
            ..Default::default()
        };
        let ts = meta.timestamp().duration_since(UNIX_EPOCH).unwrap();
        assert_eq!(ts, Duration::from_millis(10_500));
    }
}
