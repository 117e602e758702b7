//! Capture statistics

use std::time::{Duration, Instant};

/// Kernel packet counters for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureCounters {
    /// Packets received by the filter
    pub ps_recv: u32,
    /// Packets dropped because the OS buffer was full
    pub ps_drop: u32,
    /// Packets dropped by the interface or its driver; not every platform
    /// reports this
    pub ps_ifdrop: u32,
}

impl CaptureCounters {
    /// Drop rate as percentage of received packets
    pub fn drop_rate(&self) -> f64 {
        if self.ps_recv == 0 {
            return 0.0;
        }
        (f64::from(self.ps_drop) / f64::from(self.ps_recv)) * 100.0
    }

    /// Received plus dropped
    pub fn total_packets(&self) -> u64 {
        u64::from(self.ps_recv) + u64::from(self.ps_drop)
    }

    /// Format counters as a human-readable string
    pub fn format(&self) -> String {
        format!(
            "Received: {} packets\n\
             Dropped: {} packets ({:.2}%)\n\
             IF Dropped: {} packets",
            self.ps_recv,
            self.ps_drop,
            self.drop_rate(),
            self.ps_ifdrop,
        )
    }
}

impl From<pcap::Stat> for CaptureCounters {
    fn from(stat: pcap::Stat) -> Self {
        Self {
            ps_recv: stat.received,
            ps_drop: stat.dropped,
            ps_ifdrop: stat.if_dropped,
        }
    }
}

/// What dispatch has handed to callers of one session
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryStats {
    /// Packets passed to a handler
    pub packets_delivered: u64,
    /// Bytes copied into caller buffers
    pub bytes_copied: u64,
    /// Deliveries where the caller buffer was smaller than the capture
    pub truncated: u64,
    /// Polls that returned no packet
    pub empty_polls: u64,
    /// Time since the session was opened
    pub duration: Duration,
    /// Packets per second over `duration`
    pub packets_per_second: f64,
}

/// Per-session delivery tally, updated by dispatch
#[derive(Debug, Clone)]
pub struct DeliveryCounters {
    packets_delivered: u64,
    bytes_copied: u64,
    truncated: u64,
    empty_polls: u64,
    start_time: Instant,
}

impl DeliveryCounters {
    pub fn new() -> Self {
        Self {
            packets_delivered: 0,
            bytes_copied: 0,
            truncated: 0,
            empty_polls: 0,
            start_time: Instant::now(),
        }
    }

    /// Record one delivered packet
    pub fn record_delivery(&mut self, copied: usize, truncated: bool) {
        self.packets_delivered += 1;
        self.bytes_copied += copied as u64;
        if truncated {
            self.truncated += 1;
        }
    }

    /// Record a poll that produced nothing
    pub fn record_empty_poll(&mut self) {
        self.empty_polls += 1;
    }

    pub fn packets_delivered(&self) -> u64 {
        self.packets_delivered
    }

    pub fn bytes_copied(&self) -> u64 {
        self.bytes_copied
    }

    pub fn truncated(&self) -> u64 {
        self.truncated
    }

    /// Current statistics snapshot
    pub fn snapshot(&self) -> DeliveryStats {
        let duration = self.start_time.elapsed();
        let secs = duration.as_secs_f64();
        let packets_per_second = if secs > 0.0 {
            self.packets_delivered as f64 / secs
        } else {
            0.0
        };

        DeliveryStats {
            packets_delivered: self.packets_delivered,
            bytes_copied: self.bytes_copied,
            truncated: self.truncated,
            empty_polls: self.empty_polls,
            duration,
            packets_per_second,
        }
    }
}

impl Default for DeliveryCounters {
    fn default() -> Self {
        Self::new()
    }
}
