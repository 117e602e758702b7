//! Common types used throughout tapline

use std::fmt;

use crate::Error;

/// Opaque handle naming one capture session
///
/// Handles are dense integers assigned in creation order, starting at 0.
/// A handle is never reassigned to a different session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u32);

impl SessionId {
    /// Wrap a raw handle value
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw handle value
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Slot index in a registry
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i32> for SessionId {
    type Error = Error;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        u32::try_from(raw)
            .map(SessionId)
            .map_err(|_| Error::InvalidHandle(i64::from(raw)))
    }
}

impl From<SessionId> for i64 {
    fn from(id: SessionId) -> Self {
        i64::from(id.0)
    }
}

/// Where a session reads packets from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureMode {
    /// A network interface
    Live,
    /// A previously recorded save file
    Offline,
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureMode::Live => write!(f, "live"),
            CaptureMode::Offline => write!(f, "offline"),
        }
    }
}

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Capture context held, dispatch allowed
    Open,
    /// Capture context released; the registry slot remains
    Closed,
}

impl SessionState {
    pub fn is_open(self) -> bool {
        self == SessionState::Open
    }
}

/// Network address and mask of a live device, as host-order integers
///
/// Both are zero when the lookup failed or the session is offline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NetMask {
    pub network: u32,
    pub mask: u32,
}

impl NetMask {
    pub const UNKNOWN: NetMask = NetMask {
        network: 0,
        mask: 0,
    };

    pub const fn new(network: u32, mask: u32) -> Self {
        Self { network, mask }
    }

    pub fn is_unknown(&self) -> bool {
        *self == Self::UNKNOWN
    }
}

const DLT_NULL: i32 = 0;
const DLT_EN10MB: i32 = 1;
#[cfg(target_os = "openbsd")]
const DLT_RAW: i32 = 14;
#[cfg(not(target_os = "openbsd"))]
const DLT_RAW: i32 = 12;
const DLT_IEEE802_11_RADIO: i32 = 127;

/// Data-link framing of captured packets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkType {
    /// BSD loopback encapsulation
    Null,
    /// Ethernet; most wifi interfaces present themselves this way too
    Ethernet,
    /// 802.11 with radiotap header ("monitor mode")
    Ieee80211Radio,
    /// Raw IP, no link-layer header
    Raw,
    /// Anything else, with the raw data-link value
    Unknown(i32),
}

impl LinkType {
    /// Map a data-link value reported by the capture library
    pub fn from_raw(dlt: i32) -> Self {
        match dlt {
            DLT_NULL => LinkType::Null,
            DLT_EN10MB => LinkType::Ethernet,
            DLT_IEEE802_11_RADIO => LinkType::Ieee80211Radio,
            DLT_RAW => LinkType::Raw,
            other => LinkType::Unknown(other),
        }
    }

    /// Raw data-link value
    pub fn raw(self) -> i32 {
        match self {
            LinkType::Null => DLT_NULL,
            LinkType::Ethernet => DLT_EN10MB,
            LinkType::Ieee80211Radio => DLT_IEEE802_11_RADIO,
            LinkType::Raw => DLT_RAW,
            LinkType::Unknown(other) => other,
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkType::Null => write!(f, "LINKTYPE_NULL"),
            LinkType::Ethernet => write!(f, "LINKTYPE_ETHERNET"),
            LinkType::Ieee80211Radio => write!(f, "LINKTYPE_IEEE802_11_RADIO"),
            LinkType::Raw => write!(f, "LINKTYPE_RAW"),
            LinkType::Unknown(other) => write!(f, "Unknown linktype {}", other),
        }
    }
}
