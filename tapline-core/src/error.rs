//! Error types for tapline

use thiserror::Error;

use crate::types::SessionId;

/// Result type alias for tapline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tapline
///
/// Every variant carries the diagnostic text reported by the capture library
/// where one exists. Failures while opening a session abort the open and
/// register nothing; failures during dispatch leave the session usable.
#[derive(Error, Debug)]
pub enum Error {
    /// Wrong shape or range of an argument at the API boundary
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The capture context for a live device could not be created
    #[error("Cannot open device '{device}': {reason}")]
    DeviceOpen { device: String, reason: String },

    /// A save file could not be opened
    #[error("Cannot open capture file '{path}': {reason}")]
    FileOpen { path: String, reason: String },

    /// A live capture knob was rejected
    #[error("Error setting {knob}: {reason}")]
    Configuration { knob: &'static str, reason: String },

    /// The capture context failed to activate
    #[error("Activation failed: {0}")]
    Activation(String),

    /// Non-blocking mode could not be enabled
    #[error("Cannot enable non-blocking mode: {0}")]
    NonBlockingMode(String),

    /// The filter expression did not compile
    #[error("Filter compile error: {0}")]
    FilterCompile(String),

    /// The compiled filter was rejected by the capture context
    #[error("Filter install error: {0}")]
    FilterInstall(String),

    /// The capture poll failed
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// Statistics could not be read
    #[error("Statistics unavailable: {0}")]
    Stats(String),

    /// Handle does not name a session
    #[error("Invalid session handle: {0}")]
    InvalidHandle(i64),

    /// Session exists but has been closed
    #[error("Session {0} is closed")]
    SessionClosed(SessionId),

    /// Device or address lookup failed
    #[error("Device lookup failed: {0}")]
    DeviceLookup(String),

    /// No interface qualifies as the default capture device
    #[error("No suitable default device found")]
    NoDefaultDevice,
}

impl Error {
    /// Create a configuration error for the named knob
    pub fn configuration<S: Into<String>>(knob: &'static str, reason: S) -> Self {
        Error::Configuration {
            knob,
            reason: reason.into(),
        }
    }

    /// Create a device open error
    pub fn device_open<D: Into<String>, R: ToString>(device: D, reason: R) -> Self {
        Error::DeviceOpen {
            device: device.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a file open error
    pub fn file_open<P: Into<String>, R: ToString>(path: P, reason: R) -> Self {
        Error::FileOpen {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Whether this error aborted session creation
    pub fn is_open_failure(&self) -> bool {
        matches!(
            self,
            Error::DeviceOpen { .. }
                | Error::FileOpen { .. }
                | Error::Configuration { .. }
                | Error::Activation(_)
                | Error::NonBlockingMode(_)
                | Error::FilterCompile(_)
                | Error::FilterInstall(_)
        )
    }
}
