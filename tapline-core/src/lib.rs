//! tapline Core Library
//!
//! This crate provides the shared value types and error handling for the
//! tapline capture session manager.

pub mod error;
pub mod packet;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use packet::PacketMeta;
pub use types::*;
