//! Core types shared by the Optolink client
//!
//! This module contains the error type, configuration and crate-wide constants.

pub mod error;
pub mod types;
pub mod serde;

use std::time::Duration;

pub use self::error::{Error, Result};
pub use self::types::{
    Config,
    ExporterConfig,
    HttpConfig,
    InfluxConfig,
    ReadingConfig,
    SerialConfig,
};

/// Optolink line speed
pub const DEFAULT_BAUD_RATE: u32 = 4800;

/// Per-read timeout of the serial adapter
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Largest register read or write accepted, in bytes
pub const MAX_REGISTER_SIZE: usize = 16;
