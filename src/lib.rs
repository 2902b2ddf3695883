//! vitolink: Viessmann Optolink VS2 client
//!
//! This library talks to a heating controller over an Optolink serial
//! adapter. It exposes thread-safe register reads and writes on top of the
//! VS2 handshake and telegram exchange, plus the telemetry exporter and HTTP
//! endpoint that consume them.
pub mod core;

pub mod api;
pub mod protocol;
pub mod telemetry;
pub mod transform;
pub mod transport;
pub mod util;

// Re-export commonly used items
pub use crate::core::{Config, Error, Result};
pub use protocol::{Outcome, RegisterAccess, Session};
pub use transform::{Transformation, Value};
pub use transport::{SerialTransport, Transport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
