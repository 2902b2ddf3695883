use std::sync::{Mutex, MutexGuard};

use crate::core::{Error, Result};
use crate::transport::Transport;
use super::message::Request;
use super::state::{Link, LinkState, ProtocolConfig};

/// Result of a register operation that reached the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The controller answered with status 0x01
    Success(T),
    /// The controller answered with status 0x03
    DeviceRejected,
    /// The exchange broke down; the next call re-runs the handshake
    LinkFault,
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Returns the success value, if any
    pub fn success(self) -> Option<T> {
        match self {
            Outcome::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::DeviceRejected => Outcome::DeviceRejected,
            Outcome::LinkFault => Outcome::LinkFault,
        }
    }

    /// Short label used in logs and HTTP responses
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success(_) => "ok",
            Outcome::DeviceRejected => "rejected",
            Outcome::LinkFault => "link_fault",
        }
    }
}

/// Blocking register access, safe to share between threads
pub trait RegisterAccess: Send + Sync {
    /// Reads `count` bytes starting at `address`
    fn read_register(&self, address: u16, count: u8) -> Result<Outcome<Vec<u8>>>;

    /// Writes `data` starting at `address`
    fn write_register(&self, address: u16, data: &[u8]) -> Result<Outcome<()>>;
}

/// One Optolink connection shared by every caller in the process
///
/// The lock is held for a whole transaction, including any handshake it
/// triggers, so no two exchanges ever interleave on the wire.
pub struct Session {
    link: Mutex<Link<Box<dyn Transport>>>,
}

impl Session {
    /// Creates a session in [`LinkState::Idle`]; the first request performs the handshake
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        Self::with_config(transport, ProtocolConfig::default())
    }

    pub fn with_config<T: Transport + 'static>(transport: T, config: ProtocolConfig) -> Self {
        let transport: Box<dyn Transport> = Box::new(transport);
        Session {
            link: Mutex::new(Link::new(transport, config)),
        }
    }

    /// Runs the handshake now instead of on the first request
    pub fn connect(&self) -> Result<()> {
        self.lock()?.handshake()
    }

    pub fn state(&self) -> Result<LinkState> {
        Ok(self.lock()?.state())
    }

    pub fn is_established(&self) -> bool {
        matches!(self.state(), Ok(LinkState::HandshakeEstablished))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Link<Box<dyn Transport>>>> {
        self.link
            .lock()
            .map_err(|_| Error::invalid_state("session lock poisoned"))
    }
}

impl RegisterAccess for Session {
    fn read_register(&self, address: u16, count: u8) -> Result<Outcome<Vec<u8>>> {
        let request = Request::read(address, count)?;
        let outcome = self.lock()?.transact(&request)?;
        Ok(outcome.map(|data| data.to_vec()))
    }

    fn write_register(&self, address: u16, data: &[u8]) -> Result<Outcome<()>> {
        let request = Request::write(address, data)?;
        let outcome = self.lock()?.transact(&request)?;
        Ok(outcome.map(|_| ()))
    }
}
