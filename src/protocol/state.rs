use std::io;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::{Error, Result};
use crate::transport::Transport;
use super::codec::TelegramCodec;
use super::message::{Request, Response};
use super::session::Outcome;
use super::{ACK, ENQ, EOT, TELEGRAM_START, VS2_INIT};

/// Handshake state of the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No VS2 session, a handshake must run before the next telegram
    Idle,
    /// The controller accepted the VS2 init sequence
    HandshakeEstablished,
}

/// Protocol configuration
#[derive(Debug, Clone)]
pub struct ProtocolConfig {
    /// Handshake attempts before giving up
    pub handshake_attempts: u32,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        ProtocolConfig {
            handshake_attempts: 3,
        }
    }
}

/// Recoverable fault on the wire
///
/// Faults force a new handshake and are never surfaced as [`Error`].
#[derive(Error, Debug)]
pub enum LinkFault {
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),

    #[error("expected {expected}, got {got:#04x}")]
    Unexpected { expected: &'static str, got: u8 },

    #[error("short read: expected {expected} bytes, got {got}")]
    ShortRead { expected: usize, got: usize },

    #[error("checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    Checksum { expected: u8, actual: u8 },

    #[error("transport error: {0}")]
    Io(#[from] io::Error),
}

/// A transport together with its handshake state
///
/// Not synchronized on its own; [`super::Session`] wraps it in a lock.
pub struct Link<T: Transport> {
    transport: T,
    state: LinkState,
    codec: TelegramCodec,
    config: ProtocolConfig,
}

impl<T: Transport> Link<T> {
    pub fn new(transport: T, config: ProtocolConfig) -> Self {
        Link {
            transport,
            state: LinkState::Idle,
            codec: TelegramCodec::new(),
            config,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Runs the handshake, retrying up to the configured number of attempts
    ///
    /// On exhaustion the link stays [`LinkState::Idle`] and a
    /// [`Error::Connection`] is returned.
    pub fn handshake(&mut self) -> Result<()> {
        self.state = LinkState::Idle;
        let attempts = self.config.handshake_attempts;

        for attempt in 1..=attempts {
            match self.handshake_attempt() {
                Ok(()) => {
                    self.state = LinkState::HandshakeEstablished;
                    info!(attempt, "VS2 handshake established");
                    return Ok(());
                }
                Err(fault) => warn!(attempt, %fault, "VS2 handshake attempt failed"),
            }
        }

        Err(Error::connection(format!(
            "VS2 handshake failed after {} attempts",
            attempts
        )))
    }

    fn handshake_attempt(&mut self) -> std::result::Result<(), LinkFault> {
        self.transport.write(&[EOT])?;
        self.transport.reset_input_buffer()?;

        match self.read_byte("ENQ")? {
            ENQ => {}
            ACK => {
                let next = self.read_byte("ENQ")?;
                if next != ENQ {
                    return Err(LinkFault::Unexpected { expected: "ENQ after ACK", got: next });
                }
            }
            other => return Err(LinkFault::Unexpected { expected: "ENQ or ACK", got: other }),
        }

        self.transport.write(&VS2_INIT)?;
        self.expect_ack()
    }

    /// Executes one request/response exchange
    ///
    /// Link faults drop the link to [`LinkState::Idle`] and yield
    /// [`Outcome::LinkFault`]. A desynchronized response also drops the link
    /// but is returned as [`Error::Desync`] without retrying.
    pub fn transact(&mut self, request: &Request) -> Result<Outcome<Bytes>> {
        if self.state != LinkState::HandshakeEstablished {
            self.handshake()?;
        }

        let frame = self.codec.encode(&request.to_payload())?;
        debug!(service = ?request.service(), address = request.address(), "sending telegram");

        let payload = match self.exchange(&frame) {
            Ok(payload) => payload,
            Err(fault) => {
                warn!(address = request.address(), %fault, "link fault, handshake required");
                self.state = LinkState::Idle;
                return Ok(Outcome::LinkFault);
            }
        };

        match Response::parse(request, &payload) {
            Ok(Response::Ok(data)) => Ok(Outcome::Success(data)),
            Ok(Response::DeviceError) => {
                warn!(service = ?request.service(), address = request.address(), "controller rejected request");
                Ok(Outcome::DeviceRejected)
            }
            Err(e) => {
                self.state = LinkState::Idle;
                Err(e)
            }
        }
    }

    fn exchange(&mut self, frame: &[u8]) -> std::result::Result<Bytes, LinkFault> {
        self.transport.write(frame)?;
        self.expect_ack()?;

        let start = self.read_byte("telegram start")?;
        if start != TELEGRAM_START {
            return Err(LinkFault::Unexpected { expected: "telegram start", got: start });
        }

        let length = self.read_byte("telegram length")?;
        let expected = length as usize + 1;
        let body = self.transport.read(expected)?;
        if body.len() != expected {
            return Err(LinkFault::ShortRead { expected, got: body.len() });
        }

        self.codec.decode(length, &body).map_err(|e| match e {
            Error::Checksum { expected, actual } => LinkFault::Checksum { expected, actual },
            _ => LinkFault::ShortRead { expected, got: body.len() },
        })
    }

    fn expect_ack(&mut self) -> std::result::Result<(), LinkFault> {
        match self.read_byte("ACK")? {
            ACK => Ok(()),
            other => Err(LinkFault::Unexpected { expected: "ACK", got: other }),
        }
    }

    fn read_byte(&mut self, what: &'static str) -> std::result::Result<u8, LinkFault> {
        self.transport
            .read(1)?
            .first()
            .copied()
            .ok_or(LinkFault::Timeout(what))
    }
}
