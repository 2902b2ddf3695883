//! In-memory transports for session tests

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use super::Transport;
use crate::protocol::{TelegramCodec, ACK, ENQ, EOT, TELEGRAM_START, VS2_INIT};

/// Replays a fixed byte script and records everything written
///
/// Input buffer resets are counted but leave the script alone, so the
/// script describes what arrives after each flush.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    incoming: Arc<Mutex<VecDeque<u8>>>,
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
    resets: Arc<Mutex<usize>>,
}

impl ScriptedTransport {
    pub fn new(script: &[u8]) -> Self {
        let transport = ScriptedTransport::default();
        transport.push(script);
        transport
    }

    /// Appends bytes to the script
    pub fn push(&self, bytes: &[u8]) {
        self.incoming.lock().unwrap().extend(bytes.iter().copied());
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().unwrap().clone()
    }

    /// Number of `EOT` writes, one per handshake attempt
    pub fn handshake_attempts(&self) -> usize {
        self.writes().iter().filter(|w| w.as_slice() == [EOT]).count()
    }

    pub fn resets(&self) -> usize {
        *self.resets.lock().unwrap()
    }

    pub fn remaining(&self) -> usize {
        self.incoming.lock().unwrap().len()
    }
}

impl Transport for ScriptedTransport {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writes.lock().unwrap().push(bytes.to_vec());
        Ok(())
    }

    fn read(&mut self, max_len: usize) -> io::Result<Vec<u8>> {
        let mut incoming = self.incoming.lock().unwrap();
        let n = max_len.min(incoming.len());
        Ok(incoming.drain(..n).collect())
    }

    fn reset_input_buffer(&mut self) -> io::Result<()> {
        *self.resets.lock().unwrap() += 1;
        Ok(())
    }
}

/// Shared bookkeeping of a [`SimulatedController`]
#[derive(Default)]
pub struct ControllerLog {
    /// Requests written while a previous response was still unread
    pub overlaps: usize,
    /// Request telegrams served
    pub requests: usize,
    pub handshakes: usize,
}

/// A controller that answers the VS2 handshake and register telegrams
///
/// Reads are slowed down so that unserialized callers would overlap.
pub struct SimulatedController {
    registers: HashMap<u16, Vec<u8>>,
    incoming: VecDeque<u8>,
    synced: bool,
    pending_response: bool,
    log: Arc<Mutex<ControllerLog>>,
}

impl SimulatedController {
    pub fn new(registers: HashMap<u16, Vec<u8>>) -> (Self, Arc<Mutex<ControllerLog>>) {
        let log = Arc::new(Mutex::new(ControllerLog::default()));
        let controller = SimulatedController {
            registers,
            incoming: VecDeque::new(),
            synced: false,
            pending_response: false,
            log: log.clone(),
        };
        (controller, log)
    }

    fn answer(&mut self, frame: &[u8]) {
        let codec = TelegramCodec::new();
        let payload = match codec.decode(frame[1], &frame[2..]) {
            Ok(payload) => payload,
            Err(_) => return,
        };

        {
            let mut log = self.log.lock().unwrap();
            if self.pending_response {
                log.overlaps += 1;
            }
            log.requests += 1;
        }

        let service = payload[1];
        let address = u16::from_be_bytes([payload[2], payload[3]]);
        let size = payload[4] as usize;
        let mut response = vec![0x01, service, payload[2], payload[3], payload[4]];

        if service == 0x01 {
            match self.registers.get(&address) {
                Some(value) if value.len() >= size => response.extend_from_slice(&value[..size]),
                _ => response[0] = 0x03,
            }
        } else {
            self.registers.insert(address, payload[5..].to_vec());
        }

        self.incoming.push_back(ACK);
        // encode never fails for payloads this small
        if let Ok(telegram) = codec.encode(&response) {
            self.incoming.extend(telegram.iter().copied());
        }
        self.pending_response = true;
    }
}

impl Transport for SimulatedController {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        match bytes {
            [EOT] => {
                self.synced = true;
                self.incoming.clear();
                self.pending_response = false;
            }
            init if init == VS2_INIT => {
                self.incoming.push_back(ACK);
                self.log.lock().unwrap().handshakes += 1;
            }
            [TELEGRAM_START, ..] if bytes.len() > 2 => self.answer(bytes),
            _ => {}
        }
        Ok(())
    }

    fn read(&mut self, max_len: usize) -> io::Result<Vec<u8>> {
        thread::sleep(Duration::from_millis(1));
        let n = max_len.min(self.incoming.len());
        let bytes: Vec<u8> = self.incoming.drain(..n).collect();
        if self.incoming.is_empty() {
            self.pending_response = false;
        }
        Ok(bytes)
    }

    fn reset_input_buffer(&mut self) -> io::Result<()> {
        self.incoming.clear();
        if self.synced {
            // idle controller announces itself right after the flush
            self.incoming.push_back(ENQ);
            self.synced = false;
        }
        Ok(())
    }
}
