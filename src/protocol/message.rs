use bytes::{BufMut, Bytes, BytesMut};

use crate::core::{Error, Result, MAX_REGISTER_SIZE};
use crate::util::check_size;

/// VS2 service codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Service {
    Read = 0x01,
    Write = 0x02,
}

/// Response status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// 0x01
    Ok,
    /// 0x03, the controller refused the request
    DeviceError,
}

impl Status {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Status::Ok),
            0x03 => Some(Status::DeviceError),
            _ => None,
        }
    }
}

/// A register request as carried in a telegram payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Read { address: u16, count: u8 },
    Write { address: u16, data: Bytes },
}

impl Request {
    /// Builds a read request, checking the size range
    pub fn read(address: u16, count: u8) -> Result<Self> {
        check_size(count as usize)?;
        Ok(Request::Read { address, count })
    }

    /// Builds a write request, checking the size range
    pub fn write(address: u16, data: &[u8]) -> Result<Self> {
        check_size(data.len())?;
        Ok(Request::Write {
            address,
            data: Bytes::copy_from_slice(data),
        })
    }

    pub fn service(&self) -> Service {
        match self {
            Request::Read { .. } => Service::Read,
            Request::Write { .. } => Service::Write,
        }
    }

    pub fn address(&self) -> u16 {
        match self {
            Request::Read { address, .. } | Request::Write { address, .. } => *address,
        }
    }

    /// Count for reads, data length for writes
    fn size(&self) -> u8 {
        match self {
            Request::Read { count, .. } => *count,
            Request::Write { data, .. } => data.len() as u8,
        }
    }

    /// Service, address and size as the controller echoes them back
    pub fn echo(&self) -> [u8; 4] {
        let [hi, lo] = self.address().to_be_bytes();
        [self.service() as u8, hi, lo, self.size()]
    }

    /// Payload length the controller answers a successful request with
    pub fn expected_response_len(&self) -> usize {
        match self {
            Request::Read { count, .. } => 5 + *count as usize,
            Request::Write { .. } => 5,
        }
    }

    /// `[0x00, service, address (BE), size, data..]`
    pub fn to_payload(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(5 + MAX_REGISTER_SIZE);
        dst.put_u8(0x00);
        dst.put_slice(&self.echo());
        if let Request::Write { data, .. } = self {
            dst.put_slice(data);
        }
        dst.freeze()
    }
}

/// Decoded response to a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Register data for reads, empty for writes
    Ok(Bytes),
    DeviceError,
}

impl Response {
    /// Interprets a response payload against the request that caused it
    ///
    /// Status and shape violations mean the two ends disagree about the
    /// exchange and are reported as [`Error::Desync`].
    pub fn parse(request: &Request, payload: &Bytes) -> Result<Self> {
        let status = payload
            .first()
            .ok_or_else(|| Error::desync("empty response payload"))?;

        match Status::from_byte(*status) {
            Some(Status::Ok) => {}
            Some(Status::DeviceError) => return Ok(Response::DeviceError),
            None => {
                return Err(Error::desync(format!("unexpected status byte {:#04x}", status)));
            }
        }

        let expected = request.expected_response_len();
        if payload.len() != expected {
            return Err(Error::desync(format!(
                "response to {:?} at {:#06x} has {} bytes, expected {}",
                request.service(),
                request.address(),
                payload.len(),
                expected
            )));
        }

        let echo = request.echo();
        if payload[1..5] != echo {
            return Err(Error::desync(format!(
                "response echo {:02x?} does not match request {:02x?}",
                &payload[1..5],
                echo
            )));
        }

        Ok(Response::Ok(payload.slice(5..)))
    }
}
