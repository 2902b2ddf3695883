//! Raw register bytes to domain values
//!
//! All multi-byte values on the controller are little-endian.

use std::fmt;

use serde::{Serialize, Deserialize};

use crate::core::{Error, Result};

/// A transformed register value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
        }
    }
}

/// The closed set of register interpretations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transformation {
    /// Signed 16 bit
    Int16,
    /// Signed 16 bit in tenths of a degree
    Temperature,
    Uint8,
    /// Unsigned byte in half percent steps
    Percentage,
    Int32,
    Int64,
}

impl Transformation {
    /// Number of register bytes the transformation consumes
    pub fn width(&self) -> usize {
        match self {
            Transformation::Uint8 | Transformation::Percentage => 1,
            Transformation::Int16 | Transformation::Temperature => 2,
            Transformation::Int32 => 4,
            Transformation::Int64 => 8,
        }
    }

    pub fn apply(&self, bytes: &[u8]) -> Result<Value> {
        Ok(match self {
            Transformation::Int16 => Value::Int(int16_le(bytes)?.into()),
            Transformation::Temperature => Value::Float(temperature(bytes)?),
            Transformation::Uint8 => Value::Int(uint8(bytes)?.into()),
            Transformation::Percentage => Value::Float(percentage(bytes)?),
            Transformation::Int32 => Value::Int(int32_le(bytes)?.into()),
            Transformation::Int64 => Value::Int(int64_le(bytes)?),
        })
    }
}

fn exact<const N: usize>(bytes: &[u8], what: &str) -> Result<[u8; N]> {
    bytes.try_into().map_err(|_| {
        Error::invalid_argument(format!("{} needs {} bytes, got {}", what, N, bytes.len()))
    })
}

pub fn int16_le(bytes: &[u8]) -> Result<i16> {
    Ok(i16::from_le_bytes(exact(bytes, "int16")?))
}

/// Degrees Celsius
pub fn temperature(bytes: &[u8]) -> Result<f64> {
    Ok(f64::from(int16_le(bytes)?) / 10.0)
}

pub fn uint8(bytes: &[u8]) -> Result<u8> {
    let [b] = exact::<1>(bytes, "uint8")?;
    Ok(b)
}

pub fn percentage(bytes: &[u8]) -> Result<f64> {
    Ok(f64::from(uint8(bytes)?) / 2.0)
}

pub fn int32_le(bytes: &[u8]) -> Result<i32> {
    Ok(i32::from_le_bytes(exact(bytes, "int32")?))
}

pub fn int64_le(bytes: &[u8]) -> Result<i64> {
    Ok(i64::from_le_bytes(exact(bytes, "int64")?))
}

/// Best-effort integer decode chosen by the data length
pub fn decode_by_width(bytes: &[u8]) -> Option<i64> {
    let transformation = match bytes.len() {
        1 => Transformation::Uint8,
        2 => Transformation::Int16,
        4 => Transformation::Int32,
        8 => Transformation::Int64,
        _ => return None,
    };
    match transformation.apply(bytes) {
        Ok(Value::Int(v)) => Some(v),
        _ => None,
    }
}
