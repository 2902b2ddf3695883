//! Utility module
//!
//! Hex parsing and formatting shared by the command line and HTTP surfaces.

use crate::core::{Error, Result, MAX_REGISTER_SIZE};

/// Parses a register address such as `0x0802` or `a38f`
pub fn parse_address(text: &str) -> Result<u16> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);

    let invalid = || Error::invalid_argument(format!("invalid register address {:?}", text));

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    // leading zeros are fine as long as the value fits 16 bits
    let trimmed = digits.trim_start_matches('0');
    if trimmed.len() > 4 {
        return Err(invalid());
    }
    u16::from_str_radix(if trimmed.is_empty() { "0" } else { trimmed }, 16).map_err(|_| invalid())
}

/// Formats an address the way [`parse_address`] accepts it
pub fn format_address(address: u16) -> String {
    format!("0x{:04X}", address)
}

/// Checks a register size against the supported range
pub fn check_size(size: usize) -> Result<u8> {
    if size == 0 || size > MAX_REGISTER_SIZE {
        return Err(Error::invalid_argument(format!(
            "size {} outside 1..={}",
            size, MAX_REGISTER_SIZE
        )));
    }
    Ok(size as u8)
}

/// Decodes a hex payload for a register write
pub fn parse_data(text: &str) -> Result<Vec<u8>> {
    let data = hex::decode(text.trim())
        .map_err(|e| Error::invalid_argument(format!("invalid hex data {:?}: {}", text, e)))?;
    check_size(data.len())?;
    Ok(data)
}
