//! One-time pickup PIN

use rand::RngCore;
use rand::rngs::OsRng;

use super::error::PinError;

pub const PIN_LEN: usize = 6;

const PIN_SPACE: u32 = 1_000_000;
/// Largest multiple of `PIN_SPACE` that fits in a u32; draws at or above it are rejected.
const ACCEPT_BELOW: u32 = u32::MAX - (u32::MAX % PIN_SPACE);

/// Draw a uniformly random, zero-padded 6-digit PIN from the OS CSPRNG.
pub fn generate() -> Result<String, PinError> {
    loop {
        let mut buf = [0u8; 4];
        OsRng.try_fill_bytes(&mut buf)?;
        let draw = u32::from_le_bytes(buf);
        if draw < ACCEPT_BELOW {
            return Ok(format!("{:06}", draw % PIN_SPACE));
        }
    }
}

/// Exact comparison whose running time does not depend on where the inputs differ.
pub fn matches(expected: &str, supplied: &str) -> bool {
    let (a, b) = (expected.as_bytes(), supplied.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
