//! Fixed-width big-endian encoding of integers modulo `n`.

use rsa::BigUint;

use crate::Error;

pub trait ToBytesPadded {
    /// Returns the byte representation of `self` in big-endian byte order,
    /// left-padding the number with zeroes to the specified length.
    ///
    /// If `len` is less than or equal to the length of the byte representation
    /// of `self`, no padding will be added.
    fn to_bytes_be_padded(&self, len: usize) -> Vec<u8>;
}

impl ToBytesPadded for BigUint {
    fn to_bytes_be_padded(&self, len: usize) -> Vec<u8> {
        let v = self.to_bytes_be();
        if len <= v.len() {
            return v;
        }
        let mut out = vec![0u8; len - v.len()];
        out.extend_from_slice(&v);
        out
    }
}

/// Parses a value that must be encoded on exactly `len` bytes.
pub fn parse_fixed(bytes: &[u8], len: usize) -> Result<BigUint, Error> {
    if bytes.len() != len {
        return Err(Error::UnsupportedParameters);
    }
    Ok(BigUint::from_bytes_be(bytes))
}
