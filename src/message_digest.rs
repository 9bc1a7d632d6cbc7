//! Message digests interpreted as integers modulo `n`.

use hmac_sha256::Hash as Sha256;
use hmac_sha512::sha384::Hash as Sha384;
use hmac_sha512::Hash as Sha512;
use rsa::BigUint;

use crate::{Error, Hash};

/// A message digest, as a big-endian integer below the modulus it was checked against
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Digest(BigUint);

impl Digest {
    /// Wraps an arbitrary integer, rejecting values that are not below `n`.
    pub fn from_value(v: BigUint, n: &BigUint) -> Result<Self, Error> {
        if &v >= n {
            return Err(Error::DigestTooLarge);
        }
        Ok(Digest(v))
    }

    pub fn value(&self) -> &BigUint {
        &self.0
    }
}

impl Hash {
    /// Output size in bytes
    pub fn output_size(&self) -> usize {
        match self {
            Hash::Sha256 => 32,
            Hash::Sha384 => 48,
            Hash::Sha512 => 64,
        }
    }

    fn hash(&self, msg: &[u8]) -> Vec<u8> {
        match self {
            Hash::Sha256 => Sha256::hash(msg).to_vec(),
            Hash::Sha384 => Sha384::hash(msg).to_vec(),
            Hash::Sha512 => Sha512::hash(msg).to_vec(),
        }
    }
}

/// Hashes `msg` and interprets the hash as a big-endian integer.
///
/// The result is never reduced: a modulus too small for the hash is a
/// configuration error reported as [`Error::DigestTooLarge`].
pub fn digest(msg: impl AsRef<[u8]>, n: &BigUint, hash: Hash) -> Result<Digest, Error> {
    let h = hash.hash(msg.as_ref());
    Digest::from_value(BigUint::from_bytes_be(&h), n)
}
