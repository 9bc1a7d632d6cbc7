//! Chaum RSA blind signatures.
//!
//! A requester obtains an RSA signature over the SHA-2 digest of a message
//! without the signer ever observing the message or its digest. Anyone holding
//! the signer's public key can then check the signature against the message.
//!
//! ```rust
//! use chaum_blind_rsa::{KeyPair, Options};
//!
//! let options = Options::default();
//! let rng = &mut rand::thread_rng();
//!
//! // [SIGNER]: Generate a RSA-2048 key pair and publish `pk`.
//! let kp = KeyPair::generate(rng, 2048, &options)?;
//! let (pk, sk) = (kp.pk, kp.sk);
//!
//! // [REQUESTER]: hash and blind a message for the signer whose public key is `pk`.
//! // Only `blinding_result.blind_msg` is sent; the factor stays with the requester.
//! let msg = b"This is a test message.";
//! let blinding_result = pk.blind(rng, msg, &options)?;
//!
//! // [SIGNER]: sign the blinded value.
//! let blind_sig = sk.blind_sign(rng, &blinding_result.blind_msg, &options)?;
//!
//! // [REQUESTER]: remove the blinding factor. This consumes the blinding result
//! // and checks the signature against the public key before returning it.
//! let sig = pk.finalize(&blind_sig, blinding_result, msg, &options)?;
//!
//! // [VERIFIER]: anyone with `pk` can check the signature.
//! assert!(sig.verify(&pk, msg, &options)?);
//! # Ok::<(), chaum_blind_rsa::Error>(())
//! ```
//!
//! The digest is signed as-is, with no padding or domain separation
//! (textbook RSA). Applications needing resistance against forgeries built from
//! multiplicative relations between digests should prefer RFC 9474 signatures.

#[macro_use]
extern crate derive_new;

use std::fmt::{self, Display};

use derive_more::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod blinding;
pub mod keys;
pub mod message_digest;
pub mod num_padding;
mod primes;
pub mod signer;
pub mod verifier;

pub use blinding::BlindingFactor;
pub use keys::{KeyPair, PublicKey, PublicParams, SecretKey};
pub use message_digest::{digest, Digest};

pub mod reexports {
    pub use {rand, rsa};
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Error {
    KeyGeneration,
    DigestTooLarge,
    BlindingFactor,
    NotInvertible,
    InvalidRange,
    KeyMismatch,
    VerificationFailed,
    UnsupportedParameters,
    EncodingError,
    InvalidKey,
    InternalError,
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::KeyGeneration => write!(f, "Unable to generate a key pair"),
            Error::DigestTooLarge => write!(f, "Digest does not fit the modulus"),
            Error::BlindingFactor => write!(f, "Unable to draw an invertible blinding factor"),
            Error::NotInvertible => write!(f, "Blinding factor is not invertible"),
            Error::InvalidRange => write!(f, "Value out of range"),
            Error::KeyMismatch => write!(f, "Key mismatch"),
            Error::VerificationFailed => write!(f, "Verification failed"),
            Error::UnsupportedParameters => write!(f, "Unsupported parameters"),
            Error::EncodingError => write!(f, "Encoding error"),
            Error::InvalidKey => write!(f, "Invalid key"),
            Error::InternalError => write!(f, "Internal Error"),
        }
    }
}

/// Hash function used to compute message digests
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Hash {
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

/// Options shared by the requester, the signer and the verifier
#[derive(Clone, Debug, Eq, PartialEq, new)]
pub struct Options {
    /// Hash function for message digests
    pub hash: Hash,
    /// Number of blinding factors drawn before giving up on an exchange
    pub max_blinding_attempts: usize,
    /// Number of prime candidates tested per prime during key generation
    pub max_prime_candidates: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            hash: Hash::Sha256,
            max_blinding_attempts: 16,
            max_prime_candidates: 50_000,
        }
    }
}

/// A blinded message, as sent to the signer
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, AsRef, Deref, From, Into, new)]
pub struct BlindMessage(pub Vec<u8>);

/// A blind signature, as returned by the signer
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, AsRef, Deref, From, Into, new)]
pub struct BlindSignature(pub Vec<u8>);

/// A (non-blind) signature
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, AsRef, Deref, From, Into, new)]
pub struct Signature(pub Vec<u8>);

/// Result of a blinding operation
///
/// Only `blind_msg` leaves the requester. The factor is consumed by
/// [`PublicKey::finalize`].
#[derive(Debug)]
pub struct BlindingResult {
    pub blind_msg: BlindMessage,
    pub factor: BlindingFactor,
    /// Public parameters the message was blinded under
    pub params: PublicParams,
}

impl AsRef<[u8]> for BlindMessage {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl AsRef<[u8]> for BlindSignature {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl Signature {
    /// Check the signature against the given public key and original message
    pub fn verify(
        &self,
        pk: &PublicKey,
        msg: impl AsRef<[u8]>,
        options: &Options,
    ) -> Result<bool, Error> {
        pk.verify(self, msg, options)
    }
}
