use rand::{CryptoRng, RngCore};
use rsa::hazmat::rsa_decrypt_and_check;
use rsa::traits::PublicKeyParts;
use rsa::BigUint;

use crate::num_padding::{parse_fixed, ToBytesPadded};
use crate::{BlindMessage, BlindSignature, Error, Options, SecretKey};

/// Computes `b^d mod n`.
///
/// The exponentiation goes through the RSA backend's private-key path, which
/// uses the CRT parameters and blinds the base with `rng` internally, then
/// checks the result against the public exponent.
pub fn sign<R: CryptoRng + RngCore>(
    rng: &mut R,
    key: &SecretKey,
    b: &BigUint,
) -> Result<BigUint, Error> {
    let key = key.inner();
    if b >= key.n() {
        return Err(Error::InvalidRange);
    }
    rsa_decrypt_and_check(key, Some(rng), b).map_err(|_| Error::InternalError)
}

impl SecretKey {
    /// Sign a blinded message
    ///
    /// Any value below the modulus is signed: what may be signed, and for whom,
    /// is decided by the caller.
    pub fn blind_sign<R: CryptoRng + RngCore>(
        &self,
        rng: &mut R,
        blind_msg: &BlindMessage,
        _options: &Options,
    ) -> Result<BlindSignature, Error> {
        let modulus_bytes = self.inner().size();
        let b = parse_fixed(blind_msg, modulus_bytes)?;
        let blind_sig = sign(rng, self, &b)?;
        Ok(BlindSignature(blind_sig.to_bytes_be_padded(modulus_bytes)))
    }
}
