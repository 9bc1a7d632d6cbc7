use rsa::traits::PublicKeyParts;
use rsa::BigUint;
use tracing::debug;

use crate::message_digest::{digest, Digest};
use crate::num_padding::parse_fixed;
use crate::{Error, Options, PublicKey, Signature};

/// Checks `s^e mod n == v`.
///
/// A mismatch is `Ok(false)`. Only inputs outside `[0, n)` are errors.
pub fn verify(key: &PublicKey, s: &BigUint, v: &Digest) -> Result<bool, Error> {
    let n = key.n();
    if s >= n || v.value() >= n {
        return Err(Error::InvalidRange);
    }
    Ok(&s.modpow(key.e(), n) == v.value())
}

impl PublicKey {
    /// Verify a (non-blind) signature for the original message
    ///
    /// The signature must be exactly as long as the modulus.
    pub fn verify(
        &self,
        sig: &Signature,
        msg: impl AsRef<[u8]>,
        options: &Options,
    ) -> Result<bool, Error> {
        let v = digest(msg, self.n(), options.hash)?;
        let s = parse_fixed(sig, self.modulus_bytes())?;
        let valid = verify(self, &s, &v)?;
        if !valid {
            debug!("signature does not match the message digest");
        }
        Ok(valid)
    }
}
