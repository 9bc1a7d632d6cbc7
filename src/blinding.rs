use std::fmt;
use std::mem;

use num_integer::Integer;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};
use rsa::traits::PublicKeyParts;
use rsa::BigUint;
use tracing::warn;
use zeroize::{Zeroize, Zeroizing};

use crate::message_digest::{digest, Digest};
use crate::num_padding::{parse_fixed, ToBytesPadded};
use crate::verifier::verify;
use crate::{
    BlindMessage, BlindSignature, BlindingResult, Error, Options, PublicKey, Signature,
};

/// Draws of a single candidate factor before the sampler gives up. Each draw
/// lands in `[2, n)` with probability above one half.
const MAX_SAMPLE_DRAWS: usize = 128;

/// The requester's per-exchange secret `r`, with `gcd(r, n) = 1`.
///
/// Zeroized on drop. Neither `Clone` nor serializable.
pub struct BlindingFactor(BigUint);

impl BlindingFactor {
    /// Rebuilds a factor from its big-endian encoding.
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        BlindingFactor(BigUint::from_bytes_be(bytes))
    }
}

impl fmt::Debug for BlindingFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BlindingFactor(..)")
    }
}

impl Drop for BlindingFactor {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Blinds a digest for the holder of `key`.
///
/// Draws `r` uniformly from `[2, n - 1]` until it is invertible modulo `n`,
/// at most `max_attempts` times, and returns `v * r^e mod n` with `r`.
pub fn blind<R: CryptoRng + RngCore>(
    rng: &mut R,
    key: &PublicKey,
    v: &Digest,
    max_attempts: usize,
) -> Result<(BigUint, BlindingFactor), Error> {
    // (v * r^e)^d = v^d * r mod n, so the signer's output carries a single
    // factor of r that unblind() removes with r^-1.
    let n = key.n();
    if v.value() >= n {
        return Err(Error::DigestTooLarge);
    }
    for attempt in 1..=max_attempts {
        let r = sample_factor(rng, n)?;
        if r.gcd(n).is_one() {
            let blinded = (v.value() * r.modpow(key.e(), n)) % n;
            return Ok((blinded, BlindingFactor(r)));
        }
        drop(BlindingFactor(r));
        warn!(attempt, "discarding non-invertible blinding factor");
    }
    Err(Error::BlindingFactor)
}

/// Removes the blinding factor from a blind signature, returning `s' * r^-1 mod n`.
///
/// The factor is consumed. It must lie in `[2, n)`, and is rejected with
/// [`Error::NotInvertible`] unless `gcd(r, n) = 1`, however it was obtained.
pub fn unblind(
    key: &PublicKey,
    blind_sig: &BigUint,
    factor: BlindingFactor,
) -> Result<BigUint, Error> {
    let n = key.n();
    if blind_sig >= n || &factor.0 >= n || factor.0 < BigUint::from(2u8) {
        return Err(Error::InvalidRange);
    }
    let r_inv = Zeroizing::new(mod_inverse(&factor.0, n).ok_or(Error::NotInvertible)?);
    Ok((blind_sig * &*r_inv) % n)
}

impl PublicKey {
    /// Blind a message to be signed
    ///
    /// The result must stay with the requester; only `blind_msg` goes to the signer.
    pub fn blind<R: CryptoRng + RngCore>(
        &self,
        rng: &mut R,
        msg: impl AsRef<[u8]>,
        options: &Options,
    ) -> Result<BlindingResult, Error> {
        let v = digest(msg, self.n(), options.hash)?;
        let (blinded, factor) = blind(rng, self, &v, options.max_blinding_attempts)?;
        Ok(BlindingResult {
            blind_msg: BlindMessage(blinded.to_bytes_be_padded(self.modulus_bytes())),
            factor,
            params: self.public_params(),
        })
    }

    /// Compute a valid signature for the original message given a blindly signed message
    ///
    /// Consumes the blinding result. The new signature is verified before it is returned.
    pub fn finalize(
        &self,
        blind_sig: &BlindSignature,
        result: BlindingResult,
        msg: impl AsRef<[u8]>,
        options: &Options,
    ) -> Result<Signature, Error> {
        let BlindingResult { factor, params, .. } = result;
        if params != self.public_params() {
            warn!("blinding result was produced under another public key");
            return Err(Error::KeyMismatch);
        }
        let modulus_bytes = self.modulus_bytes();
        let blind_sig = parse_fixed(blind_sig, modulus_bytes)?;
        let s = unblind(self, &blind_sig, factor)?;

        let v = digest(msg, self.n(), options.hash)?;
        if !verify(self, &s, &v)? {
            warn!("unblinded signature does not verify");
            return Err(Error::VerificationFailed);
        }
        Ok(Signature(s.to_bytes_be_padded(modulus_bytes)))
    }
}

/// Uniform sample from `[2, n - 1]` by rejection.
fn sample_factor<R: CryptoRng + RngCore>(rng: &mut R, n: &BigUint) -> Result<BigUint, Error> {
    let bits = n.bits();
    let len = (bits + 7) / 8;
    let top_mask = 0xffu8 >> (len * 8 - bits);
    let two = BigUint::from(2u8);
    let mut bytes = Zeroizing::new(vec![0u8; len]);
    for _ in 0..MAX_SAMPLE_DRAWS {
        rng.fill_bytes(&mut bytes);
        bytes[0] &= top_mask;
        let mut r = BigUint::from_bytes_be(&bytes);
        if r >= two && &r < n {
            return Ok(r);
        }
        r.zeroize();
    }
    Err(Error::BlindingFactor)
}

/// Magnitude and sign (`true` for negative) of a Bezout coefficient
type Signed = (BigUint, bool);

fn signed_sub((a, a_neg): &Signed, (b, b_neg): &Signed) -> Signed {
    if a_neg != b_neg {
        (a + b, *a_neg)
    } else if a >= b {
        (a - b, *a_neg)
    } else {
        (b - a, !*a_neg)
    }
}

/// Modular inverse of `a` modulo `m` by the extended Euclidean algorithm.
///
/// Returns `None` when `gcd(a, m) != 1`.
pub(crate) fn mod_inverse(a: &BigUint, m: &BigUint) -> Option<BigUint> {
    if m.is_zero() {
        return None;
    }
    let mut old_r = m.clone();
    let mut r = a % m;
    // Coefficients of `a`: old_t * a = old_r (mod m) at every step.
    let mut old_t: Signed = (BigUint::zero(), false);
    let mut t: Signed = (BigUint::one(), false);

    while !r.is_zero() {
        let (q, rem) = old_r.div_rem(&r);
        old_r = mem::replace(&mut r, rem);
        let qt = (&q * &t.0, t.1);
        let next = signed_sub(&old_t, &qt);
        old_t = mem::replace(&mut t, next);
    }

    if !old_r.is_one() {
        return None;
    }
    let (mag, neg) = old_t;
    let mag = mag % m;
    if neg && !mag.is_zero() {
        Some(m - mag)
    } else {
        Some(mag)
    }
}
