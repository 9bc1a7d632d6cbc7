//! Signer key material and the public parameters published for it.

use std::convert::TryFrom;
use std::fmt;

use derive_more::*;
use num_integer::Integer;
use num_traits::One;
use rand::{CryptoRng, RngCore};
use rsa::pkcs8::{DecodePublicKey as _, EncodePublicKey as _, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::blinding::mod_inverse;
use crate::primes::generate_prime;
use crate::{Error, Options};

/// Smallest accepted modulus, in bits
pub const MIN_MODULUS_BITS: usize = 1024;
/// Largest accepted modulus, in bits
pub const MAX_MODULUS_BITS: usize = 4096;
/// Public exponent used for generated keys
pub const DEFAULT_PUBLIC_EXPONENT: u32 = 65537;

/// An RSA public key
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, AsRef, Deref, From, Into, new)]
pub struct PublicKey(pub RsaPublicKey);

/// An RSA secret key
///
/// The private exponent is only ever used by [`SecretKey::blind_sign`].
#[derive(Clone)]
pub struct SecretKey(RsaPrivateKey);

/// An RSA key pair
#[derive(Clone, Debug, From, Into, new)]
pub struct KeyPair {
    pub pk: PublicKey,
    pub sk: SecretKey,
}

/// Public verification parameters `(n, e)`
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublicParams {
    n: BigUint,
    e: BigUint,
}

fn check_rsa_parameters(n: &BigUint, e: &BigUint) -> Result<(), Error> {
    let modulus_bits = n.bits();
    if !(MIN_MODULUS_BITS..=MAX_MODULUS_BITS).contains(&modulus_bits) {
        return Err(Error::UnsupportedParameters);
    }
    let e3 = BigUint::from(3u32);
    let ef4 = BigUint::from(DEFAULT_PUBLIC_EXPONENT);
    if ![e3, ef4].contains(e) {
        return Err(Error::UnsupportedParameters);
    }
    Ok(())
}

impl KeyPair {
    /// Generate a new key pair with `e = 65537`
    pub fn generate<R: CryptoRng + RngCore>(
        rng: &mut R,
        modulus_bits: usize,
        options: &Options,
    ) -> Result<KeyPair, Error> {
        if !(MIN_MODULUS_BITS..=MAX_MODULUS_BITS).contains(&modulus_bits) || modulus_bits % 16 != 0
        {
            return Err(Error::UnsupportedParameters);
        }
        let prime_bits = modulus_bits / 2;
        let e = BigUint::from(DEFAULT_PUBLIC_EXPONENT);

        let (p, p_tried) = generate_prime(rng, prime_bits, &e, options.max_prime_candidates)?;
        // A draw repeating `p` still counts against the budget for `q`.
        let mut q_tried = 0;
        let q = loop {
            let budget = options.max_prime_candidates.saturating_sub(q_tried);
            let (q, tried) = generate_prime(rng, prime_bits, &e, budget)?;
            q_tried += tried;
            if q != p {
                break q;
            }
        };

        let n = &p * &q;
        if n.bits() != modulus_bits {
            return Err(Error::KeyGeneration);
        }
        let one = BigUint::one();
        let lambda = (&p - &one).lcm(&(&q - &one));
        let d = mod_inverse(&e, &lambda).ok_or(Error::KeyGeneration)?;

        let sk = SecretKey::from_components(n, e, d, vec![p, q])
            .map_err(|_| Error::KeyGeneration)?;
        let pk = sk.public_key()?;
        debug!(
            modulus_bits,
            candidates = p_tried + q_tried,
            "generated RSA key pair"
        );
        Ok(KeyPair { pk, sk })
    }
}

impl PublicParams {
    pub fn n(&self) -> &BigUint {
        &self.n
    }

    pub fn e(&self) -> &BigUint {
        &self.e
    }

    /// Length of every value exchanged under these parameters
    pub fn modulus_bytes(&self) -> usize {
        (self.n.bits() + 7) / 8
    }

    /// Serializes as `len(n) || n || len(e) || e`, lengths as 32-bit big-endian.
    pub fn to_bytes(&self) -> Vec<u8> {
        let n = self.n.to_bytes_be();
        let e = self.e.to_bytes_be();
        let mut out = Vec::with_capacity(8 + n.len() + e.len());
        for part in [&n, &e] {
            out.extend_from_slice(&(part.len() as u32).to_be_bytes());
            out.extend_from_slice(part);
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let (n, rest) = read_prefixed(bytes)?;
        let (e, rest) = read_prefixed(rest)?;
        if !rest.is_empty() {
            return Err(Error::EncodingError);
        }
        let (n, e) = (BigUint::from_bytes_be(n), BigUint::from_bytes_be(e));
        check_rsa_parameters(&n, &e)?;
        Ok(PublicParams { n, e })
    }
}

fn read_prefixed(bytes: &[u8]) -> Result<(&[u8], &[u8]), Error> {
    if bytes.len() < 4 {
        return Err(Error::EncodingError);
    }
    let (len, rest) = bytes.split_at(4);
    let len = u32::from_be_bytes(<[u8; 4]>::try_from(len).map_err(|_| Error::EncodingError)?);
    let len = len as usize;
    if len == 0 || len > rest.len() || len > MAX_MODULUS_BITS / 8 {
        return Err(Error::EncodingError);
    }
    Ok(rest.split_at(len))
}

impl PublicKey {
    pub fn public_params(&self) -> PublicParams {
        PublicParams {
            n: self.0.n().clone(),
            e: self.0.e().clone(),
        }
    }

    pub fn from_params(params: &PublicParams) -> Result<Self, Error> {
        check_rsa_parameters(&params.n, &params.e)?;
        let inner = RsaPublicKey::new(params.n.clone(), params.e.clone())
            .map_err(|_| Error::InvalidKey)?;
        Ok(PublicKey(inner))
    }

    /// Length of every value exchanged under this key
    pub fn modulus_bytes(&self) -> usize {
        self.0.size()
    }

    pub fn to_der(&self) -> Result<Vec<u8>, Error> {
        self.0
            .to_public_key_der()
            .map_err(|_| Error::EncodingError)
            .map(|x| x.as_ref().to_vec())
    }

    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        if der.len() > 800 {
            return Err(Error::EncodingError);
        }
        let pk = PublicKey(RsaPublicKey::from_public_key_der(der).map_err(|_| Error::EncodingError)?);
        check_rsa_parameters(pk.0.n(), pk.0.e())?;
        Ok(pk)
    }

    pub fn to_pem(&self) -> Result<String, Error> {
        self.0
            .to_public_key_pem(LineEnding::LF)
            .map_err(|_| Error::EncodingError)
    }

    pub fn from_pem(pem: &str) -> Result<Self, Error> {
        if pem.len() > 1000 {
            return Err(Error::EncodingError);
        }
        let pk = PublicKey(
            RsaPublicKey::from_public_key_pem(pem.trim()).map_err(|_| Error::EncodingError)?,
        );
        check_rsa_parameters(pk.0.n(), pk.0.e())?;
        Ok(pk)
    }
}

impl SecretKey {
    /// Imports a key from its components, validating them
    pub fn from_components(
        n: BigUint,
        e: BigUint,
        d: BigUint,
        primes: Vec<BigUint>,
    ) -> Result<Self, Error> {
        check_rsa_parameters(&n, &e)?;
        let mut sk =
            RsaPrivateKey::from_components(n, e, d, primes).map_err(|_| Error::InvalidKey)?;
        sk.validate().map_err(|_| Error::InvalidKey)?;
        sk.precompute().map_err(|_| Error::InvalidKey)?;
        Ok(SecretKey(sk))
    }

    pub fn public_key(&self) -> Result<PublicKey, Error> {
        Ok(PublicKey(RsaPublicKey::from(&self.0)))
    }

    pub(crate) fn inner(&self) -> &RsaPrivateKey {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("n", self.0.n())
            .field("e", self.0.e())
            .finish_non_exhaustive()
    }
}

/// 1024-bit key pair shared by the unit tests
#[cfg(test)]
pub(crate) fn test_key_pair() -> &'static KeyPair {
    static KP: std::sync::OnceLock<KeyPair> = std::sync::OnceLock::new();
    KP.get_or_init(|| {
        KeyPair::generate(&mut rand::thread_rng(), 1024, &Options::default()).unwrap()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::traits::{PrivateKeyParts as _, PublicKeyParts as _};

    #[test]
    fn generated_key_has_requested_size() {
        let kp = test_key_pair();
        assert_eq!(kp.pk.n().bits(), 1024);
        assert_eq!(kp.pk.modulus_bytes(), 128);
        assert_eq!(kp.pk.e(), &BigUint::from(DEFAULT_PUBLIC_EXPONENT));
    }

    #[test]
    fn private_exponent_inverts_public_exponent() {
        let sk = test_key_pair().sk.inner();
        let primes = sk.primes();
        assert_eq!(primes.len(), 2);
        assert_eq!(&primes[0] * &primes[1], *sk.n());
        let one = BigUint::one();
        let lambda = (&primes[0] - &one).lcm(&(&primes[1] - &one));
        assert!((sk.e() * sk.d() % &lambda).is_one());
    }

    #[test]
    fn unsupported_sizes_are_rejected() {
        let mut rng = rand::thread_rng();
        let options = Options::default();
        for bits in [512, 1000, 8192] {
            assert_eq!(
                KeyPair::generate(&mut rng, bits, &options).unwrap_err(),
                Error::UnsupportedParameters
            );
        }
    }

    #[test]
    fn exhausted_prime_budget_is_a_key_generation_error() {
        let options = Options {
            max_prime_candidates: 0,
            ..Options::default()
        };
        assert_eq!(
            KeyPair::generate(&mut rand::thread_rng(), 1024, &options).unwrap_err(),
            Error::KeyGeneration
        );
    }

    #[test]
    fn public_params_encoding() {
        let pk = &test_key_pair().pk;
        let params = pk.public_params();
        let bytes = params.to_bytes();
        assert_eq!(&bytes[..4], &128u32.to_be_bytes());
        assert_eq!(&bytes[bytes.len() - 7..], &[0, 0, 0, 3, 1, 0, 1]);

        let decoded = PublicParams::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, params);
        assert_eq!(&PublicKey::from_params(&decoded).unwrap(), pk);
    }

    #[test]
    fn malformed_public_params_are_rejected() {
        let bytes = test_key_pair().pk.public_params().to_bytes();
        assert_eq!(
            PublicParams::from_bytes(&bytes[..bytes.len() - 1]),
            Err(Error::EncodingError)
        );
        let mut trailing = bytes.clone();
        trailing.push(0);
        assert_eq!(PublicParams::from_bytes(&trailing), Err(Error::EncodingError));
        assert_eq!(PublicParams::from_bytes(&[0, 0]), Err(Error::EncodingError));
    }

    #[test]
    fn unusual_exponent_is_rejected() {
        let params = test_key_pair().pk.public_params();
        let mut bytes = params.to_bytes();
        let last = bytes.len() - 1;
        bytes[last] = 0x03;
        assert_eq!(PublicParams::from_bytes(&bytes), Err(Error::UnsupportedParameters));
    }

    #[test]
    fn der_and_pem_encoding() {
        let pk = &test_key_pair().pk;
        let der = pk.to_der().unwrap();
        assert_eq!(&PublicKey::from_der(&der).unwrap(), pk);
        let pem = pk.to_pem().unwrap();
        assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----"));
        assert_eq!(&PublicKey::from_pem(&pem).unwrap(), pk);
    }

    #[test]
    fn secret_key_debug_hides_private_parts() {
        let sk = &test_key_pair().sk;
        let d = sk.inner().d().to_string();
        assert!(!format!("{:?}", sk).contains(&d));
    }
}
