use num_bigint_dig::prime::probably_prime;
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};
use rsa::BigUint;
use zeroize::Zeroizing;

use crate::Error;

/// Small primes for trial division
const SMALL_PRIMES: [u32; 99] = [
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193,
    197, 199, 211, 223, 227, 229, 233, 239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293, 307,
    311, 313, 317, 331, 337, 347, 349, 353, 359, 367, 373, 379, 383, 389, 397, 401, 409, 419, 421,
    431, 433, 439, 443, 449, 457, 461, 463, 467, 479, 487, 491, 499, 503, 509, 521, 523, 541,
];

/// Miller-Rabin rounds with random bases, in addition to a Baillie-PSW test
const MR_ROUNDS: usize = 20;

/// Quick trial division check, for odd candidates far larger than the table
fn passes_trial_division(n: &BigUint) -> bool {
    SMALL_PRIMES
        .iter()
        .all(|&p| !(n % BigUint::from(p)).is_zero())
}

/// Searches for a prime `p` of exactly `bits` bits with its two top bits set
/// and `gcd(e, p - 1) = 1`, testing at most `max_candidates` random candidates.
///
/// Returns the prime with the number of candidates tried.
pub(crate) fn generate_prime<R: CryptoRng + RngCore>(
    rng: &mut R,
    bits: usize,
    e: &BigUint,
    max_candidates: usize,
) -> Result<(BigUint, usize), Error> {
    if bits < 16 || bits % 8 != 0 {
        return Err(Error::UnsupportedParameters);
    }
    let mut bytes = Zeroizing::new(vec![0u8; bits / 8]);
    for tried in 1..=max_candidates {
        rng.fill_bytes(&mut bytes);
        // Two top bits make the product of two such primes exactly 2 * bits wide.
        bytes[0] |= 0xc0;
        bytes[bits / 8 - 1] |= 0x01;
        let candidate = BigUint::from_bytes_be(&bytes);

        if !passes_trial_division(&candidate) {
            continue;
        }
        let p_minus_1 = &candidate - BigUint::one();
        if !p_minus_1.gcd(e).is_one() {
            continue;
        }
        if probably_prime(&candidate, MR_ROUNDS) {
            return Ok((candidate, tried));
        }
    }
    Err(Error::KeyGeneration)
}
