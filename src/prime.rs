// SPDX-FileCopyrightText: 2022 David Ruescas <david@sequentech.io>
//
// SPDX-License-Identifier: AGPL-3.0-only
//! Prime and group parameter generation.
//!
//! Probable primes are established with Miller-Rabin using
//! `ceil(certainty / 2)` rounds, so that a composite passes with probability
//! at most `2^-certainty`.
use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{CryptographyError, Result};
use crate::progress::{Progress, ProgressListener};
use crate::rnd::SeleneRngCore;
use crate::util::random_residue;

const SMALL_PRIMES: [u32; 54] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89,
    97, 101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191,
    193, 197, 199, 211, 223, 227, 229, 233, 239, 241, 251,
];

/// `(L, N)` pairs accepted by FIPS 186-4 section 4.2.
pub const FIPS_LENGTHS: [(u32, u32); 4] = [(1024, 160), (2048, 224), (2048, 256), (3072, 256)];

const SHA256_OUTLEN: u32 = 256;

pub fn rounds(certainty: u32) -> u32 {
    std::cmp::max(1, (certainty + 1) / 2)
}

fn small_remainder(n: &BigUint, divisor: u32) -> u32 {
    (n % divisor).to_u32().unwrap_or(0)
}

pub fn is_probable_prime(rng: &mut dyn SeleneRngCore, n: &BigUint, certainty: u32) -> bool {
    let two = BigUint::from(2u32);
    if n < &two {
        return false;
    }
    for prime in SMALL_PRIMES {
        if n == &BigUint::from(prime) {
            return true;
        }
        if small_remainder(n, prime) == 0 {
            return false;
        }
    }

    miller_rabin(rng, n, rounds(certainty))
}

fn miller_rabin(rng: &mut dyn SeleneRngCore, n: &BigUint, rounds: u32) -> bool {
    let one = BigUint::one();
    let two = BigUint::from(2u32);
    let n_minus_one = n - &one;
    let n_minus_two = n - &two;

    let mut d = n_minus_one.clone();
    let mut s = 0u32;
    while d.is_even() {
        d >>= 1;
        s += 1;
    }

    'witness: for _ in 0..rounds {
        let a = random_residue(rng, &two, &n_minus_two);
        let mut x = a.modpow(&d, n);
        if x == one || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'witness;
            }
            if x == one {
                return false;
            }
        }
        return false;
    }

    true
}

/// Returns `(p, q)` with `p = 2q + 1` both prime and `p` exactly `bits` long.
pub fn safe_prime(
    rng: &mut dyn SeleneRngCore,
    bits: u32,
    certainty: u32,
    progress: &dyn ProgressListener,
) -> Result<(BigUint, BigUint)> {
    if bits < 16 {
        return Err(CryptographyError::malformed(format!(
            "safe prime length {} is too short",
            bits
        )));
    }
    let top = BigUint::one() << (bits - 2);
    let mut attempts: u64 = 0;

    loop {
        attempts += 1;
        let q = rng.gen_biguint(u64::from(bits - 1)) | &top | BigUint::one();
        if !sieve_safe(&q) {
            continue;
        }
        let p: BigUint = (&q << 1) + 1u32;

        // cheap single round on both before the full test
        if !miller_rabin(rng, &q, 1)
            || !miller_rabin(rng, &p, 1)
            || !is_probable_prime(rng, &q, certainty)
            || !is_probable_prime(rng, &p, certainty)
        {
            progress.on_progress(Progress::CandidateRejected);
            continue;
        }

        debug!("safe prime of {} bits found after {} candidates", bits, attempts);
        return Ok((p, q));
    }
}

// q and 2q + 1 must both avoid every small prime factor
fn sieve_safe(q: &BigUint) -> bool {
    SMALL_PRIMES.iter().all(|&prime| {
        let r = small_remainder(q, prime);
        r != 0 && (2 * r + 1) % prime != 0
    })
}

/// Generates `(p, q)` following FIPS 186-4 A.1.1.2 with SHA-256.
pub fn fips_186_4(
    rng: &mut dyn SeleneRngCore,
    l: u32,
    n: u32,
    certainty: u32,
    progress: &dyn ProgressListener,
) -> Result<(BigUint, BigUint)> {
    if !FIPS_LENGTHS.contains(&(l, n)) {
        return Err(CryptographyError::malformed(format!(
            "(L, N) = ({}, {}) is not an approved pair",
            l, n
        )));
    }
    let blocks = (l + SHA256_OUTLEN - 1) / SHA256_OUTLEN - 1;
    let b = l - 1 - blocks * SHA256_OUTLEN;
    let seed_bytes = (n / 8) as usize;

    let one = BigUint::one();
    let two_n1 = &one << (n - 1);
    let two_seedlen = &one << n;
    let two_b = &one << b;
    let two_l1 = &one << (l - 1);

    loop {
        let mut seed = vec![0u8; seed_bytes];
        rng.fill_bytes(&mut seed);
        let domain = BigUint::from_bytes_be(&seed);

        let u = BigUint::from_bytes_be(&Sha256::digest(&seed)) % &two_n1;
        let q = &two_n1 + &u + &one - (&u % 2u32);
        if !is_probable_prime(rng, &q, certainty) {
            progress.on_progress(Progress::CandidateRejected);
            continue;
        }

        let mut offset: u32 = 1;
        for counter in 0..(4 * l) {
            let mut w = BigUint::zero();
            for j in 0..=blocks {
                let input = (&domain + offset + j) % &two_seedlen;
                let v = BigUint::from_bytes_be(&Sha256::digest(fixed_width(&input, seed_bytes)));
                let v = if j == blocks { v % &two_b } else { v };
                w += v << (j * SHA256_OUTLEN);
            }
            let x = w + &two_l1;
            let c = &x % (&q << 1);
            let p = x + &one - c;

            if p >= two_l1 && is_probable_prime(rng, &p, certainty) {
                debug!("fips 186-4 ({}, {}) parameters found at counter {}", l, n, counter);
                return Ok((p, q));
            }
            progress.on_progress(Progress::CandidateRejected);
            offset += blocks + 1;
        }
    }
}

fn fixed_width(value: &BigUint, width: usize) -> Vec<u8> {
    let bytes = value.to_bytes_be();
    if bytes.len() >= width {
        return bytes[bytes.len() - width..].to_vec();
    }
    let mut ret = vec![0u8; width - bytes.len()];
    ret.extend(bytes);
    ret
}

/// Unverifiable generator derivation, FIPS 186-4 A.2.1.
pub fn generator(p: &BigUint, q: &BigUint) -> Result<BigUint> {
    let one = BigUint::one();
    let p_minus_one = p - &one;
    let (e, r) = p_minus_one.div_rem(q);
    if !r.is_zero() {
        return Err(CryptographyError::malformed("q does not divide p - 1"));
    }

    let mut h = BigUint::from(2u32);
    while h < p_minus_one {
        let g = h.modpow(&e, p);
        if g != one {
            return Ok(g);
        }
        h += 1u32;
    }

    Err(CryptographyError::malformed("no generator of order q"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::{ctx_256, ctx_512};
    use crate::progress::Silent;
    use crate::rnd::SeleneRng;

    #[test]
    fn test_small_values() {
        let mut rng = SeleneRng;
        let primes = [2u32, 3, 5, 97, 251, 257, 7919, 65537];
        let composites = [0u32, 1, 4, 9, 561, 1105, 65535, 7917];
        for p in primes {
            assert!(is_probable_prime(&mut rng, &BigUint::from(p), 100), "{}", p);
        }
        for c in composites {
            assert!(!is_probable_prime(&mut rng, &BigUint::from(c), 100), "{}", c);
        }
    }

    #[test]
    fn test_large_values() {
        let mut rng = SeleneRng;
        let m127 = (BigUint::one() << 127u32) - 1u32;
        assert!(is_probable_prime(&mut rng, &m127, 100));
        let m128 = (BigUint::one() << 128u32) - 1u32;
        assert!(!is_probable_prime(&mut rng, &m128, 100));

        let ctx = ctx_256();
        assert!(is_probable_prime(&mut rng, ctx.modulus(), 100));
        assert!(is_probable_prime(&mut rng, ctx.exp_modulus(), 100));
        let ctx = ctx_512();
        assert!(is_probable_prime(&mut rng, ctx.modulus(), 100));
        assert!(!is_probable_prime(&mut rng, &(ctx.modulus() * ctx.exp_modulus()), 100));
    }

    #[test]
    fn test_rounds() {
        assert_eq!(rounds(0), 1);
        assert_eq!(rounds(1), 1);
        assert_eq!(rounds(100), 50);
        assert_eq!(rounds(101), 51);
    }

    #[test]
    fn test_safe_prime() {
        let mut rng = SeleneRng;
        let (p, q) = safe_prime(&mut rng, 96, 64, &Silent).unwrap();
        assert_eq!(p.bits(), 96);
        assert_eq!(p, (&q << 1) + 1u32);
        assert!(is_probable_prime(&mut rng, &q, 100));
        assert!(is_probable_prime(&mut rng, &p, 100));
    }

    #[test]
    fn test_generator() {
        let ctx = ctx_256();
        let g = generator(ctx.modulus(), ctx.exp_modulus()).unwrap();
        assert_eq!(g.modpow(ctx.exp_modulus(), ctx.modulus()), BigUint::one());
        assert!(generator(&BigUint::from(23u32), &BigUint::from(5u32)).is_err());
    }

    #[test]
    fn test_rejects_unapproved_lengths() {
        let mut rng = SeleneRng;
        assert!(fips_186_4(&mut rng, 1024, 256, 10, &Silent).is_err());
    }
}
