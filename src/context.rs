// SPDX-FileCopyrightText: 2022 David Ruescas <david@sequentech.io>
//
// SPDX-License-Identifier: AGPL-3.0-only
//! # Examples
//!
//! ```
//! // This example shows how to obtain a context from group parameters.
//! use num_bigint::BigUint;
//! use selene::context::BigintCtx;
//!
//! // p = 2q + 1, 4 is a quadratic residue and thus has order q
//! let p = BigUint::from(2039u32);
//! let q = BigUint::from(1019u32);
//! let g = BigUint::from(4u32);
//! let ctx = BigintCtx::new(p, q, g).unwrap();
//!
//! let a = ctx.rnd_exp();
//! let b = ctx.rnd_exp();
//! let g_ab = ctx.emod_pow(&ctx.gmod_pow(&a), &b);
//! let g_ba = ctx.emod_pow(&ctx.gmod_pow(&b), &a);
//! assert_eq!(g_ab, g_ba);
//! ```
use num_bigint::BigUint;
use num_integer::Integer;
use num_modular::{ModularSymbols, ModularUnaryOps};
use num_traits::{One, Zero};

use crate::error::{CryptographyError, Result};
use crate::rnd::SeleneRng;
use crate::util::{self, random_residue};

/// Arithmetic over the order `q` subgroup of `Z*_p` generated by `g`.
///
/// Elements are residues mod `p`, exponents are residues mod `q`.
#[derive(Eq, PartialEq, Clone, Debug)]
pub struct BigintCtx {
    modulus: BigUint,
    exp_modulus: BigUint,
    generator: BigUint,
    co_factor: BigUint,
}

impl BigintCtx {
    pub fn new(modulus: BigUint, exp_modulus: BigUint, generator: BigUint) -> Result<BigintCtx> {
        let one = BigUint::one();
        if exp_modulus <= one || modulus <= exp_modulus {
            return Err(CryptographyError::malformed("q must satisfy 1 < q < p"));
        }
        let (co_factor, r) = (&modulus - &one).div_rem(&exp_modulus);
        if !r.is_zero() {
            return Err(CryptographyError::malformed("q does not divide p - 1"));
        }
        if generator <= one || generator >= modulus {
            return Err(CryptographyError::malformed("generator out of range"));
        }
        if !generator.modpow(&exp_modulus, &modulus).is_one() {
            return Err(CryptographyError::malformed(
                "generator does not have order q",
            ));
        }

        Ok(BigintCtx {
            modulus,
            exp_modulus,
            generator,
            co_factor,
        })
    }

    #[inline(always)]
    pub fn generator(&self) -> &BigUint {
        &self.generator
    }
    #[inline(always)]
    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }
    #[inline(always)]
    pub fn exp_modulus(&self) -> &BigUint {
        &self.exp_modulus
    }
    #[inline(always)]
    pub fn co_factor(&self) -> &BigUint {
        &self.co_factor
    }
    #[inline(always)]
    pub fn gmod_pow(&self, exponent: &BigUint) -> BigUint {
        self.generator.modpow(exponent, &self.modulus)
    }
    #[inline(always)]
    pub fn emod_pow(&self, base: &BigUint, exponent: &BigUint) -> BigUint {
        base.modpow(exponent, &self.modulus)
    }
    #[inline(always)]
    pub fn mul(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a * b).mod_floor(&self.modulus)
    }

    /// Multiplicative inverse mod `p`. Zero has none and maps to zero, which
    /// makes any check depending on it fail.
    #[inline(always)]
    pub fn inv(&self, element: &BigUint) -> BigUint {
        element.invm(&self.modulus).unwrap_or_else(BigUint::zero)
    }
    #[inline(always)]
    pub fn div(&self, a: &BigUint, b: &BigUint) -> BigUint {
        self.mul(a, &self.inv(b))
    }

    #[inline(always)]
    pub fn exp_add(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a + b).mod_floor(&self.exp_modulus)
    }
    /// `a - b mod q`.
    #[inline(always)]
    pub fn exp_sub(&self, a: &BigUint, b: &BigUint) -> BigUint {
        let b = b.mod_floor(&self.exp_modulus);
        (a + &self.exp_modulus - b).mod_floor(&self.exp_modulus)
    }
    #[inline(always)]
    pub fn exp_mul(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a * b).mod_floor(&self.exp_modulus)
    }
    #[inline(always)]
    pub fn exp_inv(&self, x: &BigUint) -> BigUint {
        x.invm(&self.exp_modulus).unwrap_or_else(BigUint::zero)
    }

    /// Random element of the subgroup.
    pub fn rnd(&self) -> BigUint {
        self.gmod_pow(&self.rnd_exp())
    }

    /// Uniform exponent in `[1, q - 1]`.
    pub fn rnd_exp(&self) -> BigUint {
        let mut rng = SeleneRng;
        let one = BigUint::one();
        random_residue(&mut rng, &one, &(&self.exp_modulus - &one))
    }

    pub fn hash_to_exp(&self, bytes: &[u8]) -> BigUint {
        let hashed = util::hash(bytes);
        BigUint::from_bytes_le(&hashed).mod_floor(&self.exp_modulus)
    }

    /// Maps `plaintext` in `[0, q - 1)` to a quadratic residue mod `p`.
    ///
    /// Only defined for safe prime groups, where the quadratic residues are
    /// exactly the order `q` subgroup.
    pub fn encode(&self, plaintext: &BigUint) -> Result<BigUint> {
        if !self.is_safe_prime_group() {
            return Err(CryptographyError::unsupported("DSA group", "encode"));
        }
        let one = BigUint::one();
        if plaintext >= &(&self.exp_modulus - &one) {
            return Err(CryptographyError::malformed(
                "failed to encode, plaintext out of range",
            ));
        }
        let notzero: BigUint = plaintext + &one;
        let legendre = notzero.legendre(&self.modulus);
        if legendre == 0 {
            return Err(CryptographyError::malformed("failed to encode, legendre = 0"));
        }
        let result = if legendre == 1 {
            notzero
        } else {
            &self.modulus - notzero
        };

        Ok(result.mod_floor(&self.modulus))
    }

    pub fn decode(&self, element: &BigUint) -> BigUint {
        let one = BigUint::one();
        if element > &self.exp_modulus {
            (&self.modulus - element) - one
        } else {
            element - one
        }
    }

    pub fn is_safe_prime_group(&self) -> bool {
        self.co_factor == BigUint::from(2u32)
    }

    /// Whether `element` lies in `[1, p - 1]` and belongs to the order `q`
    /// subgroup.
    pub fn is_valid_element(&self, element: &BigUint) -> bool {
        if element.is_zero() || element >= &self.modulus {
            return false;
        }
        if self.is_safe_prime_group() {
            element.legendre(&self.modulus) == 1
        } else {
            element.modpow(&self.exp_modulus, &self.modulus).is_one()
        }
    }

    /// Independent generators derived from `seed`, see
    /// https://nvlpubs.nist.gov/nistpubs/FIPS/NIST.FIPS.186-4.pdf A.2.3
    pub fn generators(&self, size: usize, label: u32, seed: &[u8]) -> Vec<BigUint> {
        let mut ret = Vec::with_capacity(size);
        let two = BigUint::from(2u32);

        let mut prefix = seed.to_vec();
        prefix.extend("ggen".to_string().into_bytes());
        prefix.extend(label.to_le_bytes());

        let mut index: u64 = 0;
        for _ in 0..size {
            index += 1;
            let mut next = prefix.clone();
            let mut count: u64 = 0;
            loop {
                count += 1;
                next.extend(index.to_le_bytes());
                next.extend(count.to_le_bytes());
                let elem = self.hash_to_element(&next);
                let g = elem.modpow(&self.co_factor, &self.modulus);
                if g >= two {
                    ret.push(g);
                    break;
                }
            }
        }

        ret
    }

    fn hash_to_element(&self, bytes: &[u8]) -> BigUint {
        let hashed = util::hash(bytes);
        BigUint::from_bytes_le(&hashed).mod_floor(&self.modulus)
    }
}
