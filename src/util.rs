// SPDX-FileCopyrightText: 2022 David Ruescas <david@sequentech.io>
//
// SPDX-License-Identifier: AGPL-3.0-only
use num_bigint::{BigUint, RandBigInt};
use num_traits::One;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

use crate::codec;
use crate::context::BigintCtx;
use crate::elgamal::Ciphertext;
use crate::rnd::SeleneRngCore;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::IntoParallelIterator;
        use rayon::prelude::*;
        use std::iter::IntoIterator;


        pub trait Par<I: IntoIterator + IntoParallelIterator> {
            fn par(self) -> <I as rayon::iter::IntoParallelIterator>::Iter;
        }

        impl<I: IntoIterator + IntoParallelIterator> Par<I> for I {
            #[inline(always)]
            fn par(self) -> <I as rayon::iter::IntoParallelIterator>::Iter {
                self.into_par_iter()
            }
        }

    } else {
        pub trait Par<I: IntoIterator> {
            fn par(self) -> I::IntoIter;
        }

        impl<I: IntoIterator> Par<I> for I {
            #[inline(always)]
            fn par(self) -> I::IntoIter {
                self.into_iter()
            }
        }
    }
}

/// Digests available for Fiat-Shamir challenges and signatures, selected by
/// the bit length of the group order they must match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    pub fn for_bits(bits: u64) -> DigestAlgorithm {
        match bits {
            0..=224 => DigestAlgorithm::Sha224,
            225..=256 => DigestAlgorithm::Sha256,
            257..=384 => DigestAlgorithm::Sha384,
            _ => DigestAlgorithm::Sha512,
        }
    }

    pub fn output_bits(&self) -> u64 {
        match self {
            DigestAlgorithm::Sha224 => 224,
            DigestAlgorithm::Sha256 => 256,
            DigestAlgorithm::Sha384 => 384,
            DigestAlgorithm::Sha512 => 512,
        }
    }

    pub fn digest(&self, bytes: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Sha224 => Sha224::digest(bytes).to_vec(),
            DigestAlgorithm::Sha256 => Sha256::digest(bytes).to_vec(),
            DigestAlgorithm::Sha384 => Sha384::digest(bytes).to_vec(),
            DigestAlgorithm::Sha512 => Sha512::digest(bytes).to_vec(),
        }
    }

    /// Digest interpreted as an unsigned integer and cut down to its leftmost
    /// `bits` bits when the digest is wider.
    pub fn digest_to_integer(&self, bytes: &[u8], bits: u64) -> BigUint {
        let num = BigUint::from_bytes_be(&self.digest(bytes));
        let output = self.output_bits();
        if output > bits {
            num >> (output - bits)
        } else {
            num
        }
    }
}

/// Fiat-Shamir challenge over an ordered list of integers.
///
/// Each value is framed with a 4 byte big-endian length so that distinct
/// transcripts never collide by concatenation.
pub fn hash_to_integer(values: &[&BigUint], bits: u64) -> BigUint {
    let mut bytes: Vec<u8> = vec![];
    for value in values {
        codec::write_integer(&mut bytes, value);
    }

    DigestAlgorithm::for_bits(bits).digest_to_integer(&bytes, bits)
}

/// Uniform integer in `[min, max]`.
pub fn random_residue(rng: &mut dyn SeleneRngCore, min: &BigUint, max: &BigUint) -> BigUint {
    let upper = max + BigUint::one();
    rng.gen_biguint_range(min, &upper)
}

pub fn random_ciphertexts(n: usize, ctx: &BigintCtx) -> Vec<Ciphertext> {
    (0..n)
        .par()
        .map(|_| Ciphertext {
            alpha: ctx.rnd(),
            beta: ctx.rnd(),
        })
        .collect()
}

pub const SELENE_HASH_LENGTH_BYTES: usize = 64;

pub fn hash(bytes: &[u8]) -> Vec<u8> {
    let mut hasher = hasher();
    hasher.update(bytes);
    hasher.finalize().to_vec()
}
pub fn hasher() -> Sha512 {
    Sha512::new()
}
