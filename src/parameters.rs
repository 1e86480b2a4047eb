// SPDX-FileCopyrightText: 2022 David Ruescas <david@sequentech.io>
//
// SPDX-License-Identifier: AGPL-3.0-only
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use std::env::var;

use crate::codec;
use crate::context::BigintCtx;
use crate::error::{CryptographyError, Result};
use crate::prime::is_probable_prime;
use crate::rnd::SeleneRngCore;
use crate::serialization::hex_biguint;
use crate::util;

pub const DEFAULT_DSA_KEY_LENGTH: u32 = 2048;
pub const DEFAULT_DSA_SUBGROUP_LENGTH: u32 = 256;
pub const DEFAULT_ELGAMAL_KEY_LENGTH: u32 = 2048;
pub const DEFAULT_CERTAINTY: u32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParametersKind {
    /// FIPS 186-4 domain parameters, `q` much shorter than `p`.
    Dsa,
    /// Safe prime group, `p = 2q + 1`.
    ElGamal,
}

impl ParametersKind {
    fn tag(&self) -> u8 {
        match self {
            ParametersKind::Dsa => 0,
            ParametersKind::ElGamal => 1,
        }
    }
}

/// Group parameters `(p, q, g)`, immutable once published.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameters {
    pub kind: ParametersKind,
    #[serde(with = "hex_biguint")]
    pub p: BigUint,
    #[serde(with = "hex_biguint")]
    pub q: BigUint,
    #[serde(with = "hex_biguint")]
    pub g: BigUint,
    /// Bit length of `p`.
    pub l: u32,
    /// Bit length of `q`.
    pub m: u32,
}

impl Parameters {
    pub fn new(kind: ParametersKind, p: BigUint, q: BigUint, g: BigUint) -> Parameters {
        let l = p.bits() as u32;
        let m = q.bits() as u32;
        Parameters { kind, p, q, g, l, m }
    }

    pub fn ctx(&self) -> Result<BigintCtx> {
        BigintCtx::new(self.p.clone(), self.q.clone(), self.g.clone())
    }

    /// Checks that `p` and `q` are probable primes, `q | p - 1` and that `g`
    /// generates the order `q` subgroup.
    pub fn validate(&self, rng: &mut dyn SeleneRngCore, certainty: u32) -> Result<()> {
        let one = BigUint::one();
        if self.l as u64 != self.p.bits() || self.m as u64 != self.q.bits() {
            return Err(CryptographyError::Mismatch(format!(
                "declared lengths ({}, {}) do not match ({}, {})",
                self.l,
                self.m,
                self.p.bits(),
                self.q.bits()
            )));
        }
        if !is_probable_prime(rng, &self.p, certainty) {
            return Err(CryptographyError::malformed("p is not prime"));
        }
        if !is_probable_prime(rng, &self.q, certainty) {
            return Err(CryptographyError::malformed("q is not prime"));
        }
        let (co_factor, r) = (&self.p - &one).div_rem(&self.q);
        if !r.is_zero() {
            return Err(CryptographyError::malformed("q does not divide p - 1"));
        }
        if self.kind == ParametersKind::ElGamal && co_factor != BigUint::from(2u32) {
            return Err(CryptographyError::malformed("ElGamal parameters need p = 2q + 1"));
        }
        if self.g <= one || self.g >= self.p {
            return Err(CryptographyError::malformed("g out of range"));
        }
        if !self.g.modpow(&self.q, &self.p).is_one() {
            return Err(CryptographyError::malformed("g does not have order q"));
        }

        Ok(())
    }

    pub(crate) fn write_canonical(&self, out: &mut Vec<u8>) {
        out.push(self.kind.tag());
        codec::write_integer(out, &self.p);
        codec::write_integer(out, &self.q);
        codec::write_integer(out, &self.g);
    }
}

/// Election metadata and its group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionParameters {
    pub name: String,
    pub number_of_tellers: u32,
    pub threshold_tellers: u32,
    pub parameters: Parameters,
}

impl ElectionParameters {
    pub fn new(
        name: &str,
        number_of_tellers: u32,
        threshold_tellers: u32,
        parameters: Parameters,
    ) -> Result<ElectionParameters> {
        if parameters.kind != ParametersKind::ElGamal {
            return Err(CryptographyError::Mismatch(
                "election parameters need an ElGamal group".to_string(),
            ));
        }
        parameters.ctx()?;
        let ret = ElectionParameters {
            name: name.to_string(),
            number_of_tellers,
            threshold_tellers,
            parameters,
        };
        if ret.threshold() > ret.teller_count() {
            return Err(CryptographyError::Mismatch(format!(
                "threshold {} exceeds {} tellers",
                ret.threshold(),
                ret.teller_count()
            )));
        }

        Ok(ret)
    }

    /// Zero tellers means a single local authority.
    pub fn teller_count(&self) -> usize {
        std::cmp::max(1, self.number_of_tellers as usize)
    }

    pub fn threshold(&self) -> usize {
        std::cmp::max(1, self.threshold_tellers as usize)
    }

    pub fn ctx(&self) -> Result<BigintCtx> {
        self.parameters.ctx()
    }

    /// Hash identifying this election in external storage.
    pub fn hash(&self) -> Vec<u8> {
        let mut bytes = vec![];
        let name = self.name.as_bytes();
        bytes.extend((name.len() as u32).to_be_bytes());
        bytes.extend(name);
        bytes.extend(self.number_of_tellers.to_be_bytes());
        bytes.extend(self.threshold_tellers.to_be_bytes());
        self.parameters.write_canonical(&mut bytes);

        util::hash(&bytes)
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash())
    }
}

/// Optional overrides for parameter generation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterOptions {
    pub key_length: Option<u32>,
    pub subgroup_length: Option<u32>,
    pub certainty: Option<u32>,
}

impl ParameterOptions {
    pub fn from_env() -> Result<ParameterOptions> {
        Ok(ParameterOptions {
            key_length: env_u32("SELENE_KEY_LENGTH")?,
            subgroup_length: env_u32("SELENE_SUBGROUP_LENGTH")?,
            certainty: env_u32("SELENE_CERTAINTY")?,
        })
    }

    /// `(L, N)` for DSA domain parameters.
    pub fn dsa_lengths(&self) -> (u32, u32) {
        (
            self.key_length.unwrap_or(DEFAULT_DSA_KEY_LENGTH),
            self.subgroup_length.unwrap_or(DEFAULT_DSA_SUBGROUP_LENGTH),
        )
    }

    pub fn elgamal_length(&self) -> u32 {
        self.key_length.unwrap_or(DEFAULT_ELGAMAL_KEY_LENGTH)
    }

    pub fn certainty(&self) -> u32 {
        self.certainty.unwrap_or(DEFAULT_CERTAINTY)
    }
}

fn env_u32(name: &str) -> Result<Option<u32>> {
    match var(name) {
        Ok(val) => val.trim().parse::<u32>().map(Some).map_err(|e| {
            CryptographyError::malformed(format!("{} must be an unsigned integer: {}", name, e))
        }),
        Err(_e) => Ok(None),
    }
}
