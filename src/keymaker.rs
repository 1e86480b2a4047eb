// SPDX-FileCopyrightText: 2021 David Ruescas <david@sequenttech.io>
//
// SPDX-License-Identifier: AGPL-3.0-only
//! Distributed key generation and threshold decryption between tellers.
//!
//! Every teller deals a Feldman verified polynomial: it publishes the
//! commitments to its coefficients as [`TellerInformation`] and privately
//! sends each other teller a [`TellerShare`]. The election public key is the
//! product of the constant term commitments; a teller's secret is the sum
//! of the shares it received. Any `threshold` tellers jointly decrypt by
//! combining proven decryption factors with Lagrange coefficients.
use borsh::{BorshDeserialize, BorshSerialize};
use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::context::BigintCtx;
use crate::elgamal::Ciphertext;
use crate::error::{CryptographyError, Result};
use crate::keys::KeyPair;
use crate::parameters::ElectionParameters;
use crate::rnd::SeleneRng;
use crate::serialization::{
    hex_biguint, hex_biguint_vec, read_biguint, read_biguints, write_biguint, write_biguints,
};
use crate::threshold;
use crate::util::Par;
use crate::view::{Projection, View};
use crate::zkp::{self, Proof, Statement};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// What a teller publishes in the key generation round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TellerInformation {
    pub teller: usize,
    /// `g^a_k` for every coefficient of the teller's polynomial.
    pub commitments: Vec<BigUint>,
    /// Proof of knowledge of `a_0`.
    pub proof: Proof,
}

/// Evaluation of `source`'s polynomial at `target`, sent privately.
#[derive(Clone, PartialEq, Eq)]
pub struct TellerShare {
    pub source: usize,
    pub target: usize,
    pub value: BigUint,
}

impl std::fmt::Debug for TellerShare {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TellerShare")
            .field("source", &self.source)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Public outcome of key generation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionKeyPair {
    #[serde(with = "hex_biguint")]
    pub public_key: BigUint,
    /// `g^s_j` for teller `j + 1`, used to check its decryption factors.
    #[serde(with = "hex_biguint_vec")]
    pub verification_keys: Vec<BigUint>,
}

/// A teller's share of the election secret.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TellerKeyPair {
    pub teller: usize,
    pub key_pair: KeyPair,
    pub election: ElectionKeyPair,
}

impl Projection for TellerKeyPair {
    fn project(&self, view: View) -> Self {
        TellerKeyPair {
            teller: self.teller,
            key_pair: self.key_pair.project(view),
            election: self.election.clone(),
        }
    }
}

/// Decryption factors `alpha_i^s` of one teller, each with a Chaum-Pedersen
/// proof that it uses the secret behind the teller's verification key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartialDecryption {
    pub teller: usize,
    pub factors: Vec<BigUint>,
    pub proofs: Vec<Proof>,
}

pub struct Teller {
    number: usize,
    teller_count: usize,
    threshold: usize,
    coefficients: Vec<BigUint>,
    commitments: Vec<BigUint>,
    ctx: BigintCtx,
}

impl Teller {
    /// Teller `number`, counted from 1.
    pub fn new(parameters: &ElectionParameters, number: usize) -> Result<Teller> {
        let teller_count = parameters.teller_count();
        check_teller(number, teller_count)?;
        let threshold = parameters.threshold();
        let ctx = parameters.ctx()?;
        let (coefficients, commitments) = threshold::gen_coefficients(threshold, &ctx);

        Ok(Teller {
            number,
            teller_count,
            threshold,
            coefficients,
            commitments,
            ctx,
        })
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn information(&self) -> TellerInformation {
        let ctx = &self.ctx;
        let statement = Statement::new(self.commitments[0].clone(), ctx.generator().clone());
        let proof = zkp::prove(
            &mut SeleneRng,
            ctx.modulus(),
            ctx.exp_modulus(),
            &self.coefficients[0],
            &[statement],
        );

        TellerInformation {
            teller: self.number,
            commitments: self.commitments.clone(),
            proof,
        }
    }

    pub fn share_for(&self, target: usize) -> Result<TellerShare> {
        check_teller(target, self.teller_count)?;
        let value = threshold::eval_poly(target, self.threshold, &self.coefficients, &self.ctx);

        Ok(TellerShare {
            source: self.number,
            target,
            value,
        })
    }

    /// Checks every received share against its dealer's commitments and
    /// derives this teller's key pair.
    pub fn create_election_key_pair(
        &self,
        parameters: &ElectionParameters,
        information: &[TellerInformation],
        shares: &[TellerShare],
    ) -> Result<TellerKeyPair> {
        let election = merge_teller_information(parameters, information)?;
        let ctx = &self.ctx;

        let mut received: BTreeMap<usize, &TellerShare> = BTreeMap::new();
        for share in shares.iter().filter(|s| s.target == self.number) {
            if received.insert(share.source, share).is_some() {
                return Err(CryptographyError::Mismatch(format!(
                    "duplicate share from teller {}",
                    share.source
                )));
            }
        }
        if received.len() != self.teller_count {
            return Err(CryptographyError::TellerCountMismatch {
                expected: self.teller_count,
                found: received.len(),
            });
        }

        let mut secret = BigUint::zero();
        for info in information {
            let share = received.get(&info.teller).ok_or_else(|| {
                CryptographyError::Mismatch(format!("no share from teller {}", info.teller))
            })?;
            let expected =
                threshold::verification_key_factor(&info.commitments, self.threshold, self.number, ctx);
            if ctx.gmod_pow(&share.value) != expected {
                warn!("share from teller {} rejected by teller {}", info.teller, self.number);
                return Err(CryptographyError::Verification(format!(
                    "share from teller {} does not match its commitments",
                    info.teller
                )));
            }
            secret = ctx.exp_add(&secret, &share.value);
        }

        let key_pair = KeyPair::from_private(secret, ctx);
        if key_pair.public_key.as_ref() != Some(&election.verification_keys[self.number - 1]) {
            return Err(CryptographyError::Verification(
                "secret share does not match the verification key".to_string(),
            ));
        }

        Ok(TellerKeyPair {
            teller: self.number,
            key_pair,
            election,
        })
    }
}

fn check_teller(number: usize, teller_count: usize) -> Result<()> {
    if number == 0 || number > teller_count {
        return Err(CryptographyError::Mismatch(format!(
            "teller {} outside 1..={}",
            number, teller_count
        )));
    }
    Ok(())
}

/// Combines the information of all tellers into the election key.
///
/// Exactly one artifact per teller is required.
pub fn merge_teller_information(
    parameters: &ElectionParameters,
    information: &[TellerInformation],
) -> Result<ElectionKeyPair> {
    let teller_count = parameters.teller_count();
    let threshold = parameters.threshold();
    if information.len() != teller_count {
        return Err(CryptographyError::TellerCountMismatch {
            expected: teller_count,
            found: information.len(),
        });
    }
    let mut sorted: Vec<&TellerInformation> = information.iter().collect();
    sorted.sort_by_key(|i| i.teller);
    for (i, info) in sorted.iter().enumerate() {
        if info.teller != i + 1 {
            return Err(CryptographyError::Mismatch(format!(
                "teller information numbers are not 1..={}",
                teller_count
            )));
        }
    }

    let ctx = parameters.ctx()?;
    for info in &sorted {
        if info.commitments.len() != threshold {
            return Err(CryptographyError::malformed(format!(
                "teller {} committed to {} coefficients, expected {}",
                info.teller,
                info.commitments.len(),
                threshold
            )));
        }
        if !info.commitments.iter().all(|c| ctx.is_valid_element(c)) {
            return Err(CryptographyError::malformed(format!(
                "teller {} commitments are not group elements",
                info.teller
            )));
        }
        let statement = Statement::new(info.commitments[0].clone(), ctx.generator().clone());
        if !zkp::verify(ctx.modulus(), ctx.exp_modulus(), &info.proof, &[statement]) {
            warn!("teller {} key proof rejected", info.teller);
            return Err(CryptographyError::Verification(format!(
                "teller {} key proof does not verify",
                info.teller
            )));
        }
    }

    let public_key = sorted
        .iter()
        .fold(BigUint::one(), |acc, info| ctx.mul(&acc, &info.commitments[0]));
    let verification_keys = (1..=teller_count)
        .map(|j| {
            sorted.iter().fold(BigUint::one(), |acc, info| {
                let factor = threshold::verification_key_factor(&info.commitments, threshold, j, &ctx);
                ctx.mul(&acc, &factor)
            })
        })
        .collect();
    info!("merged key information of {} tellers", teller_count);

    Ok(ElectionKeyPair {
        public_key,
        verification_keys,
    })
}

impl TellerKeyPair {
    pub fn decryption_factors(
        &self,
        parameters: &ElectionParameters,
        ciphertexts: &[Ciphertext],
    ) -> Result<PartialDecryption> {
        let ctx = parameters.ctx()?;
        let secret = self.key_pair.private_key()?;
        let verification_key = self.key_pair.public_key()?;

        let (factors, proofs): (Vec<BigUint>, Vec<Proof>) = ciphertexts
            .par()
            .map(|c| {
                let factor = ctx.emod_pow(&c.alpha, secret);
                let statements = [
                    Statement::new(verification_key.clone(), ctx.generator().clone()),
                    Statement::new(factor.clone(), c.alpha.clone()),
                ];
                let proof = zkp::prove(
                    &mut SeleneRng,
                    ctx.modulus(),
                    ctx.exp_modulus(),
                    secret,
                    &statements,
                );
                (factor, proof)
            })
            .unzip();

        Ok(PartialDecryption {
            teller: self.teller,
            factors,
            proofs,
        })
    }
}

pub fn verify_partial_decryption(
    parameters: &ElectionParameters,
    election: &ElectionKeyPair,
    ciphertexts: &[Ciphertext],
    partial: &PartialDecryption,
) -> Result<bool> {
    check_teller(partial.teller, parameters.teller_count())?;
    if partial.factors.len() != ciphertexts.len() || partial.proofs.len() != ciphertexts.len() {
        return Ok(false);
    }
    let verification_key = election
        .verification_keys
        .get(partial.teller - 1)
        .ok_or(CryptographyError::MissingKey("verification key"))?;
    let ctx = parameters.ctx()?;

    let notok = (0..ciphertexts.len())
        .par()
        .map(|i| {
            let statements = [
                Statement::new(verification_key.clone(), ctx.generator().clone()),
                Statement::new(partial.factors[i].clone(), ciphertexts[i].alpha.clone()),
            ];
            zkp::verify(ctx.modulus(), ctx.exp_modulus(), &partial.proofs[i], &statements)
        })
        .any(|x| !x);

    Ok(!notok)
}

/// Threshold decryption from at least `threshold` distinct tellers' factors.
pub fn combine_decryptions(
    parameters: &ElectionParameters,
    election: &ElectionKeyPair,
    ciphertexts: &[Ciphertext],
    partials: &[PartialDecryption],
) -> Result<Vec<BigUint>> {
    let mut by_teller: BTreeMap<usize, &PartialDecryption> = BTreeMap::new();
    for partial in partials {
        if by_teller.contains_key(&partial.teller) {
            continue;
        }
        if !verify_partial_decryption(parameters, election, ciphertexts, partial)? {
            warn!("decryption factors of teller {} rejected", partial.teller);
            return Err(CryptographyError::Verification(format!(
                "decryption factors of teller {} do not verify",
                partial.teller
            )));
        }
        by_teller.insert(partial.teller, partial);
    }
    let threshold = parameters.threshold();
    if by_teller.len() < threshold {
        return Err(CryptographyError::Mismatch(format!(
            "{} partial decryptions present, {} required",
            by_teller.len(),
            threshold
        )));
    }

    let ctx = parameters.ctx()?;
    let present: Vec<usize> = by_teller.keys().copied().collect();
    let lagranges: Vec<BigUint> = present
        .iter()
        .map(|t| threshold::lagrange(*t, &present, &ctx))
        .collect();

    let plaintexts = (0..ciphertexts.len())
        .par()
        .map(|i| {
            let divider = by_teller
                .values()
                .zip(lagranges.iter())
                .fold(BigUint::one(), |acc, (partial, lagrange)| {
                    ctx.mul(&acc, &ctx.emod_pow(&partial.factors[i], lagrange))
                });
            ctx.div(&ciphertexts[i].beta, &divider)
        })
        .collect();

    Ok(plaintexts)
}

impl BorshSerialize for TellerInformation {
    fn serialize<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        BorshSerialize::serialize(&(self.teller as u64), writer)?;
        write_biguints(&self.commitments, writer)?;
        BorshSerialize::serialize(&self.proof, writer)
    }
}

impl BorshDeserialize for TellerInformation {
    fn deserialize(buf: &mut &[u8]) -> std::io::Result<Self> {
        let teller = <u64 as BorshDeserialize>::deserialize(buf)? as usize;
        let commitments = read_biguints(buf)?;
        let proof = <Proof as BorshDeserialize>::deserialize(buf)?;
        Ok(TellerInformation {
            teller,
            commitments,
            proof,
        })
    }
}

impl BorshSerialize for TellerShare {
    fn serialize<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        BorshSerialize::serialize(&(self.source as u64), writer)?;
        BorshSerialize::serialize(&(self.target as u64), writer)?;
        write_biguint(&self.value, writer)
    }
}

impl BorshDeserialize for TellerShare {
    fn deserialize(buf: &mut &[u8]) -> std::io::Result<Self> {
        let source = <u64 as BorshDeserialize>::deserialize(buf)? as usize;
        let target = <u64 as BorshDeserialize>::deserialize(buf)? as usize;
        let value = read_biguint(buf)?;
        Ok(TellerShare {
            source,
            target,
            value,
        })
    }
}

impl BorshSerialize for PartialDecryption {
    fn serialize<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        BorshSerialize::serialize(&(self.teller as u64), writer)?;
        write_biguints(&self.factors, writer)?;
        BorshSerialize::serialize(&self.proofs, writer)
    }
}

impl BorshDeserialize for PartialDecryption {
    fn deserialize(buf: &mut &[u8]) -> std::io::Result<Self> {
        let teller = <u64 as BorshDeserialize>::deserialize(buf)? as usize;
        let factors = read_biguints(buf)?;
        let proofs = <Vec<Proof> as BorshDeserialize>::deserialize(buf)?;
        Ok(PartialDecryption {
            teller,
            factors,
            proofs,
        })
    }
}
