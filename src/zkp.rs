// SPDX-FileCopyrightText: 2021 David Ruescas <david@sequentech.io>
//
// SPDX-License-Identifier: AGPL-3.0-only
//! Fiat-Shamir sigma protocols over `(p, q)`.
//!
//! A [`Proof`] shows knowledge of one witness `w` with `rhs_i^w = lhs_i` for
//! every [`Statement`]. The challenge hashes
//! `t_1..t_n, rhs_1, lhs_1, ..., rhs_n, lhs_n, p, q` into `bits(q)` bits.
#![allow(clippy::too_many_arguments)]
use borsh::{BorshDeserialize, BorshSerialize};
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::algorithm::Algorithm;
use crate::context::BigintCtx;
use crate::error::{CryptographyError, Result};
use crate::parameters::{Parameters, ParametersKind};
use crate::rnd::SeleneRngCore;
use crate::serialization::{
    hex_biguint, hex_biguint_vec, read_biguint, read_biguints, write_biguint, write_biguints,
};
use crate::util::{hash_to_integer, random_residue};

/// An equation `lhs = rhs^witness mod p`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    #[serde(with = "hex_biguint")]
    pub left_hand_side: BigUint,
    #[serde(with = "hex_biguint")]
    pub right_hand_side: BigUint,
}

impl Statement {
    pub fn new(left_hand_side: BigUint, right_hand_side: BigUint) -> Statement {
        Statement {
            left_hand_side,
            right_hand_side,
        }
    }
}

/// Challenge `hash` and response `signature` of a sigma protocol transcript.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Proof {
    #[serde(with = "hex_biguint")]
    pub hash: BigUint,
    #[serde(with = "hex_biguint")]
    pub signature: BigUint,
}

impl BorshSerialize for Proof {
    fn serialize<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        write_biguint(&self.hash, writer)?;
        write_biguint(&self.signature, writer)
    }
}

impl BorshDeserialize for Proof {
    fn deserialize(buf: &mut &[u8]) -> std::io::Result<Self> {
        let hash = read_biguint(buf)?;
        let signature = read_biguint(buf)?;
        Ok(Proof { hash, signature })
    }
}

fn check_preconditions(
    witness: Option<&BigUint>,
    statements: &[Statement],
    single: bool,
) -> Result<()> {
    if witness.is_none() {
        return Err(CryptographyError::ProofPrecondition("missing witness"));
    }
    check_statements(statements, single)
}

fn check_statements(statements: &[Statement], single: bool) -> Result<()> {
    if statements.is_empty() {
        return Err(CryptographyError::ProofPrecondition("no statements"));
    }
    if single && statements.len() > 1 {
        return Err(CryptographyError::ProofPrecondition(
            "Schnorr proofs take exactly one statement",
        ));
    }
    Ok(())
}

fn challenge(p: &BigUint, q: &BigUint, commitments: &[BigUint], statements: &[Statement]) -> BigUint {
    let mut values: Vec<&BigUint> = Vec::with_capacity(commitments.len() + 2 * statements.len() + 2);
    values.extend(commitments.iter());
    for statement in statements {
        values.push(&statement.right_hand_side);
        values.push(&statement.left_hand_side);
    }
    values.push(p);
    values.push(q);

    hash_to_integer(&values, q.bits())
}

pub(crate) fn prove(
    rng: &mut dyn SeleneRngCore,
    p: &BigUint,
    q: &BigUint,
    witness: &BigUint,
    statements: &[Statement],
) -> Proof {
    let one = BigUint::one();
    let k = random_residue(rng, &one, &(q - &one));
    let commitments: Vec<BigUint> = statements
        .iter()
        .map(|s| s.right_hand_side.modpow(&k, p))
        .collect();
    let c = challenge(p, q, &commitments, statements);
    let r = (k + &c * witness).mod_floor(q);

    Proof {
        hash: c,
        signature: r,
    }
}

pub(crate) fn verify(p: &BigUint, q: &BigUint, proof: &Proof, statements: &[Statement]) -> bool {
    let commitments: Vec<BigUint> = statements
        .iter()
        .map(|s| {
            // rhs^r * lhs^-c
            let lhs_inv = s.left_hand_side.modpow(&(p - 2u32), p);
            if lhs_inv.is_zero() {
                return BigUint::zero();
            }
            (s.right_hand_side.modpow(&proof.signature, p) * lhs_inv.modpow(&proof.hash, p))
                .mod_floor(p)
        })
        .collect();
    if commitments.iter().any(|t| t.is_zero()) {
        return false;
    }
    let c = challenge(p, q, &commitments, statements);
    let ok = c == proof.hash;
    if !ok {
        debug!("proof rejected over {} statements", statements.len());
    }

    ok
}

/// Proof of knowledge of a discrete logarithm.
#[derive(Clone, Copy, Debug, Default)]
pub struct Schnorr;

/// Proof of knowledge of one discrete logarithm shared by several
/// statements.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChaumPedersen;

macro_rules! sigma_algorithm {
    ($type:ty, $name:expr, $single:expr) => {
        impl Algorithm for $type {
            fn name(&self) -> &'static str {
                $name
            }

            fn parameters_kind(&self) -> Option<ParametersKind> {
                None
            }

            fn generate_proof(
                &self,
                rng: &mut dyn SeleneRngCore,
                parameters: &Parameters,
                witness: Option<&BigUint>,
                statements: &[Statement],
            ) -> Result<Proof> {
                check_preconditions(witness, statements, $single)?;
                let witness = witness.ok_or(CryptographyError::ProofPrecondition("missing witness"))?;
                Ok(prove(rng, &parameters.p, &parameters.q, witness, statements))
            }

            fn verify_proof(
                &self,
                parameters: &Parameters,
                proof: &Proof,
                statements: &[Statement],
            ) -> Result<bool> {
                check_statements(statements, $single)?;
                Ok(verify(&parameters.p, &parameters.q, proof, statements))
            }
        }
    };
}

sigma_algorithm!(Schnorr, "Schnorr", true);
sigma_algorithm!(ChaumPedersen, "Chaum-Pedersen", false);

/// Disjunctive Chaum-Pedersen proof that `(alpha, beta)` encrypts one of a
/// list of group elements under `pk`, without revealing which one.
///
/// Each branch `j` carries a challenge `c_j` and a response `r_j`; the
/// branch commitments are recomputed as `g^r_j alpha^-c_j` and
/// `pk^r_j (beta / m_j)^-c_j`, and the challenges must add up to the hash of
/// the transcript. Extra values bind the proof to its context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionProof {
    #[serde(with = "hex_biguint_vec")]
    pub challenges: Vec<BigUint>,
    #[serde(with = "hex_biguint_vec")]
    pub responses: Vec<BigUint>,
}

impl BorshSerialize for OptionProof {
    fn serialize<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        write_biguints(&self.challenges, writer)?;
        write_biguints(&self.responses, writer)
    }
}

impl BorshDeserialize for OptionProof {
    fn deserialize(buf: &mut &[u8]) -> std::io::Result<Self> {
        let challenges = read_biguints(buf)?;
        let responses = read_biguints(buf)?;
        Ok(OptionProof {
            challenges,
            responses,
        })
    }
}

impl OptionProof {
    /// Proves that `(alpha, beta) = (g^k, pk^k options[index])`.
    pub fn prove(
        ctx: &BigintCtx,
        pk: &BigUint,
        alpha: &BigUint,
        beta: &BigUint,
        randomness: &BigUint,
        options: &[BigUint],
        index: usize,
        extra: &[&BigUint],
    ) -> Result<OptionProof> {
        if index >= options.len() {
            return Err(CryptographyError::ProofPrecondition(
                "plaintext is not among the options",
            ));
        }
        let n = options.len();
        let mut challenges = vec![BigUint::zero(); n];
        let mut responses = vec![BigUint::zero(); n];
        let mut commitments = Vec::with_capacity(2 * n);

        let w = ctx.rnd_exp();
        for (j, option) in options.iter().enumerate() {
            if j == index {
                commitments.push(ctx.gmod_pow(&w));
                commitments.push(ctx.emod_pow(pk, &w));
            } else {
                let c = ctx.rnd_exp();
                let r = ctx.rnd_exp();
                let (a, b) = Self::branch_commitments(ctx, pk, alpha, beta, option, &c, &r);
                commitments.push(a);
                commitments.push(b);
                challenges[j] = c;
                responses[j] = r;
            }
        }

        let c = Self::challenge(ctx, pk, alpha, beta, options, extra, &commitments);
        let others = challenges
            .iter()
            .fold(BigUint::zero(), |acc, next| ctx.exp_add(&acc, next));
        let c_index = ctx.exp_sub(&c, &others);
        responses[index] = ctx.exp_add(&w, &ctx.exp_mul(&c_index, randomness));
        challenges[index] = c_index;

        Ok(OptionProof {
            challenges,
            responses,
        })
    }

    pub fn verify(
        &self,
        ctx: &BigintCtx,
        pk: &BigUint,
        alpha: &BigUint,
        beta: &BigUint,
        options: &[BigUint],
        extra: &[&BigUint],
    ) -> bool {
        let n = options.len();
        if n == 0 || self.challenges.len() != n || self.responses.len() != n {
            return false;
        }
        let q = ctx.exp_modulus();
        if self.challenges.iter().chain(self.responses.iter()).any(|v| v >= q) {
            return false;
        }
        if !ctx.is_valid_element(alpha) || !ctx.is_valid_element(beta) {
            debug!("option proof over a ciphertext outside the group");
            return false;
        }

        let mut commitments = Vec::with_capacity(2 * n);
        for (j, option) in options.iter().enumerate() {
            let (a, b) = Self::branch_commitments(
                ctx,
                pk,
                alpha,
                beta,
                option,
                &self.challenges[j],
                &self.responses[j],
            );
            commitments.push(a);
            commitments.push(b);
        }
        let c = Self::challenge(ctx, pk, alpha, beta, options, extra, &commitments);
        let sum = self
            .challenges
            .iter()
            .fold(BigUint::zero(), |acc, next| ctx.exp_add(&acc, next));

        sum == c
    }

    fn branch_commitments(
        ctx: &BigintCtx,
        pk: &BigUint,
        alpha: &BigUint,
        beta: &BigUint,
        option: &BigUint,
        c: &BigUint,
        r: &BigUint,
    ) -> (BigUint, BigUint) {
        let a = ctx.div(&ctx.gmod_pow(r), &ctx.emod_pow(alpha, c));
        let quotient = ctx.div(beta, option);
        let b = ctx.div(&ctx.emod_pow(pk, r), &ctx.emod_pow(&quotient, c));

        (a, b)
    }

    fn challenge(
        ctx: &BigintCtx,
        pk: &BigUint,
        alpha: &BigUint,
        beta: &BigUint,
        options: &[BigUint],
        extra: &[&BigUint],
        commitments: &[BigUint],
    ) -> BigUint {
        let mut values: Vec<&BigUint> = vec![
            ctx.modulus(),
            ctx.exp_modulus(),
            ctx.generator(),
            pk,
            alpha,
            beta,
        ];
        values.extend(extra.iter().copied());
        values.extend(options.iter());
        values.extend(commitments.iter());
        let q = ctx.exp_modulus();

        hash_to_integer(&values, q.bits()).mod_floor(q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::ctx_256;
    use crate::elgamal::PrivateKey;
    use crate::error::ErrorKind;
    use crate::parameters::tests::parameters_256;
    use crate::rnd::SeleneRng;

    fn dlog_statement(parameters: &Parameters, base: &BigUint, w: &BigUint) -> Statement {
        Statement::new(base.modpow(w, &parameters.p), base.clone())
    }

    #[test]
    fn test_schnorr() {
        let mut rng = SeleneRng;
        let parameters = parameters_256();
        let ctx = parameters.ctx().unwrap();
        let w = ctx.rnd_exp();
        let statements = vec![dlog_statement(&parameters, &parameters.g, &w)];

        let proof = Schnorr
            .generate_proof(&mut rng, &parameters, Some(&w), &statements)
            .unwrap();
        assert!(Schnorr.verify_proof(&parameters, &proof, &statements).unwrap());

        let mut tampered = proof.clone();
        tampered.signature = ctx.exp_add(&tampered.signature, &BigUint::one());
        assert!(!Schnorr.verify_proof(&parameters, &tampered, &statements).unwrap());

        let other = vec![dlog_statement(&parameters, &parameters.g, &ctx.rnd_exp())];
        assert!(!Schnorr.verify_proof(&parameters, &proof, &other).unwrap());
    }

    #[test]
    fn test_schnorr_preconditions() {
        let mut rng = SeleneRng;
        let parameters = parameters_256();
        let ctx = parameters.ctx().unwrap();
        let w = ctx.rnd_exp();
        let one = vec![dlog_statement(&parameters, &parameters.g, &w)];
        let two = vec![
            dlog_statement(&parameters, &parameters.g, &w),
            dlog_statement(&parameters, &ctx.rnd(), &w),
        ];

        let e = Schnorr
            .generate_proof(&mut rng, &parameters, Some(&w), &two)
            .unwrap_err();
        assert_eq!(e.kind(), ErrorKind::ProofPrecondition);
        let proof = ChaumPedersen
            .generate_proof(&mut rng, &parameters, Some(&w), &two)
            .unwrap();
        let e = Schnorr.verify_proof(&parameters, &proof, &two).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::ProofPrecondition);

        let e = Schnorr
            .generate_proof(&mut rng, &parameters, None, &one)
            .unwrap_err();
        assert_eq!(e.kind(), ErrorKind::ProofPrecondition);
        let e = ChaumPedersen
            .generate_proof(&mut rng, &parameters, Some(&w), &[])
            .unwrap_err();
        assert_eq!(e.kind(), ErrorKind::ProofPrecondition);
        let e = ChaumPedersen
            .verify_proof(&parameters, &proof, &[])
            .unwrap_err();
        assert_eq!(e.kind(), ErrorKind::ProofPrecondition);
    }

    #[test]
    fn test_chaum_pedersen() {
        let mut rng = SeleneRng;
        let parameters = parameters_256();
        let ctx = parameters.ctx().unwrap();
        let w = ctx.rnd_exp();
        let bases = [parameters.g.clone(), ctx.rnd(), ctx.rnd()];

        for count in 1..=bases.len() {
            let statements: Vec<Statement> = bases[0..count]
                .iter()
                .map(|b| dlog_statement(&parameters, b, &w))
                .collect();
            let proof = ChaumPedersen
                .generate_proof(&mut rng, &parameters, Some(&w), &statements)
                .unwrap();
            assert!(ChaumPedersen
                .verify_proof(&parameters, &proof, &statements)
                .unwrap());

            // one wrong statement invalidates the whole proof
            let mut tampered = statements.clone();
            let last = tampered.len() - 1;
            tampered[last].left_hand_side = ctx.mul(&tampered[last].left_hand_side, &parameters.g);
            assert!(!ChaumPedersen
                .verify_proof(&parameters, &proof, &tampered)
                .unwrap());
        }
    }

    #[test]
    fn test_unequal_logs_fail() {
        let mut rng = SeleneRng;
        let parameters = parameters_256();
        let ctx = parameters.ctx().unwrap();
        let w = ctx.rnd_exp();
        let statements = vec![
            dlog_statement(&parameters, &parameters.g, &w),
            dlog_statement(&parameters, &ctx.rnd(), &ctx.rnd_exp()),
        ];
        let proof = ChaumPedersen
            .generate_proof(&mut rng, &parameters, Some(&w), &statements)
            .unwrap();
        assert!(!ChaumPedersen
            .verify_proof(&parameters, &proof, &statements)
            .unwrap());
    }

    #[test]
    fn test_option_proof() {
        let ctx = ctx_256();
        let sk = PrivateKey::gen(&ctx);
        let pk = sk.get_pk();
        let options: Vec<BigUint> = (0u32..4).map(|i| ctx.encode(&BigUint::from(i)).unwrap()).collect();
        let extra_a = ctx.rnd();
        let extra_b = ctx.rnd();
        let extra = [&extra_a, &extra_b];

        for index in 0..options.len() {
            let k = ctx.rnd_exp();
            let c = pk.encrypt_with_randomness(&options[index], &k);
            let proof = OptionProof::prove(
                &ctx,
                pk.element(),
                &c.alpha,
                &c.beta,
                &k,
                &options,
                index,
                &extra,
            )
            .unwrap();
            assert!(proof.verify(&ctx, pk.element(), &c.alpha, &c.beta, &options, &extra));

            // bound to the extra values
            assert!(!proof.verify(&ctx, pk.element(), &c.alpha, &c.beta, &options, &[&extra_b, &extra_a]));
            // and to the ciphertext
            let other = pk.reencrypt(&c, &ctx.rnd_exp());
            assert!(!proof.verify(&ctx, pk.element(), &other.alpha, &other.beta, &options, &extra));
        }
    }

    #[test]
    fn test_option_proof_outside_options() {
        let ctx = ctx_256();
        let sk = PrivateKey::gen(&ctx);
        let pk = sk.get_pk();
        let options: Vec<BigUint> = (0u32..3).map(|i| ctx.encode(&BigUint::from(i)).unwrap()).collect();
        let outside = ctx.encode(&BigUint::from(10u32)).unwrap();
        let k = ctx.rnd_exp();
        let c = pk.encrypt_with_randomness(&outside, &k);

        // a prover claiming branch 0 for a different plaintext is rejected
        let proof =
            OptionProof::prove(&ctx, pk.element(), &c.alpha, &c.beta, &k, &options, 0, &[]).unwrap();
        assert!(!proof.verify(&ctx, pk.element(), &c.alpha, &c.beta, &options, &[]));
        assert!(OptionProof::prove(&ctx, pk.element(), &c.alpha, &c.beta, &k, &options, 3, &[]).is_err());
    }

    #[test]
    fn test_option_proof_rejects_non_members() {
        let ctx = ctx_256();
        let sk = PrivateKey::gen(&ctx);
        let pk = sk.get_pk();
        let options: Vec<BigUint> = (0u32..2).map(|i| ctx.encode(&BigUint::from(i)).unwrap()).collect();
        let minus_one = ctx.modulus() - 1u32;

        // -beta leaves the subgroup, the real branch then only fails for
        // odd challenges
        for _ in 0..8 {
            let k = ctx.rnd_exp();
            let c = pk.encrypt_with_randomness(&options[0], &k);
            let negated = ctx.mul(&c.beta, &minus_one);
            assert!(!ctx.is_valid_element(&negated));
            let proof =
                OptionProof::prove(&ctx, pk.element(), &c.alpha, &negated, &k, &options, 0, &[])
                    .unwrap();
            assert!(!proof.verify(&ctx, pk.element(), &c.alpha, &negated, &options, &[]));
        }

        let k = ctx.rnd_exp();
        let c = pk.encrypt_with_randomness(&options[1], &k);
        let proof =
            OptionProof::prove(&ctx, pk.element(), &c.alpha, &c.beta, &k, &options, 1, &[]).unwrap();
        assert!(!proof.verify(&ctx, pk.element(), &BigUint::zero(), &c.beta, &options, &[]));
    }
}
