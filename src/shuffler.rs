// SPDX-FileCopyrightText: 2021 David Ruescas <david@sequentech.io>
//
// SPDX-License-Identifier: AGPL-3.0-only
//! Verifiable re-encryption shuffle (Wikström / Terelius).
//!
//! In ciphertext terms the proof works on `beta = m h^r` and `alpha = g^r`.
//! A parallel shuffle applies one permutation to several lists and proves
//! each list under the same permutation commitment.
#![allow(clippy::type_complexity)]
use borsh::{BorshDeserialize, BorshSerialize};
use num_bigint::BigUint;
use num_traits::{One, Zero};
use rand::Rng;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use tracing::{debug, info};

use crate::codec;
use crate::context::BigintCtx;
use crate::elgamal::{Ciphertext, PublicKey};
use crate::error::{CryptographyError, Result};
use crate::rnd::SeleneRng;
use crate::serialization::{read_biguint, read_biguints, write_biguint, write_biguints};
use crate::util::{self, Par};

struct YChallengeInput<'a> {
    es: &'a [Ciphertext],
    e_primes: &'a [Ciphertext],
    cs: &'a [BigUint],
    c_hats: &'a [BigUint],
    pk: &'a BigUint,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commitments {
    pub t1: BigUint,
    pub t2: BigUint,
    pub t3: BigUint,
    pub t4_1: BigUint,
    pub t4_2: BigUint,
    pub t_hats: Vec<BigUint>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Responses {
    pub(crate) s1: BigUint,
    pub(crate) s2: BigUint,
    pub(crate) s3: BigUint,
    pub(crate) s4: BigUint,
    pub(crate) s_hats: Vec<BigUint>,
    pub(crate) s_primes: Vec<BigUint>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShuffleProof {
    // proof commitment
    pub(crate) t: Commitments,
    // proof response
    pub(crate) s: Responses,
    // permutation commitment
    pub(crate) cs: Vec<BigUint>,
    // commitment chain
    pub(crate) c_hats: Vec<BigUint>,
}

/// Proofs for lists shuffled with one shared permutation.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ParallelShuffleProof {
    pub proofs: Vec<ShuffleProof>,
}

pub(crate) struct PermutationData<'a> {
    pub(crate) permutation: &'a [usize],
    pub(crate) commitments_c: &'a [BigUint],
    pub(crate) commitments_r: &'a [BigUint],
}

pub struct Shuffler<'a> {
    pub(crate) pk: &'a PublicKey,
    pub(crate) generators: &'a [BigUint],
    pub(crate) ctx: BigintCtx,
}

impl<'a> Shuffler<'a> {
    /// `generators` must hold one more element than the lists to shuffle.
    pub fn new(pk: &'a PublicKey, generators: &'a [BigUint], ctx: &BigintCtx) -> Shuffler<'a> {
        Shuffler {
            pk,
            generators,
            ctx: ctx.clone(),
        }
    }

    pub fn gen_shuffle(&self, ciphertexts: &[Ciphertext]) -> (Vec<Ciphertext>, Vec<BigUint>, Vec<usize>) {
        let perm: Vec<usize> = gen_permutation(ciphertexts.len());
        let (result, rs) = self.apply_permutation(&perm, ciphertexts);

        (result, rs, perm)
    }

    /// Re-encrypts `ciphertexts[perm[i]]` into position `i`.
    ///
    /// The returned randomness is indexed by source position.
    pub fn apply_permutation(
        &self,
        perm: &[usize],
        ciphertexts: &[Ciphertext],
    ) -> (Vec<Ciphertext>, Vec<BigUint>) {
        let ctx = &self.ctx;

        let (e_primes, rs_by_target): (Vec<Ciphertext>, Vec<BigUint>) = perm
            .par()
            .map(|p| {
                let r = ctx.rnd_exp();
                (self.pk.reencrypt(&ciphertexts[*p], &r), r)
            })
            .unzip();

        let mut rs = vec![BigUint::zero(); ciphertexts.len()];
        for (p, r) in perm.iter().zip(rs_by_target) {
            rs[*p] = r;
        }

        (e_primes, rs)
    }

    pub fn gen_proof(
        &self,
        es: &[Ciphertext],
        e_primes: &[Ciphertext],
        r_primes: &[BigUint],
        perm: &[usize],
        label: &[u8],
    ) -> Result<ShuffleProof> {
        self.check_lengths(es.len(), perm.len())?;
        let (cs, rs) = self.gen_commitments(perm);

        let perm_data = PermutationData {
            permutation: perm,
            commitments_c: &cs,
            commitments_r: &rs,
        };

        self.gen_proof_ext(es, e_primes, r_primes, &perm_data, label)
    }

    fn check_lengths(&self, n: usize, perm: usize) -> Result<()> {
        if n == 0 {
            return Err(CryptographyError::ProofPrecondition("cannot shuffle 0 ciphertexts"));
        }
        if perm != n || self.generators.len() != n + 1 {
            return Err(CryptographyError::Mismatch(format!(
                "shuffle of {} ciphertexts with {} permutation entries and {} generators",
                n,
                perm,
                self.generators.len()
            )));
        }
        Ok(())
    }

    // takes the permutation data from outside so that parallel shuffles
    // can share it
    pub(crate) fn gen_proof_ext(
        &self,
        es: &[Ciphertext],
        e_primes: &[Ciphertext],
        r_primes: &[BigUint],
        perm_data: &PermutationData,
        label: &[u8],
    ) -> Result<ShuffleProof> {
        let ctx = &self.ctx;

        #[allow(non_snake_case)]
        let N = es.len();
        self.check_lengths(N, perm_data.permutation.len())?;
        if e_primes.len() != N || r_primes.len() != N || perm_data.commitments_c.len() != N {
            return Err(CryptographyError::Mismatch(
                "shuffle input and output lengths differ".to_string(),
            ));
        }

        let h_generators = &self.generators[1..];
        let h_initial = &self.generators[0];

        let (cs, rs) = (perm_data.commitments_c, perm_data.commitments_r);
        let perm = perm_data.permutation;

        let us = self.shuffle_proof_us(es, e_primes, cs, N, label);

        let u_primes: Vec<&BigUint> = perm.iter().map(|i| &us[*i]).collect();

        let (c_hats, r_hats) = self.gen_commitment_chain(h_initial, &u_primes);

        let mut vs = vec![BigUint::one(); N];
        for i in (0..N - 1).rev() {
            vs[i] = ctx.exp_mul(u_primes[i + 1], &vs[i + 1]);
        }

        let mut r_bar = BigUint::zero();
        let mut r_hat = BigUint::zero();
        let mut r_tilde = BigUint::zero();
        let mut r_prime = BigUint::zero();

        for i in 0..N {
            r_bar += &rs[i];
            r_hat += &r_hats[i] * &vs[i];
            r_tilde += &rs[i] * &us[i];
            r_prime += &r_primes[i] * &us[i];
        }

        let xmod = ctx.exp_modulus();
        r_bar %= xmod;
        r_hat %= xmod;
        r_tilde %= xmod;
        r_prime %= xmod;

        let omegas: Vec<BigUint> = (0..4).map(|_| ctx.rnd_exp()).collect();
        let omega_hats: Vec<BigUint> = (0..N).map(|_| ctx.rnd_exp()).collect();
        let omega_primes: Vec<BigUint> = (0..N).map(|_| ctx.rnd_exp()).collect();

        let t1 = ctx.gmod_pow(&omegas[0]);
        let t2 = ctx.gmod_pow(&omegas[1]);

        let values: Vec<(BigUint, BigUint, BigUint)> = (0..N)
            .par()
            .map(|i| {
                (
                    ctx.emod_pow(&h_generators[i], &omega_primes[i]),
                    ctx.emod_pow(&e_primes[i].beta, &omega_primes[i]),
                    ctx.emod_pow(&e_primes[i].alpha, &omega_primes[i]),
                )
            })
            .collect();

        let mut t3_temp = BigUint::one();
        let mut t4_1_temp = BigUint::one();
        let mut t4_2_temp = BigUint::one();
        for value in values.iter() {
            t3_temp = ctx.mul(&t3_temp, &value.0);
            t4_1_temp = ctx.mul(&t4_1_temp, &value.1);
            t4_2_temp = ctx.mul(&t4_2_temp, &value.2);
        }

        let t3 = ctx.mul(&ctx.gmod_pow(&omegas[2]), &t3_temp);
        let t4_1 = ctx.mul(
            &ctx.emod_pow(&ctx.inv(self.pk.element()), &omegas[3]),
            &t4_1_temp,
        );
        let t4_2 = ctx.mul(
            &ctx.emod_pow(&ctx.inv(ctx.generator()), &omegas[3]),
            &t4_2_temp,
        );

        let t_hats = (0..c_hats.len())
            .par()
            .map(|i| {
                let previous_c = if i == 0 { h_initial } else { &c_hats[i - 1] };
                ctx.mul(
                    &ctx.gmod_pow(&omega_hats[i]),
                    &ctx.emod_pow(previous_c, &omega_primes[i]),
                )
            })
            .collect();

        let y = YChallengeInput {
            es,
            e_primes,
            cs,
            c_hats: &c_hats,
            pk: self.pk.element(),
        };

        let t = Commitments {
            t1,
            t2,
            t3,
            t4_1,
            t4_2,
            t_hats,
        };

        let c = self.shuffle_proof_challenge(&y, &t, label);

        let s1 = ctx.exp_add(&omegas[0], &ctx.exp_mul(&c, &r_bar));
        let s2 = ctx.exp_add(&omegas[1], &ctx.exp_mul(&c, &r_hat));
        let s3 = ctx.exp_add(&omegas[2], &ctx.exp_mul(&c, &r_tilde));
        let s4 = ctx.exp_add(&omegas[3], &ctx.exp_mul(&c, &r_prime));

        let s_hats: Vec<BigUint> = (0..N)
            .map(|i| ctx.exp_add(&omega_hats[i], &ctx.exp_mul(&c, &r_hats[i])))
            .collect();
        let s_primes: Vec<BigUint> = (0..N)
            .map(|i| ctx.exp_add(&omega_primes[i], &ctx.exp_mul(&c, u_primes[i])))
            .collect();

        let s = Responses {
            s1,
            s2,
            s3,
            s4,
            s_hats,
            s_primes,
        };

        Ok(ShuffleProof {
            t,
            s,
            cs: cs.to_vec(),
            c_hats,
        })
    }

    pub fn check_proof(
        &self,
        proof: &ShuffleProof,
        es: &[Ciphertext],
        e_primes: &[Ciphertext],
        label: &[u8],
    ) -> bool {
        let ctx = &self.ctx;

        #[allow(non_snake_case)]
        let N = es.len();

        if N == 0
            || e_primes.len() != N
            || self.generators.len() != N + 1
            || proof.cs.len() != N
            || proof.c_hats.len() != N
            || proof.t.t_hats.len() != N
            || proof.s.s_hats.len() != N
            || proof.s.s_primes.len() != N
        {
            debug!("shuffle proof rejected, length mismatch");
            return false;
        }

        let h_generators = &self.generators[1..];
        let h_initial = &self.generators[0];

        let us: Vec<BigUint> = self.shuffle_proof_us(es, e_primes, &proof.cs, N, label);

        let values: Vec<(BigUint, BigUint, BigUint, BigUint, BigUint, BigUint)> = (0..N)
            .par()
            .map(|i| {
                (
                    ctx.emod_pow(&proof.cs[i], &us[i]),
                    ctx.emod_pow(&es[i].beta, &us[i]),
                    ctx.emod_pow(&es[i].alpha, &us[i]),
                    ctx.emod_pow(&h_generators[i], &proof.s.s_primes[i]),
                    ctx.emod_pow(&e_primes[i].beta, &proof.s.s_primes[i]),
                    ctx.emod_pow(&e_primes[i].alpha, &proof.s.s_primes[i]),
                )
            })
            .collect();

        let mut c_bar_num = BigUint::one();
        let mut c_bar_den = BigUint::one();
        let mut u = BigUint::one();
        let mut c_tilde = BigUint::one();
        let mut a_prime = BigUint::one();
        let mut b_prime = BigUint::one();
        let mut t_tilde3_temp = BigUint::one();
        let mut t_tilde41_temp = BigUint::one();
        let mut t_tilde42_temp = BigUint::one();

        for i in 0..N {
            c_bar_num = ctx.mul(&c_bar_num, &proof.cs[i]);
            c_bar_den = ctx.mul(&c_bar_den, &h_generators[i]);
            u = ctx.exp_mul(&u, &us[i]);

            c_tilde = ctx.mul(&c_tilde, &values[i].0);
            a_prime = ctx.mul(&a_prime, &values[i].1);
            b_prime = ctx.mul(&b_prime, &values[i].2);
            t_tilde3_temp = ctx.mul(&t_tilde3_temp, &values[i].3);
            t_tilde41_temp = ctx.mul(&t_tilde41_temp, &values[i].4);
            t_tilde42_temp = ctx.mul(&t_tilde42_temp, &values[i].5);
        }

        let c_bar = ctx.div(&c_bar_num, &c_bar_den);
        let c_hat = ctx.div(&proof.c_hats[N - 1], &ctx.emod_pow(h_initial, &u));

        let y = YChallengeInput {
            es,
            e_primes,
            cs: &proof.cs,
            c_hats: &proof.c_hats,
            pk: self.pk.element(),
        };

        let c = self.shuffle_proof_challenge(&y, &proof.t, label);

        let t_prime1 = ctx.mul(
            &ctx.emod_pow(&ctx.inv(&c_bar), &c),
            &ctx.gmod_pow(&proof.s.s1),
        );
        let t_prime2 = ctx.mul(
            &ctx.emod_pow(&ctx.inv(&c_hat), &c),
            &ctx.gmod_pow(&proof.s.s2),
        );
        let t_prime3 = ctx.mul(
            &ctx.mul(
                &ctx.emod_pow(&ctx.inv(&c_tilde), &c),
                &ctx.gmod_pow(&proof.s.s3),
            ),
            &t_tilde3_temp,
        );
        let t_prime41 = ctx.mul(
            &ctx.mul(
                &ctx.emod_pow(&ctx.inv(&a_prime), &c),
                &ctx.emod_pow(&ctx.inv(self.pk.element()), &proof.s.s4),
            ),
            &t_tilde41_temp,
        );
        let t_prime42 = ctx.mul(
            &ctx.mul(
                &ctx.emod_pow(&ctx.inv(&b_prime), &c),
                &ctx.emod_pow(&ctx.inv(ctx.generator()), &proof.s.s4),
            ),
            &t_tilde42_temp,
        );

        let t_hat_primes: Vec<BigUint> = (0..N)
            .par()
            .map(|i| {
                let c_term = if i == 0 {
                    h_initial
                } else {
                    &proof.c_hats[i - 1]
                };
                ctx.mul(
                    &ctx.mul(
                        &ctx.emod_pow(&ctx.inv(&proof.c_hats[i]), &c),
                        &ctx.gmod_pow(&proof.s.s_hats[i]),
                    ),
                    &ctx.emod_pow(c_term, &proof.s.s_primes[i]),
                )
            })
            .collect();

        let ok = proof.t.t1 == t_prime1
            && proof.t.t2 == t_prime2
            && proof.t.t3 == t_prime3
            && proof.t.t4_1 == t_prime41
            && proof.t.t4_2 == t_prime42
            && proof.t.t_hats == t_hat_primes;
        if !ok {
            debug!("shuffle proof of {} ciphertexts rejected", N);
        }

        ok
    }

    /// Shuffles every list with the same permutation.
    ///
    /// All lists must have the same length.
    pub fn gen_parallel_shuffle(
        &self,
        lists: &[Vec<Ciphertext>],
        label: &[u8],
    ) -> Result<(Vec<Vec<Ciphertext>>, ParallelShuffleProof)> {
        let n = lists.first().map(|l| l.len()).unwrap_or(0);
        if lists.iter().any(|l| l.len() != n) {
            return Err(CryptographyError::Mismatch(
                "parallel shuffle lists differ in length".to_string(),
            ));
        }
        let perm = gen_permutation(n);
        self.check_lengths(n, perm.len())?;
        let (cs, rs) = self.gen_commitments(&perm);
        let perm_data = PermutationData {
            permutation: &perm,
            commitments_c: &cs,
            commitments_r: &rs,
        };

        let mut shuffled = Vec::with_capacity(lists.len());
        let mut proofs = Vec::with_capacity(lists.len());
        for list in lists {
            let (e_primes, r_primes) = self.apply_permutation(&perm, list);
            let proof = self.gen_proof_ext(list, &e_primes, &r_primes, &perm_data, label)?;
            shuffled.push(e_primes);
            proofs.push(proof);
        }
        info!("shuffled {} lists of {} ciphertexts", lists.len(), n);

        Ok((shuffled, ParallelShuffleProof { proofs }))
    }

    /// Each list's proof must verify and all proofs must commit to the same
    /// permutation.
    pub fn check_parallel_proof(
        &self,
        proof: &ParallelShuffleProof,
        lists: &[Vec<Ciphertext>],
        shuffled: &[Vec<Ciphertext>],
        label: &[u8],
    ) -> bool {
        if proof.proofs.len() != lists.len() || shuffled.len() != lists.len() || lists.is_empty() {
            return false;
        }
        let cs = &proof.proofs[0].cs;
        if proof.proofs.iter().any(|p| &p.cs != cs) {
            debug!("parallel shuffle proofs use different permutation commitments");
            return false;
        }

        proof
            .proofs
            .iter()
            .zip(lists.iter().zip(shuffled.iter()))
            .all(|(p, (es, e_primes))| self.check_proof(p, es, e_primes, label))
    }

    pub(crate) fn gen_commitments(&self, perm: &[usize]) -> (Vec<BigUint>, Vec<BigUint>) {
        let ctx = &self.ctx;
        let generators = &self.generators[1..];

        let computed: Vec<(BigUint, BigUint)> = perm
            .par()
            .enumerate()
            .map(|(i, _)| {
                let r = ctx.rnd_exp();
                let c = ctx.mul(&generators[i], &ctx.gmod_pow(&r));
                (c, r)
            })
            .collect();

        let mut cs = vec![BigUint::zero(); perm.len()];
        let mut rs = vec![BigUint::zero(); perm.len()];
        for (p, (c, r)) in perm.iter().zip(computed) {
            cs[*p] = c;
            rs[*p] = r;
        }

        (cs, rs)
    }

    fn gen_commitment_chain(&self, initial: &BigUint, us: &[&BigUint]) -> (Vec<BigUint>, Vec<BigUint>) {
        let ctx = &self.ctx;
        let mut cs: Vec<BigUint> = Vec::with_capacity(us.len());

        let (firsts, rs): (Vec<BigUint>, Vec<BigUint>) = (0..us.len())
            .par()
            .map(|_| {
                let r = ctx.rnd_exp();
                (ctx.gmod_pow(&r), r)
            })
            .unzip();

        for i in 0..us.len() {
            let c_temp = if i == 0 { initial } else { &cs[i - 1] };
            let c = ctx.mul(&firsts[i], &ctx.emod_pow(c_temp, us[i]));
            cs.push(c);
        }

        (cs, rs)
    }

    fn shuffle_proof_us(
        &self,
        es: &[Ciphertext],
        e_primes: &[Ciphertext],
        cs: &[BigUint],
        n: usize,
        label: &[u8],
    ) -> Vec<BigUint> {
        let mut prefix = vec![];
        write_ciphertexts(&mut prefix, es);
        write_ciphertexts(&mut prefix, e_primes);
        write_elements(&mut prefix, cs);
        write_label(&mut prefix, label);

        // u_i = H(H(prefix) || i), the prefix is only hashed once
        let prefix_hash = util::hash(&prefix);

        (0..n)
            .par()
            .map(|i| {
                let mut next = prefix_hash.clone();
                next.extend((i as u64).to_le_bytes());
                self.ctx.hash_to_exp(&next)
            })
            .collect()
    }

    fn shuffle_proof_challenge(&self, y: &YChallengeInput, t: &Commitments, label: &[u8]) -> BigUint {
        let mut bytes = vec![];
        write_elements(&mut bytes, &[t.t1.clone(), t.t2.clone(), t.t3.clone()]);
        write_elements(&mut bytes, &[t.t4_1.clone(), t.t4_2.clone()]);
        write_ciphertexts(&mut bytes, y.es);
        write_ciphertexts(&mut bytes, y.e_primes);
        write_elements(&mut bytes, y.cs);
        write_elements(&mut bytes, y.c_hats);
        codec::write_integer(&mut bytes, y.pk);
        write_elements(&mut bytes, &t.t_hats);
        write_label(&mut bytes, label);

        self.ctx.hash_to_exp(&bytes)
    }
}

fn write_ciphertexts(out: &mut Vec<u8>, ciphertexts: &[Ciphertext]) {
    out.extend((ciphertexts.len() as u32).to_be_bytes());
    for c in ciphertexts {
        codec::write_integer(out, &c.alpha);
        codec::write_integer(out, &c.beta);
    }
}

fn write_elements(out: &mut Vec<u8>, elements: &[BigUint]) {
    out.extend((elements.len() as u32).to_be_bytes());
    for e in elements {
        codec::write_integer(out, e);
    }
}

fn write_label(out: &mut Vec<u8>, label: &[u8]) {
    out.extend((label.len() as u32).to_be_bytes());
    out.extend(label);
}

pub(crate) fn gen_permutation(size: usize) -> Vec<usize> {
    let mut ret = Vec::with_capacity(size);
    let mut rng = SeleneRng;
    let mut ordered: Vec<usize> = (0..size).collect();

    for i in 0..size {
        let k = rng.gen_range(i..size);
        let j = ordered[k];
        ordered[k] = ordered[i];
        ret.push(j);
    }

    ret
}

impl BorshSerialize for Commitments {
    fn serialize<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        write_biguint(&self.t1, writer)?;
        write_biguint(&self.t2, writer)?;
        write_biguint(&self.t3, writer)?;
        write_biguint(&self.t4_1, writer)?;
        write_biguint(&self.t4_2, writer)?;
        write_biguints(&self.t_hats, writer)
    }
}

impl BorshDeserialize for Commitments {
    fn deserialize(buf: &mut &[u8]) -> std::io::Result<Self> {
        Ok(Commitments {
            t1: read_biguint(buf)?,
            t2: read_biguint(buf)?,
            t3: read_biguint(buf)?,
            t4_1: read_biguint(buf)?,
            t4_2: read_biguint(buf)?,
            t_hats: read_biguints(buf)?,
        })
    }
}

impl BorshSerialize for Responses {
    fn serialize<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        write_biguint(&self.s1, writer)?;
        write_biguint(&self.s2, writer)?;
        write_biguint(&self.s3, writer)?;
        write_biguint(&self.s4, writer)?;
        write_biguints(&self.s_hats, writer)?;
        write_biguints(&self.s_primes, writer)
    }
}

impl BorshDeserialize for Responses {
    fn deserialize(buf: &mut &[u8]) -> std::io::Result<Self> {
        Ok(Responses {
            s1: read_biguint(buf)?,
            s2: read_biguint(buf)?,
            s3: read_biguint(buf)?,
            s4: read_biguint(buf)?,
            s_hats: read_biguints(buf)?,
            s_primes: read_biguints(buf)?,
        })
    }
}

impl BorshSerialize for ShuffleProof {
    fn serialize<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        self.t.serialize(writer)?;
        self.s.serialize(writer)?;
        write_biguints(&self.cs, writer)?;
        write_biguints(&self.c_hats, writer)
    }
}

impl BorshDeserialize for ShuffleProof {
    fn deserialize(buf: &mut &[u8]) -> std::io::Result<Self> {
        Ok(ShuffleProof {
            t: Commitments::deserialize(buf)?,
            s: Responses::deserialize(buf)?,
            cs: read_biguints(buf)?,
            c_hats: read_biguints(buf)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::ctx_256;
    use crate::elgamal::PrivateKey;
    use crate::error::ErrorKind;
    use crate::serialization::{SeleneDeserialize, SeleneSerialize};

    fn encrypt_all(pk: &PublicKey, plaintexts: &[BigUint]) -> Vec<Ciphertext> {
        plaintexts.iter().map(|p| pk.encrypt(p)).collect()
    }

    #[test]
    fn test_shuffle() {
        let ctx = ctx_256();
        let sk = PrivateKey::gen(&ctx);
        let pk = sk.get_pk();
        let n = 20;
        let plaintexts: Vec<BigUint> = (0..n).map(|_| ctx.rnd()).collect();
        let es = encrypt_all(&pk, &plaintexts);
        let seed = b"shuffle test";
        let hs = ctx.generators(n + 1, 1, seed);
        let shuffler = Shuffler::new(&pk, &hs, &ctx);

        let (e_primes, rs, perm) = shuffler.gen_shuffle(&es);
        let proof = shuffler.gen_proof(&es, &e_primes, &rs, &perm, b"mix").unwrap();
        assert!(shuffler.check_proof(&proof, &es, &e_primes, b"mix"));
        assert!(!shuffler.check_proof(&proof, &es, &e_primes, b"other"));

        let mut decrypted: Vec<BigUint> = e_primes.iter().map(|c| sk.decrypt(c)).collect();
        for (i, p) in perm.iter().enumerate() {
            assert_eq!(decrypted[i], plaintexts[*p]);
        }
        let mut sorted = plaintexts.clone();
        sorted.sort();
        decrypted.sort();
        assert_eq!(decrypted, sorted);

        let bytes = proof.selene_serialize().unwrap();
        let back = ShuffleProof::selene_deserialize(&bytes).unwrap();
        assert!(shuffler.check_proof(&back, &es, &e_primes, b"mix"));
    }

    #[test]
    fn test_tampered_shuffle() {
        let ctx = ctx_256();
        let sk = PrivateKey::gen(&ctx);
        let pk = sk.get_pk();
        let n = 8;
        let es = util::random_ciphertexts(n, &ctx);
        let hs = ctx.generators(n + 1, 1, b"tamper");
        let shuffler = Shuffler::new(&pk, &hs, &ctx);

        let (mut e_primes, rs, perm) = shuffler.gen_shuffle(&es);
        let proof = shuffler.gen_proof(&es, &e_primes, &rs, &perm, &[]).unwrap();
        assert!(shuffler.check_proof(&proof, &es, &e_primes, &[]));

        // replacing an output with a fresh encryption breaks the proof
        e_primes[3] = pk.encrypt(&ctx.rnd());
        assert!(!shuffler.check_proof(&proof, &es, &e_primes, &[]));
        assert!(!shuffler.check_proof(&proof, &es, &e_primes[1..], &[]));
    }

    #[test]
    fn test_empty_shuffle() {
        let ctx = ctx_256();
        let pk = PrivateKey::gen(&ctx).get_pk();
        let hs = ctx.generators(1, 1, b"");
        let shuffler = Shuffler::new(&pk, &hs, &ctx);
        let (e_primes, rs, perm) = shuffler.gen_shuffle(&[]);
        assert!(e_primes.is_empty());
        let e = shuffler.gen_proof(&[], &e_primes, &rs, &perm, &[]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::ProofPrecondition);

        let es = util::random_ciphertexts(3, &ctx);
        let e = shuffler.gen_shuffle(&es);
        let err = shuffler.gen_proof(&es, &e.0, &e.1, &e.2, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Mismatch);
    }

    #[test]
    fn test_parallel_shuffle() {
        let ctx = ctx_256();
        let sk = PrivateKey::gen(&ctx);
        let pk = sk.get_pk();
        let n = 10;
        let first: Vec<BigUint> = (0..n).map(|_| ctx.rnd()).collect();
        let second: Vec<BigUint> = (0..n).map(|_| ctx.rnd()).collect();
        let lists = vec![encrypt_all(&pk, &first), encrypt_all(&pk, &second)];
        let hs = ctx.generators(n + 1, 1, b"parallel");
        let shuffler = Shuffler::new(&pk, &hs, &ctx);

        let (shuffled, proof) = shuffler.gen_parallel_shuffle(&lists, b"mix").unwrap();
        assert!(shuffler.check_parallel_proof(&proof, &lists, &shuffled, b"mix"));

        // rows stay aligned
        for i in 0..n {
            let a = sk.decrypt(&shuffled[0][i]);
            let b = sk.decrypt(&shuffled[1][i]);
            let j = first.iter().position(|p| p == &a).unwrap();
            assert_eq!(second[j], b);
        }

        // an independently shuffled second list is rejected
        let (other, other_proof) = shuffler.gen_parallel_shuffle(&lists[1..], b"mix").unwrap();
        let mixed = ParallelShuffleProof {
            proofs: vec![proof.proofs[0].clone(), other_proof.proofs[0].clone()],
        };
        let outputs = vec![shuffled[0].clone(), other[0].clone()];
        assert!(!shuffler.check_parallel_proof(&mixed, &lists, &outputs, b"mix"));

        let uneven = vec![lists[0].clone(), lists[1][1..].to_vec()];
        assert!(shuffler.gen_parallel_shuffle(&uneven, b"mix").is_err());
    }

    #[test]
    fn test_gen_permutation() {
        let perm = gen_permutation(50);
        let mut sorted = perm.clone();
        sorted.sort();
        assert_eq!(sorted, (0..50).collect::<Vec<usize>>());
        assert!(gen_permutation(0).is_empty());
    }
}
