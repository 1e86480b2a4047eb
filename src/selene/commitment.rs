// SPDX-FileCopyrightText: 2022 David Ruescas <david@sequentech.io>
//
// SPDX-License-Identifier: AGPL-3.0-only
//! Tracker commitments.
//!
//! Teller `j` commits to voter `i` with `g_ij = g^r_ij` and
//! `h_ij = pk_i^r_ij`. The product of the encrypted `h_ij` with the voter's
//! encrypted tracker decrypts to `beta_i = pk_i^r_i g^n_i`, and the product
//! of the `g_ij` is `alpha_i = g^r_i`, so only the voter's trapdoor key
//! opens the tracker `n_i`.
use num_bigint::BigUint;
use num_traits::One;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use tracing::{info, warn};

use crate::context::BigintCtx;
use crate::elgamal::Ciphertext;
use crate::error::{CryptographyError, Result};
use crate::keymaker::{combine_decryptions, ElectionKeyPair, PartialDecryption, TellerKeyPair};
use crate::parameters::ElectionParameters;
use crate::rnd::SeleneRng;
use crate::selene::election_key;
use crate::selene::model::{Commitment, Voter};
use crate::serialization::{SeleneDeserialize, SeleneSerialize};
use crate::store::{ArtifactKey, ArtifactStore, COMMITMENT_DECRYPTION, COMMITMENT_PROOFS};
use crate::util::Par;
use crate::zkp::{self, Proof, Statement};

fn statements(ctx: &BigintCtx, public_key: &BigUint, g: &BigUint, h: &BigUint) -> [Statement; 2] {
    [
        Statement::new(g.clone(), ctx.generator().clone()),
        Statement::new(h.clone(), public_key.clone()),
    ]
}

/// One teller's commitments for every voter, in voter order.
///
/// A Chaum-Pedersen proof that `g` and `h` share their exponent is written
/// to `store` per voter.
pub fn create_commitments(
    parameters: &ElectionParameters,
    election: &ElectionKeyPair,
    teller: usize,
    voters: &[Voter],
    store: &dyn ArtifactStore,
) -> Result<Vec<Commitment>> {
    let (ctx, pk) = election_key(parameters, election)?;

    let created: Vec<(Commitment, Proof)> = voters
        .par()
        .map(|voter| -> Result<(Commitment, Proof)> {
            let public_key = voter.trapdoor.public_key()?;
            let r = ctx.rnd_exp();
            let g = ctx.gmod_pow(&r);
            let h = ctx.emod_pow(public_key, &r);
            let proof = zkp::prove(
                &mut SeleneRng,
                ctx.modulus(),
                ctx.exp_modulus(),
                &r,
                &statements(&ctx, public_key, &g, &h),
            );
            let commitment = Commitment {
                teller,
                public_key: public_key.clone(),
                encrypted_g: pk.encrypt(&g),
                encrypted_h: pk.encrypt(&h),
                g: Some(g),
                h: Some(h),
            };
            Ok((commitment, proof))
        })
        .collect::<Result<Vec<(Commitment, Proof)>>>()?;
    let (commitments, proofs): (Vec<Commitment>, Vec<Proof>) = created.into_iter().unzip();

    let artifact = ArtifactKey::new(parameters, teller, COMMITMENT_PROOFS);
    store.write(&artifact, &proofs.selene_serialize()?)?;
    info!("teller {} created {} commitments", teller, commitments.len());

    Ok(commitments)
}

/// Checks a teller's commitment proofs, which needs the plaintext `g` and `h`.
pub fn verify_commitments(
    parameters: &ElectionParameters,
    teller: usize,
    commitments: &[Commitment],
    store: &dyn ArtifactStore,
) -> Result<bool> {
    let ctx = parameters.ctx()?;
    let artifact = ArtifactKey::new(parameters, teller, COMMITMENT_PROOFS);
    let proofs = <Vec<Proof>>::selene_deserialize(&store.require(&artifact)?)?;
    if proofs.len() != commitments.len() || commitments.iter().any(|c| c.teller != teller) {
        return Ok(false);
    }

    for (commitment, proof) in commitments.iter().zip(proofs.iter()) {
        let g = commitment.g.as_ref().ok_or(CryptographyError::MissingKey("commitment g"))?;
        let h = commitment.h.as_ref().ok_or(CryptographyError::MissingKey("commitment h"))?;
        let statements = statements(&ctx, &commitment.public_key, g, h);
        if !zkp::verify(ctx.modulus(), ctx.exp_modulus(), proof, &statements) {
            warn!("commitment proof of teller {} rejected", teller);
            return Ok(false);
        }
    }

    Ok(true)
}

fn check_commitments(
    parameters: &ElectionParameters,
    voters: &[Voter],
    commitments: &[Vec<Commitment>],
) -> Result<()> {
    if commitments.len() != parameters.teller_count() {
        return Err(CryptographyError::TellerCountMismatch {
            expected: parameters.teller_count(),
            found: commitments.len(),
        });
    }
    for list in commitments {
        if list.len() != voters.len() {
            return Err(CryptographyError::Mismatch(format!(
                "{} commitments for {} voters",
                list.len(),
                voters.len()
            )));
        }
        for (commitment, voter) in list.iter().zip(voters.iter()) {
            if Some(&commitment.public_key) != voter.trapdoor.public_key.as_ref() {
                return Err(CryptographyError::Mismatch(format!(
                    "commitment of teller {} does not belong to voter {}",
                    commitment.teller, voter.id
                )));
            }
        }
    }
    Ok(())
}

/// Barrier after every teller committed: `tracker_i * prod_j E(h_ij)`.
///
/// `trackers` are the shuffled tracker ciphertexts, one per voter.
pub fn combine_commitments(
    parameters: &ElectionParameters,
    voters: &[Voter],
    trackers: &[Ciphertext],
    commitments: &[Vec<Commitment>],
) -> Result<Vec<Ciphertext>> {
    if trackers.len() != voters.len() {
        return Err(CryptographyError::Mismatch(format!(
            "{} tracker numbers for {} voters",
            trackers.len(),
            voters.len()
        )));
    }
    check_commitments(parameters, voters, commitments)?;
    let ctx = parameters.ctx()?;

    let combined = (0..voters.len())
        .par()
        .map(|i| {
            commitments
                .iter()
                .fold(trackers[i].clone(), |acc, list| acc.mul(&list[i].encrypted_h, &ctx))
        })
        .collect();

    Ok(combined)
}

pub fn decrypt_commitments(
    parameters: &ElectionParameters,
    teller_key: &TellerKeyPair,
    ciphertexts: &[Ciphertext],
    store: &dyn ArtifactStore,
) -> Result<PartialDecryption> {
    let partial = teller_key.decryption_factors(parameters, ciphertexts)?;
    let artifact = ArtifactKey::new(parameters, teller_key.teller, COMMITMENT_DECRYPTION);
    store.write(&artifact, &partial.selene_serialize()?)?;
    info!(
        "teller {} decrypted {} commitments",
        teller_key.teller,
        ciphertexts.len()
    );

    Ok(partial)
}

/// Barrier after the tellers' commitment decryptions: assigns every voter
/// its encrypted tracker and `beta`.
pub fn merge_commitment_decryptions(
    parameters: &ElectionParameters,
    election: &ElectionKeyPair,
    voters: &[Voter],
    trackers: &[Ciphertext],
    combined: &[Ciphertext],
    partials: &[PartialDecryption],
) -> Result<Vec<Voter>> {
    if trackers.len() != voters.len() || combined.len() != voters.len() {
        return Err(CryptographyError::Mismatch(format!(
            "{} voters, {} trackers, {} combined commitments",
            voters.len(),
            trackers.len(),
            combined.len()
        )));
    }
    let betas = combine_decryptions(parameters, election, combined, partials)?;

    let ret = voters
        .iter()
        .zip(trackers.iter().zip(betas))
        .map(|(voter, (tracker, beta))| {
            let mut voter = voter.clone();
            voter.encrypted_tracker = Some(tracker.clone());
            voter.beta = Some(beta);
            voter
        })
        .collect();
    info!("merged commitment decryptions of {} voters", voters.len());

    Ok(ret)
}

/// Sets `alpha_i = prod_j g_ij`, needs the commitment `g` values.
pub fn complete_commitments(
    parameters: &ElectionParameters,
    voters: &[Voter],
    commitments: &[Vec<Commitment>],
) -> Result<Vec<Voter>> {
    check_commitments(parameters, voters, commitments)?;
    let ctx = parameters.ctx()?;

    voters
        .iter()
        .enumerate()
        .map(|(i, voter)| -> Result<Voter> {
            let mut alpha = BigUint::one();
            for list in commitments {
                let g = list[i].g.as_ref().ok_or(CryptographyError::MissingKey("commitment g"))?;
                alpha = ctx.mul(&alpha, g);
            }
            let mut voter = voter.clone();
            voter.alpha = Some(alpha);
            Ok(voter)
        })
        .collect()
}

/// Reads every teller's partial decryption stored under `name`.
pub fn collect_decryptions(
    parameters: &ElectionParameters,
    name: &str,
    store: &dyn ArtifactStore,
) -> Result<Vec<PartialDecryption>> {
    store
        .list(&parameters.hash_hex(), name)?
        .iter()
        .map(|(_, bytes)| PartialDecryption::selene_deserialize(bytes))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::keymaker::tests::generate_keys;
    use crate::parameters::tests::election_256;
    use crate::rnd::SeleneRng;
    use crate::selene::election::{allocate_voters, create_voters_key_pairs};
    use crate::selene::tracker::{create_tracker_numbers, decrypt_tracker_number, tracker_ciphertexts};
    use crate::store::MemoryStore;
    use crate::view::{Projection, View};

    #[test]
    fn test_commitment_flow() {
        let mut rng = SeleneRng;
        let parameters = election_256(3, 2);
        let keys = generate_keys(&parameters);
        let election = keys[0].election.clone();
        let store = MemoryStore::new();

        let key_pairs = create_voters_key_pairs(&mut rng, 4, &parameters).unwrap();
        let voters = allocate_voters(&key_pairs).unwrap();
        let trackers = create_tracker_numbers(&mut rng, &parameters, &election, 4).unwrap();
        let encrypted = tracker_ciphertexts(&trackers).unwrap();

        let commitments: Vec<Vec<Commitment>> = (1..=3)
            .map(|t| create_commitments(&parameters, &election, t, &voters, &store).unwrap())
            .collect();
        for (t, list) in commitments.iter().enumerate() {
            assert!(verify_commitments(&parameters, t + 1, list, &store).unwrap());
        }
        // each teller's commitments are checked against its own artifact
        assert!(!verify_commitments(&parameters, 1, &commitments[1], &store).unwrap());

        let combined = combine_commitments(&parameters, &voters, &encrypted, &commitments).unwrap();
        for key in &keys[1..] {
            decrypt_commitments(&parameters, key, &combined, &store).unwrap();
        }
        let partials = collect_decryptions(&parameters, COMMITMENT_DECRYPTION, &store).unwrap();
        assert_eq!(partials.len(), 2);
        let voters = merge_commitment_decryptions(
            &parameters,
            &election,
            &voters,
            &encrypted,
            &combined,
            &partials,
        )
        .unwrap();

        let restricted: Vec<Vec<Commitment>> = commitments.project(View::RestrictedPublic);
        let voters = complete_commitments(&parameters, &voters, &restricted).unwrap();

        for (i, voter) in voters.iter().enumerate() {
            let tracker = decrypt_tracker_number(
                &parameters,
                voter.alpha.as_ref().unwrap(),
                voter.beta.as_ref().unwrap(),
                voter.trapdoor.public_key().unwrap(),
                &key_pairs,
                &trackers,
            )
            .unwrap();
            assert_eq!(tracker, trackers[i]);
        }

        let public: Vec<Vec<Commitment>> = commitments.project(View::Public);
        let e = complete_commitments(&parameters, &voters, &public).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::MissingKey);
    }

    #[test]
    fn test_commitment_counts() {
        let mut rng = SeleneRng;
        let parameters = election_256(2, 1);
        let keys = generate_keys(&parameters);
        let election = &keys[0].election;
        let store = MemoryStore::new();
        let key_pairs = create_voters_key_pairs(&mut rng, 2, &parameters).unwrap();
        let voters = allocate_voters(&key_pairs).unwrap();
        let trackers = create_tracker_numbers(&mut rng, &parameters, election, 2).unwrap();
        let encrypted = tracker_ciphertexts(&trackers).unwrap();

        let one = create_commitments(&parameters, election, 1, &voters, &store).unwrap();
        let e = combine_commitments(&parameters, &voters, &encrypted, &[one.clone()]).unwrap_err();
        assert!(matches!(
            e,
            CryptographyError::TellerCountMismatch {
                expected: 2,
                found: 1
            }
        ));

        let two = create_commitments(&parameters, election, 2, &voters[..1], &store).unwrap();
        let e = combine_commitments(&parameters, &voters, &encrypted, &[one.clone(), two]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Mismatch);

        let swapped = vec![voters[1].clone(), voters[0].clone()];
        let two = create_commitments(&parameters, election, 2, &swapped, &store).unwrap();
        let e = combine_commitments(&parameters, &voters, &encrypted, &[one, two]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Mismatch);
    }
}
