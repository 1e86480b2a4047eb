// SPDX-FileCopyrightText: 2022 David Ruescas <david@sequentech.io>
//
// SPDX-License-Identifier: AGPL-3.0-only
use num_bigint::BigUint;
use rand::Rng;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::elgamal::Ciphertext;
use crate::error::{CryptographyError, Result};
use crate::keymaker::ElectionKeyPair;
use crate::keys::VoterKeyPairs;
use crate::parameters::ElectionParameters;
use crate::progress::{Progress, ProgressListener};
use crate::rnd::SeleneRngCore;
use crate::selene::model::{MixedVote, Shuffle, TrackerNumber};
use crate::selene::{election_key, proof_label, TRACKER_GENERATORS};
use crate::serialization::{SeleneDeserialize, SeleneSerialize};
use crate::shuffler::{ShuffleProof, Shuffler};
use crate::store::{ArtifactKey, ArtifactStore, TRACKER_SHUFFLE};

/// `n` distinct random trackers in `[1, 2^32 - 1]`, encrypted under the
/// election key.
pub fn create_tracker_numbers(
    rng: &mut dyn SeleneRngCore,
    parameters: &ElectionParameters,
    election: &ElectionKeyPair,
    n: usize,
) -> Result<Vec<TrackerNumber>> {
    let (ctx, pk) = election_key(parameters, election)?;
    let mut ids: HashSet<u64> = HashSet::with_capacity(n);
    let mut ret = Vec::with_capacity(n);

    while ret.len() < n {
        let id: u64 = rng.gen_range(1..=u32::MAX as u64);
        if !ids.insert(id) {
            continue;
        }
        let element = ctx.gmod_pow(&BigUint::from(id));
        let encrypted = pk.encrypt(&element);
        ret.push(TrackerNumber {
            id,
            element,
            encrypted: Some(encrypted),
        });
    }
    info!("created {} tracker numbers", n);

    Ok(ret)
}

pub fn tracker_ciphertexts(trackers: &[TrackerNumber]) -> Result<Vec<Ciphertext>> {
    trackers
        .iter()
        .map(|t| {
            t.encrypted
                .clone()
                .ok_or(CryptographyError::MissingKey("encrypted tracker number"))
        })
        .collect()
}

/// One teller's shuffle of the encrypted trackers.
///
/// The proof is written to `store` under the teller's number; each call
/// draws a new permutation and new re-encryption factors.
pub fn shuffle_tracker_numbers(
    parameters: &ElectionParameters,
    election: &ElectionKeyPair,
    teller: usize,
    input: &[Ciphertext],
    store: &dyn ArtifactStore,
    progress: &dyn ProgressListener,
) -> Result<Shuffle> {
    let (ctx, pk) = election_key(parameters, election)?;
    let generators = ctx.generators(input.len() + 1, TRACKER_GENERATORS, &parameters.hash());
    let shuffler = Shuffler::new(&pk, &generators, &ctx);

    let (ciphertexts, rs, perm) = shuffler.gen_shuffle(input);
    progress.on_progress(Progress::Shuffled {
        count: ciphertexts.len(),
    });
    let label = proof_label(TRACKER_SHUFFLE, teller);
    let proof = shuffler.gen_proof(input, &ciphertexts, &rs, &perm, &label)?;
    progress.on_progress(Progress::ProofGenerated);

    let artifact = ArtifactKey::new(parameters, teller, TRACKER_SHUFFLE);
    store.write(&artifact, &proof.selene_serialize()?)?;
    info!("teller {} shuffled {} tracker numbers", teller, ciphertexts.len());

    Ok(Shuffle {
        ciphertexts,
        artifact,
    })
}

pub fn verify_shuffle(
    parameters: &ElectionParameters,
    election: &ElectionKeyPair,
    input: &[Ciphertext],
    shuffle: &Shuffle,
    store: &dyn ArtifactStore,
) -> Result<bool> {
    let (ctx, pk) = election_key(parameters, election)?;
    let proof = ShuffleProof::selene_deserialize(&store.require(&shuffle.artifact)?)?;
    let generators = ctx.generators(input.len() + 1, TRACKER_GENERATORS, &parameters.hash());
    let shuffler = Shuffler::new(&pk, &generators, &ctx);
    let label = proof_label(TRACKER_SHUFFLE, shuffle.artifact.teller);

    let ok = shuffler.check_proof(&proof, input, &shuffle.ciphertexts, &label);
    if !ok {
        warn!("tracker shuffle of teller {} rejected", shuffle.artifact.teller);
    }

    Ok(ok)
}

/// Opens a voter's commitment `(alpha, beta)` with the trapdoor key matching
/// `public_trapdoor_key` and finds the tracker it hides.
pub fn decrypt_tracker_number(
    parameters: &ElectionParameters,
    alpha: &BigUint,
    beta: &BigUint,
    public_trapdoor_key: &BigUint,
    voter_key_pairs: &[VoterKeyPairs],
    tracker_numbers: &[TrackerNumber],
) -> Result<TrackerNumber> {
    let ctx = parameters.ctx()?;
    let secret = voter_key_pairs
        .iter()
        .find(|k| k.trapdoor.public_key.as_ref() == Some(public_trapdoor_key))
        .and_then(|k| k.trapdoor.private_key.as_ref())
        .ok_or(CryptographyError::KeyPairNotFound)?;

    // beta / alpha^x = g^n
    let element = ctx.div(beta, &ctx.emod_pow(alpha, secret));

    tracker_numbers
        .iter()
        .find(|t| t.element == element)
        .cloned()
        .ok_or(CryptographyError::TrackerNotFound)
}

/// The published result row carrying `tracker`, if any.
pub fn find_vote(results: &[MixedVote], tracker: u64) -> Option<&MixedVote> {
    results.iter().find(|r| r.tracker_number == tracker)
}
