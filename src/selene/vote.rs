// SPDX-FileCopyrightText: 2022 David Ruescas <david@sequentech.io>
//
// SPDX-License-Identifier: AGPL-3.0-only
use num_bigint::BigUint;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::algorithm::Algorithm;
use crate::context::BigintCtx;
use crate::dsa::Dsa;
use crate::elgamal::Ciphertext;
use crate::error::{CryptographyError, Result};
use crate::keymaker::{combine_decryptions, ElectionKeyPair, PartialDecryption, TellerKeyPair};
use crate::keys::{KeyPair, VoterKeyPairs};
use crate::parameters::ElectionParameters;
use crate::progress::{Progress, ProgressListener};
use crate::rnd::SeleneRngCore;
use crate::selene::model::{Ballot, EncryptedVotes, Mix, MixedVote, TrackerNumber, VoteOption, Voter};
use crate::selene::{election_key, proof_label, MIX_GENERATORS};
use crate::serialization::{SeleneDeserialize, SeleneSerialize};
use crate::shuffler::{ParallelShuffleProof, Shuffler};
use crate::store::{ArtifactKey, ArtifactStore, VOTE_DECRYPTION, VOTE_MIX};
use crate::zkp::OptionProof;

/// Assigns every distinct non-blank option a group element.
///
/// Texts are trimmed, duplicates collapse onto their first occurrence and
/// elements already present on input are kept, so mapping is idempotent.
pub fn map_vote_options(
    parameters: &ElectionParameters,
    options: &[VoteOption],
) -> Result<Vec<VoteOption>> {
    let ctx = parameters.ctx()?;
    let mut mapped: Vec<VoteOption> = vec![];
    let mut texts: HashSet<String> = HashSet::new();

    for option in options {
        let text = option.text.trim();
        if text.is_empty() || !texts.insert(text.to_string()) {
            continue;
        }
        if let Some(element) = &option.element {
            if !ctx.is_valid_element(element) {
                return Err(CryptographyError::malformed(format!(
                    "option '{}' is not mapped to a group element",
                    text
                )));
            }
        }
        mapped.push(VoteOption {
            text: text.to_string(),
            element: option.element.clone(),
        });
    }

    let mut taken: HashSet<BigUint> = mapped.iter().filter_map(|o| o.element.clone()).collect();
    if taken.len() != mapped.iter().filter(|o| o.element.is_some()).count() {
        return Err(CryptographyError::malformed(
            "two options share one group element",
        ));
    }
    let mut next: u32 = 1;
    for option in mapped.iter_mut().filter(|o| o.element.is_none()) {
        let element = loop {
            let candidate = ctx.encode(&BigUint::from(next))?;
            next += 1;
            if !taken.contains(&candidate) {
                break candidate;
            }
        };
        taken.insert(element.clone());
        option.element = Some(element);
    }
    debug!("mapped {} vote options", mapped.len());

    Ok(mapped)
}

fn option_elements(options: &[VoteOption]) -> Result<Vec<BigUint>> {
    options
        .iter()
        .map(|o| {
            o.element
                .clone()
                .ok_or_else(|| CryptographyError::Mismatch(format!("option '{}' is not mapped", o.text)))
        })
        .collect()
}

fn commitment(voter: &Voter) -> Result<(&BigUint, &BigUint)> {
    match (&voter.alpha, &voter.beta) {
        (Some(alpha), Some(beta)) => Ok((alpha, beta)),
        _ => Err(CryptographyError::MissingKey("voter tracker commitment")),
    }
}

/// Encrypts, signs and proves every cast vote.
///
/// The proof shows the ciphertext encrypts one of `options` and is bound to
/// the voter's `(alpha, beta)`. Ballots in `supplied` are checked instead of
/// created. Voters without a vote are left out of the result.
pub fn encrypt_votes(
    rng: &mut dyn SeleneRngCore,
    parameters: &ElectionParameters,
    election: &ElectionKeyPair,
    voter_key_pairs: &[VoterKeyPairs],
    options: &[VoteOption],
    voters: &[Voter],
    supplied: Option<&HashMap<u64, Ballot>>,
) -> Result<Vec<Voter>> {
    let (ctx, pk) = election_key(parameters, election)?;
    let elements = option_elements(options)?;
    let mut ret = vec![];

    for voter in voters {
        if let Some(ballot) = supplied.and_then(|s| s.get(&voter.id)) {
            if !verify_ballot(parameters, election, options, voter, ballot)? {
                warn!("supplied ballot of voter {} rejected", voter.id);
                return Err(CryptographyError::Verification(format!(
                    "supplied ballot of voter {} does not verify",
                    voter.id
                )));
            }
            let mut voter = voter.clone();
            voter.ballot = Some(ballot.clone());
            voter.vote = None;
            ret.push(voter);
            continue;
        }

        let text = match voter.vote.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text,
            _ => continue,
        };
        let index = options
            .iter()
            .position(|o| o.text == text)
            .ok_or_else(|| CryptographyError::Mismatch(format!("'{}' is not a vote option", text)))?;
        let (alpha, beta) = commitment(voter)?;
        let signature_public = voter.signature.public_key()?;
        let signature_key = voter_key_pairs
            .iter()
            .map(|k| &k.signature)
            .find(|k| k.public_key.as_ref() == Some(signature_public) && k.private_key.is_some())
            .ok_or(CryptographyError::KeyPairNotFound)?;

        let randomness = ctx.rnd_exp();
        let ciphertext = pk.encrypt_with_randomness(&elements[index], &randomness);
        let proof = OptionProof::prove(
            &ctx,
            pk.element(),
            &ciphertext.alpha,
            &ciphertext.beta,
            &randomness,
            &elements,
            index,
            &[alpha, beta],
        )?;
        let signature = Dsa.sign(rng, &parameters.parameters, signature_key, &ciphertext.to_bytes())?;

        let mut voter = voter.clone();
        voter.ballot = Some(Ballot {
            ciphertext,
            signature,
            proof,
        });
        voter.vote = None;
        ret.push(voter);
    }
    info!("encrypted {} of {} votes", ret.len(), voters.len());

    Ok(ret)
}

/// Checks the ballot signature against the voter's signature key and the
/// option proof against the voter's commitment.
pub fn verify_ballot(
    parameters: &ElectionParameters,
    election: &ElectionKeyPair,
    options: &[VoteOption],
    voter: &Voter,
    ballot: &Ballot,
) -> Result<bool> {
    let (ctx, pk) = election_key(parameters, election)?;
    let elements = option_elements(options)?;
    let (alpha, beta) = commitment(voter)?;
    let signature_key = KeyPair::public(voter.signature.public_key()?.clone());

    let signed = Dsa.verify(
        &parameters.parameters,
        &signature_key,
        &ballot.ciphertext.to_bytes(),
        &ballot.signature,
    )?;
    if !signed {
        debug!("ballot signature of voter {} rejected", voter.id);
        return Ok(false);
    }

    Ok(ballot.proof.verify(
        &ctx,
        pk.element(),
        &ballot.ciphertext.alpha,
        &ballot.ciphertext.beta,
        &elements,
        &[alpha, beta],
    ))
}

fn check_rows(votes: &EncryptedVotes) -> Result<()> {
    if votes.trackers.len() != votes.votes.len() {
        return Err(CryptographyError::Mismatch(format!(
            "{} trackers for {} votes",
            votes.trackers.len(),
            votes.votes.len()
        )));
    }
    Ok(())
}

fn check_members(ctx: &BigintCtx, votes: &EncryptedVotes) -> Result<()> {
    let outside = votes
        .trackers
        .iter()
        .chain(votes.votes.iter())
        .any(|c| !ctx.is_valid_element(&c.alpha) || !ctx.is_valid_element(&c.beta));
    if outside {
        return Err(CryptographyError::malformed(
            "mixed ciphertext outside the group",
        ));
    }
    Ok(())
}

/// One teller's mix: a parallel shuffle of `(tracker, vote)` rows.
///
/// Rows stay paired while their order and encryption are replaced. When
/// everyone abstained the mix is empty and so is its proof.
pub fn mix_votes(
    parameters: &ElectionParameters,
    election: &ElectionKeyPair,
    teller: usize,
    votes: &EncryptedVotes,
    store: &dyn ArtifactStore,
    progress: &dyn ProgressListener,
) -> Result<Mix> {
    check_rows(votes)?;
    let artifact = ArtifactKey::new(parameters, teller, VOTE_MIX);
    if votes.is_empty() {
        let proof = ParallelShuffleProof { proofs: vec![] };
        store.write(&artifact, &proof.selene_serialize()?)?;
        info!("teller {} mixed an empty ballot box", teller);
        return Ok(Mix {
            votes: EncryptedVotes::default(),
            artifact,
        });
    }

    let (ctx, pk) = election_key(parameters, election)?;
    check_members(&ctx, votes)?;
    let generators = ctx.generators(votes.len() + 1, MIX_GENERATORS, &parameters.hash());
    let shuffler = Shuffler::new(&pk, &generators, &ctx);
    let lists = [votes.trackers.clone(), votes.votes.clone()];
    let label = proof_label(VOTE_MIX, teller);

    let (mut shuffled, proof) = shuffler.gen_parallel_shuffle(&lists, &label)?;
    progress.on_progress(Progress::Shuffled { count: votes.len() });
    progress.on_progress(Progress::ProofGenerated);
    store.write(&artifact, &proof.selene_serialize()?)?;

    let votes_out = shuffled.pop().unwrap_or_default();
    let trackers_out = shuffled.pop().unwrap_or_default();
    info!("teller {} mixed {} votes", teller, votes_out.len());

    Ok(Mix {
        votes: EncryptedVotes {
            trackers: trackers_out,
            votes: votes_out,
        },
        artifact,
    })
}

pub fn verify_mix(
    parameters: &ElectionParameters,
    election: &ElectionKeyPair,
    input: &EncryptedVotes,
    mix: &Mix,
    store: &dyn ArtifactStore,
) -> Result<bool> {
    check_rows(input)?;
    check_rows(&mix.votes)?;
    let proof = ParallelShuffleProof::selene_deserialize(&store.require(&mix.artifact)?)?;
    if input.is_empty() {
        return Ok(mix.votes.is_empty() && proof.proofs.is_empty());
    }

    let (ctx, pk) = election_key(parameters, election)?;
    check_members(&ctx, input)?;
    check_members(&ctx, &mix.votes)?;
    let generators = ctx.generators(input.len() + 1, MIX_GENERATORS, &parameters.hash());
    let shuffler = Shuffler::new(&pk, &generators, &ctx);
    let lists = [input.trackers.clone(), input.votes.clone()];
    let shuffled = [mix.votes.trackers.clone(), mix.votes.votes.clone()];
    let label = proof_label(VOTE_MIX, mix.artifact.teller);

    let ok = shuffler.check_parallel_proof(&proof, &lists, &shuffled, &label);
    if !ok {
        warn!("vote mix of teller {} rejected", mix.artifact.teller);
    }

    Ok(ok)
}

fn mixed_ciphertexts(votes: &EncryptedVotes) -> Vec<Ciphertext> {
    votes
        .trackers
        .iter()
        .chain(votes.votes.iter())
        .cloned()
        .collect()
}

/// One teller's decryption factors for the fully mixed rows.
pub fn decrypt_votes(
    parameters: &ElectionParameters,
    teller_key: &TellerKeyPair,
    votes: &EncryptedVotes,
    store: &dyn ArtifactStore,
) -> Result<PartialDecryption> {
    check_rows(votes)?;
    let partial = teller_key.decryption_factors(parameters, &mixed_ciphertexts(votes))?;
    let artifact = ArtifactKey::new(parameters, teller_key.teller, VOTE_DECRYPTION);
    store.write(&artifact, &partial.selene_serialize()?)?;
    info!("teller {} decrypted {} mixed votes", teller_key.teller, votes.len());

    Ok(partial)
}

/// Barrier after the tellers' vote decryptions: the published
/// `(tracker, vote)` results, ordered by tracker number.
pub fn merge_vote_decryptions(
    parameters: &ElectionParameters,
    election: &ElectionKeyPair,
    tracker_numbers: &[TrackerNumber],
    options: &[VoteOption],
    votes: &EncryptedVotes,
    partials: &[PartialDecryption],
) -> Result<Vec<MixedVote>> {
    check_rows(votes)?;
    if votes.is_empty() {
        return Ok(vec![]);
    }
    let plaintexts = combine_decryptions(parameters, election, &mixed_ciphertexts(votes), partials)?;
    let (trackers, choices) = plaintexts.split_at(votes.len());

    let by_element: HashMap<&BigUint, u64> =
        tracker_numbers.iter().map(|t| (&t.element, t.id)).collect();
    let by_option: HashMap<&BigUint, &str> = options
        .iter()
        .filter_map(|o| o.element.as_ref().map(|e| (e, o.text.as_str())))
        .collect();

    let mut ret = trackers
        .iter()
        .zip(choices.iter())
        .map(|(tracker, choice)| -> Result<MixedVote> {
            let tracker_number = *by_element
                .get(tracker)
                .ok_or(CryptographyError::TrackerNotFound)?;
            let vote = by_option.get(choice).ok_or_else(|| {
                CryptographyError::Mismatch("decrypted vote is not a vote option".to_string())
            })?;
            Ok(MixedVote {
                tracker_number,
                vote: vote.to_string(),
            })
        })
        .collect::<Result<Vec<MixedVote>>>()?;
    ret.sort_by_key(|v| v.tracker_number);
    info!("published {} mixed votes", ret.len());

    Ok(ret)
}
