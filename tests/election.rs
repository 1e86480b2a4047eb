// SPDX-FileCopyrightText: 2022 David Ruescas <david@sequentech.io>
//
// SPDX-License-Identifier: AGPL-3.0-only
use num_bigint::BigUint;
use num_traits::Num;
use std::collections::HashSet;

use selene::elgamal::Ciphertext;
use selene::keymaker::{merge_teller_information, Teller, TellerKeyPair, TellerShare};
use selene::parameters::{ElectionParameters, Parameters, ParametersKind};
use selene::progress::Silent;
use selene::rnd::SeleneRng;
use selene::selene::*;
use selene::store::{ArtifactStore, MemoryStore, COMMITMENT_DECRYPTION, VOTE_DECRYPTION};
use selene::view::{Projection, View};

const P_256: &str = "866058c7c2583f3ed87236ff6b5f73f46d0d05b80d9dc481fb71c97b2f9a7673";
const Q_256: &str = "43302c63e12c1f9f6c391b7fb5afb9fa368682dc06cee240fdb8e4bd97cd3b39";
const VOTERS: usize = 100;
const OPTIONS: [&str; 3] = ["yes", "no", "maybe"];

fn parameters(tellers: u32, threshold: u32) -> ElectionParameters {
    let p = BigUint::from_str_radix(P_256, 16).unwrap();
    let q = BigUint::from_str_radix(Q_256, 16).unwrap();
    let group = Parameters::new(ParametersKind::ElGamal, p, q, BigUint::from(4u32));
    ElectionParameters::new("e2e", tellers, threshold, group).unwrap()
}

// every fourth voter abstains
fn choice(i: usize) -> Option<&'static str> {
    if i % 4 == 3 {
        None
    } else {
        Some(OPTIONS[i % 4 % OPTIONS.len()])
    }
}

fn key_generation(parameters: &ElectionParameters, store: &dyn ArtifactStore) -> Vec<TellerKeyPair> {
    if parameters.number_of_tellers == 0 {
        return vec![create_authority_key_pair(parameters).unwrap()];
    }

    let tellers: Vec<Teller> = (1..=parameters.teller_count())
        .map(|n| Teller::new(parameters, n).unwrap())
        .collect();
    for teller in &tellers {
        publish_teller_information(parameters, &teller.information(), store).unwrap();
    }
    let information = collect_teller_information(parameters, store).unwrap();
    let election = merge_teller_information(parameters, &information).unwrap();

    let count = parameters.teller_count();
    let shares: Vec<TellerShare> = tellers
        .iter()
        .flat_map(|t| (1..=count).map(move |target| t.share_for(target).unwrap()))
        .collect();

    tellers
        .iter()
        .map(|t| {
            // each teller only receives the shares addressed to it
            let received: Vec<TellerShare> = shares
                .iter()
                .filter(|s| s.target == t.number())
                .cloned()
                .collect();
            let key = t
                .create_election_key_pair(parameters, &information, &received)
                .unwrap();
            assert_eq!(key.election, election);
            key
        })
        .collect()
}

fn run_election(tellers: u32, threshold: u32) {
    let mut rng = SeleneRng;
    let parameters = parameters(tellers, threshold);
    let store = MemoryStore::new();
    let keys = key_generation(&parameters, &store);
    let election = keys[0].election.clone();
    let teller_numbers: Vec<usize> = keys.iter().map(|k| k.teller).collect();
    // decrypt with the last tellers so that teller 1 is not always present
    let decrypting = &keys[keys.len() - parameters.threshold()..];

    let key_pairs = create_voters_key_pairs(&mut rng, VOTERS, &parameters).unwrap();
    let voters = allocate_voters(&key_pairs).unwrap();
    let identities: Vec<Identity> = voters
        .iter()
        .map(|v| Identity {
            id: v.id,
            name: format!("voter {}", v.id),
        })
        .collect();
    let voters = associate_voters(&identities, &voters).unwrap();

    // tracker numbers, shuffled by every teller in turn
    let trackers = create_tracker_numbers(&mut rng, &parameters, &election, VOTERS).unwrap();
    let mut shuffled: Vec<Ciphertext> = tracker_ciphertexts(&trackers).unwrap();
    for teller in &teller_numbers {
        let shuffle =
            shuffle_tracker_numbers(&parameters, &election, *teller, &shuffled, &store, &Silent)
                .unwrap();
        assert!(verify_shuffle(&parameters, &election, &shuffled, &shuffle, &store).unwrap());
        shuffled = shuffle.ciphertexts;
    }

    // commitments
    let commitments: Vec<Vec<Commitment>> = teller_numbers
        .iter()
        .map(|teller| {
            let list = create_commitments(&parameters, &election, *teller, &voters, &store).unwrap();
            assert!(verify_commitments(&parameters, *teller, &list, &store).unwrap());
            list
        })
        .collect();
    let published = commitments.project(View::Public);
    assert!(published.iter().flatten().all(|c| c.g.is_none() && c.h.is_none()));

    let combined = combine_commitments(&parameters, &voters, &shuffled, &published).unwrap();
    for key in decrypting {
        decrypt_commitments(&parameters, key, &combined, &store).unwrap();
    }
    let partials = collect_decryptions(&parameters, COMMITMENT_DECRYPTION, &store).unwrap();
    assert_eq!(partials.len(), parameters.threshold());
    let voters =
        merge_commitment_decryptions(&parameters, &election, &voters, &shuffled, &combined, &partials)
            .unwrap();
    let voters =
        complete_commitments(&parameters, &voters, &commitments.project(View::RestrictedPublic))
            .unwrap();

    // votes
    let options: Vec<VoteOption> = OPTIONS.iter().map(|t| VoteOption::new(t)).collect();
    let options = map_vote_options(&parameters, &options).unwrap();
    let voters: Vec<Voter> = voters
        .into_iter()
        .enumerate()
        .map(|(i, mut voter)| {
            voter.vote = choice(i).map(str::to_string);
            voter
        })
        .collect();
    let cast = encrypt_votes(
        &mut rng,
        &parameters,
        &election,
        &key_pairs,
        &options,
        &voters,
        None,
    )
    .unwrap();
    assert_eq!(cast.len(), (0..VOTERS).filter(|i| choice(*i).is_some()).count());
    for voter in &cast {
        let ballot = voter.ballot.as_ref().unwrap();
        assert!(verify_ballot(&parameters, &election, &options, voter, ballot).unwrap());
    }

    let mut mixed = EncryptedVotes::from_voters(&cast);
    for teller in &teller_numbers {
        let mix = mix_votes(&parameters, &election, *teller, &mixed, &store, &Silent).unwrap();
        assert!(verify_mix(&parameters, &election, &mixed, &mix, &store).unwrap());
        mixed = mix.votes;
    }
    for key in decrypting {
        decrypt_votes(&parameters, key, &mixed, &store).unwrap();
    }
    let partials = collect_decryptions(&parameters, VOTE_DECRYPTION, &store).unwrap();
    let results =
        merge_vote_decryptions(&parameters, &election, &trackers, &options, &mixed, &partials)
            .unwrap();
    assert_eq!(results.len(), cast.len());

    // every voter finds their own tracker and vote
    let mut found = HashSet::new();
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
        assert!(found.insert(tracker.id));
        assert_eq!(
            find_vote(&results, tracker.id).map(|r| r.vote.as_str()),
            choice(i)
        );
    }
}

#[test]
fn test_election_without_tellers() {
    run_election(0, 0);
}

#[test]
fn test_threshold_election() {
    run_election(4, 3);
}
