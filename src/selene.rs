// SPDX-FileCopyrightText: 2022 David Ruescas <david@sequentech.io>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Selene election protocol.
//!
//! An election runs through these stages, each teller publishing its
//! proofs to an [`ArtifactStore`](crate::store::ArtifactStore):
//!
//! 1. parameters and key generation ([`election`])
//! 2. tracker numbers, created and shuffled by every teller ([`tracker`])
//! 3. per voter commitments to the shuffled trackers ([`commitment`])
//! 4. encrypted and signed ballots, mixed and decrypted ([`vote`])
//!
//! Voters finally open their commitment with their trapdoor key to learn
//! their tracker, and look it up in the published results.
use num_bigint::BigUint;

use crate::context::BigintCtx;
use crate::elgamal::PublicKey;
use crate::error::{CryptographyError, Result};
use crate::keymaker::ElectionKeyPair;
use crate::parameters::ElectionParameters;

pub mod commitment;
pub mod election;
pub mod model;
pub mod tracker;
pub mod vote;

pub use commitment::{
    collect_decryptions, combine_commitments, complete_commitments, create_commitments,
    decrypt_commitments, merge_commitment_decryptions, verify_commitments,
};
pub use election::{
    allocate_voters, associate_voters, collect_teller_information, create_authority_key_pair,
    create_election_parameters, create_voters_key_pairs, publish_teller_information,
};
pub use model::{
    Ballot, Commitment, EncryptedVotes, Identity, Mix, MixedVote, Shuffle, TrackerNumber,
    VoteOption, Voter,
};
pub use tracker::{
    create_tracker_numbers, decrypt_tracker_number, find_vote, shuffle_tracker_numbers,
    tracker_ciphertexts, verify_shuffle,
};
pub use vote::{
    decrypt_votes, encrypt_votes, map_vote_options, merge_vote_decryptions, mix_votes,
    verify_ballot, verify_mix,
};

/// Generator set used by tracker shuffles.
pub const TRACKER_GENERATORS: u32 = 0;
/// Generator set used by vote mixes.
pub const MIX_GENERATORS: u32 = 1;

pub(crate) fn proof_label(name: &str, teller: usize) -> Vec<u8> {
    let mut ret = name.as_bytes().to_vec();
    ret.extend_from_slice(&(teller as u64).to_le_bytes());
    ret
}

/// The election group and its validated public key.
pub(crate) fn election_key(
    parameters: &ElectionParameters,
    election: &ElectionKeyPair,
) -> Result<(BigintCtx, PublicKey)> {
    let ctx = parameters.ctx()?;
    let element: &BigUint = &election.public_key;
    if !ctx.is_valid_element(element) {
        return Err(CryptographyError::malformed(
            "election public key is not a group element",
        ));
    }
    let pk = PublicKey::from_element(element, &ctx);

    Ok((ctx, pk))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::keymaker::tests::generate_keys;
    use crate::parameters::tests::election_256;

    #[test]
    fn test_proof_label() {
        assert_ne!(proof_label("mix", 1), proof_label("mix", 2));
        assert!(proof_label("mix", 1).starts_with(b"mix"));
    }

    #[test]
    fn test_election_key() {
        let parameters = election_256(0, 0);
        let mut election = generate_keys(&parameters)[0].election.clone();
        let (_, pk) = election_key(&parameters, &election).unwrap();
        assert_eq!(pk.element(), &election.public_key);

        election.public_key = BigUint::from(0u32);
        let e = election_key(&parameters, &election).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Malformed);
    }
}
