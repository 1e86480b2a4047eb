// SPDX-FileCopyrightText: 2022 David Ruescas <david@sequentech.io>
//
// SPDX-License-Identifier: AGPL-3.0-only
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use crate::elgamal::Ciphertext;
use crate::keys::KeyPair;
use crate::serialization::{base64_bytes, hex_biguint, hex_biguint_option};
use crate::store::ArtifactKey;
use crate::view::{Projection, View};
use crate::zkp::OptionProof;

/// A voter's tracker, `element = g^id`.
///
/// Equality and hashing only look at `id`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackerNumber {
    pub id: u64,
    #[serde(with = "hex_biguint")]
    pub element: BigUint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted: Option<Ciphertext>,
}

impl PartialEq for TrackerNumber {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TrackerNumber {}

impl Hash for TrackerNumber {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Projection for TrackerNumber {
    fn project(&self, _view: View) -> Self {
        self.clone()
    }
}

/// One teller's commitment for one voter: `g = g^r`, `h = pk^r` for the
/// voter's trapdoor key `pk`, and their encryptions under the election key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commitment {
    pub teller: usize,
    /// Voter trapdoor public key.
    #[serde(with = "hex_biguint")]
    pub public_key: BigUint,
    #[serde(default, with = "hex_biguint_option", skip_serializing_if = "Option::is_none")]
    pub g: Option<BigUint>,
    #[serde(default, with = "hex_biguint_option", skip_serializing_if = "Option::is_none")]
    pub h: Option<BigUint>,
    pub encrypted_g: Ciphertext,
    pub encrypted_h: Ciphertext,
}

impl Projection for Commitment {
    fn project(&self, view: View) -> Self {
        Commitment {
            teller: self.teller,
            public_key: self.public_key.clone(),
            g: self.g.clone().filter(|_| view.includes_commitment_g()),
            h: self.h.clone().filter(|_| view.includes_commitment_h()),
            encrypted_g: self.encrypted_g.clone(),
            encrypted_h: self.encrypted_h.clone(),
        }
    }
}

/// A signed vote ciphertext with its proof of well-formedness.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub ciphertext: Ciphertext,
    /// DSA signature over the ciphertext bytes.
    #[serde(with = "base64_bytes")]
    pub signature: Vec<u8>,
    pub proof: OptionProof,
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voter {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub trapdoor: KeyPair,
    pub signature: KeyPair,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_tracker: Option<Ciphertext>,
    /// `g^r`, the product of the tellers' commitment `g` values.
    #[serde(default, with = "hex_biguint_option", skip_serializing_if = "Option::is_none")]
    pub alpha: Option<BigUint>,
    /// `pk^r g^n` for the voter's trapdoor key and tracker `n`.
    #[serde(default, with = "hex_biguint_option", skip_serializing_if = "Option::is_none")]
    pub beta: Option<BigUint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ballot: Option<Ballot>,
    /// The option text the voter cast, until it is encrypted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote: Option<String>,
}

impl Projection for Voter {
    fn project(&self, view: View) -> Self {
        let vote = if self.ballot.is_none() && view.includes_plaintext_votes() {
            self.vote.clone()
        } else {
            None
        };

        Voter {
            id: self.id,
            name: self.name.clone(),
            trapdoor: self.trapdoor.project(view),
            signature: self.signature.project(view),
            encrypted_tracker: self.encrypted_tracker.clone(),
            alpha: self.alpha.clone(),
            beta: self.beta.clone(),
            ballot: self.ballot.clone(),
            vote,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteOption {
    pub text: String,
    #[serde(default, with = "hex_biguint_option", skip_serializing_if = "Option::is_none")]
    pub element: Option<BigUint>,
}

impl VoteOption {
    pub fn new(text: &str) -> VoteOption {
        VoteOption {
            text: text.to_string(),
            element: None,
        }
    }
}

impl Projection for VoteOption {
    fn project(&self, _view: View) -> Self {
        self.clone()
    }
}

/// A published result row: the tracker and the vote it carried.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixedVote {
    pub tracker_number: u64,
    pub vote: String,
}

/// External identity joined onto a pre-allocated voter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: u64,
    pub name: String,
}

/// Output of one teller's tracker shuffle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shuffle {
    pub ciphertexts: Vec<Ciphertext>,
    pub artifact: ArtifactKey,
}

/// Rows of `(encrypted tracker, encrypted vote)` entering or leaving a mix.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedVotes {
    pub trackers: Vec<Ciphertext>,
    pub votes: Vec<Ciphertext>,
}

impl EncryptedVotes {
    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    /// Rows of every voter holding a ballot, abstainers are skipped.
    pub fn from_voters(voters: &[Voter]) -> EncryptedVotes {
        let (trackers, votes) = voters
            .iter()
            .filter_map(|v| match (&v.encrypted_tracker, &v.ballot) {
                (Some(tracker), Some(ballot)) => {
                    Some((tracker.clone(), ballot.ciphertext.clone()))
                }
                _ => None,
            })
            .unzip();

        EncryptedVotes { trackers, votes }
    }
}

/// Output of one teller's vote mix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mix {
    pub votes: EncryptedVotes,
    pub artifact: ArtifactKey,
}
