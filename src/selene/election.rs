// SPDX-FileCopyrightText: 2022 David Ruescas <david@sequentech.io>
//
// SPDX-License-Identifier: AGPL-3.0-only
use tracing::info;

use crate::algorithm::Algorithm;
use crate::dsa::Dsa;
use crate::elgamal::ElGamal;
use crate::error::{CryptographyError, Result};
use crate::keymaker::{Teller, TellerInformation, TellerKeyPair};
use crate::keys::{KeyPair, VoterKeyPairs};
use crate::parameters::{ElectionParameters, ParameterOptions};
use crate::progress::ProgressListener;
use crate::rnd::SeleneRngCore;
use crate::selene::model::{Identity, Voter};
use crate::serialization::{SeleneDeserialize, SeleneSerialize};
use crate::store::{ArtifactKey, ArtifactStore, TELLER_INFORMATION};

/// Generates a fresh ElGamal group for a new election.
///
/// `tellers = 0` runs the election with a single local authority.
pub fn create_election_parameters(
    rng: &mut dyn SeleneRngCore,
    name: &str,
    tellers: u32,
    threshold: u32,
    options: &ParameterOptions,
    progress: &dyn ProgressListener,
) -> Result<ElectionParameters> {
    let parameters = ElGamal.create_parameters(rng, options, progress)?;
    let ret = ElectionParameters::new(name, tellers, threshold, parameters)?;
    info!(
        "election '{}' parameters ready, {} tellers, threshold {}",
        name,
        ret.teller_count(),
        ret.threshold()
    );

    Ok(ret)
}

/// Key generation for an election without tellers.
pub fn create_authority_key_pair(parameters: &ElectionParameters) -> Result<TellerKeyPair> {
    if parameters.teller_count() != 1 {
        return Err(CryptographyError::TellerCountMismatch {
            expected: 1,
            found: parameters.teller_count(),
        });
    }
    let teller = Teller::new(parameters, 1)?;
    let information = [teller.information()];
    let shares = [teller.share_for(1)?];

    teller.create_election_key_pair(parameters, &information, &shares)
}

pub fn publish_teller_information(
    parameters: &ElectionParameters,
    information: &TellerInformation,
    store: &dyn ArtifactStore,
) -> Result<ArtifactKey> {
    let key = ArtifactKey::new(parameters, information.teller, TELLER_INFORMATION);
    store.write(&key, &information.selene_serialize()?)?;

    Ok(key)
}

/// Reads back every teller's information; exactly one per teller must exist.
pub fn collect_teller_information(
    parameters: &ElectionParameters,
    store: &dyn ArtifactStore,
) -> Result<Vec<TellerInformation>> {
    let artifacts = store.list(&parameters.hash_hex(), TELLER_INFORMATION)?;
    if artifacts.len() != parameters.teller_count() {
        return Err(CryptographyError::TellerCountMismatch {
            expected: parameters.teller_count(),
            found: artifacts.len(),
        });
    }

    artifacts
        .iter()
        .map(|(teller, bytes)| -> Result<TellerInformation> {
            let information = TellerInformation::selene_deserialize(bytes)?;
            if information.teller != *teller {
                return Err(CryptographyError::Mismatch(format!(
                    "information of teller {} stored under teller {}",
                    information.teller, teller
                )));
            }
            Ok(information)
        })
        .collect()
}

/// Trapdoor (ElGamal) and signature (DSA) key pairs for `n` voters, both
/// over the election group.
pub fn create_voters_key_pairs(
    rng: &mut dyn SeleneRngCore,
    n: usize,
    parameters: &ElectionParameters,
) -> Result<Vec<VoterKeyPairs>> {
    let group = &parameters.parameters;
    let mut ret = Vec::with_capacity(n);
    for _ in 0..n {
        ret.push(VoterKeyPairs {
            trapdoor: ElGamal.create_keys(rng, group)?,
            signature: Dsa.create_keys(rng, group)?,
        });
    }
    info!("created key pairs for {} voters", n);

    Ok(ret)
}

/// Pre-allocated voter records, numbered from 1, holding only public keys.
pub fn allocate_voters(key_pairs: &[VoterKeyPairs]) -> Result<Vec<Voter>> {
    key_pairs
        .iter()
        .enumerate()
        .map(|(i, pair)| -> Result<Voter> {
            Ok(Voter {
                id: (i + 1) as u64,
                trapdoor: KeyPair::public(pair.trapdoor.public_key()?.clone()),
                signature: KeyPair::public(pair.signature.public_key()?.clone()),
                ..Voter::default()
            })
        })
        .collect()
}

/// Joins external identities onto the pre-allocated voters by id.
///
/// Cryptographic material is carried over untouched. Every identity must
/// match a voter.
pub fn associate_voters(identities: &[Identity], voters: &[Voter]) -> Result<Vec<Voter>> {
    let mut ret = voters.to_vec();
    for identity in identities {
        let voter = ret
            .iter_mut()
            .find(|v| v.id == identity.id)
            .ok_or_else(|| CryptographyError::VoterNotFound(identity.id.to_string()))?;
        voter.name = Some(identity.name.clone());
    }

    Ok(ret)
}
