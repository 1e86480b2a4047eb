// SPDX-FileCopyrightText: 2022 David Ruescas <david@sequentech.io>
//
// SPDX-License-Identifier: AGPL-3.0-only
//! The uniform capability set shared by every algorithm.
//!
//! Each algorithm implements the operations it supports and inherits an
//! `Unsupported` error for the rest.
//!
//! ```
//! use selene::algorithm::AlgorithmKind;
//! use selene::error::ErrorKind;
//! use selene::keys::KeyPair;
//! use selene::parameters::{Parameters, ParametersKind};
//! use num_bigint::BigUint;
//!
//! let parameters = Parameters::new(
//!     ParametersKind::Dsa,
//!     BigUint::from(2039u32),
//!     BigUint::from(1019u32),
//!     BigUint::from(4u32),
//! );
//! let dsa = AlgorithmKind::Dsa.algorithm();
//! let e = dsa.decrypt(&parameters, &KeyPair::default(), &[]).unwrap_err();
//! assert_eq!(e.kind(), ErrorKind::Unsupported);
//! ```
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::dsa::Dsa;
use crate::elgamal::ElGamal;
use crate::error::{CryptographyError, Result};
use crate::keys::KeyPair;
use crate::parameters::{ParameterOptions, Parameters, ParametersKind};
use crate::progress::ProgressListener;
use crate::rnd::SeleneRngCore;
use crate::zkp::{ChaumPedersen, Proof, Schnorr, Statement};

/// Output of [`Algorithm::encrypt`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Encryption {
    /// Canonical ciphertext bytes.
    pub ciphertext: Vec<u8>,
    /// Encryption randomness, needed to prove correct encryption.
    pub randomness: BigUint,
}

pub trait Algorithm: Sync {
    fn name(&self) -> &'static str;

    /// Kind of parameters this algorithm creates, `None` if it only consumes
    /// existing groups.
    fn parameters_kind(&self) -> Option<ParametersKind>;

    /// Whether parameters of `kind` can be used with this algorithm.
    fn accepts(&self, kind: ParametersKind) -> bool {
        self.parameters_kind().map_or(true, |k| k == kind)
    }

    fn check_parameters(&self, parameters: &Parameters) -> Result<()> {
        if self.accepts(parameters.kind) {
            Ok(())
        } else {
            Err(CryptographyError::Mismatch(format!(
                "{} cannot use {:?} parameters",
                self.name(),
                parameters.kind
            )))
        }
    }

    fn create_parameters(
        &self,
        _rng: &mut dyn SeleneRngCore,
        _options: &ParameterOptions,
        _progress: &dyn ProgressListener,
    ) -> Result<Parameters> {
        Err(CryptographyError::unsupported(self.name(), "create parameters"))
    }

    fn create_keys(&self, _rng: &mut dyn SeleneRngCore, _parameters: &Parameters) -> Result<KeyPair> {
        Err(CryptographyError::unsupported(self.name(), "create keys"))
    }

    fn encrypt(
        &self,
        _rng: &mut dyn SeleneRngCore,
        _parameters: &Parameters,
        _key_pair: &KeyPair,
        _data: &[u8],
    ) -> Result<Encryption> {
        Err(CryptographyError::unsupported(self.name(), "encrypt"))
    }

    fn decrypt(&self, _parameters: &Parameters, _key_pair: &KeyPair, _data: &[u8]) -> Result<Vec<u8>> {
        Err(CryptographyError::unsupported(self.name(), "decrypt"))
    }

    fn sign(
        &self,
        _rng: &mut dyn SeleneRngCore,
        _parameters: &Parameters,
        _key_pair: &KeyPair,
        _data: &[u8],
    ) -> Result<Vec<u8>> {
        Err(CryptographyError::unsupported(self.name(), "sign"))
    }

    fn verify(
        &self,
        _parameters: &Parameters,
        _key_pair: &KeyPair,
        _data: &[u8],
        _signature: &[u8],
    ) -> Result<bool> {
        Err(CryptographyError::unsupported(self.name(), "verify"))
    }

    fn generate_proof(
        &self,
        _rng: &mut dyn SeleneRngCore,
        _parameters: &Parameters,
        _witness: Option<&BigUint>,
        _statements: &[Statement],
    ) -> Result<Proof> {
        Err(CryptographyError::unsupported(self.name(), "generate proof"))
    }

    fn verify_proof(
        &self,
        _parameters: &Parameters,
        _proof: &Proof,
        _statements: &[Statement],
    ) -> Result<bool> {
        Err(CryptographyError::unsupported(self.name(), "verify proof"))
    }
}

/// The algorithms fixed per protocol step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlgorithmKind {
    Dsa,
    ElGamal,
    Schnorr,
    ChaumPedersen,
}

static DSA: Dsa = Dsa;
static ELGAMAL: ElGamal = ElGamal;
static SCHNORR: Schnorr = Schnorr;
static CHAUM_PEDERSEN: ChaumPedersen = ChaumPedersen;

impl AlgorithmKind {
    pub fn algorithm(&self) -> &'static dyn Algorithm {
        match self {
            AlgorithmKind::Dsa => &DSA,
            AlgorithmKind::ElGamal => &ELGAMAL,
            AlgorithmKind::Schnorr => &SCHNORR,
            AlgorithmKind::ChaumPedersen => &CHAUM_PEDERSEN,
        }
    }
}
