// SPDX-FileCopyrightText: 2022 David Ruescas <david@sequentech.io>
//
// SPDX-License-Identifier: AGPL-3.0-only
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::context::BigintCtx;
use crate::error::{CryptographyError, Result};
use crate::serialization::hex_biguint_option;
use crate::view::{Projection, View};

/// A secret exponent and its public group element, either may be absent.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPair {
    #[serde(default, with = "hex_biguint_option", skip_serializing_if = "Option::is_none")]
    pub private_key: Option<BigUint>,
    #[serde(default, with = "hex_biguint_option", skip_serializing_if = "Option::is_none")]
    pub public_key: Option<BigUint>,
}

impl KeyPair {
    pub fn new(private_key: BigUint, public_key: BigUint) -> KeyPair {
        KeyPair {
            private_key: Some(private_key),
            public_key: Some(public_key),
        }
    }

    pub fn from_private(private_key: BigUint, ctx: &BigintCtx) -> KeyPair {
        let public_key = ctx.gmod_pow(&private_key);
        KeyPair::new(private_key, public_key)
    }

    pub fn public(public_key: BigUint) -> KeyPair {
        KeyPair {
            private_key: None,
            public_key: Some(public_key),
        }
    }

    pub fn private_key(&self) -> Result<&BigUint> {
        self.private_key
            .as_ref()
            .ok_or(CryptographyError::MissingKey("private key"))
    }

    pub fn public_key(&self) -> Result<&BigUint> {
        self.public_key
            .as_ref()
            .ok_or(CryptographyError::MissingKey("public key"))
    }
}

// private keys stay out of logs
impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("public_key", &self.public_key.as_ref().map(|k| k.to_str_radix(16)))
            .finish()
    }
}

impl Projection for KeyPair {
    fn project(&self, view: View) -> Self {
        KeyPair {
            private_key: if view.includes_private_keys() {
                self.private_key.clone()
            } else {
                None
            },
            public_key: self.public_key.clone(),
        }
    }
}

/// The two key pairs issued to every voter.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoterKeyPairs {
    /// ElGamal key used only to open the voter's tracker commitment.
    pub trapdoor: KeyPair,
    /// DSA key signing the voter's ballot.
    pub signature: KeyPair,
}

impl Projection for VoterKeyPairs {
    fn project(&self, view: View) -> Self {
        VoterKeyPairs {
            trapdoor: self.trapdoor.project(view),
            signature: self.signature.project(view),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::ctx_256;
    use crate::error::ErrorKind;

    #[test]
    fn test_missing_keys() {
        let empty = KeyPair::default();
        assert_eq!(empty.private_key().unwrap_err().kind(), ErrorKind::MissingKey);
        assert_eq!(empty.public_key().unwrap_err().kind(), ErrorKind::MissingKey);

        let ctx = ctx_256();
        let pair = KeyPair::from_private(ctx.rnd_exp(), &ctx);
        assert_eq!(
            &ctx.gmod_pow(pair.private_key().unwrap()),
            pair.public_key().unwrap()
        );
    }

    #[test]
    fn test_projection() {
        let ctx = ctx_256();
        let pair = KeyPair::from_private(ctx.rnd_exp(), &ctx);
        for view in [View::Public, View::RestrictedPublic, View::Export] {
            let projected = pair.project(view);
            assert!(projected.private_key.is_none());
            assert_eq!(projected.public_key, pair.public_key);
            let json = serde_json::to_string(&projected).unwrap();
            assert!(!json.contains("privateKey"));
        }
        assert_eq!(pair.project(View::Private), pair);
        assert_eq!(pair.project(View::Import), pair);
    }

    #[test]
    fn test_debug_redacts() {
        let pair = KeyPair::new(BigUint::from(0xdeadu32), BigUint::from(0xbeefu32));
        let debug = format!("{:?}", pair);
        assert!(!debug.contains("dead"));
        assert!(debug.contains("beef"));
    }
}
