// SPDX-FileCopyrightText: 2022 David Ruescas <david@sequentech.io>
//
// SPDX-License-Identifier: AGPL-3.0-only
//! FIPS 186-4 DSA over `(p, q, g)`.
//!
//! The message digest is chosen by the bit length of `q` and its leftmost
//! `min(N, outlen)` bits are signed. Signatures are the canonical pair
//! encoding of `(r, s)`.
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};
use tracing::info;

use crate::algorithm::Algorithm;
use crate::codec;
use crate::error::Result;
use crate::keys::KeyPair;
use crate::parameters::{ParameterOptions, Parameters, ParametersKind};
use crate::prime;
use crate::progress::{Progress, ProgressListener};
use crate::rnd::SeleneRngCore;
use crate::util::{random_residue, DigestAlgorithm};

#[derive(Clone, Copy, Debug, Default)]
pub struct Dsa;

fn message_representative(parameters: &Parameters, data: &[u8]) -> BigUint {
    let bits = parameters.q.bits();
    DigestAlgorithm::for_bits(bits).digest_to_integer(data, bits)
}

impl Algorithm for Dsa {
    fn name(&self) -> &'static str {
        "DSA"
    }

    fn parameters_kind(&self) -> Option<ParametersKind> {
        Some(ParametersKind::Dsa)
    }

    // any prime order subgroup works, safe prime groups included
    fn accepts(&self, _kind: ParametersKind) -> bool {
        true
    }

    fn create_parameters(
        &self,
        rng: &mut dyn SeleneRngCore,
        options: &ParameterOptions,
        progress: &dyn ProgressListener,
    ) -> Result<Parameters> {
        let (l, n) = options.dsa_lengths();
        let (p, q) = prime::fips_186_4(rng, l, n, options.certainty(), progress)?;
        let g = prime::generator(&p, &q)?;
        progress.on_progress(Progress::ParametersFound);
        info!("created DSA parameters, (L, N) = ({}, {})", l, n);

        Ok(Parameters::new(ParametersKind::Dsa, p, q, g))
    }

    fn create_keys(&self, rng: &mut dyn SeleneRngCore, parameters: &Parameters) -> Result<KeyPair> {
        self.check_parameters(parameters)?;
        let one = BigUint::one();
        let x = random_residue(rng, &one, &(&parameters.q - &one));
        let y = parameters.g.modpow(&x, &parameters.p);

        Ok(KeyPair::new(x, y))
    }

    fn sign(
        &self,
        rng: &mut dyn SeleneRngCore,
        parameters: &Parameters,
        key_pair: &KeyPair,
        data: &[u8],
    ) -> Result<Vec<u8>> {
        self.check_parameters(parameters)?;
        let x = key_pair.private_key()?;
        let (p, q) = (&parameters.p, &parameters.q);
        let z = message_representative(parameters, data);
        let one = BigUint::one();
        let q_minus_one = q - &one;

        loop {
            let k = random_residue(rng, &one, &q_minus_one);
            let r = parameters.g.modpow(&k, p).mod_floor(q);
            if r.is_zero() {
                continue;
            }
            // k^-1 = k^(q - 2) mod q
            let k_inv = k.modpow(&(q - 2u32), q);
            let s = (k_inv * (&z + x * &r)).mod_floor(q);
            if s.is_zero() {
                continue;
            }

            return Ok(codec::encode_pair(&r, &s));
        }
    }

    fn verify(
        &self,
        parameters: &Parameters,
        key_pair: &KeyPair,
        data: &[u8],
        signature: &[u8],
    ) -> Result<bool> {
        self.check_parameters(parameters)?;
        let y = key_pair.public_key()?;
        let (r, s) = codec::decode_pair(signature)?;
        let (p, q) = (&parameters.p, &parameters.q);

        if r.is_zero() || &r >= q || s.is_zero() || &s >= q {
            return Ok(false);
        }
        let w = s.modpow(&(q - 2u32), q);
        let z = message_representative(parameters, data);
        let u1 = (&z * &w).mod_floor(q);
        let u2 = (&r * &w).mod_floor(q);
        let v = (parameters.g.modpow(&u1, p) * y.modpow(&u2, p))
            .mod_floor(p)
            .mod_floor(q);

        Ok(v == r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::parameters::tests::parameters_256;
    use crate::progress::Silent;
    use crate::rnd::SeleneRng;

    #[test]
    fn test_sign_verify() {
        let mut rng = SeleneRng;
        let parameters = parameters_256();
        let key_pair = Dsa.create_keys(&mut rng, &parameters).unwrap();
        let data = b"ballot bytes";

        let s1 = Dsa.sign(&mut rng, &parameters, &key_pair, data).unwrap();
        let s2 = Dsa.sign(&mut rng, &parameters, &key_pair, data).unwrap();
        assert_ne!(s1, s2);
        assert!(Dsa.verify(&parameters, &key_pair, data, &s1).unwrap());
        assert!(Dsa.verify(&parameters, &key_pair, data, &s2).unwrap());

        assert!(!Dsa.verify(&parameters, &key_pair, b"ballot bytez", &s1).unwrap());

        let other = Dsa.create_keys(&mut rng, &parameters).unwrap();
        assert!(!Dsa.verify(&parameters, &other, data, &s1).unwrap());
    }

    #[test]
    fn test_out_of_range_signature() {
        let mut rng = SeleneRng;
        let parameters = parameters_256();
        let key_pair = Dsa.create_keys(&mut rng, &parameters).unwrap();
        let zero = codec::encode_pair(&BigUint::zero(), &BigUint::one());
        assert!(!Dsa.verify(&parameters, &key_pair, b"x", &zero).unwrap());
        let big = codec::encode_pair(&BigUint::one(), &parameters.q);
        assert!(!Dsa.verify(&parameters, &key_pair, b"x", &big).unwrap());

        let e = Dsa.verify(&parameters, &key_pair, b"x", &[0, 0, 0, 5]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn test_missing_keys() {
        let mut rng = SeleneRng;
        let parameters = parameters_256();
        let key_pair = Dsa.create_keys(&mut rng, &parameters).unwrap();
        let signature = Dsa.sign(&mut rng, &parameters, &key_pair, b"x").unwrap();

        let public = KeyPair::public(key_pair.public_key().unwrap().clone());
        let e = Dsa.sign(&mut rng, &parameters, &public, b"x").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::MissingKey);
        assert!(Dsa.verify(&parameters, &public, b"x", &signature).unwrap());

        let e = Dsa
            .verify(&parameters, &KeyPair::default(), b"x", &signature)
            .unwrap_err();
        assert_eq!(e.kind(), ErrorKind::MissingKey);
    }

    #[test]
    fn test_create_parameters() {
        let mut rng = SeleneRng;
        let options = ParameterOptions {
            key_length: Some(1024),
            subgroup_length: Some(160),
            certainty: Some(40),
        };
        let parameters = Dsa.create_parameters(&mut rng, &options, &Silent).unwrap();
        assert_eq!(parameters.kind, ParametersKind::Dsa);
        assert_eq!((parameters.l, parameters.m), (1024, 160));
        parameters.validate(&mut rng, 40).unwrap();

        let key_pair = Dsa.create_keys(&mut rng, &parameters).unwrap();
        let signature = Dsa.sign(&mut rng, &parameters, &key_pair, b"x").unwrap();
        assert!(Dsa.verify(&parameters, &key_pair, b"x", &signature).unwrap());
        assert!(!Dsa.verify(&parameters, &key_pair, b"y", &signature).unwrap());
    }
}
