// SPDX-FileCopyrightText: 2021 David Ruescas <david@sequentech.io>
//
// SPDX-License-Identifier: AGPL-3.0-only
//! # Examples
//!
//! ```
//! // This example shows different operations related to ElGamal encryption.
//! use num_bigint::BigUint;
//! use selene::context::BigintCtx;
//! use selene::elgamal::{PrivateKey, PublicKey};
//!
//! let ctx = BigintCtx::new(
//!     BigUint::from(2039u32),
//!     BigUint::from(1019u32),
//!     BigUint::from(4u32),
//! ).unwrap();
//! // generate an ElGamal keypair
//! let sk = PrivateKey::gen(&ctx);
//! let pk = sk.get_pk();
//!
//! let plaintext = BigUint::from(42u32);
//! let encoded = ctx.encode(&plaintext).unwrap();
//!
//! // encrypt, generates randomness internally
//! let ciphertext = pk.encrypt(&encoded);
//! // re-encryption changes the ciphertext but not the plaintext
//! let reencrypted = pk.reencrypt(&ciphertext, &ctx.rnd_exp());
//! assert_ne!(ciphertext, reencrypted);
//!
//! let decrypted = sk.decrypt(&reencrypted);
//! assert_eq!(plaintext, ctx.decode(&decrypted));
//! ```
use borsh::{BorshDeserialize, BorshSerialize};
use num_bigint::BigUint;
use num_traits::One;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::algorithm::{Algorithm, Encryption};
use crate::codec;
use crate::context::BigintCtx;
use crate::error::{CryptographyError, Result};
use crate::keys::KeyPair;
use crate::parameters::{ParameterOptions, Parameters, ParametersKind};
use crate::prime;
use crate::progress::{Progress, ProgressListener};
use crate::rnd::SeleneRngCore;
use crate::serialization::{hex_biguint, read_biguint, write_biguint};
use crate::util::random_residue;

/// Smallest accepted modulus length when generating parameters.
pub const MIN_KEY_LENGTH: u32 = 128;

/// An ElGamal ciphertext.
///
/// Composed of two group elements, computed as
///
/// (g^k, h^k * m)
///
/// where m = message, h = public key, g = generator, k = randomness.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
pub struct Ciphertext {
    #[serde(with = "hex_biguint")]
    pub alpha: BigUint,
    #[serde(with = "hex_biguint")]
    pub beta: BigUint,
}

impl Ciphertext {
    /// Canonical wire encoding, see [`codec`].
    pub fn to_bytes(&self) -> Vec<u8> {
        codec::encode_pair(&self.alpha, &self.beta)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Ciphertext> {
        let (alpha, beta) = codec::decode_pair(bytes)?;
        Ok(Ciphertext { alpha, beta })
    }

    /// Component-wise product, an encryption of the product of plaintexts.
    pub fn mul(&self, other: &Ciphertext, ctx: &BigintCtx) -> Ciphertext {
        Ciphertext {
            alpha: ctx.mul(&self.alpha, &other.alpha),
            beta: ctx.mul(&self.beta, &other.beta),
        }
    }
}

impl BorshSerialize for Ciphertext {
    fn serialize<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        write_biguint(&self.alpha, writer)?;
        write_biguint(&self.beta, writer)
    }
}

impl BorshDeserialize for Ciphertext {
    fn deserialize(buf: &mut &[u8]) -> std::io::Result<Self> {
        let alpha = read_biguint(buf)?;
        let beta = read_biguint(buf)?;
        Ok(Ciphertext { alpha, beta })
    }
}

/// An ElGamal public key.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PublicKey {
    pub(crate) element: BigUint,
    pub(crate) ctx: BigintCtx,
}

/// An ElGamal private key.
#[derive(Eq, PartialEq, Clone)]
pub struct PrivateKey {
    pub(crate) value: BigUint,
    pub(crate) pk_element: BigUint,
    pub(crate) ctx: BigintCtx,
}

impl PublicKey {
    pub fn encrypt(&self, plaintext: &BigUint) -> Ciphertext {
        let randomness = self.ctx.rnd_exp();
        self.encrypt_with_randomness(plaintext, &randomness)
    }
    pub fn encrypt_with_randomness(&self, plaintext: &BigUint, randomness: &BigUint) -> Ciphertext {
        let ctx = &self.ctx;
        Ciphertext {
            alpha: ctx.gmod_pow(randomness),
            beta: ctx.mul(plaintext, &ctx.emod_pow(&self.element, randomness)),
        }
    }
    /// Multiplies `c` by an encryption of one.
    pub fn reencrypt(&self, c: &Ciphertext, randomness: &BigUint) -> Ciphertext {
        let ctx = &self.ctx;
        Ciphertext {
            alpha: ctx.mul(&c.alpha, &ctx.gmod_pow(randomness)),
            beta: ctx.mul(&c.beta, &ctx.emod_pow(&self.element, randomness)),
        }
    }
    pub fn from_element(element: &BigUint, ctx: &BigintCtx) -> PublicKey {
        PublicKey {
            element: element.clone(),
            ctx: ctx.clone(),
        }
    }
    pub fn element(&self) -> &BigUint {
        &self.element
    }
}

impl PrivateKey {
    pub fn decrypt(&self, c: &Ciphertext) -> BigUint {
        let ctx = &self.ctx;
        ctx.div(&c.beta, &self.decryption_factor(c))
    }
    pub fn decryption_factor(&self, c: &Ciphertext) -> BigUint {
        self.ctx.emod_pow(&c.alpha, &self.value)
    }
    pub fn gen(ctx: &BigintCtx) -> PrivateKey {
        let secret = ctx.rnd_exp();
        PrivateKey::from(&secret, ctx)
    }
    pub fn from(secret: &BigUint, ctx: &BigintCtx) -> PrivateKey {
        let pk_element = ctx.gmod_pow(secret);
        PrivateKey {
            value: secret.clone(),
            pk_element,
            ctx: ctx.clone(),
        }
    }
    pub fn pk_element(&self) -> &BigUint {
        &self.pk_element
    }
    pub fn get_pk(&self) -> PublicKey {
        PublicKey {
            element: self.pk_element.clone(),
            ctx: self.ctx.clone(),
        }
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("pk_element", &self.pk_element)
            .finish_non_exhaustive()
    }
}

/// ElGamal over safe prime groups.
#[derive(Clone, Copy, Debug, Default)]
pub struct ElGamal;

impl Algorithm for ElGamal {
    fn name(&self) -> &'static str {
        "ElGamal"
    }

    fn parameters_kind(&self) -> Option<ParametersKind> {
        Some(ParametersKind::ElGamal)
    }

    fn create_parameters(
        &self,
        rng: &mut dyn SeleneRngCore,
        options: &ParameterOptions,
        progress: &dyn ProgressListener,
    ) -> Result<Parameters> {
        let length = options.elgamal_length();
        if length < MIN_KEY_LENGTH {
            return Err(CryptographyError::malformed(format!(
                "ElGamal key length {} is below {}",
                length, MIN_KEY_LENGTH
            )));
        }
        let (p, q) = prime::safe_prime(rng, length, options.certainty(), progress)?;

        // squares generate the quadratic residues, the order q subgroup
        let two = BigUint::from(2u32);
        let upper = &p - &two;
        let g = loop {
            let h = random_residue(rng, &two, &upper);
            let g = h.modpow(&two, &p);
            if !g.is_one() {
                break g;
            }
        };
        progress.on_progress(Progress::ParametersFound);
        info!("created ElGamal parameters, L = {}", length);

        Ok(Parameters::new(ParametersKind::ElGamal, p, q, g))
    }

    fn create_keys(&self, rng: &mut dyn SeleneRngCore, parameters: &Parameters) -> Result<KeyPair> {
        self.check_parameters(parameters)?;
        let one = BigUint::one();
        let x = random_residue(rng, &one, &(&parameters.q - &one));
        let y = parameters.g.modpow(&x, &parameters.p);

        Ok(KeyPair::new(x, y))
    }

    fn encrypt(
        &self,
        rng: &mut dyn SeleneRngCore,
        parameters: &Parameters,
        key_pair: &KeyPair,
        data: &[u8],
    ) -> Result<Encryption> {
        self.check_parameters(parameters)?;
        let public_key = key_pair.public_key()?;
        let m = BigUint::from_bytes_be(data);
        if m >= parameters.p {
            return Err(CryptographyError::malformed("plaintext is not in the group"));
        }

        let p = &parameters.p;
        let one = BigUint::one();
        let k = random_residue(rng, &one, &(p - &one));
        let ciphertext = Ciphertext {
            alpha: parameters.g.modpow(&k, p),
            beta: (public_key.modpow(&k, p) * m) % p,
        };

        Ok(Encryption {
            ciphertext: ciphertext.to_bytes(),
            randomness: k,
        })
    }

    fn decrypt(&self, parameters: &Parameters, key_pair: &KeyPair, data: &[u8]) -> Result<Vec<u8>> {
        self.check_parameters(parameters)?;
        let x = key_pair.private_key()?;
        let c = Ciphertext::from_bytes(data)?;

        // alpha^(p - 1 - x) = alpha^-x
        let p = &parameters.p;
        let exponent = (p - 1u32) - (x % (p - 1u32));
        let m = (c.alpha.modpow(&exponent, p) * c.beta) % p;

        Ok(m.to_bytes_be())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::{ctx_256, ctx_512};
    use crate::error::ErrorKind;
    use crate::parameters::tests::parameters_256;
    use crate::progress::Silent;
    use crate::rnd::SeleneRng;
    use num_traits::Zero;
    use proptest::prelude::*;

    #[test]
    fn test_elgamal_ctx() {
        for ctx in [ctx_256(), ctx_512()] {
            let sk = PrivateKey::gen(&ctx);
            let pk = sk.get_pk();
            let plaintext = BigUint::from(1234u32);
            let encoded = ctx.encode(&plaintext).unwrap();

            let c = pk.encrypt(&encoded);
            assert_eq!(ctx.decode(&sk.decrypt(&c)), plaintext);

            let c2 = pk.reencrypt(&c, &ctx.rnd_exp());
            assert_ne!(c, c2);
            assert_eq!(ctx.decode(&sk.decrypt(&c2)), plaintext);
        }
    }

    #[test]
    fn test_homomorphic_mul() {
        let ctx = ctx_256();
        let sk = PrivateKey::gen(&ctx);
        let pk = sk.get_pk();
        let a = ctx.rnd();
        let b = ctx.rnd();
        let product = pk.encrypt(&a).mul(&pk.encrypt(&b), &ctx);
        assert_eq!(sk.decrypt(&product), ctx.mul(&a, &b));
    }

    #[test]
    fn test_algorithm_roundtrip() {
        let mut rng = SeleneRng;
        let parameters = parameters_256();
        let elgamal = ElGamal;
        let key_pair = elgamal.create_keys(&mut rng, &parameters).unwrap();

        let data = vec![0x01, 0x02, 0x03, 0x04];
        let e1 = elgamal.encrypt(&mut rng, &parameters, &key_pair, &data).unwrap();
        let e2 = elgamal.encrypt(&mut rng, &parameters, &key_pair, &data).unwrap();
        assert_ne!(e1.ciphertext, e2.ciphertext);
        assert_ne!(e1.randomness, e2.randomness);

        let decrypted = elgamal.decrypt(&parameters, &key_pair, &e1.ciphertext).unwrap();
        assert_eq!(decrypted, data);

        // the randomness opens the ciphertext
        let c = Ciphertext::from_bytes(&e1.ciphertext).unwrap();
        assert_eq!(c.alpha, parameters.g.modpow(&e1.randomness, &parameters.p));
    }

    #[test]
    fn test_algorithm_errors() {
        let mut rng = SeleneRng;
        let parameters = parameters_256();
        let elgamal = ElGamal;
        let key_pair = elgamal.create_keys(&mut rng, &parameters).unwrap();

        let public = KeyPair::public(key_pair.public_key().unwrap().clone());
        let encryption = elgamal.encrypt(&mut rng, &parameters, &public, &[7]).unwrap();
        let e = elgamal
            .decrypt(&parameters, &public, &encryption.ciphertext)
            .unwrap_err();
        assert_eq!(e.kind(), ErrorKind::MissingKey);

        let e = elgamal
            .encrypt(&mut rng, &parameters, &KeyPair::default(), &[7])
            .unwrap_err();
        assert_eq!(e.kind(), ErrorKind::MissingKey);

        let too_big = parameters.p.to_bytes_be();
        let e = elgamal
            .encrypt(&mut rng, &parameters, &key_pair, &too_big)
            .unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Malformed);

        let truncated = &encryption.ciphertext[0..encryption.ciphertext.len() - 1];
        let e = elgamal.decrypt(&parameters, &key_pair, truncated).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn test_create_parameters() {
        let mut rng = SeleneRng;
        let options = ParameterOptions {
            key_length: Some(128),
            subgroup_length: None,
            certainty: Some(40),
        };
        let parameters = ElGamal.create_parameters(&mut rng, &options, &Silent).unwrap();
        assert_eq!(parameters.l, 128);
        assert_eq!(parameters.kind, ParametersKind::ElGamal);
        parameters.validate(&mut rng, 40).unwrap();

        let options = ParameterOptions {
            key_length: Some(64),
            ..Default::default()
        };
        assert!(ElGamal.create_parameters(&mut rng, &options, &Silent).is_err());
    }

    #[test]
    fn test_algorithm_plaintext_range() {
        let mut rng = SeleneRng;
        let parameters = parameters_256();
        let key_pair = ElGamal.create_keys(&mut rng, &parameters).unwrap();
        let p = &parameters.p;
        let q = &parameters.q;

        // the whole of [0, p) roundtrips, not only the subgroup
        let edges = [
            BigUint::zero(),
            BigUint::one(),
            q - 1u32,
            q.clone(),
            q + 1u32,
            p - 2u32,
            p - 1u32,
        ];
        for m in &edges {
            let encryption = ElGamal
                .encrypt(&mut rng, &parameters, &key_pair, &m.to_bytes_be())
                .unwrap();
            let decrypted = ElGamal
                .decrypt(&parameters, &key_pair, &encryption.ciphertext)
                .unwrap();
            assert_eq!(&BigUint::from_bytes_be(&decrypted), m);
        }

        for m in [p.clone(), p + 1u32, p * 2u32, BigUint::one() << 264] {
            let e = ElGamal
                .encrypt(&mut rng, &parameters, &key_pair, &m.to_bytes_be())
                .unwrap_err();
            assert_eq!(e.kind(), ErrorKind::Malformed);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]
        #[test]
        fn test_decrypt_encrypt(bytes in proptest::collection::vec(any::<u8>(), 0..=32)) {
            let mut rng = SeleneRng;
            let parameters = parameters_256();
            let key_pair = ElGamal.create_keys(&mut rng, &parameters).unwrap();
            // full width values reduced into [0, p)
            let m = BigUint::from_bytes_be(&bytes) % &parameters.p;
            let encryption = ElGamal.encrypt(&mut rng, &parameters, &key_pair, &m.to_bytes_be()).unwrap();
            let decrypted = ElGamal.decrypt(&parameters, &key_pair, &encryption.ciphertext).unwrap();
            prop_assert_eq!(BigUint::from_bytes_be(&decrypted), m);
        }
    }
}
