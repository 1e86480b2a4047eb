// SPDX-FileCopyrightText: 2021 David Ruescas <david@sequentech.io>
//
// SPDX-License-Identifier: AGPL-3.0-only

#![doc = include_str!("../README.md")]

// #![warn(missing_docs)]
extern crate cfg_if;

/// Uniform capability set over DSA and ElGamal.
pub mod algorithm;
/// Canonical byte encoding of integer pairs.
pub mod codec;
/// Modular arithmetic over a prime order subgroup.
pub mod context;
/// DSA signatures.
pub mod dsa;
/// ElGamal encryption.
pub mod elgamal;
pub mod error;
/// Distributed key generation and threshold decryption.
pub mod keymaker;
pub mod keys;
/// Group parameters and election configuration.
pub mod parameters;
/// Probable primes and group generation.
pub mod prime;
pub mod progress;
pub mod rnd;
/// The Selene election protocol.
pub mod selene;
/// Borsh and serde helpers.
pub mod serialization;
/// Wikstrom proof of shuffle.
pub mod shuffler;
/// Per teller artifact storage.
pub mod store;
/// Feldman verifiable secret sharing.
pub mod threshold;
/// Miscellaneous functions.
pub mod util;
/// Record projections.
pub mod view;
/// Schnorr, Chaum-Pedersen and disjunctive zero knowledge proofs.
pub mod zkp;
