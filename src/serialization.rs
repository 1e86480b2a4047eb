// SPDX-FileCopyrightText: 2023 David Ruescas <david@sequentech.io>
//
// SPDX-License-Identifier: AGPL-3.0-only
use borsh::{BorshDeserialize, BorshSerialize};
use num_bigint::BigUint;
use std::io::{Error, ErrorKind, Write};

use crate::error::{CryptographyError, Result};
use crate::util::Par;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Serialization frontend trait.
pub trait SeleneSerialize {
    fn selene_serialize(&self) -> Result<Vec<u8>>;
}

/// Deserialization frontend trait.
pub trait SeleneDeserialize {
    fn selene_deserialize(bytes: &[u8]) -> Result<Self>
    where
        Self: Sized;
}

impl<T: BorshSerialize> SeleneSerialize for T {
    fn selene_serialize(&self) -> Result<Vec<u8>> {
        self.try_to_vec()
            .map_err(|e| CryptographyError::malformed(format!("borsh serialize failed: {}", e)))
    }
}

impl<T: BorshDeserialize> SeleneDeserialize for T {
    fn selene_deserialize(bytes: &[u8]) -> Result<Self>
    where
        Self: Sized,
    {
        T::try_from_slice(bytes)
            .map_err(|e| CryptographyError::malformed(format!("borsh deserialize failed: {}", e)))
    }
}

// Big integers travel as little-endian byte vectors inside borsh payloads.

pub(crate) fn write_biguint<W: Write>(value: &BigUint, writer: &mut W) -> std::io::Result<()> {
    value.to_bytes_le().serialize(writer)
}

pub(crate) fn read_biguint(buf: &mut &[u8]) -> std::io::Result<BigUint> {
    let bytes = <Vec<u8>>::deserialize(buf)?;
    if bytes.is_empty() {
        return Err(Error::new(ErrorKind::InvalidData, "empty integer"));
    }
    Ok(BigUint::from_bytes_le(&bytes))
}

/// Parallelized serialization for integer vectors.
pub(crate) fn write_biguints<W: Write>(
    values: &[BigUint],
    writer: &mut W,
) -> std::io::Result<()> {
    let vectors: Vec<Vec<u8>> = values.par().map(|v| v.to_bytes_le()).collect();

    vectors.serialize(writer)
}

pub(crate) fn read_biguints(buf: &mut &[u8]) -> std::io::Result<Vec<BigUint>> {
    let vectors = <Vec<Vec<u8>>>::deserialize(buf)?;
    if vectors.iter().any(|v| v.is_empty()) {
        return Err(Error::new(ErrorKind::InvalidData, "empty integer"));
    }

    Ok(vectors.par().map(|v| BigUint::from_bytes_le(&v)).collect())
}

/// serde adapter writing integers as lowercase hex strings.
pub mod hex_biguint {
    use num_bigint::BigUint;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigUint, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_str_radix(16))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BigUint, D::Error> {
        let string = String::deserialize(d)?;
        BigUint::parse_bytes(string.as_bytes(), 16)
            .ok_or_else(|| D::Error::custom(format!("invalid hex integer '{}'", string)))
    }
}

pub mod hex_biguint_option {
    use num_bigint::BigUint;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<BigUint>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => s.serialize_some(&value.to_str_radix(16)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<BigUint>, D::Error> {
        let string: Option<String> = Option::deserialize(d)?;
        match string {
            Some(string) => BigUint::parse_bytes(string.as_bytes(), 16)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid hex integer '{}'", string))),
            None => Ok(None),
        }
    }
}

pub mod hex_biguint_vec {
    use num_bigint::BigUint;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[BigUint], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(values.iter().map(|v| v.to_str_radix(16)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<BigUint>, D::Error> {
        let strings: Vec<String> = Vec::deserialize(d)?;
        strings
            .iter()
            .map(|s| {
                BigUint::parse_bytes(s.as_bytes(), 16)
                    .ok_or_else(|| D::Error::custom(format!("invalid hex integer '{}'", s)))
            })
            .collect()
    }
}

/// serde adapter writing byte blobs as standard base64.
pub mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let string = String::deserialize(d)?;
        STANDARD.decode(string.as_bytes()).map_err(D::Error::custom)
    }
}
