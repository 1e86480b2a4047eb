// SPDX-FileCopyrightText: 2022 David Ruescas <david@sequentech.io>
//
// SPDX-License-Identifier: AGPL-3.0-only
//! Canonical byte layout for integer pairs.
//!
//! A pair is written as `[len(a)][a][len(b)][b]` where each length is a
//! 4 byte big-endian count and each integer is the minimal two's complement
//! big-endian encoding of a non-negative value (a leading zero byte is added
//! when the high bit would otherwise be set, zero encodes as a single `0x00`).
use num_bigint::BigUint;

use crate::error::{CryptographyError, Result};

const LENGTH_BYTES: usize = 4;

/// Minimal signed big-endian encoding of a non-negative integer.
pub fn integer_to_bytes(value: &BigUint) -> Vec<u8> {
    let bytes = value.to_bytes_be();
    if bytes[0] & 0x80 != 0 {
        let mut ret = Vec::with_capacity(bytes.len() + 1);
        ret.push(0u8);
        ret.extend(bytes);
        ret
    } else {
        bytes
    }
}

pub fn integer_from_bytes(bytes: &[u8]) -> Result<BigUint> {
    match bytes.first() {
        None => Err(CryptographyError::malformed("zero length integer")),
        Some(b) if b & 0x80 != 0 => Err(CryptographyError::malformed("negative integer")),
        Some(_) => Ok(BigUint::from_bytes_be(bytes)),
    }
}

/// Appends the length prefixed encoding of `value` to `out`.
pub fn write_integer(out: &mut Vec<u8>, value: &BigUint) {
    let bytes = integer_to_bytes(value);
    out.extend((bytes.len() as u32).to_be_bytes());
    out.extend(bytes);
}

/// Reads one length prefixed integer, advancing `input` past it.
pub fn read_integer(input: &mut &[u8]) -> Result<BigUint> {
    if input.len() < LENGTH_BYTES {
        return Err(CryptographyError::malformed(format!(
            "truncated length header ({} bytes remaining)",
            input.len()
        )));
    }
    let (header, rest) = input.split_at(LENGTH_BYTES);
    let mut length = [0u8; LENGTH_BYTES];
    length.copy_from_slice(header);
    let length = u32::from_be_bytes(length) as usize;

    if length > rest.len() {
        return Err(CryptographyError::malformed(format!(
            "length header {} exceeds remaining {} bytes",
            length,
            rest.len()
        )));
    }
    let (value, rest) = rest.split_at(length);
    *input = rest;

    integer_from_bytes(value)
}

pub fn encode_pair(first: &BigUint, second: &BigUint) -> Vec<u8> {
    let mut ret = vec![];
    write_integer(&mut ret, first);
    write_integer(&mut ret, second);

    ret
}

pub fn decode_pair(bytes: &[u8]) -> Result<(BigUint, BigUint)> {
    let mut input = bytes;
    let first = read_integer(&mut input)?;
    let second = read_integer(&mut input)?;
    if !input.is_empty() {
        return Err(CryptographyError::malformed(format!(
            "{} trailing bytes after pair",
            input.len()
        )));
    }

    Ok((first, second))
}
