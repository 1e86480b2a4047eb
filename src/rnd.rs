// SPDX-FileCopyrightText: 2022 David Ruescas <david@sequentech.io>
//
// SPDX-License-Identifier: AGPL-3.0-only
use rand::rngs::OsRng;
use rand::CryptoRng;
use rand::Error;
use rand::RngCore;

/// Operating system backed randomness, drawn fresh on every call.
#[derive(Clone, Copy, Debug, Default)]
pub struct SeleneRng;

impl CryptoRng for SeleneRng {}

impl RngCore for SeleneRng {
    #[inline(always)]
    fn next_u32(&mut self) -> u32 {
        OsRng.next_u32()
    }

    #[inline(always)]
    fn next_u64(&mut self) -> u64 {
        OsRng.next_u64()
    }

    #[inline(always)]
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        OsRng.fill_bytes(dest)
    }

    #[inline(always)]
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        OsRng.try_fill_bytes(dest)
    }
}

/// Object safe bound for the cryptographically secure generators the
/// algorithm layer accepts.
pub trait SeleneRngCore: RngCore + CryptoRng {}

impl<T: RngCore + CryptoRng> SeleneRngCore for T {}
