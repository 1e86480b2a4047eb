// SPDX-FileCopyrightText: 2022 David Ruescas <david@sequentech.io>
//
// SPDX-License-Identifier: AGPL-3.0-only
//! Named projections of records.
//!
//! * `Public`: no private keys, no teller-only commitment plaintexts, no
//!   plaintext votes.
//! * `RestrictedPublic`: `Public`, plus the commitment `g` values tellers
//!   release for commitment completion.
//! * `Private`: everything the owner holds.
//! * `Export`: what one step hands to the next, private keys removed.
//! * `Import`: everything, as loaded back by its owner.
//!
//! In every view a plaintext vote is dropped once its ballot exists.
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum View {
    Public,
    RestrictedPublic,
    Private,
    Export,
    Import,
}

impl View {
    pub fn includes_private_keys(&self) -> bool {
        matches!(self, View::Private | View::Import)
    }

    pub fn includes_commitment_g(&self) -> bool {
        !matches!(self, View::Public)
    }

    pub fn includes_commitment_h(&self) -> bool {
        matches!(self, View::Private | View::Export | View::Import)
    }

    pub fn includes_plaintext_votes(&self) -> bool {
        !matches!(self, View::Public | View::RestrictedPublic)
    }
}

pub trait Projection: Sized {
    /// Copy of `self` restricted to the fields visible in `view`.
    fn project(&self, view: View) -> Self;
}

impl<T: Projection> Projection for Vec<T> {
    fn project(&self, view: View) -> Self {
        self.iter().map(|t| t.project(view)).collect()
    }
}
