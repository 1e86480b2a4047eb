// SPDX-FileCopyrightText: 2022 David Ruescas <david@sequentech.io>
//
// SPDX-License-Identifier: AGPL-3.0-only
//! Progress callbacks for long running operations.
//!
//! ```
//! use selene::progress::{Progress, ProgressListener};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let rejected = AtomicUsize::new(0);
//! let listener = |event: Progress| {
//!     if event == Progress::CandidateRejected {
//!         rejected.fetch_add(1, Ordering::Relaxed);
//!     }
//! };
//! listener.on_progress(Progress::CandidateRejected);
//! assert_eq!(rejected.load(Ordering::Relaxed), 1);
//! ```

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// A prime candidate failed a primality test.
    CandidateRejected,
    ParametersFound,
    /// A shuffle of `count` ciphertexts was produced.
    Shuffled { count: usize },
    ProofGenerated,
}

pub trait ProgressListener: Sync {
    fn on_progress(&self, event: Progress);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl ProgressListener for Silent {
    fn on_progress(&self, _event: Progress) {}
}

impl<F: Fn(Progress) + Sync> ProgressListener for F {
    fn on_progress(&self, event: Progress) {
        self(event)
    }
}
