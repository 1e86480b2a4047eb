// SPDX-FileCopyrightText: 2022 David Ruescas <david@sequentech.io>
//
// SPDX-License-Identifier: AGPL-3.0-only
use thiserror::Error;

/// Coarse classification of a [`CryptographyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unsupported,
    MissingKey,
    Malformed,
    ProofPrecondition,
    Mismatch,
    NotFound,
    Verification,
    Storage,
}

#[derive(Debug, Error)]
pub enum CryptographyError {
    #[error("selene: {operation} is not supported by {algorithm}")]
    Unsupported {
        algorithm: &'static str,
        operation: &'static str,
    },

    #[error("selene: missing {0}")]
    MissingKey(&'static str),

    #[error("selene: malformed input: {0}")]
    Malformed(String),

    #[error("selene: proof precondition violated: {0}")]
    ProofPrecondition(&'static str),

    #[error("selene: mismatch: {0}")]
    Mismatch(String),

    #[error("selene: expected {expected} teller information artifacts, found {found}")]
    TellerCountMismatch { expected: usize, found: usize },

    #[error("selene: no key pair matches the given public trapdoor key")]
    KeyPairNotFound,

    #[error("selene: decrypted commitment does not match any tracker number")]
    TrackerNotFound,

    #[error("selene: voter {0} has no pre-allocated record")]
    VoterNotFound(String),

    #[error("selene: verification failed: {0}")]
    Verification(String),

    #[error("selene: artifact storage failed: {cause}")]
    Storage {
        cause: String,
        #[source]
        source: std::io::Error,
    },
}

impl CryptographyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CryptographyError::Unsupported { .. } => ErrorKind::Unsupported,
            CryptographyError::MissingKey(_) => ErrorKind::MissingKey,
            CryptographyError::Malformed(_) => ErrorKind::Malformed,
            CryptographyError::ProofPrecondition(_) => ErrorKind::ProofPrecondition,
            CryptographyError::Mismatch(_) | CryptographyError::TellerCountMismatch { .. } => {
                ErrorKind::Mismatch
            }
            CryptographyError::KeyPairNotFound
            | CryptographyError::TrackerNotFound
            | CryptographyError::VoterNotFound(_) => ErrorKind::NotFound,
            CryptographyError::Verification(_) => ErrorKind::Verification,
            CryptographyError::Storage { .. } => ErrorKind::Storage,
        }
    }

    pub(crate) fn unsupported(algorithm: &'static str, operation: &'static str) -> Self {
        CryptographyError::Unsupported {
            algorithm,
            operation,
        }
    }

    pub(crate) fn malformed<S: Into<String>>(cause: S) -> Self {
        CryptographyError::Malformed(cause.into())
    }

    pub(crate) fn storage<S: Into<String>>(cause: S, source: std::io::Error) -> Self {
        CryptographyError::Storage {
            cause: cause.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CryptographyError>;
