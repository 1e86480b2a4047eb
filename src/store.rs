// SPDX-FileCopyrightText: 2022 David Ruescas <david@sequentech.io>
//
// SPDX-License-Identifier: AGPL-3.0-only
//! Per teller artifact storage.
//!
//! Proofs and teller exchange messages are opaque byte blobs keyed by the
//! election parameters hash, the teller number and an artifact name. Each
//! teller only writes under its own number.
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use crate::error::{CryptographyError, Result};
use crate::parameters::ElectionParameters;

pub const TELLER_INFORMATION: &str = "teller-information";
pub const TRACKER_SHUFFLE: &str = "tracker-shuffle";
pub const COMMITMENT_PROOFS: &str = "commitment-proofs";
pub const COMMITMENT_DECRYPTION: &str = "commitment-decryption";
pub const VOTE_MIX: &str = "vote-mix";
pub const VOTE_DECRYPTION: &str = "vote-decryption";

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArtifactKey {
    /// Hex encoded election parameters hash.
    pub election: String,
    pub teller: usize,
    pub name: String,
}

impl ArtifactKey {
    pub fn new(parameters: &ElectionParameters, teller: usize, name: &str) -> ArtifactKey {
        ArtifactKey {
            election: parameters.hash_hex(),
            teller,
            name: name.to_string(),
        }
    }
}

impl std::fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/teller-{}/{}", self.election, self.teller, self.name)
    }
}

pub trait ArtifactStore: Sync {
    /// Stores `bytes` under `key`, replacing any previous artifact.
    fn write(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<()>;

    fn read(&self, key: &ArtifactKey) -> Result<Option<Vec<u8>>>;

    /// Every teller's artifact called `name`, ordered by teller number.
    fn list(&self, election: &str, name: &str) -> Result<Vec<(usize, Vec<u8>)>>;

    /// Like [`ArtifactStore::read`] but a missing artifact is an error.
    fn require(&self, key: &ArtifactKey) -> Result<Vec<u8>> {
        self.read(key)?.ok_or_else(|| {
            CryptographyError::storage(
                format!("artifact {} not found", key),
                io::Error::from(io::ErrorKind::NotFound),
            )
        })
    }
}

/// Artifacts held in process.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<BTreeMap<ArtifactKey, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<ArtifactKey, Vec<u8>>>> {
        self.inner.lock().map_err(|_| {
            CryptographyError::storage(
                "memory store lock poisoned",
                io::Error::from(io::ErrorKind::Other),
            )
        })
    }
}

impl ArtifactStore for MemoryStore {
    fn write(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<()> {
        self.lock()?.insert(key.clone(), bytes.to_vec());
        Ok(())
    }

    fn read(&self, key: &ArtifactKey) -> Result<Option<Vec<u8>>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn list(&self, election: &str, name: &str) -> Result<Vec<(usize, Vec<u8>)>> {
        let inner = self.lock()?;
        let ret = inner
            .iter()
            .filter(|(k, _)| k.election == election && k.name == name)
            .map(|(k, v)| (k.teller, v.clone()))
            .collect();

        Ok(ret)
    }
}

/// Artifacts as files under `<root>/<election>/teller-<n>/<name>`.
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl AsRef<Path>) -> DirectoryStore {
        DirectoryStore {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, key: &ArtifactKey) -> Result<PathBuf> {
        check_component(&key.election)?;
        check_component(&key.name)?;
        Ok(self
            .root
            .join(&key.election)
            .join(format!("teller-{}", key.teller))
            .join(&key.name))
    }
}

fn check_component(component: &str) -> Result<()> {
    if component.is_empty()
        || component == "."
        || component == ".."
        || component.contains(['/', '\\'])
    {
        return Err(CryptographyError::malformed(format!(
            "invalid artifact path component '{}'",
            component
        )));
    }
    Ok(())
}

impl ArtifactStore for DirectoryStore {
    fn write(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<()> {
        let path = self.path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CryptographyError::storage(format!("cannot create {}", parent.display()), e)
            })?;
        }
        fs::write(&path, bytes)
            .map_err(|e| CryptographyError::storage(format!("cannot write {}", path.display()), e))?;
        debug!("wrote artifact {} ({} bytes)", key, bytes.len());

        Ok(())
    }

    fn read(&self, key: &ArtifactKey) -> Result<Option<Vec<u8>>> {
        let path = self.path(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CryptographyError::storage(
                format!("cannot read {}", path.display()),
                e,
            )),
        }
    }

    fn list(&self, election: &str, name: &str) -> Result<Vec<(usize, Vec<u8>)>> {
        check_component(election)?;
        check_component(name)?;
        let dir = self.root.join(election);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => {
                return Err(CryptographyError::storage(
                    format!("cannot list {}", dir.display()),
                    e,
                ))
            }
        };

        let mut ret = vec![];
        for entry in entries {
            let entry = entry
                .map_err(|e| CryptographyError::storage(format!("cannot list {}", dir.display()), e))?;
            let teller = entry
                .file_name()
                .to_str()
                .and_then(|n| n.strip_prefix("teller-"))
                .and_then(|n| n.parse::<usize>().ok());
            if let Some(teller) = teller {
                let key = ArtifactKey {
                    election: election.to_string(),
                    teller,
                    name: name.to_string(),
                };
                if let Some(bytes) = self.read(&key)? {
                    ret.push((teller, bytes));
                }
            }
        }
        ret.sort_by_key(|(teller, _)| *teller);

        Ok(ret)
    }
}
