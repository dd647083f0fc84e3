//! Identity records and the lookup/verification contract.
//!
//! Secrets are never stored; a `Credential` keeps a per-identity random salt
//! and the hex SHA-256 digest of `salt || secret`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};

use serde::Deserialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::utils::error::HubError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub salt: String,
    pub hash: String,
}

impl Credential {
    pub fn new(secret: &str) -> Self {
        let salt = Uuid::new_v4().to_string();
        let hash = digest(&salt, secret);
        Self { salt, hash }
    }

    pub fn matches(&self, secret: &str) -> bool {
        digest(&self.salt, secret) == self.hash
    }
}

fn digest(salt: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Who a connection speaks for. Guests carry no credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    name: String,
    credential: Option<Credential>,
}

impl Identity {
    pub fn with_secret(name: impl Into<String>, secret: &str) -> Self {
        Self {
            name: name.into(),
            credential: Some(Credential::new(secret)),
        }
    }

    pub fn guest(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            credential: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_guest(&self) -> bool {
        self.credential.is_none()
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }
}

/// Lookup and verification service the hub consumes but does not implement
/// policy for.
pub trait IdentityStore: Send + Sync {
    /// Returns the known identity for `name`, if any.
    fn lookup(&self, name: &str) -> Option<Arc<Identity>>;

    /// Checks `secret` against the identity's credential. Guests never match.
    fn verify(&self, identity: &Identity, secret: &str) -> bool {
        identity
            .credential()
            .is_some_and(|credential| credential.matches(secret))
    }
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    name: String,
    password: String,
}

/// `IdentityStore` kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    users: RwLock<HashMap<String, Arc<Identity>>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `[{"name": .., "password": ..}]` records, hashing each password.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, HubError> {
        let raw = fs::read_to_string(path)?;
        let records: Vec<UserRecord> = serde_json::from_str(&raw)?;

        let store = Self::new();
        for record in records {
            store.insert(&record.name, &record.password);
        }
        Ok(store)
    }

    /// Adds or replaces the identity for `name`.
    pub fn insert(&self, name: &str, secret: &str) -> Arc<Identity> {
        let identity = Arc::new(Identity::with_secret(name, secret));
        self.users
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.to_string(), identity.clone());
        identity
    }

    pub fn len(&self) -> usize {
        self.users
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn lookup(&self, name: &str) -> Option<Arc<Identity>> {
        self.users
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
    }
}
