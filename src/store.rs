//! Keyed persistence for groups with a version-guarded write.
use super::error::StoreError;
use super::group::{Group, TimeStamp};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Result of a conditional write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome {
    /// Written; carries the version the store stamped on the record.
    Committed(TimeStamp),
    /// The stored version no longer matches the expected one.
    Conflict,
}

pub trait GroupStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Group>, StoreError>;

    /// Writes `group` only if the stored record's version equals `expected`.
    /// `expected = None` requires the key to be absent. The store stamps the
    /// new version itself; the version carried by `group` is ignored.
    fn put(&self, group: &Group, expected: Option<&TimeStamp>) -> Result<PutOutcome, StoreError>;
}

fn encode(group: &Group) -> Result<Vec<u8>, StoreError> {
    minicbor::to_vec(group).map_err(|e| StoreError::Encode(e.to_string()))
}

/// Groups stored as CBOR in a sled tree, keyed by the group key.
pub struct SledStore {
    instance: Arc<sled::Db>,
}

impl SledStore {
    pub fn new(instance: Arc<sled::Db>) -> Self {
        Self { instance }
    }
}

impl GroupStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<Group>, StoreError> {
        match self.instance.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(minicbor::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put(&self, group: &Group, expected: Option<&TimeStamp>) -> Result<PutOutcome, StoreError> {
        let key = group.key().as_bytes();
        let current = self.instance.get(key)?;

        let stored_version = match &current {
            Some(bytes) => {
                let stored: Group = minicbor::decode(bytes)?;
                stored.version().cloned()
            }
            None => None,
        };
        if current.is_some() != expected.is_some() || stored_version.as_ref() != expected {
            return Ok(PutOutcome::Conflict);
        }

        let version = TimeStamp::next_after(stored_version.as_ref());
        let mut record = group.clone();
        record.set_version(version.clone());

        // swap only against the exact bytes the version check was made on
        match self
            .instance
            .compare_and_swap(key, current, Some(encode(&record)?))?
        {
            Ok(()) => {
                self.instance.flush()?;
                Ok(PutOutcome::Committed(version))
            }
            Err(_) => Ok(PutOutcome::Conflict),
        }
    }
}

/// In-process store; the whole check-and-write runs under one lock.
#[derive(Default)]
pub struct MemoryStore {
    groups: Mutex<HashMap<String, Group>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GroupStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Group>, StoreError> {
        Ok(self.groups.lock().get(key).cloned())
    }

    fn put(&self, group: &Group, expected: Option<&TimeStamp>) -> Result<PutOutcome, StoreError> {
        let mut groups = self.groups.lock();
        let stored_version = groups.get(group.key()).map(|stored| stored.version().cloned());

        let matches = match (&stored_version, expected) {
            (None, None) => true,
            (Some(stored), Some(expected)) => stored.as_ref() == Some(expected),
            _ => false,
        };
        if !matches {
            return Ok(PutOutcome::Conflict);
        }

        let version = TimeStamp::next_after(stored_version.flatten().as_ref());
        let mut record = group.clone();
        record.set_version(version.clone());
        groups.insert(record.key().to_string(), record);

        Ok(PutOutcome::Committed(version))
    }
}
