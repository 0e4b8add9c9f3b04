//! Service layer API for group operations
//!
//! Every edit follows the same optimistic protocol: load the group, refuse if
//! it already has assignments, compare the caller's version token against the
//! stored version, apply the change to a copy, re-check invariants and commit
//! with a version-guarded write. A guarded write that loses a race reports the
//! same stale-version condition as the in-process comparison.
use super::error::GroupError;
use super::group::{Assignment, Group, MemberInput};
use super::store::{GroupStore, PutOutcome, SledStore};
use super::utils::generate_group_key;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct GroupService {
    store: Arc<dyn GroupStore>,
}

/// Parses a client version token. Kept separate from the comparison so a bad
/// token is only reported once the group is known to exist and be editable.
pub fn parse_version(raw: &str) -> Result<i64, GroupError> {
    raw.trim().parse().map_err(|_| GroupError::InvalidVersion)
}

impl GroupService {
    pub fn new(store: Arc<dyn GroupStore>) -> Self {
        Self { store }
    }

    pub fn with_sled(instance: Arc<sled::Db>) -> Self {
        Self::new(Arc::new(SledStore::new(instance)))
    }

    /// Load a group from the store
    fn load(&self, key: &str) -> Result<Group, GroupError> {
        self.store.get(key)?.ok_or(GroupError::NotFound)
    }

    /// Create a new group with no members
    pub fn create_group(&self, name: &str, admin_email: &str) -> Result<Group, GroupError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GroupError::MissingGroupName);
        }
        let admin_email = admin_email.trim();
        if admin_email.is_empty() {
            return Err(GroupError::MissingAdminEmail);
        }

        let mut group = Group::new(generate_group_key(), name, admin_email)?;

        match self.store.put(&group, None)? {
            PutOutcome::Committed(version) => {
                group.set_version(version);
                info!(key = group.key(), "group created");
                Ok(group)
            }
            // a generated key landed on an existing group
            PutOutcome::Conflict => {
                warn!(key = group.key(), "generated group key already in use");
                Err(GroupError::KeyCollision)
            }
        }
    }

    pub fn get_group(&self, key: &str) -> Result<Group, GroupError> {
        self.load(key)
    }

    /// Replace the member list.
    ///
    /// `members` is the JSON list of `{name, email}` objects submitted by the
    /// client. Names and emails are trimmed and rows left entirely blank are
    /// dropped. Any invalid row rejects the whole edit.
    pub fn update_members(
        &self,
        key: &str,
        version: &str,
        members: &str,
    ) -> Result<Group, GroupError> {
        self.edit(key, parse_version(version), |group| {
            let inputs: Vec<MemberInput> =
                serde_json::from_str(members).map_err(|_| GroupError::MalformedMembers)?;

            let mut users = Vec::with_capacity(inputs.len());
            for input in inputs {
                if let Some(user) = input.into_user()? {
                    users.push(user);
                }
            }
            group.replace_users(users)
        })
    }

    /// Replace both constraint lists
    pub fn update_constraints(
        &self,
        key: &str,
        version: i64,
        positive: Vec<Assignment>,
        negative: Vec<Assignment>,
    ) -> Result<Group, GroupError> {
        self.edit(key, Ok(version), |group| {
            group.replace_constraints(positive, negative)
        })
    }

    /// Store the pairing produced by the matcher. Closes the group to edits.
    pub fn record_assignments(
        &self,
        key: &str,
        version: i64,
        assignments: Vec<Assignment>,
    ) -> Result<Group, GroupError> {
        self.edit(key, Ok(version), |group| group.record_assignments(assignments))
    }

    fn edit<F>(
        &self,
        key: &str,
        version: Result<i64, GroupError>,
        apply: F,
    ) -> Result<Group, GroupError>
    where
        F: FnOnce(&mut Group) -> Result<(), GroupError>,
    {
        let mut group = self.load(key)?;

        if group.is_assigned() {
            debug!(key, "edit refused, assignments already made");
            return Err(GroupError::AlreadyAssigned);
        }

        let observed = version?;
        let expected = group.version().cloned();
        if group.version_token() != Some(observed) {
            debug!(key, observed, current = ?group.version_token(), "stale version");
            return Err(GroupError::StaleVersion);
        }

        if let Err(err) = apply(&mut group) {
            debug!(key, error = %err, "edit rejected");
            return Err(err);
        }
        group.check_invariants()?;

        match self.store.put(&group, expected.as_ref())? {
            PutOutcome::Committed(version) => {
                group.set_version(version);
                info!(key, version = ?group.version_token(), "group updated");
                Ok(group)
            }
            PutOutcome::Conflict => {
                warn!(key, observed, "concurrent write won the race");
                Err(GroupError::StaleVersion)
            }
        }
    }
}
