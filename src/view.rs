//! JSON shapes handed to clients.
use super::group::{Assignment, Group, User};
use serde::{Deserialize, Serialize};

/// The serialized group: key, name, version in epoch seconds, members and
/// assignments. Admin email and constraints are never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupView {
    pub key: String,
    pub name: String,
    pub version: i64,
    pub users: Vec<User>,
    pub assignments: Vec<Assignment>,
}

impl From<&Group> for GroupView {
    fn from(group: &Group) -> Self {
        Self {
            key: group.key().to_string(),
            name: group.name().to_string(),
            version: group.version_token().unwrap_or_default(),
            users: group.users().to_vec(),
            assignments: group.assignments().to_vec(),
        }
    }
}

/// Body returned in place of a group when an operation is turned down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub errors: String,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            errors: message.into(),
        }
    }
}
