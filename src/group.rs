//! Core group aggregate and its member records
use super::error::{GroupError, ValidationError};
use super::validation::{
    ensure_unique_names, validate_email, validate_group_name, validate_member_name,
};
use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Wall-clock stamp at whole-second precision.
///
/// Second precision keeps the stored version equal to the epoch-seconds token
/// handed to clients.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct TimeStamp(DateTime<Utc>);

impl TimeStamp {
    pub fn now() -> Self {
        Self(Utc::now().trunc_subsecs(0))
    }
    pub fn from_epoch_secs(secs: i64) -> Option<Self> {
        DateTime::from_timestamp(secs, 0).map(Self)
    }
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
    /// The version stamped on a write that replaces `previous`: now, unless
    /// that would not move past `previous`.
    pub fn next_after(previous: Option<&TimeStamp>) -> Self {
        let now = Self::now();
        match previous {
            Some(previous) if now <= *previous => {
                Self(previous.0 + TimeDelta::seconds(1))
            }
            _ => now,
        }
    }
}

/// One member of a group. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode, Serialize, Deserialize)]
#[serde(try_from = "MemberInput")]
pub struct User {
    #[n(0)]
    name: String,
    #[n(1)]
    email: String,
}

impl User {
    pub fn new(name: &str, email: &str) -> Result<Self, ValidationError> {
        validate_member_name(name)?;
        validate_email(email)?;
        Ok(Self {
            name: name.to_string(),
            email: email.to_string(),
        })
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn email(&self) -> &str {
        &self.email
    }
}

/// A proposed member as submitted by a client, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MemberInput {
    pub name: String,
    pub email: String,
}

impl MemberInput {
    /// Trims both fields. Entries left with no name and no email are blank rows
    /// and yield `None`.
    pub fn into_user(self) -> Result<Option<User>, ValidationError> {
        let (name, email) = (self.name.trim(), self.email.trim());
        if name.is_empty() && email.is_empty() {
            return Ok(None);
        }
        User::new(name, email).map(Some)
    }
}

impl TryFrom<MemberInput> for User {
    type Error = ValidationError;

    fn try_from(input: MemberInput) -> Result<Self, Self::Error> {
        User::new(&input.name, &input.email)
    }
}

/// A directed giver -> receiver pairing, identified by email.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "AssignmentInput")]
pub struct Assignment {
    #[n(0)]
    giver_email: String,
    #[n(1)]
    receiver_email: String,
}

impl Assignment {
    pub fn new(giver_email: &str, receiver_email: &str) -> Result<Self, ValidationError> {
        validate_email(giver_email)?;
        validate_email(receiver_email)?;
        Ok(Self {
            giver_email: giver_email.to_string(),
            receiver_email: receiver_email.to_string(),
        })
    }
    pub fn giver_email(&self) -> &str {
        &self.giver_email
    }
    pub fn receiver_email(&self) -> &str {
        &self.receiver_email
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignmentInput {
    giver_email: String,
    receiver_email: String,
}

impl TryFrom<AssignmentInput> for Assignment {
    type Error = ValidationError;

    fn try_from(input: AssignmentInput) -> Result<Self, Self::Error> {
        Assignment::new(&input.giver_email, &input.receiver_email)
    }
}

// A gift exchange circle. The key is assigned once and never changes; the
// version is stamped by the store on every successful write.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct Group {
    #[n(0)]
    key: String,
    #[n(1)]
    name: String,
    #[n(2)]
    admin_email: String,
    #[n(3)]
    version: Option<TimeStamp>, // None until first stored
    #[n(4)]
    users: Vec<User>,
    #[n(5)]
    positive_constraints: Vec<Assignment>,
    #[n(6)]
    negative_constraints: Vec<Assignment>,
    #[n(7)]
    assignments: Vec<Assignment>,
}

impl Group {
    /// A fresh, unstored group with no members, constraints or assignments.
    pub fn new(key: String, name: &str, admin_email: &str) -> Result<Self, ValidationError> {
        validate_group_name(name)?;
        validate_email(admin_email)?;
        Ok(Self {
            key,
            name: name.to_string(),
            admin_email: admin_email.to_string(),
            version: None,
            users: vec![],
            positive_constraints: vec![],
            negative_constraints: vec![],
            assignments: vec![],
        })
    }
    pub fn key(&self) -> &str {
        &self.key
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn admin_email(&self) -> &str {
        &self.admin_email
    }
    pub fn version(&self) -> Option<&TimeStamp> {
        self.version.as_ref()
    }
    /// The version as handed to clients, in epoch seconds.
    pub fn version_token(&self) -> Option<i64> {
        self.version.as_ref().map(TimeStamp::epoch_secs)
    }
    pub fn users(&self) -> &[User] {
        &self.users
    }
    pub fn positive_constraints(&self) -> &[Assignment] {
        &self.positive_constraints
    }
    pub fn negative_constraints(&self) -> &[Assignment] {
        &self.negative_constraints
    }
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }
    pub fn is_assigned(&self) -> bool {
        !self.assignments.is_empty()
    }

    pub(crate) fn set_version(&mut self, version: TimeStamp) {
        self.version = Some(version);
    }

    fn ensure_editable(&self) -> Result<(), GroupError> {
        if self.is_assigned() {
            return Err(GroupError::AlreadyAssigned);
        }
        Ok(())
    }

    /// Replaces the whole member list. Nothing changes unless every name is
    /// distinct ignoring case.
    pub fn replace_users(&mut self, users: Vec<User>) -> Result<(), GroupError> {
        self.ensure_editable()?;
        ensure_unique_names(users.iter().map(User::name))?;
        self.users = users;
        Ok(())
    }

    pub fn replace_constraints(
        &mut self,
        positive: Vec<Assignment>,
        negative: Vec<Assignment>,
    ) -> Result<(), GroupError> {
        self.ensure_editable()?;
        self.positive_constraints = positive;
        self.negative_constraints = negative;
        Ok(())
    }

    /// Stores the computed pairing. After this the group is closed to edits,
    /// so an empty pairing is refused.
    pub fn record_assignments(&mut self, assignments: Vec<Assignment>) -> Result<(), GroupError> {
        self.ensure_editable()?;
        if assignments.is_empty() {
            return Err(GroupError::NoAssignments);
        }
        self.assignments = assignments;
        Ok(())
    }

    /// Re-checks the invariants that span the whole aggregate.
    pub fn check_invariants(&self) -> Result<(), ValidationError> {
        ensure_unique_names(self.users.iter().map(User::name))
    }
}

impl<C> minicbor::Encode<C> for TimeStamp {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.i64(self.0.timestamp())?.ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let secs = d.i64()?;

        TimeStamp::from_epoch_secs(secs).ok_or(minicbor::decode::Error::message(
            "failed to convert timestamp to utc",
        ))
    }
}
