#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Uh-oh. You forgot a name!")]
    EmptyName,
    #[error("Uh-oh. That name is too long! Keep it to {limit} characters.")]
    NameTooLong { limit: usize },
    #[error("Uh-oh. You forgot an email!")]
    EmptyEmail,
    #[error("Uh-oh. That email is too long!")]
    EmailTooLong,
    #[error("{0} is not a valid email address.")]
    MalformedEmail(String),
    #[error("More than one member has the name \"{0}\".")]
    DuplicateName(String),
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("storage backend failed: {0}")]
    Backend(#[from] sled::Error),
    #[error("stored group could not be decoded: {0}")]
    Decode(#[from] minicbor::decode::Error),
    #[error("group could not be encoded: {0}")]
    Encode(String),
}

/// Every outcome of a group operation other than success.
///
/// All variants except [`GroupError::Store`] are reported conditions the caller
/// is expected to show to the user.
#[derive(thiserror::Error, Debug)]
pub enum GroupError {
    #[error("We're gonna need a name for your group.")]
    MissingGroupName,
    #[error("We're gonna need an email for your group's coordinator.")]
    MissingAdminEmail,
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("Hmm. We don't recognize that group.")]
    NotFound,
    #[error("Sorry, a group's members can't change once their assignments have been made.")]
    AlreadyAssigned,
    #[error("That's not a valid version.")]
    InvalidVersion,
    #[error(
        "Looks like someone else changed the group since you loaded it. Refresh the page to load the latest members."
    )]
    StaleVersion,
    #[error("The members list is not in a valid format.")]
    MalformedMembers,
    #[error("There are no assignments to record.")]
    NoAssignments,
    #[error("We couldn't set up your group just now. Please try again.")]
    KeyCollision,
    #[error("unexpected storage failure: {0}")]
    Store(#[from] StoreError),
}

impl GroupError {
    pub fn is_expected(&self) -> bool {
        !matches!(self, GroupError::Store(_))
    }
}
