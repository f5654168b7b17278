//! Newtype domain identifiers.
//!
//! Repository names, branch names and job names all arrive as plain strings from
//! webhooks and from the mapping table. Wrapping each one in its own newtype keeps
//! a [`JobId`] from being passed where a [`BranchName`] is expected.

use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed (Git names / build server names)
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies a source repository exactly as the webhook sender reports it
    /// (e.g. `"git://gitserver/git/app"` or `"git@gitserver:group/app.git"`).
    ///
    /// No normalisation is applied: the mapping table must list every URL form
    /// that should trigger a job.
    RepositoryId
}

string_id! {
    /// A Git branch name (e.g. `"master"`, `"feature/login"`).
    BranchName
}

impl BranchName {
    /// The branch assumed when an event does not name one.
    pub fn default_branch() -> Self {
        Self(crate::DEFAULT_BRANCH.to_string())
    }
}

string_id! {
    /// Identifies a build job on the downstream build server.
    ///
    /// This is the path segment used in `<server>/job/<job>/build`.
    JobId
}

string_id! {
    /// Content fingerprint of a mapping source.
    ///
    /// Either the lowercase hex SHA-256 of the raw bytes, or the value published
    /// by a remote source's companion `.sha256` resource. Only ever compared for
    /// equality.
    Fingerprint
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single arm of the debounce scheduler.
///
/// Every call to arm a job creates a fresh [`ArmId`]. When the timer elapses it
/// only removes the pending entry whose id matches its own, so a newer arm for
/// the same job is never deleted by an older timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArmId(Uuid);

impl ArmId {
    /// Generates a new random arm identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ArmId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
