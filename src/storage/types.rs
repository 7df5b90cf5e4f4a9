//! core id types for the storage layer.
//!
//! Two families of ids live here:
//! - generated ids (`RevisionId`, `VersionId`, `CreatedId`) which are
//!   lower-cased ULIDs and never chosen by a caller
//! - user-facing names (`TableId`, `RowId`, `BranchId`) which are validated
//!   against a small grammar before they ever reach a record

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! generated_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// generate a fresh ULID-based id
            pub fn generate() -> Self {
                Self(ulid::Ulid::new().to_string().to_lowercase())
            }

            /// wrap an id handed back by a caller
            pub fn from_string(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// get the string representation
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

generated_id!(
    /// Identifier of a revision (head, draft or start).
    RevisionId
);

generated_id!(
    /// Identifier of one physical version of a table or a row.
    ///
    /// Unique across the whole store and never reused, even after the
    /// version it named has been deleted.
    VersionId
);

generated_id!(
    /// Stable identity shared by every version of one logical table or row.
    CreatedId
);

/// Maximum length of a table or row id.
pub const MAX_ID_LENGTH: usize = 64;

/// Validate a user-facing identifier.
///
/// Valid identifiers:
/// - 1-64 characters
/// - ASCII letters, digits, underscores and hyphens only
/// - must start with a letter or underscore
pub fn validate_identifier(id: &str) -> Result<(), InvalidIdError> {
    let first_char = match id.chars().next() {
        Some(c) => c,
        None => return Err(InvalidIdError::Empty),
    };

    if id.len() > MAX_ID_LENGTH {
        return Err(InvalidIdError::TooLong(id.len()));
    }

    if !first_char.is_ascii_alphabetic() && first_char != '_' {
        return Err(InvalidIdError::InvalidStart(first_char));
    }

    for (i, c) in id.chars().enumerate() {
        if !c.is_ascii_alphanumeric() && c != '_' && c != '-' {
            return Err(InvalidIdError::InvalidCharacter { char: c, position: i });
        }
    }

    Ok(())
}

/// A validated, user-facing table id.
///
/// Table ids are unique case-insensitively within one revision, so lookups go
/// through [`TableId::matches`] rather than `==`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(String);

impl TableId {
    /// create a new TableId, validating the input
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidIdError> {
        let id = id.into();
        validate_identifier(&id)?;
        Ok(Self(id))
    }

    /// case-insensitive comparison against a raw id
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for TableId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A validated, user-facing row id (the row's key inside a table).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(String);

impl RowId {
    /// create a new RowId, validating the input
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidIdError> {
        let id = id.into();
        validate_identifier(&id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for RowId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A branch name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchId(String);

impl BranchId {
    /// the default branch name
    pub const MAIN: &'static str = "main";

    /// create a new BranchId
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidIdError> {
        let name = name.into();
        if name.is_empty() {
            return Err(InvalidIdError::Empty);
        }
        if name.contains("..") || name.ends_with('/') || name.starts_with('/') {
            return Err(InvalidIdError::InvalidPath(name));
        }
        Ok(Self(name))
    }

    /// the default branch
    pub fn main() -> Self {
        Self(Self::MAIN.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role a revision plays on its branch.
///
/// Roles are independent flags on the record, not stages: the start revision
/// of a fresh branch is also its head until the first commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionRole {
    Start,
    Head,
    Draft,
}

impl fmt::Display for RevisionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevisionRole::Start => write!(f, "start"),
            RevisionRole::Head => write!(f, "head"),
            RevisionRole::Draft => write!(f, "draft"),
        }
    }
}

/// error type for invalid ids (tables, rows, branches)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidIdError {
    Empty,
    TooLong(usize),
    InvalidStart(char),
    InvalidCharacter { char: char, position: usize },
    InvalidPath(String),
}

impl fmt::Display for InvalidIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "id cannot be empty"),
            Self::TooLong(len) => {
                write!(f, "id too long: {} characters (max {})", len, MAX_ID_LENGTH)
            }
            Self::InvalidStart(c) => write!(f, "id cannot start with '{}'", c),
            Self::InvalidCharacter { char, position } => {
                write!(f, "invalid character '{}' at position {}", char, position)
            }
            Self::InvalidPath(path) => write!(f, "invalid branch name: '{}'", path),
        }
    }
}

impl std::error::Error for InvalidIdError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_valid() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("user_accounts").is_ok());
        assert!(validate_identifier("User123").is_ok());
        assert!(validate_identifier("_private").is_ok());
        assert!(validate_identifier("my-table").is_ok());
        assert!(validate_identifier(&"a".repeat(64)).is_ok());
    }

    #[test]
    fn test_identifier_invalid() {
        assert_eq!(validate_identifier(""), Err(InvalidIdError::Empty));
        assert_eq!(
            validate_identifier("123users"),
            Err(InvalidIdError::InvalidStart('1'))
        );
        assert_eq!(
            validate_identifier("-users"),
            Err(InvalidIdError::InvalidStart('-'))
        );
        assert_eq!(
            validate_identifier("users/admin"),
            Err(InvalidIdError::InvalidCharacter { char: '/', position: 5 })
        );
        assert_eq!(
            validate_identifier(&"a".repeat(65)),
            Err(InvalidIdError::TooLong(65))
        );
    }

    #[test]
    fn test_table_id_matches_case_insensitively() {
        let id = TableId::new("Users").unwrap();
        assert!(id.matches("users"));
        assert!(id.matches("USERS"));
        assert!(!id.matches("user"));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = VersionId::generate();
        let b = VersionId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 26);
        assert_eq!(a.as_str(), a.as_str().to_lowercase());
    }

    #[test]
    fn test_branch_id() {
        assert!(BranchId::new("feature/x").is_ok());
        assert!(BranchId::new("").is_err());
        assert!(BranchId::new("a..b").is_err());
        assert!(BranchId::new("/lead").is_err());
        assert_eq!(BranchId::main().as_str(), "main");
    }
}
