// Centralized error handling for the user store

use thiserror::Error;

/// Errors that can occur while parsing, indexing, encrypting or persisting users
#[derive(Error, Debug)]
pub enum UserError {
    #[error("User name is not a valid e-mail address: {0:?}")]
    InvalidUserName(String),

    #[error("Invalid user id for user {user_name}: {value:?}")]
    InvalidUserId { user_name: String, value: String },

    #[error("Invalid group id: {0}")]
    InvalidGroupId(String),

    #[error("Display name may not contain ';' or line breaks: {0:?}")]
    InvalidDisplayName(String),

    #[error("Invalid {field} time for user {user_name}: {source}")]
    InvalidTime {
        field: &'static str,
        user_name: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Missing data, less than 7 fields found: {found}")]
    MissingData { found: usize },

    #[error("User exists: {0}")]
    UserExists(String),

    #[error("User {0} does not read back unchanged from the line format")]
    NotStorable(String),

    #[error("No user ids left to assign")]
    UserIdsExhausted,

    #[error("No such user: {0}")]
    NoSuchUser(String),

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Key has a length of {0} bytes, should be 16, 24 or 32")]
    InvalidKey(usize),

    #[error("Wrong initial vector for decryption: {len} bytes, need at least {block}")]
    InvalidVector { len: usize, block: usize },

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl UserError {
    /// Check if this error was raised while validating a single record
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            UserError::InvalidUserName(_)
                | UserError::InvalidUserId { .. }
                | UserError::InvalidGroupId(_)
                | UserError::InvalidDisplayName(_)
                | UserError::InvalidTime { .. }
                | UserError::MissingData { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, UserError>;
