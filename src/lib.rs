//! A user account store modeled after a Unix password file.
//!
//! Users live in memory in a [`Users`] collection indexed by user name and
//! by user id. [`UserFile`] loads and saves the collection as one line per
//! user, optionally AES encrypted at rest.

pub mod core {
    pub mod config;
    pub mod error;
    pub mod tracing_init;
}

pub mod codec {
    pub mod collection;
    pub mod record;
}

pub mod crypto {
    pub mod cipher;
    pub mod password;
}

pub mod models {
    pub mod user;
}

pub mod stores {
    pub mod user_file;
    pub mod users;
}

pub mod utils {
    pub mod email;
    pub mod time;
}

pub use crate::core::error::{Result, UserError};
pub use crate::models::user::UserRecord;
pub use crate::stores::user_file::UserFile;
pub use crate::stores::users::{UserKey, Users};
