use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::codec::collection::{decode_users, encode_users};
use crate::core::config::StoreConfig;
use crate::core::error::{Result, UserError};
use crate::crypto::cipher;
use crate::stores::users::Users;

/// Reads and writes the user file, optionally encrypted
///
/// Every load and save holds `lock` for the whole read-decode or
/// encode-write, so no reader ever sees a half-written file. Clones share
/// the lock; independent `UserFile`s do not contend.
#[derive(Clone)]
pub struct UserFile {
    path: PathBuf,
    key: Arc<Zeroizing<Vec<u8>>>,
    lock: Arc<Mutex<()>>,
}

impl std::fmt::Debug for UserFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserFile")
            .field("path", &self.path)
            .field("encrypted", &self.is_encrypted())
            .finish()
    }
}

impl UserFile {
    /// An empty key stores plain text; otherwise it must be 16, 24 or 32 bytes
    pub fn new(path: impl Into<PathBuf>, key: &[u8]) -> Result<Self> {
        if !key.is_empty() {
            cipher::check_key(key)?;
        }

        Ok(UserFile {
            path: path.into(),
            key: Arc::new(Zeroizing::new(key.to_vec())),
            lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn from_config(config: &StoreConfig) -> anyhow::Result<Self> {
        let key = Zeroizing::new(config.key()?.unwrap_or_default());
        Ok(Self::new(&config.path, &key)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_encrypted(&self) -> bool {
        !self.key.is_empty()
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // the lock guards no data, a panic elsewhere cannot leave it inconsistent
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read all users; a missing file gives an empty collection
    pub fn load(&self) -> Result<Users> {
        let _guard = self.guard();

        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "User file not found, starting empty");
                return Ok(Users::new());
            }
            Err(e) => return Err(e.into()),
        };

        let text = if self.is_encrypted() && !raw.is_empty() {
            let plain = cipher::decrypt(&raw, &self.key)?;
            String::from_utf8(plain)
                .map_err(|_| UserError::Encoding("decrypted user file is not UTF-8".to_string()))?
        } else {
            raw
        };

        let users = decode_users(&text).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "Failed to decode user file");
            e
        })?;

        info!(
            path = %self.path.display(),
            users = users.len(),
            encrypted = self.is_encrypted(),
            "User file loaded"
        );
        Ok(users)
    }

    /// Write all users, replacing the file contents
    pub fn save(&self, users: &Users) -> Result<()> {
        let _guard = self.guard();

        let text = encode_users(users);
        let body = if self.is_encrypted() {
            cipher::encrypt(Zeroizing::new(text).as_bytes(), &self.key)?
        } else {
            text
        };

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path)?;
        file.write_all(body.as_bytes())?;
        file.flush()?;

        info!(
            path = %self.path.display(),
            users = users.len(),
            encrypted = self.is_encrypted(),
            "User file saved"
        );
        Ok(())
    }
}
