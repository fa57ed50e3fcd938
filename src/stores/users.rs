use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tracing::debug;

use crate::codec::record::decode_record;
use crate::core::error::{Result, UserError};
use crate::models::user::{check_user_name, UserRecord};

/// Selects a user either by user name or by user id
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserKey<'a> {
    Name(&'a str),
    Id(u64),
}

impl<'a> From<&'a str> for UserKey<'a> {
    fn from(name: &'a str) -> Self {
        UserKey::Name(name)
    }
}

impl<'a> From<&'a String> for UserKey<'a> {
    fn from(name: &'a String) -> Self {
        UserKey::Name(name)
    }
}

impl From<u64> for UserKey<'_> {
    fn from(id: u64) -> Self {
        UserKey::Id(id)
    }
}

impl fmt::Display for UserKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserKey::Name(name) => write!(f, "{}", name),
            UserKey::Id(id) => write!(f, "user id {}", id),
        }
    }
}

/// In-memory collection of users indexed by user name and by user id
///
/// Records are owned by the id index; the name index maps a user name to
/// its id. Both always hold the same set of users. The collection has no
/// internal locking, callers serialize mutations themselves.
#[derive(Debug, Default)]
pub struct Users {
    by_id: BTreeMap<u64, UserRecord>,
    by_name: HashMap<String, u64>,
    /// Highest user id ever assigned or seen
    last_id: u64,
}

impl Users {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn contains<'a>(&self, key: impl Into<UserKey<'a>>) -> bool {
        self.resolve(key.into()).is_ok()
    }

    /// Add a user and return its id
    ///
    /// A user id of 0 gets the next unused id. The record must read back
    /// unchanged from the line format and its user name and id must be
    /// free; otherwise nothing changes.
    pub fn insert(&mut self, user: UserRecord) -> Result<u64> {
        let mut candidate = user;
        if candidate.user_id == 0 {
            candidate.user_id = self.next_id()?;
        }

        if decode_record(&candidate.to_string())? != candidate {
            return Err(UserError::NotStorable(candidate.user_name));
        }
        self.check_free(&candidate)?;

        candidate.touch();
        let id = self.index(candidate)?;
        debug!(user_id = id, users = self.len(), "User inserted");
        Ok(id)
    }

    /// Put a user into both indexes, assigning an id when it has none
    ///
    /// Used by `insert` and by the collection decoder, so that loading a
    /// file applies the same uniqueness rules as a live insert. Does not
    /// touch the modification time.
    pub(crate) fn index(&mut self, mut user: UserRecord) -> Result<u64> {
        if user.user_id == 0 {
            user.user_id = self.next_id()?;
        }
        self.check_free(&user)?;

        let id = user.user_id;
        self.last_id = self.last_id.max(id);
        self.by_name.insert(user.user_name.clone(), id);
        self.by_id.insert(id, user);
        Ok(id)
    }

    fn next_id(&self) -> Result<u64> {
        self.last_id
            .checked_add(1)
            .ok_or(UserError::UserIdsExhausted)
    }

    fn check_free(&self, user: &UserRecord) -> Result<()> {
        if self.by_name.contains_key(&user.user_name) {
            return Err(UserError::UserExists(user.user_name.clone()));
        }
        if self.by_id.contains_key(&user.user_id) {
            return Err(UserError::UserExists(format!("user id {}", user.user_id)));
        }
        Ok(())
    }

    fn resolve(&self, key: UserKey<'_>) -> Result<u64> {
        let id = match key {
            UserKey::Name(name) => self.by_name.get(name).copied(),
            UserKey::Id(id) => self.by_id.contains_key(&id).then_some(id),
        };
        id.ok_or_else(|| UserError::NoSuchUser(key.to_string()))
    }

    fn get_mut(&mut self, key: UserKey<'_>) -> Result<&mut UserRecord> {
        let id = self.resolve(key)?;
        self.by_id
            .get_mut(&id)
            .ok_or_else(|| UserError::NoSuchUser(key.to_string()))
    }

    /// Look up a user by name or id
    pub fn get<'a>(&self, key: impl Into<UserKey<'a>>) -> Result<&UserRecord> {
        let key = key.into();
        let id = self.resolve(key)?;
        self.by_id
            .get(&id)
            .ok_or_else(|| UserError::NoSuchUser(key.to_string()))
    }

    pub fn get_by_name(&self, user_name: &str) -> Result<&UserRecord> {
        self.get(UserKey::Name(user_name))
    }

    pub fn get_by_id(&self, user_id: u64) -> Result<&UserRecord> {
        self.get(UserKey::Id(user_id))
    }

    /// Copies of all users for which `filter` returns true, in no particular order
    pub fn select<F>(&self, filter: F) -> Vec<UserRecord>
    where
        F: Fn(&UserRecord) -> bool,
    {
        self.by_id
            .values()
            .filter(|user| filter(user))
            .cloned()
            .collect()
    }

    /// Users in ascending user id order
    pub fn iter_sorted(&self) -> impl Iterator<Item = &UserRecord> + '_ {
        self.by_id.values()
    }

    pub fn deactivate<'a>(&mut self, key: impl Into<UserKey<'a>>) -> Result<()> {
        self.get_mut(key.into())?.deactivate();
        Ok(())
    }

    pub fn reactivate<'a>(&mut self, key: impl Into<UserKey<'a>>) -> Result<()> {
        self.get_mut(key.into())?.reactivate();
        Ok(())
    }

    /// Give a user a new user name, moving its entry in the name index
    ///
    /// The user id and the id index are left untouched.
    pub fn rename<'a>(&mut self, key: impl Into<UserKey<'a>>, user_name: &str) -> Result<()> {
        let id = self.resolve(key.into())?;
        let user_name = check_user_name(user_name)?;
        if self.by_name.contains_key(&user_name) {
            return Err(UserError::UserExists(user_name));
        }

        let user = self
            .by_id
            .get_mut(&id)
            .ok_or_else(|| UserError::NoSuchUser(format!("user id {}", id)))?;

        self.by_name.remove(&user.user_name);
        debug!(user_id = id, from = %user.user_name, to = %user_name, "User renamed");
        user.user_name = user_name.clone();
        user.touch();
        self.by_name.insert(user_name, id);
        Ok(())
    }

    /// Replace the groups of a user; on error the current groups are kept
    pub fn set_groups<'a>(&mut self, key: impl Into<UserKey<'a>>, group_ids: &[i64]) -> Result<()> {
        self.get_mut(key.into())?.set_groups(group_ids)
    }

    pub fn set_display_name<'a>(
        &mut self,
        key: impl Into<UserKey<'a>>,
        display_name: &str,
    ) -> Result<()> {
        self.get_mut(key.into())?.set_display_name(display_name)
    }

    pub fn set_password<'a>(&mut self, key: impl Into<UserKey<'a>>, plain: &str) -> Result<()> {
        self.get_mut(key.into())?.set_password(plain)
    }

    pub fn verify_password<'a>(&self, key: impl Into<UserKey<'a>>, plain: &str) -> Result<()> {
        self.get(key)?.verify_password(plain)
    }

    /// Remove a user from both indexes
    /// Returns the removed user if it existed
    pub fn remove<'a>(&mut self, key: impl Into<UserKey<'a>>) -> Option<UserRecord> {
        let id = self.resolve(key.into()).ok()?;
        let user = self.by_id.remove(&id)?;
        self.by_name.remove(&user.user_name);
        debug!(user_id = id, users = self.len(), "User removed");
        Some(user)
    }
}
