use crate::core::error::{Result, UserError};
use crate::crypto::password;
use crate::utils::email::is_valid_email;
use crate::utils::time::{self, Timestamp};

/// Leading verifier character that marks an account as deactivated
pub const DEACTIVATED: char = '*';

/// A user account as stored in the password file
///
/// Fields are private so that every record reachable from outside has a
/// valid user name, normalized groups and a display name that survives
/// the `;`-separated file format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRecord {
    pub(crate) user_name: String,
    pub(crate) verifier: String,
    /// 0 until the record is inserted into a collection
    pub(crate) user_id: u64,
    pub(crate) group_ids: Vec<u64>,
    pub(crate) display_name: String,
    pub(crate) created: Timestamp,
    pub(crate) modified: Timestamp,
}

impl UserRecord {
    /// Create a deactivated record without a user id
    pub fn new(user_name: &str, display_name: &str, group_ids: &[i64]) -> Result<Self> {
        let user_name = check_user_name(user_name)?;
        check_display_name(display_name)?;
        let created = time::now();

        Ok(Self {
            user_name,
            verifier: DEACTIVATED.to_string(),
            user_id: 0,
            group_ids: normalize_groups(group_ids)?,
            display_name: display_name.to_string(),
            created,
            modified: created,
        })
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    /// Group ids, ascending and without duplicates
    pub fn group_ids(&self) -> &[u64] {
        &self.group_ids
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn created(&self) -> Timestamp {
        self.created
    }

    pub fn modified(&self) -> Timestamp {
        self.modified
    }

    pub fn is_in_group(&self, group_id: u64) -> bool {
        self.group_ids.binary_search(&group_id).is_ok()
    }

    pub fn is_active(&self) -> bool {
        !self.verifier.starts_with(DEACTIVATED)
    }

    /// Change the user name of a record that is not part of a collection
    ///
    /// Records inside a collection are renamed through `Users::rename`,
    /// which also keeps the e-mail index in sync.
    pub fn set_user_name(&mut self, user_name: &str) -> Result<()> {
        self.user_name = check_user_name(user_name)?;
        self.touch();
        Ok(())
    }

    pub fn set_display_name(&mut self, display_name: &str) -> Result<()> {
        check_display_name(display_name)?;
        self.display_name = display_name.to_string();
        self.touch();
        Ok(())
    }

    /// Replace the group ids; on error the current groups are kept
    pub fn set_groups(&mut self, group_ids: &[i64]) -> Result<()> {
        self.group_ids = normalize_groups(group_ids)?;
        self.touch();
        Ok(())
    }

    /// Store a fresh verifier for `plain`, which also activates the account
    pub fn set_password(&mut self, plain: &str) -> Result<()> {
        self.verifier = password::hash_password(plain)?;
        self.touch();
        Ok(())
    }

    /// Check `plain` against the stored verifier
    pub fn verify_password(&self, plain: &str) -> Result<()> {
        if !self.is_active() {
            return Err(UserError::InvalidPassword);
        }
        password::verify_password(&self.verifier, plain)
    }

    /// Prefix the verifier with the sentinel; no-op when already deactivated
    pub fn deactivate(&mut self) {
        if !self.is_active() {
            return;
        }
        self.verifier.insert(0, DEACTIVATED);
        self.touch();
    }

    /// Strip the sentinel; no-op when active
    pub fn reactivate(&mut self) {
        if self.is_active() {
            return;
        }
        self.verifier.remove(0);
        self.touch();
    }

    pub(crate) fn touch(&mut self) {
        let now = time::now();
        // clock went backwards, keep modified >= created
        self.modified = if now < self.created { self.created } else { now };
    }
}

/// Trim and validate a user name
pub(crate) fn check_user_name(user_name: &str) -> Result<String> {
    let trimmed = user_name.trim();
    if !is_valid_email(trimmed) {
        return Err(UserError::InvalidUserName(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn check_display_name(display_name: &str) -> Result<()> {
    if display_name.contains([';', '\n', '\r']) {
        return Err(UserError::InvalidDisplayName(display_name.to_string()));
    }
    Ok(())
}

/// Reject negative ids, then sort and deduplicate
pub(crate) fn normalize_groups(group_ids: &[i64]) -> Result<Vec<u64>> {
    let mut ids = group_ids
        .iter()
        .map(|&id| u64::try_from(id).map_err(|_| UserError::InvalidGroupId(id.to_string())))
        .collect::<Result<Vec<u64>>>()?;
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user() {
        let before = time::now();
        let user = UserRecord::new(" a@b.c ", "A", &[1, 0]).unwrap();

        assert_eq!(user.user_name(), "a@b.c");
        assert_eq!(user.display_name(), "A");
        assert_eq!(user.group_ids(), &[0, 1]);
        assert_eq!(user.user_id(), 0);
        assert_eq!(user.verifier(), "*");
        assert!(!user.is_active());
        assert!(user.created() >= before);
        assert_eq!(user.created(), user.modified());
    }

    #[test]
    fn test_new_user_invalid() {
        assert!(matches!(
            UserRecord::new("a@.c", "A", &[0, 1]),
            Err(UserError::InvalidUserName(_))
        ));
        assert!(matches!(
            UserRecord::new("a@b.c", "A", &[-1]),
            Err(UserError::InvalidGroupId(_))
        ));
        assert!(matches!(
            UserRecord::new("a@b.c", "A;B", &[]),
            Err(UserError::InvalidDisplayName(_))
        ));
    }

    #[test]
    fn test_setters() {
        let mut user = UserRecord::new("a@b.c", "", &[]).unwrap();
        let created = user.created();

        user.set_user_name(" d@e.f ").unwrap();
        assert_eq!(user.user_name(), "d@e.f");

        user.set_display_name(" D ").unwrap();
        assert_eq!(user.display_name(), " D ");

        assert!(user.set_user_name("not-an-address").is_err());
        assert_eq!(user.user_name(), "d@e.f");

        assert_eq!(user.created(), created);
        assert!(user.modified() >= created);
    }

    #[test]
    fn test_set_groups() {
        let mut user = UserRecord::new("a@b.c", "A", &[]).unwrap();

        let cases: [(&[i64], &[u64], u64, bool); 5] = [
            (&[1, 2], &[1, 2], 1, true),
            (&[], &[], 1, false),
            (&[1, 1], &[1], 2, false),
            (&[1, 1, 2, 1, 3], &[1, 2, 3], 0, false),
            (&[3, 1, 2, 2, 1, 1], &[1, 2, 3], 2, true),
        ];

        for (ids, want, probe, is_in) in cases {
            user.set_groups(ids).unwrap();
            assert_eq!(user.group_ids(), want, "set_groups({:?})", ids);
            assert_eq!(user.is_in_group(probe), is_in);
        }

        let err = user.set_groups(&[1, -1]).unwrap_err();
        assert!(matches!(err, UserError::InvalidGroupId(_)));
        assert_eq!(user.group_ids(), &[1, 2, 3]);
    }

    #[test]
    fn test_password() {
        let mut user = UserRecord::new("a@b.c", "A", &[]).unwrap();
        assert!(matches!(
            user.verify_password(""),
            Err(UserError::InvalidPassword)
        ));

        user.set_password("a@pNn00tm13s").unwrap();
        assert!(user.is_active());
        user.verify_password("a@pNn00tm13s").unwrap();
        assert!(matches!(
            user.verify_password("a@pNn00tm13s_"),
            Err(UserError::InvalidPassword)
        ));

        user.deactivate();
        assert!(matches!(
            user.verify_password("a@pNn00tm13s"),
            Err(UserError::InvalidPassword)
        ));

        user.reactivate();
        user.verify_password("a@pNn00tm13s").unwrap();
    }

    #[test]
    fn test_deactivate_idempotent() {
        let mut user = UserRecord::new("a@b.c", "A", &[]).unwrap();
        user.verifier = "$x$x$xxxxxx".to_string();

        user.deactivate();
        assert_eq!(user.verifier(), "*$x$x$xxxxxx");
        user.deactivate();
        assert_eq!(user.verifier(), "*$x$x$xxxxxx");

        user.reactivate();
        assert_eq!(user.verifier(), "$x$x$xxxxxx");
        user.reactivate();
        assert_eq!(user.verifier(), "$x$x$xxxxxx");
    }
}
