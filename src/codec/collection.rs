//! Newline separated list of user records, one line per record

use std::str::FromStr;

use tracing::debug;

use crate::codec::record::{decode_record, encode_record};
use crate::core::error::{Result, UserError};
use crate::stores::users::Users;

/// Serialize all users ordered by user id, each line newline terminated
pub fn encode_users(users: &Users) -> String {
    let mut buf = String::with_capacity(users.len() * 128);
    for user in users.iter_sorted() {
        encode_record(user, &mut buf);
        buf.push('\n');
    }
    buf
}

/// Parse a whole file body into a fresh collection
///
/// Empty input gives an empty collection. Any bad line, or a user name
/// or user id seen twice, aborts the whole decode.
pub fn decode_users(text: &str) -> Result<Users> {
    let mut users = Users::new();
    if text.is_empty() {
        return Ok(users);
    }

    for (line_num, line) in text.lines().enumerate() {
        let user = decode_record(line).map_err(|e| {
            debug!(line_num = line_num + 1, error = %e, "Failed to decode user line");
            e
        })?;
        users.index(user)?;
    }

    Ok(users)
}

impl FromStr for Users {
    type Err = UserError;

    fn from_str(s: &str) -> Result<Self> {
        decode_users(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &str = "a@b.c;*;1;1;A;2023-11-24T15:38:00Z;2023-12-05T08:14:00Z
b@b.c;*;2;2;B;2023-11-24T16:25:00Z;2023-12-05T08:14:00Z
c@b.c;*;3;1,2;C;2023-11-24T16:25:00Z;2023-12-05T08:14:00Z
";

    #[test]
    fn test_decode_and_encode_all() {
        let users = decode_users(ALL).unwrap();
        assert_eq!(users.len(), 3);
        assert_eq!(encode_users(&users), ALL);
    }

    #[test]
    fn test_encode_sorts_by_id() {
        let shuffled = "c@b.c;*;3;1,2;C;2023-11-24T16:25:00Z;2023-12-05T08:14:00Z
a@b.c;*;1;1;A;2023-11-24T15:38:00Z;2023-12-05T08:14:00Z
b@b.c;*;2;2;B;2023-11-24T16:25:00Z;2023-12-05T08:14:00Z
";
        let users: Users = shuffled.parse().unwrap();
        assert_eq!(encode_users(&users), ALL);
    }

    #[test]
    fn test_empty_input() {
        let users = decode_users("").unwrap();
        assert!(users.is_empty());
        assert_eq!(encode_users(&users), "");
    }

    #[test]
    fn test_missing_trailing_newline() {
        let users = decode_users(ALL.trim_end()).unwrap();
        assert_eq!(users.len(), 3);
        assert_eq!(encode_users(&users), ALL);
    }

    #[test]
    fn test_bad_line_aborts() {
        let text = "a@b.c;$2a$12$O82XHvkCrkQzpkr30NNShu81RueblNmjIu6jeZuaGB.d8g7roROI.;-1;3,4;D;2023-11-24T15:38:00Z;2023-12-05T08:14:00Z
d@e.f;$2a$12$cKlDQ9UmKhy7XS40fXR8jONaajOX3k1g1YfN63lsa0OxjgxcMpKA6;2;1;A;2023-11-24T16:25:00Z;2023-12-05T08:14:00Z
";
        assert!(matches!(
            decode_users(text),
            Err(UserError::InvalidUserId { .. })
        ));
    }

    #[test]
    fn test_duplicate_user_name() {
        let text = "a@b.c;*;1;1;A;2023-11-24T15:38:00Z;2023-12-05T08:14:00Z
a@b.c;*;2;2;B;2023-11-24T16:25:00Z;2023-12-05T08:14:00Z
";
        assert!(matches!(decode_users(text), Err(UserError::UserExists(_))));
    }

    #[test]
    fn test_duplicate_user_id() {
        let text = "a@b.c;*;1;1;A;2023-11-24T15:38:00Z;2023-12-05T08:14:00Z
b@b.c;*;2;2;B;2023-11-24T16:25:00Z;2023-12-05T08:14:00Z
c@b.c;*;2;1,2;C;2023-11-24T16:25:00Z;2023-12-05T08:14:00Z
";
        assert!(matches!(decode_users(text), Err(UserError::UserExists(_))));
    }

    #[test]
    fn test_decode_keeps_timestamps() {
        let users = decode_users(ALL).unwrap();
        let user = users.get_by_id(1).unwrap();
        assert_eq!(
            crate::utils::time::format_rfc3339(&user.modified()),
            "2023-12-05T08:14:00Z"
        );
    }

    #[test]
    fn test_decode_advances_id_counter() {
        let mut users = decode_users(ALL).unwrap();
        let user = crate::models::user::UserRecord::new("new@b.c", "N", &[]).unwrap();
        assert_eq!(users.insert(user).unwrap(), 4);
    }
}
