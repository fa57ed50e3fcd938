//! Line format of a single user record
//!
//! `userName;verifier;userId;g1,g2,...;displayName;created;modified`
//! with both timestamps in RFC3339 at second precision.

use std::fmt;
use std::str::FromStr;

use crate::core::error::{Result, UserError};
use crate::models::user::{check_user_name, normalize_groups, UserRecord};
use crate::utils::time::{format_rfc3339, parse_rfc3339};

/// Field separator within one line
pub const FIELD_SEPARATOR: char = ';';

/// Separator between group ids
pub const GROUP_SEPARATOR: char = ',';

const FIELD_COUNT: usize = 7;

/// Append the line form of `user` to `buf`, without a trailing newline
pub fn encode_record(user: &UserRecord, buf: &mut String) {
    buf.push_str(&user.user_name);
    buf.push(FIELD_SEPARATOR);
    buf.push_str(&user.verifier);
    buf.push(FIELD_SEPARATOR);
    buf.push_str(&user.user_id.to_string());
    buf.push(FIELD_SEPARATOR);
    for (i, id) in user.group_ids.iter().enumerate() {
        if i > 0 {
            buf.push(GROUP_SEPARATOR);
        }
        buf.push_str(&id.to_string());
    }
    buf.push(FIELD_SEPARATOR);
    buf.push_str(&user.display_name);
    buf.push(FIELD_SEPARATOR);
    buf.push_str(&format_rfc3339(&user.created));
    buf.push(FIELD_SEPARATOR);
    buf.push_str(&format_rfc3339(&user.modified));
}

/// Parse one line into a record, validating every field in order
///
/// Fields beyond the seventh are ignored.
pub fn decode_record(line: &str) -> Result<UserRecord> {
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    if fields.len() < FIELD_COUNT {
        return Err(UserError::MissingData {
            found: fields.len(),
        });
    }

    let user_name = check_user_name(fields[0])?;

    let verifier = fields[1].to_string();

    let user_id = match fields[2].trim().parse::<u64>() {
        Ok(id) if id > 0 => id,
        _ => {
            return Err(UserError::InvalidUserId {
                user_name,
                value: fields[2].to_string(),
            })
        }
    };

    let group_ids = decode_groups(fields[3])?;

    let display_name = fields[4].to_string();

    let created = parse_rfc3339(fields[5].trim()).map_err(|source| UserError::InvalidTime {
        field: "creation",
        user_name: user_name.clone(),
        source,
    })?;

    let modified = parse_rfc3339(fields[6].trim()).map_err(|source| UserError::InvalidTime {
        field: "modification",
        user_name: user_name.clone(),
        source,
    })?;

    Ok(UserRecord {
        user_name,
        verifier,
        user_id,
        group_ids,
        display_name,
        created,
        modified,
    })
}

fn decode_groups(field: &str) -> Result<Vec<u64>> {
    let field = field.trim();
    if field.is_empty() {
        return Ok(Vec::new());
    }

    let ids = field
        .split(GROUP_SEPARATOR)
        .map(|token| {
            let token = token.trim();
            token
                .parse::<i64>()
                .map_err(|_| UserError::InvalidGroupId(token.to_string()))
        })
        .collect::<Result<Vec<i64>>>()?;

    normalize_groups(&ids)
}

impl fmt::Display for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = String::with_capacity(128);
        encode_record(self, &mut buf);
        f.write_str(&buf)
    }
}

impl FromStr for UserRecord {
    type Err = UserError;

    fn from_str(s: &str) -> Result<Self> {
        decode_record(s)
    }
}
