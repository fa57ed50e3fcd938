use validator::ValidateEmail;

/// Check that `s` is a syntactically valid e-mail address
pub fn is_valid_email(s: &str) -> bool {
    !s.is_empty() && s.validate_email()
}
