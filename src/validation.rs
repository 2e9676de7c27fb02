//! Field rules for signup and login bodies.
//!
//! Rules collect every problem into [`FieldErrors`] instead of stopping at the
//! first one, so a client sees all rejected fields at once.

use crate::error::FieldErrors;
use crate::models::{LoginRequest, SignupRequest};

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";
pub const USERNAME_CHARSET: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
pub const USERNAME_TOO_LONG: &str = "Ensure this field has no more than 150 characters.";
pub const EMAIL_INVALID: &str = "Enter a valid email address.";
pub const EMAIL_TOO_LONG: &str = "Ensure this field has no more than 254 characters.";
pub const PASSWORD_TOO_SHORT: &str = "Ensure this field has at least 8 characters.";
pub const PASSWORD_TOO_LONG: &str = "Ensure this field has no more than 71 bytes.";

pub const USERNAME_MAX_CHARS: usize = 150;
pub const EMAIL_MAX_CHARS: usize = 254;
pub const PASSWORD_MIN_CHARS: usize = 8;
/// bcrypt keys are 72 bytes including the NUL terminator.
pub const PASSWORD_MAX_BYTES: usize = 71;

#[derive(Debug, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Outcome of checking a signup body before the store is consulted.
#[derive(Debug)]
pub struct SignupCheck {
    /// Present when the username passed its own rules and is worth a uniqueness lookup.
    pub username: Option<String>,
    pub username_missing: bool,
    pub errors: FieldErrors,
    candidate: Option<NewUser>,
}

impl SignupCheck {
    pub fn into_new_user(self) -> Result<NewUser, FieldErrors> {
        match self.candidate {
            Some(user) if self.errors.is_empty() => Ok(user),
            _ => Err(self.errors),
        }
    }
}

pub fn check_signup(req: &SignupRequest) -> SignupCheck {
    let mut errors = FieldErrors::default();

    let username = present("username", req.username.as_deref(), &mut errors)
        .filter(|username| check_username(username, &mut errors));
    let email = present("email", req.email.as_deref(), &mut errors)
        .filter(|email| check_email(email, &mut errors));
    let password = present("password", req.password.as_deref(), &mut errors)
        .filter(|password| check_password(password, &mut errors));

    let candidate = match (username, email, password) {
        (Some(username), Some(email), Some(password)) => Some(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }),
        _ => None,
    };

    SignupCheck {
        username: username.map(str::to_string),
        username_missing: req.username.is_none(),
        errors,
        candidate,
    }
}

/// Returns `(username, password)` when both are present and non-blank.
pub fn check_login(req: &LoginRequest) -> Result<(String, String), FieldErrors> {
    let mut errors = FieldErrors::default();
    let username = present("username", req.username.as_deref(), &mut errors);
    let password = present("password", req.password.as_deref(), &mut errors);
    match (username, password) {
        (Some(username), Some(password)) => Ok((username.to_string(), password.to_string())),
        _ => Err(errors),
    }
}

/// Returns the value with surrounding whitespace removed, as every later rule sees it.
fn present<'a>(field: &str, value: Option<&'a str>, errors: &mut FieldErrors) -> Option<&'a str> {
    match value.map(str::trim) {
        None => {
            errors.add(field, REQUIRED);
            None
        }
        Some("") => {
            errors.add(field, BLANK);
            None
        }
        Some(v) => Some(v),
    }
}

fn check_username(username: &str, errors: &mut FieldErrors) -> bool {
    let mut ok = true;
    if username.chars().count() > USERNAME_MAX_CHARS {
        errors.add("username", USERNAME_TOO_LONG);
        ok = false;
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        errors.add("username", USERNAME_CHARSET);
        ok = false;
    }
    ok
}

fn check_email(email: &str, errors: &mut FieldErrors) -> bool {
    if email.chars().count() > EMAIL_MAX_CHARS {
        errors.add("email", EMAIL_TOO_LONG);
        return false;
    }
    if !is_valid_email(email) {
        errors.add("email", EMAIL_INVALID);
        return false;
    }
    true
}

fn check_password(password: &str, errors: &mut FieldErrors) -> bool {
    if password.chars().count() < PASSWORD_MIN_CHARS {
        errors.add("password", PASSWORD_TOO_SHORT);
        return false;
    }
    if password.len() > PASSWORD_MAX_BYTES {
        errors.add("password", PASSWORD_TOO_LONG);
        return false;
    }
    true
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > 64 || email.chars().any(char::is_whitespace) {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") || local.contains('@') {
        return false;
    }
    if domain == "localhost" {
        return true;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    labels.iter().all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn signup(username: Option<&str>, email: Option<&str>, password: Option<&str>) -> SignupRequest {
        SignupRequest {
            username: username.map(String::from),
            email: email.map(String::from),
            password: password.map(String::from),
        }
    }

    #[test]
    fn valid_signup_yields_new_user() {
        let check = check_signup(&signup(
            Some("testuser"),
            Some("test@example.com"),
            Some("strongpassword123"),
        ));
        assert_eq!(check.username.as_deref(), Some("testuser"));
        assert!(!check.username_missing);
        assert_eq!(
            check.into_new_user().unwrap(),
            NewUser {
                username: "testuser".into(),
                email: "test@example.com".into(),
                password: "strongpassword123".into(),
            }
        );
    }

    #[test]
    fn every_missing_field_is_reported() {
        let check = check_signup(&signup(None, None, None));
        assert!(check.username_missing);
        assert!(check.username.is_none());
        let errors = check.into_new_user().unwrap_err();
        for field in ["username", "email", "password"] {
            assert_eq!(errors.get(field), Some(&[REQUIRED.to_string()][..]));
        }
    }

    #[test]
    fn blank_username_is_not_missing() {
        let check = check_signup(&signup(Some("  "), Some("a@b.co"), Some("longenough")));
        assert!(!check.username_missing);
        assert_eq!(check.errors.get("username"), Some(&[BLANK.to_string()][..]));
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let check = check_signup(&signup(
            Some(" testuser\t"),
            Some(" test@example.com "),
            Some("  strongpassword123 "),
        ));
        assert_eq!(check.username.as_deref(), Some("testuser"));
        assert_eq!(
            check.into_new_user().unwrap(),
            NewUser {
                username: "testuser".into(),
                email: "test@example.com".into(),
                password: "strongpassword123".into(),
            }
        );

        let (username, password) = check_login(&LoginRequest {
            username: Some(" loginuser ".into()),
            password: Some(" loginpass123 ".into()),
        })
        .unwrap();
        assert_eq!((username.as_str(), password.as_str()), ("loginuser", "loginpass123"));
    }

    #[test]
    fn username_stays_eligible_for_uniqueness_when_other_fields_fail() {
        let check = check_signup(&signup(Some("testuser"), Some("bad"), Some("short")));
        assert_eq!(check.username.as_deref(), Some("testuser"));
        assert!(check.errors.contains("email"));
        assert!(check.errors.contains("password"));
        assert!(!check.errors.contains("username"));
    }

    #[rstest]
    #[case("has space", USERNAME_CHARSET)]
    #[case("semi;colon", USERNAME_CHARSET)]
    #[case(&"x".repeat(151), USERNAME_TOO_LONG)]
    fn bad_usernames(#[case] username: &str, #[case] message: &str) {
        let check = check_signup(&signup(Some(username), Some("a@b.co"), Some("longenough")));
        assert!(check.username.is_none());
        assert!(check.errors.get("username").unwrap().iter().any(|m| m == message));
    }

    #[rstest]
    #[case("user.name+tag@example.com", true)]
    #[case("a@b.co", true)]
    #[case("no-at-sign", false)]
    #[case("@example.com", false)]
    #[case("user@", false)]
    #[case("user@localhost", true)]
    #[case("user@localhost.", false)]
    #[case("user@exa mple.com", false)]
    #[case("user@-example.com", false)]
    #[case("user@example..com", false)]
    #[case(".user@example.com", false)]
    fn email_shapes(#[case] email: &str, #[case] valid: bool) {
        assert_eq!(is_valid_email(email), valid, "{email}");
    }

    #[rstest]
    #[case("short", Some(PASSWORD_TOO_SHORT))]
    #[case("12345678", None)]
    #[case(&"p".repeat(71), None)]
    #[case(&"p".repeat(72), Some(PASSWORD_TOO_LONG))]
    fn password_length(#[case] password: &str, #[case] message: Option<&str>) {
        let check = check_signup(&signup(Some("testuser"), Some("a@b.co"), Some(password)));
        assert_eq!(
            check.errors.get("password").map(|m| m[0].as_str()),
            message
        );
    }

    #[test]
    fn login_requires_both_fields() {
        let errors = check_login(&LoginRequest {
            username: Some("".into()),
            password: None,
        })
        .unwrap_err();
        assert_eq!(errors.get("username"), Some(&[BLANK.to_string()][..]));
        assert_eq!(errors.get("password"), Some(&[REQUIRED.to_string()][..]));

        let ok = check_login(&LoginRequest {
            username: Some("loginuser".into()),
            password: Some("loginpass123".into()),
        })
        .unwrap();
        assert_eq!(ok, ("loginuser".to_string(), "loginpass123".to_string()));
    }
}
