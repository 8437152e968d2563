use std::fmt;
use std::sync::LazyLock;

use chrono::{Datelike, Utc};
use regex::Regex;
use serde::Serialize;

/// One `@` with a non-empty local part and domain. A dotted domain is not
/// required, so `user@host` passes.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+$").expect("valid email regex"));

/// Korean mobile numbers, digits only.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^01[016789]\d{7,8}$").expect("valid phone regex"));

pub const PASSWORD_SPECIALS: &str = "@#$%^&+=!";
pub const MIN_BIRTH_YEAR: i32 = 1900;

/// A single failed constraint on a request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Accumulates violations while a request is checked field by field.
#[derive(Debug, Default)]
pub struct Violations(Vec<FieldViolation>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldViolation {
            field,
            message: message.into(),
        });
    }

    pub fn not_blank(&mut self, field: &'static str, value: &str) -> bool {
        if value.trim().is_empty() {
            self.push(field, "must not be blank");
            return false;
        }
        true
    }

    /// Length in characters, inclusive on both ends.
    pub fn length(&mut self, field: &'static str, value: &str, min: usize, max: usize) {
        let len = value.chars().count();
        if len < min || len > max {
            self.push(field, format!("length must be between {min} and {max}"));
        }
    }

    pub fn email(&mut self, field: &'static str, value: &str) {
        if self.not_blank(field, value) {
            if !EMAIL_RE.is_match(value) {
                self.push(field, "must be a well-formed email address");
            }
            if value.chars().count() > 50 {
                self.push(field, "length must be at most 50");
            }
        }
    }

    pub fn password(&mut self, field: &'static str, value: &str) {
        if !self.not_blank(field, value) {
            return;
        }
        if !is_strong_password(value) {
            self.push(
                field,
                "must be 8-50 characters and include upper and lower case letters, a digit and one of @#$%^&+=!",
            );
        }
    }

    pub fn phone_number(&mut self, field: &'static str, value: &str) {
        if self.not_blank(field, value) && !PHONE_RE.is_match(value) {
            self.push(field, "must be a mobile number such as 01012345678");
        }
    }

    pub fn birth_year(&mut self, field: &'static str, value: Option<i32>) {
        if let Some(year) = value {
            let current = Utc::now().year();
            if !(MIN_BIRTH_YEAR..=current).contains(&year) {
                self.push(field, format!("must be between {MIN_BIRTH_YEAR} and {current}"));
            }
        }
    }

    pub fn into_result(self) -> Result<(), Vec<FieldViolation>> {
        if self.0.is_empty() { Ok(()) } else { Err(self.0) }
    }
}

fn is_strong_password(value: &str) -> bool {
    let len = value.chars().count();
    (8..=50).contains(&len)
        && value.chars().any(|c| c.is_ascii_lowercase())
        && value.chars().any(|c| c.is_ascii_uppercase())
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(check: impl FnOnce(&mut Violations)) -> Vec<FieldViolation> {
        let mut v = Violations::new();
        check(&mut v);
        v.into_result().err().unwrap_or_default()
    }

    #[test]
    fn password_rules() {
        assert!(single(|v| v.password("password", "Abcdef1!")).is_empty());
        assert_eq!(single(|v| v.password("password", "abcdef1!")).len(), 1);
        assert_eq!(single(|v| v.password("password", "Abcdefgh!")).len(), 1);
        assert_eq!(single(|v| v.password("password", "Abcdef12")).len(), 1);
        assert_eq!(single(|v| v.password("password", "Ab1!")).len(), 1);
    }

    #[test]
    fn phone_rules() {
        assert!(single(|v| v.phone_number("phone_number", "01012345678")).is_empty());
        assert!(single(|v| v.phone_number("phone_number", "0111234567")).is_empty());
        assert_eq!(single(|v| v.phone_number("phone_number", "010-1234-5678")).len(), 1);
        assert_eq!(single(|v| v.phone_number("phone_number", "01212345678")).len(), 1);
    }

    #[test]
    fn email_rules() {
        assert!(single(|v| v.email("email", "runner@example.com")).is_empty());
        assert!(single(|v| v.email("email", "runner@localhost")).is_empty());
        assert_eq!(single(|v| v.email("email", "runner.example.com")).len(), 1);
        assert_eq!(single(|v| v.email("email", "runner@@example.com")).len(), 1);
        assert_eq!(single(|v| v.email("email", "@example.com")).len(), 1);
        let long = format!("{}@example.com", "a".repeat(45));
        assert_eq!(single(|v| v.email("email", &long)).len(), 1);
        // blank reports once, not also as malformed
        assert_eq!(single(|v| v.email("email", "  ")).len(), 1);
    }

    #[test]
    fn birth_year_range() {
        assert!(single(|v| v.birth_year("birth_year", None)).is_empty());
        assert!(single(|v| v.birth_year("birth_year", Some(1990))).is_empty());
        assert_eq!(single(|v| v.birth_year("birth_year", Some(1899))).len(), 1);
        assert_eq!(single(|v| v.birth_year("birth_year", Some(3000))).len(), 1);
    }

    #[test]
    fn length_counts_chars_not_bytes() {
        assert!(single(|v| v.length("nick_name", "달리기", 2, 12)).is_empty());
        assert_eq!(single(|v| v.length("nick_name", "a", 2, 12)).len(), 1);
    }
}
