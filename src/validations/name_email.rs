// An extension trait to provide the `graphemes` method on `String` and `&str`
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

static PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 \-]{4,24}$").expect("valid phone regex"));

/// Display name of a person or a restaurant.
#[derive(Debug)]
pub struct PersonName(String);

impl PersonName {
    pub fn parse(s: String) -> std::result::Result<PersonName, String> {
        let is_empty_or_whitespace = s.trim().is_empty();
        let is_too_long = s.graphemes(true).count() > 256;
        let forbidden_characters = ['/', '(', ')', '"', '<', '>', '\\', '{', '}'];
        let contains_forbidden_characters = s.chars().any(|c| forbidden_characters.contains(&c));

        if is_empty_or_whitespace || is_too_long || contains_forbidden_characters {
            Err(format!("{} is not a valid name.", s))
        } else {
            Ok(Self(s.trim().to_string()))
        }
    }
}

impl AsRef<str> for PersonName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug)]
pub struct UserEmail(String);

impl UserEmail {
    /// Emails are stored lower-cased so uniqueness is case-insensitive.
    pub fn parse(s: String) -> std::result::Result<UserEmail, String> {
        let s = s.trim().to_lowercase();
        if EMAIL_REGEX.is_match(&s) {
            Ok(Self(s))
        } else {
            Err(format!("{} is not a valid email address.", s))
        }
    }
}

impl AsRef<str> for UserEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(s: String) -> std::result::Result<PhoneNumber, String> {
        let s = s.trim().to_string();
        let digits = s.chars().filter(|c| c.is_ascii_digit()).count();
        if PHONE_REGEX.is_match(&s) && (6..=20).contains(&digits) {
            Ok(Self(s))
        } else {
            Err(format!("{} is not a valid phone number.", s))
        }
    }

    /// Blank input means "no phone number".
    pub fn parse_optional(s: Option<String>) -> std::result::Result<Option<PhoneNumber>, String> {
        match s {
            Some(s) if !s.trim().is_empty() => PhoneNumber::parse(s).map(Some),
            _ => Ok(None),
        }
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
