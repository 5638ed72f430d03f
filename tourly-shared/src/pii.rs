use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wrapper for guest and customer contact data (emails, phone numbers, ID numbers).
///
/// `Debug` and `Display` never print the value, so a booking can be handed to
/// `tracing` macros without leaking contact details. Serialization passes the
/// real value through because API responses need it.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T> Masked<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl From<String> for Masked<String> {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Masked<String> {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Keeps the first character of the local part and the full domain: `j***@example.com`.
pub fn redact_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() => {
            let first: String = local.chars().take(1).collect();
            format!("{}***@{}", first, domain)
        }
        _ => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_value() {
        let phone = Masked::from("+91 98765 43210");
        assert_eq!(format!("{:?}", phone), "********");
        assert_eq!(format!("{}", phone), "********");
    }

    #[test]
    fn test_serialize_passes_value_through() {
        let email = Masked::from("asha@example.com");
        let json = serde_json::to_string(&email).unwrap();
        assert_eq!(json, "\"asha@example.com\"");

        let back: Masked<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.expose(), "asha@example.com");
    }

    #[test]
    fn test_redact_email() {
        assert_eq!(redact_email("asha@example.com"), "a***@example.com");
        assert_eq!(redact_email("not-an-email"), "***");
        assert_eq!(redact_email("@example.com"), "***");
    }
}
