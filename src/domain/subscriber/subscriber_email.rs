use std::fmt::{self, Display, Formatter};

use validator::ValidateEmail;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    /// Returns an instance of `SubscriberEmail` if all conditions are met.
    ///
    /// The address is trimmed and lowercased before validation so that the
    /// unique index on `subscribers.email` treats `Foo@Bar.com` and
    /// `foo@bar.com` as the same subscriber.
    pub fn parse(s: String) -> Result<Self, String> {
        let normalized = s.trim().to_lowercase();

        if normalized.is_empty() {
            return Err("Invalid email: email cannot be empty.".to_string());
        }

        // RFC 5321: 64 local + 1 @ + 255 domain = 320 characters
        if normalized.len() > 320 {
            return Err("Invalid email: cannot be longer than 320 characters.".to_string());
        }

        if !normalized.contains('@') {
            return Err("Invalid email: missing '@' character.".to_string());
        }

        if !normalized.validate_email() {
            return Err(format!(
                "Invalid email: '{normalized}' does not match the required format."
            ));
        }

        Ok(SubscriberEmail(normalized))
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for SubscriberEmail {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // Forward to the Display implementation of the wrapped String.
        self.0.fmt(f)
    }
}
