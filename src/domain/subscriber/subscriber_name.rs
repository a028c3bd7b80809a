use std::fmt;
use std::fmt::{Display, Formatter};
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone)]
pub struct SubscriberName(String);

impl SubscriberName {
    /// Returns an instance of `SubscriberName` if all conditions are met.
    pub fn parse(s: String) -> Result<Self, String> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err("Invalid subscriber name: cannot be empty or whitespace.".to_string());
        }

        if trimmed.graphemes(true).count() > 256 {
            return Err(
                "Invalid subscriber name: cannot be longer than 256 characters.".to_string(),
            );
        }

        let forbidden_characters = ['/', '(', ')', '"', '<', '>', '\\', '{', '}'];
        if trimmed.chars().any(|c| forbidden_characters.contains(&c)) {
            return Err("Invalid subscriber name: contains forbidden characters. The following are not allowed: / ( ) \" < > \\ { }".to_string());
        }

        Ok(Self(trimmed.to_string()))
    }
}

impl AsRef<str> for SubscriberName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for SubscriberName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
