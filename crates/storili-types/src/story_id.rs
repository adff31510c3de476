use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum length of a story identifier.
const MAX_STORY_ID_LEN: usize = 64;

/// Public name of a story, e.g. `three-little-pigs`.
///
/// Story identifiers are used as registry keys, as file stems in the stories
/// directory, and as the identifier clients send to the token proxy. They are
/// restricted to lowercase ASCII letters, digits and interior hyphens.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoryId(String);

/// Error returned when a string is not a valid [`StoryId`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid story id {value:?}: {reason}")]
pub struct InvalidStoryId {
    /// The rejected input.
    pub value: String,
    /// Why it was rejected.
    pub reason: &'static str,
}

impl StoryId {
    /// Validates and wraps a story identifier.
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidStoryId> {
        let value = value.into();
        let reject = |reason| {
            Err(InvalidStoryId {
                value: value.clone(),
                reason,
            })
        };

        if value.is_empty() {
            return reject("must not be empty");
        }
        if value.len() > MAX_STORY_ID_LEN {
            return reject("must be at most 64 characters");
        }
        if !value
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        {
            return reject("only lowercase letters, digits and '-' are allowed");
        }
        if value.starts_with('-') || value.ends_with('-') {
            return reject("must not start or end with '-'");
        }

        Ok(Self(value))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl FromStr for StoryId {
    type Err = InvalidStoryId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for StoryId {
    type Error = InvalidStoryId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StoryId> for String {
    fn from(id: StoryId) -> Self {
        id.0
    }
}

impl AsRef<str> for StoryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
