//! Instrumentation key identifying the telemetry resource a tracer reports to.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const MAX_KEY_LEN: usize = 128;

/// Validated instrumentation key.
///
/// Keys are usually GUIDs, but placeholder values used during local
/// development are accepted as long as they are non-empty printable text.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstrumentationKey(String);

impl InstrumentationKey {
    /// Creates a key after trimming surrounding whitespace and validating it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInstrumentationKey`] if the key is empty, too
    /// long, or contains whitespace or control characters.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let trimmed = key.trim();

        if trimmed.is_empty() {
            return Err(Error::InvalidInstrumentationKey {
                key,
                reason: "key cannot be empty".into(),
            });
        }

        if trimmed.len() > MAX_KEY_LEN {
            return Err(Error::InvalidInstrumentationKey {
                key,
                reason: format!("key length must be <= {MAX_KEY_LEN}"),
            });
        }

        if trimmed
            .chars()
            .any(|ch| ch.is_whitespace() || ch.is_control())
        {
            return Err(Error::InvalidInstrumentationKey {
                key,
                reason: "key must not contain whitespace or control characters".into(),
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for InstrumentationKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for InstrumentationKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for InstrumentationKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<InstrumentationKey> for String {
    fn from(value: InstrumentationKey) -> Self {
        value.0
    }
}
