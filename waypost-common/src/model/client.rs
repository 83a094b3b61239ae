use rand::{TryRngCore, rngs::OsRng};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::fmt::Display;
use thiserror::Error;
use time::UtcDateTime;

pub const CLIENT_ID_BYTE_LEN: usize = 16;

/// An opaque per-browser identifier used only to label authorship of posts
/// and comments. It carries no privilege and is never verified.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct ClientId(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The client id must not be empty")]
pub struct InvalidClientIdError;

impl ClientId {
    pub fn new(id: String) -> Result<Self, InvalidClientIdError> {
        if id.trim().is_empty() {
            Err(InvalidClientIdError)
        } else {
            Ok(ClientId(id))
        }
    }

    /// Generates a fresh identifier from the OS random number generator,
    /// falling back to a timestamp-derived value when the generator is
    /// unavailable. The fallback has weaker uniqueness, which is acceptable
    /// for a purely advisory label.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0_u8; CLIENT_ID_BYTE_LEN];
        match OsRng.try_fill_bytes(&mut bytes) {
            Ok(()) => ClientId(bytes.iter().map(|byte| format!("{byte:02x}")).collect()),
            Err(_) => ClientId(format!(
                "client-{}",
                UtcDateTime::now().unix_timestamp_nanos()
            )),
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<'de> Deserialize<'de> for ClientId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        ClientId::new(inner)
            .map_err(|_| Error::invalid_value(Unexpected::Str(""), &"ClientId"))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::client::ClientId;

    #[test]
    fn rejects_blank_ids() {
        assert!(ClientId::new(String::new()).is_err());
        assert!(ClientId::new("   ".to_owned()).is_err());
        assert!(ClientId::new("2b67a1".to_owned()).is_ok());
    }

    #[test]
    fn generated_ids_are_non_empty_and_distinct() {
        let first = ClientId::generate();
        let second = ClientId::generate();

        assert!(!first.get().is_empty());
        assert_ne!(first, second);
    }
}
