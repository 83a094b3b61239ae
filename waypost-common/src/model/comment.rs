use crate::model::{Id, client::ClientId, post::PostMarker};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use thiserror::Error;
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CommentMarker;

/// A reply attached to exactly one post. Comments are append-only; no edit
/// or delete path exists.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Comment {
    pub id: Id<CommentMarker>,
    pub post: Id<PostMarker>,
    pub body: CommentBody,
    pub author: ClientId,
    pub created_at: UtcDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct CreateComment {
    pub body: CommentBody,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct CommentBody(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The comment body must not be empty")]
pub struct InvalidCommentBodyError;

impl CommentBody {
    pub fn new(body: String) -> Result<Self, InvalidCommentBodyError> {
        if body.trim().is_empty() {
            Err(InvalidCommentBodyError)
        } else {
            Ok(CommentBody(body))
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

impl<'de> Deserialize<'de> for CommentBody {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        CommentBody::new(inner)
            .map_err(|_| Error::invalid_value(Unexpected::Str(""), &"CommentBody"))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::comment::CommentBody;

    #[test]
    fn comment_body_rejects_blank_input() {
        assert!(CommentBody::new(String::new()).is_err());
        assert!(CommentBody::new(" \n ".to_owned()).is_err());
        assert_eq!(
            CommentBody::new("Great write-up!".to_owned()).unwrap().get(),
            "Great write-up!"
        );
    }

    #[test]
    fn comment_body_deserialization_validates() {
        assert!(serde_json::from_str::<CommentBody>("\"\"").is_err());
        assert!(serde_json::from_str::<CommentBody>("\"Looks nice\"").is_ok());
    }
}
