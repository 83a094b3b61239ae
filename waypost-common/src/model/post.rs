use crate::model::{Id, client::ClientId};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::{
    fmt::{Debug, Display, Formatter},
    str::FromStr,
};
use thiserror::Error;
use time::UtcDateTime;

pub const POST_TITLE_MAX_LEN: usize = 200;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

/// A board post as returned to clients. The secret key is stored alongside
/// the post but never leaves the database layer.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub title: PostTitle,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub category: PostCategory,
    pub upvotes: u64,
    pub author: ClientId,
    pub repost_of: Option<Id<PostMarker>>,
    pub created_at: UtcDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct CreatePost {
    pub title: PostTitle,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub category: PostCategory,
    #[serde(default)]
    pub repost_of: Option<Id<PostMarker>>,
    pub secret_key: SecretKey,
}

/// The editable subset of a post. Category, video url, repost target and
/// secret key are immutable after creation.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct UpdatePost {
    pub title: PostTitle,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Deserialize, Serialize)]
pub enum PostCategory {
    #[default]
    Question,
    Opinion,
    Discussion,
    News,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Unknown post category: {0}")]
pub struct InvalidPostCategoryError(String);

impl PostCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PostCategory::Question => "Question",
            PostCategory::Opinion => "Opinion",
            PostCategory::Discussion => "Discussion",
            PostCategory::News => "News",
        }
    }
}

impl Display for PostCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostCategory {
    type Err = InvalidPostCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Question" => Ok(PostCategory::Question),
            "Opinion" => Ok(PostCategory::Opinion),
            "Discussion" => Ok(PostCategory::Discussion),
            "News" => Ok(PostCategory::News),
            unknown => Err(InvalidPostCategoryError(unknown.to_owned())),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct PostTitle(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The post title is invalid: {0:?}")]
pub struct InvalidPostTitleError(String);

impl PostTitle {
    pub fn new(title: String) -> Result<Self, InvalidPostTitleError> {
        if title.trim().is_empty() || title.chars().count() > POST_TITLE_MAX_LEN {
            Err(InvalidPostTitleError(title))
        } else {
            Ok(PostTitle(title))
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

impl<'de> Deserialize<'de> for PostTitle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        PostTitle::new(inner)
            .map_err(|err| Error::invalid_value(Unexpected::Str(&err.0), &"PostTitle"))
    }
}

/// The plaintext credential chosen at post creation. It gates edit and
/// delete, and is compared verbatim; it is not a password and is never
/// hashed. Debug output is redacted so the value stays out of logs.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct SecretKey(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The secret key must not be empty")]
pub struct InvalidSecretKeyError;

impl SecretKey {
    pub fn new(key: String) -> Result<Self, InvalidSecretKeyError> {
        if key.trim().is_empty() {
            Err(InvalidSecretKeyError)
        } else {
            Ok(SecretKey(key))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl Debug for SecretKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SecretKey").field(&"[redacted]").finish()
    }
}

impl<'de> Deserialize<'de> for SecretKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        SecretKey::new(inner).map_err(Error::custom)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Deserialize, Serialize)]
pub enum FeedSort {
    #[default]
    #[serde(rename = "created_at")]
    Newest,
    #[serde(rename = "upvotes")]
    MostUpvoted,
}

impl FeedSort {
    #[must_use]
    pub fn order_column(self) -> &'static str {
        match self {
            FeedSort::Newest => "created_at",
            FeedSort::MostUpvoted => "upvotes",
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct FeedFilter {
    pub search: Option<String>,
    pub category: Option<PostCategory>,
    pub sort: FeedSort,
}

#[cfg(test)]
mod tests {
    use crate::model::post::{FeedSort, PostCategory, PostTitle, SecretKey};
    use std::str::FromStr;

    #[test]
    fn post_title_rejects_blank_input() {
        assert!(PostTitle::new(String::new()).is_err());
        assert!(PostTitle::new("   \t".to_owned()).is_err());
        assert!(PostTitle::new("x".repeat(201)).is_err());

        let title = PostTitle::new("Paris in Spring".to_owned()).unwrap();
        assert_eq!(title.get(), "Paris in Spring");
    }

    #[test]
    fn post_title_deserialization_validates() {
        assert!(serde_json::from_str::<PostTitle>("\"\"").is_err());
        assert!(serde_json::from_str::<PostTitle>("\"  \"").is_err());
        assert_eq!(
            serde_json::from_str::<PostTitle>("\"Paris in Spring\"")
                .unwrap()
                .get(),
            "Paris in Spring"
        );
    }

    #[test]
    fn secret_key_rejects_blank_and_redacts_debug() {
        assert!(SecretKey::new(String::new()).is_err());
        assert!(SecretKey::new("  ".to_owned()).is_err());

        let key = SecretKey::new("abc123".to_owned()).unwrap();
        assert_eq!(key.get(), "abc123");
        assert!(!format!("{key:?}").contains("abc123"));
    }

    #[test]
    fn category_round_trips_wire_names() {
        for (name, category) in [
            ("Question", PostCategory::Question),
            ("Opinion", PostCategory::Opinion),
            ("Discussion", PostCategory::Discussion),
            ("News", PostCategory::News),
        ] {
            assert_eq!(PostCategory::from_str(name).unwrap(), category);
            assert_eq!(category.to_string(), name);
            assert_eq!(
                serde_json::from_str::<PostCategory>(&format!("\"{name}\"")).unwrap(),
                category
            );
        }

        assert!(PostCategory::from_str("Rant").is_err());
        assert_eq!(PostCategory::default(), PostCategory::Question);
    }

    #[test]
    fn feed_sort_wire_names_and_columns() {
        assert_eq!(
            serde_json::from_str::<FeedSort>("\"created_at\"").unwrap(),
            FeedSort::Newest
        );
        assert_eq!(
            serde_json::from_str::<FeedSort>("\"upvotes\"").unwrap(),
            FeedSort::MostUpvoted
        );
        assert!(serde_json::from_str::<FeedSort>("\"comments\"").is_err());

        assert_eq!(FeedSort::default().order_column(), "created_at");
        assert_eq!(FeedSort::MostUpvoted.order_column(), "upvotes");
    }
}
