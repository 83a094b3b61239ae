pub mod client;
pub mod comment;
pub mod post;
pub mod preferences;

use crate::{
    model::{
        client::InvalidClientIdError,
        comment::InvalidCommentBodyError,
        post::{InvalidPostCategoryError, InvalidPostTitleError, InvalidSecretKeyError},
    },
    snowflake::{Epoch, Snowflake, SnowflakeGenerator},
};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, marker::PhantomData};
use thiserror::Error;
use time::{UtcDateTime, macros::utc_datetime};

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ModelValidationError {
    #[error(transparent)]
    Title(#[from] InvalidPostTitleError),
    #[error(transparent)]
    Category(#[from] InvalidPostCategoryError),
    #[error(transparent)]
    SecretKey(#[from] InvalidSecretKeyError),
    #[error(transparent)]
    CommentBody(#[from] InvalidCommentBodyError),
    #[error(transparent)]
    ClientId(#[from] InvalidClientIdError),
    #[error("The upvote count is negative: {0}")]
    NegativeUpvoteCount(i64),
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct WaypostEpoch;
impl Epoch for WaypostEpoch {
    const EPOCH_TIME: UtcDateTime = utc_datetime!(2025-01-01 00:00);
}

pub type WaypostSnowflake = Snowflake<WaypostEpoch>;
pub type WaypostSnowflakeGenerator = SnowflakeGenerator<WaypostEpoch>;

#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Id<Marker>(WaypostSnowflake, #[serde(skip)] PhantomData<Marker>);

impl<Marker> Id<Marker> {
    #[must_use]
    pub fn new(snowflake: WaypostSnowflake) -> Self {
        Self(snowflake, PhantomData)
    }

    #[must_use]
    pub fn snowflake(self) -> WaypostSnowflake {
        self.0
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> From<WaypostSnowflake> for Id<Marker> {
    fn from(value: WaypostSnowflake) -> Self {
        Self::new(value)
    }
}

impl<Marker> From<Id<Marker>> for WaypostSnowflake {
    fn from(value: Id<Marker>) -> Self {
        value.0
    }
}

impl<Marker> From<u64> for Id<Marker> {
    fn from(value: u64) -> Self {
        Id::new(WaypostSnowflake::new(value))
    }
}

impl<Marker> From<Id<Marker>> for u64 {
    fn from(value: Id<Marker>) -> Self {
        value.snowflake().get()
    }
}
