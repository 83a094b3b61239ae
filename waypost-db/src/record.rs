use sqlx::FromRow;
use time::OffsetDateTime;
use waypost_common::model::{
    ModelValidationError,
    client::ClientId,
    comment::{Comment, CommentBody},
    post::{Post, PostTitle},
};

#[derive(Clone, Debug, FromRow)]
pub(crate) struct PostRecord {
    pub post_snowflake: i64,
    pub title: String,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub category: String,
    pub upvotes: i64,
    pub author_id: String,
    pub repost_of: Option<i64>,
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, FromRow)]
pub(crate) struct CommentRecord {
    pub comment_snowflake: i64,
    pub post_snowflake: i64,
    pub body: String,
    pub author_id: String,
    pub created_at: OffsetDateTime,
}

impl TryFrom<PostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        let upvotes = u64::try_from(value.upvotes)
            .map_err(|_| ModelValidationError::NegativeUpvoteCount(value.upvotes))?;

        Ok(Self {
            id: value.post_snowflake.cast_unsigned().into(),
            title: PostTitle::new(value.title)?,
            content: value.content,
            image_url: value.image_url,
            video_url: value.video_url,
            category: value.category.parse()?,
            upvotes,
            author: ClientId::new(value.author_id)?,
            repost_of: value
                .repost_of
                .map(|snowflake| snowflake.cast_unsigned().into()),
            created_at: value.created_at.to_utc(),
        })
    }
}

impl TryFrom<CommentRecord> for Comment {
    type Error = ModelValidationError;

    fn try_from(value: CommentRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.comment_snowflake.cast_unsigned().into(),
            post: value.post_snowflake.cast_unsigned().into(),
            body: CommentBody::new(value.body)?,
            author: ClientId::new(value.author_id)?,
            created_at: value.created_at.to_utc(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::record::{CommentRecord, PostRecord};
    use time::OffsetDateTime;
    use waypost_common::model::{
        ModelValidationError,
        comment::Comment,
        post::{Post, PostCategory},
    };

    fn post_record() -> PostRecord {
        PostRecord {
            post_snowflake: 42,
            title: "Paris in Spring".to_owned(),
            content: Some("Cherry blossoms everywhere.".to_owned()),
            image_url: None,
            video_url: Some("https://youtu.be/abc123".to_owned()),
            category: "Opinion".to_owned(),
            upvotes: 2,
            author_id: "2b67a1".to_owned(),
            repost_of: Some(7),
            created_at: OffsetDateTime::from_unix_timestamp(1_750_000_000).unwrap(),
        }
    }

    #[test]
    fn post_record_converts_to_model() {
        let post = Post::try_from(post_record()).unwrap();

        assert_eq!(u64::from(post.id), 42);
        assert_eq!(post.title.get(), "Paris in Spring");
        assert_eq!(post.category, PostCategory::Opinion);
        assert_eq!(post.upvotes, 2);
        assert_eq!(post.author.get(), "2b67a1");
        assert_eq!(post.repost_of.map(u64::from), Some(7));
    }

    #[test]
    fn post_record_with_bad_fields_is_rejected() {
        let mut record = post_record();
        record.category = "Rant".to_owned();
        assert!(matches!(
            Post::try_from(record),
            Err(ModelValidationError::Category(_))
        ));

        let mut record = post_record();
        record.title = String::new();
        assert!(matches!(
            Post::try_from(record),
            Err(ModelValidationError::Title(_))
        ));

        let mut record = post_record();
        record.upvotes = -1;
        assert!(matches!(
            Post::try_from(record),
            Err(ModelValidationError::NegativeUpvoteCount(-1))
        ));
    }

    #[test]
    fn comment_record_converts_to_model() {
        let record = CommentRecord {
            comment_snowflake: 9,
            post_snowflake: 42,
            body: "Great write-up!".to_owned(),
            author_id: "2b67a1".to_owned(),
            created_at: OffsetDateTime::from_unix_timestamp(1_750_000_000).unwrap(),
        };

        let comment = Comment::try_from(record).unwrap();
        assert_eq!(u64::from(comment.id), 9);
        assert_eq!(u64::from(comment.post), 42);
        assert_eq!(comment.body.get(), "Great write-up!");
    }
}
