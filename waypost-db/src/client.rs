use crate::record::{CommentRecord, PostRecord};
use sqlx::{PgPool, Postgres, QueryBuilder, query, query_as, query_scalar};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use waypost_common::model::{
    Id, ModelValidationError, WaypostSnowflake, WaypostSnowflakeGenerator,
    client::ClientId,
    comment::{Comment, CreateComment},
    post::{CreatePost, FeedFilter, Post, PostMarker, SecretKey, UpdatePost},
};

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error("The referenced post no longer exists")]
    PostGone,
    #[error("Running database migrations failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => Self::PostGone,
            err => Self::Sqlx(err),
        }
    }
}

const POST_COLUMNS: &str = "post_snowflake, title, content, image_url, video_url, \
    category, upvotes, author_id, repost_of, created_at";

const COMMENT_COLUMNS: &str = "comment_snowflake, post_snowflake, body, author_id, created_at";

#[derive(Debug)]
pub struct DbClient {
    pool: PgPool,
    snowflake_generator: Mutex<WaypostSnowflakeGenerator>,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            snowflake_generator: Mutex::new(WaypostSnowflakeGenerator::new()),
        }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        sqlx::migrate!().run(&pool).await?;

        Ok(Self::new(pool))
    }

    fn next_snowflake(&self) -> WaypostSnowflake {
        self.snowflake_generator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generate()
    }

    pub async fn list_posts(&self, filter: &FeedFilter) -> Result<Vec<Post>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {POST_COLUMNS} FROM board.posts WHERE TRUE"
        ));

        if let Some(search) = &filter.search {
            builder.push(" AND title ILIKE ");
            builder.push_bind(like_pattern(search));
        }
        if let Some(category) = filter.category {
            builder.push(" AND category = ");
            builder.push_bind(category.as_str());
        }
        builder.push(" ORDER BY ");
        builder.push(filter.sort.order_column());
        builder.push(" DESC");

        let records: Vec<PostRecord> = builder.build_query_as().fetch_all(&self.pool).await?;

        records
            .into_iter()
            .map(|record| Post::try_from(record).map_err(DbError::from))
            .collect()
    }

    pub async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let record: Option<PostRecord> = query_as(&format!(
            "SELECT {POST_COLUMNS} FROM board.posts WHERE post_snowflake = $1"
        ))
        .bind(post_id.snowflake().get().cast_signed())
        .fetch_optional(&self.pool)
        .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    pub async fn create_post(&self, post: &CreatePost, author: &ClientId) -> Result<Post> {
        let post_snowflake = self.next_snowflake();

        let record: PostRecord = query_as(&format!(
            "INSERT INTO board.posts \
                (post_snowflake, title, content, image_url, video_url, \
                category, author_id, secret_key, repost_of) \
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
            RETURNING {POST_COLUMNS}"
        ))
        .bind(post_snowflake.get().cast_signed())
        .bind(post.title.get())
        .bind(post.content.as_deref())
        .bind(post.image_url.as_deref())
        .bind(post.video_url.as_deref())
        .bind(post.category.as_str())
        .bind(author.get())
        .bind(post.secret_key.get())
        .bind(
            post.repost_of
                .map(|target| target.snowflake().get().cast_signed()),
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(Post::try_from(record)?)
    }

    pub async fn update_post(
        &self,
        post_id: Id<PostMarker>,
        update: &UpdatePost,
    ) -> Result<Option<Post>> {
        let record: Option<PostRecord> = query_as(&format!(
            "UPDATE board.posts \
            SET title = $2, content = $3, image_url = $4 \
            WHERE post_snowflake = $1 \
            RETURNING {POST_COLUMNS}"
        ))
        .bind(post_id.snowflake().get().cast_signed())
        .bind(update.title.get())
        .bind(update.content.as_deref())
        .bind(update.image_url.as_deref())
        .fetch_optional(&self.pool)
        .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    /// Increments the upvote count in a single statement, so concurrent
    /// upvotes from different clients cannot lose updates.
    pub async fn increment_upvotes(&self, post_id: Id<PostMarker>) -> Result<Option<u64>> {
        let upvotes: Option<i64> = query_scalar(
            "UPDATE board.posts \
            SET upvotes = upvotes + 1 \
            WHERE post_snowflake = $1 \
            RETURNING upvotes",
        )
        .bind(post_id.snowflake().get().cast_signed())
        .fetch_optional(&self.pool)
        .await?;

        upvotes
            .map(|count| {
                u64::try_from(count)
                    .map_err(|_| DbError::Data(ModelValidationError::NegativeUpvoteCount(count)))
            })
            .transpose()
    }

    pub async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let result = query("DELETE FROM board.posts WHERE post_snowflake = $1")
            .bind(post_id.snowflake().get().cast_signed())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Matches the post id and the secret key in one lookup. A missing post
    /// answers `false`, indistinguishable from a wrong key.
    pub async fn verify_secret_key(
        &self,
        post_id: Id<PostMarker>,
        secret_key: &SecretKey,
    ) -> Result<bool> {
        let matches: bool = query_scalar(
            "SELECT EXISTS( \
                SELECT 1 FROM board.posts \
                WHERE post_snowflake = $1 AND secret_key = $2 \
            )",
        )
        .bind(post_id.snowflake().get().cast_signed())
        .bind(secret_key.get())
        .fetch_one(&self.pool)
        .await?;

        Ok(matches)
    }

    pub async fn list_comments(&self, post_id: Id<PostMarker>) -> Result<Vec<Comment>> {
        let records: Vec<CommentRecord> = query_as(&format!(
            "SELECT {COMMENT_COLUMNS} FROM board.comments \
            WHERE post_snowflake = $1 \
            ORDER BY created_at, comment_snowflake"
        ))
        .bind(post_id.snowflake().get().cast_signed())
        .fetch_all(&self.pool)
        .await?;

        records
            .into_iter()
            .map(|record| Comment::try_from(record).map_err(DbError::from))
            .collect()
    }

    pub async fn create_comment(
        &self,
        post_id: Id<PostMarker>,
        comment: &CreateComment,
        author: &ClientId,
    ) -> Result<Comment> {
        let comment_snowflake = self.next_snowflake();

        let record: CommentRecord = query_as(&format!(
            "INSERT INTO board.comments (comment_snowflake, post_snowflake, body, author_id) \
            VALUES ($1, $2, $3, $4) \
            RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(comment_snowflake.get().cast_signed())
        .bind(post_id.snowflake().get().cast_signed())
        .bind(comment.body.get())
        .bind(author.get())
        .fetch_one(&self.pool)
        .await?;

        Ok(Comment::try_from(record)?)
    }
}

/// Escapes LIKE wildcards in the user's search term and wraps it for a
/// case-insensitive substring match.
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for character in search.chars() {
        if matches!(character, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use crate::client::like_pattern;

    #[test]
    fn like_patterns_wrap_and_escape() {
        assert_eq!(like_pattern("paris"), "%paris%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("snake_case"), "%snake\\_case%");
        assert_eq!(like_pattern("back\\slash"), "%back\\\\slash%");
        assert_eq!(like_pattern(""), "%%");
    }
}
