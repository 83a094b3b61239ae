use crate::server::{
    Result, ServerError, ServerRouter, identity::ClientIdentity, json::Json, query::Query,
};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::{Deserialize, Serialize};
use std::{str::FromStr, sync::Arc};
use tracing::{debug, error, warn};
use waypost_common::{
    model::{
        Id,
        client::ClientId,
        comment::Comment,
        post::{
            CreatePost, FeedFilter, FeedSort, Post, PostCategory, PostMarker, PostTitle,
            SecretKey, UpdatePost,
        },
    },
    video,
};
use waypost_db::client::DbClient;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(feed)
        .typed_get(get_post)
        .typed_post(create_post)
        .typed_patch(update_post)
        .typed_delete(delete_post)
        .typed_post(upvote_post)
        .typed_post(verify_secret_key)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts", rejection(ServerError))]
struct FeedPath();

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
struct FeedQuery {
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    sort: FeedSort,
}

/// The feed. Read failures degrade to an empty feed instead of blocking the
/// caller; the error is logged here.
async fn feed(
    FeedPath(): FeedPath,
    State(db): State<Arc<DbClient>>,
    Query(query): Query<FeedQuery>,
) -> Json<Vec<Post>> {
    let search = query.search.filter(|term| !term.is_empty());

    let category = match query.category.as_deref().filter(|value| !value.is_empty()) {
        None => None,
        Some(value) => match PostCategory::from_str(value) {
            Ok(category) => Some(category),
            Err(err) => {
                debug!(error = %err, "Unknown category filter, nothing can match it");
                return Json(Vec::new());
            }
        },
    };

    let filter = FeedFilter {
        search,
        category,
        sort: query.sort,
    };

    let posts = match db.list_posts(&filter).await {
        Ok(posts) => posts,
        Err(err) => {
            error!(error = %err, "Feed query failed, degrading to an empty feed");
            Vec::new()
        }
    };

    Json(posts)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}", rejection(ServerError))]
struct PostPath {
    id: Id<PostMarker>,
}

/// Everything the post detail view needs in one response.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct PostView {
    pub post: Post,
    pub video_embed_url: Option<String>,
    pub reposted_post: Option<Post>,
    pub comments: Vec<Comment>,
    pub viewer_is_author: bool,
}

async fn get_post(
    PostPath { id }: PostPath,
    State(db): State<Arc<DbClient>>,
    identity: ClientIdentity,
) -> Result<Json<PostView>> {
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    let (reposted_post, comments) = tokio::join!(
        fetch_repost_target(&db, post.repost_of),
        list_comments_degraded(&db, id),
    );

    let video_embed_url = post.video_url.as_deref().map(rewrite_video_url);
    let viewer_is_author = post.author == *identity.client_id();

    Ok(Json(PostView {
        post,
        video_embed_url,
        reposted_post,
        comments,
        viewer_is_author,
    }))
}

fn rewrite_video_url(url: &str) -> String {
    match video::embed_url(url) {
        Ok(Some(embed)) => embed,
        Ok(None) => url.to_owned(),
        Err(err) => {
            warn!(error = %err, "Falling back to the raw video url");
            url.to_owned()
        }
    }
}

/// A missing or unfetchable repost target never fails the page.
async fn fetch_repost_target(db: &DbClient, target: Option<Id<PostMarker>>) -> Option<Post> {
    let target = target?;

    match db.fetch_post(target).await {
        Ok(Some(post)) => Some(post),
        Ok(None) => {
            warn!(%target, "Repost target does not exist, rendering without it");
            None
        }
        Err(err) => {
            error!(%target, error = %err, "Fetching the repost target failed, rendering without it");
            None
        }
    }
}

async fn list_comments_degraded(db: &DbClient, post_id: Id<PostMarker>) -> Vec<Comment> {
    match db.list_comments(post_id).await {
        Ok(comments) => comments,
        Err(err) => {
            error!(%post_id, error = %err, "Fetching comments failed, rendering an empty thread");
            Vec::new()
        }
    }
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/create", rejection(ServerError))]
struct CreatePostPath();

async fn create_post(
    CreatePostPath(): CreatePostPath,
    State(db): State<Arc<DbClient>>,
    identity: ClientIdentity,
    Json(post): Json<CreatePost>,
) -> Result<(StatusCode, Json<Post>)> {
    let post = db.create_post(&post, identity.client_id()).await?;

    Ok((StatusCode::CREATED, Json(post)))
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct UpdatePostRequest {
    #[serde(default)]
    secret_key: Option<SecretKey>,
    title: PostTitle,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

async fn update_post(
    PostPath { id }: PostPath,
    State(db): State<Arc<DbClient>>,
    identity: ClientIdentity,
    Json(request): Json<UpdatePostRequest>,
) -> Result<Json<Post>> {
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    authorize_post_action(&db, &post, identity.client_id(), request.secret_key.as_ref()).await?;

    let update = UpdatePost {
        title: request.title,
        content: request.content,
        image_url: request.image_url,
    };
    let post = db
        .update_post(id, &update)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(Json(post))
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
struct DeletePostRequest {
    #[serde(default)]
    secret_key: Option<SecretKey>,
}

async fn delete_post(
    PostPath { id }: PostPath,
    State(db): State<Arc<DbClient>>,
    identity: ClientIdentity,
    Json(request): Json<DeletePostRequest>,
) -> Result<StatusCode> {
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    authorize_post_action(&db, &post, identity.client_id(), request.secret_key.as_ref()).await?;

    if db.delete_post(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ServerError::PostByIdNotFound(id))
    }
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/upvote", rejection(ServerError))]
struct UpvotePostPath {
    id: Id<PostMarker>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash, Serialize)]
struct UpvoteResponse {
    upvotes: u64,
}

async fn upvote_post(
    UpvotePostPath { id }: UpvotePostPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<UpvoteResponse>> {
    let upvotes = db
        .increment_upvotes(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(Json(UpvoteResponse { upvotes }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/verify-key", rejection(ServerError))]
struct VerifySecretKeyPath {
    id: Id<PostMarker>,
}

#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
struct VerifySecretKeyRequest {
    secret_key: SecretKey,
}

/// Answers whether the key matches the post. A missing post answers exactly
/// like a wrong key, and nothing durable is granted either way.
async fn verify_secret_key(
    VerifySecretKeyPath { id }: VerifySecretKeyPath,
    State(db): State<Arc<DbClient>>,
    Json(request): Json<VerifySecretKeyRequest>,
) -> Result<StatusCode> {
    if db.verify_secret_key(id, &request.secret_key).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ServerError::InvalidSecretKey)
    }
}

/// The post's author edits and deletes without a key; everyone else must
/// present the post's secret key.
async fn authorize_post_action(
    db: &DbClient,
    post: &Post,
    identity: &ClientId,
    secret_key: Option<&SecretKey>,
) -> Result<()> {
    if post.author == *identity {
        return Ok(());
    }

    let Some(secret_key) = secret_key else {
        return Err(ServerError::InvalidSecretKey);
    };

    if db.verify_secret_key(post.id, secret_key).await? {
        Ok(())
    } else {
        Err(ServerError::InvalidSecretKey)
    }
}
