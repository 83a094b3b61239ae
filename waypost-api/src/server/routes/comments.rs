use crate::server::{Result, ServerError, ServerRouter, identity::ClientIdentity, json::Json};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use std::sync::Arc;
use waypost_common::model::{
    Id,
    comment::{Comment, CreateComment},
    post::PostMarker,
};
use waypost_db::client::DbClient;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_comments)
        .typed_post(add_comment)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/comments", rejection(ServerError))]
struct PostCommentsPath {
    id: Id<PostMarker>,
}

async fn list_comments(
    PostCommentsPath { id }: PostCommentsPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Vec<Comment>>> {
    let comments = db.list_comments(id).await?;

    Ok(Json(comments))
}

async fn add_comment(
    PostCommentsPath { id }: PostCommentsPath,
    State(db): State<Arc<DbClient>>,
    identity: ClientIdentity,
    Json(comment): Json<CreateComment>,
) -> Result<(StatusCode, Json<Comment>)> {
    let comment = db.create_comment(id, &comment, identity.client_id()).await?;

    Ok((StatusCode::CREATED, Json(comment)))
}
