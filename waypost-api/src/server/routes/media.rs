use crate::server::{Result, ServerError, ServerRouter, json::Json, media::MediaStore};
use axum::{
    extract::{FromRequest, Multipart, State},
    http::StatusCode,
};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_post(upload_image)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/uploads/post-images", rejection(ServerError))]
struct UploadImagePath();

#[derive(FromRequest)]
#[from_request(rejection(ServerError))]
struct Upload(Multipart);

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct UploadResponse {
    url: String,
}

async fn upload_image(
    UploadImagePath(): UploadImagePath,
    State(media_store): State<Arc<MediaStore>>,
    Upload(mut multipart): Upload,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(ToOwned::to_owned);
        let bytes = field.bytes().await?;
        let url = media_store
            .store(file_name.as_deref(), &bytes)
            .await
            .map_err(ServerError::MediaIo)?;

        return Ok((StatusCode::CREATED, Json(UploadResponse { url })));
    }

    Err(ServerError::MissingUploadFile)
}
