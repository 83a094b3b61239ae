use crate::server::media::MediaStore;
use axum::{
    Router,
    extract::{
        FromRef, Request,
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use json::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::error;
use waypost_common::model::{Id, post::PostMarker};
use waypost_db::client::{DbClient, DbError};

pub mod identity;
pub mod json;
pub mod media;
mod preferences;
mod query;
mod routes;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, Debug, FromRef)]
pub struct ServerState {
    pub db_client: Arc<DbClient>,
    pub media_store: Arc<MediaStore>,
}

pub fn routes() -> ServerRouter {
    routes::routes().fallback(fallback)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Query rejected: {0}")]
    QueryRejection(#[from] QueryRejection),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error("Multipart upload rejected: {0}")]
    MultipartRejection(#[from] MultipartRejection),
    #[error("Error reading multipart upload: {0}")]
    Multipart(#[from] MultipartError),
    #[error("The upload did not contain a file field")]
    MissingUploadFile,
    #[error("No client identity was provisioned for this request")]
    MissingClientIdentity,
    #[error("The secret key does not match this post")]
    InvalidSecretKey,
    #[error("Post with id {0} was not found.")]
    PostByIdNotFound(Id<PostMarker>),
    #[error("The referenced post no longer exists")]
    PostGone,
    #[error(transparent)]
    Database(DbError),
    #[error("Error storing uploaded media: {0}")]
    MediaIo(std::io::Error),
}

impl From<DbError> for ServerError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::PostGone => Self::PostGone,
            err => Self::Database(err),
        }
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_)
            | ServerError::PathRejection(_)
            | ServerError::PostByIdNotFound(_)
            | ServerError::PostGone => StatusCode::NOT_FOUND,
            ServerError::QueryRejection(_)
            | ServerError::JsonRejection(_)
            | ServerError::MultipartRejection(_)
            | ServerError::Multipart(_)
            | ServerError::MissingUploadFile => StatusCode::BAD_REQUEST,
            ServerError::InvalidSecretKey => StatusCode::FORBIDDEN,
            ServerError::JsonResponse(_)
            | ServerError::MissingClientIdentity
            | ServerError::Database(_)
            | ServerError::MediaIo(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        if self.status().is_server_error() {
            "Internal server error".to_owned()
        } else {
            self.to_string()
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
struct ErrorResponse {
    status: u16,
    message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        error!(error = %self, %status, "Replying with error");

        let error_response = ErrorResponse {
            status: status.as_u16(),
            message: self.public_message(),
        };
        (status, Json(error_response)).into_response()
    }
}
