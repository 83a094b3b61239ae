use crate::server::ServerRouter;
use axum::Router;

mod comments;
mod media;
mod posts;
mod preferences;

pub fn routes() -> ServerRouter {
    Router::new()
        .merge(posts::routes())
        .merge(comments::routes())
        .merge(media::routes())
        .merge(preferences::routes())
}
