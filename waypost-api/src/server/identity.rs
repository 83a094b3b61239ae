use crate::server::ServerError;
use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use time::Duration;
use waypost_common::model::client::ClientId;

pub const CLIENT_ID_COOKIE: &str = "waypost_client_id";

const CLIENT_ID_COOKIE_MAX_AGE: Duration = Duration::days(400);

/// Reads the client identity cookie, minting a fresh identity when the
/// request does not carry a usable one. The minted value is set on the
/// response so the same browser keeps the same identity across requests.
pub async fn provision_client_identity(mut request: Request, next: Next) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    let existing = jar
        .get(CLIENT_ID_COOKIE)
        .and_then(|cookie| ClientId::new(cookie.value().to_owned()).ok());

    let (identity, minted) = match existing {
        Some(identity) => (identity, false),
        None => (ClientId::generate(), true),
    };

    request.extensions_mut().insert(identity.clone());
    let response = next.run(request).await;

    if minted {
        let cookie = Cookie::build((CLIENT_ID_COOKIE, identity.into_inner()))
            .path("/")
            .http_only(true)
            .max_age(CLIENT_ID_COOKIE_MAX_AGE)
            .build();
        (CookieJar::new().add(cookie), response).into_response()
    } else {
        response
    }
}

/// The requesting browser's identity. Used only to label authorship; it is
/// never an authorization boundary.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct ClientIdentity(ClientId);

impl ClientIdentity {
    #[must_use]
    pub fn client_id(&self) -> &ClientId {
        &self.0
    }

    #[must_use]
    pub fn into_client_id(self) -> ClientId {
        self.0
    }
}

impl<S> FromRequestParts<S> for ClientIdentity
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ClientId>()
            .cloned()
            .map(Self)
            .ok_or(ServerError::MissingClientIdentity)
    }
}
