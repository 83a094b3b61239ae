use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use std::convert::Infallible;
use waypost_common::model::preferences::Preferences;

pub const THEME_COOKIE: &str = "waypost_theme";
pub const SHOW_DETAILS_COOKIE: &str = "waypost_show_details";

/// The effective display preferences of the requesting browser. Extraction
/// never fails: missing or unreadable cookies fall back to the defaults for
/// this request.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct ClientPreferences(pub Preferences);

impl<S> FromRequestParts<S> for ClientPreferences
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        let preferences = Preferences::from_values(
            jar.get(THEME_COOKIE).map(|cookie| cookie.value()),
            jar.get(SHOW_DETAILS_COOKIE).map(|cookie| cookie.value()),
        );

        Ok(Self(preferences))
    }
}
