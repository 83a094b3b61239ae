use crate::server::{
    Result, ServerError, ServerRouter,
    json::Json,
    preferences::{ClientPreferences, SHOW_DETAILS_COOKIE, THEME_COOKIE},
};
use axum_extra::{
    extract::cookie::{Cookie, CookieJar},
    routing::{RouterExt, TypedPath},
};
use serde::Deserialize;
use time::Duration;
use waypost_common::model::preferences::{Preferences, Theme};

const PREFERENCE_COOKIE_MAX_AGE: Duration = Duration::days(400);

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_preferences)
        .typed_put(put_preferences)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/preferences", rejection(ServerError))]
struct PreferencesPath();

async fn get_preferences(
    PreferencesPath(): PreferencesPath,
    ClientPreferences(preferences): ClientPreferences,
) -> Json<Preferences> {
    Json(preferences)
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
struct UpdatePreferences {
    #[serde(default)]
    theme: Option<Theme>,
    #[serde(default)]
    show_details: Option<bool>,
}

/// Applies a partial preference update and persists the result back to the
/// browser via cookies.
async fn put_preferences(
    PreferencesPath(): PreferencesPath,
    ClientPreferences(current): ClientPreferences,
    jar: CookieJar,
    Json(update): Json<UpdatePreferences>,
) -> Result<(CookieJar, Json<Preferences>)> {
    let preferences = Preferences {
        theme: update.theme.unwrap_or(current.theme),
        show_details: update.show_details.unwrap_or(current.show_details),
    };

    let jar = jar
        .add(preference_cookie(
            THEME_COOKIE,
            preferences.theme.to_string(),
        ))
        .add(preference_cookie(
            SHOW_DETAILS_COOKIE,
            preferences.show_details.to_string(),
        ));

    Ok((jar, Json(preferences)))
}

fn preference_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .max_age(PREFERENCE_COOKIE_MAX_AGE)
        .build()
}
