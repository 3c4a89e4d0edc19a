//! The profile page where users change their username and email.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error, SessionState,
    auth::reissue_auth_cookie,
    db::lock_connection,
    endpoints,
    html::{FORM_CONTAINER_STYLE, base, submit_button, text_input},
    navigation::NavBar,
    user::{User, get_user_by_id, update_profile},
};

/// The state needed for viewing and updating the profile.
#[derive(Debug, Clone)]
pub struct ProfileState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which the re-issued auth cookie is valid.
    pub cookie_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<ProfileState> for Key {
    fn from_ref(state: &ProfileState) -> Self {
        state.cookie_key.clone()
    }
}

fn profile_view(user: &User) -> Markup {
    let nav_bar = NavBar::new(endpoints::PROFILE_VIEW, Some(&user.username)).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            div class="w-full max-w-md space-y-4"
            {
                h1 class="text-xl font-bold" { "Profile" }

                form
                    hx-put=(endpoints::PROFILE_API)
                    hx-target-error="#alert-container"
                    hx-indicator="#indicator"
                    class="space-y-4 md:space-y-6"
                {
                    (text_input("Username", "username", "text", &user.username, None))
                    (text_input("Email", "email", "email", &user.email, None))

                    (submit_button("Save Changes"))
                }
            }
        }
    };

    base("Profile", &[], &content)
}

/// Display the profile form filled in with the logged in user's details.
pub async fn get_profile_page(
    State(state): State<ProfileState>,
    session: SessionState,
) -> Result<Response, Error> {
    let user_id = session.user_id()?;
    let connection = lock_connection(&state.db_connection)?;

    let user = get_user_by_id(user_id, &connection)
        .inspect_err(|error| tracing::error!("Could not get user {user_id}: {error}"))?;

    Ok(profile_view(&user).into_response())
}

#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub username: String,
    pub email: String,
}

/// Save the new username and email, then reload the profile page.
///
/// The auth cookie is re-issued so that the navigation bar shows the new username.
pub async fn update_profile_endpoint(
    State(state): State<ProfileState>,
    session: SessionState,
    jar: PrivateCookieJar,
    Form(form): Form<ProfileForm>,
) -> Response {
    let user_id = match session.user_id() {
        Ok(user_id) => user_id,
        Err(error) => return error.into_alert_response(),
    };

    let result = lock_connection(&state.db_connection)
        .and_then(|connection| update_profile(user_id, &form.username, &form.email, &connection));

    let user = match result {
        Ok(user) => user,
        Err(error) => {
            tracing::debug!("Could not update profile for user {user_id}: {error}");
            return error.into_alert_response();
        }
    };

    match reissue_auth_cookie(jar, user.id, &user.username, state.cookie_duration) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::PROFILE_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(error) => error.into_alert_response(),
    }
}
