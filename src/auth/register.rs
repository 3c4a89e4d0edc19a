//! The registration page for creating an account.
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
    AppState, Error, PasswordHash,
    auth::cookie::set_auth_cookie,
    db::lock_connection,
    endpoints,
    html::{base, link, log_in_register, password_input, submit_button, text_input},
    user::{Registration, create_registered_user},
};

/// Error messages to show under the registration form fields.
#[derive(Debug, Default)]
struct FormErrors<'a> {
    username: Option<&'a str>,
    email: Option<&'a str>,
    password: Option<&'a str>,
    confirm_password: Option<&'a str>,
}

fn registration_form(username: &str, email: &str, errors: FormErrors<'_>) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            class="space-y-4 md:space-y-6"
        {
            (text_input("Username", "username", "text", username, errors.username))
            (text_input("Email", "email", "email", email, errors.email))
            (password_input("Password", "password", "", errors.password))
            (password_input("Confirm Password", "confirm_password", "", errors.confirm_password))

            (submit_button("Create Account"))

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "
                (link(endpoints::LOG_IN_VIEW, "Log in here"))
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form("", "", FormErrors::default());
    let content = log_in_register("Create an account", &registration_form);
    base("Register", &[], &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Create a new user and log them in.
///
/// On success the client is redirected to the expenses page with a new
/// session. Otherwise the form is returned with an error message under the
/// field that needs fixing.
pub async fn post_register(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    let registration = Registration {
        username: &user_data.username,
        email: &user_data.email,
        password: &user_data.password,
        confirm_password: &user_data.confirm_password,
    };

    // The password is hashed before the connection is locked.
    let result = registration
        .hash_password(PasswordHash::DEFAULT_COST)
        .and_then(|registration| {
            let connection = lock_connection(&state.db_connection)?;
            create_registered_user(registration, &connection)
        });

    let user = match result {
        Ok(user) => user,
        Err(error) => {
            let message = error.to_string();
            let errors = match error {
                Error::MissingField("username") => FormErrors {
                    username: Some("Enter a username."),
                    ..Default::default()
                },
                Error::MissingField("email") => FormErrors {
                    email: Some("Enter an email address."),
                    ..Default::default()
                },
                Error::MissingField(_) => FormErrors {
                    password: Some("Enter a password."),
                    ..Default::default()
                },
                Error::DuplicateEmail => FormErrors {
                    email: Some("That email address is already registered."),
                    ..Default::default()
                },
                Error::PasswordMismatch => FormErrors {
                    confirm_password: Some("Passwords do not match."),
                    ..Default::default()
                },
                error => {
                    tracing::error!("Unhandled error while registering user: {error}");
                    FormErrors {
                        password: Some("An internal error occurred. Please try again later."),
                        ..Default::default()
                    }
                }
            };
            tracing::debug!("Registration rejected: {message}");

            return registration_form(&user_data.username, &user_data.email, errors)
                .into_response();
        }
    };

    match set_auth_cookie(jar, user.id, &user.username, state.cookie_duration) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::EXPENSES_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not set auth cookie for new user {}: {error}", user.id);
            log_in_redirect()
        }
    }
}

/// Send the client to the log-in page after an account was created without a session.
fn log_in_redirect() -> Response {
    (
        HxRedirect(endpoints::LOG_IN_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
