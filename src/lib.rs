//! Spendlog is a web app for recording personal expenses and reviewing
//! where the money went each month.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod category;
mod database_id;
mod db;
mod endpoints;
mod expense;
mod html;
mod internal_server_error;
mod logging;
mod money;
mod navigation;
mod not_found;
mod password;
mod routing;
mod summary;
#[cfg(test)]
mod test_utils;
mod timezone;
mod user;

pub use app_state::AppState;
pub use auth::SessionState;
pub use category::{CategoryName, get_category_suggestions};
pub use database_id::{DatabaseId, ExpenseId};
pub use db::initialize as initialize_db;
pub use expense::{Expense, ExpenseInput, add_expense, list_expenses, total};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use money::{format_currency, parse_amount};
pub use password::PasswordHash;
pub use routing::build_router;
pub use summary::{
    MonthlyCategoryTotal, YearMonth, available_months, monthly_by_category, monthly_total,
};
pub use timezone::get_local_offset;
pub use user::{
    HashedRegistration, Registration, User, UserID, authenticate, check_password,
    create_registered_user, find_user_for_log_in, get_user_by_id, register, update_profile,
};

use crate::{
    alert::Alert, endpoints::LOG_IN_VIEW, html::error_view,
    internal_server_error::InternalServerError, not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The backing store could not complete the operation.
    ///
    /// The error string should only be logged for debugging on the server.
    /// Clients are shown a generic failure message so that schema and query
    /// details are not leaked.
    #[error("the store could not complete the operation: {0}")]
    StoreUnavailable(String),

    /// The email address belongs to another user.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// The password and its confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// The email is unknown or the password is wrong.
    ///
    /// Both cases share this variant so that clients cannot find out which
    /// email addresses are registered.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The amount could not be parsed as a number.
    #[error("\"{0}\" is not a valid amount")]
    InvalidAmount(String),

    /// A required field was empty or contained only whitespace.
    #[error("{0} is a required field")]
    MissingField(&'static str),

    /// The operation requires a logged in user.
    #[error("you must be logged in to do that")]
    Unauthenticated,

    /// A date string was not in the format `YYYY-MM-DD`.
    #[error("\"{0}\" is not a valid date, expected YYYY-MM-DD")]
    InvalidDate(String),

    /// A month string was not in the format `YYYY-MM`.
    #[error("\"{0}\" is not a valid month, expected YYYY-MM")]
    InvalidMonth(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The session token could not be written to the cookie jar.
    #[error("could not create the session: {0}")]
    SessionError(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::StoreUnavailable(error.to_string())
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::Unauthenticated => Redirect::to(LOG_IN_VIEW).into_response(),
            Error::InvalidMonth(month) => (
                StatusCode::BAD_REQUEST,
                error_view(
                    "Bad Request",
                    "400",
                    "Invalid month",
                    &format!("\"{month}\" is not a month. Pick a month in the format YYYY-MM."),
                ),
            )
                .into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Render the error as an alert fragment for HTMX requests.
    ///
    /// Validation errors are shown to the user as is. Store and hashing
    /// errors are logged and replaced with a generic message.
    fn into_alert_response(self) -> Response {
        let (status_code, message, details) = match self {
            Error::DuplicateEmail => (
                StatusCode::CONFLICT,
                "Email already in use",
                "That email address belongs to another account. Use a different email address."
                    .to_owned(),
            ),
            Error::PasswordMismatch => (
                StatusCode::BAD_REQUEST,
                "Passwords do not match",
                "Enter the same password in both fields.".to_owned(),
            ),
            Error::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid email or password",
                "Check your email and password and try again.".to_owned(),
            ),
            Error::InvalidAmount(amount) => (
                StatusCode::BAD_REQUEST,
                "Invalid amount entered",
                format!("\"{amount}\" is not a number. Enter an amount such as 12.50."),
            ),
            Error::MissingField(field) => (
                StatusCode::BAD_REQUEST,
                "Missing required field",
                format!("The {field} field is required."),
            ),
            Error::InvalidDate(date) => (
                StatusCode::BAD_REQUEST,
                "Invalid date",
                format!("\"{date}\" is not a date. Enter a date in the format YYYY-MM-DD."),
            ),
            Error::InvalidMonth(month) => (
                StatusCode::BAD_REQUEST,
                "Invalid month",
                format!("\"{month}\" is not a month. Pick a month in the format YYYY-MM."),
            ),
            Error::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "Not logged in",
                "Your session has ended. Log in again to continue.".to_owned(),
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                "Not found",
                "The requested item could not be found.".to_owned(),
            ),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong",
                    "An unexpected error occurred. Please try again.".to_owned(),
                )
            }
        };

        Alert {
            message: message.to_owned(),
            details,
        }
        .into_response_with_status(status_code)
    }
}
