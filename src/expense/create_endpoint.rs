//! Defines the endpoint for recording a new expense.
use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::{Form, cookie::Key};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, SessionState,
    db::lock_connection,
    endpoints,
    expense::{ExpenseInput, add_expense},
    timezone::local_today,
};

/// The state needed to record an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseState {
    /// The key used to read the session cookie.
    pub cookie_key: Key,
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

impl FromRef<CreateExpenseState> for Key {
    fn from_ref(state: &CreateExpenseState) -> Self {
        state.cookie_key.clone()
    }
}

/// The form data for recording an expense.
///
/// The amount and date are kept as text so that bad input is reported with
/// the same alert as every other validation error.
#[derive(Debug, Deserialize)]
pub struct ExpenseForm {
    pub amount: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// A route handler for recording an expense, redirects to the expenses view on success.
pub async fn create_expense_endpoint(
    State(state): State<CreateExpenseState>,
    session: SessionState,
    Form(form): Form<ExpenseForm>,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let input = ExpenseInput {
        amount: &form.amount,
        category: &form.category,
        description: form.description.as_deref(),
        date: form.date.as_deref(),
    };

    let result = lock_connection(&state.db_connection)
        .and_then(|connection| add_expense(&session, input, today, &connection));

    if let Err(error) = result {
        tracing::debug!("could not add expense: {error}");

        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::EXPENSES_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
