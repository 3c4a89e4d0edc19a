//! Defines the route handler for the page for recording a new expense.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::Key;
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error, SessionState,
    category::get_category_suggestions,
    db::lock_connection,
    endpoints,
    html::{
        FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, dollar_input_styles,
        submit_button,
    },
    navigation::NavBar,
    timezone::local_today,
};

const CATEGORY_LIST_ID: &str = "category-suggestions";

fn new_expense_view(username: Option<&str>, today: Date, suggestions: &[String]) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_EXPENSE_VIEW, username).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-post=(endpoints::EXPENSES_API)
                hx-target-error="#alert-container"
                hx-indicator="#indicator"
                class="w-full max-w-md space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "New Expense" }

                div
                {
                    label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                    // w-full needed to ensure input takes the full width when prefilled with a value
                    div class="input-wrapper w-full"
                    {
                        input
                            name="amount"
                            id="amount"
                            type="number"
                            step="0.01"
                            placeholder="0.00"
                            required
                            autofocus
                            class=(FORM_TEXT_INPUT_STYLE);
                    }
                }

                div
                {
                    label for="category" class=(FORM_LABEL_STYLE) { "Category" }

                    input
                        name="category"
                        id="category"
                        type="text"
                        list=(CATEGORY_LIST_ID)
                        placeholder="e.g. Groceries"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);

                    datalist id=(CATEGORY_LIST_ID)
                    {
                        @for name in suggestions {
                            option value=(name) {}
                        }
                    }
                }

                div
                {
                    label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                    input
                        name="description"
                        id="description"
                        type="text"
                        placeholder="Description"
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                    input
                        name="date"
                        id="date"
                        type="date"
                        value=(today)
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                (submit_button("Add Expense"))
            }
        }
    };

    base("New Expense", &[dollar_input_styles()], &content)
}

/// The state needed for the new expense page.
#[derive(Debug, Clone)]
pub struct NewExpensePageState {
    /// The key used to read the session cookie.
    pub cookie_key: Key,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for reading category suggestions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for NewExpensePageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<NewExpensePageState> for Key {
    fn from_ref(state: &NewExpensePageState) -> Self {
        state.cookie_key.clone()
    }
}

/// Renders the form for recording an expense.
///
/// The date defaults to today in the server's timezone and the category
/// input suggests every category seen so far.
pub async fn get_new_expense_page(
    State(state): State<NewExpensePageState>,
    session: SessionState,
) -> Result<Response, Error> {
    session.user_id()?;

    let suggestions = {
        let connection = lock_connection(&state.db_connection)?;

        get_category_suggestions(&connection).inspect_err(|error| {
            tracing::error!("Failed to retrieve categories for new expense page: {error}")
        })?
    };

    let today = local_today(&state.local_timezone)?;

    Ok(new_expense_view(session.username(), today, &suggestions).into_response())
}
