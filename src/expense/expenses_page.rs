//! Defines the route handler for the page that lists a user's expenses.
use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::Key;
use maud::{Markup, html};
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::{
    AppState, Error, SessionState,
    db::lock_connection,
    endpoints,
    expense::{Expense, list_expenses, total},
    html::{
        CATEGORY_BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
    },
    money::format_currency,
    navigation::NavBar,
};

/// The state needed for the expenses page.
#[derive(Debug, Clone)]
pub struct ExpensesPageState {
    /// The key used to read the session cookie.
    pub cookie_key: Key,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExpensesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<ExpensesPageState> for Key {
    fn from_ref(state: &ExpensesPageState) -> Self {
        state.cookie_key.clone()
    }
}

/// Render the logged in user's expenses, newest first, with the total spent.
pub async fn get_expenses_page(
    State(state): State<ExpensesPageState>,
    session: SessionState,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let expenses = list_expenses(&session, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve expenses: {error}"))?;
    let total_spent = total(&session, &connection)
        .inspect_err(|error| tracing::error!("Failed to calculate total: {error}"))?;

    Ok(expenses_view(session.username(), &expenses, total_spent).into_response())
}

fn expenses_view(username: Option<&str>, expenses: &[Expense], total_spent: Decimal) -> Markup {
    let nav_bar = NavBar::new(endpoints::EXPENSES_VIEW, username).into_html();

    let table_row = |expense: &Expense| {
        html!(
            tr class=(TABLE_ROW_STYLE) data-expense-row="true"
            {
                td class=(TABLE_CELL_STYLE) { (expense.date) }
                td class=(TABLE_CELL_STYLE)
                {
                    span class=(CATEGORY_BADGE_STYLE) { (expense.category) }
                }
                td class=(TABLE_CELL_STYLE) { (expense.description) }
                td class={ (TABLE_CELL_STYLE) " text-right tabular-nums" }
                {
                    (format_currency(expense.amount))
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Expenses" }

                    a href=(endpoints::NEW_EXPENSE_VIEW) class=(LINK_STYLE)
                    {
                        "Add Expense"
                    }
                }

                p class="text-lg"
                {
                    "Total spent: "
                    span id="total" class="font-semibold tabular-nums"
                    {
                        (format_currency(total_spent))
                    }
                }

                div class="overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class={ (TABLE_CELL_STYLE) " text-right" }
                                {
                                    "Amount"
                                }
                            }
                        }

                        tbody
                        {
                            @for expense in expenses {
                                (table_row(expense))
                            }

                            @if expenses.is_empty() {
                                tr
                                {
                                    td
                                        colspan="4"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No expenses recorded yet. "
                                        a href=(endpoints::NEW_EXPENSE_VIEW) class=(LINK_STYLE)
                                        {
                                            "Record your first expense"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Expenses", &[], &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error, SessionState,
        app_state::create_cookie_key,
        db::initialize,
        expense::{ExpenseInput, add_expense},
        test_utils::{assert_status_ok, assert_valid_html, parse_html_document, select_text},
        user::{Registration, register},
    };

    use super::{ExpensesPageState, get_expenses_page};

    fn get_state_and_session() -> (ExpensesPageState, SessionState) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = register(
            Registration {
                username: "alice",
                email: "alice@example.com",
                password: "hunter2",
                confirm_password: "hunter2",
            },
            4,
            &conn,
        )
        .unwrap();

        let state = ExpensesPageState {
            cookie_key: create_cookie_key("foobar"),
            db_connection: Arc::new(Mutex::new(conn)),
        };
        let session = SessionState::Authenticated {
            user_id: user.id,
            username: user.username,
        };

        (state, session)
    }

    fn add(state: &ExpensesPageState, session: &SessionState, amount: &str, date: &str) {
        add_expense(
            session,
            ExpenseInput {
                amount,
                category: "Food",
                description: Some("Groceries"),
                date: Some(date),
            },
            date!(2024 - 12 - 31),
            &state.db_connection.lock().unwrap(),
        )
        .expect("Could not add expense");
    }

    #[tokio::test]
    async fn shows_expenses_newest_first_with_total() {
        let (state, session) = get_state_and_session();
        add(&state, &session, "10", "2024-01-05");
        add(&state, &session, "1234.5", "2024-03-01");

        let response = get_expenses_page(State(state), session).await.unwrap();

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let dates = select_text(&document, "tr[data-expense-row] td:first-child");
        assert_eq!(dates, vec!["2024-03-01", "2024-01-05"]);
        assert_eq!(select_text(&document, "#total"), vec!["$1,244.50"]);
    }

    #[tokio::test]
    async fn shows_empty_state_without_expenses() {
        let (state, session) = get_state_and_session();

        let response = get_expenses_page(State(state), session).await.unwrap();

        let document = parse_html_document(response).await;
        assert_eq!(select_text(&document, "#total"), vec!["$0.00"]);
        let text = document.root_element().text().collect::<String>();
        assert!(text.contains("No expenses recorded yet."));
    }

    #[tokio::test]
    async fn anonymous_session_is_rejected() {
        let (state, _) = get_state_and_session();

        let result = get_expenses_page(State(state), SessionState::Anonymous).await;

        assert!(matches!(result, Err(Error::Unauthenticated)));
    }
}
