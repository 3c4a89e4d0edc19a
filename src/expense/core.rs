//! Defines the expense model and the ledger queries for a user's expenses.

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error, SessionState, UserID,
    category::{CategoryName, upsert_category},
    database_id::ExpenseId,
    money::{from_cents, parse_amount, to_cents},
};

/// The format used for dates on forms and in the database, e.g. "2024-01-31".
const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// Money spent by a user on a given day.
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// The user who recorded the expense.
    pub user_id: UserID,
    /// The amount spent, rounded to cents.
    pub amount: Decimal,
    /// The category label, e.g. "Groceries".
    pub category: String,
    /// What the money was spent on. Empty if no description was given.
    pub description: String,
    /// When the money was spent.
    pub date: Date,
}

/// The raw fields from the new expense form.
///
/// Validation happens in [add_expense].
#[derive(Debug, Clone, Copy)]
pub struct ExpenseInput<'a> {
    /// The amount as typed, e.g. "12.50".
    pub amount: &'a str,
    /// The category name as typed.
    pub category: &'a str,
    /// An optional description.
    pub description: Option<&'a str>,
    /// The date as "YYYY-MM-DD". A missing or blank date means today.
    pub date: Option<&'a str>,
}

/// Create the expense table and the index used for listing and summaries.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                amount INTEGER NOT NULL,
                category TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                expense_date TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, expense_date);",
        (),
    )?;

    Ok(())
}

/// Parse a "YYYY-MM-DD" date, using `today` when `text` is missing or blank.
///
/// Only years 0001 to 9999 are accepted so that every stored date starts with
/// a four digit year.
///
/// # Errors
/// Returns [Error::InvalidDate] if `text` is not a valid date.
pub(crate) fn parse_date(text: Option<&str>, today: Date) -> Result<Date, Error> {
    let text = match text.map(str::trim) {
        None | Some("") => return Ok(today),
        Some(text) => text,
    };

    match Date::parse(text, DATE_FORMAT) {
        Ok(date) if (1..=9999).contains(&date.year()) => Ok(date),
        _ => Err(Error::InvalidDate(text.to_owned())),
    }
}

/// Record a new expense for the logged in user.
///
/// The category is added to the category registry if it is new. The expense
/// and the category are written in one transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::Unauthenticated] if `session` is anonymous,
/// - [Error::InvalidAmount] if the amount is not a number,
/// - [Error::MissingField] if the category is blank,
/// - [Error::InvalidDate] if the date is not "YYYY-MM-DD",
/// - or [Error::StoreUnavailable] if there is an SQL error.
///
/// Nothing is written if an error is returned.
pub fn add_expense(
    session: &SessionState,
    input: ExpenseInput<'_>,
    today: Date,
    connection: &Connection,
) -> Result<ExpenseId, Error> {
    let user_id = session.user_id()?;
    let amount = parse_amount(input.amount)?;
    let cents = to_cents(amount)?;
    let category = CategoryName::new(input.category)?;
    let description = input.description.map(str::trim).unwrap_or_default();
    let date = parse_date(input.date, today)?;

    let transaction = connection.unchecked_transaction()?;

    transaction.execute(
        "INSERT INTO expense (user_id, amount, category, description, expense_date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            user_id.as_i64(),
            cents,
            category.as_ref(),
            description,
            date,
        ),
    )?;
    let id = transaction.last_insert_rowid();

    upsert_category(&category, &transaction)?;

    transaction.commit()?;

    tracing::debug!("User {user_id} added expense {id}");

    Ok(id)
}

/// Get all of the logged in user's expenses, newest first.
///
/// Expenses on the same day are ordered by ID, newest first.
///
/// # Errors
/// Returns [Error::Unauthenticated] if `session` is anonymous or
/// [Error::StoreUnavailable] if there is an SQL error.
pub fn list_expenses(
    session: &SessionState,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    let user_id = session.user_id()?;

    connection
        .prepare(
            "SELECT id, user_id, amount, category, description, expense_date
             FROM expense
             WHERE user_id = :user_id
             ORDER BY expense_date DESC, id DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_expense_row)?
        .map(|maybe_expense| maybe_expense.map_err(Error::from))
        .collect()
}

/// Sum the amounts of all of the logged in user's expenses.
///
/// Returns zero if the user has no expenses.
///
/// # Errors
/// Returns [Error::Unauthenticated] if `session` is anonymous or
/// [Error::StoreUnavailable] if there is an SQL error.
pub fn total(session: &SessionState, connection: &Connection) -> Result<Decimal, Error> {
    let user_id = session.user_id()?;

    let cents: i64 = connection.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM expense WHERE user_id = ?1",
        (user_id.as_i64(),),
        |row| row.get(0),
    )?;

    Ok(from_cents(cents))
}

/// Map a database row to an [Expense].
fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserID::new(row.get(1)?);
    let cents = row.get(2)?;
    let category = row.get(3)?;
    let description = row.get(4)?;
    let date = row.get(5)?;

    Ok(Expense {
        id,
        user_id,
        amount: from_cents(cents),
        category,
        description,
        date,
    })
}
