//! The category registry: the set of category names seen across all expenses.
//!
//! Categories are created as a side effect of recording an expense and are used
//! to suggest names on the new expense form. They are never deleted.

use std::fmt::Display;

use rusqlite::Connection;

use crate::Error;

/// The name of a category, e.g. 'Groceries' or 'Transport'.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name from user input.
    ///
    /// Leading and trailing whitespace is removed.
    ///
    /// # Errors
    ///
    /// This function will return [Error::MissingField] if `name` is empty or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::MissingField("category"))
        } else {
            Ok(Self(name.to_string()))
        }
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE
        )",
        (),
    )?;

    Ok(())
}

/// Add `name` to the registry if no category with the same name exists.
///
/// Names are compared case-insensitively, so the first spelling seen is kept.
pub(crate) fn upsert_category(name: &CategoryName, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "INSERT OR IGNORE INTO category (name) VALUES (?1)",
        (name.as_ref(),),
    )?;

    Ok(())
}

/// Get every category name in the registry in alphabetical order.
///
/// # Errors
/// Returns [Error::StoreUnavailable] if there is an SQL error.
pub fn get_category_suggestions(connection: &Connection) -> Result<Vec<String>, Error> {
    connection
        .prepare("SELECT name FROM category ORDER BY name ASC")?
        .query_map((), |row| row.get(0))?
        .map(|maybe_name| maybe_name.map_err(Error::from))
        .collect()
}
