//! The credential store: creating users, checking their passwords and updating their profile.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The name shown in the navigation bar.
    pub username: String,
    /// The email address the user logs in with.
    pub email: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

/// The fields submitted on the registration form.
#[derive(Debug, Clone, Copy)]
pub struct Registration<'a> {
    /// The display name for the new user.
    pub username: &'a str,
    /// The email address for the new user.
    pub email: &'a str,
    /// The plaintext password.
    pub password: &'a str,
    /// The plaintext password entered a second time.
    pub confirm_password: &'a str,
}

/// Create the user table.
///
/// Emails are compared case-insensitively, so "Foo@Bar.baz" and
/// "foo@bar.baz" are the same address.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let username = row.get(1)?;
    let email = row.get(2)?;
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserID::new(raw_id),
        username,
        email,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}

/// Insert a new user into the database.
///
/// The caller is responsible for validating the fields.
///
/// # Errors
///
/// Returns a [Error::DuplicateEmail] if the email is already registered or a
/// [Error::StoreUnavailable] if any other SQL related error occurred.
pub fn create_user(
    username: &str,
    email: &str,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (username, email, password) VALUES (?1, ?2, ?3)",
        (username, email, password_hash.as_ref()),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        username: username.to_owned(),
        email: email.to_owned(),
        password_hash,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, username, email, password FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user whose email matches `email`, ignoring case.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has the email.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, username, email, password FROM user WHERE email = :email")?
        .query_row(&[(":email", &email)], map_user_row)
        .map_err(|error| error.into())
}

/// A registration whose fields are valid and whose password has been hashed.
///
/// Created with [Registration::hash_password] and saved with [create_registered_user].
#[derive(Debug, Clone, PartialEq)]
pub struct HashedRegistration<'a> {
    username: &'a str,
    email: &'a str,
    password_hash: PasswordHash,
}

impl<'a> Registration<'a> {
    /// Validate the fields and hash the password with `cost` rounds, see [PasswordHash::new].
    ///
    /// The username and email are trimmed. No database access happens here,
    /// so the slow hash never runs while the connection is locked.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [Error::MissingField] if the username, email or password is empty,
    /// - [Error::PasswordMismatch] if the password and its confirmation differ,
    /// - [Error::HashingError] if the password could not be hashed.
    pub fn hash_password(self, cost: u32) -> Result<HashedRegistration<'a>, Error> {
        let username = self.username.trim();
        let email = self.email.trim();

        if username.is_empty() {
            return Err(Error::MissingField("username"));
        }

        if email.is_empty() {
            return Err(Error::MissingField("email"));
        }

        if self.password.is_empty() {
            return Err(Error::MissingField("password"));
        }

        if self.password != self.confirm_password {
            return Err(Error::PasswordMismatch);
        }

        Ok(HashedRegistration {
            username,
            email,
            password_hash: PasswordHash::new(self.password, cost)?,
        })
    }
}

/// Save a validated registration as a new user.
///
/// # Errors
///
/// Returns [Error::DuplicateEmail] if the email belongs to another user or
/// [Error::StoreUnavailable] for other SQL errors.
///
/// Nothing is written to the database if an error is returned.
pub fn create_registered_user(
    registration: HashedRegistration<'_>,
    connection: &Connection,
) -> Result<User, Error> {
    let transaction = connection.unchecked_transaction()?;

    match get_user_by_email(registration.email, &transaction) {
        Ok(_) => return Err(Error::DuplicateEmail),
        Err(Error::NotFound) => {}
        Err(error) => return Err(error),
    }

    let user = create_user(
        registration.username,
        registration.email,
        registration.password_hash,
        &transaction,
    )?;

    transaction.commit()?;

    tracing::info!("Registered user {}", user.id);

    Ok(user)
}

/// Register a new user.
///
/// Combines [Registration::hash_password] and [create_registered_user].
///
/// # Errors
///
/// See [Registration::hash_password] and [create_registered_user].
pub fn register(
    registration: Registration<'_>,
    cost: u32,
    connection: &Connection,
) -> Result<User, Error> {
    create_registered_user(registration.hash_password(cost)?, connection)
}

/// Look up the user logging in with `email`.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] if the email is not registered.
pub fn find_user_for_log_in(email: &str, connection: &Connection) -> Result<User, Error> {
    match get_user_by_email(email.trim(), connection) {
        Ok(user) => Ok(user),
        Err(Error::NotFound) => Err(Error::InvalidCredentials),
        Err(error) => Err(error),
    }
}

/// Check `password` against the stored hash of `user`.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] if the password is wrong.
pub fn check_password(user: User, password: &str) -> Result<User, Error> {
    if user.password_hash.verify(password)? {
        Ok(user)
    } else {
        Err(Error::InvalidCredentials)
    }
}

/// Check `password` against the stored hash for the user with `email`.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] if the email is not registered or the
/// password is wrong. The two cases are indistinguishable.
pub fn authenticate(email: &str, password: &str, connection: &Connection) -> Result<User, Error> {
    check_password(find_user_for_log_in(email, connection)?, password)
}

/// Change the username and email of the user with `user_id`.
///
/// Keeping the current email is allowed. The password cannot be changed.
///
/// # Errors
///
/// Returns:
/// - [Error::MissingField] if the username or email is empty,
/// - [Error::DuplicateEmail] if another user has `email`,
/// - [Error::NotFound] if `user_id` does not belong to a user,
/// - [Error::StoreUnavailable] for other SQL errors.
pub fn update_profile(
    user_id: UserID,
    username: &str,
    email: &str,
    connection: &Connection,
) -> Result<User, Error> {
    let username = username.trim();
    let email = email.trim();

    if username.is_empty() {
        return Err(Error::MissingField("username"));
    }

    if email.is_empty() {
        return Err(Error::MissingField("email"));
    }

    let transaction = connection.unchecked_transaction()?;

    match get_user_by_email(email, &transaction) {
        Ok(other) if other.id != user_id => return Err(Error::DuplicateEmail),
        Ok(_) | Err(Error::NotFound) => {}
        Err(error) => return Err(error),
    }

    let rows_updated = transaction.execute(
        "UPDATE user SET username = ?1, email = ?2 WHERE id = ?3",
        (username, email, user_id.as_i64()),
    )?;

    if rows_updated == 0 {
        return Err(Error::NotFound);
    }

    let user = get_user_by_id(user_id, &transaction)?;
    transaction.commit()?;

    Ok(user)
}
