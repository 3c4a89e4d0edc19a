//! Database initialization and access to the shared connection.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error, category::create_category_table, expense::create_expense_table,
    user::create_user_table,
};

/// Acquire the lock on the shared database connection.
///
/// The lock is released when the returned guard is dropped.
///
/// # Errors
/// Returns [Error::StoreUnavailable] if another thread panicked while holding the lock.
pub fn lock_connection(
    connection: &Arc<Mutex<Connection>>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::StoreUnavailable(error.to_string())
    })
}

/// Create the tables for the domain models if they do not already exist.
///
/// The tables are created in a single exclusive transaction, so either all of
/// them exist afterwards or none of the changes are kept.
///
/// # Errors
/// Returns [Error::StoreUnavailable] if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_expense_table(&transaction)?;
    create_category_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;

    use crate::Error;

    use super::{initialize, lock_connection};

    #[test]
    fn initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).unwrap();
        initialize(&conn).unwrap();
    }

    #[test]
    fn initialize_enables_foreign_keys() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let enabled: i64 = conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();

        assert_eq!(enabled, 1);
    }

    #[test]
    fn poisoned_lock_is_store_unavailable() {
        let connection = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
        let poisoner = connection.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        let result = lock_connection(&connection);

        assert!(matches!(result, Err(Error::StoreUnavailable(_))));
    }

    #[test]
    fn expense_for_missing_user_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO expense (user_id, amount, category, description, expense_date) \
            VALUES (42, 100, 'Food', '', '2024-01-01')",
            (),
        );

        assert!(result.is_err());
    }
}
