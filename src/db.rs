//! Database initialization for the application.

use std::time::Duration;

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{Error, stores::create_user_table};

/// How long a statement may wait on a busy database before the store call
/// fails with [Error::Unavailable] instead of hanging.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Set up the database schema and the busy timeout.
///
/// This should be called once at startup, before the connection is shared
/// with the stores.
///
/// # Errors
/// Returns an error if the schema could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.busy_timeout(BUSY_TIMEOUT)?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod db_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_creates_user_table() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'user'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).unwrap();
        initialize(&conn).unwrap();
    }
}
