//! Database schema initialization.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error, attendance::create_attendance_table, food::create_food_tables,
    ledger::create_account_tables, schedule::create_schedule_table, staff::create_staff_table,
    student::create_student_table, transport::create_transport_tables,
};

/// Create the tables for every domain model.
///
/// The tables are created in one exclusive transaction so a failure part-way
/// through leaves the database untouched.
///
/// # Errors
/// Returns an error if a table cannot be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Account tables and subscriptions reference students and staff.
    connection.execute("PRAGMA foreign_keys = ON", ())?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_staff_table(&transaction)?;
    create_student_table(&transaction)?;
    create_account_tables(&transaction)?;
    create_food_tables(&transaction)?;
    create_transport_tables(&transaction)?;
    create_attendance_table(&transaction)?;
    create_schedule_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod initialize_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).unwrap();
        initialize(&conn).unwrap();
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO fee_entry (student_id, kind, amount, date, description, reference)
             VALUES (999, 'PAYMENT', 1.0, '2025-06-10', '', '')",
            (),
        );

        assert!(result.is_err(), "expected foreign key violation");
    }
}
