//! Append-only storage for the account ledgers.
//!
//! The fee, food and transport accounts share one schema across three tables.
//! Entries are only ever appended; corrections are made by appending a
//! compensating entry, so the balance a page shows is always recomputed from
//! the rows read in the same request.

use rusqlite::Connection;
use time::Date;

use crate::{Error, database_id::StudentId};

use super::model::{EntryKind, LedgerEntry, NewEntry, map_entry_row};

/// The account table an operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountTable {
    /// School fees (tuition and levies).
    Fees,
    /// The food service account.
    Food,
    /// The transport account.
    Transport,
}

impl AccountTable {
    pub(crate) fn table_name(self) -> &'static str {
        match self {
            AccountTable::Fees => "fee_entry",
            AccountTable::Food => "food_entry",
            AccountTable::Transport => "transport_entry",
        }
    }
}

/// Create the three account ledger tables.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn create_account_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    for table in [
        AccountTable::Fees,
        AccountTable::Food,
        AccountTable::Transport,
    ] {
        connection.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    student_id INTEGER NOT NULL,
                    kind TEXT NOT NULL,
                    amount REAL NOT NULL CHECK(amount >= 0),
                    date TEXT NOT NULL,
                    method TEXT,
                    description TEXT NOT NULL,
                    reference TEXT NOT NULL,
                    FOREIGN KEY(student_id) REFERENCES student(id) ON UPDATE CASCADE ON DELETE CASCADE
                    )",
                table.table_name()
            ),
            (),
        )?;

        connection.execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS idx_{0}_student_date ON {0}(student_id, date);",
                table.table_name()
            ),
            (),
        )?;
    }

    Ok(())
}

/// Append an entry to a student's account ledger.
///
/// `today` is the school-local date used to reject entries dated in the
/// future.
///
/// # Errors
/// This function will return a:
/// - [Error::NegativeAmount] if the amount is below zero,
/// - [Error::FutureDate] if the entry is dated after `today`,
/// - [Error::InvalidReference] if the student does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn append_entry(
    table: AccountTable,
    entry: NewEntry,
    today: Date,
    connection: &Connection,
) -> Result<LedgerEntry, Error> {
    if entry.amount < 0.0 {
        return Err(Error::NegativeAmount(entry.amount));
    }

    if entry.date > today {
        return Err(Error::FutureDate(entry.date));
    }

    // Charges never carry a payment method.
    let method = match entry.kind {
        EntryKind::Payment => entry.method,
        EntryKind::Charge => None,
    };

    connection
        .prepare(&format!(
            "INSERT INTO {} (student_id, kind, amount, date, method, description, reference)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, student_id, kind, amount, date, method, description, reference",
            table.table_name()
        ))?
        .query_row(
            (
                entry.student_id,
                entry.kind.as_str(),
                entry.amount,
                entry.date,
                method.map(|method| method.as_str()),
                entry.description,
                entry.reference,
            ),
            map_entry_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidReference,
            error => error.into(),
        })
}

/// Retrieve a student's full ledger, oldest entry first.
///
/// Rows are sorted by date and then ID so the order stays stable when several
/// entries share a date.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn entries_for_student(
    table: AccountTable,
    student_id: StudentId,
    connection: &Connection,
) -> Result<Vec<LedgerEntry>, Error> {
    connection
        .prepare(&format!(
            "SELECT id, student_id, kind, amount, date, method, description, reference
             FROM {} WHERE student_id = :student_id
             ORDER BY date ASC, id ASC",
            table.table_name()
        ))?
        .query_map(&[(":student_id", &student_id)], map_entry_row)?
        .map(|entry| entry.map_err(Error::SqlError))
        .collect()
}

/// Retrieve every entry dated within the inclusive range, oldest first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub(crate) fn entries_in_range(
    table: AccountTable,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Vec<LedgerEntry>, Error> {
    connection
        .prepare(&format!(
            "SELECT id, student_id, kind, amount, date, method, description, reference
             FROM {} WHERE date BETWEEN ?1 AND ?2
             ORDER BY date ASC, id ASC",
            table.table_name()
        ))?
        .query_map([start, end], map_entry_row)?
        .map(|entry| entry.map_err(Error::SqlError))
        .collect()
}

#[cfg(test)]
mod store_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        ledger::{AccountTable, EntryKind, NewEntry, PaymentMethod},
        student::{NewStudent, create_student},
    };

    use super::{append_entry, entries_for_student, entries_in_range};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn insert_test_student(conn: &Connection) -> i64 {
        create_student(
            NewStudent {
                admission_number: "ADM-001".to_owned(),
                first_name: "Wanjiku".to_owned(),
                last_name: "Kamau".to_owned(),
                grade: 4,
                term: 1,
                guardian_name: "Grace Kamau".to_owned(),
                guardian_phone: "0722000001".to_owned(),
            },
            conn,
        )
        .expect("Could not create test student")
        .id
    }

    fn payment(student_id: i64, amount: f64, date: time::Date) -> NewEntry {
        NewEntry {
            student_id,
            kind: EntryKind::Payment,
            amount,
            date,
            method: Some(PaymentMethod::Mpesa),
            description: "Fees payment".to_owned(),
            reference: "QX12".to_owned(),
        }
    }

    #[test]
    fn append_succeeds() {
        let conn = get_test_connection();
        let student_id = insert_test_student(&conn);
        let today = date!(2025 - 06 - 10);

        let entry = append_entry(
            AccountTable::Fees,
            payment(student_id, 1500.0, today),
            today,
            &conn,
        )
        .expect("Could not append entry");

        assert_eq!(entry.amount, 1500.0);
        assert_eq!(entry.kind, EntryKind::Payment);
        assert_eq!(entry.method, Some(PaymentMethod::Mpesa));
    }

    #[test]
    fn append_rejects_future_date() {
        let conn = get_test_connection();
        let student_id = insert_test_student(&conn);
        let today = date!(2025 - 06 - 10);
        let tomorrow = date!(2025 - 06 - 11);

        let result = append_entry(
            AccountTable::Fees,
            payment(student_id, 1500.0, tomorrow),
            today,
            &conn,
        );

        assert_eq!(result, Err(Error::FutureDate(tomorrow)));
    }

    #[test]
    fn append_rejects_negative_amount() {
        let conn = get_test_connection();
        let student_id = insert_test_student(&conn);
        let today = date!(2025 - 06 - 10);

        let result = append_entry(
            AccountTable::Fees,
            payment(student_id, -5.0, today),
            today,
            &conn,
        );

        assert_eq!(result, Err(Error::NegativeAmount(-5.0)));
    }

    #[test]
    fn append_rejects_unknown_student() {
        let conn = get_test_connection();
        let today = date!(2025 - 06 - 10);

        let result = append_entry(AccountTable::Fees, payment(999, 100.0, today), today, &conn);

        assert_eq!(result, Err(Error::InvalidReference));
    }

    #[test]
    fn append_strips_method_from_charges() {
        let conn = get_test_connection();
        let student_id = insert_test_student(&conn);
        let today = date!(2025 - 06 - 10);

        let entry = append_entry(
            AccountTable::Fees,
            NewEntry {
                kind: EntryKind::Charge,
                method: Some(PaymentMethod::Cash),
                ..payment(student_id, 200.0, today)
            },
            today,
            &conn,
        )
        .expect("Could not append entry");

        assert_eq!(entry.method, None);
    }

    #[test]
    fn entries_are_ordered_by_date_then_id() {
        let conn = get_test_connection();
        let student_id = insert_test_student(&conn);
        let today = date!(2025 - 06 - 10);
        let earlier = date!(2025 - 06 - 01);

        append_entry(
            AccountTable::Food,
            payment(student_id, 10.0, today),
            today,
            &conn,
        )
        .unwrap();
        append_entry(
            AccountTable::Food,
            payment(student_id, 20.0, earlier),
            today,
            &conn,
        )
        .unwrap();
        append_entry(
            AccountTable::Food,
            payment(student_id, 30.0, earlier),
            today,
            &conn,
        )
        .unwrap();

        let got = entries_for_student(AccountTable::Food, student_id, &conn).unwrap();

        let amounts: Vec<f64> = got.iter().map(|entry| entry.amount).collect();
        assert_eq!(amounts, vec![20.0, 30.0, 10.0]);
    }

    #[test]
    fn tables_are_independent() {
        let conn = get_test_connection();
        let student_id = insert_test_student(&conn);
        let today = date!(2025 - 06 - 10);

        append_entry(
            AccountTable::Fees,
            payment(student_id, 10.0, today),
            today,
            &conn,
        )
        .unwrap();

        let food_entries = entries_for_student(AccountTable::Food, student_id, &conn).unwrap();

        assert_eq!(food_entries, vec![]);
    }

    #[test]
    fn range_query_excludes_out_of_range_entries() {
        let conn = get_test_connection();
        let student_id = insert_test_student(&conn);
        let today = date!(2025 - 06 - 10);

        append_entry(
            AccountTable::Fees,
            payment(student_id, 10.0, date!(2025 - 05 - 31)),
            today,
            &conn,
        )
        .unwrap();
        append_entry(
            AccountTable::Fees,
            payment(student_id, 20.0, date!(2025 - 06 - 01)),
            today,
            &conn,
        )
        .unwrap();

        let got = entries_in_range(
            AccountTable::Fees,
            date!(2025 - 06 - 01),
            date!(2025 - 06 - 30),
            &conn,
        )
        .unwrap();

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].amount, 20.0);
    }
}
