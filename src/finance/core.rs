//! Revenue aggregation for the finance overview and dashboard.

use rusqlite::Connection;
use time::{Date, Month};

use crate::{
    Error,
    ledger::{
        AccountTable, EntryKind, LedgerEntry, entries_in_range, total_by_kind, trend_percentage,
    },
};

/// Fee payments received this month and last, with the month-over-month
/// trend badge figure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevenueSummary {
    /// Payments received in the month containing `today`.
    pub this_month: f64,
    /// Payments received in the month before.
    pub previous_month: f64,
    /// Percentage change from last month to this month.
    pub trend: f64,
}

/// The first and last day of the month containing `date`.
fn month_range(date: Date) -> (Date, Date) {
    let start = date.replace_day(1).expect("day 1 is valid for every month");

    let next_month_start = match date.month() {
        Month::December => Date::from_calendar_date(date.year() + 1, Month::January, 1),
        month => Date::from_calendar_date(date.year(), month.next(), 1),
    }
    .expect("day 1 is valid for every month");

    let end = next_month_start
        .previous_day()
        .expect("the day before the first of a month always exists");

    (start, end)
}

/// Compute the revenue summary for the month containing `today`.
///
/// Revenue counts fee payments only; invoices raised do not move the figure
/// until they are paid.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn compute_revenue_summary(
    today: Date,
    connection: &Connection,
) -> Result<RevenueSummary, Error> {
    let (this_start, this_end) = month_range(today);
    let previous_month_anchor = this_start
        .previous_day()
        .expect("the day before the first of a month always exists");
    let (previous_start, previous_end) = month_range(previous_month_anchor);

    let this_month = total_by_kind(
        &entries_in_range(AccountTable::Fees, this_start, this_end, connection)?,
        EntryKind::Payment,
    );
    let previous_month = total_by_kind(
        &entries_in_range(AccountTable::Fees, previous_start, previous_end, connection)?,
        EntryKind::Payment,
    );

    Ok(RevenueSummary {
        this_month,
        previous_month,
        trend: trend_percentage(this_month, previous_month),
    })
}

/// The total outstanding fee balance across the whole school: everything
/// invoiced and not yet paid.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn outstanding_fees_total(connection: &Connection) -> Result<f64, Error> {
    let total: Option<f64> = connection.query_row(
        "SELECT SUM(CASE kind WHEN 'CHARGE' THEN amount ELSE -amount END) FROM fee_entry",
        [],
        |row| row.get(0),
    )?;

    Ok(total.unwrap_or(0.0))
}

/// The most recent fee entries across the school with the student's name
/// joined in, newest first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn recent_fee_entries(
    limit: u64,
    connection: &Connection,
) -> Result<Vec<(LedgerEntry, String)>, Error> {
    connection
        .prepare(
            "SELECT e.id, e.student_id, e.kind, e.amount, e.date, e.method, e.description,
                 e.reference, s.first_name || ' ' || s.last_name
             FROM fee_entry e
             INNER JOIN student s ON e.student_id = s.id
             ORDER BY e.date DESC, e.id DESC
             LIMIT ?1",
        )?
        .query_map([limit], |row| {
            let entry = crate::ledger::map_entry_row(row)?;
            let student_name: String = row.get(8)?;

            Ok((entry, student_name))
        })?
        .map(|row| row.map_err(Error::SqlError))
        .collect()
}

#[cfg(test)]
mod revenue_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        db::initialize,
        ledger::{AccountTable, EntryKind, NewEntry, PaymentMethod, append_entry},
        student::{NewStudent, create_student},
    };

    use super::{compute_revenue_summary, month_range, outstanding_fees_total};

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
        .unwrap()
        .id
    }

    fn record(conn: &Connection, student_id: i64, kind: EntryKind, amount: f64, date: time::Date) {
        append_entry(
            AccountTable::Fees,
            NewEntry {
                student_id,
                kind,
                amount,
                date,
                method: Some(PaymentMethod::Cash),
                description: "test".to_owned(),
                reference: String::new(),
            },
            date!(2025 - 06 - 30),
            conn,
        )
        .unwrap();
    }

    #[test]
    fn month_range_spans_the_calendar_month() {
        assert_eq!(
            month_range(date!(2025 - 06 - 15)),
            (date!(2025 - 06 - 01), date!(2025 - 06 - 30))
        );
        assert_eq!(
            month_range(date!(2025 - 12 - 31)),
            (date!(2025 - 12 - 01), date!(2025 - 12 - 31))
        );
    }

    #[test]
    fn revenue_compares_this_month_to_last() {
        let conn = get_test_connection();
        let student_id = insert_test_student(&conn);
        record(&conn, student_id, EntryKind::Payment, 100.0, date!(2025 - 05 - 20));
        record(&conn, student_id, EntryKind::Payment, 120.0, date!(2025 - 06 - 05));
        // Invoices do not count as revenue.
        record(&conn, student_id, EntryKind::Charge, 500.0, date!(2025 - 06 - 06));

        let summary = compute_revenue_summary(date!(2025 - 06 - 15), &conn).unwrap();

        assert_eq!(summary.this_month, 120.0);
        assert_eq!(summary.previous_month, 100.0);
        assert_eq!(summary.trend, 20.0);
    }

    #[test]
    fn revenue_with_no_previous_month_trends_full() {
        let conn = get_test_connection();
        let student_id = insert_test_student(&conn);
        record(&conn, student_id, EntryKind::Payment, 50.0, date!(2025 - 06 - 05));

        let summary = compute_revenue_summary(date!(2025 - 06 - 15), &conn).unwrap();

        assert_eq!(summary.trend, 100.0);
    }

    #[test]
    fn outstanding_total_nets_invoices_against_payments() {
        let conn = get_test_connection();
        let student_id = insert_test_student(&conn);
        record(&conn, student_id, EntryKind::Charge, 1000.0, date!(2025 - 06 - 01));
        record(&conn, student_id, EntryKind::Payment, 400.0, date!(2025 - 06 - 05));

        assert_eq!(outstanding_fees_total(&conn).unwrap(), 600.0);
    }

    #[test]
    fn outstanding_total_of_empty_school_is_zero() {
        let conn = get_test_connection();

        assert_eq!(outstanding_fees_total(&conn).unwrap(), 0.0);
    }
}
