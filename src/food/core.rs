//! Defines the core data models and database queries for the food service.

use rusqlite::{Connection, Row, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::{MealItemId, ServingId, StudentId, SubscriptionId},
    ledger::{AccountTable, EntryKind, LedgerEntry, NewEntry, append_entry},
};

// ============================================================================
// MODELS
// ============================================================================

/// A billable item on the school menu, e.g. "Lunch" or "Morning porridge".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealItem {
    /// The ID of the meal item.
    pub id: MealItemId,
    /// The item's name as shown on the menu and the serving checklist.
    pub name: String,
    /// The price charged to a student's food account per serving.
    pub price: f64,
    /// Whether the item is still on the menu. Retired items keep their
    /// ledger history but cannot be subscribed or served.
    pub active: bool,
}

/// The data needed to put an item on the menu.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMealItem {
    /// The item's name.
    pub name: String,
    /// The price per serving.
    pub price: f64,
}

/// The editable fields of a meal item.
#[derive(Debug, Clone, PartialEq)]
pub struct MealItemUpdate {
    /// The item's name.
    pub name: String,
    /// The price per serving.
    pub price: f64,
    /// Whether the item is still on the menu.
    pub active: bool,
}

/// The request state of one serving.
///
/// A serving is recorded as `Pending` the moment the cook ticks the box, then
/// reconciled to `Confirmed` once the charge has been posted to the student's
/// food account, or `Failed` if posting the charge failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServingStatus {
    /// The serving has been recorded but not yet charged.
    Pending,
    /// The serving has been charged to the food account.
    Confirmed,
    /// Charging the serving failed; the tick can be retried.
    Failed,
}

impl ServingStatus {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            ServingStatus::Pending => "PENDING",
            ServingStatus::Confirmed => "CONFIRMED",
            ServingStatus::Failed => "FAILED",
        }
    }

    pub(crate) fn from_column(value: &str) -> Result<Self, Error> {
        match value {
            "PENDING" => Ok(ServingStatus::Pending),
            "CONFIRMED" => Ok(ServingStatus::Confirmed),
            "FAILED" => Ok(ServingStatus::Failed),
            other => Err(Error::InvalidColumnValue(other.to_owned(), "status")),
        }
    }
}

/// A student's subscription to a meal item.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    /// The ID of the subscription.
    pub id: SubscriptionId,
    /// The subscribed student.
    pub student_id: StudentId,
    /// The subscribed meal item.
    pub item: MealItem,
}

/// One row of the daily serving checklist.
#[derive(Debug, Clone, PartialEq)]
pub struct ServingRosterRow {
    /// The subscription this row serves.
    pub subscription_id: SubscriptionId,
    /// The student's full name.
    pub student_name: String,
    /// The student's grade.
    pub grade: i64,
    /// The meal item's name.
    pub item_name: String,
    /// The price that will be charged when served.
    pub price: f64,
    /// The serving state for the day, or `None` if not yet served.
    pub status: Option<ServingStatus>,
}

/// The result of marking a subscription served.
#[derive(Debug, Clone, PartialEq)]
pub struct ServingOutcome {
    /// The ID of the confirmed serving record.
    pub serving_id: ServingId,
    /// The charge posted to the student's food account.
    pub entry: LedgerEntry,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the meal item, subscription and serving tables.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn create_food_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS meal_item (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                price REAL NOT NULL CHECK(price >= 0),
                active INTEGER NOT NULL DEFAULT 1
                )",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS meal_subscription (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                student_id INTEGER NOT NULL,
                item_id INTEGER NOT NULL,
                UNIQUE(student_id, item_id),
                FOREIGN KEY(student_id) REFERENCES student(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(item_id) REFERENCES meal_item(id)
                )",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS meal_serving (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                subscription_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                status TEXT NOT NULL,
                UNIQUE(subscription_id, date),
                FOREIGN KEY(subscription_id) REFERENCES meal_subscription(id) ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Put a new item on the menu.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyName] if the name is blank,
/// - [Error::NegativeAmount] if the price is below zero,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_meal_item(item: NewMealItem, connection: &Connection) -> Result<MealItem, Error> {
    if item.name.trim().is_empty() {
        return Err(Error::EmptyName);
    }

    if item.price < 0.0 {
        return Err(Error::NegativeAmount(item.price));
    }

    let item = connection
        .prepare(
            "INSERT INTO meal_item (name, price) VALUES (?1, ?2)
             RETURNING id, name, price, active",
        )?
        .query_row((&item.name, item.price), map_meal_item_row)?;

    Ok(item)
}

/// Retrieve a meal item by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid meal item,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_meal_item(id: MealItemId, connection: &Connection) -> Result<MealItem, Error> {
    let item = connection
        .prepare("SELECT id, name, price, active FROM meal_item WHERE id = :id")?
        .query_row(&[(":id", &id)], map_meal_item_row)?;

    Ok(item)
}

/// Overwrite the editable fields of a meal item.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyName] or [Error::NegativeAmount] for invalid fields,
/// - [Error::UpdateMissingMealItem] if `id` does not refer to a valid item,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_meal_item(
    id: MealItemId,
    update: MealItemUpdate,
    connection: &Connection,
) -> Result<(), Error> {
    if update.name.trim().is_empty() {
        return Err(Error::EmptyName);
    }

    if update.price < 0.0 {
        return Err(Error::NegativeAmount(update.price));
    }

    let rows_affected = connection.execute(
        "UPDATE meal_item SET name = ?1, price = ?2, active = ?3 WHERE id = ?4",
        (&update.name, update.price, update.active, id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingMealItem);
    }

    Ok(())
}

/// Take a meal item off the menu entirely.
///
/// Items with subscriptions cannot be deleted; retire them by updating
/// `active` instead so their ledger history keeps its context.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingMealItem] if `id` does not refer to a valid item,
/// - [Error::StillReferenced] if the item has subscriptions,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_meal_item(id: MealItemId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection
        .execute("DELETE FROM meal_item WHERE id = :id", &[(":id", &id)])
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::StillReferenced,
            error => Error::from(error),
        })?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingMealItem);
    }

    Ok(())
}

/// Retrieve the whole menu, active items first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn list_meal_items(connection: &Connection) -> Result<Vec<MealItem>, Error> {
    connection
        .prepare("SELECT id, name, price, active FROM meal_item ORDER BY active DESC, name ASC")?
        .query_map([], map_meal_item_row)?
        .map(|item| item.map_err(Error::SqlError))
        .collect()
}

/// Subscribe a student to a meal item.
///
/// # Errors
/// This function will return a:
/// - [Error::InactiveMealItem] if the item is retired,
/// - [Error::DuplicateSubscription] if the student is already subscribed,
/// - [Error::InvalidReference] if the student or item does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn subscribe_student(
    student_id: StudentId,
    item_id: MealItemId,
    connection: &Connection,
) -> Result<SubscriptionId, Error> {
    let item = match get_meal_item(item_id, connection) {
        Ok(item) => item,
        Err(Error::NotFound) => return Err(Error::InvalidReference),
        Err(error) => return Err(error),
    };

    if !item.active {
        return Err(Error::InactiveMealItem(item_id));
    }

    connection
        .prepare(
            "INSERT INTO meal_subscription (student_id, item_id) VALUES (?1, ?2) RETURNING id",
        )?
        .query_row((student_id, item_id), |row| row.get(0))
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateSubscription,
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

/// Cancel a meal subscription.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingSubscription] if `id` does not refer to a valid
///   subscription,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn cancel_subscription(
    id: SubscriptionId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM meal_subscription WHERE id = :id",
        &[(":id", &id)],
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingSubscription);
    }

    Ok(())
}

/// Retrieve a student's subscriptions with their items, ordered by item name.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn subscriptions_for_student(
    student_id: StudentId,
    connection: &Connection,
) -> Result<Vec<Subscription>, Error> {
    connection
        .prepare(
            "SELECT s.id, s.student_id, i.id, i.name, i.price, i.active
             FROM meal_subscription s
             INNER JOIN meal_item i ON s.item_id = i.id
             WHERE s.student_id = :student_id
             ORDER BY i.name ASC, s.id ASC",
        )?
        .query_map(&[(":student_id", &student_id)], |row| {
            Ok(Subscription {
                id: row.get(0)?,
                student_id: row.get(1)?,
                item: MealItem {
                    id: row.get(2)?,
                    name: row.get(3)?,
                    price: row.get(4)?,
                    active: row.get(5)?,
                },
            })
        })?
        .map(|subscription| subscription.map_err(Error::SqlError))
        .collect()
}

/// Build the serving checklist for `date`: every subscription of an active
/// student, with its serving state for the day.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn serving_roster(
    date: Date,
    connection: &Connection,
) -> Result<Vec<ServingRosterRow>, Error> {
    connection
        .prepare(
            "SELECT s.id, st.first_name || ' ' || st.last_name, st.grade, i.name, i.price,
                 sv.status
             FROM meal_subscription s
             INNER JOIN student st ON s.student_id = st.id
             INNER JOIN meal_item i ON s.item_id = i.id
             LEFT JOIN meal_serving sv ON sv.subscription_id = s.id AND sv.date = :date
             WHERE st.status = 'ACTIVE' AND i.active = 1
             ORDER BY st.grade ASC, st.last_name ASC, st.first_name ASC, i.name ASC",
        )?
        .query_map(&[(":date", &date)], |row| {
            let status_column: Option<String> = row.get(5)?;
            let status = match status_column {
                Some(value) => Some(
                    ServingStatus::from_column(&value)
                        .map_err(|_| rusqlite::Error::InvalidQuery)?,
                ),
                None => None,
            };

            Ok(ServingRosterRow {
                subscription_id: row.get(0)?,
                student_name: row.get(1)?,
                grade: row.get(2)?,
                item_name: row.get(3)?,
                price: row.get(4)?,
                status,
            })
        })?
        .map(|row| row.map_err(Error::SqlError))
        .collect()
}

/// Mark a subscription served for `date` and charge the item price to the
/// student's food account.
///
/// The serving is recorded as pending first, then the charge and the
/// confirmation happen in one SQL transaction. If that transaction fails the
/// serving row is left in the failed state so the checklist shows the tick
/// did not stick, and no charge is made.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the subscription does not exist,
/// - [Error::InactiveMealItem] if the item has been retired,
/// - [Error::AlreadyServed] if the subscription was already served on `date`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn serve_subscription(
    subscription_id: SubscriptionId,
    date: Date,
    connection: &Connection,
) -> Result<ServingOutcome, Error> {
    let (student_id, item_name, price, active): (StudentId, String, f64, bool) = connection
        .prepare(
            "SELECT s.student_id, i.name, i.price, i.active
             FROM meal_subscription s
             INNER JOIN meal_item i ON s.item_id = i.id
             WHERE s.id = :id",
        )?
        .query_row(&[(":id", &subscription_id)], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?;

    if !active {
        return Err(Error::InactiveMealItem(subscription_id));
    }

    let serving_id = record_pending_serving(subscription_id, date, connection)?;

    let confirm = || -> Result<LedgerEntry, Error> {
        let transaction =
            Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

        let entry = append_entry(
            AccountTable::Food,
            NewEntry {
                student_id,
                kind: EntryKind::Charge,
                amount: price,
                date,
                method: None,
                description: format!("Meal: {item_name}"),
                reference: format!("SRV-{serving_id}"),
            },
            date,
            &transaction,
        )?;

        transaction.execute(
            "UPDATE meal_serving SET status = 'CONFIRMED' WHERE id = ?1",
            [serving_id],
        )?;

        transaction.commit()?;

        Ok(entry)
    };

    match confirm() {
        Ok(entry) => Ok(ServingOutcome { serving_id, entry }),
        Err(error) => {
            // Leave a failed marker so the checklist shows the tick did not
            // stick. Best effort: the original error is what matters.
            if let Err(mark_error) = connection.execute(
                "UPDATE meal_serving SET status = 'FAILED' WHERE id = ?1",
                [serving_id],
            ) {
                tracing::error!("could not mark serving {serving_id} failed: {mark_error}");
            }

            Err(error)
        }
    }
}

/// Insert the pending serving row, reusing a failed row from an earlier
/// attempt.
fn record_pending_serving(
    subscription_id: SubscriptionId,
    date: Date,
    connection: &Connection,
) -> Result<ServingId, Error> {
    let inserted = connection
        .prepare(
            "INSERT INTO meal_serving (subscription_id, date, status)
             VALUES (?1, ?2, 'PENDING') RETURNING id",
        )?
        .query_row((subscription_id, date), |row| row.get(0));

    match inserted {
        Ok(serving_id) => Ok(serving_id),
        Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            },
            _,
        )) => {
            let (serving_id, status): (ServingId, String) = connection
                .prepare(
                    "SELECT id, status FROM meal_serving
                     WHERE subscription_id = ?1 AND date = ?2",
                )?
                .query_row((subscription_id, date), |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?;

            if ServingStatus::from_column(&status)? != ServingStatus::Failed {
                return Err(Error::AlreadyServed(subscription_id));
            }

            connection.execute(
                "UPDATE meal_serving SET status = 'PENDING' WHERE id = ?1",
                [serving_id],
            )?;

            Ok(serving_id)
        }
        Err(error) => Err(error.into()),
    }
}

/// Map a database row to a [MealItem].
fn map_meal_item_row(row: &Row) -> Result<MealItem, rusqlite::Error> {
    Ok(MealItem {
        id: row.get(0)?,
        name: row.get(1)?,
        price: row.get(2)?,
        active: row.get(3)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        ledger::{AccountTable, EntryKind, entries_for_student, total_by_kind},
        student::{NewStudent, create_student},
    };

    use super::{
        MealItemUpdate, NewMealItem, ServingStatus, cancel_subscription, create_meal_item,
        delete_meal_item, get_meal_item, list_meal_items, serve_subscription, serving_roster,
        subscribe_student, subscriptions_for_student, update_meal_item,
    };

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

    fn lunch(conn: &Connection) -> i64 {
        create_meal_item(
            NewMealItem {
                name: "Lunch".to_owned(),
                price: 150.0,
            },
            conn,
        )
        .unwrap()
        .id
    }

    #[test]
    fn create_and_list_items() {
        let conn = get_test_connection();
        lunch(&conn);
        create_meal_item(
            NewMealItem {
                name: "Porridge".to_owned(),
                price: 50.0,
            },
            &conn,
        )
        .unwrap();

        let items = list_meal_items(&conn).unwrap();

        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| item.active));
    }

    #[test]
    fn create_rejects_negative_price() {
        let conn = get_test_connection();

        let result = create_meal_item(
            NewMealItem {
                name: "Lunch".to_owned(),
                price: -1.0,
            },
            &conn,
        );

        assert_eq!(result, Err(Error::NegativeAmount(-1.0)));
    }

    #[test]
    fn update_can_retire_an_item() {
        let conn = get_test_connection();
        let item_id = lunch(&conn);

        update_meal_item(
            item_id,
            MealItemUpdate {
                name: "Lunch".to_owned(),
                price: 170.0,
                active: false,
            },
            &conn,
        )
        .unwrap();

        let item = get_meal_item(item_id, &conn).unwrap();
        assert!(!item.active);
        assert_eq!(item.price, 170.0);
    }

    #[test]
    fn delete_fails_for_subscribed_item() {
        let conn = get_test_connection();
        let student_id = insert_test_student(&conn);
        let item_id = lunch(&conn);
        subscribe_student(student_id, item_id, &conn).unwrap();

        assert_eq!(delete_meal_item(item_id, &conn), Err(Error::StillReferenced));
    }

    #[test]
    fn delete_fails_for_missing_item() {
        let conn = get_test_connection();

        assert_eq!(
            delete_meal_item(999, &conn),
            Err(Error::DeleteMissingMealItem)
        );
    }

    #[test]
    fn subscribe_rejects_duplicates_and_retired_items() {
        let conn = get_test_connection();
        let student_id = insert_test_student(&conn);
        let item_id = lunch(&conn);

        subscribe_student(student_id, item_id, &conn).unwrap();
        assert_eq!(
            subscribe_student(student_id, item_id, &conn),
            Err(Error::DuplicateSubscription)
        );

        update_meal_item(
            item_id,
            MealItemUpdate {
                name: "Lunch".to_owned(),
                price: 150.0,
                active: false,
            },
            &conn,
        )
        .unwrap();
        let other_student = create_student(
            NewStudent {
                admission_number: "ADM-002".to_owned(),
                first_name: "Baraka".to_owned(),
                last_name: "Odhiambo".to_owned(),
                grade: 4,
                term: 1,
                guardian_name: "Guardian".to_owned(),
                guardian_phone: "0722000002".to_owned(),
            },
            &conn,
        )
        .unwrap();
        assert_eq!(
            subscribe_student(other_student.id, item_id, &conn),
            Err(Error::InactiveMealItem(item_id))
        );
    }

    #[test]
    fn cancel_removes_the_subscription() {
        let conn = get_test_connection();
        let student_id = insert_test_student(&conn);
        let item_id = lunch(&conn);
        let subscription_id = subscribe_student(student_id, item_id, &conn).unwrap();

        cancel_subscription(subscription_id, &conn).unwrap();

        assert_eq!(
            subscriptions_for_student(student_id, &conn).unwrap(),
            vec![]
        );
        assert_eq!(
            cancel_subscription(subscription_id, &conn),
            Err(Error::DeleteMissingSubscription)
        );
    }

    #[test]
    fn serving_confirms_and_charges_the_food_account() {
        let conn = get_test_connection();
        let student_id = insert_test_student(&conn);
        let item_id = lunch(&conn);
        let subscription_id = subscribe_student(student_id, item_id, &conn).unwrap();
        let today = date!(2025 - 06 - 10);

        let outcome = serve_subscription(subscription_id, today, &conn).unwrap();

        assert_eq!(outcome.entry.amount, 150.0);
        assert_eq!(outcome.entry.kind, EntryKind::Charge);
        assert_eq!(outcome.entry.reference, format!("SRV-{}", outcome.serving_id));

        let entries = entries_for_student(AccountTable::Food, student_id, &conn).unwrap();
        assert_eq!(total_by_kind(&entries, EntryKind::Charge), 150.0);

        let roster = serving_roster(today, &conn).unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].status, Some(ServingStatus::Confirmed));
    }

    #[test]
    fn serving_twice_on_one_day_is_rejected() {
        let conn = get_test_connection();
        let student_id = insert_test_student(&conn);
        let item_id = lunch(&conn);
        let subscription_id = subscribe_student(student_id, item_id, &conn).unwrap();
        let today = date!(2025 - 06 - 10);

        serve_subscription(subscription_id, today, &conn).unwrap();
        let second = serve_subscription(subscription_id, today, &conn);

        assert_eq!(second, Err(Error::AlreadyServed(subscription_id)));

        // The account is only charged once.
        let entries = entries_for_student(AccountTable::Food, student_id, &conn).unwrap();
        assert_eq!(total_by_kind(&entries, EntryKind::Charge), 150.0);
    }

    #[test]
    fn roster_shows_unserved_subscriptions() {
        let conn = get_test_connection();
        let student_id = insert_test_student(&conn);
        let item_id = lunch(&conn);
        subscribe_student(student_id, item_id, &conn).unwrap();

        let roster = serving_roster(date!(2025 - 06 - 10), &conn).unwrap();

        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].status, None);
        assert_eq!(roster[0].item_name, "Lunch");
    }
}
