//! Defines the core data model and database queries for timetable slots.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    database_id::{SlotId, StaffId},
    student::{GRADE_MAX, GRADE_MIN},
};

/// Weekday numbering follows ISO 8601: 1 is Monday, 7 is Sunday. The school
/// week runs Monday to Friday.
pub const WEEKDAY_MIN: i64 = 1;
pub const WEEKDAY_MAX: i64 = 5;

/// The label for a weekday number, e.g. "Monday".
pub fn weekday_label(weekday: i64) -> &'static str {
    match weekday {
        1 => "Monday",
        2 => "Tuesday",
        3 => "Wednesday",
        4 => "Thursday",
        5 => "Friday",
        6 => "Saturday",
        _ => "Sunday",
    }
}

/// One lesson slot in a grade's weekly timetable.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    /// The ID of the slot.
    pub id: SlotId,
    /// The grade the lesson is taught to.
    pub grade: i64,
    /// The weekday, 1 (Monday) to 5 (Friday).
    pub weekday: i64,
    /// The start of the slot as "HH:MM", display-only.
    pub starts_at: String,
    /// The end of the slot as "HH:MM", display-only.
    pub ends_at: String,
    /// The subject taught.
    pub subject: String,
    /// The teacher taking the lesson, if assigned.
    pub staff_id: Option<StaffId>,
    /// The teacher's name, joined in for display.
    pub teacher_name: Option<String>,
}

/// The data needed to create a timetable slot.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSlot {
    /// The grade the lesson is taught to.
    pub grade: i64,
    /// The weekday, 1 (Monday) to 5 (Friday).
    pub weekday: i64,
    /// The start of the slot as "HH:MM".
    pub starts_at: String,
    /// The end of the slot as "HH:MM".
    pub ends_at: String,
    /// The subject taught.
    pub subject: String,
    /// The teacher taking the lesson, if assigned.
    pub staff_id: Option<StaffId>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the timetable slot table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_schedule_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS schedule_slot (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                grade INTEGER NOT NULL,
                weekday INTEGER NOT NULL,
                starts_at TEXT NOT NULL,
                ends_at TEXT NOT NULL,
                subject TEXT NOT NULL,
                staff_id INTEGER,
                FOREIGN KEY(staff_id) REFERENCES staff(id)
                )",
        (),
    )?;

    Ok(())
}

/// Create a timetable slot.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyName] if the subject is blank,
/// - [Error::InvalidGrade] if the grade is out of range,
/// - [Error::InvalidColumnValue] if the weekday is outside the school week,
/// - [Error::InvalidReference] if the teacher does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_slot(slot: NewSlot, connection: &Connection) -> Result<Slot, Error> {
    if slot.subject.trim().is_empty() {
        return Err(Error::EmptyName);
    }

    if !(GRADE_MIN..=GRADE_MAX).contains(&slot.grade) {
        return Err(Error::InvalidGrade(slot.grade));
    }

    if !(WEEKDAY_MIN..=WEEKDAY_MAX).contains(&slot.weekday) {
        return Err(Error::InvalidColumnValue(
            slot.weekday.to_string(),
            "weekday",
        ));
    }

    let slot_id: SlotId = connection
        .prepare(
            "INSERT INTO schedule_slot (grade, weekday, starts_at, ends_at, subject, staff_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING id",
        )?
        .query_row(
            (
                slot.grade,
                slot.weekday,
                &slot.starts_at,
                &slot.ends_at,
                &slot.subject,
                slot.staff_id,
            ),
            |row| row.get(0),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidReference,
            error => Error::from(error),
        })?;

    get_slot(slot_id, connection)
}

/// Retrieve a slot by its `id`, with the teacher's name joined in.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid slot,
/// - or [Error::SqlError] if there is some other SQL error.
fn get_slot(id: SlotId, connection: &Connection) -> Result<Slot, Error> {
    let slot = connection
        .prepare(
            "SELECT sl.id, sl.grade, sl.weekday, sl.starts_at, sl.ends_at, sl.subject,
                 sl.staff_id, st.name
             FROM schedule_slot sl
             LEFT JOIN staff st ON sl.staff_id = st.id
             WHERE sl.id = :id",
        )?
        .query_row(&[(":id", &id)], map_slot_row)?;

    Ok(slot)
}

/// Delete a timetable slot.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingSlot] if `id` does not refer to a valid slot,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_slot(id: SlotId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM schedule_slot WHERE id = :id", &[(":id", &id)])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingSlot);
    }

    Ok(())
}

/// Retrieve a grade's slots ordered by weekday and start time, ready to be
/// bucketed into day columns.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn slots_for_grade(grade: i64, connection: &Connection) -> Result<Vec<Slot>, Error> {
    connection
        .prepare(
            "SELECT sl.id, sl.grade, sl.weekday, sl.starts_at, sl.ends_at, sl.subject,
                 sl.staff_id, st.name
             FROM schedule_slot sl
             LEFT JOIN staff st ON sl.staff_id = st.id
             WHERE sl.grade = :grade
             ORDER BY sl.weekday ASC, sl.starts_at ASC, sl.id ASC",
        )?
        .query_map(&[(":grade", &grade)], map_slot_row)?
        .map(|slot| slot.map_err(Error::SqlError))
        .collect()
}

/// Map a database row to a [Slot].
fn map_slot_row(row: &Row) -> Result<Slot, rusqlite::Error> {
    Ok(Slot {
        id: row.get(0)?,
        grade: row.get(1)?,
        weekday: row.get(2)?,
        starts_at: row.get(3)?,
        ends_at: row.get(4)?,
        subject: row.get(5)?,
        staff_id: row.get(6)?,
        teacher_name: row.get(7)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        ledger::group_by_key,
        staff::{NewStaff, StaffRole, create_staff},
    };

    use super::{NewSlot, create_slot, delete_slot, slots_for_grade, weekday_label};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn slot(grade: i64, weekday: i64, starts_at: &str, subject: &str) -> NewSlot {
        NewSlot {
            grade,
            weekday,
            starts_at: starts_at.to_owned(),
            ends_at: "09:00".to_owned(),
            subject: subject.to_owned(),
            staff_id: None,
        }
    }

    #[test]
    fn create_joins_teacher_name() {
        let conn = get_test_connection();
        let teacher = create_staff(
            NewStaff {
                name: "Beatrice Njeri".to_owned(),
                role: StaffRole::Teacher,
                email: "njeri@school.ac.ke".to_owned(),
                phone: "0711000000".to_owned(),
            },
            &conn,
        )
        .unwrap();

        let created = create_slot(
            NewSlot {
                staff_id: Some(teacher.id),
                ..slot(4, 1, "08:00", "Mathematics")
            },
            &conn,
        )
        .unwrap();

        assert_eq!(created.teacher_name.as_deref(), Some("Beatrice Njeri"));
    }

    #[test]
    fn create_rejects_weekend_slots() {
        let conn = get_test_connection();

        let result = create_slot(slot(4, 6, "08:00", "Mathematics"), &conn);

        assert_eq!(
            result,
            Err(Error::InvalidColumnValue("6".to_owned(), "weekday"))
        );
    }

    #[test]
    fn create_rejects_unknown_teacher() {
        let conn = get_test_connection();

        let result = create_slot(
            NewSlot {
                staff_id: Some(999),
                ..slot(4, 1, "08:00", "Mathematics")
            },
            &conn,
        );

        assert_eq!(result, Err(Error::InvalidReference));
    }

    #[test]
    fn slots_bucket_by_weekday_in_order() {
        let conn = get_test_connection();
        create_slot(slot(4, 2, "08:00", "English"), &conn).unwrap();
        create_slot(slot(4, 1, "10:00", "Science"), &conn).unwrap();
        create_slot(slot(4, 1, "08:00", "Mathematics"), &conn).unwrap();
        create_slot(slot(5, 1, "08:00", "Mathematics"), &conn).unwrap();

        let slots = slots_for_grade(4, &conn).unwrap();
        let days = group_by_key(slots, |slot| weekday_label(slot.weekday));

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].0, "Monday");
        let monday_subjects: Vec<&str> = days[0]
            .1
            .iter()
            .map(|slot| slot.subject.as_str())
            .collect();
        assert_eq!(monday_subjects, vec!["Mathematics", "Science"]);
        assert_eq!(days[1].0, "Tuesday");
    }

    #[test]
    fn delete_removes_the_slot() {
        let conn = get_test_connection();
        let created = create_slot(slot(4, 1, "08:00", "Mathematics"), &conn).unwrap();

        delete_slot(created.id, &conn).unwrap();

        assert_eq!(slots_for_grade(4, &conn).unwrap(), vec![]);
        assert_eq!(delete_slot(created.id, &conn), Err(Error::DeleteMissingSlot));
    }
}
