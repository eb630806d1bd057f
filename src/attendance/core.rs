//! Defines the core data model and database queries for attendance.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::StudentId,
    ledger::percent_rate,
    student::{Student, students_in_grade},
};

/// A student's attendance state for one school day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttendanceStatus {
    /// In class on time.
    Present,
    /// Arrived after the register was taken.
    Late,
    /// Not in school.
    Absent,
}

impl AttendanceStatus {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "PRESENT",
            AttendanceStatus::Late => "LATE",
            AttendanceStatus::Absent => "ABSENT",
        }
    }

    pub(crate) fn from_column(value: &str) -> Result<Self, Error> {
        match value {
            "PRESENT" => Ok(AttendanceStatus::Present),
            "LATE" => Ok(AttendanceStatus::Late),
            "ABSENT" => Ok(AttendanceStatus::Absent),
            other => Err(Error::InvalidColumnValue(other.to_owned(), "status")),
        }
    }

    /// The label shown on the attendance sheet.
    pub fn display_name(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Late => "Late",
            AttendanceStatus::Absent => "Absent",
        }
    }
}

/// One student's mark in a bulk attendance submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceMark {
    /// The student being marked.
    pub student_id: StudentId,
    /// The student's attendance state for the day.
    pub status: AttendanceStatus,
}

/// One row of the attendance sheet for a grade and date.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    /// The student.
    pub student: Student,
    /// The mark recorded for the date, or `None` if the register has not
    /// been taken for this student yet.
    pub status: Option<AttendanceStatus>,
}

/// How many students hold each status for one date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceCounts {
    /// Students marked present.
    pub present: u64,
    /// Students marked late.
    pub late: u64,
    /// Students marked absent.
    pub absent: u64,
}

impl AttendanceCounts {
    /// The number of marks recorded.
    pub fn total(&self) -> u64 {
        self.present + self.late + self.absent
    }
}

/// The attendance rate for a set of counts: the share of marked students who
/// were present on time, as a percentage with one decimal place.
pub fn attendance_rate(counts: AttendanceCounts) -> f64 {
    percent_rate(counts.present as f64, counts.total() as f64)
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the attendance table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_attendance_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS attendance_record (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                student_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                status TEXT NOT NULL,
                UNIQUE(student_id, date),
                FOREIGN KEY(student_id) REFERENCES student(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_date ON attendance_record(date);",
        (),
    )?;

    Ok(())
}

/// Record the attendance marks for one day.
///
/// Marking is an upsert: re-submitting a grade's register for the same day
/// overwrites the earlier marks. The whole batch is applied in one SQL
/// transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidReference] if a mark refers to a missing student,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn mark_attendance_batch(
    marks: &[AttendanceMark],
    date: Date,
    connection: &Connection,
) -> Result<usize, Error> {
    let transaction = rusqlite::Transaction::new_unchecked(
        connection,
        rusqlite::TransactionBehavior::Immediate,
    )?;

    {
        let mut statement = transaction.prepare(
            "INSERT INTO attendance_record (student_id, date, status)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(student_id, date) DO UPDATE SET status = excluded.status",
        )?;

        for mark in marks {
            statement
                .execute((mark.student_id, date, mark.status.as_str()))
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
        }
    }

    transaction.commit()?;

    Ok(marks.len())
}

/// Build the attendance sheet for a grade and date: every active student in
/// the grade with their recorded mark, in register order.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn grade_attendance_sheet(
    grade: i64,
    date: Date,
    connection: &Connection,
) -> Result<Vec<SheetRow>, Error> {
    let students = students_in_grade(grade, connection)?;

    let mut rows = Vec::with_capacity(students.len());
    let mut statement = connection
        .prepare("SELECT status FROM attendance_record WHERE student_id = ?1 AND date = ?2")?;

    for student in students {
        let status: Option<String> = match statement
            .query_row((student.id, date), |row| row.get(0))
        {
            Ok(status) => Some(status),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(error) => return Err(error.into()),
        };

        let status = status
            .map(|value| AttendanceStatus::from_column(&value))
            .transpose()?;

        rows.push(SheetRow { student, status });
    }

    Ok(rows)
}

/// Count the marks recorded across the whole school for one date.
///
/// Only active students are counted, so withdrawing a student removes them
/// from historic rates as well.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn school_attendance_counts(
    date: Date,
    connection: &Connection,
) -> Result<AttendanceCounts, Error> {
    let mut counts = AttendanceCounts::default();

    let mut statement = connection.prepare(
        "SELECT a.status, COUNT(a.id)
         FROM attendance_record a
         INNER JOIN student s ON a.student_id = s.id
         WHERE a.date = :date AND s.status = 'ACTIVE'
         GROUP BY a.status",
    )?;

    let rows = statement.query_map(&[(":date", &date)], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
    })?;

    for row in rows {
        let (status, count) = row.map_err(Error::SqlError)?;
        match AttendanceStatus::from_column(&status)? {
            AttendanceStatus::Present => counts.present = count,
            AttendanceStatus::Late => counts.late = count,
            AttendanceStatus::Absent => counts.absent = count,
        }
    }

    Ok(counts)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod attendance_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        db::initialize,
        student::{NewStudent, create_student},
    };

    use super::{
        AttendanceCounts, AttendanceMark, AttendanceStatus, attendance_rate,
        grade_attendance_sheet, mark_attendance_batch, school_attendance_counts,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn insert_grade(conn: &Connection, grade: i64, count: usize) -> Vec<i64> {
        (0..count)
            .map(|i| {
                create_student(
                    NewStudent {
                        admission_number: format!("ADM-{grade}{i:02}"),
                        first_name: format!("Student{i}"),
                        last_name: "Test".to_owned(),
                        grade,
                        term: 1,
                        guardian_name: "Guardian".to_owned(),
                        guardian_phone: "0700000000".to_owned(),
                    },
                    conn,
                )
                .unwrap()
                .id
            })
            .collect()
    }

    #[test]
    fn batch_marking_records_every_student() {
        let conn = get_test_connection();
        let students = insert_grade(&conn, 4, 3);
        let today = date!(2025 - 06 - 10);

        let marks: Vec<AttendanceMark> = students
            .iter()
            .map(|&student_id| AttendanceMark {
                student_id,
                status: AttendanceStatus::Present,
            })
            .collect();

        let marked = mark_attendance_batch(&marks, today, &conn).unwrap();

        assert_eq!(marked, 3);
        let sheet = grade_attendance_sheet(4, today, &conn).unwrap();
        assert!(
            sheet
                .iter()
                .all(|row| row.status == Some(AttendanceStatus::Present))
        );
    }

    #[test]
    fn re_marking_overwrites_the_earlier_status() {
        let conn = get_test_connection();
        let students = insert_grade(&conn, 4, 1);
        let today = date!(2025 - 06 - 10);
        let student_id = students[0];

        mark_attendance_batch(
            &[AttendanceMark {
                student_id,
                status: AttendanceStatus::Absent,
            }],
            today,
            &conn,
        )
        .unwrap();
        mark_attendance_batch(
            &[AttendanceMark {
                student_id,
                status: AttendanceStatus::Late,
            }],
            today,
            &conn,
        )
        .unwrap();

        let sheet = grade_attendance_sheet(4, today, &conn).unwrap();
        assert_eq!(sheet[0].status, Some(AttendanceStatus::Late));

        let counts = school_attendance_counts(today, &conn).unwrap();
        assert_eq!(counts.total(), 1);
        assert_eq!(counts.late, 1);
    }

    #[test]
    fn sheet_shows_unmarked_students() {
        let conn = get_test_connection();
        insert_grade(&conn, 4, 2);

        let sheet = grade_attendance_sheet(4, date!(2025 - 06 - 10), &conn).unwrap();

        assert_eq!(sheet.len(), 2);
        assert!(sheet.iter().all(|row| row.status.is_none()));
    }

    #[test]
    fn rate_counts_only_present_students() {
        // 30 students: 27 present, 2 late, 1 absent gives a 90.0% rate.
        let counts = AttendanceCounts {
            present: 27,
            late: 2,
            absent: 1,
        };

        assert_eq!(attendance_rate(counts), 90.0);
    }

    #[test]
    fn rate_of_empty_register_is_zero() {
        assert_eq!(attendance_rate(AttendanceCounts::default()), 0.0);
    }

    #[test]
    fn school_counts_span_grades() {
        let conn = get_test_connection();
        let grade_four = insert_grade(&conn, 4, 2);
        let grade_five = insert_grade(&conn, 5, 1);
        let today = date!(2025 - 06 - 10);

        let mut marks: Vec<AttendanceMark> = grade_four
            .iter()
            .map(|&student_id| AttendanceMark {
                student_id,
                status: AttendanceStatus::Present,
            })
            .collect();
        marks.push(AttendanceMark {
            student_id: grade_five[0],
            status: AttendanceStatus::Absent,
        });

        mark_attendance_batch(&marks, today, &conn).unwrap();

        let counts = school_attendance_counts(today, &conn).unwrap();
        assert_eq!(counts.present, 2);
        assert_eq!(counts.absent, 1);
        assert_eq!(attendance_rate(counts), 66.7);
    }
}
