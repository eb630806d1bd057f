//! Defines the core data model and database queries for students.

use rusqlite::{Connection, Row, types::Value};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::StudentId};

/// The lowest grade taught at the school.
pub const GRADE_MIN: i64 = 1;
/// The highest grade taught at the school. Students promoted out of this
/// grade graduate.
pub const GRADE_MAX: i64 = 9;

const TERM_MIN: i64 = 1;
const TERM_MAX: i64 = 3;

/// Whether a student is currently enrolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StudentStatus {
    /// Currently enrolled.
    Active,
    /// Completed the final grade.
    Graduated,
    /// Left before completing the final grade.
    Withdrawn,
}

impl StudentStatus {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            StudentStatus::Active => "ACTIVE",
            StudentStatus::Graduated => "GRADUATED",
            StudentStatus::Withdrawn => "WITHDRAWN",
        }
    }

    pub(crate) fn from_column(value: &str) -> Result<Self, Error> {
        match value {
            "ACTIVE" => Ok(StudentStatus::Active),
            "GRADUATED" => Ok(StudentStatus::Graduated),
            "WITHDRAWN" => Ok(StudentStatus::Withdrawn),
            other => Err(Error::InvalidColumnValue(other.to_owned(), "status")),
        }
    }

    /// The label shown on list and detail pages.
    pub fn display_name(self) -> &'static str {
        match self {
            StudentStatus::Active => "Active",
            StudentStatus::Graduated => "Graduated",
            StudentStatus::Withdrawn => "Withdrawn",
        }
    }
}

/// A student's admission record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    /// The ID of the student.
    pub id: StudentId,
    /// The school-assigned admission number, unique per student.
    pub admission_number: String,
    /// The student's first name.
    pub first_name: String,
    /// The student's last name.
    pub last_name: String,
    /// The grade the student is in, between [GRADE_MIN] and [GRADE_MAX].
    pub grade: i64,
    /// The term the student is in, between 1 and 3.
    pub term: i64,
    /// Whether the student is currently enrolled.
    pub status: StudentStatus,
    /// The guardian's name.
    pub guardian_name: String,
    /// The guardian's phone number, used for fee and transport queries.
    pub guardian_phone: String,
}

impl Student {
    /// The student's full name as shown on pages.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// The label for a grade, e.g. "Grade 4".
pub fn grade_label(grade: i64) -> String {
    format!("Grade {grade}")
}

/// The data needed to admit a new student.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStudent {
    /// The school-assigned admission number.
    pub admission_number: String,
    /// The student's first name.
    pub first_name: String,
    /// The student's last name.
    pub last_name: String,
    /// The grade to admit the student into.
    pub grade: i64,
    /// The current term.
    pub term: i64,
    /// The guardian's name.
    pub guardian_name: String,
    /// The guardian's phone number.
    pub guardian_phone: String,
}

/// The editable fields of a student record.
///
/// The admission number is immutable once assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentUpdate {
    /// The student's first name.
    pub first_name: String,
    /// The student's last name.
    pub last_name: String,
    /// The grade the student is in.
    pub grade: i64,
    /// The term the student is in.
    pub term: i64,
    /// Whether the student is currently enrolled.
    pub status: StudentStatus,
    /// The guardian's name.
    pub guardian_name: String,
    /// The guardian's phone number.
    pub guardian_phone: String,
}

fn validate_grade(grade: i64) -> Result<(), Error> {
    if (GRADE_MIN..=GRADE_MAX).contains(&grade) {
        Ok(())
    } else {
        Err(Error::InvalidGrade(grade))
    }
}

fn validate_term(term: i64) -> Result<(), Error> {
    if (TERM_MIN..=TERM_MAX).contains(&term) {
        Ok(())
    } else {
        Err(Error::InvalidTerm(term))
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the student table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_student_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS student (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                admission_number TEXT NOT NULL UNIQUE,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                grade INTEGER NOT NULL,
                term INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'ACTIVE',
                guardian_name TEXT NOT NULL,
                guardian_phone TEXT NOT NULL
                )",
        (),
    )?;

    // Composite index used by the list page's grade/status filters.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_student_status_grade ON student(status, grade);",
        (),
    )?;

    Ok(())
}

/// Admit a new student.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyName] if a name field is blank,
/// - [Error::InvalidGrade] or [Error::InvalidTerm] for out-of-range values,
/// - [Error::DuplicateAdmissionNumber] if the admission number is taken,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_student(student: NewStudent, connection: &Connection) -> Result<Student, Error> {
    if student.admission_number.trim().is_empty()
        || student.first_name.trim().is_empty()
        || student.last_name.trim().is_empty()
    {
        return Err(Error::EmptyName);
    }

    validate_grade(student.grade)?;
    validate_term(student.term)?;

    connection
        .prepare(
            "INSERT INTO student
             (admission_number, first_name, last_name, grade, term, status, guardian_name, guardian_phone)
             VALUES (?1, ?2, ?3, ?4, ?5, 'ACTIVE', ?6, ?7)
             RETURNING id, admission_number, first_name, last_name, grade, term, status,
                 guardian_name, guardian_phone",
        )?
        .query_row(
            (
                &student.admission_number,
                &student.first_name,
                &student.last_name,
                student.grade,
                student.term,
                &student.guardian_name,
                &student.guardian_phone,
            ),
            map_student_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateAdmissionNumber(student.admission_number.clone()),
            error => error.into(),
        })
}

/// Retrieve a student from the database by their `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid student,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_student(id: StudentId, connection: &Connection) -> Result<Student, Error> {
    let student = connection
        .prepare(
            "SELECT id, admission_number, first_name, last_name, grade, term, status,
                 guardian_name, guardian_phone
             FROM student WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_student_row)?;

    Ok(student)
}

/// Overwrite the editable fields of a student record.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyName], [Error::InvalidGrade] or [Error::InvalidTerm] for
///   invalid fields,
/// - [Error::UpdateMissingStudent] if `id` does not refer to a valid student,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_student(
    id: StudentId,
    update: StudentUpdate,
    connection: &Connection,
) -> Result<(), Error> {
    if update.first_name.trim().is_empty() || update.last_name.trim().is_empty() {
        return Err(Error::EmptyName);
    }

    validate_grade(update.grade)?;
    validate_term(update.term)?;

    let rows_affected = connection.execute(
        "UPDATE student
         SET first_name = ?1, last_name = ?2, grade = ?3, term = ?4, status = ?5,
             guardian_name = ?6, guardian_phone = ?7
         WHERE id = ?8",
        (
            &update.first_name,
            &update.last_name,
            update.grade,
            update.term,
            update.status.as_str(),
            &update.guardian_name,
            &update.guardian_phone,
            id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingStudent);
    }

    Ok(())
}

/// The filters accepted by the student list.
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    /// Case-insensitive substring match against the admission number and
    /// names.
    pub search: Option<String>,
    /// Restrict to one enrollment status.
    pub status: Option<StudentStatus>,
}

/// Build the WHERE clause and parameters for `filter`.
fn filter_clause(filter: &StudentFilter) -> (String, Vec<Value>) {
    let mut conditions: Vec<&str> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(search) = &filter.search
        && !search.trim().is_empty()
    {
        conditions.push(
            "(admission_number LIKE '%' || ?1 || '%' \
             OR first_name LIKE '%' || ?1 || '%' \
             OR last_name LIKE '%' || ?1 || '%')",
        );
        params.push(Value::Text(search.trim().to_owned()));
    }

    if let Some(status) = filter.status {
        conditions.push(if params.is_empty() {
            "status = ?1"
        } else {
            "status = ?2"
        });
        params.push(Value::Text(status.as_str().to_owned()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, params)
}

/// Count the students matching `filter` across all pages.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn count_students(filter: &StudentFilter, connection: &Connection) -> Result<u64, Error> {
    let (where_clause, params) = filter_clause(filter);

    connection
        .prepare(&format!("SELECT COUNT(id) FROM student {where_clause}"))?
        .query_row(rusqlite::params_from_iter(params.iter()), |row| row.get(0))
        .map_err(|error| error.into())
}

/// Retrieve one page of students matching `filter`, ordered by grade and
/// then name.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn list_students(
    filter: &StudentFilter,
    limit: u64,
    offset: u64,
    connection: &Connection,
) -> Result<Vec<Student>, Error> {
    let (where_clause, params) = filter_clause(filter);

    connection
        .prepare(&format!(
            "SELECT id, admission_number, first_name, last_name, grade, term, status,
                 guardian_name, guardian_phone
             FROM student {where_clause}
             ORDER BY grade ASC, last_name ASC, first_name ASC, id ASC
             LIMIT {limit} OFFSET {offset}"
        ))?
        .query_map(rusqlite::params_from_iter(params.iter()), map_student_row)?
        .map(|student| student.map_err(Error::SqlError))
        .collect()
}

/// The result of a bulk academic-year transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromotionOutcome {
    /// Students moved up one grade.
    pub promoted: usize,
    /// Students in the final grade marked as graduated.
    pub graduated: usize,
}

/// Move every active student up one grade, graduating the final grade.
///
/// This is the irreversible end-of-year transition. The graduation and the
/// grade increment happen in one SQL transaction so a failure part-way leaves
/// the school untouched.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn promote_students(connection: &Connection) -> Result<PromotionOutcome, Error> {
    let tx = rusqlite::Transaction::new_unchecked(
        connection,
        rusqlite::TransactionBehavior::Immediate,
    )?;

    let graduated = tx.execute(
        "UPDATE student SET status = 'GRADUATED' WHERE status = 'ACTIVE' AND grade = ?1",
        [GRADE_MAX],
    )?;

    let promoted = tx.execute(
        "UPDATE student SET grade = grade + 1, term = 1 WHERE status = 'ACTIVE'",
        (),
    )?;

    tx.commit()?;

    Ok(PromotionOutcome {
        promoted,
        graduated,
    })
}

/// Set the current term for every active student.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidTerm] if `term` is out of range,
/// - or [Error::SqlError] if there is an SQL error.
pub fn set_current_term(term: i64, connection: &Connection) -> Result<usize, Error> {
    validate_term(term)?;

    connection
        .execute(
            "UPDATE student SET term = ?1 WHERE status = 'ACTIVE'",
            [term],
        )
        .map_err(|error| error.into())
}

/// Count the students currently enrolled.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn count_active_students(connection: &Connection) -> Result<u64, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM student WHERE status = 'ACTIVE'",
            [],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Retrieve the active students in a grade, ordered by name.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn students_in_grade(grade: i64, connection: &Connection) -> Result<Vec<Student>, Error> {
    connection
        .prepare(
            "SELECT id, admission_number, first_name, last_name, grade, term, status,
                 guardian_name, guardian_phone
             FROM student WHERE status = 'ACTIVE' AND grade = :grade
             ORDER BY last_name ASC, first_name ASC, id ASC",
        )?
        .query_map(&[(":grade", &grade)], map_student_row)?
        .map(|student| student.map_err(Error::SqlError))
        .collect()
}

/// Map a database row to a [Student].
fn map_student_row(row: &Row) -> Result<Student, rusqlite::Error> {
    let status_column: String = row.get(6)?;
    let status =
        StudentStatus::from_column(&status_column).map_err(|_| rusqlite::Error::InvalidQuery)?;

    Ok(Student {
        id: row.get(0)?,
        admission_number: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        grade: row.get(4)?,
        term: row.get(5)?,
        status,
        guardian_name: row.get(7)?,
        guardian_phone: row.get(8)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;

    use crate::{Error, db::initialize, student::StudentStatus};

    use super::{
        GRADE_MAX, NewStudent, StudentFilter, StudentUpdate, count_active_students,
        count_students, create_student, get_student, list_students, promote_students,
        set_current_term, students_in_grade, update_student,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn new_student(admission_number: &str, last_name: &str, grade: i64) -> NewStudent {
        NewStudent {
            admission_number: admission_number.to_owned(),
            first_name: "Test".to_owned(),
            last_name: last_name.to_owned(),
            grade,
            term: 1,
            guardian_name: "Guardian".to_owned(),
            guardian_phone: "0700000000".to_owned(),
        }
    }

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();

        let student = create_student(new_student("ADM-001", "Otieno", 4), &conn).unwrap();

        assert!(student.id > 0);
        assert_eq!(student.status, StudentStatus::Active);
        assert_eq!(student.grade, 4);
    }

    #[test]
    fn create_fails_on_duplicate_admission_number() {
        let conn = get_test_connection();
        create_student(new_student("ADM-001", "Otieno", 4), &conn).unwrap();

        let duplicate = create_student(new_student("ADM-001", "Mwangi", 5), &conn);

        assert_eq!(
            duplicate,
            Err(Error::DuplicateAdmissionNumber("ADM-001".to_owned()))
        );
    }

    #[test]
    fn create_fails_on_invalid_grade() {
        let conn = get_test_connection();

        let result = create_student(new_student("ADM-001", "Otieno", 13), &conn);

        assert_eq!(result, Err(Error::InvalidGrade(13)));
    }

    #[test]
    fn create_fails_on_blank_name() {
        let conn = get_test_connection();

        let result = create_student(new_student("ADM-001", "  ", 4), &conn);

        assert_eq!(result, Err(Error::EmptyName));
    }

    #[test]
    fn update_overwrites_editable_fields() {
        let conn = get_test_connection();
        let student = create_student(new_student("ADM-001", "Otieno", 4), &conn).unwrap();

        update_student(
            student.id,
            StudentUpdate {
                first_name: "Atieno".to_owned(),
                last_name: "Otieno".to_owned(),
                grade: 5,
                term: 2,
                status: StudentStatus::Withdrawn,
                guardian_name: "Guardian".to_owned(),
                guardian_phone: "0700000001".to_owned(),
            },
            &conn,
        )
        .unwrap();

        let got = get_student(student.id, &conn).unwrap();
        assert_eq!(got.first_name, "Atieno");
        assert_eq!(got.grade, 5);
        assert_eq!(got.status, StudentStatus::Withdrawn);
        assert_eq!(got.admission_number, "ADM-001");
    }

    #[test]
    fn update_fails_on_missing_student() {
        let conn = get_test_connection();

        let result = update_student(
            999,
            StudentUpdate {
                first_name: "Atieno".to_owned(),
                last_name: "Otieno".to_owned(),
                grade: 5,
                term: 2,
                status: StudentStatus::Active,
                guardian_name: "Guardian".to_owned(),
                guardian_phone: "0700000001".to_owned(),
            },
            &conn,
        );

        assert_eq!(result, Err(Error::UpdateMissingStudent));
    }

    #[test]
    fn list_filters_by_search_and_status() {
        let conn = get_test_connection();
        create_student(new_student("ADM-001", "Otieno", 4), &conn).unwrap();
        create_student(new_student("ADM-002", "Mwangi", 5), &conn).unwrap();
        let withdrawn = create_student(new_student("ADM-003", "Otieno", 6), &conn).unwrap();
        update_student(
            withdrawn.id,
            StudentUpdate {
                first_name: withdrawn.first_name.clone(),
                last_name: withdrawn.last_name.clone(),
                grade: withdrawn.grade,
                term: withdrawn.term,
                status: StudentStatus::Withdrawn,
                guardian_name: withdrawn.guardian_name.clone(),
                guardian_phone: withdrawn.guardian_phone.clone(),
            },
            &conn,
        )
        .unwrap();

        let filter = StudentFilter {
            search: Some("Otieno".to_owned()),
            status: Some(StudentStatus::Active),
        };
        let students = list_students(&filter, 20, 0, &conn).unwrap();

        assert_eq!(count_students(&filter, &conn).unwrap(), 1);
        assert_eq!(students[0].admission_number, "ADM-001");
    }

    #[test]
    fn list_pages_through_results() {
        let conn = get_test_connection();
        for i in 1..=25 {
            create_student(new_student(&format!("ADM-{i:03}"), "Student", 4), &conn).unwrap();
        }

        let students = list_students(&StudentFilter::default(), 20, 20, &conn).unwrap();

        assert_eq!(count_students(&StudentFilter::default(), &conn).unwrap(), 25);
        assert_eq!(students.len(), 5);
    }

    #[test]
    fn promotion_moves_grades_up_and_graduates_the_top() {
        let conn = get_test_connection();
        let junior = create_student(new_student("ADM-001", "Junior", 4), &conn).unwrap();
        let senior = create_student(new_student("ADM-002", "Senior", GRADE_MAX), &conn).unwrap();

        let outcome = promote_students(&conn).unwrap();

        assert_eq!(outcome.graduated, 1);
        assert_eq!(outcome.promoted, 1);
        let junior = get_student(junior.id, &conn).unwrap();
        assert_eq!(junior.grade, 5);
        assert_eq!(junior.term, 1);
        let senior = get_student(senior.id, &conn).unwrap();
        assert_eq!(senior.grade, GRADE_MAX);
        assert_eq!(senior.status, StudentStatus::Graduated);
    }

    #[test]
    fn term_update_skips_inactive_students() {
        let conn = get_test_connection();
        create_student(new_student("ADM-001", "Junior", 4), &conn).unwrap();
        create_student(new_student("ADM-002", "Senior", GRADE_MAX), &conn).unwrap();
        promote_students(&conn).unwrap();

        let updated = set_current_term(2, &conn).unwrap();

        assert_eq!(updated, 1);
    }

    #[test]
    fn term_update_rejects_out_of_range_term() {
        let conn = get_test_connection();

        assert_eq!(set_current_term(4, &conn), Err(Error::InvalidTerm(4)));
    }

    #[test]
    fn grade_roster_is_sorted_by_name() {
        let conn = get_test_connection();
        create_student(new_student("ADM-001", "Wekesa", 4), &conn).unwrap();
        create_student(new_student("ADM-002", "Achieng", 4), &conn).unwrap();
        create_student(new_student("ADM-003", "Other", 5), &conn).unwrap();

        let roster = students_in_grade(4, &conn).unwrap();

        let names: Vec<&str> = roster
            .iter()
            .map(|student| student.last_name.as_str())
            .collect();
        assert_eq!(names, vec!["Achieng", "Wekesa"]);
        assert_eq!(count_active_students(&conn).unwrap(), 3);
    }
}
