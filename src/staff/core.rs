//! Defines the core data model and database queries for staff records.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::StaffId, password::PasswordHash};

/// The role a staff member holds at the school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StaffRole {
    /// Classroom teacher.
    Teacher,
    /// Office and management staff.
    Admin,
    /// Kitchen, transport and grounds staff.
    Support,
}

impl StaffRole {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            StaffRole::Teacher => "TEACHER",
            StaffRole::Admin => "ADMIN",
            StaffRole::Support => "SUPPORT",
        }
    }

    pub(crate) fn from_column(value: &str) -> Result<Self, Error> {
        match value {
            "TEACHER" => Ok(StaffRole::Teacher),
            "ADMIN" => Ok(StaffRole::Admin),
            "SUPPORT" => Ok(StaffRole::Support),
            other => Err(Error::InvalidColumnValue(other.to_owned(), "role")),
        }
    }

    /// The label shown on the staff pages.
    pub fn display_name(self) -> &'static str {
        match self {
            StaffRole::Teacher => "Teacher",
            StaffRole::Admin => "Admin",
            StaffRole::Support => "Support",
        }
    }
}

/// A staff member's record.
#[derive(Debug, Clone, PartialEq)]
pub struct Staff {
    /// The ID of the staff member.
    pub id: StaffId,
    /// The staff member's full name.
    pub name: String,
    /// The role the staff member holds.
    pub role: StaffRole,
    /// The staff member's email, unique per record. Doubles as the sign-in
    /// name for staff with a password.
    pub email: String,
    /// The staff member's phone number.
    pub phone: String,
    /// The sign-in password hash. Staff without one cannot log in.
    pub password_hash: Option<PasswordHash>,
}

/// The data needed to add a staff member.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStaff {
    /// The staff member's full name.
    pub name: String,
    /// The role the staff member holds.
    pub role: StaffRole,
    /// The staff member's email.
    pub email: String,
    /// The staff member's phone number.
    pub phone: String,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the staff table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_staff_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS staff (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                role TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                phone TEXT NOT NULL,
                password_hash TEXT
                )",
        (),
    )?;

    Ok(())
}

/// Add a staff member.
///
/// New staff have no password; sign-in access is granted separately with
/// [set_staff_password].
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyName] if the name is blank,
/// - [Error::DuplicateEmail] if the email is taken,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_staff(staff: NewStaff, connection: &Connection) -> Result<Staff, Error> {
    if staff.name.trim().is_empty() {
        return Err(Error::EmptyName);
    }

    connection
        .prepare(
            "INSERT INTO staff (name, role, email, phone)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, name, role, email, phone, password_hash",
        )?
        .query_row(
            (
                &staff.name,
                staff.role.as_str(),
                &staff.email,
                &staff.phone,
            ),
            map_staff_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateEmail(staff.email.clone()),
            error => error.into(),
        })
}

/// Retrieve a staff member by their `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid staff member,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_staff_member(id: StaffId, connection: &Connection) -> Result<Staff, Error> {
    let staff = connection
        .prepare(
            "SELECT id, name, role, email, phone, password_hash FROM staff WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_staff_row)?;

    Ok(staff)
}

/// Retrieve a staff member by their sign-in email.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if no staff member has the email,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_staff_by_email(email: &str, connection: &Connection) -> Result<Staff, Error> {
    let staff = connection
        .prepare(
            "SELECT id, name, role, email, phone, password_hash FROM staff WHERE email = :email",
        )?
        .query_row(&[(":email", &email)], map_staff_row)?;

    Ok(staff)
}

/// Set or replace a staff member's sign-in password hash.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if no staff member has the email,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn set_staff_password(
    email: &str,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE staff SET password_hash = ?1 WHERE email = ?2",
        (password_hash.to_string(), email),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Retrieve staff whose name or email contains `search`, ordered by name.
///
/// An empty search returns the whole directory.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn search_staff(search: &str, connection: &Connection) -> Result<Vec<Staff>, Error> {
    connection
        .prepare(
            "SELECT id, name, role, email, phone, password_hash FROM staff
             WHERE name LIKE '%' || :search || '%' OR email LIKE '%' || :search || '%'
             ORDER BY name ASC, id ASC",
        )?
        .query_map(&[(":search", &search.trim())], map_staff_row)?
        .map(|staff| staff.map_err(Error::SqlError))
        .collect()
}

/// Retrieve all teachers, ordered by name. Used by the timetable slot form.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn teachers(connection: &Connection) -> Result<Vec<Staff>, Error> {
    connection
        .prepare(
            "SELECT id, name, role, email, phone, password_hash FROM staff
             WHERE role = 'TEACHER'
             ORDER BY name ASC, id ASC",
        )?
        .query_map([], map_staff_row)?
        .map(|staff| staff.map_err(Error::SqlError))
        .collect()
}

/// Map a database row to a [Staff].
fn map_staff_row(row: &Row) -> Result<Staff, rusqlite::Error> {
    let role_column: String = row.get(2)?;
    let role = StaffRole::from_column(&role_column).map_err(|_| rusqlite::Error::InvalidQuery)?;

    let password_hash: Option<String> = row.get(5)?;

    Ok(Staff {
        id: row.get(0)?,
        name: row.get(1)?,
        role,
        email: row.get(3)?,
        phone: row.get(4)?,
        password_hash: password_hash.map(PasswordHash::new_unchecked),
    })
}

// ============================================================================
// TESTS
// ============================================================================
