//! Defines the core data models and database queries for the transport fleet.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::{AssignmentId, DriverId, RouteId, StudentId, VehicleId},
};

// ============================================================================
// MODELS
// ============================================================================

/// A driver employed by the school.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    /// The ID of the driver.
    pub id: DriverId,
    /// The driver's full name.
    pub name: String,
    /// The driver's phone number.
    pub phone: String,
    /// The driver's license number, unique per driver.
    pub license_number: String,
}

/// The data needed to register a driver.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDriver {
    /// The driver's full name.
    pub name: String,
    /// The driver's phone number.
    pub phone: String,
    /// The driver's license number.
    pub license_number: String,
}

/// A vehicle in the school fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// The ID of the vehicle.
    pub id: VehicleId,
    /// The vehicle's number plate, unique per vehicle.
    pub plate: String,
    /// How many students the vehicle carries.
    pub capacity: i64,
    /// The driver responsible for the vehicle, if any.
    pub driver_id: Option<DriverId>,
}

/// The data needed to register a vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVehicle {
    /// The vehicle's number plate.
    pub plate: String,
    /// How many students the vehicle carries.
    pub capacity: i64,
    /// The driver responsible for the vehicle, if any.
    pub driver_id: Option<DriverId>,
}

/// A vehicle row for the fleet page, with the driver's name joined in.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleRow {
    /// The vehicle.
    pub vehicle: Vehicle,
    /// The name of the vehicle's driver, if one is assigned.
    pub driver_name: Option<String>,
}

/// A transport route students can be assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// The ID of the route.
    pub id: RouteId,
    /// The route's name, e.g. "Kikuyu - Zambezi".
    pub name: String,
    /// The fee charged per month to assigned students.
    pub monthly_fee: f64,
    /// The vehicle serving the route, if any. A vehicle serves at most one
    /// route.
    pub vehicle_id: Option<VehicleId>,
}

/// The data needed to create a route.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRoute {
    /// The route's name.
    pub name: String,
    /// The fee charged per month to assigned students.
    pub monthly_fee: f64,
    /// The vehicle serving the route, if any.
    pub vehicle_id: Option<VehicleId>,
}

/// A route row for the routes page, with the vehicle's plate joined in.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRow {
    /// The route.
    pub route: Route,
    /// The plate of the vehicle serving the route, if one is assigned.
    pub vehicle_plate: Option<String>,
}

/// A student's assignment to a transport route.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// The ID of the assignment.
    pub id: AssignmentId,
    /// The assigned student.
    pub student_id: StudentId,
    /// The route the student rides.
    pub route: Route,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the driver, vehicle, route and assignment tables.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn create_transport_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS driver (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                phone TEXT NOT NULL,
                license_number TEXT NOT NULL UNIQUE
                )",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS vehicle (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                plate TEXT NOT NULL UNIQUE,
                capacity INTEGER NOT NULL,
                driver_id INTEGER,
                FOREIGN KEY(driver_id) REFERENCES driver(id)
                )",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS route (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                monthly_fee REAL NOT NULL CHECK(monthly_fee >= 0),
                vehicle_id INTEGER UNIQUE,
                FOREIGN KEY(vehicle_id) REFERENCES vehicle(id)
                )",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS route_assignment (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                student_id INTEGER NOT NULL UNIQUE,
                route_id INTEGER NOT NULL,
                FOREIGN KEY(student_id) REFERENCES student(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(route_id) REFERENCES route(id)
                )",
        (),
    )?;

    Ok(())
}

/// Register a driver.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyName] if the name is blank,
/// - [Error::DuplicateLicense] if the license number is taken,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_driver(driver: NewDriver, connection: &Connection) -> Result<Driver, Error> {
    if driver.name.trim().is_empty() {
        return Err(Error::EmptyName);
    }

    connection
        .prepare(
            "INSERT INTO driver (name, phone, license_number) VALUES (?1, ?2, ?3)
             RETURNING id, name, phone, license_number",
        )?
        .query_row(
            (&driver.name, &driver.phone, &driver.license_number),
            map_driver_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateLicense(driver.license_number.clone()),
            error => error.into(),
        })
}

/// Remove a driver.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingDriver] if `id` does not refer to a valid driver,
/// - [Error::StillReferenced] if a vehicle is still assigned to the driver,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_driver(id: DriverId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection
        .execute("DELETE FROM driver WHERE id = :id", &[(":id", &id)])
        .map_err(map_foreign_key_to_still_referenced)?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingDriver);
    }

    Ok(())
}

/// Retrieve all drivers, ordered by name.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn list_drivers(connection: &Connection) -> Result<Vec<Driver>, Error> {
    connection
        .prepare("SELECT id, name, phone, license_number FROM driver ORDER BY name ASC, id ASC")?
        .query_map([], map_driver_row)?
        .map(|driver| driver.map_err(Error::SqlError))
        .collect()
}

/// Register a vehicle.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicatePlate] if the number plate is taken,
/// - [Error::InvalidReference] if the driver does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_vehicle(vehicle: NewVehicle, connection: &Connection) -> Result<Vehicle, Error> {
    if vehicle.plate.trim().is_empty() {
        return Err(Error::EmptyName);
    }

    connection
        .prepare(
            "INSERT INTO vehicle (plate, capacity, driver_id) VALUES (?1, ?2, ?3)
             RETURNING id, plate, capacity, driver_id",
        )?
        .query_row(
            (&vehicle.plate, vehicle.capacity, vehicle.driver_id),
            map_vehicle_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicatePlate(vehicle.plate.clone()),
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

/// Remove a vehicle.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingVehicle] if `id` does not refer to a valid vehicle,
/// - [Error::StillReferenced] if the vehicle still serves a route,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_vehicle(id: VehicleId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection
        .execute("DELETE FROM vehicle WHERE id = :id", &[(":id", &id)])
        .map_err(map_foreign_key_to_still_referenced)?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingVehicle);
    }

    Ok(())
}

/// Retrieve all vehicles with their drivers' names, ordered by plate.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn list_vehicles(connection: &Connection) -> Result<Vec<VehicleRow>, Error> {
    connection
        .prepare(
            "SELECT v.id, v.plate, v.capacity, v.driver_id, d.name
             FROM vehicle v
             LEFT JOIN driver d ON v.driver_id = d.id
             ORDER BY v.plate ASC, v.id ASC",
        )?
        .query_map([], |row| {
            Ok(VehicleRow {
                vehicle: map_vehicle_row(row)?,
                driver_name: row.get(4)?,
            })
        })?
        .map(|vehicle| vehicle.map_err(Error::SqlError))
        .collect()
}

/// Create a transport route.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyName] if the name is blank,
/// - [Error::NegativeAmount] if the monthly fee is below zero,
/// - [Error::VehicleAlreadyAssigned] if the vehicle already serves a route,
/// - [Error::InvalidReference] if the vehicle does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_route(route: NewRoute, connection: &Connection) -> Result<Route, Error> {
    if route.name.trim().is_empty() {
        return Err(Error::EmptyName);
    }

    if route.monthly_fee < 0.0 {
        return Err(Error::NegativeAmount(route.monthly_fee));
    }

    connection
        .prepare(
            "INSERT INTO route (name, monthly_fee, vehicle_id) VALUES (?1, ?2, ?3)
             RETURNING id, name, monthly_fee, vehicle_id",
        )?
        .query_row(
            (&route.name, route.monthly_fee, route.vehicle_id),
            map_route_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::VehicleAlreadyAssigned,
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

/// Remove a route.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingRoute] if `id` does not refer to a valid route,
/// - [Error::StillReferenced] if students are still assigned to the route,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_route(id: RouteId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection
        .execute("DELETE FROM route WHERE id = :id", &[(":id", &id)])
        .map_err(map_foreign_key_to_still_referenced)?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingRoute);
    }

    Ok(())
}

/// Retrieve a route by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid route,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_route(id: RouteId, connection: &Connection) -> Result<Route, Error> {
    let route = connection
        .prepare("SELECT id, name, monthly_fee, vehicle_id FROM route WHERE id = :id")?
        .query_row(&[(":id", &id)], map_route_row)?;

    Ok(route)
}

/// Retrieve all routes with their vehicles' plates, ordered by name.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn list_routes(connection: &Connection) -> Result<Vec<RouteRow>, Error> {
    connection
        .prepare(
            "SELECT r.id, r.name, r.monthly_fee, r.vehicle_id, v.plate
             FROM route r
             LEFT JOIN vehicle v ON r.vehicle_id = v.id
             ORDER BY r.name ASC, r.id ASC",
        )?
        .query_map([], |row| {
            Ok(RouteRow {
                route: map_route_row(row)?,
                vehicle_plate: row.get(4)?,
            })
        })?
        .map(|route| route.map_err(Error::SqlError))
        .collect()
}

/// Assign a student to a route.
///
/// # Errors
/// This function will return a:
/// - [Error::StudentAlreadyAssigned] if the student already has a route,
/// - [Error::InvalidReference] if the student or route does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn assign_student(
    student_id: StudentId,
    route_id: RouteId,
    connection: &Connection,
) -> Result<AssignmentId, Error> {
    connection
        .prepare("INSERT INTO route_assignment (student_id, route_id) VALUES (?1, ?2) RETURNING id")?
        .query_row((student_id, route_id), |row| row.get(0))
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::StudentAlreadyAssigned,
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

/// Remove a student's route assignment.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingAssignment] if `id` does not refer to a valid
///   assignment,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn remove_assignment(id: AssignmentId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM route_assignment WHERE id = :id",
        &[(":id", &id)],
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingAssignment);
    }

    Ok(())
}

/// Retrieve a student's route assignment, if they have one.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn assignment_for_student(
    student_id: StudentId,
    connection: &Connection,
) -> Result<Option<Assignment>, Error> {
    let assignment = connection
        .prepare(
            "SELECT a.id, a.student_id, r.id, r.name, r.monthly_fee, r.vehicle_id
             FROM route_assignment a
             INNER JOIN route r ON a.route_id = r.id
             WHERE a.student_id = :student_id",
        )?
        .query_row(&[(":student_id", &student_id)], |row| {
            Ok(Assignment {
                id: row.get(0)?,
                student_id: row.get(1)?,
                route: Route {
                    id: row.get(2)?,
                    name: row.get(3)?,
                    monthly_fee: row.get(4)?,
                    vehicle_id: row.get(5)?,
                },
            })
        });

    match assignment {
        Ok(assignment) => Ok(Some(assignment)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

fn map_foreign_key_to_still_referenced(error: rusqlite::Error) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
            },
            _,
        ) => Error::StillReferenced,
        error => error.into(),
    }
}

/// Map a database row to a [Driver].
fn map_driver_row(row: &Row) -> Result<Driver, rusqlite::Error> {
    Ok(Driver {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        license_number: row.get(3)?,
    })
}

/// Map a database row to a [Vehicle].
fn map_vehicle_row(row: &Row) -> Result<Vehicle, rusqlite::Error> {
    Ok(Vehicle {
        id: row.get(0)?,
        plate: row.get(1)?,
        capacity: row.get(2)?,
        driver_id: row.get(3)?,
    })
}

/// Map a database row to a [Route].
fn map_route_row(row: &Row) -> Result<Route, rusqlite::Error> {
    Ok(Route {
        id: row.get(0)?,
        name: row.get(1)?,
        monthly_fee: row.get(2)?,
        vehicle_id: row.get(3)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
