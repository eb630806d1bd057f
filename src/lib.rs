//! Shulebook is a web app for running the day-to-day administration of a
//! school: student records, staff, fees, meals, transport, attendance and the
//! timetable.
//!
//! This library provides an HTTP server that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use time::Date;
use tokio::signal;

mod app_state;
mod attendance;
mod auth;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod finance;
mod food;
mod html;
mod ledger;
mod logging;
mod navigation;
mod not_found;
mod notification;
mod pagination;
mod password;
mod routing;
mod schedule;
mod server_error;
mod staff;
mod student;
mod timezone;
mod transport;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use staff::{Staff, StaffId, get_staff_by_email, set_staff_password};

use crate::{
    database_id::{MealItemId, SubscriptionId},
    not_found::get_404_not_found_response,
    notification::Notification,
    server_error::render_internal_server_error,
};

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first, and then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid email/password combination.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no auth cookie in the cookie jar")]
    CookieMissing,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An empty string was used where a name is required.
    #[error("name cannot be empty")]
    EmptyName,

    /// A date in the future was used to create a ledger entry.
    ///
    /// Entries record money movements that have already happened, therefore
    /// future dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// A negative amount was used to create a ledger entry.
    ///
    /// Amounts are stored as non-negative magnitudes; whether an entry is
    /// money in or money out is carried by its kind.
    #[error("{0} is negative, amounts must be magnitudes")]
    NegativeAmount(f64),

    /// A grade outside the school's grade range was supplied.
    #[error("{0} is not a valid grade")]
    InvalidGrade(i64),

    /// A term outside 1-3 was supplied.
    #[error("{0} is not a valid term")]
    InvalidTerm(i64),

    /// A stored enum column held a value this version does not understand.
    #[error("unrecognised value \"{0}\" in column {1}")]
    InvalidColumnValue(String, &'static str),

    /// A date field could not be parsed as a calendar date.
    #[error("\"{0}\" is not a valid date")]
    InvalidDate(String),

    /// The admission number used to create a student already exists.
    #[error("the admission number \"{0}\" already exists")]
    DuplicateAdmissionNumber(String),

    /// The email used to create a staff member already exists.
    #[error("the email \"{0}\" already exists")]
    DuplicateEmail(String),

    /// The number plate used to create a vehicle already exists.
    #[error("the number plate \"{0}\" already exists")]
    DuplicatePlate(String),

    /// The license number used to create a driver already exists.
    #[error("the license number \"{0}\" already exists")]
    DuplicateLicense(String),

    /// The vehicle is already serving another route.
    #[error("the vehicle is already assigned to a route")]
    VehicleAlreadyAssigned,

    /// The student already has a transport route assigned.
    #[error("the student is already assigned to a route")]
    StudentAlreadyAssigned,

    /// The student is already subscribed to the meal item.
    #[error("the student is already subscribed to this meal item")]
    DuplicateSubscription,

    /// The subscription has already been served today.
    #[error("this meal has already been served today")]
    AlreadyServed(SubscriptionId),

    /// A foreign key used in an insert did not refer to an existing row.
    #[error("a referenced record does not exist")]
    InvalidReference,

    /// Tried to delete a record that other records still reference, e.g. a
    /// driver that is still assigned to a vehicle.
    #[error("the record is still referenced by other records")]
    StillReferenced,

    /// The meal item used for a subscription is retired from the menu.
    #[error("the meal item is no longer active")]
    InactiveMealItem(MealItemId),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while serializing or parsing the auth token.
    #[error("could not serialize as JSON: {0}")]
    JsonError(String),

    /// An error occurred while getting the local timezone from a canonical
    /// timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to delete a driver that does not exist.
    #[error("tried to delete a driver that is not in the database")]
    DeleteMissingDriver,

    /// Tried to delete a vehicle that does not exist.
    #[error("tried to delete a vehicle that is not in the database")]
    DeleteMissingVehicle,

    /// Tried to delete a route that does not exist.
    #[error("tried to delete a route that is not in the database")]
    DeleteMissingRoute,

    /// Tried to delete a meal item that does not exist.
    #[error("tried to delete a meal item that is not in the database")]
    DeleteMissingMealItem,

    /// Tried to delete a timetable slot that does not exist.
    #[error("tried to delete a timetable slot that is not in the database")]
    DeleteMissingSlot,

    /// Tried to delete a meal subscription that does not exist.
    #[error("tried to delete a subscription that is not in the database")]
    DeleteMissingSubscription,

    /// Tried to delete a route assignment that does not exist.
    #[error("tried to delete a route assignment that is not in the database")]
    DeleteMissingAssignment,

    /// Tried to update a student that does not exist.
    #[error("tried to update a student that is not in the database")]
    UpdateMissingStudent,

    /// Tried to update a meal item that does not exist.
    #[error("tried to update a meal item that is not in the database")]
    UpdateMissingMealItem,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidTimezoneError(timezone) => render_internal_server_error(
                "Invalid Timezone Settings",
                &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to a valid, canonical timezone string"
                ),
            ),
            Error::DatabaseLockError => render_internal_server_error(
                "Sorry, something went wrong.",
                "Try again later or check the server logs",
            ),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                render_internal_server_error(
                    "Sorry, something went wrong.",
                    "Try again later or check the server logs",
                )
            }
        }
    }
}

impl Error {
    pub(crate) fn into_notification_response(self) -> Response {
        match self {
            Error::FutureDate(date) => Notification::error(
                "Invalid entry date",
                &format!("{date} is a date in the future, which is not allowed."),
            )
            .render(StatusCode::BAD_REQUEST),
            Error::InvalidColumnValue(value, field) => Notification::error(
                "Invalid value",
                &format!("\"{value}\" is not a valid value for {field}."),
            )
            .render(StatusCode::BAD_REQUEST),
            Error::InvalidDate(value) => Notification::error(
                "Invalid date",
                &format!("\"{value}\" is not a valid date. Use the format YYYY-MM-DD."),
            )
            .render(StatusCode::BAD_REQUEST),
            Error::NegativeAmount(amount) => Notification::error(
                "Invalid amount",
                &format!("{amount} is negative. Enter the amount as a positive figure."),
            )
            .render(StatusCode::BAD_REQUEST),
            Error::EmptyName => Notification::error("Invalid name", "The name cannot be empty.")
                .render(StatusCode::BAD_REQUEST),
            Error::InvalidGrade(grade) => Notification::error(
                "Invalid grade",
                &format!("{grade} is not a grade taught at this school."),
            )
            .render(StatusCode::BAD_REQUEST),
            Error::InvalidTerm(term) => Notification::error(
                "Invalid term",
                &format!("{term} is not a valid term, use 1 to 3."),
            )
            .render(StatusCode::BAD_REQUEST),
            Error::DuplicateAdmissionNumber(number) => Notification::error(
                "Duplicate admission number",
                &format!(
                    "A student with admission number {number} already exists. \
                    Check the student list before admitting again."
                ),
            )
            .render(StatusCode::CONFLICT),
            Error::DuplicateEmail(email) => Notification::error(
                "Duplicate email",
                &format!("A staff member with the email {email} already exists."),
            )
            .render(StatusCode::CONFLICT),
            Error::DuplicatePlate(plate) => Notification::error(
                "Duplicate number plate",
                &format!("A vehicle with the plate {plate} is already registered."),
            )
            .render(StatusCode::CONFLICT),
            Error::DuplicateLicense(license) => Notification::error(
                "Duplicate license number",
                &format!("A driver with the license {license} is already registered."),
            )
            .render(StatusCode::CONFLICT),
            Error::VehicleAlreadyAssigned => Notification::error(
                "Vehicle unavailable",
                "That vehicle is already serving another route. \
                Free it up first or pick a different vehicle.",
            )
            .render(StatusCode::CONFLICT),
            Error::StudentAlreadyAssigned => Notification::error(
                "Student already assigned",
                "The student already has a transport route. \
                Remove the current assignment first.",
            )
            .render(StatusCode::CONFLICT),
            Error::DuplicateSubscription => Notification::error(
                "Already subscribed",
                "The student is already subscribed to this meal item.",
            )
            .render(StatusCode::CONFLICT),
            Error::AlreadyServed(_) => Notification::warning(
                "Already served",
                "This meal has already been served today. Refresh the checklist.",
            )
            .render(StatusCode::CONFLICT),
            Error::InactiveMealItem(_) => Notification::error(
                "Meal item retired",
                "The meal item is no longer on the menu, so it cannot be subscribed or served.",
            )
            .render(StatusCode::CONFLICT),
            Error::InvalidReference => Notification::error(
                "Missing record",
                "A referenced record could not be found. Refresh the page and try again.",
            )
            .render(StatusCode::BAD_REQUEST),
            Error::StillReferenced => Notification::error(
                "Record in use",
                "The record is still referenced by other records and cannot be deleted.",
            )
            .render(StatusCode::CONFLICT),
            Error::DeleteMissingDriver => missing_on_delete("driver"),
            Error::DeleteMissingVehicle => missing_on_delete("vehicle"),
            Error::DeleteMissingRoute => missing_on_delete("route"),
            Error::DeleteMissingMealItem => missing_on_delete("meal item"),
            Error::DeleteMissingSlot => missing_on_delete("timetable slot"),
            Error::DeleteMissingSubscription => missing_on_delete("subscription"),
            Error::DeleteMissingAssignment => missing_on_delete("route assignment"),
            Error::UpdateMissingStudent => {
                Notification::error("Could not update student", "The student could not be found.")
                    .render(StatusCode::NOT_FOUND)
            }
            Error::UpdateMissingMealItem => Notification::error(
                "Could not update meal item",
                "The meal item could not be found.",
            )
            .render(StatusCode::NOT_FOUND),
            _ => Notification::error(
                "Something went wrong",
                "An unexpected error occurred, check the server logs for more details.",
            )
            .render(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

fn missing_on_delete(noun: &str) -> Response {
    Notification::error(
        &format!("Could not delete {noun}"),
        &format!(
            "The {noun} could not be found. \
            Try refreshing the page to see if it has already been deleted."
        ),
    )
    .render(StatusCode::NOT_FOUND)
}
