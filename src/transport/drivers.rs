//! Driver pages and endpoints.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    database_id::DriverId,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DANGER_STYLE, BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, link,
    },
    navigation::NavBar,
};

use super::core::{Driver, NewDriver, create_driver, delete_driver, list_drivers};

/// The state needed for managing drivers.
#[derive(Debug, Clone)]
pub struct DriverState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DriverState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The driver registration form data.
#[derive(Debug, Clone, Deserialize)]
pub struct DriverFormData {
    pub name: String,
    pub phone: String,
    pub license_number: String,
}

/// Render the drivers page.
pub async fn get_drivers_page(State(state): State<DriverState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let drivers = list_drivers(&connection)?;

    Ok(drivers_view(&drivers).into_response())
}

/// Render the driver registration page.
pub async fn get_new_driver_page() -> Response {
    new_driver_view().into_response()
}

/// Handle the driver registration form submission.
pub async fn create_driver_endpoint(
    State(state): State<DriverState>,
    Form(form): Form<DriverFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_notification_response();
        }
    };

    match create_driver(
        NewDriver {
            name: form.name,
            phone: form.phone,
            license_number: form.license_number,
        },
        &connection,
    ) {
        Ok(_) => (
            HxRedirect(endpoints::DRIVERS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while registering a driver: {error}");

            error.into_notification_response()
        }
    }
}

/// A route handler for removing a driver, clears the table row on success.
pub async fn delete_driver_endpoint(
    State(state): State<DriverState>,
    Path(driver_id): Path<DriverId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_notification_response();
        }
    };

    match delete_driver(driver_id, &connection) {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => Html("").into_response(),
        Err(error) => {
            tracing::error!("Could not delete driver {driver_id}: {error}");

            error.into_notification_response()
        }
    }
}

fn drivers_view(drivers: &[Driver]) -> Markup {
    let nav_bar = NavBar::new(endpoints::ROUTES_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="flex w-full max-w-screen-lg items-center justify-between mb-4"
            {
                h1 class="text-2xl font-bold" { "Drivers" }

                div class="flex gap-4"
                {
                    (link(endpoints::VEHICLES_VIEW, "Vehicles"))
                    (link(endpoints::ROUTES_VIEW, "Routes"))
                    (link(endpoints::NEW_DRIVER_VIEW, "Register driver"))
                }
            }

            @if drivers.is_empty() {
                p class="text-gray-500 dark:text-gray-400 py-4" { "No drivers registered." }
            } @else {
                table class="w-full max-w-screen-lg text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th class=(TABLE_CELL_STYLE) { "Name" }
                            th class=(TABLE_CELL_STYLE) { "Phone" }
                            th class=(TABLE_CELL_STYLE) { "License" }
                            th class=(TABLE_CELL_STYLE) { "Actions" }
                        }
                    }

                    tbody
                    {
                        @for driver in drivers {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE) { (driver.name) }
                                td class=(TABLE_CELL_STYLE) { (driver.phone) }
                                td class=(TABLE_CELL_STYLE) { (driver.license_number) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    button
                                        hx-delete=(format_endpoint(endpoints::DELETE_DRIVER, driver.id))
                                        hx-confirm="Remove this driver?"
                                        hx-target="closest tr"
                                        hx-target-error="#notification-container"
                                        class=(BUTTON_DANGER_STYLE)
                                    {
                                        "Remove"
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Drivers", &content)
}

fn new_driver_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::ROUTES_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-4" { "Register driver" }

            form
                hx-post=(endpoints::POST_DRIVER)
                hx-target-error="#notification-container"
                class="w-full space-y-4 md:space-y-6"
            {
                div
                {
                    label for="name" class=(FORM_LABEL_STYLE) { "Full name" }
                    input id="name" type="text" name="name" placeholder="Full name" required
                        autofocus class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="phone" class=(FORM_LABEL_STYLE) { "Phone" }
                    input id="phone" type="text" name="phone" placeholder="07xx xxx xxx" required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="license_number" class=(FORM_LABEL_STYLE) { "License number" }
                    input id="license_number" type="text" name="license_number"
                        placeholder="DL-12345" required class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Register driver" }
            }
        }
    };

    base("Register Driver", &content)
}
