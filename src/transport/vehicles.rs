//! Vehicle pages and endpoints.

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
    database_id::{DriverId, VehicleId},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DANGER_STYLE, BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE,
        FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, link,
    },
    navigation::NavBar,
};

use super::core::{
    Driver, NewVehicle, VehicleRow, create_vehicle, delete_vehicle, list_drivers, list_vehicles,
};

/// The state needed for managing vehicles.
#[derive(Debug, Clone)]
pub struct VehicleState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for VehicleState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The vehicle registration form data. An empty driver value means the
/// vehicle has no driver yet.
#[derive(Debug, Clone, Deserialize)]
pub struct VehicleFormData {
    pub plate: String,
    pub capacity: i64,
    pub driver_id: Option<String>,
}

impl VehicleFormData {
    fn driver_id(&self) -> Option<DriverId> {
        self.driver_id
            .as_deref()
            .filter(|value| !value.is_empty())
            .and_then(|value| value.parse().ok())
    }
}

/// Render the vehicles page.
pub async fn get_vehicles_page(State(state): State<VehicleState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let vehicles = list_vehicles(&connection)?;

    Ok(vehicles_view(&vehicles).into_response())
}

/// Render the vehicle registration page.
pub async fn get_new_vehicle_page(State(state): State<VehicleState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let drivers = list_drivers(&connection)?;

    Ok(new_vehicle_view(&drivers).into_response())
}

/// Handle the vehicle registration form submission.
pub async fn create_vehicle_endpoint(
    State(state): State<VehicleState>,
    Form(form): Form<VehicleFormData>,
) -> Response {
    let driver_id = form.driver_id();

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_notification_response();
        }
    };

    match create_vehicle(
        NewVehicle {
            plate: form.plate,
            capacity: form.capacity,
            driver_id,
        },
        &connection,
    ) {
        Ok(_) => (
            HxRedirect(endpoints::VEHICLES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while registering a vehicle: {error}");

            error.into_notification_response()
        }
    }
}

/// A route handler for removing a vehicle, clears the table row on success.
pub async fn delete_vehicle_endpoint(
    State(state): State<VehicleState>,
    Path(vehicle_id): Path<VehicleId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_notification_response();
        }
    };

    match delete_vehicle(vehicle_id, &connection) {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => Html("").into_response(),
        Err(error) => {
            tracing::error!("Could not delete vehicle {vehicle_id}: {error}");

            error.into_notification_response()
        }
    }
}

fn vehicles_view(vehicles: &[VehicleRow]) -> Markup {
    let nav_bar = NavBar::new(endpoints::ROUTES_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="flex w-full max-w-screen-lg items-center justify-between mb-4"
            {
                h1 class="text-2xl font-bold" { "Vehicles" }

                div class="flex gap-4"
                {
                    (link(endpoints::DRIVERS_VIEW, "Drivers"))
                    (link(endpoints::ROUTES_VIEW, "Routes"))
                    (link(endpoints::NEW_VEHICLE_VIEW, "Register vehicle"))
                }
            }

            @if vehicles.is_empty() {
                p class="text-gray-500 dark:text-gray-400 py-4" { "No vehicles registered." }
            } @else {
                table class="w-full max-w-screen-lg text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th class=(TABLE_CELL_STYLE) { "Plate" }
                            th class=(TABLE_CELL_STYLE) { "Capacity" }
                            th class=(TABLE_CELL_STYLE) { "Driver" }
                            th class=(TABLE_CELL_STYLE) { "Actions" }
                        }
                    }

                    tbody
                    {
                        @for row in vehicles {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE) { (row.vehicle.plate) }
                                td class=(TABLE_CELL_STYLE) { (row.vehicle.capacity) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    (row.driver_name.as_deref().unwrap_or("Unassigned"))
                                }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    button
                                        hx-delete=(format_endpoint(endpoints::DELETE_VEHICLE, row.vehicle.id))
                                        hx-confirm="Remove this vehicle?"
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

    base("Vehicles", &content)
}

fn new_vehicle_view(drivers: &[Driver]) -> Markup {
    let nav_bar = NavBar::new(endpoints::ROUTES_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-4" { "Register vehicle" }

            form
                hx-post=(endpoints::POST_VEHICLE)
                hx-target-error="#notification-container"
                class="w-full space-y-4 md:space-y-6"
            {
                div
                {
                    label for="plate" class=(FORM_LABEL_STYLE) { "Number plate" }
                    input id="plate" type="text" name="plate" placeholder="KDA 123A" required
                        autofocus class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="capacity" class=(FORM_LABEL_STYLE) { "Capacity" }
                    input id="capacity" type="number" name="capacity" min="1" required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="driver_id" class=(FORM_LABEL_STYLE) { "Driver" }
                    select id="driver_id" name="driver_id" class=(FORM_SELECT_STYLE)
                    {
                        option value="" { "Unassigned" }
                        @for driver in drivers {
                            option value=(driver.id) { (driver.name) }
                        }
                    }
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Register vehicle" }
            }
        }
    };

    base("Register Vehicle", &content)
}

#[cfg(test)]
mod vehicle_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;

    use crate::{db::initialize, endpoints, test_utils::assert_hx_redirect};

    use super::{VehicleFormData, VehicleState, create_vehicle_endpoint, delete_vehicle_endpoint};

    fn get_test_state() -> VehicleState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        VehicleState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn form(plate: &str) -> VehicleFormData {
        VehicleFormData {
            plate: plate.to_owned(),
            capacity: 33,
            driver_id: Some(String::new()),
        }
    }

    #[tokio::test]
    async fn can_register_and_remove_vehicle() {
        let state = get_test_state();

        let response = create_vehicle_endpoint(State(state.clone()), Form(form("KDA 123A")))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::VEHICLES_VIEW);

        let response = delete_vehicle_endpoint(State(state), Path(1))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn duplicate_plate_is_a_conflict() {
        let state = get_test_state();
        create_vehicle_endpoint(State(state.clone()), Form(form("KDA 123A"))).await;

        let response = create_vehicle_endpoint(State(state), Form(form("KDA 123A")))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unknown_driver_is_rejected() {
        let state = get_test_state();

        let response = create_vehicle_endpoint(
            State(state),
            Form(VehicleFormData {
                driver_id: Some("999".to_owned()),
                ..form("KDA 123A")
            }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
