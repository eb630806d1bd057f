//! Route pages and endpoints.

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
    database_id::{RouteId, VehicleId},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DANGER_STYLE, BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE,
        FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency, link,
    },
    navigation::NavBar,
};

use super::core::{
    NewRoute, RouteRow, VehicleRow, create_route, delete_route, list_routes, list_vehicles,
};

/// The state needed for managing routes.
#[derive(Debug, Clone)]
pub struct RouteState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RouteState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The route creation form data. An empty vehicle value means no vehicle
/// serves the route yet.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteFormData {
    pub name: String,
    pub monthly_fee: f64,
    pub vehicle_id: Option<String>,
}

impl RouteFormData {
    fn vehicle_id(&self) -> Option<VehicleId> {
        self.vehicle_id
            .as_deref()
            .filter(|value| !value.is_empty())
            .and_then(|value| value.parse().ok())
    }
}

/// Render the routes page.
pub async fn get_routes_page(State(state): State<RouteState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let routes = list_routes(&connection)?;

    Ok(routes_view(&routes).into_response())
}

/// Render the route creation page.
pub async fn get_new_route_page(State(state): State<RouteState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let vehicles = list_vehicles(&connection)?;

    Ok(new_route_view(&vehicles).into_response())
}

/// Handle the route creation form submission.
pub async fn create_route_endpoint(
    State(state): State<RouteState>,
    Form(form): Form<RouteFormData>,
) -> Response {
    let vehicle_id = form.vehicle_id();

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_notification_response();
        }
    };

    match create_route(
        NewRoute {
            name: form.name,
            monthly_fee: form.monthly_fee,
            vehicle_id,
        },
        &connection,
    ) {
        Ok(_) => (
            HxRedirect(endpoints::ROUTES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a route: {error}");

            error.into_notification_response()
        }
    }
}

/// A route handler for removing a route, clears the table row on success.
pub async fn delete_route_endpoint(
    State(state): State<RouteState>,
    Path(route_id): Path<RouteId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_notification_response();
        }
    };

    match delete_route(route_id, &connection) {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => Html("").into_response(),
        Err(error) => {
            tracing::error!("Could not delete route {route_id}: {error}");

            error.into_notification_response()
        }
    }
}

fn routes_view(routes: &[RouteRow]) -> Markup {
    let nav_bar = NavBar::new(endpoints::ROUTES_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="flex w-full max-w-screen-lg items-center justify-between mb-4"
            {
                h1 class="text-2xl font-bold" { "Transport routes" }

                div class="flex gap-4"
                {
                    (link(endpoints::DRIVERS_VIEW, "Drivers"))
                    (link(endpoints::VEHICLES_VIEW, "Vehicles"))
                    (link(endpoints::NEW_ROUTE_VIEW, "Create route"))
                }
            }

            @if routes.is_empty() {
                p class="text-gray-500 dark:text-gray-400 py-4" { "No routes created." }
            } @else {
                table class="w-full max-w-screen-lg text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th class=(TABLE_CELL_STYLE) { "Route" }
                            th class=(TABLE_CELL_STYLE) { "Monthly fee" }
                            th class=(TABLE_CELL_STYLE) { "Vehicle" }
                            th class=(TABLE_CELL_STYLE) { "Actions" }
                        }
                    }

                    tbody
                    {
                        @for row in routes {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE) { (row.route.name) }
                                td class=(TABLE_CELL_STYLE) { (format_currency(row.route.monthly_fee)) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    (row.vehicle_plate.as_deref().unwrap_or("Unassigned"))
                                }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    button
                                        hx-delete=(format_endpoint(endpoints::DELETE_ROUTE, row.route.id))
                                        hx-confirm="Remove this route?"
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

    base("Routes", &content)
}

fn new_route_view(vehicles: &[VehicleRow]) -> Markup {
    let nav_bar = NavBar::new(endpoints::ROUTES_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-4" { "Create route" }

            form
                hx-post=(endpoints::POST_ROUTE)
                hx-target-error="#notification-container"
                class="w-full space-y-4 md:space-y-6"
            {
                div
                {
                    label for="name" class=(FORM_LABEL_STYLE) { "Route name" }
                    input id="name" type="text" name="name" placeholder="Kikuyu - Zambezi"
                        required autofocus class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="monthly_fee" class=(FORM_LABEL_STYLE) { "Monthly fee (KSh)" }
                    input id="monthly_fee" type="number" name="monthly_fee" min="0" step="0.01"
                        required class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="vehicle_id" class=(FORM_LABEL_STYLE) { "Vehicle" }
                    select id="vehicle_id" name="vehicle_id" class=(FORM_SELECT_STYLE)
                    {
                        option value="" { "Unassigned" }
                        @for row in vehicles {
                            option value=(row.vehicle.id) { (row.vehicle.plate) }
                        }
                    }
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create route" }
            }
        }
    };

    base("Create Route", &content)
}
