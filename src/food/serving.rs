//! The daily meal serving checklist.
//!
//! Each row reflects the serving's stored request state: unticked, pending,
//! confirmed or failed. Ticking a row posts to the serving endpoint, which
//! returns the row in its reconciled state; a failed row keeps its button so
//! the tick can be retried.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    database_id::SubscriptionId,
    endpoints,
    html::{
        BADGE_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, format_currency,
    },
    navigation::NavBar,
    student::grade_label,
    timezone::local_date_today,
};

use super::core::{ServingRosterRow, ServingStatus, serve_subscription, serving_roster};

/// The state needed for the serving checklist.
#[derive(Debug, Clone)]
pub struct ServingState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for ServingState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Render today's serving checklist.
pub async fn get_serving_page(State(state): State<ServingState>) -> Result<Response, Error> {
    let today = local_date_today(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let roster = serving_roster(today, &connection)?;

    Ok(serving_view(&roster, &today.to_string()).into_response())
}

/// The serving form data.
#[derive(Debug, Clone, Deserialize)]
pub struct ServingFormData {
    pub subscription_id: SubscriptionId,
}

/// Mark a subscription served today. Returns the reconciled checklist row.
pub async fn serve_meal_endpoint(
    State(state): State<ServingState>,
    Form(form): Form<ServingFormData>,
) -> Response {
    let Some(today) = local_date_today(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone.clone()).into_response();
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_notification_response();
        }
    };

    match serve_subscription(form.subscription_id, today, &connection) {
        Ok(_) => match roster_row(form.subscription_id, today, &connection) {
            Some(row) => serving_row_view(&row).into_response(),
            None => Error::NotFound.into_notification_response(),
        },
        Err(error) => {
            tracing::error!(
                "Could not serve subscription {}: {error}",
                form.subscription_id
            );

            error.into_notification_response()
        }
    }
}

fn roster_row(
    subscription_id: SubscriptionId,
    date: time::Date,
    connection: &Connection,
) -> Option<ServingRosterRow> {
    serving_roster(date, connection)
        .ok()?
        .into_iter()
        .find(|row| row.subscription_id == subscription_id)
}

fn serving_view(roster: &[ServingRosterRow], date_label: &str) -> Markup {
    let nav_bar = NavBar::new(endpoints::MEAL_ITEMS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-1" { "Serving checklist" }
            p class="text-sm text-gray-500 dark:text-gray-400 mb-4" { (date_label) }

            @if roster.is_empty() {
                p class="text-gray-500 dark:text-gray-400 py-4"
                {
                    "No subscriptions to serve today."
                }
            } @else {
                table class="w-full max-w-screen-lg text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th class=(TABLE_CELL_STYLE) { "Student" }
                            th class=(TABLE_CELL_STYLE) { "Grade" }
                            th class=(TABLE_CELL_STYLE) { "Meal" }
                            th class=(TABLE_CELL_STYLE) { "Price" }
                            th class=(TABLE_CELL_STYLE) { "Served" }
                        }
                    }

                    tbody
                    {
                        @for row in roster {
                            (serving_row_view(row))
                        }
                    }
                }
            }
        }
    };

    base("Serving Checklist", &content)
}

fn serving_row_view(row: &ServingRosterRow) -> Markup {
    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (row.student_name) }
            td class=(TABLE_CELL_STYLE) { (grade_label(row.grade)) }
            td class=(TABLE_CELL_STYLE) { (row.item_name) }
            td class=(TABLE_CELL_STYLE) { (format_currency(row.price)) }
            td class=(TABLE_CELL_STYLE)
            {
                @match row.status {
                    Some(ServingStatus::Confirmed) => {
                        span class=(BADGE_STYLE) { "Served" }
                    }
                    Some(ServingStatus::Pending) => {
                        span class="text-gray-400" { "Charging…" }
                    }
                    Some(ServingStatus::Failed) | None => {
                        @if row.status == Some(ServingStatus::Failed) {
                            span class="text-red-600 dark:text-red-400 mr-2" { "Charge failed" }
                        }

                        form
                            hx-post=(endpoints::POST_SERVING)
                            hx-target="closest tr"
                            hx-swap="outerHTML"
                            hx-target-error="#notification-container"
                            hx-disabled-elt="find button"
                        {
                            input type="hidden" name="subscription_id" value=(row.subscription_id);

                            button type="submit"
                                class="px-3 py-1 bg-blue-500 dark:bg-blue-600 text-white rounded"
                            {
                                @if row.status == Some(ServingStatus::Failed) {
                                    "Retry"
                                } @else {
                                    "Serve"
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod serving_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Form, extract::State, http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        food::{NewMealItem, create_meal_item, subscribe_student},
        student::{NewStudent, create_student},
        test_utils::{assert_valid_html, parse_html_document, parse_html_fragment},
    };

    use super::{ServingFormData, ServingState, get_serving_page, serve_meal_endpoint};

    fn get_test_state() -> ServingState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        ServingState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    fn insert_subscription(state: &ServingState) -> i64 {
        let connection = state.db_connection.lock().unwrap();
        let student_id = create_student(
            NewStudent {
                admission_number: "ADM-001".to_owned(),
                first_name: "Wanjiku".to_owned(),
                last_name: "Kamau".to_owned(),
                grade: 4,
                term: 1,
                guardian_name: "Grace Kamau".to_owned(),
                guardian_phone: "0722000001".to_owned(),
            },
            &connection,
        )
        .unwrap()
        .id;
        let item_id = create_meal_item(
            NewMealItem {
                name: "Lunch".to_owned(),
                price: 150.0,
            },
            &connection,
        )
        .unwrap()
        .id;

        subscribe_student(student_id, item_id, &connection).unwrap()
    }

    #[tokio::test]
    async fn checklist_shows_serve_buttons() {
        let state = get_test_state();
        insert_subscription(&state);

        let response = get_serving_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let button_selector = scraper::Selector::parse("tbody button").unwrap();
        let labels: Vec<String> = document
            .select(&button_selector)
            .map(|button| button.text().collect::<String>().trim().to_owned())
            .collect();
        assert_eq!(labels, vec!["Serve"]);
    }

    #[tokio::test]
    async fn serving_returns_the_confirmed_row() {
        let state = get_test_state();
        let subscription_id = insert_subscription(&state);

        let response = serve_meal_endpoint(
            State(state),
            Form(ServingFormData { subscription_id }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let fragment = parse_html_fragment(response).await;

        let badge_selector = scraper::Selector::parse("span").unwrap();
        let badges: Vec<String> = fragment
            .select(&badge_selector)
            .map(|span| span.text().collect::<String>())
            .collect();
        assert!(
            badges.iter().any(|text| text == "Served"),
            "want a Served badge, got {badges:?}"
        );
    }

    #[tokio::test]
    async fn serving_twice_is_a_conflict() {
        let state = get_test_state();
        let subscription_id = insert_subscription(&state);

        serve_meal_endpoint(
            State(state.clone()),
            Form(ServingFormData { subscription_id }),
        )
        .await;

        let response = serve_meal_endpoint(
            State(state),
            Form(ServingFormData { subscription_id }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
