//! The weekly timetable page, slots bucketed into weekday columns.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, Query, State},
    response::{Html, IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    database_id::SlotId,
    endpoints::{self, format_endpoint},
    html::{BUTTON_DANGER_STYLE, FORM_SELECT_STYLE, PAGE_CONTAINER_STYLE, base, link},
    ledger::group_by_key,
    navigation::NavBar,
    student::{GRADE_MAX, GRADE_MIN, grade_label},
};

use super::core::{Slot, delete_slot, slots_for_grade, weekday_label};

/// The query parameters accepted by the timetable page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleQuery {
    /// The grade whose timetable to show. Defaults to the first grade.
    pub grade: Option<i64>,
}

/// The state needed for the timetable pages and endpoints.
#[derive(Debug, Clone)]
pub struct ScheduleState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ScheduleState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render a grade's weekly timetable.
pub async fn get_schedule_page(
    State(state): State<ScheduleState>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Response, Error> {
    let grade = query.grade.unwrap_or(GRADE_MIN).clamp(GRADE_MIN, GRADE_MAX);

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let slots = slots_for_grade(grade, &connection)?;

    Ok(schedule_view(slots, grade).into_response())
}

/// A route handler for deleting a timetable slot, clears the entry on
/// success.
pub async fn delete_slot_endpoint(
    State(state): State<ScheduleState>,
    Path(slot_id): Path<SlotId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_notification_response();
        }
    };

    match delete_slot(slot_id, &connection) {
        // The status code has to be 200 OK or HTMX will not clear the entry.
        Ok(()) => Html("").into_response(),
        Err(error) => {
            tracing::error!("Could not delete timetable slot {slot_id}: {error}");

            error.into_notification_response()
        }
    }
}

fn schedule_view(slots: Vec<Slot>, grade: i64) -> Markup {
    let nav_bar = NavBar::new(endpoints::SCHEDULE_VIEW).into_html();

    // Slots arrive ordered by weekday then start time, so the buckets come
    // out Monday-first with lessons in teaching order.
    let days = group_by_key(slots, |slot| weekday_label(slot.weekday));

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="flex w-full max-w-screen-lg items-center justify-between mb-4"
            {
                h1 class="text-2xl font-bold" { "Timetable — " (grade_label(grade)) }
                (link(endpoints::NEW_SLOT_VIEW, "Add lesson"))
            }

            form method="get" action=(endpoints::SCHEDULE_VIEW)
                class="flex items-end gap-2 self-start mb-4"
            {
                select name="grade" class=(FORM_SELECT_STYLE)
                {
                    @for option in GRADE_MIN..=GRADE_MAX {
                        option value=(option) selected[option == grade]
                        {
                            (grade_label(option))
                        }
                    }
                }

                button type="submit"
                    class="px-4 py-2 bg-blue-500 dark:bg-blue-600 text-white rounded"
                {
                    "Show"
                }
            }

            @if days.is_empty() {
                p class="text-gray-500 dark:text-gray-400 py-4"
                {
                    "No lessons scheduled for " (grade_label(grade)) "."
                }
            } @else {
                div class="grid w-full max-w-screen-lg grid-cols-1 gap-4 md:grid-cols-5"
                {
                    @for (day, lessons) in &days {
                        div class="rounded-lg border border-gray-200 bg-white p-3 dark:border-gray-700 dark:bg-gray-800"
                        {
                            h2 class="font-semibold mb-2" { (day) }

                            ul class="space-y-2"
                            {
                                @for slot in lessons {
                                    li class="text-sm border-b border-gray-100 dark:border-gray-700 pb-1"
                                    {
                                        p class="font-medium" { (slot.subject) }
                                        p class="text-gray-500 dark:text-gray-400"
                                        {
                                            (slot.starts_at) "–" (slot.ends_at)

                                            @if let Some(teacher) = &slot.teacher_name {
                                                " · " (teacher)
                                            }
                                        }

                                        button
                                            hx-delete=(format_endpoint(endpoints::DELETE_SLOT, slot.id))
                                            hx-confirm="Remove this lesson?"
                                            hx-target="closest li"
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
        }
    };

    base("Timetable", &content)
}

#[cfg(test)]
mod schedule_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, Query, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        schedule::{NewSlot, create_slot},
        test_utils::{assert_valid_html, parse_html_document},
    };

    use super::{ScheduleQuery, ScheduleState, delete_slot_endpoint, get_schedule_page};

    fn get_test_state() -> ScheduleState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        ScheduleState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn insert_slot(state: &ScheduleState, weekday: i64, starts_at: &str, subject: &str) -> i64 {
        let connection = state.db_connection.lock().unwrap();
        create_slot(
            NewSlot {
                grade: 4,
                weekday,
                starts_at: starts_at.to_owned(),
                ends_at: "09:00".to_owned(),
                subject: subject.to_owned(),
                staff_id: None,
            },
            &connection,
        )
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn timetable_buckets_lessons_by_day() {
        let state = get_test_state();
        insert_slot(&state, 1, "08:00", "Mathematics");
        insert_slot(&state, 1, "10:00", "Science");
        insert_slot(&state, 3, "08:00", "English");

        let response = get_schedule_page(
            State(state),
            Query(ScheduleQuery { grade: Some(4) }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let day_selector = scraper::Selector::parse("div.grid h2").unwrap();
        let days: Vec<String> = document
            .select(&day_selector)
            .map(|h2| h2.text().collect())
            .collect();
        assert_eq!(days, vec!["Monday", "Wednesday"]);
    }

    #[tokio::test]
    async fn delete_clears_the_slot() {
        let state = get_test_state();
        let slot_id = insert_slot(&state, 1, "08:00", "Mathematics");

        let response = delete_slot_endpoint(State(state.clone()), Path(slot_id))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let response = delete_slot_endpoint(State(state), Path(slot_id))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
