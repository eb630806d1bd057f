//! Timetable slot creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    database_id::StaffId,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE,
        FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
    staff::{Staff, teachers},
    student::{GRADE_MAX, GRADE_MIN, grade_label},
};

use super::core::{NewSlot, WEEKDAY_MAX, WEEKDAY_MIN, create_slot, weekday_label};

/// The state needed for creating timetable slots.
#[derive(Debug, Clone)]
pub struct CreateSlotState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateSlotState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The slot creation form data. An empty teacher value means the lesson has
/// no teacher assigned yet.
#[derive(Debug, Clone, Deserialize)]
pub struct SlotFormData {
    pub grade: i64,
    pub weekday: i64,
    pub starts_at: String,
    pub ends_at: String,
    pub subject: String,
    pub staff_id: Option<String>,
}

impl SlotFormData {
    fn staff_id(&self) -> Option<StaffId> {
        self.staff_id
            .as_deref()
            .filter(|value| !value.is_empty())
            .and_then(|value| value.parse().ok())
    }
}

/// Render the slot creation page.
pub async fn get_new_slot_page(State(state): State<CreateSlotState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let teacher_list = teachers(&connection)?;

    Ok(new_slot_view(&teacher_list).into_response())
}

/// Handle the slot creation form submission.
pub async fn create_slot_endpoint(
    State(state): State<CreateSlotState>,
    Form(form): Form<SlotFormData>,
) -> Response {
    let staff_id = form.staff_id();

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_notification_response();
        }
    };

    match create_slot(
        NewSlot {
            grade: form.grade,
            weekday: form.weekday,
            starts_at: form.starts_at,
            ends_at: form.ends_at,
            subject: form.subject,
            staff_id,
        },
        &connection,
    ) {
        Ok(slot) => {
            let query = serde_urlencoded::to_string([("grade", slot.grade.to_string())])
                .unwrap_or_default();

            (
                HxRedirect(format!("{}?{}", endpoints::SCHEDULE_VIEW, query)),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a slot: {error}");

            error.into_notification_response()
        }
    }
}

fn new_slot_view(teachers: &[Staff]) -> Markup {
    let nav_bar = NavBar::new(endpoints::SCHEDULE_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-4" { "Add lesson" }

            form
                hx-post=(endpoints::POST_SLOT)
                hx-target-error="#notification-container"
                class="w-full space-y-4 md:space-y-6"
            {
                div
                {
                    label for="grade" class=(FORM_LABEL_STYLE) { "Grade" }
                    select id="grade" name="grade" required class=(FORM_SELECT_STYLE)
                    {
                        @for grade in GRADE_MIN..=GRADE_MAX {
                            option value=(grade) { (grade_label(grade)) }
                        }
                    }
                }

                div
                {
                    label for="weekday" class=(FORM_LABEL_STYLE) { "Day" }
                    select id="weekday" name="weekday" required class=(FORM_SELECT_STYLE)
                    {
                        @for weekday in WEEKDAY_MIN..=WEEKDAY_MAX {
                            option value=(weekday) { (weekday_label(weekday)) }
                        }
                    }
                }

                div
                {
                    label for="starts_at" class=(FORM_LABEL_STYLE) { "Starts" }
                    input id="starts_at" type="time" name="starts_at" required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="ends_at" class=(FORM_LABEL_STYLE) { "Ends" }
                    input id="ends_at" type="time" name="ends_at" required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="subject" class=(FORM_LABEL_STYLE) { "Subject" }
                    input id="subject" type="text" name="subject" placeholder="Mathematics"
                        required class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="staff_id" class=(FORM_LABEL_STYLE) { "Teacher" }
                    select id="staff_id" name="staff_id" class=(FORM_SELECT_STYLE)
                    {
                        option value="" { "Unassigned" }
                        @for teacher in teachers {
                            option value=(teacher.id) { (teacher.name) }
                        }
                    }
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add lesson" }
            }
        }
    };

    base("Add Lesson", &content)
}
