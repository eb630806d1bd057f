//! Student admission page and endpoint.

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
    AppState, Error, endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE,
        FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
};

use super::core::{GRADE_MAX, GRADE_MIN, NewStudent, create_student, grade_label};

/// The state needed for admitting a student.
#[derive(Debug, Clone)]
pub struct CreateStudentState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateStudentState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The admission form data.
#[derive(Debug, Clone, Deserialize)]
pub struct StudentFormData {
    pub admission_number: String,
    pub first_name: String,
    pub last_name: String,
    pub grade: i64,
    pub term: i64,
    pub guardian_name: String,
    pub guardian_phone: String,
}

/// Render the student admission page.
pub async fn get_new_student_page() -> Response {
    new_student_view().into_response()
}

/// Handle the student admission form submission.
pub async fn create_student_endpoint(
    State(state): State<CreateStudentState>,
    Form(new_student): Form<StudentFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_notification_response();
        }
    };

    match create_student(
        NewStudent {
            admission_number: new_student.admission_number,
            first_name: new_student.first_name,
            last_name: new_student.last_name,
            grade: new_student.grade,
            term: new_student.term,
            guardian_name: new_student.guardian_name,
            guardian_phone: new_student.guardian_phone,
        },
        &connection,
    ) {
        Ok(_) => (
            HxRedirect(endpoints::STUDENTS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while admitting a student: {error}");

            error.into_notification_response()
        }
    }
}

fn new_student_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::STUDENTS_VIEW).into_html();

    let text_field = |id: &str, name: &str, label: &str, placeholder: &str| {
        html! {
            div
            {
                label for=(id) class=(FORM_LABEL_STYLE) { (label) }
                input id=(id) type="text" name=(name) placeholder=(placeholder) required
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }
    };

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-4" { "Admit student" }

            form
                hx-post=(endpoints::POST_STUDENT)
                hx-target-error="#notification-container"
                class="w-full space-y-4 md:space-y-6"
            {
                (text_field("admission_number", "admission_number", "Admission number", "ADM-123"))
                (text_field("first_name", "first_name", "First name", "First name"))
                (text_field("last_name", "last_name", "Last name", "Last name"))

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
                    label for="term" class=(FORM_LABEL_STYLE) { "Term" }
                    select id="term" name="term" required class=(FORM_SELECT_STYLE)
                    {
                        @for term in 1..=3 {
                            option value=(term) { "Term " (term) }
                        }
                    }
                }

                (text_field("guardian_name", "guardian_name", "Guardian name", "Guardian name"))
                (text_field("guardian_phone", "guardian_phone", "Guardian phone", "07xx xxx xxx"))

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Admit student" }
            }
        }
    };

    base("Admit Student", &content)
}

#[cfg(test)]
mod new_student_page_tests {
    use axum::http::StatusCode;

    use crate::{
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_valid_html,
            must_get_form, parse_html_document,
        },
    };

    use super::get_new_student_page;

    #[tokio::test]
    async fn render_page() {
        let response = get_new_student_page().await;

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::POST_STUDENT, "hx-post");
        assert_form_input(&form, "admission_number", "text");
        assert_form_input(&form, "first_name", "text");
        assert_form_input(&form, "last_name", "text");
        assert_form_input(&form, "guardian_phone", "text");
        assert_form_submit_button(&form);
    }
}
