//! Student record edit page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    database_id::StudentId,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE,
        FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
};

use super::core::{
    GRADE_MAX, GRADE_MIN, Student, StudentStatus, StudentUpdate, get_student, grade_label,
    update_student,
};

/// The state needed for editing a student record.
#[derive(Debug, Clone)]
pub struct EditStudentState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditStudentState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The edit form data. The admission number is immutable and not included.
#[derive(Debug, Clone, Deserialize)]
pub struct EditStudentFormData {
    pub first_name: String,
    pub last_name: String,
    pub grade: i64,
    pub term: i64,
    pub status: StudentStatus,
    pub guardian_name: String,
    pub guardian_phone: String,
}

/// Render the student edit page.
pub async fn get_edit_student_page(
    State(state): State<EditStudentState>,
    Path(student_id): Path<StudentId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let student = get_student(student_id, &connection)?;

    Ok(edit_student_view(&student).into_response())
}

/// Handle the student edit form submission.
pub async fn update_student_endpoint(
    State(state): State<EditStudentState>,
    Path(student_id): Path<StudentId>,
    Form(update): Form<EditStudentFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_notification_response();
        }
    };

    match update_student(
        student_id,
        StudentUpdate {
            first_name: update.first_name,
            last_name: update.last_name,
            grade: update.grade,
            term: update.term,
            status: update.status,
            guardian_name: update.guardian_name,
            guardian_phone: update.guardian_phone,
        },
        &connection,
    ) {
        Ok(()) => (
            HxRedirect(format_endpoint(endpoints::STUDENT_VIEW, student_id)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while updating a student: {error}");

            error.into_notification_response()
        }
    }
}

fn edit_student_view(student: &Student) -> Markup {
    let nav_bar = NavBar::new(endpoints::STUDENTS_VIEW).into_html();

    let text_field = |id: &str, name: &str, label: &str, value: &str| {
        html! {
            div
            {
                label for=(id) class=(FORM_LABEL_STYLE) { (label) }
                input id=(id) type="text" name=(name) value=(value) required
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }
    };

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-1" { "Edit " (student.full_name()) }
            p class="text-sm text-gray-500 dark:text-gray-400 mb-4" { (student.admission_number) }

            form
                hx-put=(format_endpoint(endpoints::PUT_STUDENT, student.id))
                hx-target-error="#notification-container"
                class="w-full space-y-4 md:space-y-6"
            {
                (text_field("first_name", "first_name", "First name", &student.first_name))
                (text_field("last_name", "last_name", "Last name", &student.last_name))

                div
                {
                    label for="grade" class=(FORM_LABEL_STYLE) { "Grade" }
                    select id="grade" name="grade" required class=(FORM_SELECT_STYLE)
                    {
                        @for grade in GRADE_MIN..=GRADE_MAX {
                            option value=(grade) selected[grade == student.grade]
                            {
                                (grade_label(grade))
                            }
                        }
                    }
                }

                div
                {
                    label for="term" class=(FORM_LABEL_STYLE) { "Term" }
                    select id="term" name="term" required class=(FORM_SELECT_STYLE)
                    {
                        @for term in 1..=3 {
                            option value=(term) selected[term == student.term] { "Term " (term) }
                        }
                    }
                }

                div
                {
                    label for="status" class=(FORM_LABEL_STYLE) { "Status" }
                    select id="status" name="status" required class=(FORM_SELECT_STYLE)
                    {
                        @for option in [
                            StudentStatus::Active,
                            StudentStatus::Graduated,
                            StudentStatus::Withdrawn,
                        ] {
                            option
                                value=(option.as_str())
                                selected[option == student.status]
                            {
                                (option.display_name())
                            }
                        }
                    }
                }

                (text_field("guardian_name", "guardian_name", "Guardian name", &student.guardian_name))
                (text_field("guardian_phone", "guardian_phone", "Guardian phone", &student.guardian_phone))

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save changes" }
            }
        }
    };

    base("Edit Student", &content)
}

#[cfg(test)]
mod edit_student_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        endpoints::{self, format_endpoint},
        student::{NewStudent, StudentStatus, create_student, get_student},
        test_utils::{
            assert_hx_endpoint, assert_hx_redirect, assert_valid_html, must_get_form,
            parse_html_document,
        },
    };

    use super::{EditStudentFormData, EditStudentState, get_edit_student_page, update_student_endpoint};

    fn get_test_state() -> (EditStudentState, i64) {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");
        let student = create_student(
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
        .unwrap();

        (
            EditStudentState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            student.id,
        )
    }

    #[tokio::test]
    async fn render_page_with_current_values() {
        let (state, student_id) = get_test_state();

        let response = get_edit_student_page(State(state), Path(student_id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &format_endpoint(endpoints::PUT_STUDENT, student_id),
            "hx-put",
        );
    }

    #[tokio::test]
    async fn update_saves_and_redirects() {
        let (state, student_id) = get_test_state();
        let form = EditStudentFormData {
            first_name: "Atieno".to_owned(),
            last_name: "Kamau".to_owned(),
            grade: 5,
            term: 2,
            status: StudentStatus::Active,
            guardian_name: "Grace Kamau".to_owned(),
            guardian_phone: "0722000002".to_owned(),
        };

        let response = update_student_endpoint(State(state.clone()), Path(student_id), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(
            &response,
            &format_endpoint(endpoints::STUDENT_VIEW, student_id),
        );

        let connection = state.db_connection.lock().unwrap();
        let student = get_student(student_id, &connection).unwrap();
        assert_eq!(student.first_name, "Atieno");
        assert_eq!(student.grade, 5);
    }

    #[tokio::test]
    async fn update_of_missing_student_is_not_found() {
        let (state, _) = get_test_state();
        let form = EditStudentFormData {
            first_name: "Atieno".to_owned(),
            last_name: "Kamau".to_owned(),
            grade: 5,
            term: 2,
            status: StudentStatus::Active,
            guardian_name: "Grace Kamau".to_owned(),
            guardian_phone: "0722000002".to_owned(),
        };

        let response = update_student_endpoint(State(state), Path(999), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
