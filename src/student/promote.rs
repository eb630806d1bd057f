//! The bulk academic transitions: end-of-year promotion and the term update.
//!
//! Both are irreversible school-wide operations, so the buttons that call
//! them are gated behind a confirmation dialog (`hx-confirm`).

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::Response,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{AppState, Error, notification::Notification};

use super::core::{promote_students, set_current_term};

/// The state needed for the bulk academic transitions.
#[derive(Debug, Clone)]
pub struct PromotionState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for PromotionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Move every active student up one grade, graduating the final grade.
pub async fn promote_students_endpoint(State(state): State<PromotionState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_notification_response();
        }
    };

    match promote_students(&connection) {
        Ok(outcome) => Notification::success(
            "Promotion complete",
            &format!(
                "{} students moved up a grade and {} graduated.",
                outcome.promoted, outcome.graduated
            ),
        )
        .render(StatusCode::OK),
        Err(error) => {
            tracing::error!("Could not promote students: {error}");

            error.into_notification_response()
        }
    }
}

/// The term update form data.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTermFormData {
    pub term: i64,
}

/// Set the current term for every active student.
pub async fn update_term_endpoint(
    State(state): State<PromotionState>,
    Form(form): Form<UpdateTermFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_notification_response();
        }
    };

    match set_current_term(form.term, &connection) {
        Ok(updated) => Notification::success(
            "Term updated",
            &format!("{updated} students moved to term {}.", form.term),
        )
        .render(StatusCode::OK),
        Err(error) => {
            tracing::error!("Could not update the term: {error}");

            error.into_notification_response()
        }
    }
}

#[cfg(test)]
mod promotion_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Form, extract::State, http::StatusCode};
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        student::{GRADE_MAX, NewStudent, StudentStatus, create_student, get_student},
    };

    use super::{PromotionState, UpdateTermFormData, promote_students_endpoint, update_term_endpoint};

    fn get_test_state() -> PromotionState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        PromotionState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn insert_student(state: &PromotionState, admission_number: &str, grade: i64) -> i64 {
        create_student(
            NewStudent {
                admission_number: admission_number.to_owned(),
                first_name: "Test".to_owned(),
                last_name: "Student".to_owned(),
                grade,
                term: 1,
                guardian_name: "Guardian".to_owned(),
                guardian_phone: "0700000000".to_owned(),
            },
            &state.db_connection.lock().unwrap(),
        )
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn promotion_endpoint_reports_the_outcome() {
        let state = get_test_state();
        let junior_id = insert_student(&state, "ADM-001", 4);
        let senior_id = insert_student(&state, "ADM-002", GRADE_MAX);

        let response = promote_students_endpoint(State(state.clone())).await;

        assert_eq!(response.status(), StatusCode::OK);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_student(junior_id, &connection).unwrap().grade, 5);
        assert_eq!(
            get_student(senior_id, &connection).unwrap().status,
            StudentStatus::Graduated
        );
    }

    #[tokio::test]
    async fn term_endpoint_updates_active_students() {
        let state = get_test_state();
        let student_id = insert_student(&state, "ADM-001", 4);

        let response =
            update_term_endpoint(State(state.clone()), Form(UpdateTermFormData { term: 2 })).await;

        assert_eq!(response.status(), StatusCode::OK);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_student(student_id, &connection).unwrap().term, 2);
    }

    #[tokio::test]
    async fn term_endpoint_rejects_out_of_range_terms() {
        let state = get_test_state();

        let response =
            update_term_endpoint(State(state), Form(UpdateTermFormData { term: 7 })).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
