//! The page showing one student's record with links to their accounts.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::StudentId,
    endpoints::{self, format_endpoint},
    html::{BADGE_STYLE, PAGE_CONTAINER_STYLE, base, link},
    navigation::NavBar,
};

use super::core::{Student, get_student, grade_label};

/// The state needed for the student detail page.
#[derive(Debug, Clone)]
pub struct StudentDetailState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for StudentDetailState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render a student's record page.
pub async fn get_student_page(
    State(state): State<StudentDetailState>,
    Path(student_id): Path<StudentId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let student = get_student(student_id, &connection)?;

    Ok(student_view(&student).into_response())
}

fn student_view(student: &Student) -> Markup {
    let nav_bar = NavBar::new(endpoints::STUDENTS_VIEW).into_html();

    let detail = |label: &str, value: &str| {
        html! {
            div
            {
                dt class="text-sm text-gray-500 dark:text-gray-400" { (label) }
                dd class="text-base text-gray-900 dark:text-white" { (value) }
            }
        }
    };

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="flex w-full max-w-screen-md items-center justify-between mb-4"
            {
                h1 class="text-2xl font-bold"
                {
                    (student.full_name())
                    " "
                    span class=(BADGE_STYLE) { (student.status.display_name()) }
                }
                (link(
                    &format_endpoint(endpoints::EDIT_STUDENT_VIEW, student.id),
                    "Edit record",
                ))
            }

            dl class="grid w-full max-w-screen-md grid-cols-2 gap-4"
            {
                (detail("Admission number", &student.admission_number))
                (detail("Grade", &format!("{}, term {}", grade_label(student.grade), student.term)))
                (detail("Guardian", &student.guardian_name))
                (detail("Guardian phone", &student.guardian_phone))
            }

            h2 class="text-xl font-semibold self-start mt-6 mb-2" { "Accounts" }

            ul class="self-start list-disc list-inside space-y-1"
            {
                li { (link(&format_endpoint(endpoints::STUDENT_FEES_VIEW, student.id), "Fee ledger")) }
                li { (link(&format_endpoint(endpoints::STUDENT_FOOD_VIEW, student.id), "Food account")) }
                li { (link(&format_endpoint(endpoints::STUDENT_TRANSPORT_VIEW, student.id), "Transport account")) }
            }
        }
    };

    base("Student", &content)
}
