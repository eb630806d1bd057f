//! The daily attendance sheet: pick a grade and date, mark every student,
//! submit the register as one batch.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    endpoints,
    html::{
        FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, stat_card,
    },
    ledger::parse_entry_date,
    navigation::NavBar,
    student::{GRADE_MAX, GRADE_MIN, grade_label},
    timezone::local_date_today,
};

use super::core::{
    AttendanceCounts, AttendanceMark, AttendanceStatus, SheetRow, attendance_rate,
    grade_attendance_sheet, mark_attendance_batch,
};

/// The query parameters accepted by the attendance page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceQuery {
    /// The grade whose register to show. Defaults to the first grade.
    pub grade: Option<i64>,
    /// The date to show, "YYYY-MM-DD". Defaults to today.
    pub date: Option<String>,
}

/// The state needed for the attendance pages and endpoints.
#[derive(Debug, Clone)]
pub struct AttendanceState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for AttendanceState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Render the attendance sheet for a grade and date.
pub async fn get_attendance_page(
    State(state): State<AttendanceState>,
    Query(query): Query<AttendanceQuery>,
) -> Result<Response, Error> {
    let today = local_date_today(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;

    let grade = query.grade.unwrap_or(GRADE_MIN).clamp(GRADE_MIN, GRADE_MAX);
    let date = match query.date.as_deref() {
        Some(raw_date) => parse_entry_date(raw_date)?,
        None => today,
    };

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let sheet = grade_attendance_sheet(grade, date, &connection)?;

    Ok(attendance_view(&sheet, grade, date).into_response())
}

/// The batch marking form data. Marks arrive as one field per student named
/// `status_{student_id}`, alongside the `grade` and `date` fields.
#[derive(Debug, Clone)]
pub struct AttendanceBatch {
    pub grade: i64,
    pub date: Date,
    pub marks: Vec<AttendanceMark>,
}

fn parse_batch(fields: &[(String, String)]) -> Result<AttendanceBatch, Error> {
    let mut grade = None;
    let mut date = None;
    let mut marks = Vec::new();

    for (key, value) in fields {
        match key.as_str() {
            "grade" => {
                grade = value.parse::<i64>().ok();
            }
            "date" => {
                date = Some(parse_entry_date(value)?);
            }
            key => {
                if let Some(raw_id) = key.strip_prefix("status_") {
                    let student_id = raw_id
                        .parse()
                        .map_err(|_| Error::InvalidColumnValue(key.to_owned(), "student_id"))?;
                    let status = AttendanceStatus::from_column(value)?;

                    marks.push(AttendanceMark { student_id, status });
                }
            }
        }
    }

    let grade = grade.ok_or_else(|| Error::InvalidColumnValue("grade".to_owned(), "grade"))?;
    let date = date.ok_or_else(|| Error::InvalidDate(String::new()))?;

    Ok(AttendanceBatch { grade, date, marks })
}

/// Handle the batch attendance upsert for one grade and date.
pub async fn mark_attendance_endpoint(
    State(state): State<AttendanceState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let batch = match parse_batch(&fields) {
        Ok(batch) => batch,
        Err(error) => return error.into_notification_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_notification_response();
        }
    };

    match mark_attendance_batch(&batch.marks, batch.date, &connection) {
        Ok(_) => {
            let query = serde_urlencoded::to_string([
                ("grade", batch.grade.to_string()),
                ("date", batch.date.to_string()),
            ])
            .unwrap_or_default();

            (
                HxRedirect(format!("{}?{}", endpoints::ATTENDANCE_VIEW, query)),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not mark attendance: {error}");

            error.into_notification_response()
        }
    }
}

fn attendance_view(sheet: &[SheetRow], grade: i64, date: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::ATTENDANCE_VIEW).into_html();

    let counts = sheet.iter().fold(
        AttendanceCounts::default(),
        |mut counts, row| {
            match row.status {
                Some(AttendanceStatus::Present) => counts.present += 1,
                Some(AttendanceStatus::Late) => counts.late += 1,
                Some(AttendanceStatus::Absent) => counts.absent += 1,
                None => {}
            }
            counts
        },
    );
    let rate = attendance_rate(counts);

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-4" { "Attendance" }

            form method="get" action=(endpoints::ATTENDANCE_VIEW)
                class="flex w-full max-w-screen-lg items-end gap-3 mb-4"
            {
                div
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
                }

                input type="date" name="date" value=(date) class=(FORM_TEXT_INPUT_STYLE)
                    style="max-width: 12rem";

                button type="submit"
                    class="px-4 py-2 bg-blue-500 dark:bg-blue-600 text-white rounded"
                {
                    "Show register"
                }
            }

            div class="grid w-full max-w-screen-lg grid-cols-2 gap-4 sm:grid-cols-4 mb-4"
            {
                (stat_card("Attendance rate", &format!("{rate:.1}%")))
                (stat_card("Present", &counts.present.to_string()))
                (stat_card("Late", &counts.late.to_string()))
                (stat_card("Absent", &counts.absent.to_string()))
            }

            @if sheet.is_empty() {
                p class="text-gray-500 dark:text-gray-400 py-4"
                {
                    "No active students in " (grade_label(grade)) "."
                }
            } @else {
                form
                    hx-post=(endpoints::POST_ATTENDANCE_BATCH)
                    hx-target-error="#notification-container"
                    hx-disabled-elt="find button"
                    class="w-full max-w-screen-lg"
                {
                    input type="hidden" name="grade" value=(grade);
                    input type="hidden" name="date" value=(date);

                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th class=(TABLE_CELL_STYLE) { "Student" }
                                @for status in [
                                    AttendanceStatus::Present,
                                    AttendanceStatus::Late,
                                    AttendanceStatus::Absent,
                                ] {
                                    th class=(TABLE_CELL_STYLE) { (status.display_name()) }
                                }
                            }
                        }

                        tbody
                        {
                            @for row in sheet {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE) { (row.student.full_name()) }
                                    @for status in [
                                        AttendanceStatus::Present,
                                        AttendanceStatus::Late,
                                        AttendanceStatus::Absent,
                                    ] {
                                        td class=(TABLE_CELL_STYLE)
                                        {
                                            input
                                                type="radio"
                                                name=(format!("status_{}", row.student.id))
                                                value=(status.as_str())
                                                checked[row.status == Some(status)]
                                                required;
                                        }
                                    }
                                }
                            }
                        }
                    }

                    button type="submit"
                        class="mt-4 px-4 py-2 bg-blue-500 dark:bg-blue-600 text-white rounded"
                    {
                        "Save register"
                    }
                }
            }
        }
    };

    base("Attendance", &content)
}

#[cfg(test)]
mod attendance_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form,
        extract::{Query, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        student::{NewStudent, create_student},
        test_utils::{assert_valid_html, get_header, parse_html_document},
    };

    use super::{AttendanceQuery, AttendanceState, get_attendance_page, mark_attendance_endpoint};

    fn get_test_state() -> AttendanceState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        AttendanceState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    fn insert_students(state: &AttendanceState, count: usize) -> Vec<i64> {
        let connection = state.db_connection.lock().unwrap();
        (1..=count)
            .map(|i| {
                create_student(
                    NewStudent {
                        admission_number: format!("ADM-{i:03}"),
                        first_name: format!("Student{i}"),
                        last_name: "Test".to_owned(),
                        grade: 4,
                        term: 1,
                        guardian_name: "Guardian".to_owned(),
                        guardian_phone: "0700000000".to_owned(),
                    },
                    &connection,
                )
                .unwrap()
                .id
            })
            .collect()
    }

    #[tokio::test]
    async fn batch_submit_saves_and_redirects_to_the_register() {
        let state = get_test_state();
        let students = insert_students(&state, 2);

        let fields = vec![
            ("grade".to_owned(), "4".to_owned()),
            ("date".to_owned(), "2025-06-10".to_owned()),
            (format!("status_{}", students[0]), "PRESENT".to_owned()),
            (format!("status_{}", students[1]), "ABSENT".to_owned()),
        ];

        let response = mark_attendance_endpoint(State(state.clone()), Form(fields))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = get_header(&response, "hx-redirect");
        assert!(location.contains("grade=4"), "got redirect {location}");
        assert!(location.contains("date=2025-06-10"), "got redirect {location}");

        let response = get_attendance_page(
            State(state),
            Query(AttendanceQuery {
                grade: Some(4),
                date: Some("2025-06-10".to_owned()),
            }),
        )
        .await
        .unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let checked_selector = scraper::Selector::parse("input[type=radio][checked]").unwrap();
        assert_eq!(document.select(&checked_selector).count(), 2);
    }

    #[tokio::test]
    async fn unknown_status_is_a_bad_request() {
        let state = get_test_state();
        let students = insert_students(&state, 1);

        let fields = vec![
            ("grade".to_owned(), "4".to_owned()),
            ("date".to_owned(), "2025-06-10".to_owned()),
            (format!("status_{}", students[0]), "SLEEPING".to_owned()),
        ];

        let response = mark_attendance_endpoint(State(state), Form(fields))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_page_renders_radio_rows() {
        let state = get_test_state();
        insert_students(&state, 3);

        let response = get_attendance_page(
            State(state),
            Query(AttendanceQuery {
                grade: Some(4),
                date: None,
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        let radio_selector = scraper::Selector::parse("input[type=radio]").unwrap();
        assert_eq!(document.select(&radio_selector).count(), 9);
    }
}
