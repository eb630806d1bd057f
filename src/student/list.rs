//! The searchable, filterable, paginated student list.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    endpoints::{self, format_endpoint},
    html::{
        BADGE_STYLE, FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, link,
    },
    navigation::NavBar,
    pagination::{
        PageInfo, PageQuery, PaginationConfig, PaginationIndicator, create_pagination_indicators,
    },
};

use super::core::{
    Student, StudentFilter, StudentStatus, count_students, grade_label, list_students,
};

/// The query parameters accepted by the student list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentsQuery {
    /// Substring match against names and the admission number.
    pub search: Option<String>,
    /// Restrict to one enrollment status, e.g. "ACTIVE".
    pub status: Option<String>,
    /// The 1-based page number.
    pub page: Option<u64>,
    /// The number of rows per page.
    pub per_page: Option<u64>,
}

/// The state needed for the student list page.
#[derive(Debug, Clone)]
pub struct StudentListState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for StudentListState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// Render the student list page.
pub async fn get_students_page(
    State(state): State<StudentListState>,
    Query(query): Query<StudentsQuery>,
) -> Result<Response, Error> {
    let filter = StudentFilter {
        search: query.search.clone(),
        status: query
            .status
            .as_deref()
            .and_then(|status| StudentStatus::from_column(status).ok()),
    };

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let total = count_students(&filter, &connection)?;
    let info = PageInfo::new(
        total,
        &PageQuery {
            page: query.page,
            per_page: query.per_page,
        },
        &state.pagination_config,
    );
    let students = list_students(&filter, info.per_page, info.offset(), &connection)?;

    Ok(students_view(
        &students,
        &info,
        state.pagination_config.max_page_links,
        &query,
        filter.status,
    )
    .into_response())
}

fn students_view(
    students: &[Student],
    info: &PageInfo,
    max_page_links: u64,
    query: &StudentsQuery,
    status: Option<StudentStatus>,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::STUDENTS_VIEW).into_html();
    let search = query.search.as_deref().unwrap_or("");

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="flex w-full max-w-screen-lg items-center justify-between mb-4"
            {
                h1 class="text-2xl font-bold" { "Students" }
                (link(endpoints::NEW_STUDENT_VIEW, "Admit student"))
            }

            form method="get" action=(endpoints::STUDENTS_VIEW)
                class="flex w-full max-w-screen-lg gap-3 mb-4"
            {
                input
                    type="search"
                    name="search"
                    placeholder="Name or admission number"
                    value=(search)
                    class=(FORM_TEXT_INPUT_STYLE);

                select name="status" class=(FORM_SELECT_STYLE)
                {
                    option value="" { "All statuses" }
                    @for option in [
                        StudentStatus::Active,
                        StudentStatus::Graduated,
                        StudentStatus::Withdrawn,
                    ] {
                        option
                            value=(option.as_str())
                            selected[status == Some(option)]
                        {
                            (option.display_name())
                        }
                    }
                }

                button type="submit"
                    class="px-4 py-2 bg-blue-500 dark:bg-blue-600 text-white rounded"
                {
                    "Search"
                }
            }

            p class="self-start text-sm text-gray-500 dark:text-gray-400 mb-2"
            {
                (info.total) " students · page " (info.current_page) " of " (info.pages)
            }

            @if students.is_empty() {
                p class="text-gray-500 dark:text-gray-400 py-4" { "No students match." }
            } @else {
                table class="w-full max-w-screen-lg text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th class=(TABLE_CELL_STYLE) { "Admission no." }
                            th class=(TABLE_CELL_STYLE) { "Name" }
                            th class=(TABLE_CELL_STYLE) { "Grade" }
                            th class=(TABLE_CELL_STYLE) { "Status" }
                        }
                    }

                    tbody
                    {
                        @for student in students {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE) { (student.admission_number) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    a
                                        href=(format_endpoint(endpoints::STUDENT_VIEW, student.id))
                                        class=(LINK_STYLE)
                                    {
                                        (student.full_name())
                                    }
                                }
                                td class=(TABLE_CELL_STYLE) { (grade_label(student.grade)) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    span class=(BADGE_STYLE) { (student.status.display_name()) }
                                }
                            }
                        }
                    }
                }
            }

            (pagination_strip(info, max_page_links, query))

            (transitions_panel())
        }
    };

    base("Students", &content)
}

/// The end-of-year and term transition controls. Both are irreversible bulk
/// operations, so they sit behind confirmation dialogs.
fn transitions_panel() -> Markup {
    html! {
        div class="w-full max-w-screen-lg mt-8 border-t border-gray-200 dark:border-gray-700 pt-4"
        {
            h2 class="text-xl font-semibold mb-2" { "Academic transitions" }

            div class="flex flex-wrap items-end gap-4"
            {
                button
                    hx-post=(endpoints::PROMOTE_STUDENTS)
                    hx-confirm="Promote every active student one grade and graduate the final grade? This cannot be undone."
                    hx-target="#notification-container"
                    hx-disabled-elt="this"
                    class="px-4 py-2 bg-blue-500 dark:bg-blue-600 text-white rounded"
                {
                    "Promote all students"
                }

                form
                    hx-post=(endpoints::UPDATE_TERM)
                    hx-confirm="Move every active student to the selected term?"
                    hx-target="#notification-container"
                    hx-disabled-elt="find button"
                    class="flex items-end gap-2"
                {
                    select name="term" required class=(FORM_SELECT_STYLE)
                    {
                        @for term in 1..=3 {
                            option value=(term) { "Term " (term) }
                        }
                    }

                    button type="submit"
                        class="px-4 py-2 bg-blue-500 dark:bg-blue-600 text-white rounded"
                    {
                        "Set term"
                    }
                }
            }
        }
    }
}

fn page_url(query: &StudentsQuery, page: u64) -> String {
    let mut params: Vec<(&str, String)> = vec![("page", page.to_string())];

    if let Some(search) = &query.search
        && !search.is_empty()
    {
        params.push(("search", search.clone()));
    }

    if let Some(status) = &query.status
        && !status.is_empty()
    {
        params.push(("status", status.clone()));
    }

    if let Some(per_page) = query.per_page {
        params.push(("per_page", per_page.to_string()));
    }

    match serde_urlencoded::to_string(&params) {
        Ok(encoded) => format!("{}?{}", endpoints::STUDENTS_VIEW, encoded),
        Err(error) => {
            tracing::error!("Could not encode student list query: {error}");
            endpoints::STUDENTS_VIEW.to_owned()
        }
    }
}

fn pagination_strip(info: &PageInfo, max_page_links: u64, query: &StudentsQuery) -> Markup {
    let indicators = create_pagination_indicators(info, max_page_links);

    html! {
        nav class="flex items-center gap-1 my-4" aria-label="Pagination"
        {
            @for indicator in indicators {
                @match indicator {
                    PaginationIndicator::CurrPage(page) => {
                        span class="px-3 py-1 rounded bg-blue-600 text-white" { (page) }
                    }
                    PaginationIndicator::Page(page) => {
                        a href=(page_url(query, page)) class=(LINK_STYLE) { (page) }
                    }
                    PaginationIndicator::Ellipsis => {
                        span class="px-1 text-gray-500" { "…" }
                    }
                    PaginationIndicator::BackButton(page) => {
                        a href=(page_url(query, page)) class=(LINK_STYLE) { "Previous" }
                    }
                    PaginationIndicator::NextButton(page) => {
                        a href=(page_url(query, page)) class=(LINK_STYLE) { "Next" }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod students_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Query, State},
        http::StatusCode,
    };
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        pagination::PaginationConfig,
        student::{NewStudent, create_student},
        test_utils::{assert_valid_html, parse_html_document},
    };

    use super::{StudentListState, StudentsQuery, get_students_page};

    fn get_test_state() -> StudentListState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        StudentListState {
            db_connection: Arc::new(Mutex::new(connection)),
            pagination_config: PaginationConfig::default(),
        }
    }

    fn insert_students(state: &StudentListState, count: usize) {
        let connection = state.db_connection.lock().unwrap();
        for i in 1..=count {
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
            .unwrap();
        }
    }

    #[tokio::test]
    async fn lists_students_with_pagination_strip() {
        let state = get_test_state();
        insert_students(&state, 25);

        let response = get_students_page(State(state), Query(StudentsQuery::default()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let row_selector = scraper::Selector::parse("tbody tr").unwrap();
        assert_eq!(document.select(&row_selector).count(), 20);

        let next_selector = scraper::Selector::parse("nav[aria-label=Pagination] a").unwrap();
        let links: Vec<String> = document
            .select(&next_selector)
            .map(|a| a.text().collect())
            .collect();
        assert!(links.contains(&"Next".to_owned()));
    }

    #[tokio::test]
    async fn search_narrows_the_list() {
        let state = get_test_state();
        insert_students(&state, 5);

        let response = get_students_page(
            State(state),
            Query(StudentsQuery {
                search: Some("ADM-003".to_owned()),
                ..StudentsQuery::default()
            }),
        )
        .await
        .unwrap();

        let document = parse_html_document(response).await;
        let row_selector = scraper::Selector::parse("tbody tr").unwrap();
        assert_eq!(document.select(&row_selector).count(), 1);
    }

    #[tokio::test]
    async fn unknown_status_filter_is_ignored() {
        let state = get_test_state();
        insert_students(&state, 3);

        let response = get_students_page(
            State(state),
            Query(StudentsQuery {
                status: Some("NONSENSE".to_owned()),
                ..StudentsQuery::default()
            }),
        )
        .await
        .unwrap();

        let document = parse_html_document(response).await;
        let row_selector = scraper::Selector::parse("tbody tr").unwrap();
        assert_eq!(document.select(&row_selector).count(), 3);
    }
}
