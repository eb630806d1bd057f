//! The staff directory with its debounced search field.

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
        FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, link,
    },
    navigation::NavBar,
};

use super::core::{Staff, search_staff};

/// The query parameters accepted by the staff directory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaffQuery {
    /// Substring match against names and emails.
    pub search: Option<String>,
}

/// The state needed for the staff directory page.
#[derive(Debug, Clone)]
pub struct StaffListState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for StaffListState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the staff directory page.
pub async fn get_staff_page(
    State(state): State<StaffListState>,
    Query(query): Query<StaffQuery>,
) -> Result<Response, Error> {
    let search = query.search.unwrap_or_default();

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let staff = search_staff(&search, &connection)?;

    Ok(staff_view(&staff, &search).into_response())
}

fn staff_view(staff: &[Staff], search: &str) -> Markup {
    let nav_bar = NavBar::new(endpoints::STAFF_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="flex w-full max-w-screen-lg items-center justify-between mb-4"
            {
                h1 class="text-2xl font-bold" { "Staff" }
                (link(endpoints::NEW_STAFF_VIEW, "Add staff member"))
            }

            // Refetch as the user types; the delay keeps one request per
            // pause instead of one per keystroke.
            input
                type="search"
                name="search"
                placeholder="Search by name or email"
                value=(search)
                hx-get=(endpoints::STAFF_VIEW)
                hx-trigger="input changed delay:300ms"
                hx-target="#staff-table"
                hx-select="#staff-table"
                hx-swap="outerHTML"
                class=(FORM_TEXT_INPUT_STYLE)
                style="max-width: 32rem";

            div id="staff-table" class="w-full max-w-screen-lg mt-4"
            {
                @if staff.is_empty() {
                    p class="text-gray-500 dark:text-gray-400 py-4" { "No staff match." }
                } @else {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th class=(TABLE_CELL_STYLE) { "Name" }
                                th class=(TABLE_CELL_STYLE) { "Role" }
                                th class=(TABLE_CELL_STYLE) { "Email" }
                                th class=(TABLE_CELL_STYLE) { "Phone" }
                            }
                        }

                        tbody
                        {
                            @for member in staff {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        a
                                            href=(format_endpoint(endpoints::STAFF_MEMBER_VIEW, member.id))
                                            class=(LINK_STYLE)
                                        {
                                            (member.name)
                                        }
                                    }
                                    td class=(TABLE_CELL_STYLE) { (member.role.display_name()) }
                                    td class=(TABLE_CELL_STYLE) { (member.email) }
                                    td class=(TABLE_CELL_STYLE) { (member.phone) }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Staff", &content)
}

#[cfg(test)]
mod staff_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Query, State},
        http::StatusCode,
    };
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        staff::{NewStaff, StaffRole, create_staff},
        test_utils::{assert_valid_html, parse_html_document},
    };

    use super::{StaffListState, StaffQuery, get_staff_page};

    fn get_test_state() -> StaffListState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        StaffListState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn insert_staff(state: &StaffListState, name: &str, email: &str) {
        create_staff(
            NewStaff {
                name: name.to_owned(),
                role: StaffRole::Teacher,
                email: email.to_owned(),
                phone: "0711000000".to_owned(),
            },
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn search_input_is_debounced() {
        let state = get_test_state();
        insert_staff(&state, "Beatrice Njeri", "njeri@school.ac.ke");

        let response = get_staff_page(State(state), Query(StaffQuery::default()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let input_selector = scraper::Selector::parse("input[type=search]").unwrap();
        let input = document
            .select(&input_selector)
            .next()
            .expect("want a search input");
        assert_eq!(
            input.value().attr("hx-trigger"),
            Some("input changed delay:300ms"),
            "search refetch should be debounced"
        );
    }

    #[tokio::test]
    async fn search_narrows_the_directory() {
        let state = get_test_state();
        insert_staff(&state, "Beatrice Njeri", "njeri@school.ac.ke");
        insert_staff(&state, "Daniel Kiprotich", "kiprotich@school.ac.ke");

        let response = get_staff_page(
            State(state),
            Query(StaffQuery {
                search: Some("Njeri".to_owned()),
            }),
        )
        .await
        .unwrap();

        let document = parse_html_document(response).await;
        let row_selector = scraper::Selector::parse("tbody tr").unwrap();
        assert_eq!(document.select(&row_selector).count(), 1);
    }
}
