//! The page showing one staff member's record.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::StaffId,
    endpoints,
    html::{BADGE_STYLE, PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
};

use super::core::{Staff, get_staff_member};

/// The state needed for the staff detail page.
#[derive(Debug, Clone)]
pub struct StaffDetailState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for StaffDetailState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render a staff member's record page.
pub async fn get_staff_member_page(
    State(state): State<StaffDetailState>,
    Path(staff_id): Path<StaffId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let staff = get_staff_member(staff_id, &connection)?;

    Ok(staff_member_view(&staff).into_response())
}

fn staff_member_view(staff: &Staff) -> Markup {
    let nav_bar = NavBar::new(endpoints::STAFF_VIEW).into_html();

    let detail = |label: &str, value: &str| {
        html! {
            div
            {
                dt class="text-sm text-gray-500 dark:text-gray-400" { (label) }
                dd class="text-base text-gray-900 dark:text-white" { (value) }
            }
        }
    };

    let access = if staff.password_hash.is_some() {
        "Has sign-in access"
    } else {
        "No sign-in access"
    };

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-4"
            {
                (staff.name)
                " "
                span class=(BADGE_STYLE) { (staff.role.display_name()) }
            }

            dl class="grid w-full max-w-screen-md grid-cols-2 gap-4"
            {
                (detail("Email", &staff.email))
                (detail("Phone", &staff.phone))
                (detail("Sign-in", access))
            }
        }
    };

    base("Staff Member", &content)
}

#[cfg(test)]
mod staff_member_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        staff::{NewStaff, StaffRole, create_staff},
        test_utils::{assert_valid_html, parse_html_document},
    };

    use super::{StaffDetailState, get_staff_member_page};

    #[tokio::test]
    async fn shows_the_record() {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");
        let staff = create_staff(
            NewStaff {
                name: "Beatrice Njeri".to_owned(),
                role: StaffRole::Teacher,
                email: "njeri@school.ac.ke".to_owned(),
                phone: "0711000000".to_owned(),
            },
            &connection,
        )
        .unwrap();
        let state = StaffDetailState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_staff_member_page(State(state), Path(staff.id)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let heading_selector = scraper::Selector::parse("h1").unwrap();
        let heading: String = document
            .select(&heading_selector)
            .next()
            .unwrap()
            .text()
            .collect();
        assert!(heading.contains("Beatrice Njeri"));
    }

    #[tokio::test]
    async fn missing_staff_member_is_not_found() {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");
        let state = StaffDetailState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let error = get_staff_member_page(State(state), Path(999))
            .await
            .expect_err("want NotFound");

        assert_eq!(error, crate::Error::NotFound);
    }
}
