//! Staff creation page and endpoint.

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

use super::core::{NewStaff, StaffRole, create_staff};

/// The state needed for creating a staff record.
#[derive(Debug, Clone)]
pub struct CreateStaffState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateStaffState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The staff creation form data.
#[derive(Debug, Clone, Deserialize)]
pub struct StaffFormData {
    pub name: String,
    pub role: StaffRole,
    pub email: String,
    pub phone: String,
}

/// Render the staff creation page.
pub async fn get_new_staff_page() -> Response {
    new_staff_view().into_response()
}

/// Handle the staff creation form submission.
pub async fn create_staff_endpoint(
    State(state): State<CreateStaffState>,
    Form(new_staff): Form<StaffFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_notification_response();
        }
    };

    match create_staff(
        NewStaff {
            name: new_staff.name,
            role: new_staff.role,
            email: new_staff.email,
            phone: new_staff.phone,
        },
        &connection,
    ) {
        Ok(_) => (
            HxRedirect(endpoints::STAFF_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a staff record: {error}");

            error.into_notification_response()
        }
    }
}

fn new_staff_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::STAFF_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-4" { "Add staff member" }

            form
                hx-post=(endpoints::POST_STAFF)
                hx-target-error="#notification-container"
                class="w-full space-y-4 md:space-y-6"
            {
                div
                {
                    label for="name" class=(FORM_LABEL_STYLE) { "Full name" }
                    input id="name" type="text" name="name" placeholder="Full name" required
                        autofocus class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="role" class=(FORM_LABEL_STYLE) { "Role" }
                    select id="role" name="role" required class=(FORM_SELECT_STYLE)
                    {
                        @for role in [StaffRole::Teacher, StaffRole::Admin, StaffRole::Support] {
                            option value=(role.as_str()) { (role.display_name()) }
                        }
                    }
                }

                div
                {
                    label for="email" class=(FORM_LABEL_STYLE) { "Email" }
                    input id="email" type="email" name="email" placeholder="you@school.ac.ke"
                        required class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="phone" class=(FORM_LABEL_STYLE) { "Phone" }
                    input id="phone" type="text" name="phone" placeholder="07xx xxx xxx" required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                p class="text-sm font-light text-gray-500 dark:text-gray-400"
                {
                    "Sign-in access is granted separately from the server with the add_staff tool."
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add staff member" }
            }
        }
    };

    base("Add Staff", &content)
}

#[cfg(test)]
mod new_staff_page_tests {
    use axum::http::StatusCode;

    use crate::{
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_valid_html,
            must_get_form, parse_html_document,
        },
    };

    use super::get_new_staff_page;

    #[tokio::test]
    async fn render_page() {
        let response = get_new_staff_page().await;

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::POST_STAFF, "hx-post");
        assert_form_input(&form, "name", "text");
        assert_form_input(&form, "email", "email");
        assert_form_submit_button(&form);
    }
}
