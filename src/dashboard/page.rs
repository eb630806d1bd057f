//! The dashboard page handler and view.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    attendance::{attendance_rate, school_attendance_counts},
    database_id::StaffId,
    endpoints,
    finance::{RevenueSummary, compute_revenue_summary, outstanding_fees_total},
    html::{PAGE_CONTAINER_STYLE, base, format_currency, stat_card, trend_badge},
    navigation::NavBar,
    staff::get_staff_member,
    student::count_active_students,
    timezone::local_date_today,
};

/// The state needed for the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

struct DashboardFigures {
    enrollment: u64,
    revenue: RevenueSummary,
    outstanding: f64,
    attendance_rate: f64,
    marks_taken: u64,
}

/// Render the dashboard.
///
/// The auth middleware injects the signed-in staff ID, which is used to greet
/// the staff member by name.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(staff_id): Extension<StaffId>,
) -> Result<Response, Error> {
    let today = local_date_today(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let staff = get_staff_member(staff_id, &connection)?;

    let counts = school_attendance_counts(today, &connection)?;
    let figures = DashboardFigures {
        enrollment: count_active_students(&connection)?,
        revenue: compute_revenue_summary(today, &connection)?,
        outstanding: outstanding_fees_total(&connection)?,
        attendance_rate: attendance_rate(counts),
        marks_taken: counts.total(),
    };

    Ok(dashboard_view(&staff.name, &figures).into_response())
}

fn dashboard_view(staff_name: &str, figures: &DashboardFigures) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let attendance_value = if figures.marks_taken == 0 {
        "Register not taken".to_owned()
    } else {
        format!("{:.1}%", figures.attendance_rate)
    };

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-1" { "Dashboard" }
            p class="text-sm text-gray-500 dark:text-gray-400 mb-4"
            {
                "Welcome back, " (staff_name) "."
            }

            div class="grid w-full max-w-screen-lg grid-cols-1 gap-4 sm:grid-cols-2 lg:grid-cols-4"
            {
                (stat_card("Active students", &figures.enrollment.to_string()))

                div class="rounded-lg border border-gray-200 bg-white p-4 shadow-sm dark:border-gray-700 dark:bg-gray-800"
                {
                    p class="text-sm text-gray-500 dark:text-gray-400" { "Revenue this month" }
                    p class="mt-1 text-2xl font-semibold text-gray-900 dark:text-white"
                    {
                        (format_currency(figures.revenue.this_month))
                        " "
                        (trend_badge(figures.revenue.trend))
                    }
                }

                (stat_card("Attendance today", &attendance_value))
                (stat_card("Outstanding fees", &format_currency(figures.outstanding)))
            }
        }
    };

    base("Dashboard", &content)
}

#[cfg(test)]
mod dashboard_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        staff::{NewStaff, StaffRole, create_staff},
        test_utils::{assert_valid_html, parse_html_document},
    };

    use super::{DashboardState, get_dashboard_page};

    #[tokio::test]
    async fn renders_with_empty_school() {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");
        let staff = create_staff(
            NewStaff {
                name: "Beatrice Njeri".to_owned(),
                role: StaffRole::Admin,
                email: "njeri@school.ac.ke".to_owned(),
                phone: "0711000000".to_owned(),
            },
            &connection,
        )
        .unwrap();
        let state = DashboardState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        let response = get_dashboard_page(State(state), Extension(staff.id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let greeting_selector = scraper::Selector::parse("p").unwrap();
        let greeting: String = document
            .select(&greeting_selector)
            .next()
            .unwrap()
            .text()
            .collect();
        assert!(greeting.contains("Beatrice Njeri"));
    }
}
