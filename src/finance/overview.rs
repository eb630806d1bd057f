//! The school-wide finance overview: revenue stat cards with the
//! month-over-month trend badge and the most recent fee entries.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    endpoints::{self, format_endpoint},
    html::{
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        format_currency, link, stat_card, trend_badge,
    },
    ledger::LedgerEntry,
    navigation::NavBar,
    timezone::local_date_today,
};

use super::core::{RevenueSummary, compute_revenue_summary, outstanding_fees_total, recent_fee_entries};

const RECENT_ENTRY_COUNT: u64 = 15;

/// The state needed for the finance overview page.
#[derive(Debug, Clone)]
pub struct FinanceOverviewState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for FinanceOverviewState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Render the finance overview page.
pub async fn get_finance_page(
    State(state): State<FinanceOverviewState>,
) -> Result<Response, Error> {
    let today = local_date_today(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let revenue = compute_revenue_summary(today, &connection)?;
    let outstanding = outstanding_fees_total(&connection)?;
    let recent = recent_fee_entries(RECENT_ENTRY_COUNT, &connection)?;

    Ok(finance_view(&revenue, outstanding, &recent).into_response())
}

fn finance_view(
    revenue: &RevenueSummary,
    outstanding: f64,
    recent: &[(LedgerEntry, String)],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::FINANCE_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-4" { "Finance" }

            div class="grid w-full max-w-screen-lg grid-cols-1 gap-4 sm:grid-cols-3"
            {
                div class="rounded-lg border border-gray-200 bg-white p-4 shadow-sm dark:border-gray-700 dark:bg-gray-800"
                {
                    p class="text-sm text-gray-500 dark:text-gray-400" { "Revenue this month" }
                    p class="mt-1 text-2xl font-semibold text-gray-900 dark:text-white"
                    {
                        (format_currency(revenue.this_month))
                        " "
                        (trend_badge(revenue.trend))
                    }
                }

                (stat_card("Revenue last month", &format_currency(revenue.previous_month)))
                (stat_card("Outstanding fees", &format_currency(outstanding)))
            }

            h2 class="text-xl font-semibold self-start my-4" { "Recent entries" }

            @if recent.is_empty() {
                p class="text-gray-500 dark:text-gray-400" { "No fee entries recorded yet." }
            } @else {
                table class="w-full max-w-screen-lg text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th class=(TABLE_CELL_STYLE) { "Date" }
                            th class=(TABLE_CELL_STYLE) { "Student" }
                            th class=(TABLE_CELL_STYLE) { "Type" }
                            th class=(TABLE_CELL_STYLE) { "Description" }
                            th class=(TABLE_CELL_STYLE) { "Amount" }
                        }
                    }

                    tbody
                    {
                        @for (entry, student_name) in recent {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE) { (entry.date) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    (link(
                                        &format_endpoint(endpoints::STUDENT_FEES_VIEW, entry.student_id),
                                        student_name,
                                    ))
                                }
                                td class=(TABLE_CELL_STYLE) { (entry.kind.display_name()) }
                                td class=(TABLE_CELL_STYLE) { (entry.description) }
                                td class=(TABLE_CELL_STYLE) { (format_currency(entry.amount)) }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Finance", &content)
}
