//! The page showing one student's transport account: their route assignment
//! and the account ledger.
//!
//! The transport account runs on credit: guardians pay in, and charging a
//! month's route fee draws the balance down. A positive balance is credit on
//! the account.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    database_id::{AssignmentId, RouteId, StudentId},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DANGER_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, base, format_currency, link,
    },
    ledger::{
        AccountTable, EntryKind, LedgerEntry, NewEntry, PaymentMethod, SignConvention,
        account_summary_cards, append_entry, entries_for_student, entries_table,
        parse_entry_date,
    },
    navigation::NavBar,
    student::{Student, get_student},
    timezone::local_date_today,
};

use super::core::{
    Assignment, RouteRow, assign_student, assignment_for_student, get_route, list_routes,
    remove_assignment,
};

/// The state needed for the transport account pages and endpoints.
#[derive(Debug, Clone)]
pub struct TransportAccountState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for TransportAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Render a student's transport account page.
pub async fn get_student_transport_page(
    State(state): State<TransportAccountState>,
    Path(student_id): Path<StudentId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let student = get_student(student_id, &connection)?;
    let assignment = assignment_for_student(student_id, &connection)?;
    let routes = list_routes(&connection)?;
    let entries = entries_for_student(AccountTable::Transport, student_id, &connection)?;

    Ok(student_transport_view(&student, assignment.as_ref(), &routes, &entries).into_response())
}

/// The route assignment form data.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentFormData {
    pub student_id: StudentId,
    pub route_id: RouteId,
}

/// Handle the route assignment form submission.
pub async fn create_assignment_endpoint(
    State(state): State<TransportAccountState>,
    Form(form): Form<AssignmentFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_notification_response();
        }
    };

    match assign_student(form.student_id, form.route_id, &connection) {
        Ok(_) => (
            HxRedirect(format_endpoint(
                endpoints::STUDENT_TRANSPORT_VIEW,
                form.student_id,
            )),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not assign student to route: {error}");

            error.into_notification_response()
        }
    }
}

/// A route handler for removing a route assignment.
pub async fn delete_assignment_endpoint(
    State(state): State<TransportAccountState>,
    Path(assignment_id): Path<AssignmentId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_notification_response();
        }
    };

    match remove_assignment(assignment_id, &connection) {
        // The status code has to be 200 OK or HTMX will not clear the target.
        Ok(()) => Html("").into_response(),
        Err(error) => {
            tracing::error!("Could not remove assignment {assignment_id}: {error}");

            error.into_notification_response()
        }
    }
}

/// The transport payment form data.
#[derive(Debug, Clone, Deserialize)]
pub struct TransportPaymentFormData {
    pub student_id: StudentId,
    pub amount: f64,
    pub date: String,
    pub method: PaymentMethod,
    #[serde(default)]
    pub reference: String,
}

/// Handle the transport account payment form submission.
pub async fn create_transport_payment_endpoint(
    State(state): State<TransportAccountState>,
    Form(payment): Form<TransportPaymentFormData>,
) -> Response {
    let date = match parse_entry_date(&payment.date) {
        Ok(date) => date,
        Err(error) => return error.into_notification_response(),
    };

    let Some(today) = local_date_today(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone.clone()).into_response();
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_notification_response();
        }
    };

    match append_entry(
        AccountTable::Transport,
        NewEntry {
            student_id: payment.student_id,
            kind: EntryKind::Payment,
            amount: payment.amount,
            date,
            method: Some(payment.method),
            description: "Transport payment".to_owned(),
            reference: payment.reference,
        },
        today,
        &connection,
    ) {
        Ok(_) => (
            HxRedirect(format_endpoint(
                endpoints::STUDENT_TRANSPORT_VIEW,
                payment.student_id,
            )),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not record transport payment: {error}");

            error.into_notification_response()
        }
    }
}

/// The month charge form data.
#[derive(Debug, Clone, Deserialize)]
pub struct TransportChargeFormData {
    pub student_id: StudentId,
    /// The month being charged, shown in the entry description.
    pub month: String,
}

/// Charge a month of the student's assigned route fee to their account.
pub async fn create_transport_charge_endpoint(
    State(state): State<TransportAccountState>,
    Form(charge): Form<TransportChargeFormData>,
) -> Response {
    let Some(today) = local_date_today(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone.clone()).into_response();
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_notification_response();
        }
    };

    let route = match assignment_for_student(charge.student_id, &connection) {
        Ok(Some(assignment)) => match get_route(assignment.route.id, &connection) {
            Ok(route) => route,
            Err(error) => return error.into_notification_response(),
        },
        Ok(None) => return Error::InvalidReference.into_notification_response(),
        Err(error) => return error.into_notification_response(),
    };

    match append_entry(
        AccountTable::Transport,
        NewEntry {
            student_id: charge.student_id,
            kind: EntryKind::Charge,
            amount: route.monthly_fee,
            date: today,
            method: None,
            description: format!("Route fee {} ({})", charge.month, route.name),
            reference: String::new(),
        },
        today,
        &connection,
    ) {
        Ok(_) => (
            HxRedirect(format_endpoint(
                endpoints::STUDENT_TRANSPORT_VIEW,
                charge.student_id,
            )),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not charge route fee: {error}");

            error.into_notification_response()
        }
    }
}

fn student_transport_view(
    student: &Student,
    assignment: Option<&Assignment>,
    routes: &[RouteRow],
    entries: &[LedgerEntry],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::ROUTES_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-1" { "Transport — " (student.full_name()) }
            p class="text-sm text-gray-500 dark:text-gray-400 mb-4"
            {
                (student.admission_number)
                " · "
                (link(&format_endpoint(endpoints::STUDENT_VIEW, student.id), "student record"))
            }

            (account_summary_cards(
                entries,
                SignConvention::PaymentsMinusCharges,
                "Account credit",
            ))

            h2 class="text-xl font-semibold self-start mt-6 mb-2" { "Route" }

            @match assignment {
                Some(assignment) => {
                    div id="assignment" class="flex w-full max-w-screen-md items-center justify-between"
                    {
                        span
                        {
                            (assignment.route.name)
                            " — "
                            (format_currency(assignment.route.monthly_fee))
                            " per month"
                        }

                        button
                            hx-delete=(format_endpoint(endpoints::DELETE_ASSIGNMENT, assignment.id))
                            hx-confirm="Remove this student from the route?"
                            hx-target="#assignment"
                            hx-target-error="#notification-container"
                            class=(BUTTON_DANGER_STYLE)
                        {
                            "Remove"
                        }
                    }

                    form
                        hx-post=(endpoints::POST_TRANSPORT_CHARGE)
                        hx-target-error="#notification-container"
                        hx-disabled-elt="find button"
                        class="flex items-end gap-2 self-start mt-3"
                    {
                        input type="hidden" name="student_id" value=(student.id);

                        div
                        {
                            label for="month" class=(FORM_LABEL_STYLE) { "Charge month" }
                            input id="month" type="month" name="month" required
                                class=(FORM_TEXT_INPUT_STYLE);
                        }

                        button type="submit"
                            class="px-4 py-2 bg-blue-500 dark:bg-blue-600 text-white rounded"
                        {
                            "Charge route fee"
                        }
                    }
                }
                None => {
                    (assign_form(student.id, routes))
                }
            }

            div class="w-full max-w-screen-md mt-6"
            {
                (payment_form(student.id))
            }

            h2 class="text-xl font-semibold self-start mt-6 mb-2" { "Ledger" }
            (entries_table(entries))
        }
    };

    base("Transport Account", &content)
}

fn assign_form(student_id: StudentId, routes: &[RouteRow]) -> Markup {
    html! {
        form
            hx-post=(endpoints::POST_ASSIGNMENT)
            hx-target-error="#notification-container"
            hx-disabled-elt="find button"
            class="flex items-end gap-2 self-start"
        {
            input type="hidden" name="student_id" value=(student_id);

            div
            {
                label for="route_id" class=(FORM_LABEL_STYLE) { "Assign to route" }
                select id="route_id" name="route_id" required class=(FORM_SELECT_STYLE)
                {
                    @for row in routes {
                        option value=(row.route.id)
                        {
                            (row.route.name)
                            " ("
                            (format_currency(row.route.monthly_fee))
                            "/month)"
                        }
                    }
                }
            }

            button type="submit"
                disabled[routes.is_empty()]
                class="px-4 py-2 bg-blue-500 dark:bg-blue-600 disabled:bg-gray-400 text-white rounded"
            {
                "Assign"
            }
        }
    }
}

fn payment_form(student_id: StudentId) -> Markup {
    html! {
        form
            hx-post=(endpoints::POST_TRANSPORT_PAYMENT)
            hx-target-error="#notification-container"
            hx-disabled-elt="find button"
            class="space-y-3"
        {
            h2 class="text-lg font-semibold" { "Record payment" }

            input type="hidden" name="student_id" value=(student_id);

            div
            {
                label for="transport-amount" class=(FORM_LABEL_STYLE) { "Amount (KSh)" }
                input id="transport-amount" type="number" name="amount" min="0" step="0.01"
                    required class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="transport-date" class=(FORM_LABEL_STYLE) { "Date" }
                input id="transport-date" type="date" name="date" required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="transport-method" class=(FORM_LABEL_STYLE) { "Method" }
                select id="transport-method" name="method" required class=(FORM_SELECT_STYLE)
                {
                    option value="CASH" { "Cash" }
                    option value="MPESA" { "M-PESA" }
                    option value="BANK" { "Bank" }
                }
            }

            div
            {
                label for="transport-reference" class=(FORM_LABEL_STYLE) { "Reference" }
                input id="transport-reference" type="text" name="reference"
                    placeholder="Receipt or M-PESA code" class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit"
                class="px-4 py-2 bg-blue-500 dark:bg-blue-600 text-white rounded"
            {
                "Record payment"
            }
        }
    }
}
