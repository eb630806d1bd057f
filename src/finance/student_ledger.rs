//! The page showing one student's fee ledger with its stat cards and the
//! payment/invoice capture forms.

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
    html::{
        FORM_LABEL_STYLE, FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base,
        link,
    },
    ledger::{
        AccountTable, LedgerEntry, SignConvention, account_summary_cards, entries_for_student,
        entries_table,
    },
    navigation::NavBar,
    student::{Student, get_student},
};

/// The state needed for the student fee page.
#[derive(Debug, Clone)]
pub struct StudentFeesState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for StudentFeesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render a student's fee ledger page.
pub async fn get_student_fees_page(
    State(state): State<StudentFeesState>,
    Path(student_id): Path<StudentId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let student = get_student(student_id, &connection)?;
    let entries = entries_for_student(AccountTable::Fees, student_id, &connection)?;

    Ok(student_fees_view(&student, &entries).into_response())
}

fn student_fees_view(student: &Student, entries: &[LedgerEntry]) -> Markup {
    let nav_bar = NavBar::new(endpoints::FINANCE_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-1" { "Fees — " (student.full_name()) }
            p class="text-sm text-gray-500 dark:text-gray-400 mb-4"
            {
                (student.admission_number)
                " · "
                (link(&format_endpoint(endpoints::STUDENT_VIEW, student.id), "student record"))
            }

            (account_summary_cards(
                entries,
                SignConvention::ChargesMinusPayments,
                "Outstanding balance",
            ))

            div class="grid w-full max-w-screen-lg grid-cols-1 gap-8 md:grid-cols-2 my-6"
            {
                (payment_form(student.id))
                (invoice_form(student.id))
            }

            h2 class="text-xl font-semibold self-start mb-2" { "Ledger" }
            (entries_table(entries))
        }
    };

    base("Student Fees", &content)
}

fn payment_form(student_id: StudentId) -> Markup {
    html! {
        form
            hx-post=(endpoints::POST_FEE_PAYMENT)
            hx-target-error="#notification-container"
            hx-disabled-elt="find button"
            class="space-y-3"
        {
            h2 class="text-lg font-semibold" { "Record payment" }

            input type="hidden" name="student_id" value=(student_id);

            div
            {
                label for="payment-amount" class=(FORM_LABEL_STYLE) { "Amount (KSh)" }
                input id="payment-amount" type="number" name="amount" min="0" step="0.01"
                    required class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="payment-date" class=(FORM_LABEL_STYLE) { "Date" }
                input id="payment-date" type="date" name="date" required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="payment-method" class=(FORM_LABEL_STYLE) { "Method" }
                select id="payment-method" name="method" required class=(FORM_SELECT_STYLE)
                {
                    option value="CASH" { "Cash" }
                    option value="MPESA" { "M-PESA" }
                    option value="BANK" { "Bank" }
                }
            }

            div
            {
                label for="payment-reference" class=(FORM_LABEL_STYLE) { "Reference" }
                input id="payment-reference" type="text" name="reference"
                    placeholder="Receipt or M-PESA code" class=(FORM_TEXT_INPUT_STYLE);
            }

            input type="hidden" name="description" value="Fees payment";

            button type="submit"
                class="px-4 py-2 bg-blue-500 dark:bg-blue-600 text-white rounded"
            {
                "Record payment"
            }
        }
    }
}

fn invoice_form(student_id: StudentId) -> Markup {
    html! {
        form
            hx-post=(endpoints::POST_FEE_INVOICE)
            hx-target-error="#notification-container"
            hx-disabled-elt="find button"
            class="space-y-3"
        {
            h2 class="text-lg font-semibold" { "Raise invoice" }

            input type="hidden" name="student_id" value=(student_id);

            div
            {
                label for="invoice-amount" class=(FORM_LABEL_STYLE) { "Amount (KSh)" }
                input id="invoice-amount" type="number" name="amount" min="0" step="0.01"
                    required class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="invoice-date" class=(FORM_LABEL_STYLE) { "Date" }
                input id="invoice-date" type="date" name="date" required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="invoice-description" class=(FORM_LABEL_STYLE) { "Description" }
                input id="invoice-description" type="text" name="description"
                    placeholder="Term 2 tuition" class=(FORM_TEXT_INPUT_STYLE);
            }

            input type="hidden" name="reference" value="";

            button type="submit"
                class="px-4 py-2 bg-blue-500 dark:bg-blue-600 text-white rounded"
            {
                "Raise invoice"
            }
        }
    }
}
