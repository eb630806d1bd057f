//! Endpoints for appending to a student's fee ledger: payment capture and
//! invoice entry.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    database_id::StudentId,
    endpoints::{self, format_endpoint},
    ledger::{AccountTable, EntryKind, NewEntry, PaymentMethod, append_entry, parse_entry_date},
    timezone::local_date_today,
};

/// The state needed to append to a fee ledger.
#[derive(Debug, Clone)]
pub struct FeeEntryState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for FeeEntryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The form data for capturing a fee payment.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentFormData {
    pub student_id: StudentId,
    pub amount: f64,
    pub date: String,
    pub method: PaymentMethod,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reference: String,
}

/// The form data for raising a fee invoice.
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceFormData {
    pub student_id: StudentId,
    pub amount: f64,
    pub date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reference: String,
}

/// Handle the fee payment capture form. Redirects back to the student's fee
/// page on success.
pub async fn create_fee_payment_endpoint(
    State(state): State<FeeEntryState>,
    Form(payment): Form<PaymentFormData>,
) -> Response {
    record_fee_entry(
        &state,
        payment.student_id,
        EntryKind::Payment,
        payment.amount,
        &payment.date,
        Some(payment.method),
        payment.description,
        payment.reference,
    )
}

/// Handle the fee invoice form. Redirects back to the student's fee page on
/// success.
pub async fn create_fee_invoice_endpoint(
    State(state): State<FeeEntryState>,
    Form(invoice): Form<InvoiceFormData>,
) -> Response {
    record_fee_entry(
        &state,
        invoice.student_id,
        EntryKind::Charge,
        invoice.amount,
        &invoice.date,
        None,
        invoice.description,
        invoice.reference,
    )
}

#[allow(clippy::too_many_arguments)]
fn record_fee_entry(
    state: &FeeEntryState,
    student_id: StudentId,
    kind: EntryKind,
    amount: f64,
    raw_date: &str,
    method: Option<PaymentMethod>,
    description: String,
    reference: String,
) -> Response {
    let date = match parse_entry_date(raw_date) {
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
        AccountTable::Fees,
        NewEntry {
            student_id,
            kind,
            amount,
            date,
            method,
            description,
            reference,
        },
        today,
        &connection,
    ) {
        Ok(_) => (
            HxRedirect(format_endpoint(endpoints::STUDENT_FEES_VIEW, student_id)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not record fee entry: {error}");

            error.into_notification_response()
        }
    }
}

#[cfg(test)]
mod record_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Form, extract::State, http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        db::initialize,
        endpoints::{self, format_endpoint},
        ledger::{AccountTable, EntryKind, PaymentMethod, entries_for_student, total_by_kind},
        student::{NewStudent, create_student},
        test_utils::assert_hx_redirect,
    };

    use super::{
        FeeEntryState, InvoiceFormData, PaymentFormData, create_fee_invoice_endpoint,
        create_fee_payment_endpoint,
    };

    fn get_test_state() -> FeeEntryState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        FeeEntryState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    fn insert_test_student(state: &FeeEntryState) -> i64 {
        create_student(
            NewStudent {
                admission_number: "ADM-001".to_owned(),
                first_name: "Wanjiku".to_owned(),
                last_name: "Kamau".to_owned(),
                grade: 4,
                term: 1,
                guardian_name: "Grace Kamau".to_owned(),
                guardian_phone: "0722000001".to_owned(),
            },
            &state.db_connection.lock().unwrap(),
        )
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn payment_is_recorded_and_redirects() {
        let state = get_test_state();
        let student_id = insert_test_student(&state);
        let form = PaymentFormData {
            student_id,
            amount: 2500.0,
            date: "2025-06-10".to_owned(),
            method: PaymentMethod::Mpesa,
            description: "Term 2 fees".to_owned(),
            reference: "QX12ABC".to_owned(),
        };

        let response = create_fee_payment_endpoint(State(state.clone()), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(
            &response,
            &format_endpoint(endpoints::STUDENT_FEES_VIEW, student_id),
        );

        let connection = state.db_connection.lock().unwrap();
        let entries = entries_for_student(AccountTable::Fees, student_id, &connection).unwrap();
        assert_eq!(total_by_kind(&entries, EntryKind::Payment), 2500.0);
        assert_eq!(entries[0].date, date!(2025 - 06 - 10));
        assert_eq!(entries[0].method, Some(PaymentMethod::Mpesa));
    }

    #[tokio::test]
    async fn invoice_carries_no_method() {
        let state = get_test_state();
        let student_id = insert_test_student(&state);
        let form = InvoiceFormData {
            student_id,
            amount: 10000.0,
            date: "2025-06-01".to_owned(),
            description: "Term 2 tuition".to_owned(),
            reference: "INV-44".to_owned(),
        };

        let response = create_fee_invoice_endpoint(State(state.clone()), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let connection = state.db_connection.lock().unwrap();
        let entries = entries_for_student(AccountTable::Fees, student_id, &connection).unwrap();
        assert_eq!(entries[0].kind, EntryKind::Charge);
        assert_eq!(entries[0].method, None);
    }

    #[tokio::test]
    async fn malformed_date_is_a_bad_request() {
        let state = get_test_state();
        let student_id = insert_test_student(&state);
        let form = PaymentFormData {
            student_id,
            amount: 2500.0,
            date: "10/06/2025".to_owned(),
            method: PaymentMethod::Cash,
            description: String::new(),
            reference: String::new(),
        };

        let response = create_fee_payment_endpoint(State(state.clone()), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let connection = state.db_connection.lock().unwrap();
        let entries = entries_for_student(AccountTable::Fees, student_id, &connection).unwrap();
        assert_eq!(entries, vec![]);
    }

    #[tokio::test]
    async fn unknown_student_is_rejected() {
        let state = get_test_state();
        let form = InvoiceFormData {
            student_id: 999,
            amount: 100.0,
            date: "2025-06-01".to_owned(),
            description: String::new(),
            reference: String::new(),
        };

        let response = create_fee_invoice_endpoint(State(state), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
