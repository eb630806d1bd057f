//! The page showing one student's food account: meal subscriptions, payment
//! capture and the account ledger.

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
    database_id::{MealItemId, StudentId, SubscriptionId},
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
    MealItem, Subscription, cancel_subscription, list_meal_items, subscribe_student,
    subscriptions_for_student,
};

/// The state needed for the food account pages and endpoints.
#[derive(Debug, Clone)]
pub struct FoodAccountState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for FoodAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Render a student's food account page.
pub async fn get_student_food_page(
    State(state): State<FoodAccountState>,
    Path(student_id): Path<StudentId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let student = get_student(student_id, &connection)?;
    let subscriptions = subscriptions_for_student(student_id, &connection)?;
    let menu = list_meal_items(&connection)?;
    let entries = entries_for_student(AccountTable::Food, student_id, &connection)?;

    Ok(student_food_view(&student, &subscriptions, &menu, &entries).into_response())
}

/// The subscription form data.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionFormData {
    pub student_id: StudentId,
    pub item_id: MealItemId,
}

/// Handle the meal subscription form submission.
pub async fn create_subscription_endpoint(
    State(state): State<FoodAccountState>,
    Form(form): Form<SubscriptionFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_notification_response();
        }
    };

    match subscribe_student(form.student_id, form.item_id, &connection) {
        Ok(_) => (
            HxRedirect(format_endpoint(endpoints::STUDENT_FOOD_VIEW, form.student_id)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not subscribe student: {error}");

            error.into_notification_response()
        }
    }
}

/// A route handler for cancelling a subscription, clears the row on success.
pub async fn cancel_subscription_endpoint(
    State(state): State<FoodAccountState>,
    Path(subscription_id): Path<SubscriptionId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_notification_response();
        }
    };

    match cancel_subscription(subscription_id, &connection) {
        // The status code has to be 200 OK or HTMX will not delete the row.
        Ok(()) => Html("").into_response(),
        Err(error) => {
            tracing::error!("Could not cancel subscription {subscription_id}: {error}");

            error.into_notification_response()
        }
    }
}

/// The food payment form data.
#[derive(Debug, Clone, Deserialize)]
pub struct FoodPaymentFormData {
    pub student_id: StudentId,
    pub amount: f64,
    pub date: String,
    pub method: PaymentMethod,
    #[serde(default)]
    pub reference: String,
}

/// Handle the food account payment form submission.
pub async fn create_food_payment_endpoint(
    State(state): State<FoodAccountState>,
    Form(payment): Form<FoodPaymentFormData>,
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
        AccountTable::Food,
        NewEntry {
            student_id: payment.student_id,
            kind: EntryKind::Payment,
            amount: payment.amount,
            date,
            method: Some(payment.method),
            description: "Food account payment".to_owned(),
            reference: payment.reference,
        },
        today,
        &connection,
    ) {
        Ok(_) => (
            HxRedirect(format_endpoint(
                endpoints::STUDENT_FOOD_VIEW,
                payment.student_id,
            )),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not record food payment: {error}");

            error.into_notification_response()
        }
    }
}

fn student_food_view(
    student: &Student,
    subscriptions: &[Subscription],
    menu: &[MealItem],
    entries: &[LedgerEntry],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::MEAL_ITEMS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-1" { "Food account — " (student.full_name()) }
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

            h2 class="text-xl font-semibold self-start mt-6 mb-2" { "Subscriptions" }

            @if subscriptions.is_empty() {
                p class="text-gray-500 dark:text-gray-400" { "No meal subscriptions." }
            } @else {
                ul id="subscriptions" class="self-start w-full max-w-screen-md space-y-1"
                {
                    @for subscription in subscriptions {
                        li class="flex items-center justify-between border-b border-gray-200 dark:border-gray-700 py-1"
                        {
                            span
                            {
                                (subscription.item.name)
                                " — "
                                (format_currency(subscription.item.price))
                                " per serving"
                            }

                            button
                                hx-delete=(format_endpoint(endpoints::DELETE_SUBSCRIPTION, subscription.id))
                                hx-confirm="Cancel this meal subscription?"
                                hx-target="closest li"
                                hx-target-error="#notification-container"
                                class=(BUTTON_DANGER_STYLE)
                            {
                                "Cancel"
                            }
                        }
                    }
                }
            }

            (subscribe_form(student.id, menu))

            div class="w-full max-w-screen-md mt-6"
            {
                (payment_form(student.id))
            }

            h2 class="text-xl font-semibold self-start mt-6 mb-2" { "Ledger" }
            (entries_table(entries))
        }
    };

    base("Food Account", &content)
}

fn subscribe_form(student_id: StudentId, menu: &[MealItem]) -> Markup {
    let active_items: Vec<&MealItem> = menu.iter().filter(|item| item.active).collect();

    html! {
        form
            hx-post=(endpoints::POST_SUBSCRIPTION)
            hx-target-error="#notification-container"
            hx-disabled-elt="find button"
            class="flex items-end gap-2 self-start mt-3"
        {
            input type="hidden" name="student_id" value=(student_id);

            div
            {
                label for="item_id" class=(FORM_LABEL_STYLE) { "Subscribe to" }
                select id="item_id" name="item_id" required class=(FORM_SELECT_STYLE)
                {
                    @for item in &active_items {
                        option value=(item.id)
                        {
                            (item.name) " (" (format_currency(item.price)) ")"
                        }
                    }
                }
            }

            button type="submit"
                disabled[active_items.is_empty()]
                class="px-4 py-2 bg-blue-500 dark:bg-blue-600 disabled:bg-gray-400 text-white rounded"
            {
                "Subscribe"
            }
        }
    }
}

fn payment_form(student_id: StudentId) -> Markup {
    html! {
        form
            hx-post=(endpoints::POST_FOOD_PAYMENT)
            hx-target-error="#notification-container"
            hx-disabled-elt="find button"
            class="space-y-3"
        {
            h2 class="text-lg font-semibold" { "Record payment" }

            input type="hidden" name="student_id" value=(student_id);

            div
            {
                label for="food-amount" class=(FORM_LABEL_STYLE) { "Amount (KSh)" }
                input id="food-amount" type="number" name="amount" min="0" step="0.01" required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="food-date" class=(FORM_LABEL_STYLE) { "Date" }
                input id="food-date" type="date" name="date" required class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="food-method" class=(FORM_LABEL_STYLE) { "Method" }
                select id="food-method" name="method" required class=(FORM_SELECT_STYLE)
                {
                    option value="CASH" { "Cash" }
                    option value="MPESA" { "M-PESA" }
                    option value="BANK" { "Bank" }
                }
            }

            div
            {
                label for="food-reference" class=(FORM_LABEL_STYLE) { "Reference" }
                input id="food-reference" type="text" name="reference"
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
