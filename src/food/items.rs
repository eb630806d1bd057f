//! Meal item pages and endpoints: the menu list, create, edit and delete.

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
    database_id::MealItemId,
    endpoints::{self, format_endpoint},
    html::{
        BADGE_STYLE, BUTTON_DANGER_STYLE, BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE,
        FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency, link,
    },
    navigation::NavBar,
};

use super::core::{
    MealItem, MealItemUpdate, NewMealItem, create_meal_item, delete_meal_item, get_meal_item,
    list_meal_items, update_meal_item,
};

/// The state needed for managing meal items.
#[derive(Debug, Clone)]
pub struct MealItemState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for MealItemState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The meal item form data.
#[derive(Debug, Clone, Deserialize)]
pub struct MealItemFormData {
    pub name: String,
    pub price: f64,
    /// Comes from a checkbox: a string value when ticked, absent otherwise.
    pub active: Option<String>,
}

/// Render the menu page.
pub async fn get_meal_items_page(State(state): State<MealItemState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let items = list_meal_items(&connection)?;

    Ok(meal_items_view(&items).into_response())
}

/// Render the meal item creation page.
pub async fn get_new_meal_item_page() -> Response {
    meal_item_form_view(None).into_response()
}

/// Render the meal item edit page.
pub async fn get_edit_meal_item_page(
    State(state): State<MealItemState>,
    Path(item_id): Path<MealItemId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let item = get_meal_item(item_id, &connection)?;

    Ok(meal_item_form_view(Some(&item)).into_response())
}

/// Handle the meal item creation form submission.
pub async fn create_meal_item_endpoint(
    State(state): State<MealItemState>,
    Form(form): Form<MealItemFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_notification_response();
        }
    };

    match create_meal_item(
        NewMealItem {
            name: form.name,
            price: form.price,
        },
        &connection,
    ) {
        Ok(_) => (
            HxRedirect(endpoints::MEAL_ITEMS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a meal item: {error}");

            error.into_notification_response()
        }
    }
}

/// Handle the meal item edit form submission.
pub async fn update_meal_item_endpoint(
    State(state): State<MealItemState>,
    Path(item_id): Path<MealItemId>,
    Form(form): Form<MealItemFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_notification_response();
        }
    };

    match update_meal_item(
        item_id,
        MealItemUpdate {
            name: form.name,
            price: form.price,
            active: form.active.is_some(),
        },
        &connection,
    ) {
        Ok(()) => (
            HxRedirect(endpoints::MEAL_ITEMS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while updating a meal item: {error}");

            error.into_notification_response()
        }
    }
}

/// A route handler for deleting a meal item, clears the table row on success.
pub async fn delete_meal_item_endpoint(
    State(state): State<MealItemState>,
    Path(item_id): Path<MealItemId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_notification_response();
        }
    };

    match delete_meal_item(item_id, &connection) {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => Html("").into_response(),
        Err(error) => {
            tracing::error!("Could not delete meal item {item_id}: {error}");

            error.into_notification_response()
        }
    }
}

fn meal_items_view(items: &[MealItem]) -> Markup {
    let nav_bar = NavBar::new(endpoints::MEAL_ITEMS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="flex w-full max-w-screen-lg items-center justify-between mb-4"
            {
                h1 class="text-2xl font-bold" { "Meal items" }

                div class="flex gap-4"
                {
                    (link(endpoints::SERVING_VIEW, "Serving checklist"))
                    (link(endpoints::NEW_MEAL_ITEM_VIEW, "Add item"))
                }
            }

            @if items.is_empty() {
                p class="text-gray-500 dark:text-gray-400 py-4" { "The menu is empty." }
            } @else {
                table class="w-full max-w-screen-lg text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th class=(TABLE_CELL_STYLE) { "Item" }
                            th class=(TABLE_CELL_STYLE) { "Price" }
                            th class=(TABLE_CELL_STYLE) { "Status" }
                            th class=(TABLE_CELL_STYLE) { "Actions" }
                        }
                    }

                    tbody
                    {
                        @for item in items {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE) { (item.name) }
                                td class=(TABLE_CELL_STYLE) { (format_currency(item.price)) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    @if item.active {
                                        span class=(BADGE_STYLE) { "On the menu" }
                                    } @else {
                                        span class="text-gray-400" { "Retired" }
                                    }
                                }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    a
                                        href=(format_endpoint(endpoints::EDIT_MEAL_ITEM_VIEW, item.id))
                                        class=(LINK_STYLE)
                                    {
                                        "Edit"
                                    }

                                    " "

                                    button
                                        hx-delete=(format_endpoint(endpoints::DELETE_MEAL_ITEM, item.id))
                                        hx-confirm="Delete this meal item?"
                                        hx-target="closest tr"
                                        hx-target-error="#notification-container"
                                        class=(BUTTON_DANGER_STYLE)
                                    {
                                        "Delete"
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Meal Items", &content)
}

fn meal_item_form_view(item: Option<&MealItem>) -> Markup {
    let nav_bar = NavBar::new(endpoints::MEAL_ITEMS_VIEW).into_html();

    let (title, button_label) = match item {
        Some(_) => ("Edit meal item", "Save changes"),
        None => ("Add meal item", "Add item"),
    };

    let form_body = html! {
        div
        {
            label for="name" class=(FORM_LABEL_STYLE) { "Name" }
            input id="name" type="text" name="name" placeholder="Lunch" required autofocus
                value=[item.map(|item| item.name.as_str())]
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="price" class=(FORM_LABEL_STYLE) { "Price per serving (KSh)" }
            input id="price" type="number" name="price" min="0" step="0.01" required
                value=[item.map(|item| item.price)]
                class=(FORM_TEXT_INPUT_STYLE);
        }

        @if let Some(item) = item {
            div class="flex items-center gap-x-3"
            {
                input type="checkbox" name="active" id="active" checked[item.active]
                    class="rounded-xs";
                label for="active" class=(FORM_LABEL_STYLE) { "On the menu" }
            }
        } @else {
            input type="hidden" name="active" value="on";
        }

        button type="submit" class=(BUTTON_PRIMARY_STYLE) { (button_label) }
    };

    let form = match item {
        Some(item) => html! {
            form
                hx-put=(format_endpoint(endpoints::PUT_MEAL_ITEM, item.id))
                hx-target-error="#notification-container"
                class="w-full space-y-4 md:space-y-6"
            {
                (form_body)
            }
        },
        None => html! {
            form
                hx-post=(endpoints::POST_MEAL_ITEM)
                hx-target-error="#notification-container"
                class="w-full space-y-4 md:space-y-6"
            {
                (form_body)
            }
        },
    };

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-4" { (title) }
            (form)
        }
    };

    base(title, &content)
}
