//! Application router configuration with protected and unprotected route
//! definitions.

use axum::{
    Router,
    middleware,
    response::Redirect,
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    attendance::{get_attendance_page, mark_attendance_endpoint},
    auth::{auth_guard, auth_guard_hx, get_log_in_page, get_log_out, post_log_in},
    dashboard::get_dashboard_page,
    endpoints,
    finance::{
        create_fee_invoice_endpoint, create_fee_payment_endpoint, get_finance_page,
        get_student_fees_page,
    },
    food::{
        cancel_subscription_endpoint, create_food_payment_endpoint, create_meal_item_endpoint,
        create_subscription_endpoint, delete_meal_item_endpoint, get_edit_meal_item_page,
        get_meal_items_page, get_new_meal_item_page, get_serving_page, get_student_food_page,
        serve_meal_endpoint, update_meal_item_endpoint,
    },
    not_found::get_404_not_found,
    schedule::{
        create_slot_endpoint, delete_slot_endpoint, get_new_slot_page, get_schedule_page,
    },
    server_error::get_internal_server_error_page,
    staff::{create_staff_endpoint, get_new_staff_page, get_staff_member_page, get_staff_page},
    student::{
        create_student_endpoint, get_edit_student_page, get_new_student_page, get_student_page,
        get_students_page, promote_students_endpoint, update_student_endpoint,
        update_term_endpoint,
    },
    transport::{
        create_assignment_endpoint, create_driver_endpoint, create_route_endpoint,
        create_transport_charge_endpoint, create_transport_payment_endpoint,
        create_vehicle_endpoint, delete_assignment_endpoint, delete_driver_endpoint,
        delete_route_endpoint, delete_vehicle_endpoint, get_drivers_page, get_new_driver_page,
        get_new_route_page, get_new_vehicle_page, get_routes_page, get_student_transport_page,
        get_vehicles_page,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::STUDENTS_VIEW, get(get_students_page))
        .route(endpoints::NEW_STUDENT_VIEW, get(get_new_student_page))
        .route(endpoints::STUDENT_VIEW, get(get_student_page))
        .route(endpoints::EDIT_STUDENT_VIEW, get(get_edit_student_page))
        .route(endpoints::STAFF_VIEW, get(get_staff_page))
        .route(endpoints::NEW_STAFF_VIEW, get(get_new_staff_page))
        .route(endpoints::STAFF_MEMBER_VIEW, get(get_staff_member_page))
        .route(endpoints::FINANCE_VIEW, get(get_finance_page))
        .route(endpoints::STUDENT_FEES_VIEW, get(get_student_fees_page))
        .route(endpoints::MEAL_ITEMS_VIEW, get(get_meal_items_page))
        .route(endpoints::NEW_MEAL_ITEM_VIEW, get(get_new_meal_item_page))
        .route(endpoints::EDIT_MEAL_ITEM_VIEW, get(get_edit_meal_item_page))
        .route(endpoints::SERVING_VIEW, get(get_serving_page))
        .route(endpoints::STUDENT_FOOD_VIEW, get(get_student_food_page))
        .route(endpoints::DRIVERS_VIEW, get(get_drivers_page))
        .route(endpoints::NEW_DRIVER_VIEW, get(get_new_driver_page))
        .route(endpoints::VEHICLES_VIEW, get(get_vehicles_page))
        .route(endpoints::NEW_VEHICLE_VIEW, get(get_new_vehicle_page))
        .route(endpoints::ROUTES_VIEW, get(get_routes_page))
        .route(endpoints::NEW_ROUTE_VIEW, get(get_new_route_page))
        .route(
            endpoints::STUDENT_TRANSPORT_VIEW,
            get(get_student_transport_page),
        )
        .route(endpoints::ATTENDANCE_VIEW, get(get_attendance_page))
        .route(endpoints::SCHEDULE_VIEW, get(get_schedule_page))
        .route(endpoints::NEW_SLOT_VIEW, get(get_new_slot_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These mutating routes need to use the HX-Redirect header for auth
    // redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::POST_STUDENT, post(create_student_endpoint))
            .route(endpoints::PUT_STUDENT, put(update_student_endpoint))
            .route(endpoints::PROMOTE_STUDENTS, post(promote_students_endpoint))
            .route(endpoints::UPDATE_TERM, post(update_term_endpoint))
            .route(endpoints::POST_STAFF, post(create_staff_endpoint))
            .route(endpoints::POST_FEE_PAYMENT, post(create_fee_payment_endpoint))
            .route(endpoints::POST_FEE_INVOICE, post(create_fee_invoice_endpoint))
            .route(endpoints::POST_MEAL_ITEM, post(create_meal_item_endpoint))
            .route(endpoints::PUT_MEAL_ITEM, put(update_meal_item_endpoint))
            .route(endpoints::DELETE_MEAL_ITEM, delete(delete_meal_item_endpoint))
            .route(endpoints::POST_SUBSCRIPTION, post(create_subscription_endpoint))
            .route(
                endpoints::DELETE_SUBSCRIPTION,
                delete(cancel_subscription_endpoint),
            )
            .route(endpoints::POST_FOOD_PAYMENT, post(create_food_payment_endpoint))
            .route(endpoints::POST_SERVING, post(serve_meal_endpoint))
            .route(endpoints::POST_DRIVER, post(create_driver_endpoint))
            .route(endpoints::DELETE_DRIVER, delete(delete_driver_endpoint))
            .route(endpoints::POST_VEHICLE, post(create_vehicle_endpoint))
            .route(endpoints::DELETE_VEHICLE, delete(delete_vehicle_endpoint))
            .route(endpoints::POST_ROUTE, post(create_route_endpoint))
            .route(endpoints::DELETE_ROUTE, delete(delete_route_endpoint))
            .route(endpoints::POST_ASSIGNMENT, post(create_assignment_endpoint))
            .route(
                endpoints::DELETE_ASSIGNMENT,
                delete(delete_assignment_endpoint),
            )
            .route(
                endpoints::POST_TRANSPORT_PAYMENT,
                post(create_transport_payment_endpoint),
            )
            .route(
                endpoints::POST_TRANSPORT_CHARGE,
                post(create_transport_charge_endpoint),
            )
            .route(
                endpoints::POST_ATTENDANCE_BATCH,
                post(mark_attendance_endpoint),
            )
            .route(endpoints::POST_SLOT, post(create_slot_endpoint))
            .route(endpoints::DELETE_SLOT, delete(delete_slot_endpoint))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}
