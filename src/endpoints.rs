//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g. '/students/{student_id}', use
//! [format_endpoint].

/// The root route which redirects to the dashboard or log in page.
pub const ROOT: &str = "/";
/// The landing page for logged in staff.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page listing student records.
pub const STUDENTS_VIEW: &str = "/students";
/// The page for admitting a new student.
pub const NEW_STUDENT_VIEW: &str = "/students/new";
/// The page showing one student's record.
pub const STUDENT_VIEW: &str = "/students/{student_id}";
/// The page for editing a student's record.
pub const EDIT_STUDENT_VIEW: &str = "/students/{student_id}/edit";
/// The staff directory page.
pub const STAFF_VIEW: &str = "/staff";
/// The page for adding a staff member.
pub const NEW_STAFF_VIEW: &str = "/staff/new";
/// The page showing one staff member's record.
pub const STAFF_MEMBER_VIEW: &str = "/staff/{staff_id}";
/// The school-wide fees overview page.
pub const FINANCE_VIEW: &str = "/finance";
/// The page showing a student's fee ledger.
pub const STUDENT_FEES_VIEW: &str = "/finance/students/{student_id}";
/// The page listing billable meal items.
pub const MEAL_ITEMS_VIEW: &str = "/food/items";
/// The page for adding a meal item.
pub const NEW_MEAL_ITEM_VIEW: &str = "/food/items/new";
/// The page for editing a meal item.
pub const EDIT_MEAL_ITEM_VIEW: &str = "/food/items/{item_id}/edit";
/// The daily meal serving checklist.
pub const SERVING_VIEW: &str = "/food/serving";
/// The page showing a student's food account.
pub const STUDENT_FOOD_VIEW: &str = "/food/students/{student_id}";
/// The page listing drivers.
pub const DRIVERS_VIEW: &str = "/transport/drivers";
/// The page for registering a driver.
pub const NEW_DRIVER_VIEW: &str = "/transport/drivers/new";
/// The page listing vehicles.
pub const VEHICLES_VIEW: &str = "/transport/vehicles";
/// The page for registering a vehicle.
pub const NEW_VEHICLE_VIEW: &str = "/transport/vehicles/new";
/// The page listing transport routes.
pub const ROUTES_VIEW: &str = "/transport/routes";
/// The page for creating a route.
pub const NEW_ROUTE_VIEW: &str = "/transport/routes/new";
/// The page showing a student's transport account.
pub const STUDENT_TRANSPORT_VIEW: &str = "/transport/students/{student_id}";
/// The daily attendance sheet.
pub const ATTENDANCE_VIEW: &str = "/attendance";
/// The weekly timetable page.
pub const SCHEDULE_VIEW: &str = "/schedule";
/// The page for creating a timetable slot.
pub const NEW_SLOT_VIEW: &str = "/schedule/new";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for logging in a staff member.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current staff member.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to create a student record.
pub const POST_STUDENT: &str = "/api/students";
/// The route to update a student record.
pub const PUT_STUDENT: &str = "/api/students/{student_id}";
/// The route for the bulk academic-year transition.
pub const PROMOTE_STUDENTS: &str = "/api/students/promote";
/// The route for the bulk term transition.
pub const UPDATE_TERM: &str = "/api/students/update_term";
/// The route to create a staff record.
pub const POST_STAFF: &str = "/api/staff";
/// The route to capture a fee payment.
pub const POST_FEE_PAYMENT: &str = "/api/finance/payments";
/// The route to raise a fee invoice.
pub const POST_FEE_INVOICE: &str = "/api/finance/invoices";
/// The route to create a meal item.
pub const POST_MEAL_ITEM: &str = "/api/food/items";
/// The route to update a meal item.
pub const PUT_MEAL_ITEM: &str = "/api/food/items/{item_id}";
/// The route to delete a meal item.
pub const DELETE_MEAL_ITEM: &str = "/api/food/items/{item_id}";
/// The route to subscribe a student to a meal item.
pub const POST_SUBSCRIPTION: &str = "/api/food/subscriptions";
/// The route to cancel a meal subscription.
pub const DELETE_SUBSCRIPTION: &str = "/api/food/subscriptions/{subscription_id}";
/// The route to capture a food account payment.
pub const POST_FOOD_PAYMENT: &str = "/api/food/payments";
/// The route to mark a subscription served today.
pub const POST_SERVING: &str = "/api/food/servings";
/// The route to register a driver.
pub const POST_DRIVER: &str = "/api/transport/drivers";
/// The route to delete a driver.
pub const DELETE_DRIVER: &str = "/api/transport/drivers/{driver_id}";
/// The route to register a vehicle.
pub const POST_VEHICLE: &str = "/api/transport/vehicles";
/// The route to delete a vehicle.
pub const DELETE_VEHICLE: &str = "/api/transport/vehicles/{vehicle_id}";
/// The route to create a transport route.
pub const POST_ROUTE: &str = "/api/transport/routes";
/// The route to delete a transport route.
pub const DELETE_ROUTE: &str = "/api/transport/routes/{route_id}";
/// The route to assign a student to a transport route.
pub const POST_ASSIGNMENT: &str = "/api/transport/assignments";
/// The route to remove a student's route assignment.
pub const DELETE_ASSIGNMENT: &str = "/api/transport/assignments/{assignment_id}";
/// The route to capture a transport account payment.
pub const POST_TRANSPORT_PAYMENT: &str = "/api/transport/payments";
/// The route to charge a month's route fee to a transport account.
pub const POST_TRANSPORT_CHARGE: &str = "/api/transport/charges";
/// The route for the bulk daily attendance upsert.
pub const POST_ATTENDANCE_BATCH: &str = "/api/attendance/batch";
/// The route to create a timetable slot.
pub const POST_SLOT: &str = "/api/schedule";
/// The route to delete a timetable slot.
pub const DELETE_SLOT: &str = "/api/schedule/{slot_id}";

/// Substitute the parameter (the part between braces) in `endpoint` with `id`.
pub fn format_endpoint(endpoint: &str, id: i64) -> String {
    let (Some(start), Some(end)) = (endpoint.find('{'), endpoint.find('}')) else {
        return endpoint.to_owned();
    };

    format!("{}{}{}", &endpoint[..start], id, &endpoint[end + 1..])
}
