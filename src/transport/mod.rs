//! The transport fleet: drivers, vehicles, routes, per-student route
//! assignments and the transport account ledger.

mod account;
mod core;
mod drivers;
mod routes;
mod vehicles;

pub use core::{
    Driver, NewDriver, NewRoute, NewVehicle, Route, Vehicle, create_transport_tables,
};
pub use account::{
    create_assignment_endpoint, create_transport_charge_endpoint,
    create_transport_payment_endpoint, delete_assignment_endpoint, get_student_transport_page,
};
pub use drivers::{create_driver_endpoint, delete_driver_endpoint, get_drivers_page, get_new_driver_page};
pub use routes::{create_route_endpoint, delete_route_endpoint, get_new_route_page, get_routes_page};
pub use vehicles::{
    create_vehicle_endpoint, delete_vehicle_endpoint, get_new_vehicle_page, get_vehicles_page,
};

pub(crate) use core::{
    VehicleRow, assign_student, assignment_for_student, create_driver, create_route,
    create_vehicle, delete_driver, delete_route, delete_vehicle, get_route, list_drivers,
    list_routes, list_vehicles, remove_assignment,
};
