//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// The ID of a student record.
pub type StudentId = DatabaseId;
/// The ID of a staff record.
pub type StaffId = DatabaseId;
/// The ID of a ledger entry in any of the account tables.
pub type EntryId = DatabaseId;
/// The ID of a billable meal item.
pub type MealItemId = DatabaseId;
/// The ID of a student's subscription to a meal item.
pub type SubscriptionId = DatabaseId;
/// The ID of a meal serving record.
pub type ServingId = DatabaseId;
/// The ID of a driver record.
pub type DriverId = DatabaseId;
/// The ID of a vehicle record.
pub type VehicleId = DatabaseId;
/// The ID of a transport route.
pub type RouteId = DatabaseId;
/// The ID of a student's route assignment.
pub type AssignmentId = DatabaseId;
/// The ID of a timetable slot.
pub type SlotId = DatabaseId;
