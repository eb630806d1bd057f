//! The weekly timetable: slots per grade, bucketed by weekday.

mod core;
mod create;
mod week;

pub use core::{NewSlot, Slot, create_schedule_table};
pub use create::{create_slot_endpoint, get_new_slot_page};
pub use week::{delete_slot_endpoint, get_schedule_page};

pub(crate) use core::{create_slot, delete_slot, slots_for_grade, weekday_label};
