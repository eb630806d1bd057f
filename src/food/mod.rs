//! The food service: billable meal items, per-student subscriptions, the
//! daily serving checklist and the food account ledger.

mod account;
mod core;
mod items;
mod serving;

pub use core::{
    MealItem, MealItemUpdate, NewMealItem, ServingStatus, create_food_tables, create_meal_item,
    get_meal_item, list_meal_items,
};
pub use account::{
    cancel_subscription_endpoint, create_food_payment_endpoint, create_subscription_endpoint,
    get_student_food_page,
};
pub use items::{
    create_meal_item_endpoint, delete_meal_item_endpoint, get_edit_meal_item_page,
    get_meal_items_page, get_new_meal_item_page, update_meal_item_endpoint,
};
pub use serving::{get_serving_page, serve_meal_endpoint};

pub(crate) use core::{
    cancel_subscription, delete_meal_item, serve_subscription, serving_roster,
    subscribe_student, subscriptions_for_student, update_meal_item,
};
