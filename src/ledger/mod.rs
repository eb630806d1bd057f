//! Student account ledgers.
//!
//! This module contains everything shared between the fee, food and transport
//! accounts:
//! - The `LedgerEntry` model and the append-only account tables
//! - Summary functions for the figures shown in stat cards and trend badges
//! - Insertion-ordered grouping used to bucket records for display

mod grouping;
mod model;
mod store;
mod summary;
mod view;

pub use grouping::group_by_key;
pub use model::{EntryKind, LedgerEntry, NewEntry, PaymentMethod};
pub use store::{AccountTable, append_entry, create_account_tables, entries_for_student};
pub use summary::{SignConvention, balance, percent_rate, total_by_kind, trend_percentage};

pub(crate) use model::{map_entry_row, parse_entry_date};
pub(crate) use store::entries_in_range;
pub(crate) use view::{account_summary_cards, entries_table};
