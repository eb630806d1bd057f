//! School fees: the per-student fee ledger, payment and invoice capture, and
//! the school-wide revenue overview.
//!
//! The fee account uses the charges-minus-payments sign convention: a
//! positive balance is money the guardian still owes.

mod core;
mod overview;
mod record;
mod student_ledger;

pub use overview::get_finance_page;
pub use record::{create_fee_invoice_endpoint, create_fee_payment_endpoint};
pub use student_ledger::get_student_fees_page;

pub(crate) use core::{
    RevenueSummary, compute_revenue_summary, outstanding_fees_total, recent_fee_entries,
};
