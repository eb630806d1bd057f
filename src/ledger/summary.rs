//! Summary functions for the figures shown in stat cards and trend badges.
//!
//! These are pure functions over already-fetched ledger rows. Every account
//! page recomputes its totals from the entries read in the same request, so
//! there is no stored balance to drift out of agreement.

use super::model::{EntryKind, LedgerEntry};

/// The balance convention of an account.
///
/// Each module picks its convention explicitly instead of encoding it in
/// scattered comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignConvention {
    /// Balance = charges - payments. A positive balance is money the
    /// guardian still owes. Used by the fee and food accounts.
    ChargesMinusPayments,
    /// Balance = payments - charges. A positive balance is credit sitting on
    /// the account. Used by the transport account.
    PaymentsMinusCharges,
}

/// Sum the amounts of all entries of the given kind.
///
/// Returns 0.0 for an empty ledger.
pub fn total_by_kind(entries: &[LedgerEntry], kind: EntryKind) -> f64 {
    entries
        .iter()
        .filter(|entry| entry.kind == kind)
        .map(|entry| entry.amount)
        .sum()
}

/// The signed outstanding figure for a ledger under the given convention.
pub fn balance(entries: &[LedgerEntry], convention: SignConvention) -> f64 {
    let charges = total_by_kind(entries, EntryKind::Charge);
    let payments = total_by_kind(entries, EntryKind::Payment);

    match convention {
        SignConvention::ChargesMinusPayments => charges - payments,
        SignConvention::PaymentsMinusCharges => payments - charges,
    }
}

/// A percentage rate rounded to one decimal place.
///
/// Returns 0.0 when the denominator is not positive, so a grade with no
/// students reads as 0% attendance rather than dividing by zero.
pub fn percent_rate(numerator: f64, denominator: f64) -> f64 {
    if denominator <= 0.0 {
        return 0.0;
    }

    round_one_decimal((numerator / denominator) * 100.0)
}

/// The percentage change from `previous` to `current`, rounded to one decimal
/// place.
///
/// Returns 100.0 when `previous` is not positive. That is a display fallback
/// for "all of this figure is new", not a true rate.
pub fn trend_percentage(current: f64, previous: f64) -> f64 {
    if previous <= 0.0 {
        return 100.0;
    }

    round_one_decimal(((current - previous) / previous) * 100.0)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod summary_tests {
    use time::macros::date;

    use crate::ledger::{EntryKind, LedgerEntry, PaymentMethod};

    use super::{SignConvention, balance, percent_rate, total_by_kind, trend_percentage};

    fn entry(kind: EntryKind, amount: f64) -> LedgerEntry {
        LedgerEntry {
            id: 1,
            student_id: 1,
            kind,
            amount,
            date: date!(2025 - 06 - 10),
            method: match kind {
                EntryKind::Payment => Some(PaymentMethod::Cash),
                EntryKind::Charge => None,
            },
            description: "test".to_owned(),
            reference: String::new(),
        }
    }

    #[test]
    fn total_of_empty_ledger_is_zero() {
        assert_eq!(total_by_kind(&[], EntryKind::Payment), 0.0);
    }

    #[test]
    fn totals_split_by_kind() {
        let entries = vec![
            entry(EntryKind::Payment, 100.0),
            entry(EntryKind::Charge, 40.0),
        ];

        assert_eq!(total_by_kind(&entries, EntryKind::Payment), 100.0);
        assert_eq!(total_by_kind(&entries, EntryKind::Charge), 40.0);
    }

    #[test]
    fn summarising_twice_gives_identical_totals() {
        let entries = vec![
            entry(EntryKind::Payment, 12.5),
            entry(EntryKind::Charge, 7.25),
            entry(EntryKind::Payment, 3.0),
        ];

        let first = total_by_kind(&entries, EntryKind::Payment);
        let second = total_by_kind(&entries, EntryKind::Payment);

        assert_eq!(first, second);
        assert_eq!(first, 15.5);
    }

    #[test]
    fn balance_follows_the_convention() {
        let entries = vec![
            entry(EntryKind::Charge, 1000.0),
            entry(EntryKind::Payment, 600.0),
        ];

        assert_eq!(balance(&entries, SignConvention::ChargesMinusPayments), 400.0);
        assert_eq!(
            balance(&entries, SignConvention::PaymentsMinusCharges),
            -400.0
        );
    }

    #[test]
    fn percent_rate_rounds_to_one_decimal() {
        assert_eq!(percent_rate(3.0, 10.0), 30.0);
        assert_eq!(percent_rate(1.0, 3.0), 33.3);
    }

    #[test]
    fn percent_rate_of_zero_denominator_is_zero() {
        assert_eq!(percent_rate(0.0, 0.0), 0.0);
        assert_eq!(percent_rate(5.0, 0.0), 0.0);
    }

    #[test]
    fn attendance_rate_scenario() {
        // 30 students: 27 present, 2 late, 1 absent.
        assert_eq!(percent_rate(27.0, 30.0), 90.0);
    }

    #[test]
    fn trend_percentage_compares_against_previous() {
        assert_eq!(trend_percentage(120.0, 100.0), 20.0);
        assert_eq!(trend_percentage(80.0, 100.0), -20.0);
    }

    #[test]
    fn trend_percentage_with_no_previous_period_is_full() {
        assert_eq!(trend_percentage(50.0, 0.0), 100.0);
    }
}
