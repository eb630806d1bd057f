//! The ledger entry model shared by the fee, food and transport accounts.

use rusqlite::Row;
use serde::{Deserialize, Serialize};
use time::{
    Date, format_description::BorrowedFormatItem, macros::format_description,
};

use crate::{
    Error,
    database_id::{EntryId, StudentId},
};

/// Whether an entry is money owed to the school or money received.
///
/// The sign of an entry is never stored; it is derived from its kind under
/// the account's [SignConvention](super::SignConvention).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryKind {
    /// Money received from the student's guardian.
    Payment,
    /// Money billed to the student, displayed as an invoice on the fee pages.
    Charge,
}

impl EntryKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            EntryKind::Payment => "PAYMENT",
            EntryKind::Charge => "CHARGE",
        }
    }

    pub(crate) fn from_column(value: &str) -> Result<Self, Error> {
        match value {
            "PAYMENT" => Ok(EntryKind::Payment),
            "CHARGE" => Ok(EntryKind::Charge),
            other => Err(Error::InvalidColumnValue(other.to_owned(), "kind")),
        }
    }

    /// The label shown in entry tables.
    pub fn display_name(self) -> &'static str {
        match self {
            EntryKind::Payment => "Payment",
            EntryKind::Charge => "Invoice",
        }
    }
}

/// How a payment was made. Payments only; charges carry no method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    /// Cash handed in at the school office.
    Cash,
    /// An M-PESA mobile money transfer.
    Mpesa,
    /// A bank deposit or transfer.
    Bank,
}

impl PaymentMethod {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Mpesa => "MPESA",
            PaymentMethod::Bank => "BANK",
        }
    }

    pub(crate) fn from_column(value: &str) -> Result<Self, Error> {
        match value {
            "CASH" => Ok(PaymentMethod::Cash),
            "MPESA" => Ok(PaymentMethod::Mpesa),
            "BANK" => Ok(PaymentMethod::Bank),
            other => Err(Error::InvalidColumnValue(other.to_owned(), "method")),
        }
    }

    /// The label shown in entry tables.
    pub fn display_name(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Mpesa => "M-PESA",
            PaymentMethod::Bank => "Bank",
        }
    }
}

/// One row of a student's account ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// The ID of the entry.
    pub id: EntryId,
    /// The student whose account this entry belongs to.
    pub student_id: StudentId,
    /// Whether the entry bills or credits the account.
    pub kind: EntryKind,
    /// The non-negative magnitude of the entry.
    pub amount: f64,
    /// When the money moved.
    pub date: Date,
    /// How a payment was made. Always `None` for charges.
    pub method: Option<PaymentMethod>,
    /// A text description of what the entry was for.
    pub description: String,
    /// An opaque receipt or invoice reference.
    pub reference: String,
}

/// The data needed to append an entry to an account ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    /// The student whose account to append to.
    pub student_id: StudentId,
    /// Whether the entry bills or credits the account.
    pub kind: EntryKind,
    /// The non-negative magnitude of the entry.
    pub amount: f64,
    /// When the money moved.
    pub date: Date,
    /// How a payment was made. Ignored for charges.
    pub method: Option<PaymentMethod>,
    /// A text description of what the entry was for.
    pub description: String,
    /// An opaque receipt or invoice reference.
    pub reference: String,
}

/// The format used by HTML date inputs.
const DATE_INPUT_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Parse a date from a form field as submitted by an HTML date input.
///
/// # Errors
/// Returns [Error::InvalidDate] if `value` is not a YYYY-MM-DD date.
pub(crate) fn parse_entry_date(value: &str) -> Result<Date, Error> {
    Date::parse(value.trim(), DATE_INPUT_FORMAT).map_err(|_| Error::InvalidDate(value.to_owned()))
}

/// Map a database row to a [LedgerEntry].
///
/// Expects the columns id, student_id, kind, amount, date, method,
/// description, reference in that order.
pub(crate) fn map_entry_row(row: &Row) -> Result<LedgerEntry, rusqlite::Error> {
    let kind_column: String = row.get(2)?;
    let kind = EntryKind::from_column(&kind_column)
        .map_err(|_| rusqlite::Error::InvalidQuery)?;

    let method_column: Option<String> = row.get(5)?;
    let method = match method_column {
        Some(value) => Some(
            PaymentMethod::from_column(&value).map_err(|_| rusqlite::Error::InvalidQuery)?,
        ),
        None => None,
    };

    Ok(LedgerEntry {
        id: row.get(0)?,
        student_id: row.get(1)?,
        kind,
        amount: row.get(3)?,
        date: row.get(4)?,
        method,
        description: row.get(6)?,
        reference: row.get(7)?,
    })
}
