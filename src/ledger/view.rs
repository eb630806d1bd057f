//! Shared markup for account pages: stat cards and the entries table.

use maud::{Markup, html};

use crate::html::{
    TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, format_currency, stat_card,
};

use super::{
    EntryKind, LedgerEntry, SignConvention, balance,
    model::PaymentMethod,
    summary::total_by_kind,
};

/// The stat cards shown at the top of an account page: total charged, total
/// paid, and the balance under the account's convention.
///
/// `balance_label` names the balance in the account's own terms, e.g.
/// "Outstanding fees" or "Account credit".
pub(crate) fn account_summary_cards(
    entries: &[LedgerEntry],
    convention: SignConvention,
    balance_label: &str,
) -> Markup {
    let charged = total_by_kind(entries, EntryKind::Charge);
    let paid = total_by_kind(entries, EntryKind::Payment);
    let balance = balance(entries, convention);

    html! {
        div class="grid w-full max-w-screen-lg grid-cols-1 gap-4 sm:grid-cols-3"
        {
            (stat_card("Total billed", &format_currency(charged)))
            (stat_card("Total paid", &format_currency(paid)))
            (stat_card(balance_label, &format_currency(balance)))
        }
    }
}

/// The table of an account's ledger entries, newest first.
pub(crate) fn entries_table(entries: &[LedgerEntry]) -> Markup {
    html! {
        @if entries.is_empty() {
            p class="text-gray-500 dark:text-gray-400 py-4" { "No entries recorded yet." }
        } @else {
            table class="w-full max-w-screen-lg text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th class=(TABLE_CELL_STYLE) { "Date" }
                        th class=(TABLE_CELL_STYLE) { "Type" }
                        th class=(TABLE_CELL_STYLE) { "Description" }
                        th class=(TABLE_CELL_STYLE) { "Method" }
                        th class=(TABLE_CELL_STYLE) { "Reference" }
                        th class=(TABLE_CELL_STYLE) { "Amount" }
                    }
                }

                tbody
                {
                    @for entry in entries.iter().rev() {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE) { (entry.date) }
                            td class=(TABLE_CELL_STYLE) { (entry.kind.display_name()) }
                            td class=(TABLE_CELL_STYLE) { (entry.description) }
                            td class=(TABLE_CELL_STYLE) {
                                (entry.method.map(PaymentMethod::display_name).unwrap_or("—"))
                            }
                            td class=(TABLE_CELL_STYLE) { (entry.reference) }
                            td class=(TABLE_CELL_STYLE) { (format_currency(entry.amount)) }
                        }
                    }
                }
            }
        }
    }
}
