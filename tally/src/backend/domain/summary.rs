//! Totals over a note's counts.

use log::warn;
use rust_decimal::Decimal;
use shared::Currency;
use std::str::FromStr;

use crate::backend::domain::expression::format_decimal;
use crate::backend::domain::models::{denomination, Counts};

/// Money total plus bill and coin piece counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: Decimal,
    pub bill_count: Decimal,
    pub coin_count: Decimal,
}

impl Summary {
    pub fn piece_count(&self) -> Decimal {
        self.bill_count.saturating_add(self.coin_count)
    }

    /// Add one denomination's amount and pieces, or `None` if any of the
    /// totals, including the combined piece count, would overflow.
    pub fn checked_add(&self, amount: Decimal, count: Decimal, is_coin: bool) -> Option<Summary> {
        let total = self.total.checked_add(amount)?;
        let (bill_count, coin_count) = if is_coin {
            (self.bill_count, self.coin_count.checked_add(count)?)
        } else {
            (self.bill_count.checked_add(count)?, self.coin_count)
        };
        bill_count.checked_add(coin_count)?;

        Some(Summary {
            total,
            bill_count,
            coin_count,
        })
    }
}

/// Parse a stored count. Anything unparsable counts as zero.
pub fn parse_count(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(trimmed).unwrap_or(Decimal::ZERO)
}

/// Sum `counts` against the catalog of `currency`.
///
/// Ids outside the catalog and missing counts contribute nothing. A
/// denomination whose amount would overflow is skipped.
pub fn compute_summary(currency: Currency, counts: &Counts) -> Summary {
    let mut summary = Summary::default();

    for denomination in denomination::catalog(currency) {
        let count = counts
            .get(denomination.id)
            .map(|raw| parse_count(raw))
            .unwrap_or(Decimal::ZERO);
        if count.is_zero() {
            continue;
        }

        let next = denomination
            .amount_for(count)
            .and_then(|amount| summary.checked_add(amount, count, denomination.counts_as_coin()));
        match next {
            Some(next) => summary = next,
            None => warn!("Skipping {} in summary: totals overflow", denomination.id),
        }
    }

    summary
}

/// Memo for a save point recorded without one.
///
/// JPY totals read in 万 and 千 (`3万5千`, `2万`, `8千`), falling back to
/// `N円` below a thousand yen. CNY totals are `N元`.
pub fn default_memo(currency: Currency, total: Decimal) -> String {
    match currency {
        Currency::Jpy => {
            let man = (total / Decimal::from(10_000)).floor();
            let sen = ((total % Decimal::from(10_000)) / Decimal::from(1_000)).floor();
            let positive = |value: Decimal| value > Decimal::ZERO;

            if positive(man) && positive(sen) {
                format!("{}万{}千", format_decimal(man), format_decimal(sen))
            } else if positive(man) {
                format!("{}万", format_decimal(man))
            } else if positive(sen) {
                format!("{}千", format_decimal(sen))
            } else {
                format!("{}円", format_decimal(total))
            }
        }
        Currency::Cny => format!("{}元", format_decimal(total)),
    }
}
