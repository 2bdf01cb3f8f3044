//! Static denomination catalogs for the supported currencies.

use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use shared::Currency;

use super::note::NoteSettings;

/// One bill or coin of a currency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denomination {
    pub id: &'static str,
    pub currency: Currency,
    pub face_value: Decimal,
    pub label: &'static str,
    /// Explicit coin flag; sub-unit values count as coins regardless
    pub is_coin: bool,
}

impl Denomination {
    fn new(
        id: &'static str,
        currency: Currency,
        face_value: Decimal,
        label: &'static str,
        is_coin: bool,
    ) -> Self {
        Self {
            id,
            currency,
            face_value,
            label,
            is_coin,
        }
    }

    /// Coin if flagged, or if worth less than one unit
    pub fn counts_as_coin(&self) -> bool {
        self.is_coin || self.face_value < Decimal::ONE
    }

    pub fn counts_as_bill(&self) -> bool {
        !self.counts_as_coin()
    }

    /// Whether the note settings hide this denomination. Only JPY is restricted.
    pub fn is_hidden_by(&self, settings: &NoteSettings) -> bool {
        if self.currency != Currency::Jpy {
            return false;
        }

        let is_2000 = self.face_value == Decimal::from(2000);
        (settings.hide_2000 && is_2000)
            || (settings.hide_bills && self.counts_as_bill())
            || (settings.hide_coins && self.counts_as_coin())
    }

    /// Face value times `count`; None on overflow
    pub fn amount_for(&self, count: Decimal) -> Option<Decimal> {
        self.face_value.checked_mul(count)
    }
}

static JPY_CATALOG: Lazy<Vec<Denomination>> = Lazy::new(|| {
    let jpy = |id, value: i64, label, is_coin| {
        Denomination::new(id, Currency::Jpy, Decimal::from(value), label, is_coin)
    };
    vec![
        jpy("jpy-10000", 10000, "一万円札", false),
        jpy("jpy-5000", 5000, "五千円札", false),
        jpy("jpy-2000", 2000, "二千円札", false),
        jpy("jpy-1000", 1000, "千円札", false),
        jpy("jpy-500", 500, "五百円玉", true),
        jpy("jpy-100", 100, "百円玉", true),
        jpy("jpy-50", 50, "五十円玉", true),
        jpy("jpy-10", 10, "十円玉", true),
        jpy("jpy-5", 5, "五円玉", true),
        jpy("jpy-1", 1, "一円玉", true),
    ]
});

static CNY_CATALOG: Lazy<Vec<Denomination>> = Lazy::new(|| {
    // face value given as (mantissa, scale): (5, 1) is 0.5
    let cny = |id, mantissa: i64, scale: u32, label, is_coin| {
        Denomination::new(id, Currency::Cny, Decimal::new(mantissa, scale), label, is_coin)
    };
    vec![
        cny("cny-100", 100, 0, "100元札", false),
        cny("cny-50", 50, 0, "50元札", false),
        cny("cny-20", 20, 0, "20元札", false),
        cny("cny-10", 10, 0, "10元札", false),
        cny("cny-5", 5, 0, "5元札", false),
        cny("cny-1b", 1, 0, "1元札", false),
        cny("cny-1c", 1, 0, "1元硬貨", true),
        cny("cny-05", 5, 1, "5角硬貨", true),
        cny("cny-01", 1, 1, "1角硬貨", true),
    ]
});

/// Denominations of `currency` in display order
pub fn catalog(currency: Currency) -> &'static [Denomination] {
    match currency {
        Currency::Jpy => &JPY_CATALOG,
        Currency::Cny => &CNY_CATALOG,
    }
}

pub fn find(currency: Currency, id: &str) -> Option<&'static Denomination> {
    catalog(currency).iter().find(|d| d.id == id)
}
