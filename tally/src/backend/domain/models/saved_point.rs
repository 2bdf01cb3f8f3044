//! Domain model for a save point: a snapshot of a note's counts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::note::Counts;
use crate::backend::domain::summary::Summary;

#[derive(Debug, Clone, PartialEq)]
pub struct SavedPoint {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub memo: String,
    pub counts: Counts,
    pub total: Decimal,
    pub bill_count: Decimal,
    pub coin_count: Decimal,
}

impl SavedPoint {
    pub fn new(memo: impl Into<String>, counts: Counts, summary: Summary) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            memo: memo.into(),
            counts,
            total: summary.total,
            bill_count: summary.bill_count,
            coin_count: summary.coin_count,
        }
    }

    pub fn summary(&self) -> Summary {
        Summary {
            total: self.total,
            bill_count: self.bill_count,
            coin_count: self.coin_count,
        }
    }
}
