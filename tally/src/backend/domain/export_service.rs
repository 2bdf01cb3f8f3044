//! Summary export.
//!
//! An [`ExportSnapshot`] is a read-only copy of what the user sees: the visible
//! denominations with a positive count, and totals over exactly those rows.
//! Turning a snapshot into a file is the job of a [`SummaryExporter`], which
//! runs on a blocking task so tallying is never held up by it.

use chrono::{DateTime, Local};
use log::{error, info, warn};
use rust_decimal::Decimal;
use shared::Currency;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::backend::domain::expression::format_decimal;
use crate::backend::domain::models::Note;
use crate::backend::domain::summary::{parse_count, Summary};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Export I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Export task failed: {0}")]
    Task(String),
}

/// One exported denomination line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub denomination_id: &'static str,
    pub label: &'static str,
    pub face_value: Decimal,
    pub is_coin: bool,
    pub count: Decimal,
    pub amount: Decimal,
}

impl ExportRow {
    /// Amount as printed: sub-unit coins keep one decimal place
    pub fn display_amount(&self) -> String {
        if self.face_value < Decimal::ONE {
            format!("{:.1}", self.amount)
        } else {
            format_decimal(self.amount)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSnapshot {
    pub note_name: String,
    pub currency: Currency,
    pub generated_at: DateTime<Local>,
    pub rows: Vec<ExportRow>,
    pub total: Decimal,
    pub bill_count: Decimal,
    pub coin_count: Decimal,
}

impl ExportSnapshot {
    /// Snapshot of `note` as currently displayed
    pub fn build(note: &Note, generated_at: DateTime<Local>) -> Self {
        let mut snapshot = Self {
            note_name: note.name.clone(),
            currency: note.currency,
            generated_at,
            rows: Vec::new(),
            total: Decimal::ZERO,
            bill_count: Decimal::ZERO,
            coin_count: Decimal::ZERO,
        };

        for denomination in note.visible_denominations() {
            let count = parse_count(note.count_of(denomination.id));
            if count <= Decimal::ZERO {
                continue;
            }
            let is_coin = denomination.counts_as_coin();
            let next = denomination.amount_for(count).and_then(|amount| {
                snapshot
                    .summary()
                    .checked_add(amount, count, is_coin)
                    .map(|totals| (amount, totals))
            });
            let Some((amount, totals)) = next else {
                warn!("Leaving {} out of export: totals overflow", denomination.id);
                continue;
            };

            snapshot.total = totals.total;
            snapshot.bill_count = totals.bill_count;
            snapshot.coin_count = totals.coin_count;
            snapshot.rows.push(ExportRow {
                denomination_id: denomination.id,
                label: denomination.label,
                face_value: denomination.face_value,
                is_coin,
                count,
                amount,
            });
        }

        snapshot
    }

    pub fn piece_count(&self) -> Decimal {
        self.summary().piece_count()
    }

    /// Totals over the exported rows
    pub fn summary(&self) -> Summary {
        Summary {
            total: self.total,
            bill_count: self.bill_count,
            coin_count: self.coin_count,
        }
    }

    /// `YYYYMMDDHHMM_<CUR>`, the base name of exported files
    pub fn file_stem(&self) -> String {
        format!(
            "{}_{}",
            self.generated_at.format("%Y%m%d%H%M"),
            self.currency.code()
        )
    }
}

/// Turns a snapshot into an artifact and reports where it went
pub trait SummaryExporter: Send + Sync {
    fn export(&self, snapshot: &ExportSnapshot) -> Result<PathBuf, ExportError>;
}

/// Run `exporter` on a blocking task and report the outcome through `on_done`.
///
/// Must be called from within a tokio runtime.
pub fn export_in_background<F>(
    exporter: Arc<dyn SummaryExporter>,
    snapshot: ExportSnapshot,
    on_done: F,
) -> JoinHandle<()>
where
    F: FnOnce(Result<PathBuf, ExportError>) + Send + 'static,
{
    info!(
        "Exporting {} row(s) of '{}' in the background",
        snapshot.rows.len(),
        snapshot.note_name
    );

    tokio::spawn(async move {
        let result = match tokio::task::spawn_blocking(move || exporter.export(&snapshot)).await {
            Ok(result) => result,
            Err(e) => Err(ExportError::Task(e.to_string())),
        };

        match &result {
            Ok(path) => info!("Export written to {}", path.display()),
            Err(e) => error!("Export failed: {}", e),
        }
        on_done(result);
    })
}
