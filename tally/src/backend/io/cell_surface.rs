//! The view side of the tally: whatever draws the denomination cells.

use shared::Currency;

use crate::backend::domain::models::{denomination, Counts, NoteSettings};
use crate::backend::domain::summary::Summary;

/// A renderer for the denomination grid and totals.
///
/// The session pushes the full state after every change; implementations
/// never read counts back from what they display.
pub trait CellSurface {
    fn show_counts(
        &mut self,
        currency: Currency,
        settings: &NoteSettings,
        counts: &Counts,
        summary: &Summary,
    );

    /// Tell the user a background save failed
    fn show_save_error(&mut self, message: &str);
}

/// A visible cell as last rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCell {
    pub denomination_id: &'static str,
    pub label: &'static str,
    pub count: String,
}

/// Surface that keeps the last rendered state in memory, for headless use and tests
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    render_count: usize,
    currency: Option<Currency>,
    cells: Vec<RenderedCell>,
    summary: Summary,
    save_errors: Vec<String>,
}

impl HeadlessSurface {
    pub fn render_count(&self) -> usize {
        self.render_count
    }

    pub fn currency(&self) -> Option<Currency> {
        self.currency
    }

    /// Visible cells in display order
    pub fn cells(&self) -> &[RenderedCell] {
        &self.cells
    }

    pub fn cell(&self, denomination_id: &str) -> Option<&RenderedCell> {
        self.cells
            .iter()
            .find(|cell| cell.denomination_id == denomination_id)
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    /// Save failures shown so far, oldest first
    pub fn save_errors(&self) -> &[String] {
        &self.save_errors
    }
}

impl CellSurface for HeadlessSurface {
    fn show_counts(
        &mut self,
        currency: Currency,
        settings: &NoteSettings,
        counts: &Counts,
        summary: &Summary,
    ) {
        self.render_count += 1;
        self.currency = Some(currency);
        self.summary = *summary;
        self.cells = denomination::catalog(currency)
            .iter()
            .filter(|d| !d.is_hidden_by(settings))
            .map(|d| RenderedCell {
                denomination_id: d.id,
                label: d.label,
                count: counts.get(d.id).cloned().unwrap_or_else(|| "0".to_string()),
            })
            .collect();
    }

    fn show_save_error(&mut self, message: &str) {
        self.save_errors.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_headless_surface_keeps_visible_cells() {
        let mut surface = HeadlessSurface::default();
        let mut counts = Counts::new();
        counts.insert("jpy-500".into(), "2".into());
        let settings = NoteSettings {
            hide_bills: true,
            ..NoteSettings::default()
        };
        let summary = Summary {
            total: Decimal::from(1000),
            bill_count: Decimal::ZERO,
            coin_count: Decimal::from(2),
        };

        surface.show_counts(Currency::Jpy, &settings, &counts, &summary);

        assert_eq!(surface.render_count(), 1);
        assert_eq!(surface.cells().len(), 6);
        assert_eq!(surface.cell("jpy-500").unwrap().count, "2");
        assert_eq!(surface.cell("jpy-1").unwrap().count, "0");
        assert!(surface.cell("jpy-1000").is_none());
        assert_eq!(surface.summary().total, Decimal::from(1000));
    }
}
