//! Domain model for a tally note.

use chrono::{DateTime, Utc};
use shared::{CountMap, Currency};
use uuid::Uuid;

use super::denomination::{self, Denomination};
use super::saved_point::SavedPoint;

/// Denomination id -> count as entered (e.g. "3", "2.5")
pub type Counts = CountMap;

/// Per-note denomination visibility flags (JPY only)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoteSettings {
    pub hide_2000: bool,
    pub hide_bills: bool,
    pub hide_coins: bool,
}

/// Partial settings update; `None` leaves a flag unchanged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoteSettingsPatch {
    pub hide_2000: Option<bool>,
    pub hide_bills: Option<bool>,
    pub hide_coins: Option<bool>,
}

impl NoteSettings {
    pub fn merged(self, patch: NoteSettingsPatch) -> Self {
        Self {
            hide_2000: patch.hide_2000.unwrap_or(self.hide_2000),
            hide_bills: patch.hide_bills.unwrap_or(self.hide_bills),
            hide_coins: patch.hide_coins.unwrap_or(self.hide_coins),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub currency: Currency,
    pub counts: Counts,
    pub settings: NoteSettings,
    /// Newest first
    pub saved_points: Vec<SavedPoint>,
    pub color: Option<String>,
}

impl Note {
    pub fn new(name: impl Into<String>, currency: Currency, settings: NoteSettings) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            created_at: now,
            updated_at: now,
            currency,
            counts: Counts::new(),
            settings,
            saved_points: Vec::new(),
            color: None,
        }
    }

    /// Stored count for a denomination, "0" when nothing was entered
    pub fn count_of(&self, denomination_id: &str) -> &str {
        self.counts
            .get(denomination_id)
            .map(String::as_str)
            .unwrap_or("0")
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn denominations(&self) -> &'static [Denomination] {
        denomination::catalog(self.currency)
    }

    /// Denominations not hidden by this note's settings
    pub fn visible_denominations(&self) -> impl Iterator<Item = &'static Denomination> + '_ {
        self.denominations()
            .iter()
            .filter(move |d| !d.is_hidden_by(&self.settings))
    }

    /// Keep only counts for denominations of this note's currency
    pub fn retain_known_counts(counts: Counts, currency: Currency) -> Counts {
        counts
            .into_iter()
            .filter(|(id, _)| denomination::find(currency, id).is_some())
            .collect()
    }

    /// Insert at the head and drop the oldest entries beyond `cap`
    pub fn push_saved_point(&mut self, point: SavedPoint, cap: usize) {
        self.saved_points.insert(0, point);
        self.saved_points.truncate(cap);
    }

    pub fn saved_point(&self, saved_point_id: &str) -> Option<&SavedPoint> {
        self.saved_points.iter().find(|sp| sp.id == saved_point_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::summary::Summary;

    #[test]
    fn test_new_note_is_empty() {
        let note = Note::new("Register", Currency::Jpy, NoteSettings::default());
        assert!(!note.id.is_empty());
        assert!(note.counts.is_empty());
        assert!(note.saved_points.is_empty());
        assert_eq!(note.created_at, note.updated_at);
        assert_eq!(note.count_of("jpy-1000"), "0");
    }

    #[test]
    fn test_settings_patch_only_touches_given_flags() {
        let settings = NoteSettings {
            hide_2000: true,
            ..NoteSettings::default()
        };
        let merged = settings.merged(NoteSettingsPatch {
            hide_coins: Some(true),
            ..NoteSettingsPatch::default()
        });
        assert_eq!(
            merged,
            NoteSettings {
                hide_2000: true,
                hide_bills: false,
                hide_coins: true,
            }
        );
    }

    #[test]
    fn test_visible_denominations_respect_settings() {
        let mut note = Note::new("A", Currency::Jpy, NoteSettings::default());
        assert_eq!(note.visible_denominations().count(), 10);

        note.settings.hide_bills = true;
        let visible: Vec<_> = note.visible_denominations().map(|d| d.id).collect();
        assert_eq!(visible.len(), 6);
        assert!(!visible.contains(&"jpy-10000"));
    }

    #[test]
    fn test_saved_points_are_capped_newest_first() {
        let mut note = Note::new("A", Currency::Jpy, NoteSettings::default());
        for i in 0..5 {
            let point = SavedPoint::new(format!("memo {}", i), Counts::new(), Summary::default());
            note.push_saved_point(point, 3);
        }
        let memos: Vec<_> = note.saved_points.iter().map(|sp| sp.memo.as_str()).collect();
        assert_eq!(memos, vec!["memo 4", "memo 3", "memo 2"]);
    }

    #[test]
    fn test_retain_known_counts_drops_foreign_ids() {
        let mut counts = Counts::new();
        counts.insert("jpy-1000".into(), "3".into());
        counts.insert("cny-100".into(), "1".into());

        let kept = Note::retain_known_counts(counts, Currency::Jpy);
        assert_eq!(kept.len(), 1);
        assert!(kept.contains_key("jpy-1000"));
    }
}
