//! Conversion between the persisted `shared` records and domain notes.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use shared::{NoteRecord, NoteSettingsRecord, NotesDocument, SavedPointRecord};

use crate::backend::domain::models::{Note, NoteSettings, SavedPoint};

/// Mapper to convert between shared note records and domain Note models.
pub struct NoteMapper;

impl NoteMapper {
    /// Converts a persisted note to a domain Note.
    ///
    /// Counts for denominations outside the note's currency are dropped.
    pub fn to_domain(record: NoteRecord) -> Result<Note> {
        let created_at = parse_timestamp(&record.created_at)
            .with_context(|| format!("Failed to parse createdAt of note {}", record.id))?;
        let updated_at = parse_timestamp(&record.updated_at)
            .with_context(|| format!("Failed to parse updatedAt of note {}", record.id))?;

        let saved_points = record
            .saved_points
            .into_iter()
            .map(Self::saved_point_to_domain)
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("Failed to read history of note {}", record.id))?;

        Ok(Note {
            id: record.id,
            name: record.name,
            created_at,
            updated_at,
            currency: record.currency,
            counts: Note::retain_known_counts(record.counts, record.currency),
            settings: Self::settings_to_domain(record.settings),
            saved_points,
            color: record.color,
        })
    }

    /// Converts a domain Note to its persisted record.
    pub fn to_record(note: &Note) -> NoteRecord {
        NoteRecord {
            id: note.id.clone(),
            name: note.name.clone(),
            created_at: note.created_at.to_rfc3339(),
            updated_at: note.updated_at.to_rfc3339(),
            currency: note.currency,
            counts: note.counts.clone(),
            settings: Self::settings_to_record(note.settings),
            saved_points: note
                .saved_points
                .iter()
                .map(Self::saved_point_to_record)
                .collect(),
            color: note.color.clone(),
        }
    }

    pub fn settings_to_domain(record: NoteSettingsRecord) -> NoteSettings {
        NoteSettings {
            hide_2000: record.hide_2000,
            hide_bills: record.hide_bills,
            hide_coins: record.hide_coins,
        }
    }

    pub fn settings_to_record(settings: NoteSettings) -> NoteSettingsRecord {
        NoteSettingsRecord {
            hide_2000: settings.hide_2000,
            hide_bills: settings.hide_bills,
            hide_coins: settings.hide_coins,
        }
    }

    pub fn saved_point_to_domain(record: SavedPointRecord) -> Result<SavedPoint> {
        let timestamp = parse_timestamp(&record.timestamp)
            .with_context(|| format!("Failed to parse timestamp of save point {}", record.id))?;

        Ok(SavedPoint {
            id: record.id,
            timestamp,
            memo: record.memo,
            counts: record.counts,
            total: to_decimal(record.total).context("Save point total is not a finite number")?,
            bill_count: to_decimal(record.bill_count)
                .context("Save point bill count is not a finite number")?,
            coin_count: to_decimal(record.coin_count)
                .context("Save point coin count is not a finite number")?,
        })
    }

    pub fn saved_point_to_record(point: &SavedPoint) -> SavedPointRecord {
        SavedPointRecord {
            id: point.id.clone(),
            timestamp: point.timestamp.to_rfc3339(),
            memo: point.memo.clone(),
            counts: point.counts.clone(),
            total: to_f64(point.total),
            bill_count: to_f64(point.bill_count),
            coin_count: to_f64(point.coin_count),
        }
    }

    /// Converts a whole persisted document. Fails on the first unreadable note.
    pub fn document_to_domain(document: NotesDocument) -> Result<(Option<String>, Vec<Note>)> {
        let notes = document
            .notes
            .into_iter()
            .map(Self::to_domain)
            .collect::<Result<Vec<_>>>()?;
        Ok((document.current_note_id, notes))
    }

    pub fn document_to_record(current_note_id: &str, notes: &[Note]) -> NotesDocument {
        NotesDocument {
            current_note_id: Some(current_note_id.to_string()),
            notes: notes.iter().map(Self::to_record).collect(),
        }
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

fn to_decimal(value: f64) -> Option<Decimal> {
    Decimal::from_f64(value).map(|d| d.normalize())
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}
