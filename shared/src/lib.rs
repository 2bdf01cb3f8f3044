use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Currency a note is tallied in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Japanese yen
    Jpy,
    /// Chinese yuan
    Cny,
}

impl Currency {
    /// ISO 4217 code, also used in export file names
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Jpy => "JPY",
            Currency::Cny => "CNY",
        }
    }

    /// Unit suffix shown next to amounts
    pub fn unit(&self) -> &'static str {
        match self {
            Currency::Jpy => "円",
            Currency::Cny => "元",
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::Jpy
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "JPY" => Ok(Currency::Jpy),
            "CNY" => Ok(Currency::Cny),
            other => Err(format!("Unsupported currency: {}", other)),
        }
    }
}

/// Count map as stored: denomination id -> count string
pub type CountMap = BTreeMap<String, String>;

/// The single persisted blob holding every note.
///
/// This is the shape written to storage under the notes key and the shape of
/// a backup file, so field names stay camelCase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesDocument {
    /// Id of the active note (None only in hand-edited or legacy data)
    #[serde(default)]
    pub current_note_id: Option<String>,
    pub notes: Vec<NoteRecord>,
}

/// A persisted tally sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    pub id: String,
    pub name: String,
    /// RFC 3339 timestamp
    pub created_at: String,
    /// RFC 3339 timestamp
    pub updated_at: String,
    pub currency: Currency,
    #[serde(default, deserialize_with = "deserialize_counts")]
    pub counts: CountMap,
    #[serde(default)]
    pub settings: NoteSettingsRecord,
    #[serde(default)]
    pub saved_points: Vec<SavedPointRecord>,
    /// Accent colour tag, e.g. "#ff8800"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Per-note denomination visibility flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteSettingsRecord {
    #[serde(rename = "hide2000")]
    pub hide_2000: bool,
    #[serde(rename = "hideBills")]
    pub hide_bills: bool,
    #[serde(rename = "hideCoins")]
    pub hide_coins: bool,
}

/// A persisted history entry of a note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPointRecord {
    pub id: String,
    /// RFC 3339 timestamp
    pub timestamp: String,
    #[serde(default)]
    pub memo: String,
    #[serde(default, deserialize_with = "deserialize_counts")]
    pub counts: CountMap,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub bill_count: f64,
    #[serde(default)]
    pub coin_count: f64,
}

/// Count values were written as strings by the tally sheet but as plain
/// numbers by older history snapshots; accept both.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawCount {
    Text(String),
    Number(serde_json::Number),
}

fn deserialize_counts<'de, D>(deserializer: D) -> Result<CountMap, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, RawCount>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(id, value)| {
            let value = match value {
                RawCount::Text(text) => text,
                RawCount::Number(number) => number.to_string(),
            };
            (id, value)
        })
        .collect())
}
