//! CSV rendition of a summary export.
//!
//! ```text
//! 金種,枚数,金額
//! 千円札,3,3000
//! 百円玉,5,500
//! 合計,8,3500
//! 紙幣,3,
//! 硬貨,5,
//! ```

use csv::Writer;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::backend::domain::expression::format_decimal;
use crate::backend::domain::export_service::{ExportError, ExportSnapshot, SummaryExporter};

/// Writes `YYYYMMDDHHMM_<CUR>.csv` files into one directory
#[derive(Debug, Clone)]
pub struct CsvSummaryExporter {
    directory: PathBuf,
}

impl CsvSummaryExporter {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path_for(&self, snapshot: &ExportSnapshot) -> PathBuf {
        self.directory.join(format!("{}.csv", snapshot.file_stem()))
    }
}

impl SummaryExporter for CsvSummaryExporter {
    fn export(&self, snapshot: &ExportSnapshot) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.directory)?;
        let path = self.path_for(snapshot);

        let mut writer = Writer::from_path(&path)?;
        writer.write_record(["金種", "枚数", "金額"])?;
        for row in &snapshot.rows {
            writer.write_record([
                row.label.to_string(),
                format_decimal(row.count),
                row.display_amount(),
            ])?;
        }
        writer.write_record([
            "合計".to_string(),
            format_decimal(snapshot.piece_count()),
            format_decimal(snapshot.total),
        ])?;
        writer.write_record(["紙幣".to_string(), format_decimal(snapshot.bill_count), String::new()])?;
        writer.write_record(["硬貨".to_string(), format_decimal(snapshot.coin_count), String::new()])?;
        writer.flush()?;

        info!(
            "Exported {} row(s) of '{}' to {}",
            snapshot.rows.len(),
            snapshot.note_name,
            path.display()
        );
        Ok(path)
    }
}
