//! # IO Module
//!
//! The boundary between the tally engine and the outside world.
//!
//! - **cell_surface**: the [`CellSurface`] trait a UI implements to display
//!   counts, plus an in-memory [`HeadlessSurface`]
//! - **csv_exporter**: writes export snapshots as CSV files
//! - **mappers**: conversion between the persisted `shared` records and
//!   domain models

pub mod cell_surface;
pub mod csv_exporter;
pub mod mappers;

pub use cell_surface::{CellSurface, HeadlessSurface, RenderedCell};
pub use csv_exporter::CsvSummaryExporter;
