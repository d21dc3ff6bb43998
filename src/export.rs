//! CSV export of the enriched record set
//!
//! The exporter writes a fixed projection: the columns in [`COLUMNS`], in that
//! order, regardless of which other columns the row type carries.

use std::{
    borrow::Cow,
    io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, TimeZone};
use tracing::{debug, info};

/// Columns of the report, in output order.
pub const COLUMNS: [&str; 8] = [
    "alle_ingestion_id",
    "alle_media_key",
    "ingestion_query",
    "store_rank",
    "syn_con_image_selection",
    "brisque_score",
    "eligible",
    "image_url",
];

/// A single value of a row. `Null` renders as an empty cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Null,
    Text(&'a str),
    Integer(i64),
    Real(f64),
}

impl Cell<'_> {
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            Cell::Null => Cow::Borrowed(""),
            Cell::Text(text) => Cow::Borrowed(text),
            Cell::Integer(value) => Cow::Owned(value.to_string()),
            // `{:?}` keeps a trailing `.0` on integral reals, e.g. `5.0`.
            Cell::Real(value) => Cow::Owned(format!("{value:?}")),
        }
    }
}

impl<'a> From<Option<&'a str>> for Cell<'a> {
    fn from(value: Option<&'a str>) -> Self {
        value.map_or(Cell::Null, Cell::Text)
    }
}

impl From<Option<i64>> for Cell<'_> {
    fn from(value: Option<i64>) -> Self {
        value.map_or(Cell::Null, Cell::Integer)
    }
}

impl From<Option<f64>> for Cell<'_> {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Cell::Null, Cell::Real)
    }
}

/// A row type that can be projected by column name.
pub trait Tabular {
    /// Every column this row type can provide.
    const COLUMNS: &'static [&'static str];

    /// Look up a column. `None` means the column does not exist.
    fn cell(&self, column: &str) -> Option<Cell<'_>>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("missing column in record set: {0}")]
    MissingColumn(&'static str),
    #[error("failed to create {path}: {source}")]
    Create { path: PathBuf, source: io::Error },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush output: {0}")]
    Flush(io::Error),
}

/// `eligible_image_report_<YYYYMMDD_HHMM>.csv` for the given run start.
pub fn default_filename<Tz: TimeZone>(started_at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "eligible_image_report_{}.csv",
        started_at.format("%Y%m%d_%H%M")
    )
}

fn check_columns<T: Tabular>() -> Result<(), Error> {
    match COLUMNS.iter().find(|column| !T::COLUMNS.contains(*column)) {
        Some(missing) => Err(Error::MissingColumn(*missing)),
        None => Ok(()),
    }
}

/// Write the report projection of `rows` to `writer`.
pub fn write<T: Tabular, W: io::Write>(writer: W, rows: &[T]) -> Result<(), Error> {
    check_columns::<T>()?;
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(COLUMNS)?;
    for row in rows {
        let cells = COLUMNS
            .iter()
            .map(|column| row.cell(column).ok_or(Error::MissingColumn(*column)))
            .collect::<Result<Vec<_>, _>>()?;
        csv.write_record(cells.iter().map(|cell| cell.render().into_owned()))?;
    }
    csv.flush().map_err(Error::Flush)?;
    Ok(())
}

/// Write the report to `path`. The schema is checked before the file is created.
pub fn export<T: Tabular>(path: &Path, rows: &[T]) -> Result<PathBuf, Error> {
    check_columns::<T>()?;
    let file = std::fs::File::create(path).map_err(|source| Error::Create {
        path: path.to_owned(),
        source,
    })?;
    debug!(path = %path.display(), "created report file");
    write(io::BufWriter::new(file), rows)?;
    info!(
        path = %path.display(),
        records = rows.len(),
        columns = COLUMNS.len(),
        "exported report"
    );
    Ok(path.to_owned())
}
