//! CSV and JSON export of mapping results.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::mapping::{Assignment, MappingObserver};
use crate::report::MappingSummary;

/// Column header for assignment CSV export.
pub const HEADER: &str = "point,series,equipment,kind,variable,value,limit_exempt";

/// Streams assignments as CSV rows while a run is in progress.
///
/// Values use the shortest representation that reads back to the same
/// `f64`.
///
/// Observer callbacks cannot fail, so the first write error is kept and
/// returned by [`CsvObserver::finish`]; later rows are dropped.
pub struct CsvObserver<W: Write> {
    wtr: csv::Writer<W>,
    rows: usize,
    error: Option<csv::Error>,
}

impl CsvObserver<BufWriter<File>> {
    /// Creates an observer writing to a new file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or the header written.
    pub fn create(path: &Path) -> csv::Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> CsvObserver<W> {
    /// Creates an observer writing to `writer` and emits the header row.
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be written.
    pub fn new(writer: W) -> csv::Result<Self> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        wtr.write_record(HEADER.split(','))?;
        Ok(Self {
            wtr,
            rows: 0,
            error: None,
        })
    }

    /// Number of data rows written.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flushes and returns the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns the first error met while writing rows, or a flush error.
    pub fn finish(mut self) -> csv::Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.wtr.flush()?;
        self.wtr
            .into_inner()
            .map_err(|e| csv::Error::from(io::Error::other(e.to_string())))
    }
}

impl<W: Write> MappingObserver for CsvObserver<W> {
    fn on_assignment(&mut self, a: &Assignment<'_>) {
        if self.error.is_some() {
            return;
        }
        match self.wtr.serialize(a.to_record()) {
            Ok(()) => self.rows += 1,
            Err(e) => self.error = Some(e),
        }
    }
}

/// Writes a run summary as pretty-printed JSON to `path`.
///
/// # Errors
///
/// Returns an `io::Error` if the file cannot be written.
pub fn write_summary_json(summary: &MappingSummary, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writer.flush()
}
