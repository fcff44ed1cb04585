use crate::output::traits::{LinkRecord, LinkSink, SinkResult};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Header row written to a new or empty CSV file
pub const CSV_HEADERS: [&str; 3] = ["Current Page URL", "Linked URL", "Status Code"];

/// Appends link records to a CSV file
///
/// The file is opened in append mode so successive runs accumulate rows; the
/// header is only written when the file is empty. Every row is flushed as soon
/// as it is written.
pub struct CsvSink {
    path: PathBuf,
    writer: Mutex<csv::Writer<File>>,
}

impl CsvSink {
    /// Opens (or creates) the CSV file at `path`
    ///
    /// # Returns
    ///
    /// * `Ok(CsvSink)` - File is open and has a header row
    /// * `Err(SinkError)` - File could not be opened or the header not written
    pub fn open(path: impl AsRef<Path>) -> SinkResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let is_empty = file.metadata()?.len() == 0;

        let mut writer = csv::Writer::from_writer(file);
        if is_empty {
            writer.write_record(CSV_HEADERS)?;
            writer.flush()?;
            tracing::debug!("Wrote CSV header to {}", path.display());
        }

        Ok(Self {
            path,
            writer: Mutex::new(writer),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LinkSink for CsvSink {
    fn append(&self, record: &LinkRecord) -> SinkResult<()> {
        let status = record.status_code.to_string();
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_record([
            record.source_page.as_str(),
            record.target_link.as_str(),
            status.as_str(),
        ])?;
        writer.flush()?;
        Ok(())
    }
}
