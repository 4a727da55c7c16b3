//! Output sinks for completed exports.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::ZenexError;
use crate::export::row::{ExportTable, EXPORT_HEADER};

/// Destination for a finished export table.
///
/// `flush` is called at most once per run, and only with a complete table.
pub trait RowSink {
    /// Persists every row of `table` in order.
    fn flush(&mut self, table: &ExportTable) -> Result<(), ZenexError>;
}

/// Writes the header and every row of `table` as CSV to `output`.
pub fn write_csv<W: Write>(table: &ExportTable, output: W) -> Result<(), ZenexError> {
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(EXPORT_HEADER)?;
    for row in table.rows() {
        writer.write_record(row.to_record())?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes a file through `write` and moves it to `path` only if every byte
/// made it out. On failure the target is left as it was.
fn write_atomically<F>(path: &Path, write: F) -> Result<(), ZenexError>
where
    F: FnOnce(&mut fs::File) -> Result<(), ZenexError>,
{
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent)?;
            parent
        }
        None => Path::new("."),
    };

    // same directory as the target so the final rename stays on one filesystem
    let mut staged = NamedTempFile::new_in(dir)?;
    write(staged.as_file_mut())?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|e| ZenexError::Io(e.error))?;
    Ok(())
}

/// CSV file sink. The file is created on flush, never before, and replaces
/// the target in one step.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    /// Creates a sink that will write to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Target file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RowSink for CsvSink {
    fn flush(&mut self, table: &ExportTable) -> Result<(), ZenexError> {
        write_atomically(&self.path, |file| write_csv(table, file))?;

        tracing::info!(
            path = %self.path.display(),
            rows = table.len(),
            "Export written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::row::ExportRow;
    use pretty_assertions::assert_eq;

    fn row(id: &str, subject: &str) -> ExportRow {
        ExportRow {
            created_date: "2024-01-02".to_string(),
            ticket_id: id.to_string(),
            subject: subject.to_string(),
            status: "open".to_string(),
            ..ExportRow::default()
        }
    }

    #[test]
    fn test_write_csv_header_once_and_quotes() {
        let mut table = ExportTable::new();
        table.push(row("1", "plain"));
        table.push(row("2", "needs, \"quoting\""));

        let mut out = Vec::new();
        write_csv(&table, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "created_date,ticket_id,source,custom_field_1,custom_field_2,subject,description,custom_field_3,status\n\
             2024-01-02,1,,,,plain,,,open\n\
             2024-01-02,2,,,,\"needs, \"\"quoting\"\"\",,,open\n"
        );
    }

    #[test]
    fn test_empty_table_writes_header_only() {
        let mut out = Vec::new();
        write_csv(&ExportTable::new(), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_csv_sink_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("downloads").join("export.csv");
        let mut table = ExportTable::new();
        table.push(row("1", "Ünïcödé"));

        let mut sink = CsvSink::new(&path);
        sink.flush(&table).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("Ünïcödé"));
    }

    #[test]
    fn test_csv_sink_replaces_previous_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        fs::write(&path, "stale\n").unwrap();
        let mut table = ExportTable::new();
        table.push(row("9", "fresh"));

        CsvSink::new(&path).flush(&table).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(!text.contains("stale"));
        assert!(text.contains("fresh"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_write_leaves_existing_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        fs::write(&path, "previous complete export\n").unwrap();

        let err = write_atomically(&path, |file| {
            file.write_all(b"created_date,ticket_id\n2024-01-02,")?;
            Err(ZenexError::Io(std::io::Error::new(
                std::io::ErrorKind::StorageFull,
                "no space left on device",
            )))
        })
        .unwrap_err();

        assert!(matches!(err, ZenexError::Io(_)));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "previous complete export\n"
        );
        // the staged file is removed with the error
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_write_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");

        let result = write_atomically(&path, |_| {
            Err(ZenexError::Io(std::io::Error::other("broken pipe")))
        });

        assert!(result.is_err());
        assert!(!path.exists());
    }
}
