//! Flattening of paginated search results into a CSV export.
//!
//! - [`row`] - the fixed 9-column projection of a ticket
//! - [`pipeline`] - the cursor-following loop that accumulates rows
//! - [`sink`] - where a finished table goes
//! - [`cancel`] - interruption between pages, or of the request in flight

pub mod cancel;
pub mod pipeline;
pub mod row;
pub mod sink;

pub use cancel::{cancel_on_ctrl_c, CancelFlag};
pub use pipeline::{ExportOutcome, ExportPipeline, PageSource, StopReason};
pub use row::{ExportRow, ExportTable, FieldMapping, DEFAULT_FIELD_POSITIONS, EXPORT_HEADER};
pub use sink::{write_csv, CsvSink, RowSink};
