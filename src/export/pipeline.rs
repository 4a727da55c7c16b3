//! Cursor-driven export of search results.
//!
//! The pipeline asks a [`PageSource`] for the first page of a query, then
//! keeps following the server's `next_page` cursor until it is empty,
//! projecting every ticket into the [`ExportTable`] as it goes. The table is
//! handed to the [`RowSink`] exactly once, after the last page; every other
//! way out of the loop discards it.
//!
//! ```text
//! FETCHING ──► ACCUMULATING ──► FETCHING ... ──► DONE (flush)
//!     │              │
//!     │              └─► ABORTED (malformed record)
//!     ├─► ABORTED   (transport fault)
//!     ├─► STOPPED   (rejection or no `results`)
//!     └─► CANCELLED (operator interrupt, checked before each fetch)
//! ```

use reqwest::StatusCode;

use crate::error::ZenexError;
use crate::export::cancel::CancelFlag;
use crate::export::row::{ExportRow, ExportTable, FieldMapping};
use crate::export::sink::RowSink;
use crate::models::{Payload, Ticket};

/// Something that can fetch one page of export results.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    /// Fetches the first page of `query`, or the page at `cursor` when set.
    async fn fetch_page(&self, query: &str, cursor: Option<&str>) -> Result<Payload, ZenexError>;
}

/// Why an export stopped without writing anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The API rejected a page request.
    Rejected {
        /// Status code returned.
        status: StatusCode,
        /// Response body.
        body: String,
    },
    /// A page came back without a `results` array.
    MissingResults,
}

/// How an export run ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Pagination was exhausted and the table was flushed.
    Completed {
        /// Pages fetched.
        pages: usize,
        /// Rows written.
        rows: usize,
    },
    /// The loop hit a response it cannot continue from. Nothing was written.
    Stopped {
        /// Pages fetched, including the one that stopped the run.
        pages: usize,
        /// Rows accumulated and then discarded.
        discarded_rows: usize,
        /// What the last response looked like.
        reason: StopReason,
    },
    /// An operator interrupt was noticed between pages. Nothing was written.
    Cancelled {
        /// Pages fetched before the interrupt.
        pages: usize,
        /// Rows accumulated and then discarded.
        discarded_rows: usize,
    },
}

/// Runs one export from a query to a sink.
pub struct ExportPipeline<'a, S, K> {
    source: &'a S,
    sink: &'a mut K,
    mapping: FieldMapping,
    cancel: CancelFlag,
}

impl<'a, S: PageSource, K: RowSink> ExportPipeline<'a, S, K> {
    /// Creates a pipeline with the positional field mapping and no
    /// cancellation source.
    pub fn new(source: &'a S, sink: &'a mut K) -> Self {
        Self {
            source,
            sink,
            mapping: FieldMapping::default(),
            cancel: CancelFlag::new(),
        }
    }

    /// Sets how custom field columns are resolved.
    pub fn with_field_mapping(mut self, mapping: FieldMapping) -> Self {
        self.mapping = mapping;
        self
    }

    /// Sets the flag checked before each page fetch.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Exports every ticket matching `query`.
    ///
    /// # Errors
    ///
    /// Transport faults, malformed records, rejected cursors and sink
    /// failures are returned as errors; the sink is not written in any of
    /// these cases except a failing flush itself.
    pub async fn run(mut self, query: &str) -> Result<ExportOutcome, ZenexError> {
        if let FieldMapping::Keyed(ids) = self.mapping {
            tracing::warn!(
                field_ids = ?ids,
                "Custom field columns resolved by field id instead of position"
            );
        }

        let mut table = ExportTable::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            if self.cancel.is_cancelled() {
                tracing::info!(
                    pages,
                    discarded_rows = table.len(),
                    "Export manually stopped, nothing written"
                );
                return Ok(ExportOutcome::Cancelled {
                    pages,
                    discarded_rows: table.len(),
                });
            }

            let page = match self.source.fetch_page(query, cursor.as_deref()).await {
                Ok(page) => page,
                Err(ZenexError::HttpStatus { status, reason, body }) => {
                    pages += 1;
                    tracing::error!(
                        %status,
                        reason = %reason,
                        body = %body,
                        pages,
                        discarded_rows = table.len(),
                        cursor = cursor.as_deref().unwrap_or(""),
                        "Export stopped on rejected page, nothing written"
                    );
                    return Ok(ExportOutcome::Stopped {
                        pages,
                        discarded_rows: table.len(),
                        reason: StopReason::Rejected { status, body },
                    });
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        pages,
                        discarded_rows = table.len(),
                        cursor = cursor.as_deref().unwrap_or(""),
                        "Export aborted, nothing written"
                    );
                    return Err(e);
                }
            };
            pages += 1;

            let Some(results) = page.results() else {
                tracing::warn!(
                    pages,
                    discarded_rows = table.len(),
                    cursor = cursor.as_deref().unwrap_or(""),
                    response = %page.summary(),
                    "Page has no results, export stopped and nothing written"
                );
                return Ok(ExportOutcome::Stopped {
                    pages,
                    discarded_rows: table.len(),
                    reason: StopReason::MissingResults,
                });
            };

            for record in results {
                let ticket = Ticket::from_value(record).map_err(|e| {
                    tracing::error!(error = %e, pages, "Malformed ticket record, export aborted");
                    ZenexError::Serialization(e)
                })?;
                table.push(ExportRow::from_ticket(&ticket, &self.mapping));
            }

            tracing::debug!(
                pages,
                page_rows = results.len(),
                total_rows = table.len(),
                "Page accumulated"
            );

            match page.next_page() {
                Some(next) => cursor = Some(next.to_string()),
                None => break,
            }
        }

        self.sink.flush(&table)?;
        tracing::info!(pages, rows = table.len(), "Export complete");

        Ok(ExportOutcome::Completed {
            pages,
            rows: table.len(),
        })
    }
}
