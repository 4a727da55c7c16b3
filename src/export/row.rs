//! Projection of tickets into fixed-schema export rows.

use serde_json::Value;

use crate::models::Ticket;

/// Column names of the export, in order.
pub const EXPORT_HEADER: [&str; 9] = [
    "created_date",
    "ticket_id",
    "source",
    "custom_field_1",
    "custom_field_2",
    "subject",
    "description",
    "custom_field_3",
    "status",
];

/// Default `fields` indices for the three custom field columns.
pub const DEFAULT_FIELD_POSITIONS: [usize; 3] = [2, 3, 0];

/// How the three custom field columns are picked out of a ticket's `fields`.
///
/// `Positional` indexes into `fields` and depends on the account keeping its
/// field order stable. `Keyed` looks fields up by id and survives reordering,
/// but changes the export's output whenever ids and positions disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMapping {
    /// Indices into `fields`, one per custom field column.
    Positional([usize; 3]),
    /// Ticket field ids, one per custom field column.
    Keyed([u64; 3]),
}

impl Default for FieldMapping {
    fn default() -> Self {
        FieldMapping::Positional(DEFAULT_FIELD_POSITIONS)
    }
}

impl FieldMapping {
    /// Resolves custom field column `slot` (0..3) for `ticket`.
    fn resolve<'t>(&self, ticket: &'t Ticket, slot: usize) -> Option<&'t Value> {
        match self {
            FieldMapping::Positional(positions) => ticket.field_at(positions[slot]),
            FieldMapping::Keyed(ids) => ticket.field_by_id(ids[slot]),
        }
    }

    fn cell(&self, ticket: &Ticket, slot: usize) -> String {
        self.resolve(ticket, slot).map(render_value).unwrap_or_default()
    }
}

/// Renders a custom field value as a cell: strings verbatim, `null` empty,
/// anything else as JSON text.
fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One flattened ticket.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExportRow {
    /// `YYYY-MM-DD` of `created_at`.
    pub created_date: String,
    /// Ticket id.
    pub ticket_id: String,
    /// `via.source.from.name`.
    pub source: String,
    /// First custom field column.
    pub custom_field_1: String,
    /// Second custom field column.
    pub custom_field_2: String,
    /// Ticket subject.
    pub subject: String,
    /// Ticket description.
    pub description: String,
    /// Third custom field column.
    pub custom_field_3: String,
    /// Ticket status.
    pub status: String,
}

impl ExportRow {
    /// Projects `ticket` into a row.
    pub fn from_ticket(ticket: &Ticket, mapping: &FieldMapping) -> Self {
        ExportRow {
            created_date: ticket.created_date(),
            ticket_id: ticket.id.clone(),
            source: ticket.source_name().to_string(),
            custom_field_1: mapping.cell(ticket, 0),
            custom_field_2: mapping.cell(ticket, 1),
            subject: ticket.subject.clone().unwrap_or_default(),
            description: ticket.description.clone().unwrap_or_default(),
            custom_field_3: mapping.cell(ticket, 2),
            status: ticket.status.clone().unwrap_or_default(),
        }
    }

    /// Cells in `EXPORT_HEADER` order.
    pub fn to_record(&self) -> [&str; 9] {
        [
            &self.created_date,
            &self.ticket_id,
            &self.source,
            &self.custom_field_1,
            &self.custom_field_2,
            &self.subject,
            &self.description,
            &self.custom_field_3,
            &self.status,
        ]
    }
}

/// Rows accumulated over a whole export run, in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportTable {
    rows: Vec<ExportRow>,
}

impl ExportTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row at the end.
    pub fn push(&mut self, row: ExportRow) {
        self.rows.push(row);
    }

    /// Rows in insertion order.
    pub fn rows(&self) -> &[ExportRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no rows were added.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fixture_ticket() -> Ticket {
        Ticket::from_value(&json!({
            "id": "5",
            "created_at": "2024-01-02T10:00:00Z",
            "subject": "S",
            "description": "D",
            "status": "open",
            "via": {"source": {"from": {"name": "web"}}},
            "fields": [
                {"id": 100, "value": "L"},
                {"id": 200, "value": "C"},
                {"id": 300, "value": "X"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_positional_projection() {
        let row = ExportRow::from_ticket(&fixture_ticket(), &FieldMapping::default());
        assert_eq!(
            row.to_record(),
            ["2024-01-02", "5", "web", "X", "", "S", "D", "L", "open"]
        );
    }

    #[test]
    fn test_keyed_projection() {
        let mapping = FieldMapping::Keyed([200, 300, 100]);
        let row = ExportRow::from_ticket(&fixture_ticket(), &mapping);
        assert_eq!(row.custom_field_1, "C");
        assert_eq!(row.custom_field_2, "X");
        assert_eq!(row.custom_field_3, "L");
    }

    #[test]
    fn test_keyed_projection_unknown_id_is_empty() {
        let mapping = FieldMapping::Keyed([999, 300, 100]);
        let row = ExportRow::from_ticket(&fixture_ticket(), &mapping);
        assert_eq!(row.custom_field_1, "");
    }

    #[test]
    fn test_non_string_values_render_as_json() {
        let ticket = Ticket::from_value(&json!({
            "id": 9,
            "fields": [
                {"id": 1, "value": null},
                {"id": 2, "value": true},
                {"id": 3, "value": 12.5},
                {"id": 4, "value": ["a", "b"]}
            ]
        }))
        .unwrap();
        let row = ExportRow::from_ticket(&ticket, &FieldMapping::Positional([1, 2, 3]));
        assert_eq!(row.custom_field_1, "true");
        assert_eq!(row.custom_field_2, "12.5");
        assert_eq!(row.custom_field_3, r#"["a","b"]"#);

        let row = ExportRow::from_ticket(&ticket, &FieldMapping::Positional([0, 0, 0]));
        assert_eq!(row.custom_field_1, "");
    }

    #[test]
    fn test_table_keeps_insertion_order() {
        let mut table = ExportTable::new();
        assert!(table.is_empty());
        for id in ["3", "1", "2"] {
            table.push(ExportRow {
                ticket_id: id.to_string(),
                ..ExportRow::default()
            });
        }
        let ids: Vec<&str> = table.rows().iter().map(|r| r.ticket_id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
        assert_eq!(table.len(), 3);
    }
}
