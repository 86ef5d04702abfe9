use std::io::Write;

use serde::Serialize;

use super::domain::JobApplicationRow;

#[derive(Serialize)]
struct ExportRecord<'a> {
    id: &'a str,
    name: &'a str,
    email: &'a str,
    position: &'a str,
    status: &'a str,
    applied_at: String,
}

/// Write the given rows (typically the current table selection) as CSV with a
/// header row. Missing dates are written as empty cells.
pub fn export_csv<W: Write>(writer: W, rows: &[JobApplicationRow]) -> Result<usize, csv::Error> {
    let mut csv = csv::Writer::from_writer(writer);

    for row in rows {
        csv.serialize(ExportRecord {
            id: row.id.as_str(),
            name: &row.name,
            email: &row.email,
            position: &row.position,
            status: &row.status,
            applied_at: row
                .applied_at
                .map(|date| date.to_rfc3339())
                .unwrap_or_default(),
        })?;
    }

    csv.flush()?;
    Ok(rows.len())
}
