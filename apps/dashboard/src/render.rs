//! Plain-text table rendering of a controller snapshot.

use std::fmt::Write as _;

use client_core::{ControllerSnapshot, EditDraft, SortDirection, TemperatureInput};
use shared::domain::{FieldKey, RecordField, SensorRecord};

fn cell(record: &SensorRecord, field: RecordField, draft: Option<&EditDraft>) -> String {
    if let Some(draft) = draft.filter(|draft| draft.id() == &record.id) {
        match field {
            RecordField::Id => return format!("*{}", record.id),
            RecordField::Temperature => {
                return match draft.temperature() {
                    TemperatureInput::Value(Some(value)) => value.to_string(),
                    TemperatureInput::Value(None) => String::new(),
                    TemperatureInput::Invalid(raw) => format!("{raw} (!)"),
                }
            }
            _ => return draft.text(field).unwrap_or_default().to_string(),
        }
    }
    record.column(field).to_string()
}

fn header(field: RecordField, snapshot: &ControllerSnapshot) -> String {
    match &snapshot.view.sort {
        Some(spec) if spec.key == FieldKey::Column(field) => {
            let arrow = match spec.direction {
                SortDirection::Ascending => '^',
                SortDirection::Descending => 'v',
            };
            format!("{} {arrow}", field.label())
        }
        _ => field.label().to_string(),
    }
}

/// Renders the visible page. The row being edited shows draft values and a `*` marker.
pub fn render_table(snapshot: &ControllerSnapshot) -> String {
    let page = snapshot.page();
    let draft = snapshot.draft.as_ref();

    let headers: Vec<String> = RecordField::ALL
        .iter()
        .map(|field| header(*field, snapshot))
        .collect();
    let rows: Vec<Vec<String>> = page
        .items
        .iter()
        .map(|record| {
            RecordField::ALL
                .iter()
                .map(|field| cell(record, *field, draft))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, title)| {
            rows.iter()
                .map(|row| row[idx].chars().count())
                .chain(std::iter::once(title.chars().count()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let mut out = String::new();
    let line = |out: &mut String, cells: &[String]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(value, width)| format!("{value:<width$}", width = *width))
            .collect();
        let _ = writeln!(out, "{}", padded.join(" | ").trim_end());
    };

    line(&mut out, &headers);
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));
    for row in &rows {
        line(&mut out, row);
    }

    if page.items.is_empty() {
        let _ = writeln!(out, "(no records)");
    }
    let _ = write!(
        out,
        "page {}/{} - {} of {} records",
        page.page,
        page.page_count.max(1),
        page.total,
        snapshot.records.len()
    );
    if !snapshot.view.search.is_empty() {
        let _ = write!(out, " matching \"{}\"", snapshot.view.search);
    }
    out.push('\n');
    out
}
