use serde::Serialize;

use gls_engine::{OutputEntry, SelectionOutcome};

use crate::cli::OutputFormat;

pub mod table;

/// Render a serializable response as JSON.
///
/// `Raw` is a single line. Values without a table view of their own (see
/// [`outcome_table`]) render as pretty JSON under `Table`.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json | OutputFormat::Table => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

/// The finalized sequence as one row per entry, variants after primaries.
#[must_use]
pub fn outcome_table(outcome: &SelectionOutcome) -> String {
    let headers = ["label", "name", "group", "level", "parent", "records"];
    let rows = outcome
        .entries
        .iter()
        .chain(&outcome.variant_entries)
        .map(entry_row)
        .collect::<Vec<_>>();
    if rows.is_empty() {
        return String::from("(no entries selected)");
    }
    table::render_entity_table(&headers, &rows, table::TableOptions::from_env())
}

fn entry_row(entry: &OutputEntry) -> Vec<String> {
    let name = entry
        .display_override
        .as_deref()
        .or_else(|| entry.fields.get("name").map(String::as_str))
        .unwrap_or(entry.label.as_str());
    vec![
        entry.label.clone(),
        name.to_string(),
        entry.group.clone().unwrap_or_else(|| String::from("-")),
        entry.level.to_string(),
        entry.parent.clone().unwrap_or_else(|| String::from("-")),
        entry.usage_record_count.to_string(),
    ]
}
