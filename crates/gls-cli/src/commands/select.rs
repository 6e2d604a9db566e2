use std::fs;
use std::path::Path;

use anyhow::Context;
use gls_config::GlsConfig;
use gls_core::entities::PriorSelection;
use gls_core::events::{InputBatch, InputEvent};
use gls_engine::Engine;

use crate::cli::{GlobalFlags, OutputFormat, SelectArgs};
use crate::output;

/// Handle `gls select`.
pub fn handle(args: &SelectArgs, flags: &GlobalFlags, config: GlsConfig) -> anyhow::Result<()> {
    let batch = read_events(&args.input)?;
    let prior = match &args.prior {
        Some(path) => read_prior(path)?,
        None => PriorSelection::default(),
    };

    let mut engine = Engine::new(config);
    let outcome = engine
        .run_batch(batch, &prior)
        .with_context(|| format!("selection failed for {}", args.input.display()))?;

    if let Some(path) = &args.prior
        && !args.no_save_prior
    {
        write_prior(path, &outcome.prior)?;
    }

    if !flags.quiet {
        for diagnostic in &outcome.diagnostics {
            eprintln!("warning: {diagnostic}");
        }
    }

    match flags.format {
        OutputFormat::Table => {
            println!("{}", output::outcome_table(&outcome));
            Ok(())
        }
        format => output::output(&outcome, format),
    }
}

/// Parse a JSONL event stream into a batch.
fn read_events(path: &Path) -> anyhow::Result<InputBatch> {
    let events = serde_jsonlines::json_lines::<InputEvent, _>(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("failed to parse events in {}", path.display()))?;
    tracing::debug!(events = events.len(), path = %path.display(), "read input events");
    Ok(InputBatch::from_events(events))
}

/// A missing prior file reads as an empty prior selection.
fn read_prior(path: &Path) -> anyhow::Result<PriorSelection> {
    if !path.exists() {
        return Ok(PriorSelection::default());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read prior selection {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse prior selection {}", path.display()))
}

fn write_prior(path: &Path, prior: &PriorSelection) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(prior)?;
    fs::write(path, rendered)
        .with_context(|| format!("failed to write prior selection {}", path.display()))
}

#[cfg(test)]
mod tests {
    use gls_engine::SelectionOutcome;
    use pretty_assertions::assert_eq;

    use super::*;

    fn selected_labels(outcome: &SelectionOutcome) -> Vec<String> {
        outcome
            .entries
            .iter()
            .chain(&outcome.variant_entries)
            .map(|entry| entry.label.clone())
            .collect()
    }

    const EVENTS: &str = r#"{"kind":"entry","label":"duck","fields":{"name":"duck"},"see":["bird"]}
{"kind":"entry","label":"bird","fields":{"name":"bird"}}
{"kind":"entry","label":"idle","fields":{"name":"idle"}}
{"kind":"record","label":"duck","location":"1"}
"#;

    #[test]
    fn reads_events_and_runs_the_engine() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("events.jsonl");
        fs::write(&input, EVENTS).expect("write events");

        let batch = read_events(&input).expect("events parse");
        assert_eq!(batch.entries.len(), 3);
        assert_eq!(batch.records.len(), 1);

        let outcome = Engine::new(GlsConfig::default())
            .run_batch(batch, &PriorSelection::default())
            .expect("run succeeds");
        assert_eq!(selected_labels(&outcome), vec!["bird".to_string(), "duck".to_string()]);
    }

    #[test]
    fn prior_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("prior.json");
        assert_eq!(read_prior(&path).expect("missing reads empty"), PriorSelection::default());

        let mut prior = PriorSelection::default();
        prior.absorb(["duck"], ["bird"]);
        write_prior(&path, &prior).expect("write");
        assert_eq!(read_prior(&path).expect("read back"), prior);
    }

    #[test]
    fn malformed_line_reports_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("broken.jsonl");
        fs::write(&input, "{\"kind\":\"nope\"}\n").expect("write");
        let error = read_events(&input).expect_err("should fail");
        assert!(format!("{error:#}").contains("broken.jsonl"));
    }
}
