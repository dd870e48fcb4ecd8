use crate::output::{print_json, print_table, yes_no};
use anyhow::Context;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use xcheck_core::{ActionClient, ActionRequest};

#[derive(Debug, Deserialize)]
struct BatchItem {
    key: String,
    #[serde(flatten)]
    action: ActionRequest,
}

fn read_items(file: &Path) -> anyhow::Result<Vec<(String, ActionRequest)>> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    let items: Vec<BatchItem> = serde_json::from_str(&raw)
        .with_context(|| format!("invalid batch file {}", file.display()))?;

    {
        let mut seen = HashSet::new();
        for item in &items {
            if !seen.insert(item.key.as_str()) {
                anyhow::bail!("duplicate key '{}' in {}", item.key, file.display());
            }
        }
    }
    Ok(items.into_iter().map(|i| (i.key, i.action)).collect())
}

/// Run every item in file order. Per-item API failures are reported in the
/// output; only an unreadable or malformed file fails the command.
pub fn run(client: &ActionClient, file: &Path, json: bool) -> anyhow::Result<()> {
    let items = read_items(file)?;
    let outcomes = client.check_multiple(items);

    if json {
        return print_json(&outcomes);
    }

    if outcomes.is_empty() {
        println!("No actions in {}.", file.display());
        return Ok(());
    }

    let rows = outcomes
        .iter()
        .map(|o| {
            let result = match o.error() {
                Some(e) => format!("{}: {e}", e.kind().as_str()),
                None => "ok".to_string(),
            };
            vec![
                o.key.clone(),
                o.kind.to_string(),
                yes_no(o.completed).to_string(),
                result,
            ]
        })
        .collect();
    print_table(&["KEY", "KIND", "COMPLETED", "RESULT"], rows);
    Ok(())
}
