use crate::output::{print_json, print_table, yes_no};
use anyhow::Context;
use std::path::Path;
use xcheck_core::{
    ActionClient, ActionRequest, ActionStore, RedbActionStore, Reconciler, SqliteActionStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    Redb,
    Sqlite,
}

fn open_store(backend: Backend, db: &Path) -> anyhow::Result<Box<dyn ActionStore>> {
    let store: Box<dyn ActionStore> = match backend {
        Backend::Redb => Box::new(RedbActionStore::open(db)?),
        Backend::Sqlite => Box::new(SqliteActionStore::open(db)?),
    };
    Ok(store)
}

pub fn run(
    client: &ActionClient,
    backend: Backend,
    db: &Path,
    user: &str,
    campaign: &str,
    file: &Path,
    json: bool,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    let required: Vec<ActionRequest> = serde_json::from_str(&raw)
        .with_context(|| format!("invalid action list {}", file.display()))?;

    let store = open_store(backend, db)
        .with_context(|| format!("failed to open store at {}", db.display()))?;
    let outcomes =
        Reconciler::new(client, store.as_ref()).reconcile_actions(user, campaign, &required);

    if json {
        return print_json(&outcomes);
    }

    let rows = outcomes
        .values()
        .map(|o| {
            let result = match (o.error(), &o.store_error) {
                (Some(e), _) => format!("{}: {e}", e.kind().as_str()),
                (None, Some(e)) => format!("not recorded: {e}"),
                (None, None) => "recorded".to_string(),
            };
            vec![o.kind.to_string(), yes_no(o.completed).to_string(), result]
        })
        .collect();
    print_table(&["KIND", "COMPLETED", "RESULT"], rows);
    Ok(())
}

pub fn records(
    backend: Backend,
    db: &Path,
    user: &str,
    campaign: &str,
    json: bool,
) -> anyhow::Result<()> {
    let store = open_store(backend, db)
        .with_context(|| format!("failed to open store at {}", db.display()))?;
    let records = store.list(user, campaign)?;

    if json {
        return print_json(&records);
    }

    if records.is_empty() {
        println!("No records for user {user} in campaign {campaign}.");
        return Ok(());
    }

    let rows = records
        .iter()
        .map(|r| {
            vec![
                r.action_type.to_string(),
                yes_no(Some(r.completed)).to_string(),
                r.checked_at.to_rfc3339(),
            ]
        })
        .collect();
    print_table(&["KIND", "COMPLETED", "CHECKED AT"], rows);
    Ok(())
}
