use crate::output::{print_fields, print_json, yes_no};
use anyhow::Context;
use xcheck_core::{ActionClient, ActionRequest};

pub fn health(client: &ActionClient, json: bool) -> anyhow::Result<()> {
    let result = client
        .health()
        .with_context(|| format!("health check against {} failed", client.base_url()))?;

    if json {
        return print_json(&result);
    }
    print_fields(&result);
    Ok(())
}

pub fn stats(client: &ActionClient, json: bool) -> anyhow::Result<()> {
    let result = client.stats().context("failed to fetch API statistics")?;

    if json {
        return print_json(&result);
    }
    print_fields(&result);
    Ok(())
}

pub fn action(client: &ActionClient, request: &ActionRequest, json: bool) -> anyhow::Result<()> {
    let kind = request.kind();
    let result = client
        .execute(request)
        .with_context(|| format!("{kind} check failed"))?;

    if json {
        return print_json(&result);
    }

    println!(
        "{}: {}",
        kind.completion_field(),
        yes_no(kind.completion_from(&result))
    );
    println!();
    print_fields(&result);
    Ok(())
}
