//! `promptward policies`: Show the active policy table.

use super::{CliResult, load_config};
use promptward_core::SectionId;
use promptward_engine::PolicyTable;
use std::collections::BTreeSet;
use std::path::Path;

pub fn run(config: Option<&Path>) -> CliResult {
    let config = load_config(config)?;
    let table = promptward_server::policy_table(&config)?;
    print!("{}", render(&table));
    Ok(())
}

pub fn render(table: &PolicyTable) -> String {
    let mut out = format!("Policy table v{}\n", table.version());
    for policy in table.policies() {
        out.push_str(&format!(
            "\n{} (budget {} tokens, required-empty: {:?})\n",
            policy.purpose, policy.token_budget, policy.required_empty
        ));
        out.push_str(&format!("  required: {}\n", join(&policy.required)));
        out.push_str(&format!("  optional: {}\n", join(&policy.optional)));
        out.push_str(&format!("  banned:   {}\n", join(&policy.banned)));
        let tools: Vec<&str> = policy.allowed_tools.iter().map(String::as_str).collect();
        out.push_str(&format!(
            "  tools:    {}\n",
            if tools.is_empty() { "-".to_string() } else { tools.join(", ") }
        ));
    }
    out
}

fn join(ids: &BTreeSet<SectionId>) -> String {
    if ids.is_empty() {
        return "-".into();
    }
    ids.iter().map(SectionId::as_str).collect::<Vec<_>>().join(", ")
}
