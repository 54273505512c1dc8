use anyhow::Context;
use loadcomb_core::factors::{preset, presets};

use crate::output::{print_json, print_table};

pub fn list(json: bool) -> anyhow::Result<()> {
    let profiles = presets().context("failed to load built-in profiles")?;

    if json {
        let names: Vec<_> = profiles
            .iter()
            .map(|p| serde_json::json!({ "name": p.name, "identifier": p.identifier() }))
            .collect();
        return print_json(&names);
    }

    let rows = profiles
        .iter()
        .map(|p| vec![p.name.clone(), p.identifier()])
        .collect();
    print_table(&["Name", "Profile"], rows);
    Ok(())
}

pub fn show(name: &str) -> anyhow::Result<()> {
    let profile = preset(name).context("failed to select profile")?;
    print_json(profile)
}
