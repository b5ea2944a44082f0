// Integration tests for manifest export and import
// Tests export shape, round trip into a second store, and rejection of bad input

use anyhow::Result;
use mcpdeck::manifest::{export_filename, import_into, parse_import, read_import, ManifestError};
use mcpdeck::store::Store;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

fn store(seed: u64) -> Store {
    Store::seeded_with_rng(StdRng::seed_from_u64(seed))
}

#[test]
fn test_export_contains_only_installed_servers_and_overrides() -> Result<()> {
    let store = store(1);
    let json: Value = serde_json::from_str(&store.manifest().to_pretty_json()?)?;

    let servers = json["mcpServers"].as_object().expect("mcpServers object");
    let ids: Vec<&str> = servers.keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["google-search-mcp", "postgres-inspector"]);
    assert_eq!(servers["google-search-mcp"]["command"], "npx");
    assert_eq!(json["overrides"]["OVERRIDE_MODE"], "true");
    Ok(())
}

#[test]
fn test_export_file_round_trips_into_another_project() -> Result<()> {
    let temp = TempDir::new()?;
    let source = store(2);
    let path = temp.path().join(export_filename(&source.active_project().name));
    assert!(path.ends_with("mcp-config-main-workspace.json"));
    source.manifest().write(&path)?;

    let parsed = read_import(&path)?;
    assert_eq!(parsed, source.manifest().mcp_servers);

    let mut target = store(3);
    target.select_project("proj-web-dev")?;
    let report = import_into(&mut target, &fs::read_to_string(&path)?)?;
    assert_eq!(report.updated, vec!["google-search-mcp", "postgres-inspector"]);
    assert_eq!(report.installed, vec!["postgres-inspector"]);
    assert!(report.unknown.is_empty());

    let active = target.active_project();
    assert!(active.is_installed("github-mcp"));
    assert!(active.is_installed("postgres-inspector"));
    assert_eq!(
        target.notice().map(|n| n.message.as_str()),
        Some("Imported 2 server configuration(s).")
    );
    Ok(())
}

#[test]
fn test_import_reports_servers_outside_the_catalog() -> Result<()> {
    let mut target = store(4);
    let text = r#"{ "mcpServers": {
        "github-mcp": { "command": "gh-mcp", "args": ["--stdio"] },
        "mystery-mcp": { "command": "mystery" }
    } }"#;
    let report = import_into(&mut target, text)?;
    assert_eq!(report.updated, vec!["github-mcp"]);
    assert_eq!(report.unknown, vec!["mystery-mcp"]);
    assert_eq!(target.server("github-mcp").map(|s| s.config.command.as_str()), Some("gh-mcp"));
    assert!(target.server("mystery-mcp").is_none());
    Ok(())
}

#[test]
fn test_malformed_imports_leave_the_store_untouched() -> Result<()> {
    let mut target = store(5);
    let before = target.manifest();

    assert!(matches!(parse_import("[1, 2]"), Err(ManifestError::NotAnObject)));
    assert!(matches!(parse_import("{}"), Err(ManifestError::MissingServers)));
    assert!(matches!(parse_import("{ not json"), Err(ManifestError::Json(_))));
    let bad_entry = r#"{ "mcpServers": { "github-mcp": { "args": [] } } }"#;
    assert!(matches!(
        import_into(&mut target, bad_entry),
        Err(ManifestError::Entry { ref id, .. }) if id == "github-mcp"
    ));

    assert_eq!(target.manifest(), before);
    assert!(target.notice().is_none());
    Ok(())
}
