// Shell module
// 対話シェル: 1行1コマンドでストアを操作する

use anyhow::{anyhow, Result};
use std::fmt::Write;
use std::path::PathBuf;

use crate::catalog::{display_name_for_id, find_blueprint, BLUEPRINTS};
use crate::manifest::{export_filename, read_import, ConfigEditor, ImportSink};
use crate::runtime::Deck;
use crate::shell::{parse, ShellCommand, HELP};
use crate::store::Store;
use crate::vault::MASK;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Output(String),
    Quit,
}

/// Line-oriented front end over one [`Deck`].
pub struct Shell {
    deck: Deck,
    editor: ConfigEditor,
}

impl Shell {
    pub fn new(deck: Deck) -> Self {
        let editor = ConfigEditor::new(deck.store());
        Self { deck, editor }
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn deck_mut(&mut self) -> &mut Deck {
        &mut self.deck
    }

    /// Applies pending timer events, then runs one line. Errors are rendered
    /// into the output rather than returned.
    pub fn run_line(&mut self, line: &str) -> Step {
        self.deck.pump();
        let command = match parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Step::Output(String::new()),
            Err(err) => return Step::Output(format!("error: {}", err)),
        };
        if command == ShellCommand::Exit {
            return Step::Quit;
        }

        let before = self.deck.store().notice().map(|n| n.seq);
        let mut out = match self.execute(command) {
            Ok(text) => text,
            Err(err) => format!("error: {}", err),
        };
        self.editor.sync(self.deck.store());

        if let Some(notice) = self.deck.store().notice() {
            if Some(notice.seq) != before {
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                let _ = write!(out, "[{}] {}", notice.kind, notice.message);
            }
        }
        Step::Output(out)
    }

    fn execute(&mut self, command: ShellCommand) -> Result<String> {
        let editor = &mut self.editor;
        match command {
            ShellCommand::Help => Ok(HELP.to_string()),
            ShellCommand::Exit => Ok(String::new()),
            ShellCommand::Servers => Ok(render_servers(self.deck.store(), None)),
            ShellCommand::Search(query) => {
                let mut out = render_servers(self.deck.store(), Some(&query));
                for bp in Store::search_blueprints(&BLUEPRINTS, &query) {
                    let _ = writeln!(out, "blueprint {} {} {}", bp.id, bp.icon, bp.name);
                }
                Ok(out.trim_end().to_string())
            }
            ShellCommand::Install(id) => {
                if self.deck.store().active_project().is_installed(&id) {
                    return Ok(format!("already installed: {}", id));
                }
                Ok(self.toggle(&id))
            }
            ShellCommand::Uninstall(id) => {
                if !self.deck.store().active_project().is_installed(&id) {
                    return Ok(format!("not installed: {}", id));
                }
                Ok(self.toggle(&id))
            }
            ShellCommand::Toggle(id) => Ok(self.toggle(&id)),
            ShellCommand::Projects => {
                let store = self.deck.store();
                let mut out = String::new();
                for project in store.projects() {
                    let marker = if project.id == store.active_project().id { "*" } else { " " };
                    let _ = writeln!(
                        out,
                        "{} {} {} ({} servers) {}",
                        marker,
                        project.id,
                        project.name,
                        project.server_ids.len(),
                        project.color
                    );
                }
                Ok(out.trim_end().to_string())
            }
            ShellCommand::ProjectNew { name, description } => {
                let id = self.deck.apply(|store| store.create_project(&name, &description))?;
                Ok(format!("project: {}", id))
            }
            ShellCommand::ProjectUse(id) => {
                self.deck.apply(|store| store.select_project(&id))?;
                Ok(String::new())
            }
            ShellCommand::Blueprints => {
                let mut out = String::new();
                for bp in BLUEPRINTS.iter() {
                    let servers: Vec<String> = bp
                        .server_ids
                        .iter()
                        .map(|id| match self.deck.store().server(id) {
                            Some(server) => server.name.clone(),
                            None => format!("{}?", display_name_for_id(id)),
                        })
                        .collect();
                    let _ = writeln!(
                        out,
                        "{} {} {} [{}] {}",
                        bp.id,
                        bp.icon,
                        bp.name,
                        bp.category,
                        servers.join(", ")
                    );
                }
                Ok(out.trim_end().to_string())
            }
            ShellCommand::Deploy(id) => {
                let blueprint = find_blueprint(&id).ok_or_else(|| anyhow!("blueprint not found: {}", id))?;
                let outcome = self.deck.apply(|store| store.deploy_blueprint(blueprint));
                let mut out = format!("project: {}", outcome.project_id);
                if !outcome.dangling.is_empty() {
                    let _ = write!(out, "\nwarning: not in catalog: {}", outcome.dangling.join(", "));
                }
                Ok(out)
            }
            ShellCommand::Vault => {
                let store = self.deck.store();
                let mut out = String::new();
                for secret in store.vault().secrets() {
                    let _ = writeln!(out, "{} {} {} {}", secret.id, secret.key, MASK, secret.description);
                }
                let orphans = store.orphaned_overrides();
                if !orphans.is_empty() {
                    let _ = writeln!(out, "orphaned overrides: {}", orphans.join(", "));
                }
                Ok(out.trim_end().to_string())
            }
            ShellCommand::VaultAdd { key, value, description } => {
                let id = self.deck.apply(|store| store.add_secret(&key, &value, &description));
                Ok(format!("secret: {}", id))
            }
            ShellCommand::VaultRm(id) => {
                self.deck.apply(|store| store.delete_secret(&id))?;
                Ok(String::new())
            }
            ShellCommand::VaultShow(id) => Ok(self.deck.apply(|store| store.reveal_secret(&id))?),
            ShellCommand::Config(server_id) => {
                let server = self
                    .deck
                    .store()
                    .server(&server_id)
                    .ok_or_else(|| anyhow!("server not found: {}", server_id))?;
                Ok(server.config.to_pretty_json())
            }
            ShellCommand::ConfigSet { server, json } => {
                editor.select(self.deck.store(), &server)?;
                editor.set_text(json);
                self.deck.apply(|store| editor.commit(store))?;
                Ok(String::new())
            }
            ShellCommand::EnvSet { server, key, value } => {
                editor.select(self.deck.store(), &server)?;
                self.deck.apply(|store| editor.set_env(store, &key, &value))?;
                Ok(String::new())
            }
            ShellCommand::EnvRm { server, key } => {
                editor.select(self.deck.store(), &server)?;
                self.deck.apply(|store| editor.remove_env(store, &key))?;
                Ok(String::new())
            }
            ShellCommand::SkillAdd { server, name, description } => {
                editor.select(self.deck.store(), &server)?;
                self.deck.apply(|store| editor.add_skill(store, &name, &description))?;
                Ok(String::new())
            }
            ShellCommand::SkillRm { server, index } => {
                editor.select(self.deck.store(), &server)?;
                self.deck.apply(|store| editor.remove_skill(store, index))?;
                Ok(String::new())
            }
            ShellCommand::OverrideSet { key, value } => {
                self.deck.apply(|store| editor.set_override(store, &key, &value))?;
                Ok(String::new())
            }
            ShellCommand::OverrideRm(key) => {
                self.deck.apply(|store| editor.remove_override(store, &key))?;
                Ok(String::new())
            }
            ShellCommand::Export(path) => {
                let store = self.deck.store();
                let path = path.unwrap_or_else(|| PathBuf::from(export_filename(&store.active_project().name)));
                store.manifest().write(&path)?;
                Ok(format!("exported: {}", path.display()))
            }
            ShellCommand::Import(path) => {
                let servers = read_import(&path)?;
                let report = self.deck.apply(|store| store.import_servers(servers));
                let mut out = format!("updated: {}", report.updated.join(", "));
                if !report.installed.is_empty() {
                    let _ = write!(out, "\ninstalled: {}", report.installed.join(", "));
                }
                if !report.unknown.is_empty() {
                    let _ = write!(out, "\nunknown: {}", report.unknown.join(", "));
                }
                Ok(out)
            }
            ShellCommand::Events(count) => {
                let events = self.deck.store().events_for_active_project();
                if events.is_empty() {
                    return Ok("waiting for protocol calls...".to_string());
                }
                let mut out = String::new();
                for event in events.into_iter().take(count) {
                    let _ = writeln!(
                        out,
                        "[{}] {} > {} {}ms {}",
                        event.timestamp.format("%H:%M:%S"),
                        event.server_name,
                        event.method,
                        event.latency_ms,
                        event.status
                    );
                }
                Ok(out.trim_end().to_string())
            }
            ShellCommand::Gateway(on) => {
                if on {
                    self.deck.start_gateway();
                } else {
                    self.deck.stop_gateway();
                }
                Ok(format!(
                    "gateway: {}",
                    if self.deck.gateway_running() { "running" } else { "stopped" }
                ))
            }
        }
    }

    /// Flips membership, warning when the id has no catalog entry.
    fn toggle(&mut self, id: &str) -> String {
        let outcome = self.deck.apply(|store| store.toggle_install(id));
        if outcome.known {
            String::new()
        } else {
            format!("warning: {} is not in the catalog", id)
        }
    }
}

fn render_servers(store: &Store, query: Option<&str>) -> String {
    let view = match query {
        Some(query) => store.search_servers(query),
        None => store.project_servers(),
    };
    let mut out = String::new();
    for entry in view {
        let mark = if entry.installed { "[x]" } else { "[ ]" };
        let _ = writeln!(
            out,
            "{} {:<20} {:<8} {:<14} {}",
            mark, entry.server.id, entry.status, entry.server.category, entry.server.name
        );
    }
    if query.is_none() {
        let stats = store.stats();
        let _ = write!(out, "{} installed, {} active", stats.installed, stats.active);
    }
    out.trim_end().to_string()
}
