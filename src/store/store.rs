// Store module
// サーバーカタログ・プロジェクト・シークレットの状態管理

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

use crate::catalog::{seed_projects, seed_secrets, seed_servers, Blueprint, Server, ServerConfig, Skill};
use crate::gateway::{EventLog, LiveEvent, Simulator};
use crate::manifest::{ImportReport, ImportSink, Manifest};
use crate::store::{
    dashboard_stats, project_view, random_color, unique_id, DashboardStats, Notice, NoticeKind,
    Project, ProjectServer, StoreError,
};
use crate::vault::{Secret, Vault};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub server_id: String,
    pub installed: bool,
    /// False when the id is not in the catalog. The toggle still applies.
    pub known: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOutcome {
    pub project_id: String,
    /// Blueprint server ids the catalog does not know.
    pub dangling: Vec<String>,
}

/// In-memory owner of the server catalog, projects, vault and live event log.
///
/// Exactly one project is active. `projects` is never empty, so the active
/// project always resolves (falling back to the first one).
pub struct Store {
    servers: Vec<Server>,
    projects: Vec<Project>,
    active_project_id: String,
    vault: Vault,
    events: EventLog,
    notice: Option<Notice>,
    notice_seq: u64,
    rng: StdRng,
}

impl Store {
    pub fn new(servers: Vec<Server>, projects: Vec<Project>, vault: Vault) -> Result<Self, StoreError> {
        Self::with_rng(servers, projects, vault, StdRng::from_entropy())
    }

    pub fn with_rng(
        servers: Vec<Server>,
        projects: Vec<Project>,
        vault: Vault,
        rng: StdRng,
    ) -> Result<Self, StoreError> {
        ensure_unique("server", servers.iter().map(|s| s.id.as_str()))?;
        ensure_unique("project", projects.iter().map(|p| p.id.as_str()))?;
        ensure_unique("secret", vault.secrets().iter().map(|s| s.id.as_str()))?;
        let active_project_id = projects.first().ok_or(StoreError::NoProjects)?.id.clone();
        Ok(Self {
            servers,
            projects,
            active_project_id,
            vault,
            events: EventLog::new(),
            notice: None,
            notice_seq: 0,
            rng,
        })
    }

    /// The catalog, projects and vault the dashboard starts with.
    pub fn seeded() -> Self {
        Self::seeded_with_rng(StdRng::from_entropy())
    }

    pub fn seeded_with_rng(rng: StdRng) -> Self {
        Self {
            servers: seed_servers(),
            projects: seed_projects(Utc::now()),
            active_project_id: "proj-global".to_string(),
            vault: Vault::plaintext(seed_secrets()),
            events: EventLog::new(),
            notice: None,
            notice_seq: 0,
            rng,
        }
    }

    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    pub fn server(&self, id: &str) -> Option<&Server> {
        self.servers.iter().find(|s| s.id == id)
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn active_project_id(&self) -> &str {
        &self.active_project_id
    }

    pub fn active_project(&self) -> &Project {
        let index = self.active_index();
        &self.projects[index]
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn project_servers(&self) -> Vec<ProjectServer<'_>> {
        project_view(&self.servers, self.active_project())
    }

    pub fn installed_servers(&self) -> Vec<&Server> {
        self.project_servers()
            .into_iter()
            .filter(|entry| entry.installed)
            .map(|entry| entry.server)
            .collect()
    }

    pub fn stats(&self) -> DashboardStats {
        dashboard_stats(&self.project_servers())
    }

    pub fn search_servers(&self, query: &str) -> Vec<ProjectServer<'_>> {
        self.project_servers()
            .into_iter()
            .filter(|entry| entry.server.matches(query))
            .collect()
    }

    pub fn search_blueprints<'a>(blueprints: &'a [Blueprint], query: &str) -> Vec<&'a Blueprint> {
        blueprints.iter().filter(|bp| bp.matches(query)).collect()
    }

    /// Events for servers installed in the active project, newest first.
    pub fn events_for_active_project(&self) -> Vec<&LiveEvent> {
        self.events
            .for_servers(&self.active_project().server_ids)
            .collect()
    }

    /// Override keys of the active project with no vault secret of that key.
    pub fn orphaned_overrides(&self) -> Vec<String> {
        self.active_project()
            .secrets
            .keys()
            .filter(|key| !self.vault.contains_key(key))
            .cloned()
            .collect()
    }

    pub fn manifest(&self) -> Manifest {
        Manifest::from_view(&self.project_servers(), &self.active_project().secrets)
    }

    pub fn toggle_install(&mut self, server_id: &str) -> ToggleOutcome {
        let server_name = self.server(server_id).map(|s| s.name.clone());
        let known = server_name.is_some();
        if !known {
            warn!(server_id, "toggling a server that is not in the catalog");
        }
        let index = self.active_index();
        let project = &mut self.projects[index];
        let installed = project.toggle(server_id);
        let project_name = project.name.clone();
        debug!(server_id, installed, project = %project_name, "toggled install");

        let label = server_name.unwrap_or_else(|| server_id.to_string());
        let verb = if installed { "added to" } else { "removed from" };
        self.post(NoticeKind::Success, format!("{} {} {}.", label, verb, project_name));
        ToggleOutcome {
            server_id: server_id.to_string(),
            installed,
            known,
        }
    }

    pub fn create_project(&mut self, name: &str, description: &str) -> Result<String, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::EmptyProjectName);
        }
        let id = self.push_project(name, description, Vec::new());
        self.post(NoticeKind::Success, format!("Project \"{}\" created.", name));
        Ok(id)
    }

    pub fn deploy_blueprint(&mut self, blueprint: &Blueprint) -> DeployOutcome {
        let dangling: Vec<String> = blueprint
            .server_ids
            .iter()
            .filter(|id| self.server(id).is_none())
            .cloned()
            .collect();
        if !dangling.is_empty() {
            warn!(blueprint = %blueprint.id, ?dangling, "blueprint lists servers outside the catalog");
        }
        let project_id = self.push_project(
            &blueprint.name,
            &blueprint.description,
            blueprint.server_ids.clone(),
        );
        self.post(
            NoticeKind::Success,
            format!("Blueprint \"{}\" deployed!", blueprint.name),
        );
        DeployOutcome {
            project_id,
            dangling,
        }
    }

    pub fn select_project(&mut self, project_id: &str) -> Result<(), StoreError> {
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.id == project_id)
            .ok_or_else(|| StoreError::ProjectNotFound(project_id.to_string()))?;
        project.last_used = Utc::now();
        let message = format!("Switched to {}.", project.name);
        self.active_project_id = project_id.to_string();
        debug!(project_id, "selected project");
        self.post(NoticeKind::Success, message);
        Ok(())
    }

    /// Replaces the server's config wholesale.
    pub fn update_server_config(&mut self, server_id: &str, config: ServerConfig) -> Result<(), StoreError> {
        let server = self.server_mut(server_id)?;
        server.config = config;
        debug!(server_id, "config replaced");
        self.post(NoticeKind::Success, "Configuration saved globally.".to_string());
        Ok(())
    }

    /// Replaces the server's skill list wholesale.
    pub fn update_server_skills(&mut self, server_id: &str, skills: Vec<Skill>) -> Result<(), StoreError> {
        let server = self.server_mut(server_id)?;
        server.skills = skills;
        debug!(server_id, "skills replaced");
        self.post(NoticeKind::Success, "Agent skills updated.".to_string());
        Ok(())
    }

    /// Replaces the active project's override map wholesale.
    pub fn update_project_secrets(&mut self, overrides: BTreeMap<String, String>) {
        let index = self.active_index();
        self.projects[index].secrets = overrides;
        debug!(project = %self.projects[index].id, "overrides replaced");
        self.post(NoticeKind::Success, "Project secret overrides updated.".to_string());
    }

    pub fn add_secret(&mut self, key: &str, value: &str, description: &str) -> String {
        let vault = &self.vault;
        let id = unique_id("sec", &mut self.rng, |candidate| vault.contains_id(candidate));
        self.vault.add(id.clone(), key, value, description);
        debug!(secret_id = %id, key, "secret added");
        self.post(NoticeKind::Success, format!("Secret \"{}\" added to vault.", key));
        id
    }

    /// Removes exactly one vault entry. Project overrides naming the same key
    /// are left in place; see [`Store::orphaned_overrides`].
    pub fn delete_secret(&mut self, secret_id: &str) -> Result<Secret, StoreError> {
        let removed = self
            .vault
            .delete(secret_id)
            .ok_or_else(|| StoreError::SecretNotFound(secret_id.to_string()))?;
        debug!(secret_id, key = %removed.key, "secret deleted");
        self.post(
            NoticeKind::Success,
            format!("Secret \"{}\" removed from vault.", removed.key),
        );
        Ok(removed)
    }

    pub fn reveal_secret(&mut self, secret_id: &str) -> Result<String, StoreError> {
        self.vault
            .reveal(secret_id)
            .ok_or_else(|| StoreError::SecretNotFound(secret_id.to_string()))
    }

    /// Runs one simulator tick against the active project.
    pub fn gateway_tick(&mut self, simulator: &Simulator) -> Option<&LiveEvent> {
        let index = self.active_index();
        let event =
            simulator.synthesize(&self.projects[index], &self.servers, &mut self.rng, Utc::now())?;
        debug!(server_id = %event.server_id, method = %event.method, "gateway event");
        self.events.push(event);
        self.events.latest()
    }

    /// Logs an externally produced event under the same head/cap contract.
    pub fn record_event(&mut self, event: LiveEvent) {
        self.events.push(event);
    }

    pub fn post_error(&mut self, message: impl Into<String>) {
        self.post(NoticeKind::Error, message.into());
    }

    /// Clears the notice if it is still the one numbered `seq`.
    pub fn dismiss_notice(&mut self, seq: u64) -> bool {
        match &self.notice {
            Some(notice) if notice.seq == seq => {
                self.notice = None;
                true
            }
            _ => false,
        }
    }

    fn post(&mut self, kind: NoticeKind, message: String) {
        self.notice_seq += 1;
        self.notice = Some(Notice {
            seq: self.notice_seq,
            kind,
            message,
        });
    }

    fn push_project(&mut self, name: &str, description: &str, server_ids: Vec<String>) -> String {
        let taken: HashSet<String> = self.projects.iter().map(|p| p.id.clone()).collect();
        let id = unique_id("proj", &mut self.rng, |candidate| taken.contains(candidate));
        let color = random_color(&mut self.rng);
        self.projects.push(Project {
            id: id.clone(),
            name: name.to_string(),
            description: description.to_string(),
            server_ids,
            color,
            last_used: Utc::now(),
            secrets: BTreeMap::new(),
        });
        self.active_project_id = id.clone();
        debug!(project_id = %id, name, "project created");
        id
    }

    fn active_index(&self) -> usize {
        self.projects
            .iter()
            .position(|p| p.id == self.active_project_id)
            .unwrap_or(0)
    }

    fn server_mut(&mut self, server_id: &str) -> Result<&mut Server, StoreError> {
        self.servers
            .iter_mut()
            .find(|s| s.id == server_id)
            .ok_or_else(|| StoreError::ServerNotFound(server_id.to_string()))
    }
}

impl ImportSink for Store {
    /// Known servers get their config replaced and are installed into the
    /// active project. Unknown ids are reported and skipped.
    fn import_servers(&mut self, servers: BTreeMap<String, ServerConfig>) -> ImportReport {
        let mut report = ImportReport::default();
        let index = self.active_index();
        for (server_id, config) in servers {
            let Some(server) = self.servers.iter_mut().find(|s| s.id == server_id) else {
                warn!(server_id = %server_id, "import skipped unknown server");
                report.unknown.push(server_id);
                continue;
            };
            server.config = config;
            if self.projects[index].install(&server_id) {
                report.installed.push(server_id.clone());
            }
            report.updated.push(server_id);
        }
        let message = format!("Imported {} server configuration(s).", report.updated.len());
        if report.updated.is_empty() && !report.unknown.is_empty() {
            self.post(NoticeKind::Error, message);
        } else {
            self.post(NoticeKind::Success, message);
        }
        report
    }
}

fn ensure_unique<'a>(kind: &'static str, ids: impl Iterator<Item = &'a str>) -> Result<(), StoreError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(StoreError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::find_blueprint;
    use crate::config::GatewayConfig;
    use crate::gateway::EVENT_LOG_CAPACITY;

    fn store() -> Store {
        Store::seeded_with_rng(StdRng::seed_from_u64(42))
    }

    #[test]
    fn active_project_falls_back_to_first() {
        let mut store = store();
        store.active_project_id = "proj-gone".to_string();
        assert_eq!(store.active_project().id, "proj-global");
    }

    #[test]
    fn new_rejects_empty_and_duplicate_collections() {
        assert_eq!(
            Store::new(seed_servers(), Vec::new(), Vault::plaintext(Vec::new())).err(),
            Some(StoreError::NoProjects)
        );
        let mut servers = seed_servers();
        servers.push(servers[0].clone());
        let err = Store::new(servers, seed_projects(Utc::now()), Vault::plaintext(Vec::new())).err();
        assert!(matches!(err, Some(StoreError::DuplicateId { kind: "server", .. })));
    }

    #[test]
    fn toggle_twice_restores_server_ids() {
        let mut store = store();
        let before = store.active_project().server_ids.clone();
        let first = store.toggle_install("github-mcp");
        assert!(first.installed && first.known);
        store.toggle_install("github-mcp");
        assert_eq!(store.active_project().server_ids, before);

        store.toggle_install("google-search-mcp");
        store.toggle_install("google-search-mcp");
        assert_eq!(store.active_project().server_ids, vec!["postgres-inspector", "google-search-mcp"]);
    }

    #[test]
    fn toggle_notice_names_server_and_project() {
        let mut store = store();
        store.toggle_install("github-mcp");
        assert_eq!(
            store.notice().map(|n| n.message.as_str()),
            Some("GitHub Manager added to Main Workspace.")
        );
        store.toggle_install("github-mcp");
        assert_eq!(
            store.notice().map(|n| n.message.as_str()),
            Some("GitHub Manager removed from Main Workspace.")
        );
    }

    #[test]
    fn dangling_toggle_is_inert_in_the_view() {
        let mut store = store();
        let outcome = store.toggle_install("x");
        assert!(!outcome.known);
        assert!(store.active_project().is_installed("x"));
        assert_eq!(store.project_servers().len(), store.servers().len());
        assert_eq!(store.stats().installed, 2);
    }

    #[test]
    fn fresh_project_toggle_scenario() {
        let mut store = store();
        store.create_project("Scratch", "").unwrap();
        store.toggle_install("x");
        assert_eq!(store.active_project().server_ids, vec!["x"]);
        store.toggle_install("x");
        assert!(store.active_project().server_ids.is_empty());
    }

    #[test]
    fn create_project_activates_an_empty_project() {
        let mut store = store();
        let count = store.projects().len();
        let id = store.create_project("Foo", "").unwrap();
        assert_eq!(store.projects().len(), count + 1);
        let active = store.active_project();
        assert_eq!(active.id, id);
        assert_eq!(active.name, "Foo");
        assert!(active.server_ids.is_empty());
        assert!(active.secrets.is_empty());
        assert_eq!(store.notice().map(|n| n.message.as_str()), Some("Project \"Foo\" created."));
    }

    #[test]
    fn blank_project_name_is_refused() {
        let mut store = store();
        let count = store.projects().len();
        assert_eq!(store.create_project("   ", "desc"), Err(StoreError::EmptyProjectName));
        assert_eq!(store.projects().len(), count);
        assert_eq!(store.active_project_id(), "proj-global");
        assert!(store.notice().is_none());
    }

    #[test]
    fn deploy_copies_blueprint_servers_in_order() {
        let mut store = store();
        let bp = find_blueprint("bp-researcher").unwrap();
        let existing: Vec<String> = store.projects().iter().map(|p| p.id.clone()).collect();
        let outcome = store.deploy_blueprint(bp);
        let active = store.active_project();
        assert_eq!(active.server_ids, bp.server_ids);
        assert_eq!(active.name, bp.name);
        assert!(!existing.contains(&active.id));
        assert_eq!(outcome.dangling, vec!["wikipedia-mcp", "arxiv-mcp"]);
    }

    #[test]
    fn select_unknown_project_leaves_state() {
        let mut store = store();
        assert_eq!(
            store.select_project("proj-nope"),
            Err(StoreError::ProjectNotFound("proj-nope".to_string()))
        );
        assert_eq!(store.active_project_id(), "proj-global");
        store.select_project("proj-web-dev").unwrap();
        assert_eq!(store.active_project().name, "OpenCode Web");
    }

    #[test]
    fn config_update_replaces_wholesale() {
        let mut store = store();
        let config = ServerConfig::new("uvx", &["mcp-server-github"]);
        store.update_server_config("github-mcp", config.clone()).unwrap();
        let stored = &store.server("github-mcp").unwrap().config;
        assert_eq!(stored, &config);
        assert!(stored.env.is_none());
        assert_eq!(
            store.update_server_config("nope", config),
            Err(StoreError::ServerNotFound("nope".to_string()))
        );
    }

    #[test]
    fn skills_update_replaces_wholesale() {
        let mut store = store();
        store
            .update_server_skills("docker-mcp", vec![Skill::new("prune", "Remove stopped containers")])
            .unwrap();
        let skills = &store.server("docker-mcp").unwrap().skills;
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].name, "prune");
    }

    #[test]
    fn deleting_a_secret_keeps_overrides_and_other_entries() {
        let mut store = store();
        let mut overrides = BTreeMap::new();
        overrides.insert("GITHUB_TOKEN".to_string(), "ghp_project".to_string());
        store.update_project_secrets(overrides.clone());
        let other = store.vault().get("sec-1").cloned();

        let removed = store.delete_secret("sec-2").unwrap();
        assert_eq!(removed.key, "GITHUB_TOKEN");
        assert_eq!(store.vault().len(), 1);
        assert_eq!(store.vault().get("sec-1").cloned(), other);
        assert_eq!(store.active_project().secrets, overrides);
        assert_eq!(store.orphaned_overrides(), vec!["GITHUB_TOKEN"]);
        assert_eq!(
            store.delete_secret("sec-2"),
            Err(StoreError::SecretNotFound("sec-2".to_string()))
        );
    }

    #[test]
    fn added_secrets_get_fresh_ids() {
        let mut store = store();
        let a = store.add_secret("TOKEN", "1", "");
        let b = store.add_secret("TOKEN", "2", "");
        assert_ne!(a, b);
        assert!(a.starts_with("sec-"));
        assert_eq!(store.vault().len(), 4);
    }

    #[test]
    fn gateway_ticks_stay_bounded_and_ordered() {
        let mut store = store();
        let sim = Simulator::new(GatewayConfig::default()).unwrap();
        for _ in 0..120 {
            store.gateway_tick(&sim);
        }
        assert_eq!(store.events().len(), EVENT_LOG_CAPACITY);
        let stamps: Vec<_> = store.events().iter().map(|e| e.timestamp).collect();
        assert!(stamps.windows(2).all(|w| w[0] >= w[1]));
        assert!(store
            .events()
            .iter()
            .all(|e| e.server_id == "google-search-mcp" || e.server_id == "postgres-inspector"));
    }

    fn external_event(id: &str, timestamp: chrono::DateTime<Utc>) -> LiveEvent {
        LiveEvent {
            id: id.to_string(),
            timestamp,
            server_id: "github-mcp".to_string(),
            server_name: "GitHub Manager".to_string(),
            method: "list_repos".to_string(),
            params: serde_json::json!({}),
            result: None,
            status: crate::gateway::EventStatus::Success,
            latency_ms: 42,
        }
    }

    #[test]
    fn recorded_events_keep_head_order_and_cap() {
        let mut store = store();
        let now = Utc::now();
        store.record_event(external_event("first", now));
        store.record_event(external_event("late", now - chrono::Duration::seconds(30)));
        let head = store.events().latest().unwrap();
        assert_eq!(head.id, "late");
        assert_eq!(head.timestamp, now);

        for i in 0..EVENT_LOG_CAPACITY + 5 {
            store.record_event(external_event(&format!("e{}", i), now));
        }
        assert_eq!(store.events().len(), EVENT_LOG_CAPACITY);
        assert_eq!(store.events().latest().unwrap().id, format!("e{}", EVENT_LOG_CAPACITY + 4));
        assert!(store.events().iter().all(|e| e.id.starts_with('e')));
    }

    #[test]
    fn gateway_tick_skips_empty_project() {
        let mut store = store();
        store.create_project("Empty", "").unwrap();
        let sim = Simulator::new(GatewayConfig::default()).unwrap();
        assert!(store.gateway_tick(&sim).is_none());
        assert!(store.events().is_empty());
    }

    #[test]
    fn events_are_filtered_to_active_project() {
        let mut store = store();
        let sim = Simulator::new(GatewayConfig::default()).unwrap();
        for _ in 0..10 {
            store.gateway_tick(&sim);
        }
        store.select_project("proj-web-dev").unwrap();
        assert!(store
            .events_for_active_project()
            .iter()
            .all(|e| e.server_id == "google-search-mcp"));
    }

    #[test]
    fn stale_dismiss_is_ignored() {
        let mut store = store();
        store.toggle_install("github-mcp");
        let first = store.notice().map(|n| n.seq).unwrap();
        store.toggle_install("github-mcp");
        assert!(!store.dismiss_notice(first));
        assert!(store.notice().is_some());
        let second = store.notice().map(|n| n.seq).unwrap();
        assert!(store.dismiss_notice(second));
        assert!(store.notice().is_none());
    }

    #[test]
    fn import_updates_known_and_reports_unknown() {
        let mut store = store();
        let mut servers = BTreeMap::new();
        servers.insert("github-mcp".to_string(), ServerConfig::new("gh-mcp", &[]));
        servers.insert("ghost".to_string(), ServerConfig::new("x", &[]));
        let report = store.import_servers(servers);
        assert_eq!(report.updated, vec!["github-mcp"]);
        assert_eq!(report.installed, vec!["github-mcp"]);
        assert_eq!(report.unknown, vec!["ghost"]);
        assert_eq!(store.server("github-mcp").unwrap().config.command, "gh-mcp");
        assert!(store.active_project().is_installed("github-mcp"));
    }
}
