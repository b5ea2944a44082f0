use crate::catalog::{Server, ServerStatus};
use crate::store::Project;

/// A catalog server as seen from one project.
#[derive(Debug, Clone, Copy)]
pub struct ProjectServer<'a> {
    pub server: &'a Server,
    pub installed: bool,
    pub status: ServerStatus,
}

/// Projects the catalog through `project`: `installed` is membership in
/// `server_ids`, and a server that is not installed always reads `inactive`.
///
/// Computed on every call so it cannot go stale when either side changes.
pub fn project_view<'a>(servers: &'a [Server], project: &Project) -> Vec<ProjectServer<'a>> {
    servers
        .iter()
        .map(|server| {
            let installed = project.is_installed(&server.id);
            ProjectServer {
                server,
                installed,
                status: if installed {
                    server.status
                } else {
                    ServerStatus::Inactive
                },
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DashboardStats {
    pub installed: usize,
    pub active: usize,
}

pub fn dashboard_stats(view: &[ProjectServer<'_>]) -> DashboardStats {
    let installed: Vec<_> = view.iter().filter(|s| s.installed).collect();
    DashboardStats {
        installed: installed.len(),
        active: installed
            .iter()
            .filter(|s| s.status == ServerStatus::Active)
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{seed_projects, seed_servers};
    use chrono::Utc;

    #[test]
    fn installed_and_status_follow_membership() {
        let servers = seed_servers();
        let projects = seed_projects(Utc::now());
        for project in &projects {
            for entry in project_view(&servers, project) {
                let member = project.server_ids.contains(&entry.server.id);
                assert_eq!(entry.installed, member);
                let expected = if member {
                    entry.server.status
                } else {
                    ServerStatus::Inactive
                };
                assert_eq!(entry.status, expected);
            }
        }
    }

    #[test]
    fn stats_count_installed_and_active() {
        let servers = seed_servers();
        let projects = seed_projects(Utc::now());
        // google-search (active) + postgres (inactive)
        let stats = dashboard_stats(&project_view(&servers, &projects[0]));
        assert_eq!(stats, DashboardStats { installed: 2, active: 1 });
    }
}
