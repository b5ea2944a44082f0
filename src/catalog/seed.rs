// Seed data
// 起動時のカタログ・プロジェクト・シークレット

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

use crate::catalog::{Blueprint, Category, Server, ServerConfig, ServerStatus, Skill};
use crate::store::Project;
use crate::vault::Secret;

pub static BLUEPRINTS: Lazy<Vec<Blueprint>> = Lazy::new(|| {
    vec![
        blueprint(
            "bp-researcher",
            "The Academic Researcher",
            "A powerhouse for deep technical research and data gathering.",
            "🔬",
            "Research",
            &["google-search-mcp", "wikipedia-mcp", "arxiv-mcp"],
        ),
        blueprint(
            "bp-fullstack",
            "Fullstack Orchestrator",
            "Perfect for OpenCode users managing codebases and deployments.",
            "⚡",
            "Development",
            &["github-mcp", "docker-mcp", "postgres-inspector"],
        ),
        blueprint(
            "bp-agent-os",
            "Office Agent OS",
            "The ultimate personal assistant for project management.",
            "🏢",
            "Productivity",
            &["notion-mcp", "slack-connector", "google-calendar-mcp"],
        ),
    ]
});

pub fn find_blueprint(id: &str) -> Option<&'static Blueprint> {
    BLUEPRINTS.iter().find(|bp| bp.id == id)
}

pub fn seed_servers() -> Vec<Server> {
    vec![
        Server {
            id: "google-search-mcp".to_string(),
            name: "Google Search".to_string(),
            description: "Enables Gemini and OpenCode to perform real-time web searches and extract information.".to_string(),
            version: "1.2.0".to_string(),
            author: "Google".to_string(),
            category: Category::Utility,
            status: ServerStatus::Active,
            config: ServerConfig::new("npx", &["-y", "@modelcontextprotocol/server-google-search"])
                .with_env("GOOGLE_API_KEY", "********"),
            skills: vec![
                Skill::new("search_web", "Search the public internet for queries and retrieve ranked results."),
                Skill::new("get_news", "Fetch latest headlines and articles for a specific topic or keyword."),
                Skill::new("extract_page_content", "Crawl a specific URL and return its text content cleaned of boilerplates."),
            ],
            github_url: None,
            icon: None,
            stars: None,
        },
        Server {
            id: "postgres-inspector".to_string(),
            name: "PostgreSQL Inspector".to_string(),
            description: "Schema inspection and query execution for PostgreSQL databases.".to_string(),
            version: "0.9.5".to_string(),
            author: "MCP Community".to_string(),
            category: Category::Database,
            status: ServerStatus::Inactive,
            config: ServerConfig::new("npx", &["-y", "@modelcontextprotocol/server-postgres"])
                .with_env("DATABASE_URL", "postgresql://localhost:5432/mydb"),
            skills: vec![
                Skill::new("list_tables", "List all tables available in the currently connected database schema."),
                Skill::new("execute_query", "Execute a read-only SQL query and return the result set as JSON."),
                Skill::new("describe_table", "Get detailed column types, indexes, and constraints for a specific table."),
            ],
            github_url: None,
            icon: None,
            stars: None,
        },
        Server {
            id: "notion-mcp".to_string(),
            name: "Notion Connector".to_string(),
            description: "Full access to Notion workspaces, including pages, databases, and blocks.".to_string(),
            version: "1.4.2".to_string(),
            author: "Smithery Community".to_string(),
            category: Category::Utility,
            status: ServerStatus::Inactive,
            config: ServerConfig::new("npx", &["-y", "@smithery/mcp-notion"]).with_env("NOTION_TOKEN", ""),
            skills: vec![
                Skill::new("search_notion", "Search for pages or databases by title in the authorized workspace."),
                Skill::new("append_block", "Add new content blocks (text, todo, images) to an existing page."),
                Skill::new("query_database", "Filter and sort items within a specific Notion database."),
            ],
            github_url: None,
            icon: None,
            stars: Some(2100),
        },
        Server {
            id: "github-mcp".to_string(),
            name: "GitHub Manager".to_string(),
            description: "Manage repositories, issues, and PRs directly through your AI assistant.".to_string(),
            version: "2.1.0".to_string(),
            author: "GitHub".to_string(),
            category: Category::DevTools,
            status: ServerStatus::Active,
            config: ServerConfig::new("npx", &["-y", "@modelcontextprotocol/server-github"])
                .with_env("GITHUB_PERSONAL_ACCESS_TOKEN", ""),
            skills: vec![
                Skill::new("create_issue", "Open a new issue in a specific repository with labels and assignees."),
                Skill::new("list_prs", "Retrieve a list of active pull requests for a given repository."),
                Skill::new("get_repo_contents", "Download or read the content of files from a specific branch."),
            ],
            github_url: None,
            icon: None,
            stars: Some(1240),
        },
        Server {
            id: "slack-connector".to_string(),
            name: "Slack Integration".to_string(),
            description: "Send messages and monitor channels in your Slack workspace.".to_string(),
            version: "1.0.4".to_string(),
            author: "Slack".to_string(),
            category: Category::Communication,
            status: ServerStatus::Inactive,
            config: ServerConfig::new("npx", &["-y", "@modelcontextprotocol/server-slack"])
                .with_env("SLACK_BOT_TOKEN", ""),
            skills: vec![
                Skill::new("send_message", "Post a new message to a specific channel or user ID."),
                Skill::new("list_channels", "Get a list of all public and private channels accessible to the bot."),
                Skill::new("search_messages", "Find specific messages across the workspace history."),
            ],
            github_url: None,
            icon: None,
            stars: Some(850),
        },
        Server {
            id: "docker-mcp".to_string(),
            name: "Docker Manager".to_string(),
            description: "Control local Docker containers and view system logs.".to_string(),
            version: "0.8.0".to_string(),
            author: "Community".to_string(),
            category: Category::DevTools,
            status: ServerStatus::Inactive,
            config: ServerConfig {
                command: "npx".to_string(),
                args: vec!["-y".to_string(), "@mcp-get/docker-server".to_string()],
                env: Some(BTreeMap::new()),
            },
            skills: vec![
                Skill::new("list_containers", "List all running and stopped Docker containers on the host."),
                Skill::new("get_container_logs", "Fetch the stdout/stderr logs for a specific container ID."),
                Skill::new("restart_container", "Trigger a restart for a specific Docker container."),
            ],
            github_url: None,
            icon: None,
            stars: Some(560),
        },
    ]
}

pub fn seed_projects(now: DateTime<Utc>) -> Vec<Project> {
    let mut global_overrides = BTreeMap::new();
    global_overrides.insert("OVERRIDE_MODE".to_string(), "true".to_string());
    vec![
        Project {
            id: "proj-global".to_string(),
            name: "Main Workspace".to_string(),
            description: "The default global project for all general purpose MCP tools.".to_string(),
            server_ids: vec!["google-search-mcp".to_string(), "postgres-inspector".to_string()],
            color: "#9333ea".to_string(),
            last_used: now,
            secrets: global_overrides,
        },
        Project {
            id: "proj-web-dev".to_string(),
            name: "OpenCode Web".to_string(),
            description: "Specific tools for frontend engineering and web development.".to_string(),
            server_ids: vec!["github-mcp".to_string(), "google-search-mcp".to_string()],
            color: "#3b82f6".to_string(),
            last_used: now,
            secrets: BTreeMap::new(),
        },
    ]
}

pub fn seed_secrets() -> Vec<Secret> {
    vec![
        Secret::new("sec-1", "GOOGLE_API_KEY", "AIzaSyC...", "Cloud console search key"),
        Secret::new("sec-2", "GITHUB_TOKEN", "ghp_451...", "Personal repo access"),
    ]
}

fn blueprint(
    id: &str,
    name: &str,
    description: &str,
    icon: &str,
    category: &str,
    server_ids: &[&str],
) -> Blueprint {
    Blueprint {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        category: category.to_string(),
        server_ids: server_ids.iter().map(|s| s.to_string()).collect(),
    }
}
