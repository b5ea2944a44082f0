use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ParseError(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Help,
    Exit,
    Servers,
    Install(String),
    Uninstall(String),
    Toggle(String),
    Projects,
    ProjectNew { name: String, description: String },
    ProjectUse(String),
    Blueprints,
    Deploy(String),
    Search(String),
    Vault,
    VaultAdd { key: String, value: String, description: String },
    VaultRm(String),
    VaultShow(String),
    Config(String),
    ConfigSet { server: String, json: String },
    EnvSet { server: String, key: String, value: String },
    EnvRm { server: String, key: String },
    SkillAdd { server: String, name: String, description: String },
    SkillRm { server: String, index: usize },
    OverrideSet { key: String, value: String },
    OverrideRm(String),
    Export(Option<PathBuf>),
    Import(PathBuf),
    Events(usize),
    Gateway(bool),
}

pub const DEFAULT_EVENT_COUNT: usize = 10;

pub const HELP: &str = "\
servers                              list catalog servers for the active project
install|uninstall|toggle <id>        change what the active project installs
projects                             list projects (* marks the active one)
project new <name> [description]     create a project and switch to it
project use <id>                     switch the active project
blueprints | deploy <blueprint-id>   list / deploy blueprints
search <text>                        search servers and blueprints
vault                                list secrets (values masked)
vault add <KEY> <value> [desc]       add a secret
vault rm <id> | vault show <id>      delete / reveal a secret
config <server>                      show a server config
config set <server> <json>           replace a server config from raw JSON
env set <server> <KEY> <value>       set an env var on an installed server
env rm <server> <KEY>                remove an env var
skill add <server> <name> [desc]     add a skill
skill rm <server> <index>            remove a skill by position
override set <KEY> <value>           set a project secret override
override rm <KEY>                    remove a project secret override
export [path] | import <path>        write / read a project manifest
events [n]                           newest live events for the active project
gateway on|off                       start / stop the live gateway
help | exit";

/// Splits on whitespace, keeping `"double quoted"` runs together.
pub fn split_args(line: &str) -> Result<Vec<String>, ParseError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if in_quotes {
        return Err(ParseError("unterminated quote".to_string()));
    }
    if has_token {
        args.push(current);
    }
    Ok(args)
}

pub fn parse(line: &str) -> Result<Option<ShellCommand>, ParseError> {
    let trimmed = line.trim();
    let trimmed = trimmed.strip_prefix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Ok(None);
    }

    // raw JSON must survive untouched, so `config set` is cut before tokenizing
    if let Some(rest) = trimmed.strip_prefix("config set ") {
        let rest = rest.trim_start();
        let (server, json) = rest
            .split_once(char::is_whitespace)
            .ok_or_else(|| usage("config set <server> <json>"))?;
        return Ok(Some(ShellCommand::ConfigSet {
            server: server.to_string(),
            json: json.trim().to_string(),
        }));
    }

    let args = split_args(trimmed)?;
    let words: Vec<&str> = args.iter().map(String::as_str).collect();
    let command = match words.as_slice() {
        ["help"] | ["?"] => ShellCommand::Help,
        ["exit"] | ["quit"] => ShellCommand::Exit,
        ["servers"] => ShellCommand::Servers,
        ["install", id] => ShellCommand::Install(id.to_string()),
        ["uninstall", id] => ShellCommand::Uninstall(id.to_string()),
        ["toggle", id] => ShellCommand::Toggle(id.to_string()),
        ["projects"] => ShellCommand::Projects,
        ["project", "new", name, rest @ ..] => ShellCommand::ProjectNew {
            name: name.to_string(),
            description: rest.join(" "),
        },
        ["project", "use", id] => ShellCommand::ProjectUse(id.to_string()),
        ["blueprints"] => ShellCommand::Blueprints,
        ["deploy", id] => ShellCommand::Deploy(id.to_string()),
        ["search", rest @ ..] if !rest.is_empty() => ShellCommand::Search(rest.join(" ")),
        ["vault"] => ShellCommand::Vault,
        ["vault", "add", key, value, rest @ ..] => ShellCommand::VaultAdd {
            key: key.to_uppercase(),
            value: value.to_string(),
            description: if rest.is_empty() {
                "Added via Vault UI".to_string()
            } else {
                rest.join(" ")
            },
        },
        ["vault", "rm", id] => ShellCommand::VaultRm(id.to_string()),
        ["vault", "show", id] => ShellCommand::VaultShow(id.to_string()),
        ["config", server] => ShellCommand::Config(server.to_string()),
        ["env", "set", server, key, value] => ShellCommand::EnvSet {
            server: server.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        },
        ["env", "rm", server, key] => ShellCommand::EnvRm {
            server: server.to_string(),
            key: key.to_string(),
        },
        ["skill", "add", server, name, rest @ ..] => ShellCommand::SkillAdd {
            server: server.to_string(),
            name: name.to_string(),
            description: rest.join(" "),
        },
        ["skill", "rm", server, index] => ShellCommand::SkillRm {
            server: server.to_string(),
            index: index
                .parse()
                .map_err(|_| ParseError(format!("not an index: {}", index)))?,
        },
        ["override", "set", key, value] => ShellCommand::OverrideSet {
            key: key.to_string(),
            value: value.to_string(),
        },
        ["override", "rm", key] => ShellCommand::OverrideRm(key.to_string()),
        ["export"] => ShellCommand::Export(None),
        ["export", path] => ShellCommand::Export(Some(PathBuf::from(path))),
        ["import", path] => ShellCommand::Import(PathBuf::from(path)),
        ["events"] => ShellCommand::Events(DEFAULT_EVENT_COUNT),
        ["events", n] => ShellCommand::Events(
            n.parse()
                .map_err(|_| ParseError(format!("not a count: {}", n)))?,
        ),
        ["gateway", "on"] => ShellCommand::Gateway(true),
        ["gateway", "off"] => ShellCommand::Gateway(false),
        [first, ..] => return Err(ParseError(format!("unknown command: {} (try help)", first))),
        [] => return Ok(None),
    };
    Ok(Some(command))
}

fn usage(text: &str) -> ParseError {
    ParseError(format!("usage: {}", text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_group_words() {
        assert_eq!(
            split_args(r#"project new "Data Lab" for "the team""#).unwrap(),
            vec!["project", "new", "Data Lab", "for", "the team"]
        );
        assert_eq!(split_args(r#"override set EMPTY """#).unwrap(), vec!["override", "set", "EMPTY", ""]);
        assert!(split_args(r#"vault add "open"#).is_err());
    }

    #[test]
    fn parses_project_commands() {
        assert_eq!(
            parse(r#"project new "Data Lab" Analytics sandbox"#).unwrap(),
            Some(ShellCommand::ProjectNew {
                name: "Data Lab".to_string(),
                description: "Analytics sandbox".to_string(),
            })
        );
        assert_eq!(
            parse("/project use proj-web-dev").unwrap(),
            Some(ShellCommand::ProjectUse("proj-web-dev".to_string()))
        );
    }

    #[test]
    fn vault_keys_are_upper_cased_with_default_description() {
        assert_eq!(
            parse("vault add openai_key sk-123").unwrap(),
            Some(ShellCommand::VaultAdd {
                key: "OPENAI_KEY".to_string(),
                value: "sk-123".to_string(),
                description: "Added via Vault UI".to_string(),
            })
        );
    }

    #[test]
    fn config_set_keeps_raw_json() {
        assert_eq!(
            parse(r#"config set github-mcp { "command": "gh mcp", "args": [] }"#).unwrap(),
            Some(ShellCommand::ConfigSet {
                server: "github-mcp".to_string(),
                json: r#"{ "command": "gh mcp", "args": [] }"#.to_string(),
            })
        );
        assert!(parse("config set github-mcp").is_err());
    }

    #[test]
    fn blank_lines_and_unknown_commands() {
        assert_eq!(parse("   ").unwrap(), None);
        assert!(parse("launch rockets").is_err());
        assert!(parse("events many").is_err());
        assert_eq!(parse("events").unwrap(), Some(ShellCommand::Events(DEFAULT_EVENT_COUNT)));
    }
}
