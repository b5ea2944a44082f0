use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use tokio::runtime::Handle;
use tracing::debug;

use mcpdeck::catalog::{seed_servers, BLUEPRINTS};
use mcpdeck::config::{config_candidates, load_config, Config};
use mcpdeck::manifest::{export_filename, read_import};
use mcpdeck::runtime::Deck;
use mcpdeck::shell::{Shell, Step};
use mcpdeck::store::Store;
use mcpdeck::tui::App;

#[derive(Parser, Debug)]
#[command(
    name = "mcpdeck",
    version = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_TIMESTAMP"), ")"),
    about = "🗂  MCPサーバーのカタログ・プロジェクト・シークレットを一か所で管理するCLI",
    long_about = None
)]
pub struct Cli {
    /// 出力フォーマット (text/json)
    #[arg(long, default_value = "text")]
    pub output_format: String,

    /// 設定ファイル（省略時は ~/.mcpdeck/config.toml と ./.mcpdeck/config.toml）
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// 詳細ログ
    #[arg(short, long)]
    pub verbose: bool,

    /// サブコマンド
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 対話シェル起動（既定）
    Shell,

    /// TUIダッシュボード起動
    Tui,

    /// カタログ一覧
    Catalog,

    /// ブループリント一覧
    Blueprints,

    /// マニフェスト出力
    Export {
        /// プロジェクトID（省略時は先頭のプロジェクト）
        #[arg(long)]
        project: Option<String>,

        /// 出力先（省略時は標準出力）
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// マニフェストファイルの検証
    Validate {
        /// 検証するファイル
        path: PathBuf,
    },
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = self.load_config();
        match &self.command {
            None | Some(Commands::Shell) => self.execute_shell(&config).await,
            Some(command) => self.execute_command(command, &config).await,
        }
    }

    async fn execute_command(&self, command: &Commands, config: &Config) -> Result<()> {
        match command {
            Commands::Shell => self.execute_shell(config).await,
            Commands::Tui => self.execute_tui(config).await,
            Commands::Catalog => {
                self.print_catalog();
                Ok(())
            }
            Commands::Blueprints => {
                self.print_blueprints();
                Ok(())
            }
            Commands::Export { project, output } => self.execute_export(project.as_deref(), output.as_deref()),
            Commands::Validate { path } => self.execute_validate(path),
        }
    }

    fn load_config(&self) -> Config {
        let candidates = match &self.config {
            Some(path) => vec![path.clone()],
            None => config_candidates(),
        };
        let config = load_config(&candidates);
        debug!(?config, "config loaded");
        config
    }

    async fn execute_tui(&self, config: &Config) -> Result<()> {
        let mut deck = Deck::new(Store::seeded(), config, Handle::current())?;
        deck.start_gateway();
        let mut app = App::new(deck, config);
        app.run()?;
        Ok(())
    }

    async fn execute_shell(&self, config: &Config) -> Result<()> {
        let mut deck = Deck::new(Store::seeded(), config, Handle::current())?;
        deck.start_gateway();
        let mut shell = Shell::new(deck);

        let stdin = io::stdin();
        let interactive = stdin.is_terminal();
        if interactive {
            self.print_output("shell", "🗂  mcpdeck - type 'help' for commands, 'exit' to quit");
        }
        let mut handle = stdin.lock();
        run_shell_loop(&mut handle, &mut shell, interactive)
    }

    fn execute_export(&self, project: Option<&str>, output: Option<&Path>) -> Result<()> {
        let mut store = Store::seeded();
        if let Some(project_id) = project {
            store.select_project(project_id)?;
        }
        let manifest = store.manifest();
        match output {
            Some(path) => {
                manifest.write(path)?;
                self.print_output("export", &format!("exported: {}", path.display()));
            }
            None => {
                debug!(
                    filename = %export_filename(&store.active_project().name),
                    "writing manifest to stdout"
                );
                println!("{}", manifest.to_pretty_json()?);
            }
        }
        Ok(())
    }

    fn execute_validate(&self, path: &Path) -> Result<()> {
        let servers = read_import(path).map_err(|err| anyhow!("{}: {}", path.display(), err))?;
        if self.output_format == "json" {
            let entries: Vec<_> = servers
                .iter()
                .map(|(id, config)| json!({ "id": id, "command": config.command_line() }))
                .collect();
            println!("{}", json!({ "type": "validate", "valid": true, "servers": entries }));
            return Ok(());
        }
        for (id, config) in &servers {
            println!("{} {}", id, config.command_line());
        }
        println!("ok: {} server(s)", servers.len());
        Ok(())
    }

    fn print_catalog(&self) {
        let servers = seed_servers();
        if self.output_format == "json" {
            println!("{}", json!({ "type": "catalog", "servers": servers }));
            return;
        }
        for server in &servers {
            println!(
                "{:<20} {:<8} {:<14} v{:<6} {}",
                server.id, server.status, server.category, server.version, server.name
            );
        }
    }

    fn print_blueprints(&self) {
        if self.output_format == "json" {
            println!("{}", json!({ "type": "blueprints", "blueprints": BLUEPRINTS.as_slice() }));
            return;
        }
        for bp in BLUEPRINTS.iter() {
            println!(
                "{:<16} {} {:<24} [{}] {}",
                bp.id,
                bp.icon,
                bp.name,
                bp.category,
                bp.server_ids.join(", ")
            );
        }
    }

    fn print_output(&self, mode: &str, message: &str) {
        match self.output_format.as_str() {
            "json" => {
                let payload = json!({
                    "type": "response",
                    "mode": mode,
                    "message": message
                });
                println!("{}", payload);
            }
            _ => {
                println!("{}", message);
            }
        }
    }
}

fn run_shell_loop<R: BufRead>(reader: &mut R, shell: &mut Shell, prompt: bool) -> Result<()> {
    let mut line = String::new();
    loop {
        if prompt {
            let project = shell.deck().store().active_project().name.clone();
            print!("{}> ", project);
            io::stdout().flush()?;
        }
        line.clear();

        let bytes = reader.read_line(&mut line)?;
        if bytes == 0 {
            break;
        }

        match shell.run_line(&line) {
            Step::Quit => break,
            Step::Output(text) if text.is_empty() => {}
            Step::Output(text) => println!("{}", text),
        }
    }
    Ok(())
}
