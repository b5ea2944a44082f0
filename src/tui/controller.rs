// TUI module
// Terminal User Interface

use std::fmt::Display;
use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::prelude::*;

use crate::catalog::{Blueprint, Server, BLUEPRINTS};
use crate::config::Config;
use crate::gateway::LiveEvent;
use crate::manifest::ConfigEditor;
use crate::runtime::Deck;
use crate::store::{ProjectServer, Store};
use crate::tui::render;
use crate::tui::state::{AppState, Mode, Prompt, Tab};
use crate::tui::theme::Theme;

const NEW_SECRET_DESCRIPTION: &str = "Added via Vault UI";

/// Installed servers of the active project, in catalog order.
pub fn dashboard_rows(store: &Store) -> Vec<ProjectServer<'_>> {
    store.project_servers().into_iter().filter(|row| row.installed).collect()
}

/// Marketplace rows: matching servers first, then matching blueprints.
pub fn marketplace_rows<'a>(store: &'a Store, search: &str) -> (Vec<ProjectServer<'a>>, Vec<&'static Blueprint>) {
    (store.search_servers(search), Store::search_blueprints(&BLUEPRINTS, search))
}

pub fn config_rows(store: &Store) -> Vec<&Server> {
    store.installed_servers()
}

pub fn live_rows(store: &Store) -> Vec<&LiveEvent> {
    store.events_for_active_project()
}

pub struct App {
    deck: Deck,
    editor: ConfigEditor,
    state: AppState,
    theme: Theme,
}

impl App {
    pub fn new(deck: Deck, config: &Config) -> Self {
        let theme = Theme::load(config.ui.theme, config.theme_path().as_deref());
        let editor = ConfigEditor::new(deck.store());
        let mut state = AppState::new(env!("BUILD_TIMESTAMP").to_string());
        state.status_client = config.ui.client_label();
        Self {
            deck,
            editor,
            state,
            theme,
        }
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn editor(&self) -> &ConfigEditor {
        &self.editor
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        while !self.state.should_quit {
            if self.deck.pump() > 0 {
                self.settle();
            }
            terminal.draw(|frame| self.draw(frame))?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }

    pub fn draw(&self, frame: &mut Frame) {
        render::draw(frame, self.deck.store(), &self.editor, &self.state, &self.theme);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.state.should_quit = true;
            return;
        }
        match self.state.mode.clone() {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Input(prompt) => self.handle_prompt_key(prompt, key),
            Mode::RawEdit => self.handle_raw_key(key),
        }
        self.settle();
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.state.should_quit = true,
            KeyCode::Tab => self.switch_tab(self.state.tab.next()),
            KeyCode::BackTab => self.switch_tab(self.state.tab.prev()),
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(-1),
            KeyCode::Char('p') => self.cycle_project(),
            KeyCode::Char('n') => self.state.begin_input(Prompt::ProjectName),
            KeyCode::Char(' ') | KeyCode::Enter => self.activate(),
            KeyCode::Char('/') if self.state.tab == Tab::Marketplace => {
                self.state.begin_input(Prompt::Search)
            }
            KeyCode::Char('b') if self.state.tab == Tab::Marketplace => self.deploy_selected(),
            KeyCode::Char('e') if self.state.tab == Tab::Config => {
                if self.editor.selected().is_some() {
                    self.state.mode = Mode::RawEdit;
                }
            }
            KeyCode::Char('a') if self.state.tab == Tab::Vault => self.state.begin_input(Prompt::SecretKey),
            KeyCode::Char('x') if self.state.tab == Tab::Vault => self.delete_selected_secret(),
            KeyCode::Char('r') if self.state.tab == Tab::Vault => self.reveal_selected_secret(),
            KeyCode::Char('g') if self.state.tab == Tab::Live => {
                if self.deck.gateway_running() {
                    self.deck.stop_gateway();
                } else {
                    self.deck.start_gateway();
                }
            }
            _ => {}
        }
    }

    fn handle_prompt_key(&mut self, prompt: Prompt, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.state.end_input();
            }
            KeyCode::Enter => {
                let value = self.state.end_input();
                self.submit_prompt(prompt, value);
            }
            KeyCode::Backspace => {
                self.state.input.pop();
                if prompt == Prompt::Search {
                    self.state.search = self.state.input.clone();
                }
            }
            KeyCode::Char(ch) => {
                self.state.input.push(ch);
                if prompt == Prompt::Search {
                    self.state.search = self.state.input.clone();
                }
            }
            _ => {}
        }
    }

    fn submit_prompt(&mut self, prompt: Prompt, value: String) {
        match prompt {
            Prompt::Search => self.state.search = value,
            Prompt::ProjectName => {
                let result = self.deck.apply(|store| store.create_project(&value, ""));
                self.report(result);
            }
            Prompt::SecretKey => {
                let key = value.trim().to_uppercase();
                if !key.is_empty() {
                    self.state.begin_input(Prompt::SecretValue { key });
                }
            }
            Prompt::SecretValue { key } => {
                if value.is_empty() {
                    self.post_error("Secret value must not be empty");
                    return;
                }
                self.deck
                    .apply(|store| store.add_secret(&key, &value, NEW_SECRET_DESCRIPTION));
            }
        }
    }

    fn handle_raw_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.editor.revert(self.deck.store());
                self.state.mode = Mode::Normal;
            }
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                let editor = &mut self.editor;
                // invalid buffers post their own notice inside commit
                if self.deck.apply(|store| editor.commit(store)).is_ok() {
                    self.state.mode = Mode::Normal;
                }
            }
            KeyCode::Enter => self.editor.insert_char('\n'),
            KeyCode::Backspace => self.editor.backspace(),
            KeyCode::Char(ch) => self.editor.insert_char(ch),
            _ => {}
        }
    }

    fn switch_tab(&mut self, tab: Tab) {
        self.state.tab = tab;
        self.state.revealed = None;
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.row_count();
        self.state.move_cursor(delta, len);
        if self.state.tab == Tab::Config {
            let selected = config_rows(self.deck.store())
                .get(self.state.cursor())
                .map(|server| server.id.clone());
            if let Some(id) = selected {
                let result = self.editor.select(self.deck.store(), &id);
                self.report(result);
            }
        }
        if self.state.tab == Tab::Vault {
            self.state.revealed = None;
        }
    }

    fn cycle_project(&mut self) {
        let store = self.deck.store();
        let projects = store.projects();
        let current = projects
            .iter()
            .position(|p| p.id == store.active_project().id)
            .unwrap_or(0);
        let next = projects[(current + 1) % projects.len()].id.clone();
        let result = self.deck.apply(|store| store.select_project(&next));
        self.report(result);
    }

    fn activate(&mut self) {
        let cursor = self.state.cursor();
        match self.state.tab {
            Tab::Dashboard => {
                let id = dashboard_rows(self.deck.store())
                    .get(cursor)
                    .map(|row| row.server.id.clone());
                if let Some(id) = id {
                    self.deck.apply(|store| store.toggle_install(&id));
                }
            }
            Tab::Marketplace => {
                let id = {
                    let (servers, _) = marketplace_rows(self.deck.store(), &self.state.search);
                    servers.get(cursor).map(|row| row.server.id.clone())
                };
                match id {
                    Some(id) => {
                        self.deck.apply(|store| store.toggle_install(&id));
                    }
                    None => self.deploy_selected(),
                }
            }
            Tab::Vault => self.reveal_selected_secret(),
            Tab::Config | Tab::Live => {}
        }
    }

    fn deploy_selected(&mut self) {
        let selected = {
            let (servers, blueprints) = marketplace_rows(self.deck.store(), &self.state.search);
            self.state
                .cursor()
                .checked_sub(servers.len())
                .and_then(|i| blueprints.get(i).copied())
        };
        let Some(blueprint) = selected else {
            return;
        };
        self.deck.apply(|store| store.deploy_blueprint(blueprint));
    }

    fn selected_secret_id(&self) -> Option<String> {
        self.deck
            .store()
            .vault()
            .secrets()
            .get(self.state.cursor())
            .map(|secret| secret.id.clone())
    }

    fn delete_selected_secret(&mut self) {
        if let Some(id) = self.selected_secret_id() {
            let result = self.deck.apply(|store| store.delete_secret(&id));
            self.report(result);
            self.state.revealed = None;
        }
    }

    fn reveal_selected_secret(&mut self) {
        let Some(id) = self.selected_secret_id() else {
            return;
        };
        if self.state.revealed.as_ref().is_some_and(|(shown, _)| *shown == id) {
            self.state.revealed = None;
            return;
        }
        let result = self.deck.apply(|store| store.reveal_secret(&id));
        match result {
            Ok(value) => self.state.revealed = Some((id, value)),
            Err(err) => self.post_error(err.to_string()),
        }
    }

    fn row_count(&self) -> usize {
        let store = self.deck.store();
        match self.state.tab {
            Tab::Dashboard => dashboard_rows(store).len(),
            Tab::Marketplace => {
                let (servers, blueprints) = marketplace_rows(store, &self.state.search);
                servers.len() + blueprints.len()
            }
            Tab::Config => config_rows(store).len(),
            Tab::Vault => store.vault().len(),
            Tab::Live => live_rows(store).len(),
        }
    }

    /// Re-derives view state after the store may have changed.
    fn settle(&mut self) {
        if self.state.mode != Mode::RawEdit {
            self.editor.sync(self.deck.store());
        }
        let len = self.row_count();
        self.state.clamp_cursor(len);
    }

    fn report<T, E: Display>(&mut self, result: std::result::Result<T, E>) {
        if let Err(err) = result {
            self.post_error(err.to_string());
        }
    }

    fn post_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.deck.apply(|store| store.post_error(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::BufferState;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tokio::runtime::Handle;

    fn app() -> App {
        let config = Config::default();
        let deck = Deck::new(Store::seeded_with_rng(StdRng::seed_from_u64(3)), &config, Handle::current()).unwrap();
        App::new(deck, &config)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    fn notice(app: &App) -> Option<String> {
        app.deck().store().notice().map(|n| n.message.clone())
    }

    #[tokio::test]
    async fn dashboard_enter_uninstalls_the_selected_server() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        let active = app.deck().store().active_project();
        assert!(!active.is_installed("google-search-mcp"));
        assert_eq!(notice(&app).as_deref(), Some("Google Search removed from Main Workspace."));
    }

    #[tokio::test]
    async fn tab_and_project_cycling() {
        let mut app = app();
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.state().tab, Tab::Live);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.state().tab, Tab::Dashboard);

        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.deck().store().active_project_id(), "proj-web-dev");
        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.deck().store().active_project_id(), "proj-global");
    }

    #[tokio::test]
    async fn marketplace_search_then_deploy_blueprint() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "orchestrator");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state().search, "orchestrator");

        let (servers, blueprints) = marketplace_rows(app.deck().store(), "orchestrator");
        assert!(servers.is_empty());
        assert_eq!(blueprints.len(), 1);

        let before = app.deck().store().projects().len();
        press(&mut app, KeyCode::Char('b'));
        let store = app.deck().store();
        assert_eq!(store.projects().len(), before + 1);
        assert_eq!(store.active_project().name, "Fullstack Orchestrator");
    }

    #[tokio::test]
    async fn raw_edit_commit_and_abandon() {
        let mut app = app();
        for _ in 0..2 {
            press(&mut app, KeyCode::Tab);
        }
        assert_eq!(app.editor().selected(), Some("google-search-mcp"));

        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.state().mode, Mode::RawEdit);
        for _ in 0..app.editor().text().len() {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, r#"{"command":"uvx","args":["search"]}"#);
        assert!(matches!(app.editor().state(), BufferState::Valid(_)));
        app.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        assert_eq!(app.state().mode, Mode::Normal);
        let server = app.deck().store().server("google-search-mcp").unwrap();
        assert_eq!(server.config.command, "uvx");

        press(&mut app, KeyCode::Char('e'));
        type_text(&mut app, "garbage");
        app.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        assert_eq!(app.state().mode, Mode::RawEdit);
        assert_eq!(notice(&app).as_deref(), Some("Cannot save invalid JSON configuration"));

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state().mode, Mode::Normal);
        assert!(!app.editor().is_dirty());
    }

    #[tokio::test]
    async fn vault_add_reveal_and_delete() {
        let mut app = app();
        for _ in 0..3 {
            press(&mut app, KeyCode::Tab);
        }
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "openai_key");
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "sk-test");
        press(&mut app, KeyCode::Enter);

        let vault = app.deck().store().vault();
        assert_eq!(vault.len(), 3);
        assert!(vault.contains_key("OPENAI_KEY"));

        press(&mut app, KeyCode::Char('r'));
        assert_eq!(
            app.state().revealed.as_ref().map(|(_, v)| v.as_str()),
            Some("AIzaSyC...")
        );

        press(&mut app, KeyCode::Char('x'));
        let vault = app.deck().store().vault();
        assert_eq!(vault.len(), 2);
        assert!(!vault.contains_key("GOOGLE_API_KEY"));
        assert!(app.state().revealed.is_none());
    }

    #[tokio::test]
    async fn blank_project_name_posts_an_error() {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "   ");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.deck().store().projects().len(), 2);
        let store = app.deck().store();
        assert_eq!(store.notice().map(|n| n.kind), Some(crate::store::NoticeKind::Error));
    }

    #[tokio::test]
    async fn status_bar_carries_the_configured_client() {
        let mut config = Config::default();
        config.ui.auto_update = false;
        let deck = Deck::new(Store::seeded(), &config, Handle::current()).unwrap();
        let app = App::new(deck, &config);
        assert_eq!(app.state().status_client, "client gemini");
    }

    #[tokio::test]
    async fn q_quits_only_outside_prompts() {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.state().should_quit);
        assert_eq!(app.state().input, "q");
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.state().should_quit);
    }
}
