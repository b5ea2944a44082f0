#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Dashboard,
    Marketplace,
    Config,
    Vault,
    Live,
}

impl Tab {
    pub const ALL: [Tab; 5] = [Tab::Dashboard, Tab::Marketplace, Tab::Config, Tab::Vault, Tab::Live];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Marketplace => "Marketplace",
            Tab::Config => "Config",
            Tab::Vault => "Vault",
            Tab::Live => "Live",
        }
    }

    pub fn index(self) -> usize {
        Tab::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    pub fn next(self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    pub fn prev(self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

/// Single-line input prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Search,
    ProjectName,
    SecretKey,
    SecretValue { key: String },
}

impl Prompt {
    pub fn label(&self) -> String {
        match self {
            Prompt::Search => "search".to_string(),
            Prompt::ProjectName => "new project name".to_string(),
            Prompt::SecretKey => "secret key".to_string(),
            Prompt::SecretValue { key } => format!("value for {}", key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Input(Prompt),
    RawEdit,
}

/// Cursor, mode and input buffers. Everything else is read from the store.
#[derive(Debug, Clone)]
pub struct AppState {
    pub should_quit: bool,
    pub tab: Tab,
    pub mode: Mode,
    pub input: String,
    pub search: String,
    pub revealed: Option<(String, String)>,
    pub status_build: String,
    pub status_client: String,
    cursors: [usize; 5],
}

impl AppState {
    pub fn new(status_build: String) -> Self {
        Self {
            should_quit: false,
            tab: Tab::Dashboard,
            mode: Mode::Normal,
            input: String::new(),
            search: String::new(),
            revealed: None,
            status_build,
            status_client: String::new(),
            cursors: [0; 5],
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursors[self.tab.index()]
    }

    /// Moves the current tab's cursor by `delta`, clamped to `len` rows.
    pub fn move_cursor(&mut self, delta: isize, len: usize) {
        let slot = &mut self.cursors[self.tab.index()];
        if len == 0 {
            *slot = 0;
            return;
        }
        let next = (*slot as isize + delta).clamp(0, len as isize - 1);
        *slot = next as usize;
    }

    /// Pulls the cursor back inside `len` rows after the list shrank.
    pub fn clamp_cursor(&mut self, len: usize) {
        let slot = &mut self.cursors[self.tab.index()];
        *slot = (*slot).min(len.saturating_sub(1));
    }

    pub fn begin_input(&mut self, prompt: Prompt) {
        self.input = match prompt {
            Prompt::Search => self.search.clone(),
            _ => String::new(),
        };
        self.mode = Mode::Input(prompt);
    }

    pub fn end_input(&mut self) -> String {
        self.mode = Mode::Normal;
        std::mem::take(&mut self.input)
    }
}
