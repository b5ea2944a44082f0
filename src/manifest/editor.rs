use thiserror::Error;

use crate::catalog::{ServerConfig, Skill};
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("no server selected")]
    NoSelection,
    #[error("server is not installed in the active project: {0}")]
    NotInstalled(String),
    #[error("cannot save invalid JSON configuration: {0}")]
    InvalidBuffer(String),
    #[error("cannot save an empty configuration")]
    EmptyBuffer,
    #[error("key must not be empty")]
    EmptyKey,
    #[error("skill name must not be empty")]
    EmptySkillName,
    #[error("no skill at index {0}")]
    SkillIndex(usize),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferState {
    Empty,
    Valid(ServerConfig),
    Invalid(String),
}

/// Raw JSON view plus structured edits over the config of one installed
/// server.
///
/// The raw text is validated on every change and is only written back by
/// [`ConfigEditor::commit`]. Structured edits commit immediately and then
/// re-derive the text from the store, dropping any uncommitted raw edits.
#[derive(Debug, Clone)]
pub struct ConfigEditor {
    selected: Option<String>,
    text: String,
    state: BufferState,
    dirty: bool,
}

impl ConfigEditor {
    /// Starts on the first installed server of the active project.
    pub fn new(store: &Store) -> Self {
        let mut editor = Self {
            selected: None,
            text: String::new(),
            state: BufferState::Empty,
            dirty: false,
        };
        editor.sync(store);
        editor
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn state(&self) -> &BufferState {
        &self.state
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            BufferState::Invalid(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn can_commit(&self) -> bool {
        self.selected.is_some() && matches!(self.state, BufferState::Valid(_))
    }

    pub fn select(&mut self, store: &Store, server_id: &str) -> Result<(), EditorError> {
        if store.server(server_id).is_none() {
            return Err(StoreError::ServerNotFound(server_id.to_string()).into());
        }
        if !store.active_project().is_installed(server_id) {
            return Err(EditorError::NotInstalled(server_id.to_string()));
        }
        self.selected = Some(server_id.to_string());
        self.reload(store);
        Ok(())
    }

    /// Keeps the selection if its server is still installed, otherwise moves
    /// to the first installed one; then re-derives the text.
    pub fn sync(&mut self, store: &Store) {
        let installed = store.installed_servers();
        let still_there = self
            .selected
            .as_deref()
            .map(|id| installed.iter().any(|s| s.id == id))
            .unwrap_or(false);
        if !still_there {
            self.selected = installed.first().map(|s| s.id.clone());
        }
        self.reload(store);
    }

    /// Drops uncommitted raw edits.
    pub fn revert(&mut self, store: &Store) {
        self.reload(store);
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.dirty = true;
        self.validate();
    }

    pub fn insert_char(&mut self, ch: char) {
        self.text.push(ch);
        self.dirty = true;
        self.validate();
    }

    pub fn backspace(&mut self) {
        self.text.pop();
        self.dirty = true;
        self.validate();
    }

    pub fn commit(&mut self, store: &mut Store) -> Result<(), EditorError> {
        let server_id = self.selected.clone().ok_or(EditorError::NoSelection)?;
        let config = match &self.state {
            BufferState::Valid(config) => config.clone(),
            BufferState::Empty => return Err(EditorError::EmptyBuffer),
            BufferState::Invalid(message) => {
                store.post_error("Cannot save invalid JSON configuration");
                return Err(EditorError::InvalidBuffer(message.clone()));
            }
        };
        store.update_server_config(&server_id, config)?;
        self.reload(store);
        Ok(())
    }

    pub fn set_env(&mut self, store: &mut Store, key: &str, value: &str) -> Result<(), EditorError> {
        if key.is_empty() {
            return Err(EditorError::EmptyKey);
        }
        let (server_id, config) = self.current_config(store)?;
        store.update_server_config(&server_id, config.set_env(key, value))?;
        self.reload(store);
        Ok(())
    }

    pub fn remove_env(&mut self, store: &mut Store, key: &str) -> Result<(), EditorError> {
        let (server_id, config) = self.current_config(store)?;
        store.update_server_config(&server_id, config.remove_env(key))?;
        self.reload(store);
        Ok(())
    }

    pub fn add_skill(&mut self, store: &mut Store, name: &str, description: &str) -> Result<(), EditorError> {
        if name.is_empty() {
            return Err(EditorError::EmptySkillName);
        }
        let server_id = self.selected.clone().ok_or(EditorError::NoSelection)?;
        let mut skills = self.current_skills(store, &server_id)?;
        skills.push(Skill::new(name, description));
        store.update_server_skills(&server_id, skills)?;
        self.reload(store);
        Ok(())
    }

    pub fn remove_skill(&mut self, store: &mut Store, index: usize) -> Result<(), EditorError> {
        let server_id = self.selected.clone().ok_or(EditorError::NoSelection)?;
        let mut skills = self.current_skills(store, &server_id)?;
        if index >= skills.len() {
            return Err(EditorError::SkillIndex(index));
        }
        skills.remove(index);
        store.update_server_skills(&server_id, skills)?;
        self.reload(store);
        Ok(())
    }

    pub fn set_override(&mut self, store: &mut Store, key: &str, value: &str) -> Result<(), EditorError> {
        if key.is_empty() {
            return Err(EditorError::EmptyKey);
        }
        let mut overrides = store.active_project().secrets.clone();
        overrides.insert(key.to_string(), value.to_string());
        store.update_project_secrets(overrides);
        self.sync(store);
        Ok(())
    }

    pub fn remove_override(&mut self, store: &mut Store, key: &str) -> Result<(), EditorError> {
        if key.is_empty() {
            return Err(EditorError::EmptyKey);
        }
        let mut overrides = store.active_project().secrets.clone();
        overrides.remove(key);
        store.update_project_secrets(overrides);
        self.sync(store);
        Ok(())
    }

    fn current_config(&self, store: &Store) -> Result<(String, ServerConfig), EditorError> {
        let server_id = self.selected.clone().ok_or(EditorError::NoSelection)?;
        let config = store
            .server(&server_id)
            .map(|s| s.config.clone())
            .ok_or_else(|| StoreError::ServerNotFound(server_id.clone()))?;
        Ok((server_id, config))
    }

    fn current_skills(&self, store: &Store, server_id: &str) -> Result<Vec<Skill>, EditorError> {
        store
            .server(server_id)
            .map(|s| s.skills.clone())
            .ok_or_else(|| StoreError::ServerNotFound(server_id.to_string()).into())
    }

    fn reload(&mut self, store: &Store) {
        self.text = self
            .selected
            .as_deref()
            .and_then(|id| store.server(id))
            .map(|s| s.config.to_pretty_json())
            .unwrap_or_default();
        self.dirty = false;
        self.validate();
    }

    fn validate(&mut self) {
        self.state = if self.text.trim().is_empty() {
            BufferState::Empty
        } else {
            match serde_json::from_str::<ServerConfig>(&self.text) {
                Ok(config) => BufferState::Valid(config),
                Err(err) => BufferState::Invalid(err.to_string()),
            }
        };
    }
}
