use thiserror::Error;

/// Why a store mutation was refused. A refused mutation leaves the store
/// exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("server not found: {0}")]
    ServerNotFound(String),
    #[error("project not found: {0}")]
    ProjectNotFound(String),
    #[error("secret not found: {0}")]
    SecretNotFound(String),
    #[error("project name must not be empty")]
    EmptyProjectName,
    #[error("a store needs at least one project")]
    NoProjects,
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },
}
