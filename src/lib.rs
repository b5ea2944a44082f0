pub mod catalog;
pub mod config;
pub mod gateway;
pub mod manifest;
pub mod runtime;
pub mod shell;
pub mod store;
pub mod tui;
pub mod vault;
