mod command;
mod shell;

pub use command::*;
pub use shell::*;
