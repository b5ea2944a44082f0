mod editor;
mod manifest;

pub use editor::*;
pub use manifest::*;
