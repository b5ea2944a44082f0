mod controller;
mod render;
mod state;
mod theme;

pub use controller::*;
pub use render::pad;
pub use state::*;
pub use theme::*;
