mod event;
mod simulator;

pub use event::*;
pub use simulator::*;
