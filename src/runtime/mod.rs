mod deck;
mod scheduler;

pub use deck::*;
pub use scheduler::*;
