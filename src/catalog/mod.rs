mod seed;
mod types;

pub use seed::*;
pub use types::*;
