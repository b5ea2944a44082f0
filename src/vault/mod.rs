mod vault;

pub use vault::*;
