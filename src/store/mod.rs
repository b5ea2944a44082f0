mod error;
mod notice;
mod project;
mod store;
mod view;

pub use error::*;
pub use notice::*;
pub use project::*;
pub use store::*;
pub use view::*;
