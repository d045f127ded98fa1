mod store;
mod types;

pub use store::{SessionStore, UserGuard};
pub use types::*;
