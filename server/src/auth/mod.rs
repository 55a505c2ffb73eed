//! Password hashing, login sessions and the extractors that resolve them.

pub mod extract;
pub mod password;
pub mod session;

pub use extract::{CurrentUser, MaybeUser};
pub use session::SessionStore;
