pub mod event;
pub mod registration;
pub mod user;

pub use event::{Event, EventDetails, EventFilter};
pub use registration::{Registrant, Registration};
pub use user::{NewUser, User};
