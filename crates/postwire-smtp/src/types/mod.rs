//! Core SMTP types.

mod mechanism;
mod reply;

pub use mechanism::AuthMechanism;
pub use reply::{ReplyCode, Response, ResponseLine};
