//! Sessions, log-in, log-out and registration.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod redirect;
mod register;
mod session;
mod token;

pub(crate) use cookie::DEFAULT_COOKIE_DURATION;
pub(crate) use cookie::reissue_auth_cookie;
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{auth_guard, auth_guard_hx};
pub use register::{get_register_page, post_register};
pub use session::SessionState;

#[cfg(test)]
pub(crate) use cookie::{COOKIE_TOKEN, set_auth_cookie};
