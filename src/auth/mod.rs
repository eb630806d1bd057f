//! Session-cookie authentication for staff.
//!
//! A staff member logs in with their email and password, receiving an
//! encrypted private cookie holding a [Token]. Protected routes run behind
//! [auth_guard]/[auth_guard_hx], which inject the authenticated staff ID as a
//! request extension so leaf handlers never consult ambient state for
//! identity.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod redirect;
mod token;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{auth_guard, auth_guard_hx};
pub use redirect::{build_log_in_redirect_url, normalize_redirect_url};
pub(super) use token::Token;

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;

#[cfg(test)]
pub(crate) use middleware::AuthState;
