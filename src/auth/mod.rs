//! Credential transport.
//!
//! Dual-token system: a short-lived access token (1 hour) and a long-lived
//! refresh token (2 weeks), each in its own HttpOnly, SameSite=Strict cookie.

mod cookie;

pub use cookie::{
    ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME, append_credential_cookies, get_cookie,
    replace_request_cookie,
};
