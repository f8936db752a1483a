//! Cookie parsing and `Set-Cookie` construction for the two credentials.

use axum::http::{HeaderMap, HeaderValue, header};

use crate::jwt::{ACCESS_TOKEN_DURATION_SECS, REFRESH_TOKEN_DURATION_SECS};

/// Cookie name for the access token (short-lived, 1 hour).
pub const ACCESS_COOKIE_NAME: &str = "token";

/// Cookie name for the refresh token (long-lived, 2 weeks).
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Extract a cookie value from the Cookie header.
///
/// Empty values count as absent.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|part| part.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

fn build_cookie(name: &str, value: &str, max_age: u64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}{}",
        name, value, max_age, secure
    )
}

/// `Set-Cookie` value carrying a new access credential.
fn access_cookie(token: &str, secure: bool) -> String {
    build_cookie(ACCESS_COOKIE_NAME, token, ACCESS_TOKEN_DURATION_SECS, secure)
}

/// `Set-Cookie` value carrying a new refresh credential.
fn refresh_cookie(token: &str, secure: bool) -> String {
    build_cookie(REFRESH_COOKIE_NAME, token, REFRESH_TOKEN_DURATION_SECS, secure)
}

/// Append `Set-Cookie` headers for a credential pair. The refresh cookie is
/// only written when a new refresh credential was issued.
pub fn append_credential_cookies(
    headers: &mut HeaderMap,
    access_token: &str,
    refresh_token: Option<&str>,
    secure: bool,
) {
    let mut cookies = vec![access_cookie(access_token, secure)];
    if let Some(refresh_token) = refresh_token {
        cookies.push(refresh_cookie(refresh_token, secure));
    }

    for cookie in cookies {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                headers.append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(error = %e, "Credential cookie is not a valid header value"),
        }
    }
}

/// Replace (or add) a cookie in the request's Cookie header so handlers
/// further down see the same credential the response is about to set.
pub fn replace_request_cookie(headers: &mut HeaderMap, name: &str, value: &str) {
    let mut parts: Vec<String> = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter(|part| {
            part.split_once('=')
                .map_or(true, |(key, _)| key.trim() != name)
        })
        .map(str::to_string)
        .collect();
    parts.push(format!("{}={}", name, value));

    match HeaderValue::from_str(&parts.join("; ")) {
        Ok(joined) => {
            headers.insert(header::COOKIE, joined);
        }
        Err(e) => tracing::warn!(error = %e, "Rewritten cookie header is not a valid header value"),
    }
}
