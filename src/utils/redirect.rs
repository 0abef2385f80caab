// src/utils/redirect.rs

use url::Url;

pub const DEFAULT_REDIRECT: &str = "/dashboard";

/// Picks where to send the client after login.
///
/// `next` is honoured only when it is a local path or an http(s) URL on the
/// same host the request arrived at.
pub fn safe_redirect_target(next: Option<&str>, request_host: Option<&str>) -> String {
    let Some(next) = next.map(str::trim).filter(|n| !n.is_empty()) else {
        return DEFAULT_REDIRECT.to_string();
    };

    if next.chars().any(char::is_control) {
        return DEFAULT_REDIRECT.to_string();
    }

    if next.starts_with('/') {
        if next.starts_with("//") || next.starts_with("/\\") {
            return DEFAULT_REDIRECT.to_string();
        }
        return next.to_string();
    }

    match (Url::parse(next), request_host) {
        (Ok(url), Some(host)) if matches!(url.scheme(), "http" | "https") => {
            let authority = match (url.host_str(), url.port()) {
                (Some(h), Some(p)) => format!("{}:{}", h, p),
                (Some(h), None) => h.to_string(),
                (None, _) => return DEFAULT_REDIRECT.to_string(),
            };
            if authority.eq_ignore_ascii_case(host) {
                url.to_string()
            } else {
                DEFAULT_REDIRECT.to_string()
            }
        }
        _ => DEFAULT_REDIRECT.to_string(),
    }
}
