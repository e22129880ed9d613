use axum::http::{header, HeaderMap};

use crate::config::CookieConfig;

/// `Set-Cookie` value carrying the session token.
pub fn session_cookie(config: &CookieConfig, token: &str, max_age_secs: u64) -> String {
    let mut parts = vec![
        format!("{}={}", config.name, token),
        "HttpOnly".to_string(),
        "Path=/".to_string(),
        format!("Max-Age={}", max_age_secs),
    ];
    if config.secure {
        parts.push("Secure".to_string());
    }
    parts.push(format!("SameSite={}", config.same_site.as_str()));
    parts.join("; ")
}

pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;
            (key == name && !value.is_empty()).then(|| value.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn builds_secure_cross_site_cookie() {
        let cfg = CookieConfig::new("jwt".into(), true);
        let cookie = session_cookie(&cfg, "tok", 259_200);
        assert!(cookie.starts_with("jwt=tok"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=None"));
        assert!(cookie.contains("Max-Age=259200"));
    }

    #[test]
    fn dev_cookie_is_still_http_only() {
        let cfg = CookieConfig::new("jwt".into(), false);
        let cookie = session_cookie(&cfg, "tok", 60);
        assert!(cookie.contains("HttpOnly"));
        assert!(!cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
    }

    #[test]
    fn extracts_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; jwt=abc.def.ghi; other=1"),
        );
        assert_eq!(extract_cookie(&headers, "jwt").as_deref(), Some("abc.def.ghi"));
        assert_eq!(extract_cookie(&headers, "missing"), None);
    }

    #[test]
    fn empty_cookie_counts_as_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("jwt="));
        assert_eq!(extract_cookie(&headers, "jwt"), None);
    }
}
