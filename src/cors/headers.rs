//! CORS response headers.

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, VARY,
};
use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::cors::origin::OriginPolicy;

pub const ALLOW_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS,PATCH";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization, X-Requested-With, Accept, Origin, \
     Access-Control-Request-Method, Access-Control-Request-Headers";
pub const MAX_AGE_SECS: &str = "86400";

/// The CORS header set decided for one request.
#[derive(Debug, Clone, Default)]
pub struct CorsHeaders {
    headers: HeaderMap,
    /// An origin was presented and refused.
    denied: bool,
}

const GRANT_HEADERS: [HeaderName; 5] = [
    ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_CREDENTIALS,
    ACCESS_CONTROL_MAX_AGE,
];

impl CorsHeaders {
    /// `*` plus the full grant, regardless of origin.
    pub fn permissive() -> Self {
        Self::granting(HeaderValue::from_static("*"))
    }

    /// Reflect an allowed origin, use `*` without one, withhold on deny.
    pub fn for_origin(policy: &OriginPolicy, origin: Option<&HeaderValue>) -> Self {
        let Some(origin) = origin else {
            return Self::granting(HeaderValue::from_static("*"));
        };

        // A non-UTF-8 origin cannot match any rule.
        let allowed = origin
            .to_str()
            .map(|o| policy.is_allowed(Some(o)))
            .unwrap_or(false);

        let mut cors = if allowed {
            Self::granting(origin.clone())
        } else {
            tracing::debug!(origin = ?origin, "Origin not allowed; withholding CORS grant");
            Self {
                headers: HeaderMap::new(),
                denied: true,
            }
        };
        cors.headers.insert(VARY, HeaderValue::from_static("Origin"));
        cors
    }

    fn granting(origin: HeaderValue) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE_SECS));
        Self {
            headers,
            denied: false,
        }
    }

    pub fn get(&self, name: HeaderName) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    pub fn is_granted(&self) -> bool {
        self.headers.contains_key(ACCESS_CONTROL_ALLOW_ORIGIN)
    }

    pub fn is_denied(&self) -> bool {
        self.denied
    }

    /// Add these headers to `target` without replacing values already there.
    ///
    /// Later stages set their headers first, so the first writer wins and
    /// `Vary` values accumulate. A denial is the exception: it removes any
    /// grant a handler or upstream set on its own.
    pub fn apply(&self, target: &mut HeaderMap) {
        if self.denied {
            for name in &GRANT_HEADERS {
                target.remove(name);
            }
        }
        for (name, value) in &self.headers {
            if name == VARY {
                let present = target
                    .get_all(VARY)
                    .iter()
                    .any(|v| v.as_bytes().eq_ignore_ascii_case(value.as_bytes()));
                if !present {
                    target.append(VARY, value.clone());
                }
            } else if !target.contains_key(name) {
                target.insert(name.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> OriginPolicy {
        OriginPolicy::from_patterns(["https://app.example.com"])
    }

    #[test]
    fn allowed_origin_is_reflected() {
        let origin = HeaderValue::from_static("https://app.example.com");
        let cors = CorsHeaders::for_origin(&policy(), Some(&origin));
        assert_eq!(cors.get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "https://app.example.com");
        assert_eq!(cors.get(ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(), "true");
        assert_eq!(cors.get(ACCESS_CONTROL_MAX_AGE).unwrap(), "86400");
        assert_eq!(cors.get(ACCESS_CONTROL_ALLOW_METHODS).unwrap(), ALLOW_METHODS);
        assert_eq!(cors.get(VARY).unwrap(), "Origin");
    }

    #[test]
    fn no_origin_gets_wildcard() {
        let cors = CorsHeaders::for_origin(&policy(), None);
        assert_eq!(cors.get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
        assert!(cors.get(VARY).is_none());
    }

    #[test]
    fn denied_origin_gets_no_grant() {
        let origin = HeaderValue::from_static("https://evil.test");
        let cors = CorsHeaders::for_origin(&policy(), Some(&origin));
        assert!(!cors.is_granted());
        assert!(cors.is_denied());
        assert!(cors.get(ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());
        assert_eq!(cors.get(VARY).unwrap(), "Origin");
    }

    #[test]
    fn apply_keeps_existing_values() {
        let mut target = HeaderMap::new();
        target.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("https::/mine"));
        target.insert(VARY, HeaderValue::from_static("Accept-Encoding"));

        let origin = HeaderValue::from_static("https://app.example.com");
        let cors = CorsHeaders::for_origin(&policy(), Some(&origin));
        cors.apply(&mut target);
        cors.apply(&mut target);

        assert_eq!(target.get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "https::/mine");
        assert_eq!(target.get_all(VARY).iter().count(), 2);
        assert!(target.contains_key(ACCESS_CONTROL_MAX_AGE));
    }

    #[test]
    fn denial_removes_grant_set_downstream() {
        let mut target = HeaderMap::new();
        target.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        target.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        target.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("600"));
        target.insert("x-coins-balance", HeaderValue::from_static("12"));

        let origin = HeaderValue::from_static("https://evil.test");
        CorsHeaders::for_origin(&policy(), Some(&origin)).apply(&mut target);

        assert!(target.get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert!(target.get(ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());
        assert!(target.get(ACCESS_CONTROL_MAX_AGE).is_none());
        assert_eq!(target.get("x-coins-balance").unwrap(), "12");
        assert_eq!(target.get(VARY).unwrap(), "Origin");
    }
}
