//! Request normalization.
//!
//! # Responsibilities
//! - Enforce the body size ceiling before any handler runs
//! - Parse JSON and URL-encoded bodies
//! - Keep the exact raw bytes next to the parsed form
//!
//! # Design Decisions
//! - Declared Content-Length over the limit is rejected before reading
//! - Raw bytes are retained even when parsing succeeds (signature checks)
//! - Unknown content types are not an error; only raw bytes are kept

use axum::body::{Body, Bytes};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap, Method, Request, Uri};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{DispatchError, HandlerError};

/// Body after normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    /// No bytes were sent.
    Empty,
    Json(Value),
    /// URL-encoded fields in wire order.
    Form(Vec<(String, String)>),
    /// Content type the normalizer does not parse.
    Unparsed,
}

impl ParsedBody {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ParsedBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// First value of a form field.
    pub fn form_field(&self, key: &str) -> Option<&str> {
        match self {
            ParsedBody::Form(fields) => fields
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

/// An inbound request with its body read, parsed and retained.
#[derive(Debug)]
pub struct NormalizedRequest {
    parts: Parts,
    raw_body: Bytes,
    body: ParsedBody,
    mount_prefix: String,
}

impl NormalizedRequest {
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    pub fn extensions(&self) -> &Extensions {
        &self.parts.extensions
    }

    /// Exact bytes received, byte-for-byte.
    pub fn raw_body(&self) -> &Bytes {
        &self.raw_body
    }

    pub fn body(&self) -> &ParsedBody {
        &self.body
    }

    /// Deserialize the JSON body into `T`. A mismatch is a 400.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        let value = self.body.as_json().cloned().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| {
            HandlerError::with_status(axum::http::StatusCode::BAD_REQUEST, e.to_string())
        })
    }

    /// Prefix of the group this request was dispatched to.
    pub fn mount_prefix(&self) -> &str {
        &self.mount_prefix
    }

    /// Path relative to the mount prefix, always starting with `/`.
    pub fn sub_path(&self) -> &str {
        let rest = self
            .path()
            .strip_prefix(self.mount_prefix.as_str())
            .unwrap_or(self.path());
        if rest.is_empty() {
            "/"
        } else {
            rest
        }
    }

    pub(crate) fn mounted_at(mut self, prefix: &str) -> Self {
        self.mount_prefix = prefix.to_string();
        self
    }

    pub fn into_parts(self) -> (Parts, Bytes, ParsedBody) {
        (self.parts, self.raw_body, self.body)
    }
}

/// Read, bound and parse the body of `req`.
pub async fn normalize(req: Request<Body>, limit: usize) -> Result<NormalizedRequest, DispatchError> {
    let (parts, body) = req.into_parts();

    let declared = parts
        .headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared.is_some_and(|len| len > limit as u64) {
        return Err(DispatchError::PayloadTooLarge { limit });
    }

    let raw_body = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            return Err(DispatchError::PayloadTooLarge { limit });
        }
        Err(e) => {
            return Err(DispatchError::BadRequest(format!(
                "failed to read request body: {e}"
            )));
        }
    };

    let body = parse_body(&parts.headers, &raw_body)?;

    Ok(NormalizedRequest {
        parts,
        raw_body,
        body,
        mount_prefix: String::new(),
    })
}

fn parse_body(headers: &HeaderMap, raw: &Bytes) -> Result<ParsedBody, DispatchError> {
    if raw.is_empty() {
        return Ok(ParsedBody::Empty);
    }

    match content_kind(headers) {
        ContentKind::Json => serde_json::from_slice(raw)
            .map(ParsedBody::Json)
            .map_err(|e| DispatchError::BadRequest(format!("Malformed JSON body: {e}"))),
        ContentKind::Form => Ok(ParsedBody::Form(
            form_urlencoded::parse(raw).into_owned().collect(),
        )),
        ContentKind::Other => Ok(ParsedBody::Unparsed),
    }
}

enum ContentKind {
    Json,
    Form,
    Other,
}

fn content_kind(headers: &HeaderMap) -> ContentKind {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return ContentKind::Other;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
    {
        ContentKind::Json
    } else if essence == "application/x-www-form-urlencoded" {
        ContentKind::Form
    } else {
        ContentKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(content_type: Option<&str>, body: impl Into<Body>) -> Request<Body> {
        let mut builder = Request::builder().method(Method::POST).uri("/api/coins/purchase");
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        builder.body(body.into()).unwrap()
    }

    #[tokio::test]
    async fn json_is_parsed_and_raw_bytes_kept() {
        let raw = br#"{ "amount": 10,  "currency": "coin" }"#;
        let req = normalize(
            request(Some("application/json; charset=utf-8"), Bytes::from_static(raw)),
            1024,
        )
        .await
        .unwrap();
        assert_eq!(req.body(), &ParsedBody::Json(json!({"amount": 10, "currency": "coin"})));
        assert_eq!(req.raw_body().as_ref(), &raw[..]);
    }

    #[tokio::test]
    async fn vendor_json_types_are_parsed() {
        let req = normalize(request(Some("application/vnd.api+json"), "[1,2]"), 1024)
            .await
            .unwrap();
        assert_eq!(req.body().as_json(), Some(&json!([1, 2])));
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let err = normalize(request(Some("application/json"), "{\"amount\":"), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::BadRequest(_)));
    }

    #[tokio::test]
    async fn form_fields_keep_order() {
        let req = normalize(
            request(Some("application/x-www-form-urlencoded"), "b=2&a=hello+world&b=3"),
            1024,
        )
        .await
        .unwrap();
        assert_eq!(
            req.body(),
            &ParsedBody::Form(vec![
                ("b".into(), "2".into()),
                ("a".into(), "hello world".into()),
                ("b".into(), "3".into()),
            ])
        );
        assert_eq!(req.body().form_field("b"), Some("2"));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let err = normalize(request(Some("application/json"), vec![b' '; 64]), 16)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::PayloadTooLarge { limit: 16 }));
    }

    #[tokio::test]
    async fn oversized_content_length_is_rejected_before_reading() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/ai-chat")
            .header(CONTENT_LENGTH, "999999")
            .body(Body::empty())
            .unwrap();
        let err = normalize(req, 1024).await.unwrap_err();
        assert!(matches!(err, DispatchError::PayloadTooLarge { .. }));
    }

    #[tokio::test]
    async fn empty_and_unknown_bodies() {
        let req = normalize(request(Some("application/json"), Body::empty()), 1024)
            .await
            .unwrap();
        assert_eq!(req.body(), &ParsedBody::Empty);

        let req = normalize(request(Some("text/plain"), "hello"), 1024).await.unwrap();
        assert_eq!(req.body(), &ParsedBody::Unparsed);
        assert_eq!(req.raw_body().as_ref(), b"hello");
    }

    #[tokio::test]
    async fn sub_path_is_relative_to_mount() {
        let req = normalize(request(None, Body::empty()), 1024)
            .await
            .unwrap()
            .mounted_at("/api/coins");
        assert_eq!(req.sub_path(), "/purchase");

        let req = normalize(request(None, Body::empty()), 1024)
            .await
            .unwrap()
            .mounted_at("/api/coins/purchase");
        assert_eq!(req.sub_path(), "/");
    }

    #[tokio::test]
    async fn typed_json_extraction() {
        #[derive(serde::Deserialize)]
        struct Purchase {
            amount: u32,
        }
        let req = normalize(request(Some("application/json"), r#"{"amount":5}"#), 1024)
            .await
            .unwrap();
        assert_eq!(req.json::<Purchase>().unwrap().amount, 5);
    }
}
