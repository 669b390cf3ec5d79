use axum::http::{HeaderMap, HeaderName};

/// Request id stored in request extensions by the ingress middleware.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XRequestId(pub String);

impl XRequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read the id from the `x-request-id` header, if present and printable.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(request_id_header())
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(|s| Self(s.to_owned()))
    }
}

pub fn request_id_header() -> HeaderName {
    HeaderName::from_static("x-request-id")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_id_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(XRequestId::from_headers(&headers), None);

        headers.insert(request_id_header(), HeaderValue::from_static("abc123"));
        let rid = XRequestId::from_headers(&headers).unwrap();
        assert_eq!(rid.as_str(), "abc123");
    }

    #[test]
    fn empty_header_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(request_id_header(), HeaderValue::from_static(""));
        assert_eq!(XRequestId::from_headers(&headers), None);
    }
}
