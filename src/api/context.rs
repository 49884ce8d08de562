use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use uuid::Uuid;

/// Per-request state: the incoming request plus the response head handlers fill in
#[derive(Debug)]
pub struct HttpContext {
    request_id: Uuid,
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Bytes,
    status: Option<StatusCode>,
    response_headers: HeaderMap,
}

impl HttpContext {
    pub fn new(method: Method, path: impl Into<String>, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            method,
            path: path.into(),
            headers,
            body,
            status: None,
            response_headers: HeaderMap::new(),
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Declared body length; a missing or non-numeric header counts as zero
    pub fn content_length(&self) -> usize {
        self.headers
            .get(header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0)
    }

    /// The request body, limited to the declared content length
    pub fn read_body(&self) -> &[u8] {
        let length = self.content_length().min(self.body.len());
        &self.body[..length]
    }

    pub fn send_response(&mut self, status: StatusCode) {
        if let Some(previous) = self.status.replace(status) {
            log::warn!(
                "[{}] response status changed from {} to {}",
                self.request_id,
                previous,
                status
            );
        }
    }

    pub fn send_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.response_headers.insert(name, value);
    }

    /// Shorthand for the `text/html` content type every page handler uses
    pub fn send_html_header(&mut self) {
        self.send_header(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
    }

    /// Status chosen by the handler, `200 OK` when it never picked one
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn into_response_head(self) -> (StatusCode, HeaderMap) {
        (self.status(), self.response_headers)
    }
}
