//! Canonical immutable HTTP response.

use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};

use crate::message::stream::BodyStream;
use crate::message::template::{Binding, Template};
use crate::output::OutputSink;

/// Canonical HTTP response.
///
/// The status is optional: an unset status flattens to 200 at the
/// harness boundary. Mutators follow the same value semantics as
/// [`ServerRequest`](crate::message::ServerRequest).
#[derive(Clone, Debug)]
pub struct Response {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BodyStream,
    binding: Binding,
}

impl Response {
    /// Plain response with an in-memory body.
    pub fn new() -> Self {
        Self {
            status: None,
            headers: HeaderMap::new(),
            body: BodyStream::empty(),
            binding: Binding::Plain,
        }
    }

    /// Process-bound response whose body captures the output sink.
    ///
    /// Starts a buffering level on the sink, mirroring how binding to a
    /// real output buffer begins capturing.
    pub fn process_bound(sink: OutputSink) -> Self {
        sink.start();
        Self {
            status: None,
            headers: HeaderMap::new(),
            body: BodyStream::output_capture(sink),
            binding: Binding::process_bound(),
        }
    }

    fn consumed(mut self) -> Self {
        self.binding.consume();
        self
    }

    /// Set the status code.
    pub fn with_status(self, status: StatusCode) -> Self {
        let mut response = self.consumed();
        response.status = Some(status);
        response
    }

    /// Set a header, replacing any existing values for the name.
    pub fn with_header(self, name: HeaderName, value: HeaderValue) -> Self {
        let mut response = self.consumed();
        response.headers.insert(name, value);
        response
    }

    /// Append a header value, keeping existing ones.
    pub fn with_added_header(self, name: HeaderName, value: HeaderValue) -> Self {
        let mut response = self.consumed();
        response.headers.append(name, value);
        response
    }

    /// Set the body stream.
    pub fn with_body(self, body: BodyStream) -> Self {
        let mut response = self.consumed();
        response.body = body;
        response
    }

    /// Status code, `None` when unset.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Header mapping.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Body stream.
    pub fn body(&self) -> &BodyStream {
        &self.body
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Template for Response {
    fn is_process_bound(&self) -> bool {
        self.binding.is_process_bound()
    }

    fn is_stale(&self) -> bool {
        self.binding.is_stale()
    }

    fn revive(&self) -> Self {
        let mut response = self.clone();
        response.binding = self.binding.revived();
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_status_unset_by_default() {
        let response = Response::new();
        assert!(response.status().is_none());

        let response = response.with_status(StatusCode::NOT_FOUND);
        assert_eq!(response.status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_added_header_keeps_values() {
        let name = HeaderName::from_static("set-cookie");
        let response = Response::new()
            .with_added_header(name.clone(), HeaderValue::from_static("a"))
            .with_added_header(name.clone(), HeaderValue::from_static("b"));

        let values: Vec<&str> = response
            .headers()
            .get_all(&name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        assert_eq!(values, vec!["a", "b"]);
    }

    #[test]
    fn test_process_bound_body_captures_sink() {
        let sink = OutputSink::new();
        let response = Response::process_bound(sink.clone());

        assert!(response.is_process_bound());
        assert!(response.body().is_output_capture());
        assert_eq!(sink.level(), 1);

        sink.write(b"rendered page");
        assert_eq!(response.body().to_string(), "rendered page");
    }

    #[test]
    fn test_staleness_mirrors_request_protocol() {
        let template = Response::process_bound(OutputSink::new());
        let _ = template.clone().with_status(StatusCode::OK);
        assert!(template.is_stale());

        let revived = template.revive();
        assert!(!revived.is_stale());
    }

    #[test]
    fn test_plain_body_write() {
        let response = Response::new().with_body(BodyStream::empty());
        let mut body = response.body().clone();
        body.write_all(b"hello body").unwrap();
        assert_eq!(response.body().to_string(), "hello body");
    }
}
