//! Canonical immutable HTTP request.

use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri, Version};

use crate::harness::ParamList;
use crate::message::stream::BodyStream;
use crate::message::template::{Binding, Template};
use crate::upload::UploadNode;

/// Canonical server-side HTTP request.
///
/// Every mutator consumes and returns a new value; nothing is mutated in
/// place. A request is either *plain* (headers set explicitly) or
/// *process-bound* (headers derived automatically from the server
/// parameters, staleness tracked across clones).
#[derive(Clone, Debug)]
pub struct ServerRequest {
    version: Version,
    method: Method,
    request_target: Option<String>,
    uri: Uri,
    headers: HeaderMap,
    cookies: ParamList,
    query_params: ParamList,
    parsed_body: Option<ParamList>,
    uploaded_files: Vec<(String, UploadNode)>,
    body: BodyStream,
    server_params: ParamList,
    binding: Binding,
}

impl ServerRequest {
    /// Plain request with explicit headers and no staleness concept.
    pub fn new() -> Self {
        Self::with_binding(Binding::Plain)
    }

    /// Process-bound request: server parameters drive the header map and
    /// staleness is tracked.
    pub fn process_bound() -> Self {
        Self::with_binding(Binding::process_bound())
    }

    fn with_binding(binding: Binding) -> Self {
        Self {
            version: Version::HTTP_11,
            method: Method::GET,
            request_target: None,
            uri: Uri::from_static("/"),
            headers: HeaderMap::new(),
            cookies: Vec::new(),
            query_params: Vec::new(),
            parsed_body: None,
            uploaded_files: Vec::new(),
            body: BodyStream::empty(),
            server_params: Vec::new(),
            binding,
        }
    }

    fn consumed(mut self) -> Self {
        self.binding.consume();
        self
    }

    // Mutators (value semantics)

    /// Set the protocol version.
    pub fn with_protocol_version(self, version: Version) -> Self {
        let mut request = self.consumed();
        request.version = version;
        request
    }

    /// Set the method.
    pub fn with_method(self, method: Method) -> Self {
        let mut request = self.consumed();
        request.method = method;
        request
    }

    /// Set the request-target (origin-form, scheme/authority stripped).
    pub fn with_request_target(self, target: impl Into<String>) -> Self {
        let mut request = self.consumed();
        request.request_target = Some(target.into());
        request
    }

    /// Set the URI.
    pub fn with_uri(self, uri: Uri) -> Self {
        let mut request = self.consumed();
        request.uri = uri;
        request
    }

    /// Set a header, replacing any existing values for the name.
    pub fn with_header(self, name: HeaderName, value: HeaderValue) -> Self {
        let mut request = self.consumed();
        request.headers.insert(name, value);
        request
    }

    /// Append a header value, keeping existing ones.
    pub fn with_added_header(self, name: HeaderName, value: HeaderValue) -> Self {
        let mut request = self.consumed();
        request.headers.append(name, value);
        request
    }

    /// Set the cookie mapping.
    pub fn with_cookie_params(self, cookies: ParamList) -> Self {
        let mut request = self.consumed();
        request.cookies = cookies;
        request
    }

    /// Set the query-parameter mapping.
    pub fn with_query_params(self, query_params: ParamList) -> Self {
        let mut request = self.consumed();
        request.query_params = query_params;
        request
    }

    /// Set the parsed body, or clear it with `None`.
    pub fn with_parsed_body(self, parsed_body: Option<ParamList>) -> Self {
        let mut request = self.consumed();
        request.parsed_body = parsed_body;
        request
    }

    /// Set the uploaded-file tree.
    pub fn with_uploaded_files(self, uploaded_files: Vec<(String, UploadNode)>) -> Self {
        let mut request = self.consumed();
        request.uploaded_files = uploaded_files;
        request
    }

    /// Set the body stream.
    pub fn with_body(self, body: BodyStream) -> Self {
        let mut request = self.consumed();
        request.body = body;
        request
    }

    /// Set the server parameters. On a process-bound request the header
    /// map is re-derived from the parameters; explicit headers set before
    /// this call are replaced.
    pub fn with_server_params(self, server_params: ParamList) -> Self {
        let process_bound = self.binding.is_process_bound();
        let mut request = self.consumed();
        if process_bound {
            request.headers = HeaderMap::new();
            for (name, value) in headers_from_server_params(&server_params) {
                request.headers.append(name, value);
            }
        }
        request.server_params = server_params;
        request
    }

    // Accessors

    /// Protocol version.
    pub fn version(&self) -> Version {
        self.version
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request-target; falls back to the URI's origin-form.
    pub fn request_target(&self) -> String {
        match &self.request_target {
            Some(target) => target.clone(),
            None => origin_form(&self.uri),
        }
    }

    /// Full URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Header mapping.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Cookie mapping.
    pub fn cookie_params(&self) -> &ParamList {
        &self.cookies
    }

    /// Query-parameter mapping.
    pub fn query_params(&self) -> &ParamList {
        &self.query_params
    }

    /// Parsed body, present only for non-GET requests with parameters.
    pub fn parsed_body(&self) -> Option<&ParamList> {
        self.parsed_body.as_ref()
    }

    /// Uploaded-file tree.
    pub fn uploaded_files(&self) -> &[(String, UploadNode)] {
        &self.uploaded_files
    }

    /// Body stream.
    pub fn body(&self) -> &BodyStream {
        &self.body
    }

    /// Server parameters.
    pub fn server_params(&self) -> &ParamList {
        &self.server_params
    }

    /// Server parameter value by key.
    pub fn server_param(&self, key: &str) -> Option<&str> {
        self.server_params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl Default for ServerRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl Template for ServerRequest {
    fn is_process_bound(&self) -> bool {
        self.binding.is_process_bound()
    }

    fn is_stale(&self) -> bool {
        self.binding.is_stale()
    }

    fn revive(&self) -> Self {
        let mut request = self.clone();
        request.binding = self.binding.revived();
        request
    }
}

/// Origin-form of a URI: path plus query, scheme/authority/user-info
/// stripped.
pub fn origin_form(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.to_string())
        .unwrap_or_else(|| "/".to_string())
}

/// Derive header name/value pairs from CGI-style server parameters.
///
/// `HTTP_*` keys become header names with the prefix stripped and
/// underscores turned into hyphens; `CONTENT_TYPE`/`CONTENT_LENGTH` map
/// to their header equivalents; everything else is ignored. Entries whose
/// derived name or value is not a valid header are skipped.
pub fn headers_from_server_params(params: &[(String, String)]) -> Vec<(HeaderName, HeaderValue)> {
    params
        .iter()
        .filter_map(|(key, value)| {
            let name = match key.as_str() {
                "CONTENT_TYPE" => CONTENT_TYPE.clone(),
                "CONTENT_LENGTH" => CONTENT_LENGTH.clone(),
                _ => {
                    let stripped = key.strip_prefix("HTTP_")?;
                    HeaderName::try_from(stripped.to_ascii_lowercase().replace('_', "-")).ok()?
                }
            };
            let value = HeaderValue::try_from(value.as_str()).ok()?;
            Some((name, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> ParamList {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_with_setters_return_new_values() {
        let request = ServerRequest::new()
            .with_method(Method::POST)
            .with_uri(Uri::from_static("http://www.example.com/foo?bar=1"))
            .with_query_params(params(&[("bar", "1")]));

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.request_target(), "/foo?bar=1");
        assert_eq!(request.query_params(), &params(&[("bar", "1")]));
        assert!(request.parsed_body().is_none());
    }

    #[test]
    fn test_headers_from_server_params() {
        let derived = headers_from_server_params(&params(&[
            ("FOO", "BAR"),
            ("CONTENT_TYPE", "application/json"),
            ("HTTP_REFERER", "http://www.example.com"),
            ("HTTP_USER_AGENT", "Test/1.0"),
        ]));

        let names: Vec<String> = derived.iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, vec!["content-type", "referer", "user-agent"]);
        assert_eq!(derived[0].1, "application/json");
    }

    #[test]
    fn test_process_bound_server_params_drive_headers() {
        let request = ServerRequest::process_bound().with_server_params(params(&[
            ("REQUEST_METHOD", "GET"),
            ("HTTP_HOST", "www.example.com"),
            ("CONTENT_LENGTH", "42"),
        ]));

        assert_eq!(request.header("host"), Some("www.example.com"));
        assert_eq!(request.header("content-length"), Some("42"));
        assert_eq!(request.server_param("REQUEST_METHOD"), Some("GET"));
        // Non-header params do not leak into the header map.
        assert!(request.header("request-method").is_none());
    }

    #[test]
    fn test_plain_server_params_leave_headers_alone() {
        let request = ServerRequest::new()
            .with_header(
                HeaderName::from_static("x-prior"),
                HeaderValue::from_static("kept"),
            )
            .with_server_params(params(&[("HTTP_REFERER", "http://x")]));

        assert_eq!(request.header("x-prior"), Some("kept"));
        assert!(request.header("referer").is_none());
    }

    #[test]
    fn test_consuming_a_clone_marks_template_stale() {
        let template = ServerRequest::process_bound();
        assert!(!template.is_stale());

        let derived = template.clone().with_method(Method::POST);
        assert!(template.is_stale());
        assert!(!derived.is_stale());
    }

    #[test]
    fn test_revive_cycle() {
        let template = ServerRequest::process_bound();

        // Reviving a fresh template is a no-op.
        let revived = template.revive();
        assert!(!revived.is_stale());

        let _ = template.clone().with_method(Method::POST);
        assert!(template.is_stale());

        let revived = template.revive();
        assert!(!revived.is_stale());

        // Subsequent use transitions it back to stale.
        let _ = revived.clone().with_method(Method::PUT);
        assert!(revived.is_stale());
    }

    #[test]
    fn test_plain_request_has_no_staleness() {
        let request = ServerRequest::new();
        assert!(!request.is_process_bound());

        let _ = request.clone().with_method(Method::POST);
        assert!(!request.is_stale());
    }
}
