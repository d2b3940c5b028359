//! Harness request to canonical request conversion.

use http::{Method, Uri, Version};
use tracing::trace;

use crate::harness::{HarnessRequest, ParamList};
use crate::message::{
    headers_from_server_params, origin_form, BodyStream, Result, ServerRequest, Template,
};
use crate::query::{build_query, merge_params, parse_query};
use crate::upload::convert_uploaded_files;

/// Converts a harness request into a canonical server request, layered
/// onto a base template.
#[derive(Debug, Default)]
pub struct RequestConvertor;

impl RequestConvertor {
    pub fn new() -> Self {
        Self
    }

    /// Build a canonical request from `request` on top of `base`.
    ///
    /// The base template's binding decides how the raw server variables
    /// are applied: a process-bound template takes them as server
    /// parameters (merged over derived defaults), a plain template takes
    /// them as explicitly derived headers.
    pub fn convert(&self, request: &HarnessRequest, base: &ServerRequest) -> Result<ServerRequest> {
        let stream = self.create_stream(request);
        let (uri, query_params) = self.build_full_uri(request)?;

        let prepared = if base.is_process_bound() {
            let derived = self.determine_server_params(request, &uri, &query_params);
            let mut server_params: ParamList = request
                .server()
                .iter()
                .filter_map(|(key, value)| value.clone().map(|v| (key.clone(), v)))
                .collect();
            // Harness-supplied variables win over the derived defaults.
            for (key, value) in derived {
                if !server_params.iter().any(|(k, _)| *k == key) {
                    server_params.push((key, value));
                }
            }
            base.clone().with_server_params(server_params)
        } else {
            self.set_request_headers(base.clone(), request)
        };

        trace!(
            method = %request.method(),
            uri = %uri,
            query_params = query_params.len(),
            "converted harness request"
        );

        self.set_request_properties(prepared, request, stream, uri, query_params)
    }

    /// Fresh in-memory stream holding the raw body, positioned at 0.
    fn create_stream(&self, request: &HarnessRequest) -> BodyStream {
        BodyStream::from_bytes(request.content().clone())
    }

    /// Parse the harness URI and resolve the query-parameter mapping.
    ///
    /// For GET the explicit parameters are merged over the parsed query
    /// (explicit wins on collision) and the URI query is rebuilt from the
    /// merged mapping, normalizing its encoding even when no explicit
    /// parameters were given. Other methods leave the URI untouched;
    /// their explicit parameters become body parameters instead.
    fn build_full_uri(&self, request: &HarnessRequest) -> Result<(Uri, ParamList)> {
        let uri: Uri = request.uri().parse()?;
        let mut query_params = parse_query(uri.query().unwrap_or(""));

        if request.method() == Method::GET {
            query_params = merge_params(&query_params, request.parameters());
            let uri = replace_query(&uri, &build_query(&query_params))?;
            return Ok((uri, query_params));
        }

        Ok((uri, query_params))
    }

    /// Derive headers from the raw server variables onto a plain base
    /// template. Null-valued entries are skipped.
    fn set_request_headers(&self, base: ServerRequest, request: &HarnessRequest) -> ServerRequest {
        let raw: ParamList = request
            .server()
            .iter()
            .filter_map(|(key, value)| value.clone().map(|v| (key.clone(), v)))
            .collect();

        let mut prepared = base;
        for (name, value) in headers_from_server_params(&raw) {
            prepared = prepared.with_header(name, value);
        }
        prepared
    }

    /// Server variables derivable from the request itself. The harness's
    /// own variables take precedence over these.
    fn determine_server_params(
        &self,
        request: &HarnessRequest,
        uri: &Uri,
        query_params: &ParamList,
    ) -> ParamList {
        vec![
            ("REQUEST_METHOD".to_string(), request.method().to_string()),
            ("QUERY_STRING".to_string(), build_query(query_params)),
            ("REQUEST_URI".to_string(), origin_form(uri)),
        ]
    }

    /// Layer the structural fields and the parsed body onto the prepared
    /// template.
    fn set_request_properties(
        &self,
        prepared: ServerRequest,
        request: &HarnessRequest,
        stream: BodyStream,
        uri: Uri,
        query_params: ParamList,
    ) -> Result<ServerRequest> {
        let parsed_body = if request.method() != Method::GET && !request.parameters().is_empty() {
            Some(request.parameters().clone())
        } else {
            None
        };

        Ok(prepared
            .with_protocol_version(Version::HTTP_11)
            .with_body(stream)
            .with_method(request.method().clone())
            .with_request_target(origin_form(&uri))
            .with_cookie_params(request.cookies().clone())
            .with_uri(uri)
            .with_query_params(query_params)
            .with_parsed_body(parsed_body)
            .with_uploaded_files(convert_uploaded_files(request.files())?))
    }
}

/// Rebuild a URI with a replacement query string, keeping scheme,
/// authority and path.
fn replace_query(uri: &Uri, query: &str) -> Result<Uri> {
    let mut rebuilt = String::new();
    if let Some(scheme) = uri.scheme_str() {
        rebuilt.push_str(scheme);
        rebuilt.push_str("://");
    }
    if let Some(authority) = uri.authority() {
        rebuilt.push_str(authority.as_str());
    }
    rebuilt.push_str(uri.path());
    if !query.is_empty() {
        rebuilt.push('?');
        rebuilt.push_str(query);
    }
    Ok(rebuilt.parse()?)
}
