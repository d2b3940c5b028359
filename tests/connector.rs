//! End-to-end connector tests: a full simulated call through request
//! conversion, routing and response conversion, plus the cross-call
//! lifecycle guarantees.

use std::io::Write;
use std::sync::{Arc, Mutex};

use http::{HeaderName, HeaderValue, Method, StatusCode};

use http_harness::harness::{upload_err, FileDescriptor, FileField, HarnessRequest};
use http_harness::message::{BodyStream, Error, Response, Result, ServerRequest, Template};
use http_harness::output::OutputSink;
use http_harness::upload::UploadedFile;
use http_harness::Connector;

fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Router that records what it saw and answers from a canned closure.
struct RecordingRouter {
    seen: Arc<Mutex<Vec<ServerRequest>>>,
    respond: fn(Response) -> Result<Response>,
}

impl http_harness::Router for RecordingRouter {
    fn handle(&mut self, request: ServerRequest, response: Response) -> Result<Response> {
        self.seen.lock().unwrap().push(request);
        (self.respond)(response)
    }
}

fn recording_router(
    respond: fn(Response) -> Result<Response>,
) -> (RecordingRouter, Arc<Mutex<Vec<ServerRequest>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    (
        RecordingRouter {
            seen: seen.clone(),
            respond,
        },
        seen,
    )
}

#[test]
fn get_request_merges_explicit_parameters_into_query() {
    let (router, seen) = recording_router(|response| Ok(response.with_status(StatusCode::OK)));
    let mut connector = Connector::new();
    connector.set_router(router);

    let request = HarnessRequest::new(Method::GET, "http://www.example.com/foo?bar=1")
        .with_parameters(params(&[("color", "blue"), ("mood", "sunny")]));
    connector.handle(&request).unwrap();

    let seen = seen.lock().unwrap();
    let canonical = &seen[0];
    assert_eq!(
        canonical.query_params(),
        &params(&[("bar", "1"), ("color", "blue"), ("mood", "sunny")])
    );
    assert!(canonical.parsed_body().is_none());
    assert_eq!(
        canonical.uri().to_string(),
        "http://www.example.com/foo?bar=1&color=blue&mood=sunny"
    );
}

#[test]
fn post_request_separates_query_and_body_parameters() {
    let (router, seen) = recording_router(|response| Ok(response.with_status(StatusCode::OK)));
    let mut connector = Connector::new();
    connector.set_router(router);

    let request = HarnessRequest::new(Method::POST, "http://www.example.com/foo?bar=1")
        .with_parameters(params(&[("color", "blue"), ("mood", "sunny")]));
    connector.handle(&request).unwrap();

    let seen = seen.lock().unwrap();
    let canonical = &seen[0];
    assert_eq!(canonical.query_params(), &params(&[("bar", "1")]));
    assert_eq!(
        canonical.parsed_body(),
        Some(&params(&[("color", "blue"), ("mood", "sunny")]))
    );
    assert_eq!(canonical.uri().to_string(), "http://www.example.com/foo?bar=1");
}

#[test]
fn uploaded_files_keep_shape_order_and_identity() {
    let mut one = tempfile::NamedTempFile::new().unwrap();
    one.write_all(b"File Uno").unwrap();
    let mut two = tempfile::NamedTempFile::new().unwrap();
    two.write_all(b"File Dos").unwrap();
    let mut three = tempfile::NamedTempFile::new().unwrap();
    three.write_all(b"File Tres").unwrap();

    let prebuilt = UploadedFile::from_descriptor(&FileDescriptor::new("mock.txt", one.path()))
        .unwrap();
    let prebuilt_clone = prebuilt.clone();

    let (router, seen) = recording_router(|response| Ok(response.with_status(StatusCode::OK)));
    let mut connector = Connector::new();
    connector.set_router(router);

    let request = HarnessRequest::new(Method::POST, "/upload").with_files(vec![
        (
            "file".to_string(),
            FileField::Descriptor(
                FileDescriptor::new("one.txt", one.path()).with_media_type("text/plain"),
            ),
        ),
        (
            "more".to_string(),
            FileField::Group(vec![
                (
                    "0".to_string(),
                    FileField::Descriptor(FileDescriptor::new("two.txt", two.path())),
                ),
                (
                    "1".to_string(),
                    FileField::Descriptor(FileDescriptor::new("three.txt", three.path())),
                ),
            ]),
        ),
        ("mock".to_string(), FileField::Handle(prebuilt)),
        (
            "oops".to_string(),
            FileField::Descriptor(FileDescriptor::error_only(upload_err::NO_FILE)),
        ),
    ]);
    connector.handle(&request).unwrap();

    let seen = seen.lock().unwrap();
    let files = seen[0].uploaded_files();
    assert_eq!(files.len(), 4);

    let file = files[0].1.as_file().unwrap();
    assert_eq!(file.client_filename(), Some("one.txt"));
    assert_eq!(file.client_media_type(), Some("text/plain"));
    assert_eq!(file.stream().unwrap().to_string(), "File Uno");

    let group = files[1].1.as_group().unwrap();
    assert_eq!(group.len(), 2);
    assert_eq!(
        group[0].1.as_file().unwrap().stream().unwrap().to_string(),
        "File Dos"
    );
    assert_eq!(
        group[1].1.as_file().unwrap().stream().unwrap().to_string(),
        "File Tres"
    );

    assert!(files[2].1.as_file().unwrap().same_handle(&prebuilt_clone));
    assert_eq!(files[3].1.as_file().unwrap().error(), upload_err::NO_FILE);
}

#[test]
fn raw_server_variables_become_headers_on_plain_template() {
    let (router, seen) = recording_router(|response| Ok(response.with_status(StatusCode::OK)));
    let mut connector = Connector::new();
    connector.set_router(router);

    let request = HarnessRequest::new(Method::GET, "http://www.example.com/").with_server(vec![
        (
            "CONTENT_TYPE".to_string(),
            Some("application/json".to_string()),
        ),
        ("HTTP_REFERER".to_string(), Some("http://x".to_string())),
        ("HTTP_NOT_SET".to_string(), None),
    ]);
    connector.handle(&request).unwrap();

    let seen = seen.lock().unwrap();
    let headers = seen[0].headers();
    assert_eq!(headers.len(), 2);
    assert_eq!(headers.get("content-type").unwrap(), "application/json");
    assert_eq!(headers.get("referer").unwrap(), "http://x");
}

#[test]
fn response_flattening_takes_last_value_and_defaults_status() {
    fn respond(response: Response) -> Result<Response> {
        // No status set: the harness side must see 200.
        let name = HeaderName::from_static("set-cookie");
        Ok(response
            .with_added_header(name.clone(), HeaderValue::from_static("a"))
            .with_added_header(name, HeaderValue::from_static("b"))
            .with_body(BodyStream::from_bytes("hello body")))
    }

    let (router, _seen) = recording_router(respond);
    let mut connector = Connector::new();
    connector.set_router(router);

    let response = connector
        .handle(&HarnessRequest::new(Method::GET, "/"))
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.header("Set-Cookie"), Some("b"));
    assert_eq!(response.body(), "hello body");
}

#[test]
fn buffered_output_does_not_leak_between_calls() {
    let sink = OutputSink::new();

    let (router, _seen) = recording_router(|response| Ok(response.with_status(StatusCode::OK)));
    let mut connector = Connector::new();
    connector.use_global_environment(sink.clone());
    connector.set_router(router);

    connector.handle(&HarnessRequest::new(Method::GET, "/one")).unwrap();
    // The application writes through the ambient buffer during the call.
    sink.write(b"output of call one");

    let second = connector
        .handle(&HarnessRequest::new(Method::GET, "/two"))
        .unwrap();
    assert_eq!(second.body(), "");
}

#[test]
fn process_bound_templates_are_revived_across_calls() {
    let sink = OutputSink::new();

    let (router, seen) = recording_router(|response| Ok(response.with_status(StatusCode::OK)));
    let mut connector = Connector::new();
    connector.use_global_environment(sink);
    connector.set_router(router);

    connector.handle(&HarnessRequest::new(Method::GET, "/one")).unwrap();
    // Servicing the call consumed the base request template.
    assert!(connector.base_request().is_stale());

    connector.handle(&HarnessRequest::new(Method::GET, "/two")).unwrap();
    assert_eq!(seen.lock().unwrap().len(), 2);

    // Installing a consumed template is rejected.
    let stale = connector.base_request().clone();
    let _ = stale.clone().with_method(Method::POST);
    assert!(matches!(
        connector.set_base_request(stale),
        Err(Error::StaleBaseRequest)
    ));
}

#[test]
fn missing_router_fails_before_any_conversion() {
    let sink = OutputSink::new();
    let mut connector = Connector::new();
    connector.use_global_environment(sink.clone());

    let request = HarnessRequest::new(Method::GET, "http://www.example.com/foo?bar=1")
        .with_parameters(params(&[("color", "blue")]));

    assert!(matches!(
        connector.handle(&request),
        Err(Error::RouterNotSet)
    ));
    // No template was materialized, so the sink never started buffering.
    assert_eq!(sink.level(), 0);
}

#[test]
fn routing_failure_propagates_to_the_caller() {
    fn respond(_response: Response) -> Result<Response> {
        Err(Error::Routing("controller exploded".to_string()))
    }

    let (router, _seen) = recording_router(respond);
    let mut connector = Connector::new();
    connector.set_router(router);

    match connector.handle(&HarnessRequest::new(Method::GET, "/")) {
        Err(Error::Routing(msg)) => assert_eq!(msg, "controller exploded"),
        other => panic!("expected routing error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn cookies_and_body_reach_the_router() {
    let (router, seen) = recording_router(|response| Ok(response.with_status(StatusCode::OK)));
    let mut connector = Connector::new();
    connector.set_router(router);

    let request = HarnessRequest::new(Method::POST, "/submit")
        .with_cookies(params(&[("session", "abc123")]))
        .with_content("raw payload");
    connector.handle(&request).unwrap();

    let seen = seen.lock().unwrap();
    let canonical = &seen[0];
    assert_eq!(canonical.cookie_params(), &params(&[("session", "abc123")]));
    assert_eq!(canonical.body().to_string(), "raw payload");
}
