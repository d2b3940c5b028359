//! http_harness - bridge between a simulated-browser test harness and
//! canonical immutable HTTP messages.
//!
//! Functional tests drive application routing logic without a real
//! network stack: the harness issues an untyped request description, this
//! crate turns it into a canonical server request, hands it to the
//! configured router, and turns the canonical response back into the
//! harness's flat response shape.
//!
//! # Architecture
//!
//! - [`convert::RequestConvertor`] / [`convert::ResponseConvertor`] -
//!   the two conversion engines
//! - [`connector::Connector`] - base-template lifecycle plus dispatch
//! - [`module::Module`] - per-test-case wiring for a suite
//!
//! Base templates may be *process-bound*: their state mirrors ambient
//! process state (superglobal-style server variables, the output
//! buffer). Such templates go stale after servicing one simulated call
//! and are revived on reset, so nothing leaks between test cases.
//!
//! # Example
//!
//! ```rust
//! use http_harness::connector::Connector;
//! use http_harness::harness::HarnessRequest;
//! use http_harness::message::{BodyStream, Response, Result, ServerRequest};
//! use http::{Method, StatusCode};
//!
//! let mut connector = Connector::new();
//! connector.set_router(
//!     |_request: ServerRequest, response: Response| -> Result<Response> {
//!         Ok(response
//!             .with_status(StatusCode::OK)
//!             .with_body(BodyStream::from_bytes("hello")))
//!     },
//! );
//!
//! let response = connector
//!     .handle(&HarnessRequest::new(Method::GET, "/hello"))
//!     .unwrap();
//! assert_eq!(response.status(), 200);
//! assert_eq!(response.body(), "hello");
//! ```

/// Package version from Cargo.toml
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod connector;
pub mod convert;
pub mod harness;
pub mod logging;
pub mod message;
pub mod module;
pub mod output;
pub mod query;
pub mod upload;

// Re-exports for convenience
pub use connector::{Connector, Router};
pub use harness::{HarnessRequest, HarnessResponse};
pub use message::{Error, Response, Result, ServerRequest, Template};
