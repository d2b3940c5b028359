//! Canonical HTTP message types.
//!
//! The immutable request/response representation consumed and produced at
//! the routing boundary:
//!
//! - [`ServerRequest`] - canonical request with value-semantics setters
//! - [`Response`] - canonical response, status optional until set
//! - [`BodyStream`] - in-memory or output-capture message body
//! - [`Template`] - staleness capability of base templates
//! - [`Error`] - engine error types

mod error;
mod request;
mod response;
mod stream;
mod template;

pub use error::{Error, Result};
pub use request::{headers_from_server_params, origin_form, ServerRequest};
pub use response::Response;
pub use stream::BodyStream;
pub use template::Template;
