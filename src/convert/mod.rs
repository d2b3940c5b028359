//! Message conversion engines.
//!
//! - [`RequestConvertor`] - harness request + base template → canonical
//!   server request
//! - [`ResponseConvertor`] - canonical response → harness response

mod request;
mod response;

pub use request::RequestConvertor;
pub use response::ResponseConvertor;
