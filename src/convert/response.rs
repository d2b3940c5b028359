//! Canonical response to harness response conversion.

use http::HeaderMap;
use tracing::trace;

use crate::harness::{HarnessResponse, ParamList};
use crate::message::Response;

/// Converts a canonical response into the harness's flat response shape.
#[derive(Debug, Default)]
pub struct ResponseConvertor;

impl ResponseConvertor {
    pub fn new() -> Self {
        Self
    }

    /// Materialize the body, flatten the headers and default an unset
    /// status to 200.
    pub fn convert(&self, response: &Response) -> HarnessResponse {
        let status = response.status().map(|s| s.as_u16()).unwrap_or(200);
        let headers = flatten_headers(response.headers());
        let body = response.body().to_string();

        trace!(status, headers = headers.len(), "converted canonical response");

        HarnessResponse::new(status, headers, body)
    }
}

/// Flatten a multi-valued header map to one value per name, keeping the
/// last value of each list. Last-wins is a deliberate, tested tie-break.
fn flatten_headers(headers: &HeaderMap) -> ParamList {
    headers
        .keys()
        .filter_map(|name| {
            let value = headers
                .get_all(name)
                .iter()
                .last()
                .and_then(|v| v.to_str().ok())?;
            Some((name.as_str().to_string(), value.to_string()))
        })
        .collect()
}
