//! Simulated-call connector: base-template lifecycle and dispatch.
//!
//! The connector owns the mutable base request/response templates, keeps
//! them fresh across simulated calls, and sequences one call: reset →
//! request conversion → routing → response conversion. It assumes exactly
//! one in-flight simulated call at a time; concurrent test execution gets
//! one connector per test instead of locking.

use tracing::debug;

use crate::convert::{RequestConvertor, ResponseConvertor};
use crate::harness::{HarnessRequest, HarnessResponse};
use crate::message::{Error, Response, Result, ServerRequest, Template};
use crate::output::OutputSink;

/// Routing collaborator: consumes a canonical request and a base
/// response, produces the canonical response. Opaque and synchronous;
/// whatever it raises propagates unchanged.
pub trait Router {
    fn handle(&mut self, request: ServerRequest, response: Response) -> Result<Response>;
}

impl<F> Router for F
where
    F: FnMut(ServerRequest, Response) -> Result<Response>,
{
    fn handle(&mut self, request: ServerRequest, response: Response) -> Result<Response> {
        self(request, response)
    }
}

/// Bridge between the simulated browser client and the routing boundary.
pub struct Connector {
    router: Option<Box<dyn Router>>,
    base_request: Option<ServerRequest>,
    base_response: Option<Response>,
    request_convertor: RequestConvertor,
    response_convertor: ResponseConvertor,
    global_environment: Option<OutputSink>,
}

impl Connector {
    /// Connector with no router and plain lazy defaults.
    pub fn new() -> Self {
        Self {
            router: None,
            base_request: None,
            base_response: None,
            request_convertor: RequestConvertor::new(),
            response_convertor: ResponseConvertor::new(),
            global_environment: None,
        }
    }

    /// Set the router collaborator.
    pub fn set_router<R: Router + 'static>(&mut self, router: R) {
        self.router = Some(Box::new(router));
    }

    /// Whether a router has been configured.
    pub fn has_router(&self) -> bool {
        self.router.is_some()
    }

    /// Make lazily materialized base templates process-bound, with the
    /// response body capturing `sink`.
    pub fn use_global_environment(&mut self, sink: OutputSink) {
        self.global_environment = Some(sink);
    }

    /// The output sink, when the global environment is in use.
    pub fn global_environment(&self) -> Option<&OutputSink> {
        self.global_environment.as_ref()
    }

    /// Current base request template, lazily materialized.
    pub fn base_request(&mut self) -> &ServerRequest {
        let global = self.global_environment.is_some();
        self.base_request.get_or_insert_with(|| {
            if global {
                ServerRequest::process_bound()
            } else {
                ServerRequest::new()
            }
        })
    }

    /// Install a base request template.
    ///
    /// A process-bound template that already reports itself stale was
    /// captured after being consumed; installing it would silently replay
    /// invalid state, so it is rejected.
    pub fn set_base_request(&mut self, request: ServerRequest) -> Result<()> {
        if request.is_stale() {
            return Err(Error::StaleBaseRequest);
        }
        self.base_request = Some(request);
        Ok(())
    }

    /// Current base response template, lazily materialized.
    pub fn base_response(&mut self) -> &Response {
        let sink = self.global_environment.clone();
        self.base_response.get_or_insert_with(|| match sink {
            Some(sink) => Response::process_bound(sink),
            None => Response::new(),
        })
    }

    /// Install a base response template. Rejects stale templates, same
    /// as [`set_base_request`](Connector::set_base_request).
    pub fn set_base_response(&mut self, response: Response) -> Result<()> {
        if response.is_stale() {
            return Err(Error::StaleBaseResponse);
        }
        self.base_response = Some(response);
        Ok(())
    }

    /// The request convertor in use.
    pub fn request_convertor(&self) -> &RequestConvertor {
        &self.request_convertor
    }

    /// Replace the request convertor.
    pub fn set_request_convertor(&mut self, convertor: RequestConvertor) {
        self.request_convertor = convertor;
    }

    /// The response convertor in use.
    pub fn response_convertor(&self) -> &ResponseConvertor {
        &self.response_convertor
    }

    /// Replace the response convertor.
    pub fn set_response_convertor(&mut self, convertor: ResponseConvertor) {
        self.response_convertor = convertor;
    }

    /// Bring the base templates back to a fresh state.
    ///
    /// Stale process-bound templates are revived; plain templates are
    /// left untouched. A base response body backed by the output-capture
    /// stream is additionally replaced with a fresh clone, so output
    /// buffered by a previous call cannot leak into the next.
    pub fn reset(&mut self) {
        if let Some(request) = &self.base_request {
            if request.is_stale() {
                debug!("reviving stale base request");
                self.base_request = Some(request.revive());
            }
        }

        if let Some(response) = &self.base_response {
            let mut response = if response.is_stale() {
                debug!("reviving stale base response");
                response.revive()
            } else {
                response.clone()
            };

            if response.body().is_output_capture() {
                let fresh = response.body().clone_fresh();
                response = response.with_body(fresh);
            }

            self.base_response = Some(response);
        }
    }

    /// Run one simulated call.
    ///
    /// Fails with [`Error::RouterNotSet`] before any conversion when no
    /// router is configured. Routing failures propagate unchanged.
    pub fn handle(&mut self, request: &HarnessRequest) -> Result<HarnessResponse> {
        if self.router.is_none() {
            return Err(Error::RouterNotSet);
        }

        self.reset();

        debug!(method = %request.method(), uri = request.uri(), "dispatching simulated call");

        let base_request = self.base_request().clone();
        let canonical_request = self.request_convertor.convert(request, &base_request)?;

        let base_response = self.base_response().clone();
        let canonical_response = match self.router.as_mut() {
            Some(router) => router.handle(canonical_request, base_response)?,
            None => return Err(Error::RouterNotSet),
        };

        Ok(self.response_convertor.convert(&canonical_response))
    }
}

impl Default for Connector {
    fn default() -> Self {
        Self::new()
    }
}
