//! Test-suite integration.
//!
//! A [`Module`] is configured once per suite with a router factory and
//! hands out a fresh, fully wired [`Connector`] for every test case, so
//! no request or buffered output survives from one case into the next.

use tracing::debug;

use crate::config::{ConfigError, HarnessConfig};
use crate::connector::{Connector, Router};
use crate::logging;
use crate::message::{Response, Result, ServerRequest};
use crate::output::OutputSink;

/// Builds the router for a test case.
pub type RouterFactory = Box<dyn Fn() -> Box<dyn Router>>;

/// Suite-level harness module.
pub struct Module {
    config: HarnessConfig,
    router_factory: RouterFactory,
    output: OutputSink,
}

impl Module {
    /// Create a module with the given configuration and router factory.
    ///
    /// Installs the JSON log subscriber as a side effect (idempotent).
    pub fn new(config: HarnessConfig, router_factory: RouterFactory) -> Self {
        logging::init(&config.logging);
        Self {
            config,
            router_factory,
            output: OutputSink::new(),
        }
    }

    /// Module configured from environment variables.
    pub fn from_env(router_factory: RouterFactory) -> std::result::Result<Self, ConfigError> {
        HarnessConfig::from_env().map(|config| Self::new(config, router_factory))
    }

    /// The process-wide output sink shared by process-bound templates.
    pub fn output(&self) -> &OutputSink {
        &self.output
    }

    /// Build a fresh connector for the next test case.
    pub fn begin_test(&self) -> Connector {
        debug!(
            global_environment = self.config.global_environment,
            "starting test case"
        );

        let mut connector = Connector::new();
        let mut router = (self.router_factory)();
        connector.set_router(
            move |request: ServerRequest, response: Response| -> Result<Response> {
                router.handle(request, response)
            },
        );
        if self.config.global_environment {
            connector.use_global_environment(self.output.clone());
        }
        connector
    }
}
