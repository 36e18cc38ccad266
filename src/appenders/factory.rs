//! String-keyed appender construction
//!
//! New sinks plug in by registering a factory under a type name instead of
//! being known to the core.

use super::network_sink::{self, SinkClientFactory};
use crate::core::{LoggerError, Result, SharedAppender};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builds an appender from mapping-style options
pub trait AppenderFactory: Send + Sync {
    fn create(&self, options: &Value) -> Result<SharedAppender>;
}

impl<F> AppenderFactory for F
where
    F: Fn(&Value) -> Result<SharedAppender> + Send + Sync,
{
    fn create(&self, options: &Value) -> Result<SharedAppender> {
        self(options)
    }
}

#[derive(Clone, Default)]
pub struct AppenderFactories {
    factories: HashMap<String, Arc<dyn AppenderFactory>>,
}

impl AppenderFactories {
    /// Registry with no factories
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `console` and `file` registered, as enabled by features
    pub fn with_builtins() -> Self {
        #[allow(unused_mut)]
        let mut factories = Self::new();

        #[cfg(feature = "console")]
        factories.register("console", |options: &Value| -> Result<SharedAppender> {
            Ok(Arc::new(super::ConsoleAppender::configure(options)?))
        });

        #[cfg(feature = "file")]
        factories.register("file", |options: &Value| -> Result<SharedAppender> {
            Ok(Arc::new(super::FileAppender::configure(options)?))
        });

        factories
    }

    /// Register or replace the factory for `kind`
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: AppenderFactory + 'static,
    {
        self.factories.insert(kind.into(), Arc::new(factory));
    }

    /// Register `network-sink` backed by `clients`
    pub fn register_network_sink<C>(&mut self, clients: C)
    where
        C: SinkClientFactory + 'static,
    {
        self.register("network-sink", move |options: &Value| -> Result<SharedAppender> {
            Ok(Arc::new(network_sink::configure(options, &clients)?))
        });
    }

    /// Build an appender of type `kind`
    ///
    /// # Errors
    ///
    /// [`LoggerError::InvalidConfiguration`] for an unknown type, otherwise
    /// whatever the factory reports.
    pub fn create(&self, kind: &str, options: &Value) -> Result<SharedAppender> {
        let factory = self.factories.get(kind).ok_or_else(|| {
            LoggerError::config("appender", format!("no factory registered for type '{}'", kind))
        })?;
        factory.create(options)
    }

    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.factories.keys().cloned().collect();
        kinds.sort();
        kinds
    }
}

impl fmt::Debug for AppenderFactories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppenderFactories")
            .field("kinds", &self.kinds())
            .finish()
    }
}
