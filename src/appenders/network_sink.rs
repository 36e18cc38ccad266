//! Adapter between the appender contract and a remote log-ingestion client
//!
//! The adapter owns no wire protocol. It renders each event, pulls an
//! optional tag list off the payload and hands `(message, tags, callback)`
//! to a [`SinkClient`]. The client invokes the callback once the remote
//! write finishes; the adapter never retries.
//!
//! With `awaitPendingWrites` (the default) shutdown waits until every write
//! handed to the client has called back. Without it, shutdown completes at
//! once and in-flight writes finish on their own.

use crate::core::{
    inspect, Appender, AppenderState, Completion, LayoutConfig, Lifecycle, LogEvent,
    LoggerError, Result, SharedLayout,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::borrow::Cow;
use std::sync::Arc;

/// Payload key that marks a trailing tag object
pub const TAGS_KEY: &str = "tags";

const COMPONENT: &str = "network-sink appender";

/// Called exactly once per [`SinkClient::log`] with the remote outcome
pub type WriteCallback = Box<dyn FnOnce(Result<()>) + Send + 'static>;

/// Client for a remote log-ingestion service
pub trait SinkClient: Send + Sync {
    /// Send one message; must not block on the remote write
    fn log(&self, message: Value, tags: Vec<String>, callback: WriteCallback);
}

/// Builds the client once per configured appender
pub trait SinkClientFactory: Send + Sync {
    fn create_client(&self, options: &NetworkSinkOptions) -> Result<Arc<dyn SinkClient>>;
}

impl<F> SinkClientFactory for F
where
    F: Fn(&NetworkSinkOptions) -> Result<Arc<dyn SinkClient>> + Send + Sync,
{
    fn create_client(&self, options: &NetworkSinkOptions) -> Result<Arc<dyn SinkClient>> {
        self(options)
    }
}

/// Options accepted by [`configure`]
///
/// `token` and `subdomain` identify the account and are required. `tags`
/// are account-level tags for the client; per-message tags come from the
/// payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSinkOptions {
    pub token: String,
    pub subdomain: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutConfig>,
    #[serde(default = "default_await_pending_writes")]
    pub await_pending_writes: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn default_await_pending_writes() -> bool {
    true
}

impl NetworkSinkOptions {
    fn validate(&self) -> Result<()> {
        for (field, value) in [("token", &self.token), ("subdomain", &self.subdomain)] {
            if value.trim().is_empty() {
                return Err(LoggerError::config(
                    COMPONENT,
                    format!("'{}' must not be empty", field),
                ));
            }
        }
        Ok(())
    }
}

/// Validate `options`, build the client once and bind an appender to it
///
/// # Errors
///
/// [`LoggerError::InvalidConfiguration`] when `token` or `subdomain` is
/// missing or empty, or the layout is invalid. Errors from the factory are
/// returned unchanged.
///
/// # Example
///
/// ```
/// use rust_log_dispatch::appenders::network_sink::{self, NetworkSinkOptions, SinkClient};
/// use rust_log_dispatch::core::Result;
/// use serde_json::json;
/// use std::sync::Arc;
///
/// let factory = |_: &NetworkSinkOptions| -> Result<Arc<dyn SinkClient>> {
///     unreachable!("never built for invalid options")
/// };
/// let err = network_sink::configure(&json!({"subdomain": "acme"}), &factory).err().unwrap();
/// assert!(err.to_string().contains("token"));
/// ```
pub fn configure(options: &Value, factory: &dyn SinkClientFactory) -> Result<NetworkSinkAppender> {
    let options: NetworkSinkOptions = serde_json::from_value(options.clone())
        .map_err(|e| LoggerError::config(COMPONENT, e.to_string()))?;
    options.validate()?;

    let layout = match &options.layout {
        Some(config) => config.build()?,
        None => LayoutConfig::default().build()?,
    };
    let client = factory.create_client(&options)?;

    Ok(NetworkSinkAppender {
        name: options
            .name
            .clone()
            .unwrap_or_else(|| "network-sink".to_string()),
        layout,
        client,
        await_pending_writes: options.await_pending_writes,
        shared: Arc::new(Shared::default()),
    })
}

/// Split a trailing tag object off `payload`
///
/// Only a last element that is an object whose sole key is [`TAGS_KEY`]
/// counts; its value may be an array or a single string. An object with
/// other keys beside `tags` is ordinary payload.
///
/// ```
/// use rust_log_dispatch::appenders::network_sink::extract_tags;
/// use serde_json::json;
///
/// let payload = vec![json!("Log event #1"), json!({"tags": ["t1", "t2"]})];
/// let (rest, tags) = extract_tags(&payload);
/// assert_eq!(rest, &payload[..1]);
/// assert_eq!(tags, vec!["t1", "t2"]);
/// ```
pub fn extract_tags(payload: &[Value]) -> (&[Value], Vec<String>) {
    let Some((Value::Object(last), rest)) = payload.split_last() else {
        return (payload, Vec::new());
    };
    if last.len() != 1 {
        return (payload, Vec::new());
    }

    let tags = match last.get(TAGS_KEY) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => inspect::inspect(other),
            })
            .collect(),
        Some(Value::String(tag)) => vec![tag.clone()],
        _ => return (payload, Vec::new()),
    };
    (rest, tags)
}

#[derive(Default)]
struct Pending {
    in_flight: usize,
    failed: u64,
    waiters: Vec<Completion>,
}

#[derive(Default)]
struct Shared {
    lifecycle: Lifecycle,
    pending: Mutex<Pending>,
}

impl Shared {
    fn settle(&self, appender: &str, result: Result<()>) {
        let waiters = {
            let mut pending = self.pending.lock();
            pending.in_flight = pending.in_flight.saturating_sub(1);
            if let Err(e) = &result {
                pending.failed += 1;
                eprintln!("[LOGGER ERROR] Appender '{}' remote write failed: {}", appender, e);
            }

            if pending.in_flight == 0 && self.lifecycle.state() == AppenderState::ShuttingDown {
                self.lifecycle.finish_shutdown();
                std::mem::take(&mut pending.waiters)
            } else {
                Vec::new()
            }
        };

        for done in waiters {
            done.complete(Ok(()));
        }
    }
}

/// One write handed to the client
///
/// Settles on drop if the client discards the callback without calling it.
struct PendingWrite {
    shared: Arc<Shared>,
    appender: String,
    settled: bool,
}

impl PendingWrite {
    fn settle(mut self, result: Result<()>) {
        self.settled = true;
        self.shared.settle(&self.appender, result);
    }
}

impl Drop for PendingWrite {
    fn drop(&mut self) {
        if !self.settled {
            self.settled = true;
            let error =
                LoggerError::appender_write(self.appender.clone(), "callback dropped without being called");
            self.shared.settle(&self.appender, Err(error));
        }
    }
}

/// Appender bound to one [`SinkClient`]
pub struct NetworkSinkAppender {
    name: String,
    layout: SharedLayout,
    client: Arc<dyn SinkClient>,
    await_pending_writes: bool,
    shared: Arc<Shared>,
}

impl NetworkSinkAppender {
    pub fn awaits_pending_writes(&self) -> bool {
        self.await_pending_writes
    }

    /// Writes handed to the client that have not called back yet
    pub fn in_flight(&self) -> usize {
        self.shared.pending.lock().in_flight
    }

    /// Writes whose callback reported a failure
    pub fn failed_writes(&self) -> u64 {
        self.shared.pending.lock().failed
    }

    pub fn state(&self) -> AppenderState {
        self.shared.lifecycle.state()
    }

    fn begin_write(&self) -> Result<PendingWrite> {
        let mut pending = self.shared.pending.lock();
        self.shared.lifecycle.ensure_open(&self.name)?;
        pending.in_flight += 1;
        Ok(PendingWrite {
            shared: Arc::clone(&self.shared),
            appender: self.name.clone(),
            settled: false,
        })
    }
}

impl Appender for NetworkSinkAppender {
    fn name(&self) -> &str {
        &self.name
    }

    fn append(&self, event: &LogEvent) -> Result<()> {
        let write = self.begin_write()?;

        let (payload, tags) = extract_tags(event.payload());
        let event = if payload.len() == event.payload().len() {
            Cow::Borrowed(event)
        } else {
            Cow::Owned(event.with_payload(payload.to_vec()))
        };

        let message = json!({
            "msg": self.layout.render(&event).into_value(),
            "level": event.level().to_str(),
            "category": event.category(),
        });

        self.client
            .log(message, tags, Box::new(move |result| write.settle(result)));
        Ok(())
    }

    fn shutdown(&self, done: Completion) {
        let ready = {
            let mut pending = self.shared.pending.lock();
            match self.shared.lifecycle.begin_shutdown() {
                AppenderState::Configured
                    if self.await_pending_writes && pending.in_flight > 0 =>
                {
                    pending.waiters.push(done);
                    None
                }
                AppenderState::ShuttingDown => {
                    // Already draining; complete together with the first request.
                    pending.waiters.push(done);
                    None
                }
                _ => {
                    self.shared.lifecycle.finish_shutdown();
                    Some(done)
                }
            }
        };

        if let Some(done) = ready {
            done.complete(Ok(()));
        }
    }
}
