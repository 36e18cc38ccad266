//! Closure-backed appender
//!
//! Pairs a write closure with an optional shutdown hook, for sinks that are
//! easier to express as functions than as a type.

use crate::core::{
    Appender, AppenderState, Completion, Lifecycle, LogEvent, MessagePassThroughLayout, Rendered,
    Result, SharedLayout,
};
use parking_lot::Mutex;
use std::sync::Arc;

type WriteFn = Box<dyn Fn(Rendered) -> Result<()> + Send + Sync>;
type ShutdownFn = Box<dyn FnOnce(Completion) + Send>;

/// Appender that hands each rendered event to a closure
///
/// Without a shutdown hook, shutdown completes immediately. A hook receives
/// the [`Completion`] and may signal it later from any thread; the appender
/// stays `ShuttingDown` until then, and further shutdown requests complete
/// together with the hook's.
///
/// # Example
///
/// ```
/// use rust_log_dispatch::appenders::FnAppender;
/// use rust_log_dispatch::core::{Appender, LogEvent, LogLevel};
/// use serde_json::json;
///
/// let appender = FnAppender::new("stdout", |rendered| {
///     println!("{}", rendered);
///     Ok(())
/// })
/// .on_shutdown(|done| done.complete(Ok(())));
///
/// appender
///     .append(&LogEvent::new("app", LogLevel::Info, vec![json!("ready")]))
///     .unwrap();
/// ```
pub struct FnAppender {
    name: String,
    layout: SharedLayout,
    write: WriteFn,
    on_shutdown: Mutex<Option<ShutdownFn>>,
    lifecycle: Arc<Lifecycle>,
    waiters: Arc<Mutex<Vec<Completion>>>,
}

impl FnAppender {
    pub fn new<W>(name: impl Into<String>, write: W) -> Self
    where
        W: Fn(Rendered) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            layout: Arc::new(MessagePassThroughLayout),
            write: Box::new(write),
            on_shutdown: Mutex::new(None),
            lifecycle: Arc::new(Lifecycle::new()),
            waiters: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[must_use]
    pub fn with_layout(mut self, layout: SharedLayout) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn on_shutdown<S>(self, hook: S) -> Self
    where
        S: FnOnce(Completion) + Send + 'static,
    {
        *self.on_shutdown.lock() = Some(Box::new(hook));
        self
    }

    pub fn state(&self) -> AppenderState {
        self.lifecycle.state()
    }
}

impl Appender for FnAppender {
    fn name(&self) -> &str {
        &self.name
    }

    fn append(&self, event: &LogEvent) -> Result<()> {
        self.lifecycle.ensure_open(&self.name)?;
        (self.write)(self.layout.render(event))
    }

    fn shutdown(&self, done: Completion) {
        {
            let mut waiters = self.waiters.lock();
            match self.lifecycle.begin_shutdown() {
                AppenderState::Configured => {}
                AppenderState::ShuttingDown => {
                    waiters.push(done);
                    return;
                }
                AppenderState::ShutDown => {
                    drop(waiters);
                    done.complete(Ok(()));
                    return;
                }
            }
        }

        let hook = self.on_shutdown.lock().take();
        match hook {
            Some(hook) => {
                let lifecycle = Arc::clone(&self.lifecycle);
                let waiters = Arc::clone(&self.waiters);
                hook(done.on_signal(move || {
                    let queued = {
                        let mut waiters = waiters.lock();
                        lifecycle.finish_shutdown();
                        std::mem::take(&mut *waiters)
                    };
                    for waiter in queued {
                        waiter.complete(Ok(()));
                    }
                }));
            }
            None => {
                self.lifecycle.finish_shutdown();
                done.complete(Ok(()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogLevel, LoggerError};
    use serde_json::json;

    #[test]
    fn test_write_receives_rendered_event() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let appender = FnAppender::new("memory", move |rendered| {
            sink.lock().push(rendered.into_text());
            Ok(())
        });

        appender
            .append(&LogEvent::new("app", LogLevel::Info, vec![json!("a"), json!([1, 2])]))
            .expect("append");
        assert_eq!(*lines.lock(), vec!["a [ 1, 2 ]"]);
    }

    #[test]
    fn test_write_error_is_returned() {
        let appender = FnAppender::new("broken", |_| Err(LoggerError::appender_write("broken", "full")));
        let err = appender
            .append(&LogEvent::new("app", LogLevel::Info, vec![]))
            .unwrap_err();
        assert!(matches!(err, LoggerError::AppenderWrite { .. }));
    }

    #[test]
    fn test_deferred_hook_keeps_shutting_down_state() {
        let parked = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&parked);
        let appender = FnAppender::new("deferred", |_| Ok(()))
            .on_shutdown(move |done| *slot.lock() = Some(done));

        let (first, first_outcome) = Completion::channel("deferred");
        appender.shutdown(first);
        assert_eq!(appender.state(), AppenderState::ShuttingDown);
        assert!(first_outcome.try_recv().is_err());

        // Overlapping request waits for the hook's drain.
        let (second, second_outcome) = Completion::channel("deferred");
        appender.shutdown(second);
        assert!(second_outcome.try_recv().is_err());

        let done = parked.lock().take().expect("hook parked its completion");
        done.complete(Ok(()));
        assert_eq!(appender.state(), AppenderState::ShutDown);
        assert!(first_outcome.recv().expect("outcome").result.is_ok());
        assert!(second_outcome.recv().expect("outcome").result.is_ok());
    }

    #[test]
    fn test_shutdown_hook_runs_once() {
        let appender = FnAppender::new("hooked", |_| Ok(()))
            .on_shutdown(|done| done.complete(Err(LoggerError::other("hook ran"))));

        let (first, outcomes) = Completion::channel("hooked");
        appender.shutdown(first);
        assert!(outcomes.recv().expect("outcome").result.is_err());
        assert_eq!(appender.state(), AppenderState::ShutDown);

        let (second, outcomes) = Completion::channel("hooked");
        appender.shutdown(second);
        assert!(outcomes.recv().expect("outcome").result.is_ok());
    }
}
