//! Appender trait for log output destinations
//!
//! An appender accepts events synchronously in [`Appender::append`] and may
//! finish the underlying I/O later. [`Appender::shutdown`] receives a
//! [`Completion`] that must be signalled once every outstanding write has
//! finished.

use super::error::{LoggerError, Result};
use super::log_event::LogEvent;
use super::shutdown::ShutdownTicket;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

pub trait Appender: Send + Sync {
    fn name(&self) -> &str;

    /// Render `event` with this appender's layout and hand it to the sink.
    ///
    /// Must not wait for the sink's I/O to finish.
    ///
    /// # Errors
    ///
    /// [`LoggerError::AppenderClosed`] once shutdown has begun. Failures of
    /// the eventual I/O are not returned here.
    fn append(&self, event: &LogEvent) -> Result<()>;

    /// Stop accepting writes and signal `done` when in-flight work has drained.
    ///
    /// `done` may be signalled before returning or later from any thread.
    fn shutdown(&self, done: Completion);
}

pub type SharedAppender = Arc<dyn Appender>;

/// Identity comparison used to deduplicate appenders
pub fn same_appender(a: &SharedAppender, b: &SharedAppender) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Result of one shutdown ticket
#[derive(Debug)]
pub struct TicketOutcome {
    pub ticket: ShutdownTicket,
    pub result: Result<()>,
}

/// One-shot shutdown completion token
///
/// Consuming [`Completion::complete`] makes a second signal impossible.
/// Dropping the token without completing it reports a failure for its ticket
/// instead of leaving the coordinator waiting.
pub struct Completion {
    ticket: ShutdownTicket,
    sender: Option<Sender<TicketOutcome>>,
    on_signal: Option<Box<dyn FnOnce() + Send>>,
}

impl Completion {
    pub(crate) fn new(ticket: ShutdownTicket, sender: Sender<TicketOutcome>) -> Self {
        Self {
            ticket,
            sender: Some(sender),
            on_signal: None,
        }
    }

    /// Completion not tied to a coordinator, with the receiving end
    ///
    /// # Example
    ///
    /// ```
    /// use rust_log_dispatch::core::Completion;
    ///
    /// let (done, outcomes) = Completion::channel("console");
    /// done.complete(Ok(()));
    /// assert!(outcomes.recv().unwrap().result.is_ok());
    /// ```
    pub fn channel(appender: impl Into<String>) -> (Self, Receiver<TicketOutcome>) {
        let (sender, receiver) = unbounded();
        (Self::new(ShutdownTicket::new(0, appender), sender), receiver)
    }

    pub fn ticket(&self) -> &ShutdownTicket {
        &self.ticket
    }

    pub fn complete(mut self, result: Result<()>) {
        self.send(result);
    }

    /// Run `hook` just before the outcome is delivered
    ///
    /// The hook also runs when the token is dropped unsignalled.
    #[must_use]
    pub fn on_signal<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_signal = Some(Box::new(hook));
        self
    }

    fn send(&mut self, result: Result<()>) {
        if let Some(hook) = self.on_signal.take() {
            hook();
        }
        if let Some(sender) = self.sender.take() {
            // The coordinator may have stopped listening after a timeout.
            let _ = sender.send(TicketOutcome {
                ticket: self.ticket.clone(),
                result,
            });
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if self.sender.is_some() {
            let error = LoggerError::appender_shutdown(
                self.ticket.appender(),
                "completion dropped without being signalled",
            );
            self.send(Err(error));
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("ticket", &self.ticket)
            .field("signalled", &self.sender.is_none())
            .finish()
    }
}

/// Appender lifecycle after construction
///
/// An appender is unconfigured until its constructor or `configure` returns,
/// so the first observable state is `Configured`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppenderState {
    Configured,
    ShuttingDown,
    ShutDown,
}

impl AppenderState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => AppenderState::Configured,
            1 => AppenderState::ShuttingDown,
            _ => AppenderState::ShutDown,
        }
    }
}

/// Lock-free lifecycle tracking shared by the built-in appenders
#[derive(Debug)]
pub struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(AppenderState::Configured as u8),
        }
    }

    pub fn state(&self) -> AppenderState {
        AppenderState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// `Ok` while writes are accepted
    pub fn ensure_open(&self, appender: &str) -> Result<()> {
        match self.state() {
            AppenderState::Configured => Ok(()),
            _ => Err(LoggerError::appender_closed(appender)),
        }
    }

    /// Stop accepting writes, returning the state before the call
    pub fn begin_shutdown(&self) -> AppenderState {
        match self.state.compare_exchange(
            AppenderState::Configured as u8,
            AppenderState::ShuttingDown as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(previous) | Err(previous) => AppenderState::from_u8(previous),
        }
    }

    pub fn finish_shutdown(&self) {
        self.state
            .store(AppenderState::ShutDown as u8, Ordering::Release);
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract a readable message from a caught panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
