//! Shutdown coordination across appenders
//!
//! Shutdown is a counted barrier. Every distinct appender gets one
//! [`ShutdownTicket`]; all `shutdown` calls are issued before any completion
//! is awaited, and the caller is notified once the last ticket retires or
//! the deadline passes.
//!
//! ```text
//! caller ──► fan-out: a.shutdown(t1), b.shutdown(t2), c.shutdown(t3)
//!                              │ completions, any order
//! caller ◄── on_all_done ◄── fan-in: retire t2, t1, t3
//! ```

use super::appender::{panic_message, same_appender, Completion, SharedAppender, TicketOutcome};
use super::error::{LoggerError, Result};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default bound on how long shutdown waits for appenders (5 seconds)
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// One outstanding appender-shutdown obligation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShutdownTicket {
    id: u64,
    appender: String,
}

impl ShutdownTicket {
    pub fn new(id: u64, appender: impl Into<String>) -> Self {
        Self {
            id,
            appender: appender.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn appender(&self) -> &str {
        &self.appender
    }
}

impl fmt::Display for ShutdownTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ({})", self.id, self.appender)
    }
}

/// Drives shutdown of a set of appenders
///
/// Only one shutdown runs at a time; a second request while one is in
/// progress fails with [`LoggerError::AlreadyShuttingDown`]. Once a shutdown
/// finishes the coordinator can run another.
#[derive(Debug)]
pub struct ShutdownCoordinator {
    timeout: Duration,
    in_progress: Arc<AtomicBool>,
    next_ticket: AtomicU64,
}

impl ShutdownCoordinator {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            in_progress: Arc::new(AtomicBool::new(false)),
            next_ticket: AtomicU64::new(1),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_shutting_down(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    /// Shut down `appenders` and call `on_all_done` exactly once
    ///
    /// Duplicates (by identity) are removed first. With nothing to shut down,
    /// or when every appender completes during fan-out, `on_all_done` runs
    /// before this returns; otherwise it runs on a background thread when the
    /// last ticket retires.
    ///
    /// `on_all_done` receives `Ok(())` when every appender completed cleanly,
    /// [`LoggerError::ShutdownTimeout`] if some did not complete in time,
    /// [`LoggerError::ShutdownFailed`] if some reported a failure, and
    /// [`LoggerError::AlreadyShuttingDown`] for an overlapping request.
    pub fn shutdown_with<F>(&self, appenders: &[SharedAppender], on_all_done: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let Some(guard) = InProgressGuard::acquire(&self.in_progress) else {
            on_all_done(Err(LoggerError::AlreadyShuttingDown));
            return;
        };

        let mut pending = self.fan_out(appenders);
        pending.drain_ready();

        if pending.is_done() {
            let result = pending.finish();
            drop(guard);
            on_all_done(result);
            return;
        }

        thread::spawn(move || {
            let result = pending.wait();
            drop(guard);
            on_all_done(result);
        });
    }

    /// Blocking form of [`shutdown_with`](Self::shutdown_with)
    ///
    /// Do not call this from a thread that must run for appenders to
    /// complete; use `shutdown_with` there.
    pub fn shutdown(&self, appenders: &[SharedAppender]) -> Result<()> {
        let Some(_guard) = InProgressGuard::acquire(&self.in_progress) else {
            return Err(LoggerError::AlreadyShuttingDown);
        };

        self.fan_out(appenders).wait()
    }

    /// Issue every appender's shutdown before looking at any completion
    fn fan_out(&self, appenders: &[SharedAppender]) -> PendingShutdown {
        let (sender, receiver) = unbounded();
        let mut outstanding = BTreeMap::new();
        let mut issued = Vec::new();

        for appender in distinct(appenders) {
            let id = self.next_ticket.fetch_add(1, Ordering::Relaxed);
            let ticket = ShutdownTicket::new(id, appender.name());
            outstanding.insert(id, ticket.clone());
            issued.push((ticket, appender));
        }

        for (ticket, appender) in issued {
            let done = Completion::new(ticket, sender.clone());
            // A panicking appender drops its completion, which reports the failure.
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                appender.shutdown(done)
            }));
            if let Err(panic_info) = result {
                eprintln!(
                    "[LOGGER CRITICAL] Appender '{}' panicked during shutdown: {}",
                    appender.name(),
                    panic_message(panic_info.as_ref())
                );
            }
        }

        PendingShutdown {
            outstanding,
            failures: Vec::new(),
            receiver,
            timeout: self.timeout,
            deadline: Instant::now() + self.timeout,
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_SHUTDOWN_TIMEOUT)
    }
}

/// Distinct appenders in first-seen order
pub(crate) fn distinct(appenders: &[SharedAppender]) -> Vec<SharedAppender> {
    let mut unique: Vec<SharedAppender> = Vec::with_capacity(appenders.len());
    for appender in appenders {
        if !unique.iter().any(|seen| same_appender(seen, appender)) {
            unique.push(Arc::clone(appender));
        }
    }
    unique
}

/// Clears the in-progress flag when the shutdown ends, including on panic
struct InProgressGuard(Arc<AtomicBool>);

impl InProgressGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for InProgressGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Fan-in side of one shutdown
///
/// Every ticket is issued before the deadline starts, so the shared deadline
/// bounds each ticket's wait.
struct PendingShutdown {
    outstanding: BTreeMap<u64, ShutdownTicket>,
    failures: Vec<LoggerError>,
    receiver: Receiver<TicketOutcome>,
    timeout: Duration,
    deadline: Instant,
}

impl PendingShutdown {
    fn is_done(&self) -> bool {
        self.outstanding.is_empty()
    }

    /// Retire a ticket; unknown or already retired tickets are ignored
    fn retire(&mut self, outcome: TicketOutcome) {
        if self.outstanding.remove(&outcome.ticket.id()).is_none() {
            return;
        }
        if let Err(e) = outcome.result {
            eprintln!(
                "[LOGGER ERROR] Appender '{}' failed to shut down: {}",
                outcome.ticket.appender(),
                e
            );
            self.failures.push(e);
        }
    }

    fn drain_ready(&mut self) {
        while !self.is_done() {
            match self.receiver.try_recv() {
                Ok(outcome) => self.retire(outcome),
                Err(_) => break,
            }
        }
    }

    fn wait(mut self) -> Result<()> {
        while !self.is_done() {
            match self.receiver.recv_deadline(self.deadline) {
                Ok(outcome) => self.retire(outcome),
                Err(RecvTimeoutError::Timeout) => {
                    let pending: Vec<String> = self
                        .outstanding
                        .values()
                        .map(|ticket| ticket.appender().to_string())
                        .collect();
                    eprintln!(
                        "[LOGGER WARNING] Shutdown did not finish within {:?}; still waiting for: {}",
                        self.timeout,
                        pending.join(", ")
                    );
                    return Err(LoggerError::ShutdownTimeout {
                        timeout: self.timeout,
                        pending,
                        failures: self.failures,
                    });
                }
                Err(RecvTimeoutError::Disconnected) => {
                    // Completions that vanished without reporting (e.g. leaked)
                    let lost = std::mem::take(&mut self.outstanding);
                    self.failures.extend(lost.into_values().map(|ticket| {
                        LoggerError::appender_shutdown(
                            ticket.appender(),
                            "completion lost without being signalled",
                        )
                    }));
                }
            }
        }
        self.finish()
    }

    fn finish(self) -> Result<()> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(LoggerError::ShutdownFailed {
                failures: self.failures,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Appender, LogEvent};
    use crossbeam_channel::bounded;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;

    /// Records shutdown calls and completes according to `mode`
    struct ScriptedAppender {
        name: String,
        mode: Mode,
        calls: AtomicUsize,
        parked: Mutex<Vec<Completion>>,
    }

    #[derive(Clone, Copy)]
    enum Mode {
        Immediate,
        Parked,
        Failing,
        Panicking,
    }

    impl ScriptedAppender {
        fn new(name: &str, mode: Mode) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                mode,
                calls: AtomicUsize::new(0),
                parked: Mutex::new(Vec::new()),
            })
        }

        fn release(&self) {
            for done in self.parked.lock().drain(..) {
                done.complete(Ok(()));
            }
        }
    }

    impl Appender for ScriptedAppender {
        fn name(&self) -> &str {
            &self.name
        }

        fn append(&self, _event: &LogEvent) -> Result<()> {
            Ok(())
        }

        fn shutdown(&self, done: Completion) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.mode {
                Mode::Immediate => done.complete(Ok(())),
                Mode::Parked => self.parked.lock().push(done),
                Mode::Failing => done.complete(Err(LoggerError::other("flush failed"))),
                Mode::Panicking => panic!("shutdown exploded"),
            }
        }
    }

    fn shared(probe: &Arc<ScriptedAppender>) -> SharedAppender {
        Arc::clone(probe) as SharedAppender
    }

    fn run(coordinator: &ShutdownCoordinator, appenders: &[SharedAppender]) -> Receiver<Result<()>> {
        let (tx, rx) = bounded(1);
        coordinator.shutdown_with(appenders, move |result| {
            let _ = tx.send(result);
        });
        rx
    }

    #[test]
    fn test_zero_appenders_completes_inline() {
        let coordinator = ShutdownCoordinator::default();
        let rx = run(&coordinator, &[]);
        assert!(rx.try_recv().expect("completed synchronously").is_ok());
        assert!(!coordinator.is_shutting_down());
    }

    #[test]
    fn test_duplicates_get_one_ticket() {
        let probe = ScriptedAppender::new("shared", Mode::Immediate);
        let appenders = vec![shared(&probe), shared(&probe), shared(&probe)];

        let rx = run(&ShutdownCoordinator::default(), &appenders);
        assert!(rx.try_recv().expect("completed synchronously").is_ok());
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_waits_for_parked_completion() {
        let fast = ScriptedAppender::new("fast", Mode::Immediate);
        let slow = ScriptedAppender::new("slow", Mode::Parked);
        let coordinator = ShutdownCoordinator::default();

        let rx = run(&coordinator, &[shared(&fast), shared(&slow)]);
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        assert!(coordinator.is_shutting_down());

        slow.release();
        let result = rx.recv_timeout(Duration::from_secs(2)).expect("completed");
        assert!(result.is_ok());
    }

    #[test]
    fn test_all_issued_before_any_awaited() {
        let first = ScriptedAppender::new("first", Mode::Parked);
        let second = ScriptedAppender::new("second", Mode::Parked);

        let rx = run(&ShutdownCoordinator::default(), &[shared(&first), shared(&second)]);
        // Both shutdowns are in flight even though neither has completed.
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);

        second.release();
        first.release();
        assert!(rx.recv_timeout(Duration::from_secs(2)).expect("completed").is_ok());
    }

    #[test]
    fn test_timeout_names_pending_appenders() {
        let stuck = ScriptedAppender::new("stuck", Mode::Parked);
        let coordinator = ShutdownCoordinator::new(Duration::from_millis(50));

        let result = coordinator.shutdown(&[shared(&stuck)]);
        match result {
            Err(LoggerError::ShutdownTimeout { pending, .. }) => {
                assert_eq!(pending, vec!["stuck".to_string()]);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        assert!(!coordinator.is_shutting_down());
    }

    #[test]
    fn test_timeout_keeps_failures_of_finished_appenders() {
        let failing = ScriptedAppender::new("failing", Mode::Failing);
        let stuck = ScriptedAppender::new("stuck", Mode::Parked);
        let coordinator = ShutdownCoordinator::new(Duration::from_millis(50));

        match coordinator.shutdown(&[shared(&failing), shared(&stuck)]) {
            Err(LoggerError::ShutdownTimeout { pending, failures, .. }) => {
                assert_eq!(pending, vec!["stuck".to_string()]);
                assert_eq!(failures.len(), 1);
                assert!(failures[0].to_string().contains("flush failed"));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_reentrant_shutdown_rejected() {
        let slow = ScriptedAppender::new("slow", Mode::Parked);
        let coordinator = ShutdownCoordinator::default();

        let first = run(&coordinator, &[shared(&slow)]);
        let second = run(&coordinator, &[shared(&slow)]);
        assert!(matches!(
            second.try_recv().expect("rejected inline"),
            Err(LoggerError::AlreadyShuttingDown)
        ));
        assert_eq!(slow.calls.load(Ordering::SeqCst), 1);

        slow.release();
        assert!(first.recv_timeout(Duration::from_secs(2)).expect("completed").is_ok());
    }

    #[test]
    fn test_failures_and_panics_are_reported() {
        let failing = ScriptedAppender::new("failing", Mode::Failing);
        let panicking = ScriptedAppender::new("panicking", Mode::Panicking);
        let fine = ScriptedAppender::new("fine", Mode::Immediate);

        let result = ShutdownCoordinator::default().shutdown(&[
            shared(&failing),
            shared(&panicking),
            shared(&fine),
        ]);
        match result {
            Err(LoggerError::ShutdownFailed { failures }) => assert_eq!(failures.len(), 2),
            other => panic!("expected failures, got {:?}", other),
        }
        assert_eq!(fine.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_duplicate_outcome_does_not_double_retire() {
        let (sender, receiver) = unbounded();
        let ticket_a = ShutdownTicket::new(1, "a");
        let ticket_b = ShutdownTicket::new(2, "b");
        let mut pending = PendingShutdown {
            outstanding: BTreeMap::from([(1, ticket_a.clone()), (2, ticket_b)]),
            failures: Vec::new(),
            receiver,
            timeout: Duration::from_millis(20),
            deadline: Instant::now() + Duration::from_millis(20),
        };

        for _ in 0..2 {
            sender
                .send(TicketOutcome {
                    ticket: ticket_a.clone(),
                    result: Ok(()),
                })
                .expect("send");
        }
        pending.drain_ready();
        assert!(!pending.is_done());
        assert_eq!(pending.outstanding.len(), 1);
    }
}
