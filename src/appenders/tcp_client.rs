//! TCP sink client
//!
//! Sends each message as one JSON line to a remote collector. Writes happen
//! on a worker thread so [`SinkClient::log`] never blocks on the network.
//! A failed write drops the connection, reconnects once and retries; if that
//! also fails the write's callback receives the error.

use super::network_sink::{NetworkSinkOptions, SinkClient, SinkClientFactory, WriteCallback};
use crate::core::{LoggerError, Result, DEFAULT_SHUTDOWN_TIMEOUT};
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde_json::{json, Value};
use std::io::Write;
use std::net::TcpStream;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const IO_TIMEOUT: Duration = Duration::from_secs(5);

struct Job {
    line: String,
    callback: WriteCallback,
}

/// [`SinkClient`] writing JSON lines over TCP
///
/// The connection is opened lazily by the worker, so construction never
/// fails for an unreachable address; the first write reports it instead.
///
/// # Example
///
/// ```no_run
/// use rust_log_dispatch::appenders::network_sink;
/// use rust_log_dispatch::appenders::tcp_client::TcpSinkClient;
/// use serde_json::json;
///
/// let factory = TcpSinkClient::factory("127.0.0.1:5140");
/// let appender = network_sink::configure(
///     &json!({"token": "t0k3n", "subdomain": "acme"}),
///     &factory,
/// )
/// .unwrap();
/// ```
pub struct TcpSinkClient {
    address: String,
    token: String,
    account_tags: Vec<String>,
    sender: Option<Sender<Job>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl TcpSinkClient {
    pub fn new(address: impl Into<String>, options: &NetworkSinkOptions) -> Self {
        let address = address.into();
        let (sender, receiver) = unbounded();
        let worker_address = address.clone();
        let worker = thread::Builder::new()
            .name("log-sink-tcp".to_string())
            .spawn(move || Self::run(worker_address, receiver));

        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                eprintln!("[LOGGER ERROR] Failed to start TCP sink worker: {}", e);
                None
            }
        };

        Self {
            address,
            token: options.token.clone(),
            account_tags: options.tags.clone(),
            sender: worker.as_ref().map(|_| sender),
            worker,
        }
    }

    /// Factory for [`network_sink::configure`](super::network_sink::configure)
    pub fn factory(address: impl Into<String>) -> impl SinkClientFactory {
        let address = address.into();
        move |options: &NetworkSinkOptions| -> Result<Arc<dyn SinkClient>> {
            Ok(Arc::new(TcpSinkClient::new(address.clone(), options)) as Arc<dyn SinkClient>)
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn run(address: String, receiver: Receiver<Job>) {
        let mut stream: Option<TcpStream> = None;

        for job in receiver {
            let result = Self::send(&address, &mut stream, job.line.as_bytes()).or_else(|first| {
                // Connection lost; reconnect and resend once
                stream = None;
                Self::send(&address, &mut stream, job.line.as_bytes()).map_err(|retry| {
                    LoggerError::appender_write(
                        address.clone(),
                        format!("{} (after reconnect: {})", first, retry),
                    )
                })
            });
            (job.callback)(result);
        }
    }

    fn send(address: &str, stream: &mut Option<TcpStream>, bytes: &[u8]) -> std::io::Result<()> {
        if stream.is_none() {
            *stream = Some(Self::connect(address)?);
        }
        match stream.as_mut() {
            Some(stream) => {
                stream.write_all(bytes)?;
                stream.flush()
            }
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "no connection",
            )),
        }
    }

    fn connect(address: &str) -> std::io::Result<TcpStream> {
        let stream = TcpStream::connect(address)?;

        // Set timeouts to prevent hanging
        stream.set_write_timeout(Some(IO_TIMEOUT))?;
        stream.set_read_timeout(Some(IO_TIMEOUT))?;

        // Enable TCP_NODELAY for low-latency logging
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    fn line(&self, message: Value, tags: Vec<String>) -> Result<String> {
        let mut all_tags = self.account_tags.clone();
        all_tags.extend(tags);
        let mut line = serde_json::to_string(&json!({
            "token": self.token,
            "tags": all_tags,
            "event": message,
        }))?;
        line.push('\n');
        Ok(line)
    }
}

impl SinkClient for TcpSinkClient {
    fn log(&self, message: Value, tags: Vec<String>, callback: WriteCallback) {
        let line = match self.line(message, tags) {
            Ok(line) => line,
            Err(e) => return callback(Err(e)),
        };

        let Some(sender) = &self.sender else {
            return callback(Err(LoggerError::appender_write(
                self.address.clone(),
                "TCP sink worker is not running",
            )));
        };

        if let Err(rejected) = sender.send(Job { line, callback }) {
            (rejected.into_inner().callback)(Err(LoggerError::appender_write(
                self.address.clone(),
                "TCP sink worker stopped",
            )));
        }
    }
}

impl Drop for TcpSinkClient {
    fn drop(&mut self) {
        // Close the channel so the worker drains queued writes and exits
        drop(self.sender.take());

        if let Some(handle) = self.worker.take() {
            let start = Instant::now();
            loop {
                if handle.is_finished() {
                    if handle.join().is_err() {
                        eprintln!("[LOGGER ERROR] TCP sink worker panicked");
                    }
                    break;
                }

                if start.elapsed() >= DEFAULT_SHUTDOWN_TIMEOUT {
                    eprintln!(
                        "[LOGGER WARNING] TCP sink worker did not finish within {:?}. \
                         Some logs may be lost.",
                        DEFAULT_SHUTDOWN_TIMEOUT
                    );
                    break;
                }

                thread::sleep(Duration::from_millis(10));
            }
        }
    }
}
