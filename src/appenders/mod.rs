//! Appender implementations

#[cfg(feature = "console")]
pub mod console;
pub mod factory;
#[cfg(feature = "file")]
pub mod file;
pub mod function;
pub mod network_sink;
#[cfg(feature = "network")]
pub mod tcp_client;

#[cfg(feature = "console")]
pub use console::{ConsoleAppender, ConsoleOptions};
pub use factory::{AppenderFactories, AppenderFactory};
#[cfg(feature = "file")]
pub use file::{FileAppender, FileOptions};
pub use function::FnAppender;
pub use network_sink::{NetworkSinkAppender, NetworkSinkOptions, SinkClient, SinkClientFactory};
#[cfg(feature = "network")]
pub use tcp_client::TcpSinkClient;

pub use crate::core::Appender;
