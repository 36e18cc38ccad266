//! Core logging types and traits

pub mod appender;
pub mod error;
pub mod inspect;
pub mod layout;
pub mod log_event;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod pattern;
pub mod registry;
pub mod shutdown;
pub mod timestamp;

pub use appender::{
    same_appender, Appender, AppenderState, Completion, Lifecycle, SharedAppender, TicketOutcome,
};
pub use error::{LoggerError, Result};
pub use layout::{
    layout, BasicLayout, JsonLayout, Layout, LayoutConfig, MessagePassThroughLayout, Rendered,
    SharedLayout,
};
#[cfg(feature = "console")]
pub use layout::ColoredLayout;
pub use log_event::LogEvent;
pub use log_level::LogLevel;
pub use logger::{default_system, Logger, LoggingSystem, LoggingSystemBuilder};
pub use metrics::LoggerMetrics;
pub use pattern::PatternLayout;
pub use registry::{DispatchReport, Registry, DEFAULT_CATEGORY};
pub use shutdown::{ShutdownCoordinator, ShutdownTicket, DEFAULT_SHUTDOWN_TIMEOUT};
pub use timestamp::TimestampFormat;
