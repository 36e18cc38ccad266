//! File appender implementation

use crate::core::{
    Appender, Completion, LayoutConfig, Lifecycle, LogEvent, LoggerError, Result, SharedLayout,
};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Options accepted by [`FileAppender::configure`]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOptions {
    pub filename: PathBuf,
    #[serde(default)]
    pub layout: Option<LayoutConfig>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Appends one rendered line per event to a file
///
/// Writes are buffered and flushed on shutdown or drop.
pub struct FileAppender {
    name: String,
    path: PathBuf,
    layout: SharedLayout,
    writer: Mutex<Option<BufWriter<File>>>,
    lifecycle: Lifecycle,
}

impl FileAppender {
    /// Open `path` for appending with the basic layout
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_layout(path, LayoutConfig::new("basic").build()?)
    }

    pub fn with_layout(path: impl Into<PathBuf>, layout: SharedLayout) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                LoggerError::io_operation("opening log file", path.display().to_string(), e)
            })?;

        Ok(Self {
            name: "file".to_string(),
            path,
            layout,
            writer: Mutex::new(Some(BufWriter::new(file))),
            lifecycle: Lifecycle::new(),
        })
    }

    /// Build from `{"filename": "...", "layout": {...}, "name": "..."}`
    ///
    /// # Errors
    ///
    /// [`LoggerError::InvalidConfiguration`] when `filename` is missing or the
    /// layout is invalid; an IO error when the file cannot be opened.
    pub fn configure(options: &Value) -> Result<Self> {
        let options: FileOptions = serde_json::from_value(options.clone())
            .map_err(|e| LoggerError::config("file appender", e.to_string()))?;

        let layout = match options.layout {
            Some(config) => config.build()?,
            None => LayoutConfig::new("basic").build()?,
        };
        let mut appender = Self::with_layout(options.filename, layout)?;
        if let Some(name) = options.name {
            appender.name = name;
        }
        Ok(appender)
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn flush(&self) -> Result<()> {
        if let Some(writer) = self.writer.lock().as_mut() {
            writer.flush().map_err(|e| {
                LoggerError::io_operation("flushing log file", self.path.display().to_string(), e)
            })?;
        }
        Ok(())
    }
}

impl Appender for FileAppender {
    fn name(&self) -> &str {
        &self.name
    }

    fn append(&self, event: &LogEvent) -> Result<()> {
        self.lifecycle.ensure_open(&self.name)?;

        let mut output = self.layout.render(event).into_text();
        output.push('\n');

        let mut writer = self.writer.lock();
        let writer = writer
            .as_mut()
            .ok_or_else(|| LoggerError::appender_closed(self.name.clone()))?;
        writer
            .write_all(output.as_bytes())
            .map_err(|e| LoggerError::appender_write(self.name.clone(), e.to_string()))
    }

    fn shutdown(&self, done: Completion) {
        self.lifecycle.begin_shutdown();
        let result = self.flush();
        // Closes the file; later writes see the appender as closed.
        self.writer.lock().take();
        self.lifecycle.finish_shutdown();
        done.complete(result);
    }
}

impl Drop for FileAppender {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_writes_lines_and_flushes_on_shutdown() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("app.log");
        let appender = FileAppender::configure(&json!({
            "filename": path,
            "layout": {"type": "pattern", "pattern": "%p %c %m"}
        }))
        .expect("file appender");

        appender
            .append(&LogEvent::new("db", LogLevel::Warn, vec![json!("slow"), json!(120)]))
            .expect("append");
        appender
            .append(&LogEvent::new("db", LogLevel::Info, vec![json!("ok")]))
            .expect("append");

        let (done, outcomes) = Completion::channel("file");
        appender.shutdown(done);
        assert!(outcomes.recv().expect("outcome").result.is_ok());

        let contents = std::fs::read_to_string(&path).expect("read log");
        assert_eq!(contents, "WARN db slow 120\nINFO db ok\n");
    }

    #[test]
    fn test_rejects_writes_after_shutdown() {
        let dir = tempdir().expect("tempdir");
        let appender = FileAppender::new(dir.path().join("closed.log")).expect("file appender");

        let (done, _outcomes) = Completion::channel("file");
        appender.shutdown(done);

        let err = appender
            .append(&LogEvent::new("app", LogLevel::Info, vec![json!("late")]))
            .unwrap_err();
        assert!(err.is_closed());
    }

    #[test]
    fn test_configure_requires_filename() {
        let err = FileAppender::configure(&json!({"layout": {"type": "basic"}}))
            .err()
            .expect("missing filename");
        assert!(err.to_string().contains("filename"));
    }
}
