//! tracing subscriber setup for apps built on this crate

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::Result;

const DEFAULT_LOG_PREFIX: &str = "octoapp";

/// File logging destination for [`init`].
pub struct FileLogger {
    log_directory: PathBuf,
    rotation: Rotation,
    prefix: String,
}

impl FileLogger {
    pub fn new(log_directory: PathBuf) -> Self {
        Self {
            log_directory,
            rotation: Rotation::DAILY,
            prefix: DEFAULT_LOG_PREFIX.to_string(),
        }
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn appender(&self) -> std::io::Result<RollingFileAppender> {
        // Ensure log directory exists
        std::fs::create_dir_all(&self.log_directory)?;
        Ok(RollingFileAppender::new(
            self.rotation.clone(),
            &self.log_directory,
            &self.prefix,
        ))
    }
}

/// Install the global subscriber: an env-filtered stdout layer, plus a
/// rolling file layer when a [`FileLogger`] is given.
///
/// Returns the file writer's guard; hold it for as long as log output
/// should keep flushing.
pub fn init(file_logger: Option<FileLogger>) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match file_logger {
        Some(file_logger) => {
            let (writer, guard) = tracing_appender::non_blocking(file_logger.appender()?);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
            Ok(None)
        }
    }
}
