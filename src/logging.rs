//! Process-wide tracing subscriber, installed once by `main`

use crate::config::{LogFormat, LoggingConfig};
use anyhow::Context;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directives: RUST_LOG if set, else the configured filter.
pub fn env_filter(config: &LoggingConfig) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.filter)
            .with_context(|| format!("invalid log filter {:?}", config.filter)),
    }
}

/// Install the subscriber. The returned guard flushes the log file on drop
/// and must be held for the life of the process.
pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = env_filter(config)?;

    let (text, json) = match config.format {
        LogFormat::Text => (Some(fmt::layer().with_writer(std::io::stderr)), None),
        LogFormat::Json => (None, Some(fmt::layer().json().with_writer(std::io::stderr))),
    };

    let (file, guard) = match &config.file {
        Some(path) => {
            let (dir, name) = split_log_path(path)?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create log directory {}", dir.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json)
        .with(file)
        .try_init()
        .context("tracing subscriber already installed")?;
    Ok(guard)
}

fn split_log_path(path: &Path) -> anyhow::Result<(&Path, &std::ffi::OsStr)> {
    let name = path
        .file_name()
        .with_context(|| format!("log file {} has no file name", path.display()))?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    Ok((dir, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_relative_and_nested() {
        let (dir, name) = split_log_path(Path::new("grantsync.log")).unwrap();
        assert_eq!(dir, Path::new("."));
        assert_eq!(name, "grantsync.log");

        let (dir, name) = split_log_path(Path::new("/var/log/grantsync/run.log")).unwrap();
        assert_eq!(dir, Path::new("/var/log/grantsync"));
        assert_eq!(name, "run.log");
    }

    #[test]
    fn path_without_file_name_is_rejected() {
        assert!(split_log_path(Path::new("/")).is_err());
    }

    #[test]
    fn bad_filter_is_an_error() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = LoggingConfig {
            filter: "grantsync=verbose".into(),
            ..Default::default()
        };
        assert!(env_filter(&config).is_err());
    }
}
