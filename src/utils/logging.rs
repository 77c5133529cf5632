use std::{
    fmt,
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::Local;
use tracing_subscriber::{
    fmt::{format::Writer, time::FormatTime},
    EnvFilter,
};

use crate::error::{Error, Result};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Where log lines go and how chatty they are. Built from the command line
/// and handed to [`init`]; nothing else reads logging flags.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub debug: bool,
    pub log_file: Option<PathBuf>,
}

impl LogConfig {
    pub fn new(debug: bool, log_file: Option<&str>) -> Self {
        Self {
            debug,
            log_file: log_file.map(|p| PathBuf::from(shellexpand::tilde(p).as_ref())),
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if self.debug {
                EnvFilter::new("debug")
            } else {
                EnvFilter::new("warn")
            }
        })
    }
}

struct LocalTimestamp;

impl FormatTime for LocalTimestamp {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", Local::now().format(TIMESTAMP_FORMAT))
    }
}

pub fn init(config: &LogConfig) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.filter())
        .with_timer(LocalTimestamp)
        .with_target(config.debug);

    let installed = match &config.log_file {
        Some(path) => {
            let file = open_log_file(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    installed.map_err(|e| Error::config(format!("failed to initialise logging: {}", e)))
}

fn open_log_file(path: &Path) -> Result<fs::File> {
    // Create log directory if it doesn't exist
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}
