// Copyright 2025 OPPO.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use chrono::Local;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::str::FromStr;
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_log::NormalizeEvent;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

// If log_dir = "", the log is output to standard output
// If file_name = "", the default is nimbus.log
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConf {
    pub level: String,
    pub log_dir: String,
    pub file_name: String,
    pub max_log_files: usize,

    // Whether to output the thread name
    pub display_thread: bool,
    // Whether to output the logging location
    pub display_position: bool,
}

impl Default for LogConf {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            log_dir: Logger::TARGET_STDOUT.to_string(),
            file_name: "".to_string(),
            max_log_files: 10,
            display_thread: false,
            display_position: true,
        }
    }
}

static INSTANCE: OnceCell<Logger> = OnceCell::new();

#[allow(unused)]
#[derive(Debug)]
pub struct Logger {
    inner: Vec<WorkerGuard>,
}

impl Logger {
    pub const TARGET_STDOUT: &'static str = "stdout";

    pub const TARGET_STDERR: &'static str = "stderr";

    pub fn new(conf: LogConf) -> Self {
        let level = Level::from_str(&conf.level).unwrap();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .event_format(LogFormatter::new(&conf));

        let (writer, guard) = Self::create_writer(&conf);
        subscriber.with_writer(writer).init();

        Logger { inner: vec![guard] }
    }

    pub fn default() {
        Self::init(LogConf::default())
    }

    pub fn init(conf: LogConf) {
        INSTANCE.get_or_init(|| Self::new(conf));
    }

    pub fn create_writer(conf: &LogConf) -> (NonBlocking, WorkerGuard) {
        let file_name = if conf.file_name.is_empty() {
            "nimbus"
        } else {
            conf.file_name.as_str()
        };

        if conf.log_dir.to_ascii_lowercase() == Self::TARGET_STDOUT || conf.log_dir.is_empty() {
            tracing_appender::non_blocking(io::stdout())
        } else if conf.log_dir.to_ascii_lowercase() == Self::TARGET_STDERR {
            tracing_appender::non_blocking(io::stderr())
        } else {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(file_name)
                .max_log_files(conf.max_log_files)
                .build(&conf.log_dir)
                .expect("initializing rolling file appender failed");
            tracing_appender::non_blocking(appender)
        }
    }
}

pub struct LogFormatter {
    display_thread: bool,
    display_position: bool,
}

impl LogFormatter {
    pub fn new(conf: &LogConf) -> Self {
        Self {
            display_thread: conf.display_thread,
            display_position: conf.display_position,
        }
    }

    // The source file without its directory prefix.
    fn position(metadata: &tracing::Metadata<'_>) -> String {
        let file = metadata
            .file()
            .map(|v| v.rsplit('/').next().unwrap_or(v))
            .unwrap_or("unknown");
        format!("{}:{}", file, metadata.line().unwrap_or(0))
    }
}

/// Log line layout:
/// INFO  2025-07-16 16:23:12.626 (safemode-timer) safe_mode.rs:47 - Nameserver leave safemode
impl<S, N> FormatEvent<S, N> for LogFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        // Events routed through the log bridge carry their real origin in
        // the normalized metadata.
        let normalized_meta = event.normalized_metadata();
        let metadata = normalized_meta.as_ref().unwrap_or_else(|| event.metadata());

        write!(
            writer,
            "{:<5} {}",
            metadata.level(),
            Local::now().format(TIMESTAMP_FORMAT)
        )?;

        if self.display_thread {
            let thread = std::thread::current();
            write!(writer, " ({})", thread.name().unwrap_or("?"))?;
        }

        if self.display_position {
            write!(writer, " {}", Self::position(metadata))?;
        }

        write!(writer, " - ")?;
        ctx.format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}
