// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Tracing setup shared by the tipfeed binaries and tests.
//!
//! Logs go to the console or to size-rotated files, as plain lines or JSON. The active targets come
//! from `TIP_LOG` when set and can be swapped at runtime through the [`ReloadHandle`].

mod appender;
mod error;
mod layers;

use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, str::FromStr};
use tracing_core::dispatcher::DefaultGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{Error, Result};
pub use layers::ReloadHandle;
pub use tracing_appender::non_blocking::WorkerGuard;
pub use tracing_core::Level;

/// Where log lines are written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogOutputDest {
    Stderr,
    Stdout,
    /// A directory of rotated log files, created on initialization.
    Path(PathBuf),
}

impl LogOutputDest {
    /// Accepts `stdout`, `stderr`, `data-dir` for a fresh timestamped directory, or any other path.
    pub fn parse_from_str(val: &str) -> Result<Self> {
        val.parse()
    }
}

impl FromStr for LogOutputDest {
    type Err = Error;

    fn from_str(dest: &str) -> Result<Self> {
        let dest = match dest.trim() {
            "stderr" => Self::Stderr,
            "stdout" => Self::Stdout,
            "data-dir" => Self::Path(timestamped_log_dir()?),
            path => Self::Path(path.into()),
        };
        Ok(dest)
    }
}

impl fmt::Display for LogOutputDest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stderr => f.write_str("stderr"),
            Self::Stdout => f.write_str("stdout"),
            Self::Path(dir) => write!(f, "{}", dir.display()),
        }
    }
}

/// `{data dir}/tipfeed/client/logs/log_{local time}`
fn timestamped_log_dir() -> Result<PathBuf> {
    let data_dir = dirs_next::data_dir().ok_or_else(|| {
        Error::InvalidConfig("this platform has no data directory".to_string())
    })?;
    let dir_name = chrono::Local::now().format("log_%Y-%m-%d_%H-%M-%S").to_string();
    Ok(data_dir
        .join("tipfeed")
        .join("client")
        .join("logs")
        .join(dir_name))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Default,
    Json,
}

impl LogFormat {
    pub fn parse_from_str(val: &str) -> Result<Self> {
        val.parse()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Json => "json",
        }
    }
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(format: &str) -> Result<Self> {
        [Self::Default, Self::Json]
            .into_iter()
            .find(|known| known.as_str() == format.trim())
            .ok_or_else(|| {
                Error::InvalidConfig(format!(
                    "unknown log format {format:?}, use \"default\" or \"json\""
                ))
            })
    }
}

/// How many rotated files to keep. Unset limits use the built-in defaults.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct FileLimits {
    pub(crate) uncompressed: Option<usize>,
    pub(crate) archived: Option<usize>,
}

/// Configures the global tracing subscriber.
///
/// ```no_run
/// use tip_logging::{Level, LogBuilder, LogOutputDest};
///
/// let (_reload, _guard) = LogBuilder::new(vec![("tiplib".to_string(), Level::DEBUG)])
///     .output_dest(LogOutputDest::Stdout)
///     .initialize()?;
/// # Ok::<(), tip_logging::Error>(())
/// ```
pub struct LogBuilder {
    targets: Vec<(String, Level)>,
    output_dest: LogOutputDest,
    format: LogFormat,
    limits: FileLimits,
    announce: bool,
}

impl LogBuilder {
    /// `targets` apply unless `TIP_LOG` is set. Logs go to stderr until told otherwise.
    pub fn new(targets: Vec<(String, Level)>) -> Self {
        Self {
            targets,
            output_dest: LogOutputDest::Stderr,
            format: LogFormat::default(),
            limits: FileLimits::default(),
            announce: true,
        }
    }

    pub fn output_dest(mut self, output_dest: LogOutputDest) -> Self {
        self.output_dest = output_dest;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Rotated files kept uncompressed.
    pub fn max_log_files(mut self, files: usize) -> Self {
        self.limits.uncompressed = Some(files);
        self
    }

    /// Compressed files kept on top of the uncompressed ones.
    pub fn max_archived_log_files(mut self, files: usize) -> Self {
        self.limits.archived = Some(files);
        self
    }

    /// Whether to print the chosen destination and `TIP_LOG` value to stdout.
    pub fn print_updates_to_stdout(mut self, print: bool) -> Self {
        self.announce = print;
        self
    }

    /// Installs the global subscriber.
    ///
    /// The returned guard flushes file output when dropped, so keep it alive until exit.
    pub fn initialize(self) -> Result<(ReloadHandle, Option<WorkerGuard>)> {
        let output = layers::output(
            self.targets,
            &self.output_dest,
            self.format,
            self.limits,
            self.announce,
        )?;

        if let Err(err) = tracing_subscriber::registry().with(output.layer).try_init() {
            eprintln!("Logging was already initialized: {err}");
        }
        Ok((output.reload, output.guard))
    }

    /// Logs `test_file_name` and `tiplib` at TRACE into a timestamped data directory, for as long
    /// as the returned guards live.
    ///
    /// The subscriber is thread local, so only use this from single threaded tests.
    pub fn init_single_threaded_tokio_test(
        test_file_name: &str,
    ) -> Result<(Option<WorkerGuard>, DefaultGuard)> {
        let dest = timestamped_log_dir()
            .map(LogOutputDest::Path)
            .unwrap_or(LogOutputDest::Stdout);
        let targets = vec![
            (test_file_name.to_string(), Level::TRACE),
            ("tiplib".to_string(), Level::TRACE),
        ];
        let output = layers::output(
            targets,
            &dest,
            LogFormat::Default,
            FileLimits::default(),
            false,
        )?;

        let default_guard = tracing_subscriber::registry().with(output.layer).set_default();
        tracing::debug!(test = ?std::thread::current().name(), "test logs go to {dest}");
        Ok((output.guard, default_guard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{debug, error, trace};
    use tracing_test::internal::{global_buf, MockWriter};

    fn captured() -> Vec<String> {
        let buf = global_buf().lock().expect("log buffer poisoned");
        String::from_utf8_lossy(&buf)
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn was_logged(text: &str) -> bool {
        captured().iter().any(|line| line.contains(text))
    }

    #[test]
    fn output_dest_parsing() -> Result<()> {
        assert_eq!("stdout".parse::<LogOutputDest>()?, LogOutputDest::Stdout);
        assert_eq!(LogOutputDest::parse_from_str(" stderr ")?, LogOutputDest::Stderr);
        assert_eq!(
            LogOutputDest::parse_from_str("/tmp/tipfeed-logs")?.to_string(),
            "/tmp/tipfeed-logs"
        );

        // hosts without a data dir fail instead
        if let Ok(LogOutputDest::Path(dir)) = LogOutputDest::parse_from_str("data-dir") {
            let name = dir.file_name().map(|name| name.to_string_lossy().into_owned());
            assert!(name.is_some_and(|name| name.starts_with("log_")));
            assert!(dir
                .parent()
                .is_some_and(|logs| logs.ends_with("tipfeed/client/logs")));
        }
        Ok(())
    }

    #[test]
    fn format_parsing() -> Result<()> {
        assert_eq!(LogFormat::parse_from_str("json")?, LogFormat::Json);
        assert_eq!("default".parse::<LogFormat>()?.as_str(), "default");
        assert!(matches!(
            LogFormat::parse_from_str("yaml"),
            Err(Error::InvalidConfig(_))
        ));
        Ok(())
    }

    #[test]
    fn reload_handle_changes_levels_at_runtime() -> color_eyre::Result<()> {
        let (layer, reload) = layers::filtered(
            layers::plain_layer(MockWriter::new(global_buf())),
            vec![("tip_logging::tests".to_string(), Level::TRACE)],
        );
        tracing_subscriber::registry().with(layer).try_init()?;

        trace!("polling receipt 0xabc");
        assert!(was_logged("polling receipt 0xabc"));

        reload.modify_log_level("tip_logging::tests=DEBUG")?;
        trace!("polling receipt 0xdef");
        debug!("receipt 0xdef confirmed");
        assert!(!was_logged("polling receipt 0xdef"));
        assert!(was_logged("receipt 0xdef confirmed"));

        reload.modify_log_level("tip_logging::tests=ERROR")?;
        debug!("balance refreshed");
        error!("transfer reverted");
        assert!(!was_logged("balance refreshed"));
        assert!(was_logged("transfer reverted"));

        let lines = captured();
        assert_eq!(lines.len(), 3, "unexpected lines: {lines:?}");
        assert!(lines[2].contains("ERROR tip_logging::tests"));
        Ok(())
    }
}
