// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::{
    appender::{self, Rotation},
    error::{Error, Result},
    FileLimits, LogFormat, LogOutputDest,
};
use std::collections::BTreeMap;
use std::fmt;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_core::{Event, Level, Subscriber};
use tracing_subscriber::{
    filter::Targets,
    fmt::{
        self as tracing_fmt,
        format::Writer,
        time::{FormatTime, SystemTime},
        FmtContext, FormatEvent, FormatFields, MakeWriter,
    },
    layer::{Filter, Layer},
    registry::LookupSpan,
    reload, Registry,
};

/// CSV of `target=level` pairs overriding the default targets.
pub(crate) const TIP_LOG_ENV: &str = "TIP_LOG";

const MAX_LOG_FILE_BYTES: usize = 20 * 1024 * 1024;
const DEFAULT_UNCOMPRESSED_FILES: usize = 10;
const DEFAULT_MAX_FILES: usize = 100;

// our crates at TRACE
const ALL_TIP_LOGS: &str = "all";
// binaries at TRACE, libraries at DEBUG
const VERBOSE_TIP_LOGS: &str = "v";
const BIN_TARGETS: &[&str] = &["tipfeed"];
const LIB_TARGETS: &[&str] = &["tiplib", "tip_logging"];

pub(crate) type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;
type BoxedFilter = Box<dyn Filter<Registry> + Send + Sync>;

/// Swaps the target filter of an installed subscriber.
pub struct ReloadHandle(reload::Handle<BoxedFilter, Registry>);

impl ReloadHandle {
    /// Replace the active targets, e.g. `tiplib=DEBUG,alloy=WARN` or `v`.
    pub fn modify_log_level(&self, logging_value: &str) -> Result<()> {
        let targets = get_logging_targets(logging_value)?;
        self.0.reload(targets_filter(targets))?;
        Ok(())
    }
}

/// One line per event: `time LEVEL target::span: message fields`.
pub(crate) struct LogFormatter;

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
        let metadata = event.metadata();
        SystemTime.format_time(&mut writer)?;
        write!(writer, " {:>5} {}", metadata.level(), metadata.target())?;
        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "::{}", span.name())?;
            }
        }
        write!(writer, ": ")?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// The installed pieces of one log destination.
pub(crate) struct Output {
    pub(crate) layer: BoxedLayer,
    pub(crate) guard: Option<WorkerGuard>,
    pub(crate) reload: ReloadHandle,
}

/// Build the layer writing to `dest`, filtered by `TIP_LOG` or else `default_targets`.
pub(crate) fn output(
    default_targets: Vec<(String, Level)>,
    dest: &LogOutputDest,
    format: LogFormat,
    limits: FileLimits,
    announce: bool,
) -> Result<Output> {
    let mut guard = None;
    let layer = match dest {
        LogOutputDest::Stderr => writer_layer(format, std::io::stderr),
        LogOutputDest::Stdout => {
            if announce {
                println!("Logging to stdout");
            }
            writer_layer(format, std::io::stdout)
        }
        LogOutputDest::Path(dir) => {
            std::fs::create_dir_all(dir)?;
            if announce {
                println!("Logging to {}", dir.display());
            }
            let (writer, worker_guard) = appender::file_rotater(dir, rotation(limits));
            guard = Some(worker_guard);
            writer_layer(format, writer)
        }
    };

    let targets = match std::env::var(TIP_LOG_ENV) {
        Ok(value) => {
            if announce {
                println!("{TIP_LOG_ENV} is set to {value}");
            }
            get_logging_targets(&value)?
        }
        Err(_) => default_targets,
    };
    let (layer, reload) = filtered(layer, targets);
    Ok(Output {
        layer,
        guard,
        reload,
    })
}

/// Wrap `layer` in a target filter that can be swapped at runtime.
pub(crate) fn filtered(
    layer: BoxedLayer,
    targets: Vec<(String, Level)>,
) -> (BoxedLayer, ReloadHandle) {
    let (filter, handle) = reload::Layer::new(targets_filter(targets));
    (layer.with_filter(filter).boxed(), ReloadHandle(handle))
}

pub(crate) fn plain_layer<W>(writer: W) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_fmt::layer()
        .with_ansi(false)
        .event_format(LogFormatter)
        .with_writer(writer)
        .boxed()
}

fn writer_layer<W>(format: LogFormat, writer: W) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Default => plain_layer(writer),
        LogFormat::Json => tracing_fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(writer)
            .boxed(),
    }
}

fn targets_filter(targets: Vec<(String, Level)>) -> BoxedFilter {
    Box::new(Targets::new().with_targets(targets))
}

fn rotation(limits: FileLimits) -> Rotation {
    let uncompressed_files = limits.uncompressed.unwrap_or(DEFAULT_UNCOMPRESSED_FILES);
    // compression only starts once the total exceeds the uncompressed count
    let max_files = match limits.archived {
        Some(archived) => uncompressed_files + archived,
        None => uncompressed_files.max(DEFAULT_MAX_FILES),
    };
    Rotation {
        max_bytes: MAX_LOG_FILE_BYTES,
        uncompressed_files,
        max_files,
    }
}

/// Parse `TIP_LOG` style targets, e.g. `alloy=DEBUG,all,tiplib=WARN`.
///
/// `all` and `v` expand to our own crates. A target named explicitly keeps its own level.
/// A target without a level is traced.
pub(crate) fn get_logging_targets(value: &str) -> Result<Vec<(String, Level)>> {
    let mut lib_level = None;
    let mut explicit = BTreeMap::new();

    for entry in value.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        match entry {
            ALL_TIP_LOGS => lib_level = Some(Level::TRACE),
            VERBOSE_TIP_LOGS => {
                let _ = lib_level.get_or_insert(Level::DEBUG);
            }
            _ => {
                let (target, level) = entry.split_once('=').unwrap_or((entry, "trace"));
                let target = target.trim();
                if target.is_empty() {
                    return Err(Error::InvalidConfig(format!(
                        "no target before the level in {entry:?}"
                    )));
                }
                let _ = explicit.insert(target.to_string(), parse_level(level)?);
            }
        }
    }

    let mut targets = BTreeMap::new();
    if let Some(lib_level) = lib_level {
        targets.extend(BIN_TARGETS.iter().map(|bin| (bin.to_string(), Level::TRACE)));
        targets.extend(LIB_TARGETS.iter().map(|lib| (lib.to_string(), lib_level)));
    }
    targets.extend(explicit);
    Ok(targets.into_iter().collect())
}

fn parse_level(level: &str) -> Result<Level> {
    level
        .trim()
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("unsupported log level {level:?}")))
}
